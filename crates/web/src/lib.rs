//! fooapp web application library.
//!
//! A small product catalog: anyone can browse, logged-in users can create,
//! edit and delete products. The binary in `main.rs` wires this library to
//! a listener; tests drive [`app::build_app`] directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
