//! Build script for the web crate.
//!
//! Hashes `static/css/main.css` so templates can cache-bust the stylesheet
//! URL. Nothing is written to the source tree.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set");
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", css_path.display());

    println!("cargo:rustc-env=CSS_HASH={}", css_hash(&css_path));
}

/// First 8 hex characters of the file's SHA-256, or empty if unreadable.
fn css_hash(path: &Path) -> String {
    match fs::read(path) {
        Ok(content) => {
            let digest = Sha256::digest(&content);
            format!("{digest:x}").chars().take(8).collect()
        }
        Err(e) => {
            println!("cargo:warning=Could not read main.css: {e}");
            String::new()
        }
    }
}
