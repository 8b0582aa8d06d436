//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use fooapp_core::ProductId;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::forms::{BoundForm, FormErrors, ProductForm, RawForm};
use crate::middleware::{CurrentUser, RequireAuth};
use crate::models::Product;
use crate::state::AppState;

/// Where successful mutations send the client.
pub const LIST_PATH: &str = "/products/";

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "product/index.html")]
pub struct ProductIndexTemplate {
    pub current_user: Option<String>,
    pub products: Vec<Product>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "product/details.html")]
pub struct ProductDetailsTemplate {
    pub current_user: Option<String>,
    pub product: Product,
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "product/edit.html")]
pub struct ProductEditTemplate {
    pub current_user: Option<String>,
    pub heading: &'static str,
    pub action: String,
    pub form: BoundForm,
    pub product_id: Option<String>,
}

/// JSON body returned by the delete endpoint.
#[derive(Debug, Serialize)]
pub struct DeleteStatus {
    pub status: &'static str,
}

/// Parse a path id, treating malformed ids as missing products.
fn parse_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|_| AppError::NotFound(format!("product {raw}")))
}

async fn load(state: &AppState, id: ProductId) -> Result<Product> {
    state
        .products()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Redirect the site root to the product list.
pub async fn root() -> Redirect {
    Redirect::to(LIST_PATH)
}

/// Display every product.
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ProductIndexTemplate> {
    let products = state.products().list().await?;

    Ok(ProductIndexTemplate {
        current_user: user.username(),
        products,
    })
}

/// Display one product.
pub async fn detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<ProductDetailsTemplate> {
    let product = load(&state, parse_id(&id)?).await?;

    Ok(ProductDetailsTemplate {
        current_user: user.username(),
        product,
    })
}

fn create_template(
    user: &RequireAuth,
    values: &RawForm,
    errors: &FormErrors,
) -> ProductEditTemplate {
    ProductEditTemplate {
        current_user: Some(user.0.username.to_string()),
        heading: "New product",
        action: "/products/create/".to_string(),
        form: ProductForm::bind(values, errors),
        product_id: None,
    }
}

fn edit_template(
    user: &RequireAuth,
    id: ProductId,
    values: &RawForm,
    errors: &FormErrors,
) -> ProductEditTemplate {
    ProductEditTemplate {
        current_user: Some(user.0.username.to_string()),
        heading: "Edit product",
        action: format!("/products/{id}/edit/"),
        form: ProductForm::bind(values, errors),
        product_id: Some(id.to_string()),
    }
}

/// Show an empty product form.
pub async fn create_page(user: RequireAuth) -> ProductEditTemplate {
    create_template(&user, &RawForm::new(), &FormErrors::new())
}

/// Validate and insert a new product.
pub async fn create(
    State(state): State<AppState>,
    user: RequireAuth,
    Form(raw): Form<RawForm>,
) -> Result<Response> {
    let data = match ProductForm::validate(&raw) {
        Ok(data) => data,
        Err(errors) => {
            tracing::debug!(
                fields = ?errors.fields().collect::<Vec<_>>(),
                "Product form invalid"
            );
            return Ok(create_template(&user, &raw, &errors).into_response());
        }
    };

    let id = state.products().create(&data).await?;
    tracing::info!(
        product_id = %id,
        username = %user.0.username,
        "Product created"
    );
    add_breadcrumb(
        "catalog",
        "Created product",
        Some(&[("product_id", id.to_string().as_str())]),
    );

    Ok(Redirect::to(LIST_PATH).into_response())
}

/// Show the edit form for an existing product.
pub async fn edit_page(
    State(state): State<AppState>,
    user: RequireAuth,
    Path(id): Path<String>,
) -> Result<ProductEditTemplate> {
    let product = load(&state, parse_id(&id)?).await?;
    let values = ProductForm::initial(&product);

    Ok(edit_template(&user, product.id, &values, &FormErrors::new()))
}

/// Validate and apply changes to an existing product.
pub async fn edit(
    State(state): State<AppState>,
    user: RequireAuth,
    Path(id): Path<String>,
    Form(raw): Form<RawForm>,
) -> Result<Response> {
    let id = parse_id(&id)?;
    load(&state, id).await?;

    let data = match ProductForm::validate(&raw) {
        Ok(data) => data,
        Err(errors) => {
            tracing::debug!(
                product_id = %id,
                fields = ?errors.fields().collect::<Vec<_>>(),
                "Product form invalid"
            );
            return Ok(edit_template(&user, id, &raw, &errors).into_response());
        }
    };

    if state.products().update(id, &data).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    tracing::info!(
        product_id = %id,
        username = %user.0.username,
        "Product updated"
    );
    add_breadcrumb(
        "catalog",
        "Updated product",
        Some(&[("product_id", id.to_string().as_str())]),
    );

    Ok(Redirect::to(LIST_PATH).into_response())
}

/// Delete a product, answering in JSON.
pub async fn delete(
    State(state): State<AppState>,
    user: RequireAuth,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DeleteStatus>)> {
    let not_found = (
        StatusCode::NOT_FOUND,
        Json(DeleteStatus {
            status: "Not Found",
        }),
    );

    let Ok(id) = ProductId::parse(&id) else {
        return Ok(not_found);
    };

    if !state.products().delete(id).await? {
        tracing::info!(product_id = %id, "Delete of missing product");
        return Ok(not_found);
    }

    tracing::info!(
        product_id = %id,
        username = %user.0.username,
        "Product deleted"
    );
    add_breadcrumb(
        "catalog",
        "Deleted product",
        Some(&[("product_id", id.to_string().as_str())]),
    );

    Ok((StatusCode::OK, Json(DeleteStatus { status: "OK" })))
}
