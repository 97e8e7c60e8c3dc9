use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::application::gateway::Gateway;
use crate::domain::product::Product;
use crate::domain::validation::load_product;
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductBody {
    pub id: String,
    pub title: String,
    pub passenger_capacity: i64,
    pub maximum_speed: i64,
    pub in_stock: i64,
}

impl From<Product> for ProductBody {
    fn from(p: Product) -> Self {
        ProductBody {
            id: p.id,
            title: p.title,
            passenger_capacity: p.passenger_capacity,
            maximum_speed: p.maximum_speed,
            in_stock: p.in_stock,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateProductResponse {
    pub id: String,
}

pub(crate) fn parse_json(body: &[u8]) -> Result<Value, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid json: {}", e)))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "All products", body = [ProductBody]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(gateway: web::Data<Gateway>) -> Result<HttpResponse, AppError> {
    let products = web::block(move || gateway.list_products())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ProductBody> = products.into_iter().map(ProductBody::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /products/{product_id}
#[utoipa::path(
    get,
    path = "/products/{product_id}",
    params(
        ("product_id" = String, Path, description = "Product identifier"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductBody),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    gateway: web::Data<Gateway>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();

    let product = web::block(move || gateway.get_product(&product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductBody::from(product)))
}

/// POST /products
///
/// The body is validated against the product schema before the products
/// service is called. Every invalid field is reported.
#[utoipa::path(
    post,
    path = "/products",
    request_body = ProductBody,
    responses(
        (status = 200, description = "Product stored", body = CreateProductResponse),
        (status = 400, description = "Malformed JSON or invalid product"),
    ),
    tag = "products"
)]
pub async fn create_product(
    gateway: web::Data<Gateway>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let doc = parse_json(&body)?;
    let product = load_product(&doc).map_err(AppError::Validation)?;

    let id = web::block(move || gateway.create_product(&product))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "id": id })))
}

/// DELETE /products/{product_id}
///
/// Removes the product and then every order referencing it.
#[utoipa::path(
    delete,
    path = "/products/{product_id}",
    params(
        ("product_id" = String, Path, description = "Product identifier"),
    ),
    responses(
        (status = 204, description = "Product and referencing orders deleted"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    gateway: web::Data<Gateway>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();

    web::block(move || gateway.delete_product(&product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
