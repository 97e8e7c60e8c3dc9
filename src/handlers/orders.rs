use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::application::gateway::{DetailedOrder, Gateway};
use crate::domain::order::{Order, OrderDetail};
use crate::domain::validation::load_order_details;
use crate::errors::AppError;

use super::products::{parse_json, ProductBody};

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Documented shape of one requested line item. The handler validates the
/// raw document itself so that every field error can be reported.
#[derive(Debug, ToSchema)]
pub struct CreateOrderDetailRequest {
    pub product_id: String,
    /// Decimal price as a string, at most two decimal places, e.g. "9.99"
    pub price: String,
    pub quantity: i32,
}

#[derive(Debug, ToSchema)]
pub struct CreateOrderRequest {
    pub order_details: Vec<CreateOrderDetailRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    pub id: i32,
    pub product_id: String,
    pub price: String,
    pub quantity: i32,
    /// Present on single-order lookups only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub order_details: Vec<OrderDetailResponse>,
}

impl From<OrderDetail> for OrderDetailResponse {
    fn from(d: OrderDetail) -> Self {
        OrderDetailResponse {
            id: d.id,
            product_id: d.product_id,
            price: d.price.to_string(),
            quantity: d.quantity,
            product: None,
            image: None,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        OrderResponse {
            id: o.id,
            order_details: o.order_details.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<DetailedOrder> for OrderResponse {
    fn from(o: DetailedOrder) -> Self {
        OrderResponse {
            id: o.id,
            order_details: o
                .order_details
                .into_iter()
                .map(|line| OrderDetailResponse {
                    product: Some(line.product.into()),
                    image: Some(line.image),
                    ..OrderDetailResponse::from(line.detail)
                })
                .collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Validates the body, checks that every referenced product exists and then
/// asks the orders service to create the order. Stock is decremented later,
/// when the `order_created` event is delivered.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created successfully", body = CreateOrderResponse),
        (status = 400, description = "Malformed JSON or invalid order"),
        (status = 404, description = "A line item references an unknown product"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    gateway: web::Data<Gateway>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let doc = parse_json(&body)?;
    let details = load_order_details(&doc).map_err(AppError::Validation)?;

    let id = web::block(move || gateway.create_order(details))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "id": id })))
}

/// GET /orders/{id}
///
/// Returns the order with full product details and an image URL for every
/// line item.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    gateway: web::Data<Gateway>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || gateway.get_order(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Returns every order with its line items, without product details.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "All orders", body = [OrderResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(gateway: web::Data<Gateway>) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || gateway.list_orders())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}
