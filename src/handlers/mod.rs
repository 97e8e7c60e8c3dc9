pub mod health;
pub mod orders;
pub mod products;

use actix_web::{web, HttpResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::test_connections,
        products::list_products,
        products::get_product,
        products::create_product,
        products::delete_product,
        orders::list_orders,
        orders::get_order,
        orders::create_order,
    ),
    components(schemas(
        products::ProductBody,
        products::CreateProductResponse,
        orders::CreateOrderRequest,
        orders::CreateOrderDetailRequest,
        orders::CreateOrderResponse,
        orders::OrderResponse,
        orders::OrderDetailResponse,
    )),
    tags(
        (name = "health", description = "Connectivity probe"),
        (name = "products", description = "Product catalogue"),
        (name = "orders", description = "Orders and their line items"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Register every gateway route. Expects `web::Data<Gateway>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/test", web::get().to(health::test_connections))
        .route("/api-docs/openapi.json", web::get().to(openapi_json))
        .service(
            web::scope("/products")
                .route("", web::get().to(products::list_products))
                .route("", web::post().to(products::create_product))
                .route("/{product_id}", web::get().to(products::get_product))
                .route("/{product_id}", web::delete().to(products::delete_product)),
        )
        .service(
            web::scope("/orders")
                .route("", web::get().to(orders::list_orders))
                .route("", web::post().to(orders::create_order))
                .route("/{id}", web::get().to(orders::get_order)),
        );
}
