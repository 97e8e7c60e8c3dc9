use actix_web::{web, HttpResponse};

use crate::application::gateway::Gateway;

/// GET /test
///
/// Pings both backend services. 418 when either is unreachable.
#[utoipa::path(
    get,
    path = "/test",
    responses(
        (status = 200, description = "Both services reachable"),
        (status = 418, description = "At least one service failed its connection check"),
    ),
    tag = "health"
)]
pub async fn test_connections(gateway: web::Data<Gateway>) -> HttpResponse {
    match web::block(move || gateway.test_connections()).await {
        Ok(Ok(())) => HttpResponse::Ok().finish(),
        Ok(Err(e)) => {
            log::warn!(target: "gateway", "Connection test failed: {}", e);
            HttpResponse::ImATeapot().finish()
        }
        Err(e) => {
            log::warn!(target: "gateway", "Connection test did not complete: {}", e);
            HttpResponse::ImATeapot().finish()
        }
    }
}
