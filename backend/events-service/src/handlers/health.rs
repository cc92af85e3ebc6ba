use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: bool,
}

/// Liveness probe; does not check the log
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: true })
}
