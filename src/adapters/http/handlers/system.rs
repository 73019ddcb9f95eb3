use actix_web::HttpResponse;

use crate::adapters::http::errors::ApiError;
use crate::infrastructure::metrics;

// GET /health
pub async fn health_check() -> &'static str {
  "OK"
}

// GET /metrics - Prometheus text format
pub async fn metrics_handler() -> Result<HttpResponse, ApiError> {
  let body = metrics::render().map_err(|e| ApiError::Internal(format!("Metrics error: {}", e)))?;
  Ok(
    HttpResponse::Ok()
      .content_type("text/plain; version=0.0.4")
      .body(body),
  )
}
