pub mod dtos;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod templates;

// Re-export commonly used types
pub use dtos::{
  ChangeDebitStatusRequest, ErrorResponse, GenerateSepaFileRequest, ListDirectDebitsQuery,
};
pub use errors::ApiError;
pub use middleware::{RequestId, RequestIdExt, RequestIdMiddleware};
pub use routes::{PrelevementRouteDependencies, configure_prelevement_routes};
pub use templates::TemplateEngine;
