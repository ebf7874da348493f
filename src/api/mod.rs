//! API Module
//!
//! HTTP handlers and routing for the predictive cache server.
//!
//! # Endpoints
//! - `PUT /set`, `GET /get/:key`, `DELETE /del/:key`, `POST /clear`
//! - `POST /behavior/:user_id`, `POST /predictions/confirm`
//! - `GET /stats`, `GET /state`, `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
