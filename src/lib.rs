//! Bearer token middleware for axum.
//!
//! A request is authenticated iff its `Authorization` header is
//! `Bearer <credential>` and the credential satisfies the configured
//! validator: a fixed secret, or a predicate supplied by the application.
//! On success the credential is attached to the request as a [`User`];
//! otherwise the request ends with 401 before reaching any handler.
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use bearer_gate::{BearerAuth, User, middleware::bearer_auth};
//!
//! async fn hello(user: User) -> String {
//!     format!("hello {user}")
//! }
//!
//! let app = bearer_auth::apply(
//!     Router::new().route("/hello", get(hello)),
//!     BearerAuth::func(|token| token.starts_with("svc-")),
//! );
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;

pub use api::v1::extractors::User;
pub use error::AppError;
pub use middleware::BearerAuth;
