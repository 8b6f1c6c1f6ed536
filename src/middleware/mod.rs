/*
 * Responsibility
 * - middleware の公開インターフェース
 */
pub mod bearer_auth;
pub mod http;

pub use bearer_auth::BearerAuth;
