/*
 * Responsibility
 * - v1 の公開ポイント (routes() と extractor の re-export)
 */
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
