/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - Bearer が必要な範囲はここで決める (/health は対象外)
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, hello::hello};
use crate::middleware::{BearerAuth, bearer_auth};

pub fn routes(auth: BearerAuth) -> Router {
    let protected = bearer_auth::apply(Router::new().route("/hello", get(hello)), auth);

    Router::new().route("/health", get(health)).merge(protected)
}
