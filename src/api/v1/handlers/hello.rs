/*
 * Responsibility
 * - GET /hello (Bearer 必須)
 * - middleware が入れた User を extractor で受け取る
 */
use crate::api::v1::extractors::User;

pub async fn hello(user: User) -> String {
    tracing::debug!("greeting authenticated caller");
    format!("hello {user}")
}
