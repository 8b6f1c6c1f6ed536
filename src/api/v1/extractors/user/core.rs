use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::User;

/// Handler で `User` を受け取るための extractor。
/// middleware が `User` を request.extensions() に insert 済みである前提。
/// 見つからない場合は 401 (middleware 未設定)
impl<S> FromRequestParts<S> for User
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
