/*
 * Responsibility
 * - Bearer トークンの検証 (ヘッダ抽出 → 検証 → 拒否)
 * - 成功時に、認証済み主体 (User) を request extensions に載せる
 * - 検証方法は固定シークレット or コールバックの二択 (起動時に決定)
 */
//! `Authorization: Bearer <credential>` を検証する middleware。
//!
//! - ヘッダが無い / `"Bearer "` で始まらない → 401
//! - credential はプレフィックス以降をそのまま使う (trim も split もしない)
//! - validator が true を返した場合のみ `User` を extensions に入れて次へ進む

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::{self, Next},
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::api::v1::extractors::User;
use crate::error::AppError;

/// Case-sensitive scheme prefix, including the single separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

type Predicate = dyn Fn(&str) -> bool + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Secret,
    Func,
}

/// Validator shared by every request passing through the middleware.
///
/// Both modes are normalized into a single predicate at construction time, so
/// the request path has exactly one code path. Cloning is one `Arc` bump.
#[derive(Clone)]
pub struct BearerAuth {
    mode: Mode,
    predicate: Arc<Predicate>,
}

impl BearerAuth {
    /// Accept only credentials equal to `secret`, compared in constant time.
    pub fn secret(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        Self {
            mode: Mode::Secret,
            predicate: Arc::new(move |credential: &str| constant_time_eq(credential, &secret)),
        }
    }

    /// Accept credentials for which `predicate` returns `true`.
    ///
    /// The predicate is called concurrently from every in-flight request.
    pub fn func<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            mode: Mode::Func,
            predicate: Arc::new(predicate),
        }
    }

    /// Run the validator. A panicking predicate counts as a rejection.
    pub fn validate(&self, credential: &str) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.predicate)(credential))) {
            Ok(accepted) => accepted,
            Err(_) => {
                tracing::warn!(mode = ?self.mode, "bearer validator panicked, rejecting");
                false
            }
        }
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("mode", &self.mode)
            .field("predicate", &"[REDACTED]")
            .finish()
    }
}

/// Length mismatch returns early; only the length of the secret can leak.
fn constant_time_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Returns the credential following `"Bearer "`, verbatim.
///
/// `None` when the header is missing, is not valid UTF-8, or uses another
/// scheme (including a differently-cased `bearer `). Non-ASCII UTF-8 reaches
/// the validator unchanged.
pub fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?;
    std::str::from_utf8(value.as_bytes())
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}

/// Mount the bearer check in front of every route of `router`.
///
/// ```ignore
/// let protected = Router::new().route("/hello", get(hello));
/// let protected = middleware::bearer_auth::apply(protected, BearerAuth::secret("foobar"));
/// ```
pub fn apply<S>(router: Router<S>, auth: BearerAuth) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(auth, bearer_auth))
}

pub async fn bearer_auth(
    State(auth): State<BearerAuth>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(credential) = extract_credential(req.headers()) else {
        tracing::debug!("missing or non-bearer authorization header");
        return Err(AppError::Unauthorized);
    };

    if !auth.validate(credential) {
        tracing::debug!("bearer credential rejected");
        return Err(AppError::Unauthorized);
    }

    let user = User::new(credential);

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request, StatusCode};
    use axum::routing::get;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn hello(user: User) -> String {
        format!("hello {user}")
    }

    fn test_app(auth: BearerAuth) -> Router {
        apply(Router::new().route("/", get(hello)), auth)
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(app: Router, authorization: Option<&str>) -> (StatusCode, String) {
        let response = app.oneshot(request(authorization)).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    // ── Fixed secret ─────────────────────────────────────────────

    #[tokio::test]
    async fn secret_missing_header_rejected() {
        let (status, body) = send(test_app(BearerAuth::secret("foobar")), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!body.starts_with("hello"));
    }

    #[tokio::test]
    async fn secret_matching_token_accepted_with_identity() {
        let (status, body) =
            send(test_app(BearerAuth::secret("foobar")), Some("Bearer foobar")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello foobar");
    }

    #[tokio::test]
    async fn secret_wrong_token_rejected() {
        for candidate in ["foobaz", "foobar ", " foobar", "fooba", "foobarx", "FOOBAR", ""] {
            let header = format!("{BEARER_PREFIX}{candidate}");
            let (status, _) = send(test_app(BearerAuth::secret("foobar")), Some(&header)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "candidate: {candidate:?}");
        }
    }

    #[tokio::test]
    async fn secret_non_bearer_scheme_rejected() {
        for header in ["foobar", "Basic foobar", "bearer foobar", "BEARER foobar", "Bearerfoobar"] {
            let (status, _) = send(test_app(BearerAuth::secret("foobar")), Some(header)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "header: {header:?}");
        }
    }

    #[tokio::test]
    async fn rejection_carries_bearer_challenge() {
        let response = test_app(BearerAuth::secret("foobar"))
            .oneshot(request(Some("Bearer nope")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    // ── Callback ─────────────────────────────────────────────────

    #[tokio::test]
    async fn func_acceptance_mirrors_callback() {
        let cases = [
            ("foo:spam", true),
            ("bar:spam", true),
            ("foo:eggs", false),
            ("bar:eggs", false),
            ("baz:spam", false),
            ("foo:spam:extra", false),
            ("dummy:", false),
            ("dummy", false),
            ("", false),
        ];

        for (credential, valid) in cases {
            let app = test_app(BearerAuth::func(move |_| valid));

            let (status, body) = send(app.clone(), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "no header, params: {credential:?}");
            assert!(!body.starts_with("hello"), "params: {credential:?}");

            let header = format!("{BEARER_PREFIX}{credential}");
            let (status, body) = send(app, Some(&header)).await;
            if valid {
                assert_eq!(status, StatusCode::OK, "params: {credential:?}");
                assert_eq!(body, format!("hello {credential}"));
            } else {
                assert_eq!(status, StatusCode::UNAUTHORIZED, "params: {credential:?}");
                assert!(!body.starts_with("hello"), "params: {credential:?}");
            }
        }
    }

    #[tokio::test]
    async fn func_receives_credential_verbatim() {
        let app = test_app(BearerAuth::func(|token| token == "foo:spam:extra"));
        let (status, body) = send(app, Some("Bearer foo:spam:extra")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello foo:spam:extra");
    }

    #[tokio::test]
    async fn func_may_accept_empty_credential() {
        let app = test_app(BearerAuth::func(str::is_empty));
        let (status, body) = send(app, Some("Bearer ")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello ");
    }

    #[tokio::test]
    async fn func_panic_is_rejection() {
        let app = test_app(BearerAuth::func(|_| panic!("validator bug")));
        let (status, body) = send(app, Some("Bearer foo:spam")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!body.starts_with("hello"));
    }

    // ── Building blocks ──────────────────────────────────────────

    #[test]
    fn extract_credential_strips_prefix_only() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_credential(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  a b "));
        assert_eq!(extract_credential(&headers), Some(" a b "));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(extract_credential(&headers), None);
    }

    #[tokio::test]
    async fn secret_utf8_credential_accepted() {
        let request = Request::builder()
            .uri("/")
            .header(
                header::AUTHORIZATION,
                HeaderValue::from_bytes("Bearer café".as_bytes()).unwrap(),
            )
            .body(Body::empty())
            .unwrap();

        let response = test_app(BearerAuth::secret("café"))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], "hello café".as_bytes());
    }

    #[test]
    fn extract_credential_keeps_utf8_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes("Bearer café:ünï".as_bytes()).unwrap(),
        );
        assert_eq!(extract_credential(&headers), Some("café:ünï"));
    }

    #[test]
    fn extract_credential_rejects_invalid_utf8() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff").unwrap(),
        );
        assert_eq!(extract_credential(&headers), None);
    }

    #[test]
    fn constant_time_eq_behaviour() {
        assert!(constant_time_eq("secret-token-123", "secret-token-123"));
        assert!(!constant_time_eq("wrong-token", "secret-token-123"));
        assert!(!constant_time_eq("secret", "secret-token-123"));
        assert!(!constant_time_eq("", "secret-token-123"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", BearerAuth::secret("hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("Secret"));
    }

    #[test]
    fn validator_is_shareable_across_tasks() {
        fn assert_send_sync<T: Send + Sync + Clone + 'static>() {}
        assert_send_sync::<BearerAuth>();
    }
}
