use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tower_http::trace::MakeSpan;
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id carried in request extensions and echoed to the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// The caller's id when it parses as a UUID, a fresh v4 id otherwise
    pub fn resolve(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map_or_else(|| Self(Uuid::new_v4()), Self)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = RequestId::resolve(request.headers());
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// `TraceLayer` span carrying the id assigned by [`request_id_middleware`]
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let span = tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = tracing::field::Empty,
        );
        if let Some(id) = request.extensions().get::<RequestId>() {
            span.record("request_id", tracing::field::display(id));
        }
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderName, middleware, routing::get, Extension, Router};
    use axum_test::TestServer;

    fn header_name() -> HeaderName {
        HeaderName::from_static(REQUEST_ID_HEADER)
    }

    async fn echo(Extension(request_id): Extension<RequestId>) -> String {
        request_id.to_string()
    }

    fn server() -> TestServer {
        let app = Router::new()
            .route("/", get(echo))
            .layer(middleware::from_fn(request_id_middleware));
        TestServer::new(app).unwrap()
    }

    #[test]
    fn test_resolve_trims_and_parses_caller_id() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header_name(),
            HeaderValue::from_str(&format!(" {} ", id)).unwrap(),
        );
        assert_eq!(RequestId::resolve(&headers), RequestId(id));
        assert_ne!(RequestId::resolve(&HeaderMap::new()), RequestId(id));
    }

    #[tokio::test]
    async fn test_generates_id_when_absent() {
        let response = server().get("/").await;
        let header = response.header(REQUEST_ID_HEADER);
        let echoed = header.to_str().unwrap();
        assert!(Uuid::parse_str(echoed).is_ok());
        assert_eq!(response.text(), echoed);
    }

    #[tokio::test]
    async fn test_reuses_valid_caller_id() {
        let id = Uuid::new_v4().to_string();
        let response = server()
            .get("/")
            .add_header(header_name(), HeaderValue::from_str(&id).unwrap())
            .await;
        assert_eq!(response.header(REQUEST_ID_HEADER), id.as_str());
        assert_eq!(response.text(), id);
    }

    #[tokio::test]
    async fn test_replaces_invalid_caller_id() {
        let response = server()
            .get("/")
            .add_header(header_name(), HeaderValue::from_static("not-a-uuid"))
            .await;
        assert_ne!(response.header(REQUEST_ID_HEADER), "not-a-uuid");
    }
}
