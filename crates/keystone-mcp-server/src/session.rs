//! The caller's session cookie on inbound MCP requests

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::HeaderMap;
use http::header::COOKIE;
use http::request::Parts;
use rmcp::RoleServer;
use rmcp::service::RequestContext;

/// The `Cookie` header sent by an MCP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie(pub String);

impl SessionCookie {
    /// Every non-empty `Cookie` header, joined with `; `
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let cookies: Vec<&str> = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .collect();
        (!cookies.is_empty()).then(|| Self(cookies.join("; ")))
    }

    /// The cookie captured for the HTTP request behind an MCP request, if any
    pub fn from_context(context: &RequestContext<RoleServer>) -> Option<Self> {
        context.extensions.get::<Self>().cloned().or_else(|| {
            context.extensions.get::<Parts>().and_then(|parts| {
                parts
                    .extensions
                    .get::<Self>()
                    .cloned()
                    .or_else(|| Self::from_headers(&parts.headers))
            })
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Record the inbound `Cookie` header in the request extensions
pub async fn capture_session_cookie(mut request: Request, next: Next) -> Response {
    if let Some(cookie) = SessionCookie::from_headers(request.headers()) {
        request.extensions_mut().insert(cookie);
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Extension;
    use axum::routing::get;
    use axum::{Router, middleware};
    use http::HeaderValue;

    #[test]
    fn joins_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("keystonejs-session=abc"));
        headers.append(COOKIE, HeaderValue::from_static(" "));
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));

        assert_eq!(
            SessionCookie::from_headers(&headers),
            Some(SessionCookie("keystonejs-session=abc; theme=dark".to_string()))
        );
        assert_eq!(SessionCookie::from_headers(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn middleware_records_the_cookie() {
        async fn echo(cookie: Option<Extension<SessionCookie>>) -> String {
            cookie
                .map(|Extension(cookie)| cookie.0)
                .unwrap_or_else(|| "none".to_string())
        }

        let router = Router::new()
            .route("/", get(echo))
            .layer(middleware::from_fn(capture_session_cookie));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });

        let client = reqwest::Client::new();
        let with_cookie = client
            .get(format!("http://{address}/"))
            .header(COOKIE, "keystonejs-session=abc")
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let without_cookie = client
            .get(format!("http://{address}/"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert_eq!(with_cookie, "keystonejs-session=abc");
        assert_eq!(without_cookie, "none");
    }
}
