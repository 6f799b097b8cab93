//! HTTP response handling
//!
//! One entry point for the responses handlers send: redirects carrying session
//! cookies, rendered HTML pages, and JSON for the health endpoint and for
//! errors raised outside page rendering.

use actix_web::{cookie::Cookie, http::header, http::StatusCode, HttpResponse};
use serde_json::json;

// ===============================
// CACHED RESPONSES
// ===============================

static CACHED_RESPONSES: std::sync::LazyLock<CachedResponses> =
    std::sync::LazyLock::new(CachedResponses::new);

/// Pre-serialized bodies for errors that carry no custom detail
struct CachedResponses {
    not_found: String,
    server_error: String,
}

impl CachedResponses {
    fn new() -> Self {
        Self {
            not_found: Self::create_json("not_found", "The requested resource does not exist"),
            server_error: Self::create_json("server_error", "An internal server error occurred"),
        }
    }

    fn create_json(error: &str, message: &str) -> String {
        json!({ "error": error, "message": message }).to_string()
    }

    fn respond(status: StatusCode, body: &str) -> HttpResponse {
        HttpResponse::build(status)
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(body.to_string())
    }
}

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    // ===============================
    // ERROR RESPONSE METHODS
    // ===============================

    #[must_use]
    pub fn not_found() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::NotFound)
    }

    #[must_use]
    pub fn internal_server_error() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::InternalServerError)
    }

    // ===============================
    // SUCCESS RESPONSE METHODS
    // ===============================

    /// Create a redirect response (302 Found)
    #[must_use]
    pub fn redirect(location: &str) -> RedirectBuilder {
        RedirectBuilder::new(location)
    }

    /// Create an HTML page response with the given status
    #[must_use]
    pub fn html(status: StatusCode) -> HtmlResponseBuilder {
        HtmlResponseBuilder::new(status)
    }

    /// Create an OK response (200) with JSON content
    #[must_use]
    pub fn ok() -> JsonResponseBuilder {
        JsonResponseBuilder::new(StatusCode::OK)
    }
}

// ===============================
// BUILDER TYPES
// ===============================

/// Builder for JSON error responses
pub struct ErrorResponseBuilder {
    error_type: ErrorType,
}

/// Builder for redirect responses
pub struct RedirectBuilder {
    location: String,
    cookies: Vec<Cookie<'static>>,
}

/// Builder for rendered pages
pub struct HtmlResponseBuilder {
    status: StatusCode,
    cookies: Vec<Cookie<'static>>,
}

/// Builder for JSON responses
pub struct JsonResponseBuilder {
    status: StatusCode,
}

#[derive(Clone, Copy)]
enum ErrorType {
    NotFound,
    InternalServerError,
}

impl ErrorType {
    const fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ===============================
// ERROR RESPONSE BUILDER IMPL
// ===============================

impl ErrorResponseBuilder {
    const fn new(error_type: ErrorType) -> Self {
        Self { error_type }
    }

    /// Build the final `HttpResponse`
    #[must_use]
    pub fn build(self) -> HttpResponse {
        let body = match self.error_type {
            ErrorType::NotFound => &CACHED_RESPONSES.not_found,
            ErrorType::InternalServerError => &CACHED_RESPONSES.server_error,
        };
        CachedResponses::respond(self.error_type.status(), body)
    }
}

// ===============================
// REDIRECT BUILDER IMPL
// ===============================

impl RedirectBuilder {
    fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    #[must_use]
    pub fn with_cookies(mut self, mut cookies: Vec<Cookie<'static>>) -> Self {
        self.cookies.append(&mut cookies);
        self
    }

    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder.append_header((header::LOCATION, self.location)).finish()
    }
}

// ===============================
// HTML RESPONSE BUILDER IMPL
// ===============================

impl HtmlResponseBuilder {
    const fn new(status: StatusCode) -> Self {
        Self {
            status,
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    #[must_use]
    pub fn body(self, html: String) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status);
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder.content_type("text/html; charset=utf-8").body(html)
    }
}

// ===============================
// JSON RESPONSE BUILDER IMPL
// ===============================

impl JsonResponseBuilder {
    const fn new(status: StatusCode) -> Self {
        Self { status }
    }

    #[must_use]
    pub fn json<T: serde::Serialize>(self, data: &T) -> HttpResponse {
        HttpResponse::build(self.status).json(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::Value;

    #[actix_web::test]
    async fn test_cached_error_bodies() {
        let response = ResponseBuilder::not_found().build();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "not_found");
    }

    #[actix_web::test]
    async fn test_server_error_body() {
        let response = ResponseBuilder::internal_server_error().build();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "server_error");
    }

    #[test]
    fn test_redirect_with_cookies() {
        let response = ResponseBuilder::redirect("/profile")
            .with_cookie(Cookie::new("a", "1"))
            .with_cookies(vec![Cookie::new("b", "2")])
            .build();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/profile"
        );
        assert_eq!(response.cookies().count(), 2);
    }

    #[test]
    fn test_html_response() {
        let response = ResponseBuilder::html(StatusCode::NOT_FOUND)
            .with_cookie(Cookie::new("a", "1"))
            .body("<p>x</p>".to_string());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }
}
