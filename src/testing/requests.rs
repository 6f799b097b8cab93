//! Request builder for driving the routes in tests

use actix_web::cookie::Cookie;
use actix_web::http::Method;
use actix_web::test::TestRequest;

/// Builder for requests sent through `test::call_service`
pub struct RequestBuilder {
    method: Method,
    uri: String,
    cookies: Vec<Cookie<'static>>,
    form: Vec<(String, String)>,
}

impl RequestBuilder {
    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self {
            method: Method::GET,
            uri: uri.to_string(),
            cookies: Vec::new(),
            form: Vec::new(),
        }
    }

    #[must_use]
    pub fn head(uri: &str) -> Self {
        Self {
            method: Method::HEAD,
            ..Self::get(uri)
        }
    }

    #[must_use]
    pub fn post(uri: &str) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(uri)
        }
    }

    /// Add a cookie to the request
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add an url-encoded form field
    #[must_use]
    pub fn form_field(mut self, name: &str, value: &str) -> Self {
        self.form.push((name.to_string(), value.to_string()));
        self
    }

    /// Build the final `TestRequest`
    #[must_use]
    pub fn build(self) -> TestRequest {
        let mut req = TestRequest::default().method(self.method).uri(&self.uri);

        for cookie in self.cookies {
            req = req.cookie(cookie);
        }

        if !self.form.is_empty() {
            req = req.set_form(self.form);
        }

        req
    }
}

/// OAuth callback as a provider redirect would send it
#[must_use]
pub fn callback(provider: &str, code: &str, state: &str) -> RequestBuilder {
    RequestBuilder::get(&format!(
        "/auth/{provider}/callback?code={code}&state={state}"
    ))
}
