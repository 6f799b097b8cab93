//! Assertion helpers for responses coming out of `test::call_service`

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::test::read_body;

/// Assert that a response has the expected status code
///
/// # Panics
///
/// Panics if the response status does not match the expected status code.
pub fn assert_status(response: &ServiceResponse, expected_status: u16) {
    assert_eq!(
        response.status().as_u16(),
        expected_status,
        "Expected status {expected_status}, got {}",
        response.status()
    );
}

/// `Location` header of a response, empty when missing
#[must_use]
pub fn location(response: &ServiceResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Assert that a response is a 302 redirect to `expected_location`
///
/// # Panics
///
/// Panics if the response is not a redirect or points elsewhere.
pub fn assert_redirect(response: &ServiceResponse, expected_location: &str) {
    assert_status(response, 302);
    assert_eq!(location(response), expected_location, "Redirect target differs");
}

/// Cookie `name` as set by the response
#[must_use]
pub fn response_cookie(response: &ServiceResponse, name: &str) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(Cookie::into_owned)
}

/// Assert that the response removes cookie `name`
///
/// # Panics
///
/// Panics if the cookie is not cleared.
pub fn assert_cookie_cleared(response: &ServiceResponse, name: &str) {
    let cookie = response_cookie(response, name)
        .unwrap_or_else(|| panic!("Expected cookie '{name}' to be cleared"));
    assert!(cookie.value().is_empty(), "Cookie '{name}' still has a value");
}

/// Read the response body as text
pub async fn body_text(response: ServiceResponse) -> String {
    let body = read_body(response).await;
    String::from_utf8_lossy(&body).into_owned()
}
