use actix_web::{cookie::Cookie, HttpRequest};
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

use crate::models::AppSession;
use crate::oauth::OAuthState;
use crate::utils::crypto::{decrypt_data, encrypt_data};

/// Cookie names used across the application
pub const SESSION_COOKIE: &str = "winner_session";
pub const OAUTH_STATE_COOKIE: &str = "winner_oauth_state";

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: actix_web::cookie::SameSite,
    pub path: String,
    pub max_age: actix_web::cookie::time::Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: actix_web::cookie::SameSite::Lax,
            path: "/".to_string(),
            max_age: actix_web::cookie::time::Duration::hours(24),
        }
    }
}

/// Cookie factory for creating encrypted cookies with proper configuration
#[derive(Clone)]
pub struct CookieFactory {
    encryption_key: [u8; 32],
    cookie_secure: bool,
    session_duration_hours: u32,
}

impl CookieFactory {
    #[must_use]
    pub fn new(encryption_key: [u8; 32], cookie_secure: bool, session_duration_hours: u32) -> Self {
        Self {
            encryption_key,
            cookie_secure,
            session_duration_hours,
        }
    }

    /// Generic method to create a cookie with encrypted data
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_cookie<T: Serialize>(
        &self,
        name: &str,
        data: &T,
        options: CookieOptions,
    ) -> Result<Cookie<'static>> {
        let value = encrypt_data(data, &self.encryption_key)?;

        Ok(Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish())
    }

    /// Create the encrypted session cookie
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_session_cookie(&self, session: &AppSession) -> Result<Cookie<'static>> {
        self.create_cookie(
            SESSION_COOKIE,
            session,
            CookieOptions {
                max_age: actix_web::cookie::time::Duration::hours(i64::from(
                    self.session_duration_hours,
                )),
                ..Default::default()
            },
        )
    }

    /// Create a temporary cookie for storing OAuth state during the sign-in flow
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_temporary_state_cookie(
        &self,
        oauth_state: &OAuthState,
    ) -> Result<Cookie<'static>> {
        let cookie = self.create_cookie(
            OAUTH_STATE_COOKIE,
            oauth_state,
            CookieOptions {
                max_age: actix_web::cookie::time::Duration::minutes(10),
                ..Default::default()
            },
        )?;

        log::debug!(
            "Creating temporary state cookie: secure={}, name={}, encrypted_len={}",
            self.cookie_secure,
            OAUTH_STATE_COOKIE,
            cookie.value().len()
        );

        Ok(cookie)
    }

    /// Create an expired cookie that clears `name`
    #[must_use]
    pub fn create_expired_cookie(&self, name: &str) -> Cookie<'static> {
        create_expired_cookie(name, self.cookie_secure)
    }

    /// Decrypt cookie `name`; missing or undecryptable cookies yield `None`
    #[must_use]
    pub fn read_cookie<T: DeserializeOwned>(&self, req: &HttpRequest, name: &str) -> Option<T> {
        let cookie = req.cookie(name)?;
        if cookie.value().is_empty() {
            return None;
        }
        match decrypt_data::<T>(cookie.value(), &self.encryption_key) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("Failed to decrypt {name} cookie: {e}");
                None
            }
        }
    }
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(secure)
        .same_site(actix_web::cookie::SameSite::Lax)
        .path("/")
        .max_age(actix_web::cookie::time::Duration::seconds(-1))
        .finish()
}
