//! Session Manager - stateless encrypted session handling
//!
//! The whole session (signed-in user plus pending flashes) lives in one
//! AES-GCM encrypted cookie. A cookie that is missing, cannot be decrypted
//! or has expired reads as an anonymous session.

use crate::models::{AppSession, AuthId, SessionUser, User};
use crate::oauth::OAuthState;
use crate::session::cookie::{CookieFactory, OAUTH_STATE_COOKIE, SESSION_COOKIE};
use crate::settings::{WinnerSettings, MAX_SESSION_DURATION_HOURS};
use crate::utils::crypto::derive_encryption_key;
use actix_web::cookie::Cookie;
use actix_web::HttpRequest;
use chrono::{DateTime, TimeDelta, Utc};

// =============================================================================
// Types and Error Handling
// =============================================================================

/// Failure to seal a cookie
#[derive(Debug)]
pub struct SessionError(anyhow::Error);

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

// =============================================================================
// Session Manager
// =============================================================================

#[derive(Clone)]
pub struct SessionManager {
    session_duration_hours: u32,
    cookie_factory: CookieFactory,
}

impl SessionManager {
    /// `session_duration_hours` is clamped to `1..=MAX_SESSION_DURATION_HOURS`
    #[must_use]
    pub fn new(key: &[u8], cookie_secure: bool, session_duration_hours: u64) -> Self {
        let session_duration_hours = bounded_hours(session_duration_hours);
        Self {
            session_duration_hours,
            cookie_factory: CookieFactory::new(
                derive_encryption_key(key),
                cookie_secure,
                session_duration_hours,
            ),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &WinnerSettings) -> Self {
        Self::new(
            settings.session.session_secret.as_bytes(),
            settings.cookies.secure,
            settings.session.session_duration_hours,
        )
    }

    // =========================================================================
    // Session Extraction
    // =========================================================================

    /// Read the session from the request, falling back to anonymous
    #[must_use]
    pub fn load(&self, req: &HttpRequest) -> AppSession {
        let mut session: AppSession = self
            .cookie_factory
            .read_cookie(req, SESSION_COOKIE)
            .unwrap_or_default();

        if session.user.as_ref().is_some_and(SessionUser::is_expired) {
            log::debug!("Session expired, continuing anonymously");
            session.user = None;
        }
        session
    }

    /// OAuth state stored when the sign-in started
    #[must_use]
    pub fn oauth_state(&self, req: &HttpRequest) -> Option<OAuthState> {
        self.cookie_factory.read_cookie(req, OAUTH_STATE_COOKIE)
    }

    // =========================================================================
    // Session Creation
    // =========================================================================

    /// Bind `session` to `user`, signed in through `auth_id`
    pub fn sign_in(&self, session: &mut AppSession, user: &User, auth_id: AuthId) {
        let now = Utc::now();
        let expires_at = TimeDelta::try_hours(i64::from(self.session_duration_hours))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        session.user = Some(SessionUser {
            user_id: user.id.clone(),
            auth_id,
            signed_in_at: now,
            expires_at,
        });
    }

    // =========================================================================
    // Cookies
    // =========================================================================

    /// Encrypted cookie carrying `session`
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn session_cookie(&self, session: &AppSession) -> Result<Cookie<'static>, SessionError> {
        Ok(self.cookie_factory.create_session_cookie(session)?)
    }

    #[must_use]
    pub fn clear_session_cookie(&self) -> Cookie<'static> {
        self.cookie_factory.create_expired_cookie(SESSION_COOKIE)
    }

    /// Short-lived cookie remembering an in-flight sign-in
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn oauth_state_cookie(&self, state: &OAuthState) -> Result<Cookie<'static>, SessionError> {
        Ok(self.cookie_factory.create_temporary_state_cookie(state)?)
    }

    #[must_use]
    pub fn clear_oauth_state_cookie(&self) -> Cookie<'static> {
        self.cookie_factory.create_expired_cookie(OAUTH_STATE_COOKIE)
    }
}

fn bounded_hours(hours: u64) -> u32 {
    let clamped = hours.clamp(1, MAX_SESSION_DURATION_HOURS);
    if clamped != hours {
        log::warn!("Session duration of {hours} hours is out of range, using {clamped}");
    }
    u32::try_from(clamped).unwrap_or(u32::MAX)
}
