//! Access gate for data-bearing pages
//!
//! Anonymous visitors are sent to `/`. Drawing a winner additionally needs the
//! social account's stored credential; without one the user is sent to
//! `/profile` to link it. Neither redirect touches the social API.

use crate::handlers::render::Viewer;
use crate::identity::UserStore;
use crate::models::{AccessCredential, AppSession, FlashLevel};
use crate::session::SessionManager;
use crate::utils::responses::ResponseBuilder;
use actix_web::{HttpRequest, HttpResponse};
use log::{debug, error};

pub const LINK_SOCIAL_ACCOUNT: &str = "Sign in with Twitter to link your account before drawing a winner.";

/// Result of resolving the session cookie against the user store
pub struct Visit {
    pub session: AppSession,
    pub viewer: Option<Viewer>,
}

/// Resolve the session user without requiring one
///
/// A session whose user vanished from the store reads as anonymous.
pub fn visit(req: &HttpRequest, sessions: &SessionManager, store: &dyn UserStore) -> Visit {
    let mut session = sessions.load(req);
    let viewer = session.user.clone().and_then(|session_user| {
        match store.get(&session_user.user_id) {
            Ok(Some(user)) => Some(Viewer { session_user, user }),
            Ok(None) => {
                debug!("Session user {} no longer exists", session_user.user_id);
                None
            }
            Err(e) => {
                error!("Failed to load session user {}: {e}", session_user.user_id);
                None
            }
        }
    });
    if viewer.is_none() {
        session.user = None;
    }
    Visit { session, viewer }
}

/// The signed-in user, or a redirect to the landing page
///
/// # Errors
///
/// Returns the redirect response when nobody is signed in.
pub fn require_user(
    req: &HttpRequest,
    sessions: &SessionManager,
    store: &dyn UserStore,
) -> Result<(AppSession, Viewer), HttpResponse> {
    let Visit { session, viewer } = visit(req, sessions, store);
    match viewer {
        Some(viewer) => Ok((session, viewer)),
        None => {
            debug!("Anonymous request to {}, redirecting home", req.path());
            Err(ResponseBuilder::redirect("/").build())
        }
    }
}

/// The signed-in user and their social credential
///
/// # Errors
///
/// Redirects to `/` when nobody is signed in and to `/profile`, with a flash,
/// when no credential from `social_provider` is stored.
pub fn require_social_account(
    req: &HttpRequest,
    sessions: &SessionManager,
    store: &dyn UserStore,
    social_provider: &str,
) -> Result<(AppSession, Viewer, AccessCredential), HttpResponse> {
    let (mut session, viewer) = require_user(req, sessions, store)?;

    let Some(credential) = viewer.user.credential_for(social_provider).cloned() else {
        debug!("User {} has no {social_provider} credential", viewer.user.id);
        session.add_flash(FlashLevel::Error, LINK_SOCIAL_ACCOUNT);
        let redirect = ResponseBuilder::redirect("/profile");
        return Err(match sessions.session_cookie(&session) {
            Ok(cookie) => redirect.with_cookie(cookie).build(),
            Err(e) => {
                error!("Failed to store flash: {e}");
                redirect.build()
            }
        });
    };

    Ok((session, viewer, credential))
}
