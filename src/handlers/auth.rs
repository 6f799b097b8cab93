// Sign-in, provider callback and logout handlers
use crate::handlers::gate::visit;
use crate::handlers::render::PageRenderer;
use crate::identity::{IdentityResolver, SignInOutcome};
use crate::models::{AppSession, FlashLevel};
use crate::oauth::{OAuthCallback, OAuthError, OAuthState, ProviderRegistry};
use crate::settings::WinnerSettings;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error, info};

pub const SIGNED_OUT: &str = "You have been signed out";

/// GET /auth/{provider}
pub async fn sign_in(
    req: HttpRequest,
    path: web::Path<String>,
    settings: web::Data<WinnerSettings>,
    registry: web::Data<ProviderRegistry>,
    pages: web::Data<PageRenderer>,
) -> HttpResponse {
    let provider_name = path.into_inner();
    let session = pages.sessions().load(&req);

    let Some(provider) = registry.get(&provider_name) else {
        debug!("Sign-in requested for unknown provider {provider_name}");
        return pages.error_page(
            session,
            None,
            StatusCode::NOT_FOUND,
            &format!("Unknown sign-in provider: {provider_name}"),
        );
    };

    let callback_url = settings.callback_url(provider.name());
    let start = match provider.begin(&callback_url).await {
        Ok(start) => start,
        Err(e) => {
            error!("Failed to start {provider_name} sign-in: {e}");
            return pages.error_page(
                session,
                None,
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Could not start signing in with {}.", provider.display_name()),
            );
        }
    };

    match pages.sessions().oauth_state_cookie(&start.state) {
        Ok(cookie) => {
            info!("Redirecting to {} for sign-in", provider.display_name());
            ResponseBuilder::redirect(&start.authorization_url)
                .with_cookie(cookie)
                .build()
        }
        Err(e) => {
            error!("Failed to store sign-in state: {e}");
            pages.error_page(
                session,
                None,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not start signing in.",
            )
        }
    }
}

/// GET|POST /auth/{provider}/callback
pub async fn callback(
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<OAuthCallback>,
    form: Option<web::Form<OAuthCallback>>,
    identity: web::Data<IdentityResolver>,
    registry: web::Data<ProviderRegistry>,
    pages: web::Data<PageRenderer>,
) -> HttpResponse {
    let provider_name = path.into_inner();
    let callback_data = extract_callback_data(query, form);
    LoggingHelper::log_callback_debug(&req, &callback_data);

    let sessions = pages.sessions();
    let visit = visit(&req, sessions, identity.store().as_ref());
    let mut session = visit.session;
    let clear_state = sessions.clear_oauth_state_cookie();

    let Some(provider) = registry.get(&provider_name) else {
        debug!("Callback for unknown provider {provider_name}");
        return pages.error_page(
            session,
            visit.viewer.as_ref(),
            StatusCode::NOT_FOUND,
            &format!("Unknown sign-in provider: {provider_name}"),
        );
    };

    let result = match stored_state(&req, &pages, &provider_name) {
        Ok(state) => provider.complete(&callback_data, &state).await,
        Err(e) => Err(e),
    };
    let sign_in = match result {
        Ok(sign_in) => sign_in,
        Err(e) => {
            error!("{provider_name} sign-in failed: {e}");
            return auth_failure(&pages, session, clear_state, &e.to_string());
        }
    };

    let auth_id = sign_in.auth_id();
    let outcome = match identity.sign_in(sign_in, session.user.as_ref()) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Could not resolve user for {auth_id}: {e}");
            return auth_failure(&pages, session, clear_state, &e.to_string());
        }
    };

    let user = outcome.user();
    if outcome.establishes_session() {
        sessions.sign_in(&mut session, user, auth_id);
        LoggingHelper::log_session_created(&user.id, provider.name());
    }
    session.add_flash(FlashLevel::Success, welcome_message(&outcome, provider.display_name()));

    match sessions.session_cookie(&session) {
        Ok(cookie) => ResponseBuilder::redirect("/")
            .with_cookies(vec![cookie, clear_state])
            .build(),
        Err(e) => {
            error!("Failed to create session cookie: {e}");
            auth_failure(&pages, session, clear_state, "Could not create your session.")
        }
    }
}

/// GET /logout
pub async fn logout(req: HttpRequest, pages: web::Data<PageRenderer>) -> HttpResponse {
    let sessions = pages.sessions();
    let mut session = sessions.load(&req);
    if let Some(user) = &session.user {
        info!("User {} signed out", user.user_id);
    }

    session.user = None;
    session.add_flash(FlashLevel::Info, SIGNED_OUT);

    // Keep the cookie so the flash survives the redirect; it no longer carries a user
    let cookie = sessions
        .session_cookie(&session)
        .unwrap_or_else(|e| {
            error!("Failed to write signed-out session: {e}");
            sessions.clear_session_cookie()
        });
    ResponseBuilder::redirect("/").with_cookie(cookie).build()
}

/// Extract callback data from either query parameters or a form post
fn extract_callback_data(
    query: web::Query<OAuthCallback>,
    form: Option<web::Form<OAuthCallback>>,
) -> OAuthCallback {
    if let Some(form_data) = form {
        debug!("OAuth callback received via form_post");
        form_data.into_inner()
    } else {
        query.into_inner()
    }
}

/// The sign-in state remembered for `provider`
fn stored_state(
    req: &HttpRequest,
    pages: &PageRenderer,
    provider: &str,
) -> Result<OAuthState, OAuthError> {
    pages
        .sessions()
        .oauth_state(req)
        .filter(|state| state.provider == provider)
        .ok_or(OAuthError::StateMismatch)
}

fn welcome_message(outcome: &SignInOutcome, provider_label: &str) -> String {
    match outcome {
        SignInOutcome::Existing(user) => format!("Welcome back, {}!", user.display_name()),
        SignInOutcome::Created(user) => format!("Welcome, {}!", user.display_name()),
        SignInOutcome::Linked(_) => format!("Your {provider_label} account is now linked."),
    }
}

fn auth_failure(
    pages: &PageRenderer,
    session: AppSession,
    clear_state: actix_web::cookie::Cookie<'static>,
    reason: &str,
) -> HttpResponse {
    let mut response = pages.error_page(
        session,
        None,
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!("Signing in failed: {reason}"),
    );
    if let Err(e) = response.add_cookie(&clear_state) {
        error!("Failed to clear sign-in state: {e}");
    }
    response
}
