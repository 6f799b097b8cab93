//! Page rendering shared by every handler
//!
//! Builds the base view-model (sign-in state, pending flashes, provider links),
//! merges the page's own values into it and turns renderer failures into HTTP
//! status codes.

use crate::models::{AppSession, SessionUser, User};
use crate::oauth::{ProviderRegistry, ProviderSummary};
use crate::session::SessionManager;
use crate::templates::{TemplateError, TemplateRenderer, ERROR};
use crate::utils::responses::ResponseBuilder;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use log::{error, warn};
use serde_json::{json, Value};
use std::sync::Arc;

/// The signed-in user as resolved from the session cookie and the store
#[derive(Debug, Clone)]
pub struct Viewer {
    pub session_user: SessionUser,
    pub user: User,
}

pub struct PageRenderer {
    templates: Arc<dyn TemplateRenderer>,
    sessions: SessionManager,
    providers: Vec<ProviderSummary>,
    social_provider: String,
}

impl PageRenderer {
    #[must_use]
    pub fn new(
        templates: Arc<dyn TemplateRenderer>,
        sessions: SessionManager,
        registry: &ProviderRegistry,
        social_provider: &str,
    ) -> Self {
        Self {
            templates,
            sessions,
            providers: registry.summaries(),
            social_provider: social_provider.to_string(),
        }
    }

    /// Values every page gets; pending flashes are moved out of `session`
    pub fn base_context(&self, session: &mut AppSession, viewer: Option<&Viewer>) -> Value {
        let mut context = json!({
            "logged_in": viewer.is_some(),
            "flashes": session.take_flashes(),
            "providers": self.providers,
        });

        if let Some(viewer) = viewer {
            context["user"] = self.user_view(&viewer.user);
            context["session"] = session_view(&viewer.session_user);
        }
        context
    }

    /// Render `name` with the base context plus the fields of `page`
    ///
    /// Flashes shown on this page are consumed: the session cookie is
    /// re-issued without them.
    #[must_use]
    pub fn render(
        &self,
        mut session: AppSession,
        viewer: Option<&Viewer>,
        name: &str,
        page: Value,
        status: StatusCode,
    ) -> HttpResponse {
        let had_flashes = !session.flashes.is_empty();
        let mut context = self.base_context(&mut session, viewer);
        merge(&mut context, page);

        match self.templates.render(name, &context) {
            Ok(html) => {
                let mut response = ResponseBuilder::html(status);
                if had_flashes {
                    match self.sessions.session_cookie(&session) {
                        Ok(cookie) => response = response.with_cookie(cookie),
                        Err(e) => warn!("Could not re-issue session cookie: {e}"),
                    }
                }
                response.body(html)
            }
            Err(TemplateError::NotFound(missing)) => {
                warn!("Template not found: {missing}");
                ResponseBuilder::not_found().build()
            }
            Err(e) => {
                error!("Failed to render {name}: {e}");
                ResponseBuilder::internal_server_error().build()
            }
        }
    }

    /// Render the error page with `message`
    #[must_use]
    pub fn error_page(
        &self,
        session: AppSession,
        viewer: Option<&Viewer>,
        status: StatusCode,
        message: &str,
    ) -> HttpResponse {
        self.render(session, viewer, ERROR, json!({ "message": message }), status)
    }

    /// What templates may see of a user; the stored credential stays out
    fn user_view(&self, user: &User) -> Value {
        json!({
            "id": user.id,
            "name": user.display_name(),
            "avatar_url": user.profile.avatar_url,
            "link": user.profile.link,
            "email": user.profile.email,
            "auth_ids": user.auth_ids,
            "social_linked": user.credential_for(&self.social_provider).is_some(),
            "social_provider": self.social_provider,
        })
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

fn session_view(session_user: &SessionUser) -> Value {
    json!({
        "user_id": session_user.user_id,
        "auth_id": session_user.auth_id,
        "provider": session_user.provider(),
        "signed_in_at": session_user.signed_in_at.to_rfc3339(),
        "expires_at": session_user.expires_at.to_rfc3339(),
    })
}

/// Copy the top-level fields of `page` over `context`
fn merge(context: &mut Value, page: Value) {
    let (Value::Object(target), Value::Object(source)) = (context, page) else {
        return;
    };
    for (key, value) in source {
        target.insert(key, value);
    }
}
