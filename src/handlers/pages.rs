// Landing, profile and winner pages
use crate::handlers::gate::{require_social_account, require_user, visit};
use crate::handlers::render::{PageRenderer, Viewer};
use crate::identity::IdentityResolver;
use crate::models::AppSession;
use crate::settings::WinnerSettings;
use crate::templates::{FOLLOWERS, HOME, PROFILE, RETWEETS, SEARCHES};
use crate::twitter::{ApiError, SocialApiFactory};
use crate::winner::WinnerService;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `?id=` of a tweet or saved search to draw from
#[derive(Debug, Default, Deserialize)]
pub struct DrawQuery {
    pub id: Option<String>,
}

impl DrawQuery {
    /// Parse the query string; a malformed one asks for the list
    fn parse(query: &str) -> Self {
        web::Query::<Self>::from_query(query)
            .map(web::Query::into_inner)
            .unwrap_or_else(|e| {
                debug!("Ignoring malformed draw query: {e}");
                Self::default()
            })
    }

    /// Numeric id to draw from, `None` for the list
    fn id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// GET /
pub async fn home(
    req: HttpRequest,
    identity: web::Data<IdentityResolver>,
    pages: web::Data<PageRenderer>,
) -> HttpResponse {
    let visit = visit(&req, pages.sessions(), identity.store().as_ref());
    pages.render(visit.session, visit.viewer.as_ref(), HOME, json!({}), StatusCode::OK)
}

/// HEAD /
///
/// Twitter's share button probes the page; it only needs a 200.
pub async fn home_head() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// GET /profile
pub async fn profile(
    req: HttpRequest,
    identity: web::Data<IdentityResolver>,
    pages: web::Data<PageRenderer>,
) -> HttpResponse {
    match require_user(&req, pages.sessions(), identity.store().as_ref()) {
        Ok((session, viewer)) => {
            pages.render(session, Some(&viewer), PROFILE, json!({}), StatusCode::OK)
        }
        Err(redirect) => redirect,
    }
}

/// GET /followers
pub async fn followers(
    req: HttpRequest,
    settings: web::Data<WinnerSettings>,
    identity: web::Data<IdentityResolver>,
    social: web::Data<dyn SocialApiFactory>,
    winners: web::Data<WinnerService>,
    pages: web::Data<PageRenderer>,
) -> HttpResponse {
    let (session, viewer, credential) = match require_social_account(
        &req,
        pages.sessions(),
        identity.store().as_ref(),
        &settings.twitter.social_provider,
    ) {
        Ok(granted) => granted,
        Err(redirect) => return redirect,
    };

    let api = social.client(&credential);
    let draw = winners.followers(api.as_ref()).await;
    pages.render(session, Some(&viewer), FOLLOWERS, to_context(&draw), StatusCode::OK)
}

/// GET /retweets[?id=]
pub async fn retweets(
    req: HttpRequest,
    settings: web::Data<WinnerSettings>,
    identity: web::Data<IdentityResolver>,
    social: web::Data<dyn SocialApiFactory>,
    winners: web::Data<WinnerService>,
    pages: web::Data<PageRenderer>,
) -> HttpResponse {
    let (session, viewer, credential) = match require_social_account(
        &req,
        pages.sessions(),
        identity.store().as_ref(),
        &settings.twitter.social_provider,
    ) {
        Ok(granted) => granted,
        Err(redirect) => return redirect,
    };

    let query = DrawQuery::parse(req.query_string());
    let api = social.client(&credential);
    let page = match query.id() {
        None => Ok(to_context(&winners.retweets_of_me(api.as_ref()).await)),
        Some(id) => winners
            .retweet_draw(api.as_ref(), id)
            .await
            .map(|draw| to_context(&draw)),
    };

    match page {
        Ok(page) => pages.render(session, Some(&viewer), RETWEETS, page, StatusCode::OK),
        Err(e) => upstream_failure(&pages, session, &viewer, "tweet", &e),
    }
}

/// GET /searches[?id=]
pub async fn searches(
    req: HttpRequest,
    settings: web::Data<WinnerSettings>,
    identity: web::Data<IdentityResolver>,
    social: web::Data<dyn SocialApiFactory>,
    winners: web::Data<WinnerService>,
    pages: web::Data<PageRenderer>,
) -> HttpResponse {
    let (session, viewer, credential) = match require_social_account(
        &req,
        pages.sessions(),
        identity.store().as_ref(),
        &settings.twitter.social_provider,
    ) {
        Ok(granted) => granted,
        Err(redirect) => return redirect,
    };

    let query = DrawQuery::parse(req.query_string());
    let api = social.client(&credential);
    let page = match query.id() {
        None => Ok(to_context(&winners.saved_searches(api.as_ref()).await)),
        Some(id) => winners
            .search_draw(api.as_ref(), id)
            .await
            .map(|draw| to_context(&draw)),
    };

    match page {
        Ok(page) => pages.render(session, Some(&viewer), SEARCHES, page, StatusCode::OK),
        Err(e) => upstream_failure(&pages, session, &viewer, "saved search", &e),
    }
}

fn to_context<T: Serialize>(view: &T) -> Value {
    serde_json::to_value(view).unwrap_or_else(|e| {
        error!("Failed to serialize page data: {e}");
        json!({})
    })
}

fn upstream_failure(
    pages: &PageRenderer,
    session: AppSession,
    viewer: &Viewer,
    what: &str,
    err: &ApiError,
) -> HttpResponse {
    error!("Twitter request for {what} failed: {err}");
    let message = match err {
        ApiError::RateLimited => {
            "Twitter's rate limit was reached. Please try again in a few minutes.".to_string()
        }
        _ => format!("Could not load the {what} from Twitter."),
    };
    pages.error_page(session, Some(viewer), StatusCode::BAD_GATEWAY, &message)
}
