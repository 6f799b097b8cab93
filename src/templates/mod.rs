//! Page rendering
//!
//! Handlers build a JSON view-model and ask a [`TemplateRenderer`] for a named
//! page. [`HtmlTemplates`] is the built-in renderer; every page shares one
//! layout and every interpolated value goes through [`escape_html`].

pub mod layout;
pub mod pages;

use serde_json::Value;

pub use layout::escape_html;

pub const HOME: &str = "home.html";
pub const PROFILE: &str = "profile.html";
pub const FOLLOWERS: &str = "followers.html";
pub const RETWEETS: &str = "retweets.html";
pub const SEARCHES: &str = "searches.html";
pub const ERROR: &str = "error.html";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("failed to render {name}: {reason}")]
    Render { name: String, reason: String },
}

/// Resolves a named template against a view-model
pub trait TemplateRenderer: Send + Sync {
    /// Render template `name` with `context`
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::NotFound` for unknown names and
    /// `TemplateError::Render` when the context cannot be used.
    fn render(&self, name: &str, context: &Value) -> Result<String, TemplateError>;
}

/// Site name appended to every page title
const SITE_TITLE: &str = "Twitter Winner";

/// Built-in HTML pages
#[derive(Debug, Clone, Default)]
pub struct HtmlTemplates;

impl HtmlTemplates {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for HtmlTemplates {
    fn render(&self, name: &str, context: &Value) -> Result<String, TemplateError> {
        if !context.is_object() {
            return Err(TemplateError::Render {
                name: name.to_string(),
                reason: "context must be a JSON object".to_string(),
            });
        }

        let (heading, body) = match name {
            HOME => ("Home", pages::home(context)),
            PROFILE => ("Profile", pages::profile(context)),
            FOLLOWERS => ("Followers", pages::followers(context)),
            RETWEETS => ("Retweets", pages::retweets(context)),
            SEARCHES => ("Searches", pages::searches(context)),
            ERROR => ("Error", pages::error(context)),
            _ => return Err(TemplateError::NotFound(name.to_string())),
        };

        Ok(layout::page(&format!("{heading} - {SITE_TITLE}"), context, &body))
    }
}
