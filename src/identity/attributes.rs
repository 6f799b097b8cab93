//! Per-provider mapping from raw profile payloads to [`UserAttributes`]

use crate::models::{ProfileField, UserAttributes};
use serde_json::Value;

/// How a payload key becomes a profile field
#[derive(Clone, Copy)]
pub enum AttributeRule {
    /// Copy the value as-is
    Copy(ProfileField),
    /// Compute the field from the value; `None` leaves the field unset
    Derive(ProfileField, fn(&Value) -> Option<String>),
}

impl AttributeRule {
    fn field(self) -> ProfileField {
        match self {
            Self::Copy(field) | Self::Derive(field, _) => field,
        }
    }

    fn apply(self, value: &Value) -> Option<String> {
        match self {
            Self::Copy(_) => scalar_to_string(value),
            Self::Derive(_, derive) => derive(value),
        }
    }
}

type RuleTable = &'static [(&'static str, AttributeRule)];

const FACEBOOK: RuleTable = &[
    ("id", AttributeRule::Derive(ProfileField::AvatarUrl, facebook_avatar)),
    ("name", AttributeRule::Copy(ProfileField::Name)),
    ("link", AttributeRule::Copy(ProfileField::Link)),
];

const GOOGLE: RuleTable = &[
    ("picture", AttributeRule::Copy(ProfileField::AvatarUrl)),
    ("name", AttributeRule::Copy(ProfileField::Name)),
    ("profile", AttributeRule::Copy(ProfileField::Link)),
];

const WINDOWS_LIVE: RuleTable = &[
    ("avatar_url", AttributeRule::Copy(ProfileField::AvatarUrl)),
    ("name", AttributeRule::Copy(ProfileField::Name)),
    ("link", AttributeRule::Copy(ProfileField::Link)),
];

// `link` comes first so a provider supplied value beats the derived fallback
const TWITTER: RuleTable = &[
    ("profile_image_url", AttributeRule::Copy(ProfileField::AvatarUrl)),
    ("screen_name", AttributeRule::Copy(ProfileField::Name)),
    ("link", AttributeRule::Copy(ProfileField::Link)),
    ("screen_name", AttributeRule::Derive(ProfileField::Link, twitter_link)),
];

const LINKEDIN: RuleTable = &[
    ("picture-url", AttributeRule::Copy(ProfileField::AvatarUrl)),
    ("first-name", AttributeRule::Copy(ProfileField::Name)),
    ("public-profile-url", AttributeRule::Copy(ProfileField::Link)),
];

const FOURSQUARE: RuleTable = &[
    ("photo", AttributeRule::Derive(ProfileField::AvatarUrl, foursquare_avatar)),
    ("firstName", AttributeRule::Copy(ProfileField::FirstName)),
    ("lastName", AttributeRule::Copy(ProfileField::LastName)),
    ("contact", AttributeRule::Derive(ProfileField::Email, foursquare_email)),
    ("id", AttributeRule::Derive(ProfileField::Link, foursquare_link)),
];

const OPENID: RuleTable = &[
    ("id", AttributeRule::Derive(ProfileField::AvatarUrl, missing_avatar)),
    ("nickname", AttributeRule::Copy(ProfileField::Name)),
    ("email", AttributeRule::Copy(ProfileField::Link)),
];

/// Rule table for `provider`, or `None` if the provider is not supported
#[must_use]
pub fn rules_for(provider: &str) -> Option<RuleTable> {
    match provider {
        "facebook" => Some(FACEBOOK),
        "google" => Some(GOOGLE),
        "windows_live" => Some(WINDOWS_LIVE),
        "twitter" => Some(TWITTER),
        "linkedin" | "linkedin2" => Some(LINKEDIN),
        "foursquare" => Some(FOURSQUARE),
        "openid" => Some(OPENID),
        _ => None,
    }
}

/// Map a raw provider payload onto canonical attributes
///
/// The first rule producing a value for a field wins. Keys absent from the
/// payload, and rules whose derivation yields nothing, leave fields unset.
///
/// Returns `None` if the provider has no mapping table.
#[must_use]
pub fn map_attributes(provider: &str, payload: &Value) -> Option<UserAttributes> {
    let rules = rules_for(provider)?;
    let mut attributes = UserAttributes::default();

    for (key, rule) in rules {
        let Some(value) = payload.get(*key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        if let Some(mapped) = rule.apply(value) {
            attributes.set_default(rule.field(), mapped);
        }
    }

    Some(attributes)
}

/// Render strings and numbers, which is what providers use for ids
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn facebook_avatar(id: &Value) -> Option<String> {
    scalar_to_string(id).map(|id| format!("http://graph.facebook.com/{id}/picture?type=large"))
}

fn twitter_link(screen_name: &Value) -> Option<String> {
    scalar_to_string(screen_name).map(|name| format!("https://twitter.com/{name}"))
}

fn foursquare_avatar(photo: &Value) -> Option<String> {
    let prefix = photo.get("prefix")?.as_str()?;
    let suffix = photo.get("suffix")?.as_str()?;
    Some(format!("{prefix}100x100{suffix}"))
}

fn foursquare_email(contact: &Value) -> Option<String> {
    contact.get("email").and_then(scalar_to_string)
}

fn foursquare_link(id: &Value) -> Option<String> {
    scalar_to_string(id).map(|id| format!("http://foursquare.com/user/{id}"))
}

/// Placeholder shipped in the assets folder for providers without avatars
pub const MISSING_AVATAR: &str = "/static/img/missing-avatar.png";

fn missing_avatar(_: &Value) -> Option<String> {
    Some(MISSING_AVATAR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_facebook_avatar_is_derived_from_id() {
        let attrs = map_attributes(
            "facebook",
            &json!({"id": "4", "name": "Mark", "link": "https://facebook.com/zuck"}),
        )
        .unwrap();
        assert_eq!(
            attrs.avatar_url.as_deref(),
            Some("http://graph.facebook.com/4/picture?type=large")
        );
        assert_eq!(attrs.name.as_deref(), Some("Mark"));
        assert_eq!(attrs.link.as_deref(), Some("https://facebook.com/zuck"));
    }

    #[test]
    fn test_google_copies_fields() {
        let attrs = map_attributes(
            "google",
            &json!({
                "picture": "https://lh3/photo.jpg",
                "name": "Ada",
                "profile": "https://plus.google.com/1",
                "email": "ada@example.com"
            }),
        )
        .unwrap();
        assert_eq!(attrs.avatar_url.as_deref(), Some("https://lh3/photo.jpg"));
        assert_eq!(attrs.name.as_deref(), Some("Ada"));
        assert_eq!(attrs.link.as_deref(), Some("https://plus.google.com/1"));
        // Not part of the google table
        assert!(attrs.email.is_none());
    }

    #[test]
    fn test_windows_live_copies_fields() {
        let attrs = map_attributes(
            "windows_live",
            &json!({"avatar_url": "a.png", "name": "Bill", "link": "https://live/bill"}),
        )
        .unwrap();
        assert_eq!(attrs.avatar_url.as_deref(), Some("a.png"));
        assert_eq!(attrs.name.as_deref(), Some("Bill"));
        assert_eq!(attrs.link.as_deref(), Some("https://live/bill"));
    }

    #[test]
    fn test_twitter_uses_screen_name() {
        let attrs = map_attributes(
            "twitter",
            &json!({
                "id_str": "12",
                "screen_name": "jack",
                "name": "Jack Dorsey",
                "profile_image_url": "http://pbs.twimg.com/jack.png"
            }),
        )
        .unwrap();
        assert_eq!(attrs.name.as_deref(), Some("jack"));
        assert_eq!(attrs.avatar_url.as_deref(), Some("http://pbs.twimg.com/jack.png"));
        assert_eq!(attrs.link.as_deref(), Some("https://twitter.com/jack"));
    }

    #[test]
    fn test_twitter_supplied_link_beats_fallback() {
        let attrs = map_attributes(
            "twitter",
            &json!({"screen_name": "jack", "link": "https://jack.example"}),
        )
        .unwrap();
        assert_eq!(attrs.link.as_deref(), Some("https://jack.example"));
    }

    #[test]
    fn test_linkedin_variants_share_table() {
        let payload = json!({
            "picture-url": "https://media.licdn.com/p.jpg",
            "first-name": "Reid",
            "public-profile-url": "https://linkedin.com/in/reid"
        });
        for provider in ["linkedin", "linkedin2"] {
            let attrs = map_attributes(provider, &payload).unwrap();
            assert_eq!(attrs.name.as_deref(), Some("Reid"));
            assert_eq!(attrs.avatar_url.as_deref(), Some("https://media.licdn.com/p.jpg"));
            assert_eq!(attrs.link.as_deref(), Some("https://linkedin.com/in/reid"));
        }
    }

    #[test]
    fn test_foursquare_derivations() {
        let attrs = map_attributes(
            "foursquare",
            &json!({
                "id": 12345,
                "firstName": "Dennis",
                "lastName": "Crowley",
                "photo": {"prefix": "https://irs0.4sqi.net/img/user/", "suffix": "/dc.jpg"},
                "contact": {"email": "dc@example.com", "twitter": "dens"}
            }),
        )
        .unwrap();
        assert_eq!(
            attrs.avatar_url.as_deref(),
            Some("https://irs0.4sqi.net/img/user/100x100/dc.jpg")
        );
        assert_eq!(attrs.first_name.as_deref(), Some("Dennis"));
        assert_eq!(attrs.last_name.as_deref(), Some("Crowley"));
        assert_eq!(attrs.email.as_deref(), Some("dc@example.com"));
        assert_eq!(attrs.link.as_deref(), Some("http://foursquare.com/user/12345"));
        assert!(attrs.name.is_none());
    }

    #[test]
    fn test_foursquare_incomplete_photo_is_skipped() {
        let attrs = map_attributes("foursquare", &json!({"photo": {"prefix": "x"}})).unwrap();
        assert!(attrs.avatar_url.is_none());
    }

    #[test]
    fn test_openid_uses_placeholder_avatar() {
        let attrs = map_attributes(
            "openid",
            &json!({"id": "https://me.example/", "nickname": "me", "email": "me@example.com"}),
        )
        .unwrap();
        assert_eq!(attrs.avatar_url.as_deref(), Some("/static/img/missing-avatar.png"));
        assert_eq!(attrs.name.as_deref(), Some("me"));
        assert_eq!(attrs.link.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_missing_keys_leave_fields_unset() {
        let attrs = map_attributes("google", &json!({"name": null})).unwrap();
        assert_eq!(attrs, UserAttributes::default());
    }

    #[test]
    fn test_unknown_provider() {
        assert!(map_attributes("myspace", &json!({})).is_none());
        assert!(rules_for("myspace").is_none());
    }
}
