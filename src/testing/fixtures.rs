//! Pre-built test data

use crate::models::{AccessCredential, AuthId, User, UserAttributes};
use crate::settings::WinnerSettings;
use crate::twitter::{SavedSearch, Tweet, TwitterUser};

use super::constants::{TEST_OTHER_PROVIDER, TEST_SESSION_SECRET, TEST_SOCIAL_PROVIDER};

#[must_use]
pub fn twitter_user(id: u64, screen_name: &str) -> TwitterUser {
    TwitterUser {
        id,
        id_str: id.to_string(),
        screen_name: screen_name.to_string(),
        name: screen_name.to_string(),
        profile_image_url: None,
        profile_image_url_https: Some(format!("https://pbs.twimg.com/{screen_name}.png")),
        followers_count: 0,
    }
}

#[must_use]
pub fn tweet(id: u64, text: &str, user: TwitterUser) -> Tweet {
    Tweet {
        id,
        id_str: id.to_string(),
        text: text.to_string(),
        user,
        retweet_count: 0,
        created_at: String::new(),
    }
}

/// Saved search named after its query
#[must_use]
pub fn saved_search(id: u64, query: &str) -> SavedSearch {
    SavedSearch {
        id,
        id_str: id.to_string(),
        name: query.to_string(),
        query: query.to_string(),
        created_at: String::new(),
    }
}

/// Settings suitable for tests: fixed session secret, insecure cookies
#[must_use]
pub fn test_settings() -> WinnerSettings {
    let mut settings = WinnerSettings::default();
    settings.session.session_secret = TEST_SESSION_SECRET.to_string();
    settings.cookies.secure = false;
    settings.application.redirect_base_url = "http://localhost:8080".to_string();
    settings.twitter.social_provider = TEST_SOCIAL_PROVIDER.to_string();
    settings
}

#[must_use]
pub fn social_credential(token: &str) -> AccessCredential {
    AccessCredential {
        provider: TEST_SOCIAL_PROVIDER.to_string(),
        token: token.to_string(),
        secret: format!("{token}-secret"),
    }
}

/// User signed up through the social provider, credential stored
#[must_use]
pub fn twitter_account(provider_user_id: &str, name: &str) -> User {
    let mut user = User::new(
        AuthId::new(TEST_SOCIAL_PROVIDER, provider_user_id),
        UserAttributes {
            name: Some(name.to_string()),
            ..UserAttributes::default()
        },
    );
    user.credential = Some(social_credential(&format!("token-{provider_user_id}")));
    user
}

/// User signed up through another provider, no social credential
#[must_use]
pub fn google_account(provider_user_id: &str, name: &str) -> User {
    User::new(
        AuthId::new(TEST_OTHER_PROVIDER, provider_user_id),
        UserAttributes {
            name: Some(name.to_string()),
            ..UserAttributes::default()
        },
    )
}
