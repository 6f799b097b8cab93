//! Twitter REST v1.1 payloads, trimmed to what the pages display

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TwitterUser {
    pub id: u64,
    #[serde(default)]
    pub id_str: String,
    pub screen_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub profile_image_url_https: Option<String>,
    #[serde(default)]
    pub followers_count: u64,
}

impl TwitterUser {
    #[must_use]
    pub fn profile_url(&self) -> String {
        format!("https://twitter.com/{}", self.screen_name)
    }

    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.profile_image_url_https
            .as_deref()
            .or(self.profile_image_url.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tweet {
    pub id: u64,
    #[serde(default)]
    pub id_str: String,
    #[serde(alias = "full_text")]
    pub text: String,
    pub user: TwitterUser,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SavedSearch {
    pub id: u64,
    #[serde(default)]
    pub id_str: String,
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub created_at: String,
}

/// One page of `followers/list`
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UsersPage {
    pub users: Vec<TwitterUser>,
    pub next_cursor: i64,
}

/// One page of `statuses/retweeters/ids`
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IdsPage {
    pub ids: Vec<u64>,
    pub next_cursor: i64,
}

/// Response of `search/tweets`
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchResults {
    pub statuses: Vec<Tweet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_page_from_api_json() {
        let page: UsersPage = serde_json::from_str(
            r#"{
                "users": [{"id": 1, "id_str": "1", "screen_name": "a", "name": "A",
                           "profile_image_url_https": "https://pbs/a.png", "lang": "en"}],
                "next_cursor": 1489467234237774933,
                "next_cursor_str": "1489467234237774933",
                "previous_cursor": 0
            }"#,
        )
        .unwrap();
        assert_eq!(page.users[0].screen_name, "a");
        assert_eq!(page.users[0].avatar_url(), Some("https://pbs/a.png"));
        assert_eq!(page.next_cursor, 1_489_467_234_237_774_933);
    }

    #[test]
    fn test_tweet_accepts_full_text() {
        let tweet: Tweet = serde_json::from_str(
            r#"{"id": 9, "full_text": "long one", "user": {"id": 2, "screen_name": "b"}}"#,
        )
        .unwrap();
        assert_eq!(tweet.text, "long one");
        assert_eq!(tweet.user.profile_url(), "https://twitter.com/b");
        assert_eq!(tweet.retweet_count, 0);
    }
}
