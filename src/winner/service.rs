//! Winner draws for followers, retweeters and saved-search authors

use crate::twitter::{
    ApiError, SavedSearch, SocialApi, Tweet, TwitterUser, FOLLOWERS_PAGE_SIZE,
    RETWEETERS_PAGE_SIZE, RETWEETS_OF_ME_COUNT, SEARCH_PAGE_SIZE,
};
use crate::utils::logging::LoggingHelper;
use crate::winner::collect::{collect_pages, Collected};
use crate::winner::draw::{draw, UniformPicker, WinnerPicker};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct FollowersDraw {
    pub followers: Vec<TwitterUser>,
    pub winner: Option<TwitterUser>,
    pub incomplete_list: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetweetList {
    pub retweets: Vec<Tweet>,
    pub incomplete_list: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetweetDraw {
    pub retweet: Tweet,
    pub retweeter_count: usize,
    pub winner: Option<TwitterUser>,
    pub incomplete_list: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchList {
    pub searches: Vec<SavedSearch>,
    pub incomplete_list: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchDraw {
    pub search: SavedSearch,
    pub tweet_count: usize,
    pub winner: Option<TwitterUser>,
    /// The winning post; always by `winner`
    pub tweet: Option<Tweet>,
    pub incomplete_list: bool,
}

/// Runs the per-page fetch-then-draw logic against a [`SocialApi`]
#[derive(Clone)]
pub struct WinnerService {
    picker: Arc<dyn WinnerPicker>,
}

impl Default for WinnerService {
    fn default() -> Self {
        Self::new(Arc::new(UniformPicker))
    }
}

impl WinnerService {
    #[must_use]
    pub fn new(picker: Arc<dyn WinnerPicker>) -> Self {
        Self { picker }
    }

    /// Every follower, with one of them drawn as winner
    pub async fn followers(&self, api: &dyn SocialApi) -> FollowersDraw {
        let collected = collect_pages("followers", |cursor| {
            api.followers_page(cursor, FOLLOWERS_PAGE_SIZE)
        })
        .await;
        report_failure(api, &collected).await;

        let winner = draw(self.picker.as_ref(), &collected.items).map(|(_, user)| user.clone());
        FollowersDraw {
            incomplete_list: collected.incomplete(),
            followers: collected.items,
            winner,
        }
    }

    /// The caller's tweets that were retweeted
    pub async fn retweets_of_me(&self, api: &dyn SocialApi) -> RetweetList {
        let collected =
            Collected::from_result("retweets", api.retweets_of_me(RETWEETS_OF_ME_COUNT).await);
        report_failure(api, &collected).await;

        RetweetList {
            incomplete_list: collected.incomplete(),
            retweets: collected.items,
        }
    }

    /// One retweeter of tweet `id` drawn as winner
    ///
    /// Only the winner's profile is fetched, not every retweeter's.
    ///
    /// # Errors
    ///
    /// Returns an error if the tweet or the winner's profile cannot be fetched
    pub async fn retweet_draw(&self, api: &dyn SocialApi, id: &str) -> Result<RetweetDraw, ApiError> {
        let retweet = api.status(id).await?;

        let collected = collect_pages("retweeters", |cursor| {
            api.retweeter_ids_page(id, cursor, RETWEETERS_PAGE_SIZE)
        })
        .await;
        report_failure(api, &collected).await;

        let winner_id = draw(self.picker.as_ref(), &collected.items).map(|(_, id)| *id);
        let winner = match winner_id {
            Some(winner_id) => Some(api.user(&winner_id.to_string()).await?),
            None => None,
        };

        Ok(RetweetDraw {
            retweet,
            retweeter_count: collected.items.len(),
            winner,
            incomplete_list: collected.incomplete(),
        })
    }

    /// The user's saved searches
    pub async fn saved_searches(&self, api: &dyn SocialApi) -> SearchList {
        let collected = Collected::from_result("saved searches", api.saved_searches().await);
        report_failure(api, &collected).await;

        SearchList {
            incomplete_list: collected.incomplete(),
            searches: collected.items,
        }
    }

    /// Run saved search `id` and draw one matching post; its author wins
    ///
    /// # Errors
    ///
    /// Returns an error if the saved search itself cannot be fetched
    pub async fn search_draw(&self, api: &dyn SocialApi, id: &str) -> Result<SearchDraw, ApiError> {
        let search = api.saved_search(id).await?;

        let collected = Collected::from_result(
            "search results",
            api.search(&search.query, SEARCH_PAGE_SIZE)
                .await
                .map(|results| results.statuses),
        );
        report_failure(api, &collected).await;

        let tweet = draw(self.picker.as_ref(), &collected.items).map(|(_, tweet)| tweet.clone());
        Ok(SearchDraw {
            tweet_count: collected.items.len(),
            winner: tweet.as_ref().map(|tweet| tweet.user.clone()),
            tweet,
            search,
            incomplete_list: collected.incomplete(),
        })
    }
}

/// After an upstream failure, log the current rate limit snapshot if we can get one
async fn report_failure<T>(api: &dyn SocialApi, collected: &Collected<T>) {
    if collected.failure.is_none() {
        return;
    }
    match api.rate_limit_status("statuses").await {
        Ok(status) => LoggingHelper::log_rate_limit_status(&status),
        Err(err) => LoggingHelper::log_rate_limit_unavailable(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{saved_search, tweet, twitter_user};
    use crate::testing::mock::{FixedPicker, StubSocialApi};

    fn service(index: usize) -> WinnerService {
        WinnerService::new(Arc::new(FixedPicker::new(index)))
    }

    #[actix_web::test]
    async fn test_followers_draw_over_all_pages() {
        let api = StubSocialApi::new().with_followers(vec![
            vec![twitter_user(1, "a"), twitter_user(2, "b")],
            vec![twitter_user(3, "c")],
        ]);

        let result = service(2).followers(&api).await;

        assert_eq!(result.followers.len(), 3);
        assert_eq!(result.winner.map(|u| u.screen_name).as_deref(), Some("c"));
        assert!(!result.incomplete_list);
        assert_eq!(api.rate_limit_calls(), 0);
    }

    #[actix_web::test]
    async fn test_followers_partial_on_failure() {
        let api = StubSocialApi::new()
            .with_followers(vec![
                vec![twitter_user(1, "a")],
                vec![twitter_user(2, "b")],
                vec![twitter_user(3, "c")],
            ])
            .fail_followers_at(1);

        let result = service(0).followers(&api).await;

        assert_eq!(result.followers.len(), 1);
        assert!(result.incomplete_list);
        assert_eq!(result.winner.map(|u| u.screen_name).as_deref(), Some("a"));
        assert_eq!(api.rate_limit_calls(), 1);
    }

    #[actix_web::test]
    async fn test_no_followers_no_winner() {
        let api = StubSocialApi::new();
        let result = WinnerService::default().followers(&api).await;
        assert!(result.followers.is_empty());
        assert!(result.winner.is_none());
        assert!(!result.incomplete_list);
    }

    #[actix_web::test]
    async fn test_retweet_draw_looks_up_only_the_winner() {
        let api = StubSocialApi::new()
            .with_status(tweet(50, "giveaway!", twitter_user(1, "me")))
            .with_retweeters("50", vec![vec![10, 11], vec![12]])
            .with_user(twitter_user(11, "lucky"));

        let result = service(1).retweet_draw(&api, "50").await.unwrap();

        assert_eq!(result.retweeter_count, 3);
        assert_eq!(result.winner.map(|u| u.screen_name).as_deref(), Some("lucky"));
        assert_eq!(api.user_lookups(), vec!["11".to_string()]);
    }

    #[actix_web::test]
    async fn test_retweet_draw_without_retweeters() {
        let api = StubSocialApi::new().with_status(tweet(50, "nobody cares", twitter_user(1, "me")));
        let result = service(0).retweet_draw(&api, "50").await.unwrap();
        assert_eq!(result.retweeter_count, 0);
        assert!(result.winner.is_none());
        assert!(api.user_lookups().is_empty());
    }

    #[actix_web::test]
    async fn test_retweet_draw_unknown_tweet_is_error() {
        let api = StubSocialApi::new();
        assert!(service(0).retweet_draw(&api, "404").await.is_err());
    }

    #[actix_web::test]
    async fn test_search_winner_is_author_of_drawn_post() {
        let api = StubSocialApi::new()
            .with_saved_search(saved_search(7, "foo"))
            .with_search_results(
                "foo",
                vec![
                    tweet(1, "foo one", twitter_user(101, "A")),
                    tweet(2, "foo two", twitter_user(102, "B")),
                    tweet(3, "foo three", twitter_user(103, "C")),
                ],
            );

        let result = service(1).search_draw(&api, "7").await.unwrap();

        assert_eq!(result.tweet_count, 3);
        let winner = result.winner.unwrap();
        let tweet = result.tweet.unwrap();
        assert_eq!(winner.screen_name, "B");
        assert_eq!(tweet.text, "foo two");
        assert_eq!(tweet.user, winner);
    }

    #[actix_web::test]
    async fn test_search_failure_is_partial() {
        let api = StubSocialApi::new()
            .with_saved_search(saved_search(7, "foo"))
            .fail_search();
        let result = service(0).search_draw(&api, "7").await.unwrap();
        assert!(result.incomplete_list);
        assert!(result.winner.is_none());
        assert!(result.tweet.is_none());
    }

    #[actix_web::test]
    async fn test_saved_searches_failure_is_partial() {
        let api = StubSocialApi::new().fail_saved_searches();
        let result = service(0).saved_searches(&api).await;
        assert!(result.searches.is_empty());
        assert!(result.incomplete_list);
    }

    #[actix_web::test]
    async fn test_retweets_of_me_lists_tweets() {
        let api = StubSocialApi::new()
            .with_retweets_of_me(vec![tweet(5, "popular", twitter_user(1, "me"))]);
        let result = service(0).retweets_of_me(&api).await;
        assert_eq!(result.retweets.len(), 1);
        assert!(!result.incomplete_list);
    }

    #[actix_web::test]
    async fn test_retweet_draw_partial_on_failure() {
        let api = StubSocialApi::new()
            .with_status(tweet(50, "giveaway!", twitter_user(1, "me")))
            .with_retweeters("50", vec![vec![10, 11], vec![12]])
            .with_user(twitter_user(11, "lucky"))
            .fail_retweeters_at(1);

        let result = service(5).retweet_draw(&api, "50").await.unwrap();

        assert!(result.incomplete_list);
        assert_eq!(result.retweeter_count, 2);
        assert_eq!(result.winner.map(|u| u.screen_name).as_deref(), Some("lucky"));
        assert_eq!(api.rate_limit_calls(), 1);
    }

    #[actix_web::test]
    async fn test_retweets_of_me_failure_is_partial() {
        let api = StubSocialApi::new()
            .with_retweets_of_me(vec![tweet(5, "popular", twitter_user(1, "me"))])
            .fail_retweets_of_me();
        let result = service(0).retweets_of_me(&api).await;
        assert!(result.retweets.is_empty());
        assert!(result.incomplete_list);
        assert_eq!(api.rate_limit_calls(), 1);
    }
}
