// Integration tests for the draw pages: followers, retweeters and saved searches
use std::sync::Arc;

use actix_web::{test, App};
use twitter_winner::testing::assertions::{assert_status, body_text};
use twitter_winner::testing::fixtures::{saved_search, tweet, twitter_account, twitter_user};
use twitter_winner::testing::mock::{FixedPicker, StubSocialApi};
use twitter_winner::testing::{RequestBuilder, TestApp};

const PARTIAL_LIST_WARNING: &str = "Twitter stopped answering before the whole list was fetched";

fn search_api() -> StubSocialApi {
    StubSocialApi::new()
        .with_saved_search(saved_search(7, "foo"))
        .with_search_results(
            "foo",
            vec![
                tweet(1, "foo one", twitter_user(101, "A")),
                tweet(2, "foo two", twitter_user(102, "B")),
                tweet(3, "foo three", twitter_user(103, "C")),
            ],
        )
}

/// GET `uri` as a signed-in, Twitter-linked user; returns status and body
async fn visit_as_linked_user(app: &TestApp, uri: &str) -> (u16, String) {
    let user = app.add_user(twitter_account("42", "alice"));
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let req = RequestBuilder::get(uri)
        .with_cookie(app.session_cookie_for(&user))
        .build();
    let resp = test::call_service(&service, req.to_request()).await;
    let status = resp.status().as_u16();
    (status, body_text(resp).await)
}

#[actix_web::test]
async fn test_followers_page_draws_among_all_pages() {
    let api = StubSocialApi::new().with_followers(vec![
        vec![twitter_user(1, "first"), twitter_user(2, "second")],
        vec![twitter_user(3, "third")],
    ]);
    let app = TestApp::with_picker(api, Arc::new(FixedPicker::new(2)));

    let (status, body) = visit_as_linked_user(&app, "/followers").await;

    assert_eq!(status, 200);
    assert!(body.contains("3 followers"));
    assert!(body.contains("And the winner is"));
    assert!(body.contains(r#"<div class="user"><img src="https://pbs.twimg.com/third.png""#));
    assert!(!body.contains(PARTIAL_LIST_WARNING));
    assert_eq!(app.api().rate_limit_calls(), 0);
}

#[actix_web::test]
async fn test_followers_page_warns_about_partial_list() {
    let api = StubSocialApi::new()
        .with_followers(vec![
            vec![twitter_user(1, "first")],
            vec![twitter_user(2, "second")],
        ])
        .fail_followers_at(1);
    let app = TestApp::with_api(api);

    let (status, body) = visit_as_linked_user(&app, "/followers").await;

    assert_eq!(status, 200);
    assert!(body.contains(PARTIAL_LIST_WARNING));
    assert!(body.contains("1 followers"));
    assert!(body.contains("@first"));
    assert!(!body.contains("@second"));
    assert_eq!(app.api().rate_limit_calls(), 1);
}

#[actix_web::test]
async fn test_followers_page_without_followers() {
    let app = TestApp::new();
    let (status, body) = visit_as_linked_user(&app, "/followers").await;
    assert_eq!(status, 200);
    assert!(body.contains("No followers, no winner."));
}

#[actix_web::test]
async fn test_retweets_page_lists_retweeted_tweets() {
    let api = StubSocialApi::new()
        .with_retweets_of_me(vec![tweet(50, "win a mug", twitter_user(42, "alice"))]);
    let app = TestApp::with_api(api);

    let (status, body) = visit_as_linked_user(&app, "/retweets").await;

    assert_eq!(status, 200);
    assert!(body.contains(r#"<a href="/retweets?id=50">win a mug</a>"#));
    assert_eq!(app.api().calls(), vec!["retweets_of_me"]);
}

#[actix_web::test]
async fn test_retweet_draw_picks_among_retweeters() {
    let api = StubSocialApi::new()
        .with_status(tweet(50, "win a mug", twitter_user(42, "alice")))
        .with_retweeters("50", vec![vec![10, 11], vec![12]])
        .with_user(twitter_user(11, "lucky"));
    let app = TestApp::with_picker(api, Arc::new(FixedPicker::new(1)));

    let (status, body) = visit_as_linked_user(&app, "/retweets?id=50").await;

    assert_eq!(status, 200);
    assert!(body.contains("3 retweeters"));
    assert!(body.contains("@lucky"));
    assert_eq!(app.api().user_lookups(), vec!["11".to_string()]);
}

#[actix_web::test]
async fn test_retweets_page_warns_when_listing_fails() {
    let api = StubSocialApi::new()
        .with_retweets_of_me(vec![tweet(50, "win a mug", twitter_user(42, "alice"))])
        .fail_retweets_of_me();
    let app = TestApp::with_api(api);

    let (status, body) = visit_as_linked_user(&app, "/retweets").await;

    assert_eq!(status, 200);
    assert!(body.contains(PARTIAL_LIST_WARNING));
    assert!(!body.contains("win a mug"));
    assert_eq!(app.api().rate_limit_calls(), 1);
}

#[actix_web::test]
async fn test_retweet_draw_warns_about_partial_retweeters() {
    let api = StubSocialApi::new()
        .with_status(tweet(50, "win a mug", twitter_user(42, "alice")))
        .with_retweeters("50", vec![vec![10, 11], vec![12]])
        .with_user(twitter_user(11, "lucky"))
        .fail_retweeters_at(1);
    let app = TestApp::with_picker(api, Arc::new(FixedPicker::new(1)));

    let (status, body) = visit_as_linked_user(&app, "/retweets?id=50").await;

    assert_eq!(status, 200);
    assert!(body.contains(PARTIAL_LIST_WARNING));
    assert!(body.contains("2 retweeters"));
    assert!(body.contains("@lucky"));
    assert_eq!(app.api().rate_limit_calls(), 1);
}

#[actix_web::test]
async fn test_non_numeric_id_shows_the_list() {
    let app = TestApp::with_api(search_api());
    let user = app.add_user(twitter_account("42", "alice"));
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    for uri in ["/searches?id=../account", "/searches?id=1&id=2"] {
        let req = RequestBuilder::get(uri)
            .with_cookie(app.session_cookie_for(&user))
            .build();
        let resp = test::call_service(&service, req.to_request()).await;
        assert_status(&resp, 200);
        let body = body_text(resp).await;
        assert!(body.contains("Saved searches"), "{uri}");
    }
    assert!(!app.api().calls().iter().any(|call| call == "saved_search"));
}

#[actix_web::test]
async fn test_retweet_draw_of_unknown_tweet_is_bad_gateway() {
    let app = TestApp::new();
    let (status, body) = visit_as_linked_user(&app, "/retweets?id=404").await;
    assert_eq!(status, 502);
    assert!(body.contains("Could not load the tweet from Twitter."));
}

#[actix_web::test]
async fn test_blank_id_shows_the_list() {
    let app = TestApp::with_api(search_api());
    let (status, body) = visit_as_linked_user(&app, "/searches?id=").await;
    assert_eq!(status, 200);
    assert!(body.contains("Saved searches"));
    assert!(body.contains(r#"<a href="/searches?id=7">foo</a>"#));
}

#[actix_web::test]
async fn test_search_draw_pairs_author_with_tweet() {
    let app = TestApp::with_picker(search_api(), Arc::new(FixedPicker::new(1)));

    let (status, body) = visit_as_linked_user(&app, "/searches?id=7").await;

    assert_eq!(status, 200);
    assert!(body.contains("3 matching tweets"));
    assert!(body.contains("@B"));
    assert!(body.contains("<blockquote>foo two</blockquote>"));
    assert!(!body.contains("@A"));
    assert!(!body.contains("@C"));
}

#[actix_web::test]
async fn test_search_draw_winner_is_one_of_the_authors() {
    // Real uniform picker
    let app = TestApp::with_picker(search_api(), Arc::new(twitter_winner::winner::UniformPicker));

    let (status, body) = visit_as_linked_user(&app, "/searches?id=7").await;

    assert_eq!(status, 200);
    let pairs = [("@A", "foo one"), ("@B", "foo two"), ("@C", "foo three")];
    let shown: Vec<_> = pairs
        .iter()
        .filter(|(author, text)| body.contains(author) && body.contains(&format!("<blockquote>{text}</blockquote>")))
        .collect();
    assert_eq!(shown.len(), 1, "exactly one author wins, shown with their own tweet");
}

#[actix_web::test]
async fn test_failed_search_is_partial_not_an_error() {
    let app = TestApp::with_api(search_api().fail_search());

    let (status, body) = visit_as_linked_user(&app, "/searches?id=7").await;

    assert_eq!(status, 200);
    assert!(body.contains(PARTIAL_LIST_WARNING));
    assert!(body.contains("No tweet matches this search, no winner."));
}

#[actix_web::test]
async fn test_unknown_saved_search_is_bad_gateway() {
    let app = TestApp::with_api(search_api());
    let (status, _) = visit_as_linked_user(&app, "/searches?id=999").await;
    assert_eq!(status, 502);
}
