// Integration tests for provider sign-in and the link-or-create account merge
use actix_web::cookie::Cookie;
use actix_web::{test, App};
use twitter_winner::identity::UserStore;
use twitter_winner::models::AuthId;
use twitter_winner::oauth::OAuthState;
use twitter_winner::session::{OAUTH_STATE_COOKIE, SESSION_COOKIE};
use twitter_winner::testing::assertions::{
    assert_cookie_cleared, assert_redirect, assert_status, body_text, location, response_cookie,
};
use twitter_winner::testing::fixtures::google_account;
use twitter_winner::testing::mock::STUB_STATE;
use twitter_winner::testing::requests::callback;
use twitter_winner::testing::{RequestBuilder, TestApp};

/// State cookie as `GET /auth/{provider}` would have set it
fn state_cookie(app: &TestApp, provider: &str) -> Cookie<'static> {
    let state = OAuthState {
        state: STUB_STATE.to_string(),
        provider: provider.to_string(),
        callback_url: format!("http://localhost:8080/auth/{provider}/callback"),
        request_token: None,
        request_token_secret: None,
    };
    app.sessions.oauth_state_cookie(&state).unwrap()
}

#[actix_web::test]
async fn test_sign_in_redirects_to_provider_and_remembers_state() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let resp = test::call_service(&service, RequestBuilder::get("/auth/twitter").build().to_request()).await;

    assert_status(&resp, 302);
    assert!(location(&resp).starts_with("https://twitter.example/authorize?state=stub-state"));
    assert!(location(&resp).contains(&urlencoding::encode("http://localhost:8080/auth/twitter/callback").into_owned()));

    let cookie = response_cookie(&resp, OAUTH_STATE_COOKIE).expect("state cookie should be set");
    let req = test::TestRequest::default().cookie(cookie).to_http_request();
    let state = app.sessions.oauth_state(&req).expect("state cookie should decrypt");
    assert_eq!(state.provider, "twitter");
    assert_eq!(state.state, STUB_STATE);
}

#[actix_web::test]
async fn test_unknown_provider_is_not_found() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let resp = test::call_service(&service, RequestBuilder::get("/auth/myspace").build().to_request()).await;
    assert_status(&resp, 404);

    let resp = test::call_service(&service, callback("myspace", "1", STUB_STATE).build().to_request()).await;
    assert_status(&resp, 404);
    assert_eq!(app.store.len(), 0);
}

#[actix_web::test]
async fn test_first_sign_in_creates_user_and_session() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let req = callback("twitter", "42", STUB_STATE).with_cookie(state_cookie(&app, "twitter"));
    let resp = test::call_service(&service, req.build().to_request()).await;

    assert_redirect(&resp, "/");
    assert_cookie_cleared(&resp, OAUTH_STATE_COOKIE);
    assert_eq!(app.store.len(), 1);

    let session = app.read_session(response_cookie(&resp, SESSION_COOKIE).unwrap());
    let session_user = session.user.clone().expect("should be signed in");
    assert_eq!(session_user.auth_id, AuthId::new("twitter", "42"));

    let user = app.stored_user(&session_user.user_id).unwrap();
    assert_eq!(user.display_name(), "user42");
    assert_eq!(user.credential.as_ref().map(|c| c.token.as_str()), Some("token-42"));
    assert_eq!(session.flashes[0].message, "Welcome, user42!");
}

#[actix_web::test]
async fn test_welcome_flash_is_shown_once() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let req = callback("twitter", "42", STUB_STATE).with_cookie(state_cookie(&app, "twitter"));
    let resp = test::call_service(&service, req.build().to_request()).await;
    let signed_in = response_cookie(&resp, SESSION_COOKIE).unwrap();

    let req = RequestBuilder::get("/").with_cookie(signed_in).build();
    let resp = test::call_service(&service, req.to_request()).await;
    assert_status(&resp, 200);
    let consumed = response_cookie(&resp, SESSION_COOKIE).expect("flashes consumed, cookie re-issued");
    let body = body_text(resp).await;
    assert!(body.contains("Welcome, user42!"));
    assert!(body.contains("Welcome, user42</h1>"));

    let req = RequestBuilder::get("/").with_cookie(consumed).build();
    let resp = test::call_service(&service, req.to_request()).await;
    let body = body_text(resp).await;
    assert!(!body.contains("Welcome, user42!"));
    assert!(body.contains("Welcome, user42</h1>"), "still signed in");
}

#[actix_web::test]
async fn test_signing_in_again_reuses_the_user() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let mut user_ids = Vec::new();
    for _ in 0..2 {
        let req = callback("twitter", "42", STUB_STATE).with_cookie(state_cookie(&app, "twitter"));
        let resp = test::call_service(&service, req.build().to_request()).await;
        let session = app.read_session(response_cookie(&resp, SESSION_COOKIE).unwrap());
        user_ids.push(session.user.unwrap().user_id);
        if user_ids.len() == 2 {
            assert_eq!(session.flashes[0].message, "Welcome back, user42!");
        }
    }

    assert_eq!(user_ids[0], user_ids[1]);
    assert_eq!(app.store.len(), 1);
}

#[actix_web::test]
async fn test_signed_in_user_links_second_provider() {
    let app = TestApp::new();
    let user = app.add_user(google_account("g-1", "Alice"));
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let req = callback("twitter", "42", STUB_STATE)
        .with_cookie(state_cookie(&app, "twitter"))
        .with_cookie(app.session_cookie_for(&user));
    let resp = test::call_service(&service, req.build().to_request()).await;
    assert_redirect(&resp, "/");

    let session = app.read_session(response_cookie(&resp, SESSION_COOKIE).unwrap());
    assert_eq!(session.flashes[0].message, "Your Twitter account is now linked.");
    let session_user = session.user.unwrap();
    assert_eq!(session_user.user_id, user.id, "still the same account");
    assert_eq!(session_user.auth_id, AuthId::new("google", "g-1"), "session is not replaced");

    assert_eq!(app.store.len(), 1);
    let linked = app.stored_user(&user.id).unwrap();
    assert!(linked.has_auth_id(&AuthId::new("google", "g-1")));
    assert!(linked.has_auth_id(&AuthId::new("twitter", "42")));
    assert!(linked.credential_for("twitter").is_some());
    assert_eq!(linked.display_name(), "user42", "latest provider profile is applied");

    let by_twitter = app.store.get_by_auth_id(&AuthId::new("twitter", "42")).unwrap();
    assert_eq!(by_twitter.map(|u| u.id), Some(user.id));
}

#[actix_web::test]
async fn test_identity_only_provider_stores_no_credential() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let req = callback("google", "g-9", STUB_STATE).with_cookie(state_cookie(&app, "google"));
    let resp = test::call_service(&service, req.build().to_request()).await;
    assert_redirect(&resp, "/");

    let session = app.read_session(response_cookie(&resp, SESSION_COOKIE).unwrap());
    let user = app.stored_user(&session.user.unwrap().user_id).unwrap();
    assert!(user.credential.is_none());
}

#[actix_web::test]
async fn test_forged_state_is_rejected() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let req = callback("twitter", "42", "forged").with_cookie(state_cookie(&app, "twitter"));
    let resp = test::call_service(&service, req.build().to_request()).await;

    assert_status(&resp, 500);
    assert_cookie_cleared(&resp, OAUTH_STATE_COOKIE);
    assert_eq!(app.store.len(), 0);
}

#[actix_web::test]
async fn test_callback_without_state_cookie_is_rejected() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let resp = test::call_service(&service, callback("twitter", "42", STUB_STATE).build().to_request()).await;
    assert_status(&resp, 500);
    assert_eq!(app.store.len(), 0);
}

#[actix_web::test]
async fn test_state_cookie_of_other_provider_is_rejected() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let req = callback("twitter", "42", STUB_STATE).with_cookie(state_cookie(&app, "google"));
    let resp = test::call_service(&service, req.build().to_request()).await;
    assert_status(&resp, 500);
    assert_eq!(app.store.len(), 0);
}

#[actix_web::test]
async fn test_denied_sign_in_shows_error_page() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let req = RequestBuilder::get("/auth/twitter/callback?denied=abc")
        .with_cookie(state_cookie(&app, "twitter"));
    let resp = test::call_service(&service, req.build().to_request()).await;

    assert_status(&resp, 500);
    assert!(body_text(resp).await.contains("Signing in failed"));
    assert_eq!(app.store.len(), 0);
}

#[actix_web::test]
async fn test_posted_callback_is_accepted() {
    let app = TestApp::new();
    let service = test::init_service(App::new().configure(|cfg| app.services.configure(cfg))).await;

    let req = RequestBuilder::post("/auth/google/callback")
        .form_field("code", "g-5")
        .form_field("state", STUB_STATE)
        .with_cookie(state_cookie(&app, "google"));
    let resp = test::call_service(&service, req.build().to_request()).await;

    assert_redirect(&resp, "/");
    assert_eq!(app.store.len(), 1);
}
