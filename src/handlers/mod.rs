// HTTP request handlers
pub mod auth;
pub mod gate;
pub mod pages;
pub mod render;
pub mod static_files;

use actix_web::web;

pub use auth::{callback, logout, sign_in};
pub use pages::{followers, home, home_head, profile, retweets, searches};
pub use render::{PageRenderer, Viewer};
pub use static_files::{health, serve_static};

/// Register every route of the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::head().to(home_head))
            .route(web::get().to(home)),
    )
    .route("/profile", web::get().to(profile))
    .route("/followers", web::get().to(followers))
    .route("/retweets", web::get().to(retweets))
    .route("/searches", web::get().to(searches))
    .route("/logout", web::get().to(logout))
    .route("/auth/{provider}", web::get().to(sign_in))
    .route("/auth/{provider}/callback", web::get().to(callback))
    .route("/auth/{provider}/callback", web::post().to(callback))
    .route("/ping", web::get().to(health))
    .route("/static/{filename:.*}", web::get().to(serve_static));
}
