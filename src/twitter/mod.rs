//! Twitter REST v1.1 access

pub mod api;
pub mod client;
pub mod models;

pub use api::{
    ApiError, SocialApi, SocialApiFactory, FIRST_CURSOR, FOLLOWERS_PAGE_SIZE,
    RETWEETERS_PAGE_SIZE, RETWEETS_OF_ME_COUNT, SEARCH_PAGE_SIZE,
};
pub use client::{TwitterClient, TwitterClientFactory};
pub use models::{IdsPage, SavedSearch, SearchResults, Tweet, TwitterUser, UsersPage};
