//! Local users and the provider sign-in merge

pub mod attributes;
pub mod resolver;
pub mod store;

pub use attributes::{map_attributes, AttributeRule};
pub use resolver::{IdentityError, IdentityResolver, ProviderSignIn, SignInOutcome};
pub use store::{JsonFileUserStore, MemoryUserStore, StoreError, UserStore};
