//! Random winner selection over paginated collections

pub mod collect;
pub mod draw;
pub mod service;

pub use collect::{collect_pages, Collected, Page, MAX_PAGES};
pub use draw::{draw, UniformPicker, WinnerPicker};
pub use service::{FollowersDraw, RetweetDraw, RetweetList, SearchDraw, SearchList, WinnerService};
