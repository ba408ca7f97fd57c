pub mod fetch;
pub mod shape;

pub use fetch::fetch_window;
pub use shape::{shape_commit, AuthorIndex};
