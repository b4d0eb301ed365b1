//! HTML helpers
//!
//! Link extraction for the crawling client, plus small selector helpers for
//! pulling values out of fetched pages.

mod links;
mod select;

pub use links::extract_links;
pub use select::{select_all, select_one, select_text_one, TEXT};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HtmlError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}
