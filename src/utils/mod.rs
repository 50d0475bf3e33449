//! Utility modules supporting the sources and the CLI.
//!
//! - [`HttpClient`]: shared HTTP client built from [`HttpConfig`](crate::config::HttpConfig)
//! - [`encode_query`]: percent-encoded query strings
//! - [`render_table`]: terminal table of a search result

mod display;
mod http;

pub use display::{render_table, truncate_with_ellipsis};
pub use http::{encode_query, HttpClient};
