//! Utility modules supporting the upstream adapters.
//!
//! - [`HttpClient`]: shared `reqwest` client carrying the bounded request timeout
//! - [`fetch_json`]: send a request and decode JSON, translating failures into
//!   [`SourceError`](crate::sources::SourceError)
//! - [`fetch_text`]: send a request and return the raw status and body

mod http;

pub use http::{default_user_agent, fetch_json, fetch_text, HttpClient};
