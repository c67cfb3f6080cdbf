//! Read-only Instagram Graph API proxy

mod instagram;

pub use instagram::{DEFAULT_GRAPH_URL, GraphConfig, GraphError, InstagramGraphClient};
