mod domain;
mod driver_impl;
mod script;
mod types;


pub use domain::{NavigationPolicy, host_matches_allowlist, is_private_host, normalize_domains};
pub use driver_impl::AgentBrowserDriver;
pub use types::AgentBrowserResponse;
