//! Shared User-Agent string for metadata and download requests.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/addon-fetch";

/// Default User-Agent for every request made by the shared client.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("addon-fetch/{version} (+{PROJECT_UA_URL})")
}
