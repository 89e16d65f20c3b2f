//! API constants and endpoint paths for the Gravity Forms REST API (v2)

/// Number of entries requested per page when listing
pub const PAGE_SIZE: u32 = 100;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("gravityforms-cli/", env!("CARGO_PKG_VERSION"));

/// Standard headers for Gravity Forms requests
pub mod headers {
    /// Content type for JSON requests and responses
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

/// Query parameter names used by the paging API
pub mod paging {
    pub const PAGE_SIZE: &str = "paging[page_size]";
    pub const CURRENT_PAGE: &str = "paging[current_page]";
}

/// Path for creating entries
pub fn entries_path() -> String {
    "entries".to_string()
}

/// Path for a single entry record
pub fn entry_path(id: u64) -> String {
    format!("entries/{}", id)
}

/// Path for the entries of one form (`0` addresses every form)
pub fn form_entries_path(form_id: u64) -> String {
    format!("forms/{}/entries", form_id)
}

/// Join a base URL and a relative endpoint path
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
