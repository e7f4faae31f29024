/// Catalog name constants to keep CLI, config, and log fields consistent

// User-facing catalog names (used in CLI and config)
pub const PRAKTIS_CATALOG: &str = "praktis";
pub const PRAKTIKER_CATALOG: &str = "praktiker";

// Default search endpoints; `{}` is replaced by the encoded identifier
pub const PRAKTIS_SEARCH_URL: &str = "https://praktis.bg/catalogsearch/result/?q={}";
pub const PRAKTIKER_SEARCH_URL: &str = "https://praktiker.bg/search/{}";

/// Rendered form of a field that could not be extracted
pub const UNAVAILABLE: &str = "N/A";

/// Sent with every request alongside the rotating user agent
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Identity pool for user-agent rotation
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
];

// Currency suffixes stripped from price text. Longer tokens first so "лв." wins over "лв".
pub const CURRENCY_TOKENS: &[&str] = &["лв.", "лв", "€", "EUR"];

/// Get all supported catalog names
pub fn get_supported_catalogs() -> Vec<&'static str> {
    vec![PRAKTIS_CATALOG, PRAKTIKER_CATALOG]
}
