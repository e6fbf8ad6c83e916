// Search-target resolution: site identifier + product → search URL.
// Pure string work, no network.

use std::collections::HashMap;
use std::sync::LazyLock;

use pricescout_common::SiteTarget;

/// Substitution point in a search template.
const QUERY_SLOT: &str = "{query}";

/// Known retail domains and their search URL templates.
static SEARCH_TEMPLATES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("amazon.co.za", "https://www.amazon.co.za/s?k={query}"),
        ("amazon.com", "https://www.amazon.com/s?k={query}"),
        ("takealot.com", "https://www.takealot.com/all?q={query}"),
        ("makro.co.za", "https://www.makro.co.za/search/?text={query}"),
        ("clicks.co.za", "https://www.clicks.co.za/search?text={query}"),
        ("dischem.co.za", "https://www.dischem.co.za/catalogsearch/result/?q={query}"),
        ("pnp.co.za", "https://www.pnp.co.za/pnpstorefront/pnp/en/search/?text={query}"),
        ("game.co.za", "https://www.game.co.za/search/?text={query}"),
        ("checkers.co.za", "https://www.checkers.co.za/search?q={query}"),
    ])
});

/// Every domain with a dedicated search template.
pub fn known_domains() -> impl Iterator<Item = &'static str> {
    SEARCH_TEMPLATES.keys().copied()
}

/// Lowercase, strip the scheme, and drop any path or query.
/// "HTTPS://www.Takealot.com/all?q=x" → "www.takealot.com"
pub fn bare_domain(identifier: &str) -> String {
    let lower = identifier.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);

    without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn template_for(domain: &str) -> Option<&'static str> {
    let key = domain.strip_prefix("www.").unwrap_or(domain);
    SEARCH_TEMPLATES.get(key).copied()
}

fn has_scheme(identifier: &str) -> bool {
    let lower = identifier.trim().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Build the search URL for a site identifier and product name.
///
/// Known domains use their template. A full URL that is not mapped gets
/// `/search?q=` appended; anything else becomes `https://<domain>/search?q=`.
pub fn resolve_search_url(identifier: &str, product_name: &str) -> String {
    let query = urlencoding::encode(product_name);
    let domain = bare_domain(identifier);

    if let Some(template) = template_for(&domain) {
        return template.replace(QUERY_SLOT, &query);
    }

    if has_scheme(identifier) {
        let base = identifier.trim().trim_end_matches('/');
        return format!("{base}/search?q={query}");
    }

    format!("https://{domain}/search?q={query}")
}

pub fn resolve_target(identifier: &str, product_name: &str) -> SiteTarget {
    SiteTarget {
        site: identifier.trim().to_string(),
        search_url: resolve_search_url(identifier, product_name),
    }
}
