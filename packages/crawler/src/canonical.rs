//! URL canonicalization.
//!
//! A canonical URL is the identity of a page within a job: dedup, scope
//! checks and persistence keys all use it. Rules, applied in order:
//!
//! 1. scheme and host lowercased, only `http`/`https` with a host accepted
//! 2. a leading `www.` is stripped
//! 3. fragment dropped
//! 4. default ports dropped
//! 5. repeated `/` collapsed, trailing `/` stripped except on the root
//! 6. only pagination parameters survive in the query (tracking and every
//!    other parameter are dropped), sorted by lowercased name
//!
//! Canonicalizing a canonical URL returns it unchanged.

use url::Url;

/// Query parameters that distinguish pages of a paginated listing.
pub const PAGINATION_PARAMS: &[&str] = &["page", "p", "pagenum", "paged", "offset", "start"];

/// Canonicalize an absolute URL. Returns `None` for malformed input,
/// non-HTTP(S) schemes and URLs without a host.
pub fn canonicalize(input: &str) -> Option<String> {
    let mut url = Url::parse(input.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = strip_www(&url.host_str()?.to_ascii_lowercase()).to_string();
    if host.is_empty() {
        return None;
    }
    if url.host_str() != Some(host.as_str()) {
        url.set_host(Some(&host)).ok()?;
    }

    url.set_fragment(None);

    // The parser already elides a port equal to the scheme default; this
    // covers URLs built by hand.
    if url.port().is_some() && url.port() == default_port(url.scheme()) {
        url.set_port(None).ok()?;
    }

    let path = collapse_path(url.path());
    url.set_path(&path);

    let mut kept: Vec<(String, String)> = url
        .query_pairs()
        .filter_map(|(key, value)| {
            let key = key.to_ascii_lowercase();
            is_pagination_param(&key).then(|| (key, value.into_owned()))
        })
        .collect();
    kept.sort();

    url.set_query(None);
    if !kept.is_empty() {
        url.query_pairs_mut().extend_pairs(kept.iter());
    }

    Some(url.into())
}

/// Host of `input` without `www.`, lowercased. Bare domains such as
/// `example.com` are accepted and treated as `https://example.com`.
pub fn primary_domain(input: &str) -> Option<String> {
    let input = input.trim();
    let url = if input.contains("://") {
        Url::parse(input).ok()?
    } else {
        Url::parse(&format!("https://{input}")).ok()?
    };
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = strip_www(&url.host_str()?.to_ascii_lowercase()).to_string();
    (!host.is_empty()).then_some(host)
}

/// Seed URL for a submitted domain: bare domains get `https://`.
pub fn seed_url(domain: &str) -> String {
    let domain = domain.trim();
    if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{domain}/")
    }
}

/// Exact-domain scope check on a canonical URL.
pub fn is_in_scope(normalized_url: &str, primary_domain: &str) -> bool {
    host_of(normalized_url).is_some_and(|host| host == primary_domain)
}

/// Host of a canonical URL (already lowercased and `www.`-free).
pub fn host_of(normalized_url: &str) -> Option<String> {
    Url::parse(normalized_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| strip_www(&h.to_ascii_lowercase()).to_string()))
}

pub fn is_pagination_param(name: &str) -> bool {
    PAGINATION_PARAMS.contains(&name)
}

/// Drop a leading `www.` unless only a bare TLD would remain.
fn strip_www(host: &str) -> &str {
    match host.strip_prefix("www.") {
        Some(rest) if rest.contains('.') => rest,
        _ => host,
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

fn collapse_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}
