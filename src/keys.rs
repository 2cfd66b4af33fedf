//! Join-key normalization for domains and page URLs.
//!
//! Both export families spell the same target differently (`https://example.com`,
//! `example.com/`, `WWW.Example.com`). Keys are normalized with pure, total
//! functions so that equal targets meet in the join. Anything that cannot be
//! normalized yields an empty key, which never matches.

use std::{net::IpAddr, sync::OnceLock};

use regex::Regex;
use url::{Host, Url};

use crate::{data::Value, table::Cell};

fn scheme_pattern() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"(?i)^https?://").expect("scheme pattern compiles"))
}

fn strip_scheme(value: &str) -> &str {
    match scheme_pattern().find(value) {
        Some(found) => &value[found.end()..],
        None => value,
    }
}

fn normalize(raw: &str, strip_www: bool) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut key = strip_scheme(&lowered).trim_start();
    if strip_www {
        key = key.strip_prefix("www.").unwrap_or(key);
    }
    key.trim_end_matches(|c: char| c == '/' || c.is_whitespace())
        .to_string()
}

/// Registrable-domain style key: no scheme, no `www.`, no trailing slash, lowercase.
pub fn normalize_domain_key(raw: &str) -> String {
    normalize(raw, true)
}

/// Host-plus-path key for page reports. Keeps `www.` so distinct hosts stay distinct.
pub fn normalize_page_key(raw: &str) -> String {
    normalize(raw, false)
}

fn host_of(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("http://{trimmed}"))
    }
    .ok()?;
    match parsed.host()? {
        Host::Domain(domain) => Some(domain.trim_end_matches('.').to_ascii_lowercase()),
        Host::Ipv4(_) | Host::Ipv6(_) => None,
    }
}

/// Registrable domain of a bare host or URL, e.g. `sub.example.co.uk` to
/// `example.co.uk`. Returns `None` for IP addresses, malformed input, and hosts
/// without a known public suffix.
///
/// Internationalized names come back in Unicode form (`bücher.de`, not the
/// punycode host `Url` produces) so they compare equal to domain keys.
pub fn extract_root_domain(raw: &str) -> Option<String> {
    let host = host_of(raw)?;
    if host.parse::<IpAddr>().is_ok() {
        return None;
    }
    let domain = psl::domain(host.as_bytes())?;
    if !domain.suffix().is_known() {
        return None;
    }
    let ascii = std::str::from_utf8(domain.as_bytes()).ok()?;
    let (unicode, mapped) = idna::domain_to_unicode(ascii);
    match mapped {
        Ok(()) => Some(unicode),
        Err(_) => Some(ascii.to_string()),
    }
}

/// Applies a key normalizer to a cell; empty keys become missing.
pub fn key_cell(raw: Option<&Value>, normalizer: fn(&str) -> String) -> Cell {
    let key = normalizer(&raw?.as_display());
    if key.is_empty() {
        None
    } else {
        Some(Value::String(key))
    }
}

/// Root-domain cell derived from a page key; unjoinable hosts become missing.
pub fn root_domain_cell(raw: Option<&Value>) -> Cell {
    extract_root_domain(&raw?.as_display()).map(Value::String)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_key_strips_scheme_www_and_slashes() {
        assert_eq!(normalize_domain_key(" HTTPS://www.Example.com/ "), "example.com");
        assert_eq!(normalize_domain_key("http://example.com//"), "example.com");
        assert_eq!(normalize_domain_key("example.com/blog/"), "example.com/blog");
    }

    #[test]
    fn domain_key_of_blank_input_is_empty() {
        assert_eq!(normalize_domain_key(""), "");
        assert_eq!(normalize_domain_key("   "), "");
        assert_eq!(normalize_domain_key("https://"), "");
    }

    #[test]
    fn domain_key_strips_interleaved_slashes_and_spaces() {
        let once = normalize_domain_key("example.com/ /");
        assert_eq!(once, "example.com");
        assert_eq!(normalize_domain_key(&once), once);
        assert_eq!(normalize_domain_key("https:// www.example.com / "), "example.com");
    }

    #[test]
    fn page_key_keeps_www() {
        assert_eq!(
            normalize_page_key("https://WWW.example.com/Post/"),
            "www.example.com/post"
        );
    }

    #[test]
    fn root_domain_handles_multi_label_suffixes() {
        assert_eq!(
            extract_root_domain("https://blog.Example.co.uk/x").as_deref(),
            Some("example.co.uk")
        );
        assert_eq!(
            extract_root_domain("www.example.com/path").as_deref(),
            Some("example.com")
        );
        assert_eq!(extract_root_domain("example.com.").as_deref(), Some("example.com"));
    }

    #[test]
    fn root_domain_of_internationalized_host_matches_domain_key() {
        let root = extract_root_domain("https://shop.bücher.de/a");
        assert_eq!(root.as_deref(), Some("bücher.de"));
        assert_eq!(root.as_deref(), Some(normalize_domain_key("https://BÜCHER.de/").as_str()));
        assert_eq!(
            extract_root_domain("xn--bcher-kva.de").as_deref(),
            Some("bücher.de")
        );
    }

    #[test]
    fn root_domain_rejects_unjoinable_hosts() {
        assert_eq!(extract_root_domain("192.168.0.1"), None);
        assert_eq!(extract_root_domain("http://[::1]/"), None);
        assert_eq!(extract_root_domain("localhost"), None);
        assert_eq!(extract_root_domain("co.uk"), None);
        assert_eq!(extract_root_domain(""), None);
        assert_eq!(extract_root_domain("not a url"), None);
    }

    #[test]
    fn key_cell_maps_empty_keys_to_missing() {
        let blank = Value::String("https://".to_string());
        assert_eq!(key_cell(Some(&blank), normalize_domain_key), None);
        assert_eq!(key_cell(None, normalize_domain_key), None);
        let raw = Value::String("Example.com/".to_string());
        assert_eq!(
            key_cell(Some(&raw), normalize_domain_key),
            Some(Value::String("example.com".to_string()))
        );
    }
}
