use std::sync::LazyLock;

use url::Url;

use crate::error::{Error, Result};

static PROFILE_BASE: LazyLock<Url> = LazyLock::new(|| Url::parse("https://github.com/").unwrap());

/// Query appended to the primary endpoint to limit it to the past year.
const PRIMARY_QUERY: (&str, &str) = ("y", "last");

/// Suffix appended to the identity on the fallback endpoint.
const FALLBACK_SUFFIX: &str = ".json";

/// Parse a source base URL. Only `http` and `https` bases are accepted.
pub fn parse_base_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim())?;
    match url.scheme() {
        "http" | "https" if !url.cannot_be_a_base() => Ok(url),
        _ => Err(Error::UrlParse(format!("not an http(s) base URL: {input}"))),
    }
}

/// `{base}/{identity}?y=last`
pub fn primary_endpoint(base: &Url, identity: &str) -> Result<Url> {
    let mut url = with_segment(base, identity)?;
    url.query_pairs_mut()
        .append_pair(PRIMARY_QUERY.0, PRIMARY_QUERY.1);
    Ok(url)
}

/// `{base}/{identity}.json`
pub fn fallback_endpoint(base: &Url, identity: &str) -> Result<Url> {
    with_segment(base, &format!("{identity}{FALLBACK_SUFFIX}"))
}

/// Append one percent-encoded path segment to `base`.
fn with_segment(base: &Url, segment: &str) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| Error::UrlParse(format!("cannot append to {base}")))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// Public profile page for an identity.
pub fn profile_url(identity: &str) -> String {
    with_segment(&PROFILE_BASE, identity)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}{identity}", *PROFILE_BASE))
}

/// Check if a string is a plausible account name: 1-39 ASCII alphanumerics
/// or hyphens, not starting or ending with a hyphen.
pub fn is_identity(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 39
        && !s.starts_with('-')
        && !s.ends_with('-')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Extract the account name from a profile URL such as
/// `https://github.com/octocat` or `github.com/octocat?tab=repositories`.
pub fn parse_profile_url(input: &str) -> Result<String> {
    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };
    let url = Url::parse(&with_scheme)?;

    let host = url.host_str().unwrap_or("");
    if host != "github.com" && !host.ends_with(".github.com") {
        return Err(Error::UrlParse(format!("not a profile URL: {input}")));
    }

    let name = url
        .path_segments()
        .and_then(|mut s| s.next())
        .unwrap_or("");
    if is_identity(name) {
        Ok(name.to_string())
    } else {
        Err(Error::InvalidIdentity(format!(
            "no account name in URL: {input}"
        )))
    }
}

/// Accept a bare account name (optionally prefixed with `@`) or a profile URL.
pub fn resolve_identity(input: &str) -> Result<String> {
    let input = input.trim();
    let bare = input.strip_prefix('@').unwrap_or(input);
    if is_identity(bare) {
        return Ok(bare.to_string());
    }
    if input.contains("github.com") {
        return parse_profile_url(input);
    }
    Err(Error::InvalidIdentity(format!("'{input}'")))
}
