use crate::UrlError;
use url::Url;

/// Normalizes a URL to its canonical form
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http and https
/// 3. Reject URLs without a host
/// 4. Remove the query string
/// 5. Remove the fragment
///
/// Scheme, host, path and any trailing slash are otherwise left as the URL
/// parser produced them: the host is lowercased, a default port is dropped,
/// dot segments are collapsed and a bare origin gains a `/` path. Normalizing
/// an already canonical URL is a no-op.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(String)` - Canonical URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use articlesa::url::normalize_url;
///
/// let url = normalize_url("https://a.example/x?y=1#z").unwrap();
/// assert_eq!(url, "https://a.example/x");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    Ok(canonicalize(url)?.into())
}

/// Resolves a site-relative path against a base URL
///
/// The path must begin with `/`; it replaces the base URL's path, and the
/// result is normalized like any other URL.
///
/// # Examples
///
/// ```
/// use articlesa::url::resolve_relative;
///
/// let url = resolve_relative("/local", "https://a.example/x?y=1").unwrap();
/// assert_eq!(url, "https://a.example/local");
/// ```
pub fn resolve_relative(relative_path: &str, base_url: &str) -> Result<String, UrlError> {
    if !relative_path.starts_with('/') || relative_path.starts_with("//") {
        return Err(UrlError::InvalidRelativePath(relative_path.to_string()));
    }

    let base = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
    let joined = base
        .join(relative_path)
        .map_err(|_| UrlError::InvalidRelativePath(relative_path.to_string()))?;

    Ok(canonicalize(joined)?.into())
}

fn canonicalize(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}
