use url::Url;

/// Extracts the lowercase host from a URL string
///
/// Returns `None` if the string is not an absolute URL or has no host.
///
/// # Examples
///
/// ```
/// use articlesa::url::extract_host;
///
/// assert_eq!(extract_host("https://EXAMPLE.com/path"), Some("example.com".to_string()));
/// assert_eq!(extract_host("/relative"), None);
/// ```
pub fn extract_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}
