//! Host blacklist
//!
//! An immutable set of disallowed hosts. It is built once (from config
//! entries and/or a file) and shared by the orchestrator and the fetch
//! pipeline behind an `Arc`.

use crate::url::extract_host;
use crate::ConfigError;
use std::collections::HashSet;
use std::path::Path;

/// Set of blocked hosts, matched exactly or by subdomain suffix
#[derive(Debug, Clone, Default)]
pub struct HostBlacklist {
    entries: HashSet<String>,
}

impl HostBlacklist {
    /// Creates an empty blacklist that blocks nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a blacklist from host entries
    ///
    /// Entries are trimmed and lowercased; a trailing `.` is dropped and
    /// blank entries are ignored.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .filter_map(|entry| clean_host(entry.as_ref()))
            .collect();
        Self { entries }
    }

    /// Loads a blacklist file with one host per line
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let hosts = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));
        Ok(Self::from_entries(hosts))
    }

    /// Returns a blacklist containing the entries of both lists
    pub fn merge(mut self, other: HostBlacklist) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the blacklist has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks whether a host is blocked
    ///
    /// A host is blocked if it equals an entry, or is a subdomain of one:
    /// `a.b.evil.com` is blocked by `evil.com`, while `notevil.com` is not.
    ///
    /// # Examples
    ///
    /// ```
    /// use articlesa::url::HostBlacklist;
    ///
    /// let blacklist = HostBlacklist::from_entries(["evil.com"]);
    /// assert!(blacklist.is_blocked("evil.com"));
    /// assert!(blacklist.is_blocked("a.b.evil.com"));
    /// assert!(!blacklist.is_blocked("notevil.com"));
    /// ```
    pub fn is_blocked(&self, host: &str) -> bool {
        let Some(host) = clean_host(host) else {
            return false;
        };

        if self.entries.contains(&host) {
            return true;
        }

        // Walk the parent domains: a.b.evil.com -> b.evil.com -> evil.com -> com
        let mut rest = host.as_str();
        while let Some((_, parent)) = rest.split_once('.') {
            if self.entries.contains(parent) {
                return true;
            }
            rest = parent;
        }

        false
    }

    /// Checks whether the host of a URL is blocked
    ///
    /// URLs that cannot be parsed or have no host are not considered blocked;
    /// callers drop those separately.
    pub fn is_url_blocked(&self, url: &str) -> bool {
        extract_host(url).is_some_and(|host| self.is_blocked(&host))
    }
}

/// Lowercases a host and strips a port and trailing dot
fn clean_host(raw: &str) -> Option<String> {
    let mut host = raw.trim().to_lowercase();

    // Drop a port, but leave bracketed IPv6 literals alone
    if !host.starts_with('[') {
        if let Some((name, port)) = host.rsplit_once(':') {
            if port.chars().all(|c| c.is_ascii_digit()) {
                host = name.to_string();
            }
        }
    }

    let host = host.trim_end_matches('.');
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
