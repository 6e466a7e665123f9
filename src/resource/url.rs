//! Resource locations.

use std::fmt;

/// Scheme assumed for locations written without one.
pub const DEFAULT_SCHEME: &str = "file";

/// A parsed `[scheme://]path` resource location.
///
/// ```rust
/// use useful::resource::ResourceUrl;
///
/// let url = ResourceUrl::parse("https://example.com/conf/app.YAML?rev=2");
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.extension().as_deref(), Some(".yaml"));
///
/// let local = ResourceUrl::parse("/etc/app/config.json");
/// assert_eq!(local.scheme(), "file");
/// assert_eq!(local.path(), "/etc/app/config.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUrl {
    url: String,
    scheme: String,
    path: String,
}

impl ResourceUrl {
    /// Split a location into scheme and path. Schemes are case-insensitive.
    pub fn parse(url: &str) -> Self {
        let (scheme, path) = match url.split_once("://") {
            Some((scheme, path)) if is_scheme(scheme) => (scheme.to_ascii_lowercase(), path.to_string()),
            _ => (DEFAULT_SCHEME.to_string(), url.to_string()),
        };
        Self {
            url: url.to_string(),
            scheme,
            path,
        }
    }

    /// The location exactly as given.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Lower-cased scheme, `file` when none was given.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Everything after `scheme://`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Lower-cased extension of the last path segment including the dot.
    ///
    /// Query strings and fragments are ignored.
    pub fn extension(&self) -> Option<String> {
        let path = self.path.split(['?', '#']).next().unwrap_or_default();
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let dot = file_name.rfind('.')?;
        if dot == 0 || dot + 1 == file_name.len() {
            return None;
        }
        Some(file_name[dot..].to_ascii_lowercase())
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl From<&str> for ResourceUrl {
    fn from(url: &str) -> Self {
        Self::parse(url)
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
