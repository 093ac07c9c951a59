//! Mapping between request URLs and manifest keys.

use std::fmt;

use url::Url;

use crate::error::{SyncError, SyncResult};
use crate::manifest::ROOT_KEY;

/// Cache-busting query convention appended by the app (`main.dart.js?v=123`).
const VERSION_QUERY: &str = "?v=";

/// Deployment origin (`scheme://host[:port]`), without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    pub fn parse(input: &str) -> SyncResult<Self> {
        let url = Url::parse(input).map_err(|e| SyncError::Config {
            message: format!("invalid origin {:?}: {}", input, e),
        })?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(SyncError::Config {
                message: format!("origin {:?} has no scheme/host", input),
            });
        }
        Ok(Self(origin.ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL for a manifest key.
    pub fn resolve(&self, key: &str) -> String {
        if key == ROOT_KEY {
            format!("{}/", self.0)
        } else {
            format!("{}/{}", self.0, key.trim_start_matches('/'))
        }
    }

    /// Path of `url` after the origin and its separator, as stored cache keys
    /// are compared against the manifest. The bare origin maps to the root key.
    ///
    /// Returns `None` for URLs outside this origin.
    pub fn relative_key(&self, url: &str) -> Option<String> {
        let rest = self.after_origin(url)?;
        let key = rest.get(1..).unwrap_or("");
        if key.is_empty() {
            Some(ROOT_KEY.to_string())
        } else {
            Some(key.to_string())
        }
    }

    /// Manifest key for an intercepted request.
    ///
    /// Drops the `?v=` cache buster and collapses the bare origin, fragment
    /// navigations (`origin/#/route`) and the empty path to the root key.
    pub fn request_key(&self, url: &str) -> Option<String> {
        let rest = self.after_origin(url)?;
        if rest.is_empty() || rest.starts_with("/#") {
            return Some(ROOT_KEY.to_string());
        }

        let mut key = rest.get(1..).unwrap_or("");
        if let Some((path, _)) = key.split_once(VERSION_QUERY) {
            key = path;
        }
        if key.is_empty() {
            Some(ROOT_KEY.to_string())
        } else {
            Some(key.to_string())
        }
    }

    fn after_origin<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = url.strip_prefix(self.0.as_str())?;
        // `https://app.example` must not match `https://app.example.org/...`
        match rest.chars().next() {
            None | Some('/') | Some('?') | Some('#') => Some(rest),
            Some(_) => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key a response is stored under: the request URL without its fragment.
pub fn cache_key(url: &str) -> &str {
    match url.split_once('#') {
        Some((base, _)) => base,
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::parse("https://app.example.com").unwrap()
    }

    #[test]
    fn test_parse_strips_path_and_trailing_slash() {
        let o = Origin::parse("https://app.example.com/some/path?x=1").unwrap();
        assert_eq!(o.as_str(), "https://app.example.com");

        let with_port = Origin::parse("http://localhost:8080/").unwrap();
        assert_eq!(with_port.as_str(), "http://localhost:8080");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Origin::parse("not a url").is_err());
        assert!(Origin::parse("data:text/plain,hi").is_err());
    }

    #[test]
    fn test_resolve() {
        let o = origin();
        assert_eq!(o.resolve("/"), "https://app.example.com/");
        assert_eq!(o.resolve("main.dart.js"), "https://app.example.com/main.dart.js");
        assert_eq!(
            o.resolve("assets/FontManifest.json"),
            "https://app.example.com/assets/FontManifest.json"
        );
    }

    #[test]
    fn test_relative_key() {
        let o = origin();
        assert_eq!(o.relative_key("https://app.example.com/").as_deref(), Some("/"));
        assert_eq!(o.relative_key("https://app.example.com").as_deref(), Some("/"));
        assert_eq!(
            o.relative_key("https://app.example.com/assets/a.png").as_deref(),
            Some("assets/a.png")
        );
        // Query strings are kept: a busted URL is not a manifest key.
        assert_eq!(
            o.relative_key("https://app.example.com/main.dart.js?v=1").as_deref(),
            Some("main.dart.js?v=1")
        );
        assert_eq!(o.relative_key("https://cdn.example.com/a.js"), None);
    }

    #[test]
    fn test_request_key_strips_version_query() {
        let o = origin();
        assert_eq!(
            o.request_key("https://app.example.com/main.dart.js?v=123").as_deref(),
            Some("main.dart.js")
        );
        assert_eq!(
            o.request_key("https://app.example.com/?v=123").as_deref(),
            Some("/")
        );
    }

    #[test]
    fn test_request_key_root_forms() {
        let o = origin();
        assert_eq!(o.request_key("https://app.example.com").as_deref(), Some("/"));
        assert_eq!(o.request_key("https://app.example.com/").as_deref(), Some("/"));
        assert_eq!(
            o.request_key("https://app.example.com/#/settings").as_deref(),
            Some("/")
        );
    }

    #[test]
    fn test_request_key_foreign_origin() {
        let o = origin();
        assert_eq!(o.request_key("https://other.example.com/main.dart.js"), None);
        assert_eq!(o.request_key("https://app.example.com.evil.io/main.dart.js"), None);
    }

    #[test]
    fn test_cache_key_drops_fragment() {
        assert_eq!(cache_key("https://a.io/#/home"), "https://a.io/");
        assert_eq!(cache_key("https://a.io/x.js?v=1"), "https://a.io/x.js?v=1");
    }
}
