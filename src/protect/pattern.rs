//! Matching of request paths against the protected documentation paths.

use super::error::ConfigError;
use regex::Regex;

/// Sub-path of the JSON schema under the docs mount point.
pub const JSON_SUFFIX: &str = "/json";
/// Sub-path of the rendered UI under the docs mount point.
pub const UI_INDEX_SUFFIX: &str = "/static/index.html";

/// Which request paths are gated.
#[derive(Debug, Clone)]
pub enum SwaggerPath {
    /// A docs mount point: matches the base itself, its JSON schema and its UI
    /// index. A single trailing slash is tolerated.
    Exact(String),
    /// Any path the regex matches.
    Pattern(Regex),
}

impl SwaggerPath {
    pub fn exact(base: impl Into<String>) -> Self {
        Self::Exact(base.into())
    }

    /// Compiles `pattern` into a matcher.
    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(base) => {
                let base = trim_trailing_slash(base);
                match trim_trailing_slash(path).strip_prefix(base) {
                    Some(rest) => rest.is_empty() || rest == JSON_SUFFIX || rest == UI_INDEX_SUFFIX,
                    None => false,
                }
            }
            Self::Pattern(regex) => regex.is_match(path),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Exact(base) if !base.starts_with('/') => {
                Err(ConfigError::InvalidSwaggerPath(base.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl From<Regex> for SwaggerPath {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

/// Strips one trailing slash, keeping `/` intact.
pub(crate) fn trim_trailing_slash(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches_docs_paths() {
        let path = SwaggerPath::exact("/api");

        assert!(path.matches("/api"));
        assert!(path.matches("/api/"));
        assert!(path.matches("/api/json"));
        assert!(path.matches("/api/static/index.html"));
        assert!(path.matches("/api/static/index.html/"));
    }

    #[test]
    fn exact_ignores_other_paths() {
        let path = SwaggerPath::exact("/api");

        assert!(!path.matches("/apis"));
        assert!(!path.matches("/api/cats"));
        assert!(!path.matches("/api/static/swagger-ui.css"));
        assert!(!path.matches("/login-me"));
        assert!(!path.matches("/"));
    }

    #[test]
    fn pattern_uses_regex() {
        let path = SwaggerPath::pattern(r"^/api/(json|static/index.html)(?:/)?$").unwrap();

        assert!(path.matches("/api/json"));
        assert!(path.matches("/api/static/index.html/"));
        assert!(!path.matches("/api"));
        assert!(!path.matches("/api/cats"));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = SwaggerPath::pattern("^/api/(json").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { pattern, .. } if pattern == "^/api/(json"));
    }

    #[test]
    fn relative_exact_path_is_rejected() {
        assert_eq!(
            SwaggerPath::exact("api").validate(),
            Err(ConfigError::InvalidSwaggerPath("api".to_string()))
        );
        assert!(SwaggerPath::exact("/api").validate().is_ok());
    }
}
