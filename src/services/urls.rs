//! GitLab URL construction.
//!
//! Every URL the widget talks to (REST API, OAuth authorize and token
//! endpoints) is built here from the normalized instance URL.

use url::form_urlencoded;
use url::Url;

use crate::error::AppError;

/// Instance used when the host does not configure one.
pub const DEFAULT_INSTANCE_URL: &str = "https://gitlab.com";

/// Normalize and validate a GitLab instance URL.
///
/// Absent or blank input selects [`DEFAULT_INSTANCE_URL`]. Anything else must
/// be an `http(s)://` origin without a path; `http://` is only accepted in
/// dev mode. Trailing slashes are removed.
pub fn normalize_instance_url(raw: Option<&str>, dev_mode: bool) -> Result<String, AppError> {
    let input = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_INSTANCE_URL.to_string()),
        Some(input) => input,
    };

    let lower = input.to_ascii_lowercase();
    if !lower.starts_with("https://") && !lower.starts_with("http://") {
        return Err(invalid(
            input,
            "must start with https:// (or http:// in devMode)",
        ));
    }

    let url = input.trim_end_matches('/');
    let parsed = Url::parse(url).map_err(|_| invalid(input, "not a valid URL"))?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid(input, "not a valid URL"));
    }
    if parsed.path() != "/" && !parsed.path().is_empty() {
        return Err(invalid(input, "must not contain a path component"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid(input, "must not contain a query or fragment"));
    }
    if parsed.scheme() == "http" && !dev_mode {
        return Err(invalid(input, "http:// is only allowed in devMode"));
    }

    Ok(url.to_string())
}

fn invalid(input: &str, reason: &str) -> AppError {
    AppError::invalid_config_field(
        format!("Invalid instanceUrl: \"{}\" - {}", input, reason),
        "instanceUrl",
    )
}

/// Build a GitLab API v4 URL.
///
/// `path` may start with a slash and may carry its own query string.
pub fn build_api_url(base: &str, path: &str) -> String {
    format!(
        "{}/api/v4/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// OAuth authorize request parameters.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizeParams<'a> {
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub state: &'a str,
}

/// Build the GitLab OAuth authorize URL the visitor is redirected to.
pub fn build_authorize_url(base: &str, params: AuthorizeParams<'_>) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", params.client_id)
        .append_pair("redirect_uri", params.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("state", params.state)
        .finish();

    format!("{}/oauth/authorize?{}", base.trim_end_matches('/'), query)
}

/// Build the GitLab OAuth token URL.
pub fn build_token_url(base: &str) -> String {
    format!("{}/oauth/token", base.trim_end_matches('/'))
}

/// Read a query parameter from an absolute URL.
pub fn query_param(url: &str, key: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Query parameters GitLab appends when redirecting back after login.
pub const CALLBACK_PARAMS: [&str; 2] = ["code", "state"];

/// Remove the given query parameters, keeping every other part of the URL.
pub fn strip_query_params(url: &str, keys: &[&str]) -> Result<String, AppError> {
    let mut parsed = parse_page_url(url)?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !keys.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }

    Ok(parsed.into())
}

/// Append `key=value` to the query string of `url`.
pub fn append_query_param(url: &str, key: &str, value: &str) -> Result<String, AppError> {
    let mut parsed = parse_page_url(url)?;
    parsed.query_pairs_mut().append_pair(key, value);
    Ok(parsed.into())
}

fn parse_page_url(url: &str) -> Result<Url, AppError> {
    Url::parse(url).map_err(|e| AppError::internal(format!("Invalid page URL \"{}\": {}", url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_uses_default() {
        assert_eq!(normalize_instance_url(None, false).unwrap(), DEFAULT_INSTANCE_URL);
        assert_eq!(normalize_instance_url(Some(""), false).unwrap(), DEFAULT_INSTANCE_URL);
        assert_eq!(normalize_instance_url(Some("   "), false).unwrap(), DEFAULT_INSTANCE_URL);
    }

    #[test]
    fn test_trailing_slashes_stripped() {
        for raw in [
            "https://gitlab.company.com",
            "https://gitlab.company.com/",
            "https://gitlab.company.com///",
            "  https://gitlab.company.com/  ",
        ] {
            assert_eq!(
                normalize_instance_url(Some(raw), false).unwrap(),
                "https://gitlab.company.com"
            );
        }
    }

    #[test]
    fn test_port_is_kept() {
        assert_eq!(
            normalize_instance_url(Some("https://git.local:8443/"), false).unwrap(),
            "https://git.local:8443"
        );
    }

    #[test]
    fn test_missing_scheme_rejected() {
        for raw in ["gitlab.com", "ftp://gitlab.com", "//gitlab.com", "gitlab.com/https://"] {
            let err = normalize_instance_url(Some(raw), true).unwrap_err();
            assert!(matches!(err, AppError::InvalidConfig { .. }), "{}", raw);
        }
    }

    #[test]
    fn test_unparsable_rejected() {
        assert!(matches!(
            normalize_instance_url(Some("https://"), false),
            Err(AppError::InvalidConfig { .. })
        ));
        assert!(matches!(
            normalize_instance_url(Some("https://exa mple.com"), false),
            Err(AppError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_path_rejected() {
        let err = normalize_instance_url(Some("https://example.com/gitlab"), false).unwrap_err();
        assert!(err.to_string().contains("path component"));
    }

    #[test]
    fn test_http_requires_dev_mode() {
        let err = normalize_instance_url(Some("http://localhost:3000"), false).unwrap_err();
        assert!(err.to_string().contains("devMode"));

        assert_eq!(
            normalize_instance_url(Some("http://localhost:3000/"), true).unwrap(),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_build_api_url_single_slash() {
        for (base, path) in [
            ("https://gitlab.com", "projects"),
            ("https://gitlab.com/", "/projects"),
            ("https://gitlab.com//", "//projects"),
        ] {
            let url = build_api_url(base, path);
            assert_eq!(url, "https://gitlab.com/api/v4/projects");
            assert!(!url.contains("//api"));
        }
    }

    #[test]
    fn test_build_api_url_keeps_query() {
        assert_eq!(
            build_api_url("https://gitlab.com", "projects?search=blog"),
            "https://gitlab.com/api/v4/projects?search=blog"
        );
    }

    #[test]
    fn test_authorize_url_round_trip() {
        let state = urlencoding::encode("https://mysite.com/blog/my-post?x=1").into_owned();
        let url = build_authorize_url(
            "https://gitlab.company.com",
            AuthorizeParams {
                client_id: "my-specific-client-id",
                redirect_uri: "https://mysite.com/callback",
                state: &state,
            },
        );

        assert!(url.starts_with("https://gitlab.company.com/oauth/authorize?"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fmysite.com%2Fcallback"));

        assert_eq!(query_param(&url, "client_id").unwrap(), "my-specific-client-id");
        assert_eq!(query_param(&url, "redirect_uri").unwrap(), "https://mysite.com/callback");
        assert_eq!(query_param(&url, "response_type").unwrap(), "code");
        assert_eq!(query_param(&url, "state").unwrap(), state);
    }

    #[test]
    fn test_token_url() {
        assert_eq!(build_token_url("https://gitlab.com"), "https://gitlab.com/oauth/token");
    }

    #[test]
    fn test_strip_query_params() {
        assert_eq!(
            strip_query_params("https://site/post?code=abc&state=xyz", &["code", "state"]).unwrap(),
            "https://site/post"
        );
        assert_eq!(
            strip_query_params("https://site/post?page=2&code=abc#c1", &["code", "state"]).unwrap(),
            "https://site/post?page=2#c1"
        );
    }

    #[test]
    fn test_append_query_param() {
        assert_eq!(
            append_query_param("https://site/post", "code", "abc").unwrap(),
            "https://site/post?code=abc"
        );
        assert_eq!(
            append_query_param("https://site/post?page=2", "code", "a b").unwrap(),
            "https://site/post?page=2&code=a+b"
        );
    }
}
