//! Wire-protocol header vocabulary and the metadata header convention

use std::collections::HashMap;

use reqwest::header::HeaderMap;

/// Auth request: user name
pub const AUTH_USER: &str = "X-Auth-User";
/// Auth request: API key
pub const AUTH_KEY: &str = "X-Auth-Key";
/// Auth request: ask for a freshly issued token
pub const AUTH_NEW_TOKEN: &str = "X-Auth-New-Token";
/// Bearer token sent on every resource request
pub const AUTH_TOKEN: &str = "X-Auth-Token";
/// Auth response: storage endpoint URL
pub const STORAGE_URL: &str = "X-Storage-Url";
/// Auth response: token lifetime in seconds
pub const AUTH_TOKEN_EXPIRES: &str = "X-Auth-Token-Expires";
/// Server-side copy source, `/{container}/{object}`
pub const COPY_FROM: &str = "X-Copy-From";

/// Account counter: containers
pub const ACCOUNT_CONTAINER_COUNT: &str = "X-Account-Container-Count";
/// Account counter: objects
pub const ACCOUNT_OBJECT_COUNT: &str = "X-Account-Object-Count";
/// Account counter: bytes
pub const ACCOUNT_BYTES_USED: &str = "X-Account-Bytes-Used";
/// Container counter: objects
pub const CONTAINER_OBJECT_COUNT: &str = "X-Container-Object-Count";
/// Container counter: bytes
pub const CONTAINER_BYTES_USED: &str = "X-Container-Bytes-Used";

/// Resource tier a metadata header applies to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetaScope {
    Account,
    Container,
    Object,
}

impl MetaScope {
    fn as_str(self) -> &'static str {
        match self {
            MetaScope::Account => "Account",
            MetaScope::Container => "Container",
            MetaScope::Object => "Object",
        }
    }

    fn meta_prefix(self) -> &'static str {
        match self {
            MetaScope::Account => "x-account-meta-",
            MetaScope::Container => "x-container-meta-",
            MetaScope::Object => "x-object-meta-",
        }
    }
}

/// Synthesize a metadata header name.
///
/// Produces `X-[Remove-]{Account|Container|Object}-Meta-<Tokens>` where each
/// token is capitalized first-letter-upper, rest-lower.
pub fn meta_header_name(scope: MetaScope, remove: bool, tokens: &[&str]) -> String {
    let mut name = String::from("X-");
    if remove {
        name.push_str("Remove-");
    }
    name.push_str(scope.as_str());
    name.push_str("-Meta");
    for token in tokens {
        name.push('-');
        push_capitalized(&mut name, token);
    }
    name
}

fn push_capitalized(out: &mut String, token: &str) {
    let mut chars = token.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.extend(chars.flat_map(char::to_lowercase));
    }
}

/// Extract user metadata from response headers for the given scope.
///
/// Returns the metadata keys with the `x-{scope}-meta-` prefix stripped.
pub fn user_metadata(scope: MetaScope, headers: &HeaderMap) -> HashMap<String, String> {
    let prefix = scope.meta_prefix();
    let mut metadata = HashMap::new();
    for (name, value) in headers.iter() {
        if let Some(key) = name.as_str().strip_prefix(prefix) {
            if let Ok(v) = value.to_str() {
                metadata.insert(key.to_string(), v.to_string());
            }
        }
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_meta_header_name_capitalization() {
        assert_eq!(
            meta_header_name(MetaScope::Object, false, &["favorite", "COLOR"]),
            "X-Object-Meta-Favorite-Color"
        );
        assert_eq!(
            meta_header_name(MetaScope::Account, false, &["quota"]),
            "X-Account-Meta-Quota"
        );
    }

    #[test]
    fn test_meta_header_name_remove_flag() {
        assert_eq!(
            meta_header_name(MetaScope::Container, true, &["web", "index"]),
            "X-Remove-Container-Meta-Web-Index"
        );
    }

    #[test]
    fn test_meta_header_name_is_deterministic() {
        let a = meta_header_name(MetaScope::Container, false, &["a", "b"]);
        let b = meta_header_name(MetaScope::Container, false, &["a", "b"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_user_metadata_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Object-Meta-Color", HeaderValue::from_static("blue"));
        headers.insert("X-Object-Meta-Shape", HeaderValue::from_static("round"));
        headers.insert("X-Container-Meta-Other", HeaderValue::from_static("no"));
        headers.insert("Content-Type", HeaderValue::from_static("text/plain"));

        let metadata = user_metadata(MetaScope::Object, &headers);
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.get("color").map(String::as_str), Some("blue"));
        assert_eq!(metadata.get("shape").map(String::as_str), Some("round"));
    }
}
