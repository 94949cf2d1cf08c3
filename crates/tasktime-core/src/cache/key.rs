//! Canonical cache keys.
//!
//! A key is a pure function of the request shape: method, normalized path,
//! sorted query parameters and a SHA-256 digest of the canonical JSON body.

use sha2::{Digest, Sha256};

use crate::api::request::{Method, Request};

/// Suffix that turns a cache key into its long-lived fallback key.
pub const STALE_SUFFIX: &str = "-stale";

/// Hex characters of the body digest kept in the key.
const BODY_DIGEST_LEN: usize = 16;

/// Derive the canonical key for `request`.
///
/// Format: `METHOD /path[?k=v&k=v][#digest]`.
pub fn cache_key(request: &Request) -> String {
    let mut key = format!("{} {}", request.method, normalize_path(&request.path));

    if !request.params.is_empty() {
        let mut params: Vec<&(String, String)> = request.params.iter().collect();
        params.sort();
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
            .collect::<Vec<_>>()
            .join("&");
        key.push('?');
        key.push_str(&query);
    }

    if let Some(ref body) = request.body {
        // serde_json maps are ordered by key, so equal bodies serialize equally
        let canonical = body.to_string();
        let digest = hex::encode(Sha256::digest(canonical.as_bytes()));
        key.push('#');
        key.push_str(&digest[..BODY_DIGEST_LEN]);
    }

    key
}

/// Key of a plain GET with no params or body, as used for invalidation.
pub fn read_key(path: &str) -> String {
    cache_key(&Request::new(Method::Get, path))
}

pub fn stale_key(key: &str) -> String {
    format!("{}{}", key, STALE_SUFFIX)
}

/// Percent-encode the characters that delimit the key's query and body parts.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            '#' => out.push_str("%23"),
            c => out.push(c),
        }
    }
    out
}

/// Strip a trailing slash (except on the root) so `/tasks/` and `/tasks` agree.
fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Request {
        Request::get("/tasks")
            .with_param("status", "pending")
            .with_param("category", "trabalho")
    }

    #[test]
    fn test_identical_shape_gives_identical_key() {
        assert_eq!(cache_key(&base()), cache_key(&base()));

        let a = Request::post("/tasks", json!({"title": "x", "priority": "high"}));
        let b = Request::post("/tasks", json!({"priority": "high", "title": "x"}));
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn test_param_order_is_normalized() {
        let reordered = Request::get("/tasks")
            .with_param("category", "trabalho")
            .with_param("status", "pending");
        assert_eq!(cache_key(&base()), cache_key(&reordered));
    }

    #[test]
    fn test_any_field_change_changes_key() {
        let original = cache_key(&base());

        let mut method = base();
        method.method = Method::Delete;
        assert_ne!(cache_key(&method), original);

        let mut path = base();
        path.path = "/tasks/1".to_string();
        assert_ne!(cache_key(&path), original);

        let param_value = Request::get("/tasks")
            .with_param("status", "completed")
            .with_param("category", "trabalho");
        assert_ne!(cache_key(&param_value), original);

        let with_body = base().with_body(json!({"a": 1}));
        assert_ne!(cache_key(&with_body), original);

        let other_body = base().with_body(json!({"a": 2}));
        assert_ne!(cache_key(&with_body), cache_key(&other_body));
    }

    #[test]
    fn test_delimiters_inside_params_do_not_collide() {
        let embedded = Request::get("/tasks").with_param("a", "1&b=2");
        let split = Request::get("/tasks").with_param("a", "1").with_param("b", "2");
        assert_ne!(cache_key(&embedded), cache_key(&split));

        let in_key = Request::get("/tasks").with_param("a=1", "");
        let in_value = Request::get("/tasks").with_param("a", "1=");
        assert_ne!(cache_key(&in_key), cache_key(&in_value));

        // A literal escape sequence stays distinct from the escaped character
        let literal = Request::get("/tasks").with_param("q", "R%26D");
        let raw = Request::get("/tasks").with_param("q", "R&D");
        assert_ne!(cache_key(&literal), cache_key(&raw));
        assert_eq!(cache_key(&raw), "GET /tasks?q=R%26D");

        let hash = Request::get("/tasks").with_param("q", "#abc");
        assert_eq!(cache_key(&hash), "GET /tasks?q=%23abc");
    }

    #[test]
    fn test_plain_read_keys() {
        assert_eq!(read_key("/tasks"), "GET /tasks");
        assert_eq!(read_key("/tasks/"), "GET /tasks");
        assert_eq!(read_key("/tasks/42"), "GET /tasks/42");
        assert_eq!(cache_key(&Request::get("/")), "GET /");
    }

    #[test]
    fn test_stale_key_suffix() {
        assert_eq!(stale_key("GET /tasks"), "GET /tasks-stale");
    }
}
