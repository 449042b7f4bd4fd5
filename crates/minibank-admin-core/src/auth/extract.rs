//! Token extraction from login responses of varying shape.

use serde_json::Value;

/// Field paths checked for the token, highest priority first.
const TOKEN_PATHS: &[&[&str]] = &[
    &["token"],
    &["accessToken"],
    &["jwt"],
    &["data", "token"],
];

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// First non-empty string found at one of the known token paths.
///
/// Present-but-empty or non-string values fall through to the next path.
pub fn extract_token(response: &Value) -> Option<String> {
    TOKEN_PATHS
        .iter()
        .filter_map(|path| lookup(response, path))
        .filter_map(Value::as_str)
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// Top-level keys of a response, for diagnosing a missing token without
/// logging any values.
pub fn response_keys(response: &Value) -> Vec<String> {
    match response {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_each_supported_shape() {
        assert_eq!(extract_token(&json!({"token": "X"})).as_deref(), Some("X"));
        assert_eq!(extract_token(&json!({"accessToken": "X"})).as_deref(), Some("X"));
        assert_eq!(extract_token(&json!({"jwt": "X"})).as_deref(), Some("X"));
        assert_eq!(extract_token(&json!({"data": {"token": "X"}})).as_deref(), Some("X"));
    }

    #[test]
    fn test_extract_priority_order() {
        let response = json!({"data": {"token": "D"}, "jwt": "J", "accessToken": "A", "token": "T"});
        assert_eq!(extract_token(&response).as_deref(), Some("T"));

        let response = json!({"data": {"token": "D"}, "jwt": "J"});
        assert_eq!(extract_token(&response).as_deref(), Some("J"));
    }

    #[test]
    fn test_extract_skips_empty_and_non_string() {
        let response = json!({"token": "", "accessToken": null, "jwt": 42, "data": {"token": "D"}});
        assert_eq!(extract_token(&response).as_deref(), Some("D"));
    }

    #[test]
    fn test_extract_none_when_missing() {
        assert_eq!(extract_token(&json!({})), None);
        assert_eq!(extract_token(&json!({"data": {}})), None);
        assert_eq!(extract_token(&json!({"data": "token"})), None);
        assert_eq!(extract_token(&Value::Null), None);
        assert_eq!(extract_token(&json!(["token"])), None);
    }

    #[test]
    fn test_response_keys() {
        let mut keys = response_keys(&json!({"status": "ok", "user": {"id": 1}}));
        keys.sort();
        assert_eq!(keys, vec!["status", "user"]);
        assert!(response_keys(&Value::Null).is_empty());
    }
}
