//! Wire adapter for the single-endpoint script backend.
//!
//! The backend serves every route from one URL, reads the logical route and
//! the session token from the query string, and cannot answer CORS preflight
//! requests. Bodies therefore travel as `text/plain` JSON, and updates are
//! POSTs carrying a `_method` marker.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{ClientError, ClientResult};

pub const ROUTE_PARAM: &str = "route";
pub const TOKEN_PARAM: &str = "token";
pub const METHOD_OVERRIDE_FIELD: &str = "_method";
pub const PLAIN_TEXT_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// Logical verb requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
}

impl Verb {
    /// HTTP method actually sent. PUT is emulated over POST.
    pub fn wire_method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post | Self::Put => Method::POST,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// Builds the request URL: `route`, then `token` when held, then `params`.
/// Parameters replace earlier ones of the same name.
pub fn build_request_url<K, V>(
    endpoint: &Url,
    route: &str,
    token: Option<&str>,
    params: &[(K, V)],
) -> Url
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(String, String)> = endpoint
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    set_param(&mut pairs, ROUTE_PARAM, route);
    if let Some(token) = token {
        set_param(&mut pairs, TOKEN_PARAM, token);
    }
    for (key, value) in params {
        set_param(&mut pairs, key.as_ref(), value.as_ref());
    }

    let mut url = endpoint.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url
}

fn set_param(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    match pairs.iter().position(|(k, _)| k == key) {
        Some(index) => {
            pairs[index].1 = value.to_string();
            let mut seen = false;
            pairs.retain(|(k, _)| {
                if k != key {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
        }
        None => pairs.push((key.to_string(), value.to_string())),
    }
}

/// Serializes a request body for `verb`. GET carries no body; PUT bodies must
/// be JSON objects and get `_method: "PUT"` merged in.
pub fn encode_body<B: Serialize + ?Sized>(verb: Verb, body: &B) -> ClientResult<Option<String>> {
    let value = serde_json::to_value(body).map_err(|e| ClientError::Encode(e.to_string()))?;
    match verb {
        Verb::Get => Ok(None),
        Verb::Post => Ok(Some(value.to_string())),
        Verb::Put => {
            let Value::Object(mut fields) = value else {
                return Err(ClientError::Encode(format!(
                    "update body must be a JSON object, got {}",
                    json_kind(&value)
                )));
            };
            fields.insert(
                METHOD_OVERRIDE_FIELD.to_string(),
                Value::String(Verb::Put.as_str().to_string()),
            );
            Ok(Some(Value::Object(fields).to_string()))
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint() -> Url {
        Url::parse("https://script.example.com/macros/s/abc/exec").expect("endpoint")
    }

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn route_and_token_lead_the_query() {
        let url = build_request_url(
            &endpoint(),
            "/dashboard",
            Some("tok"),
            &[("startDate", "2024-01-01"), ("endDate", "2024-01-31")],
        );
        assert_eq!(url.path(), "/macros/s/abc/exec");
        assert_eq!(
            query(&url),
            vec![
                ("route".to_string(), "/dashboard".to_string()),
                ("token".to_string(), "tok".to_string()),
                ("startDate".to_string(), "2024-01-01".to_string()),
                ("endDate".to_string(), "2024-01-31".to_string()),
            ]
        );
    }

    #[test]
    fn token_param_absent_without_token() {
        let url = build_request_url::<&str, &str>(&endpoint(), "/leads", None, &[]);
        assert_eq!(url.query(), Some("route=%2Fleads"));
    }

    #[test]
    fn later_params_replace_earlier_ones() {
        let base = Url::parse("https://script.example.com/exec?route=/old&v=1").expect("url");
        let url = build_request_url(&base, "/users", Some("t"), &[("route", "/x"), ("v", "2")]);
        assert_eq!(
            query(&url),
            vec![
                ("route".to_string(), "/x".to_string()),
                ("v".to_string(), "2".to_string()),
                ("token".to_string(), "t".to_string()),
            ]
        );
    }

    #[test]
    fn put_body_merges_method_marker() {
        let body = encode_body(Verb::Put, &json!({"id": "L1", "status": "Converted"}))
            .expect("encode")
            .expect("body");
        let decoded: Value = serde_json::from_str(&body).expect("json");
        assert_eq!(
            decoded,
            json!({"id": "L1", "status": "Converted", "_method": "PUT"})
        );
    }

    #[test]
    fn put_marker_overrides_caller_method_field() {
        let body = encode_body(Verb::Put, &json!({"_method": "DELETE"}))
            .expect("encode")
            .expect("body");
        assert_eq!(body, r#"{"_method":"PUT"}"#);
    }

    #[test]
    fn put_rejects_non_object_bodies() {
        let err = encode_body(Verb::Put, &json!([1, 2])).expect_err("array body");
        assert!(matches!(err, ClientError::Encode(_)));
    }

    #[test]
    fn post_body_is_verbatim_and_get_has_none() {
        let body = json!({"email": "a@b.c", "password": "pw"});
        let encoded = encode_body(Verb::Post, &body).expect("encode").expect("body");
        assert_eq!(serde_json::from_str::<Value>(&encoded).expect("json"), body);
        assert_eq!(encode_body(Verb::Get, &body).expect("encode"), None);
    }

    #[test]
    fn put_travels_as_post() {
        assert_eq!(Verb::Put.wire_method(), Method::POST);
        assert_eq!(Verb::Get.wire_method(), Method::GET);
    }
}
