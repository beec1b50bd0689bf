//! Per-request HMAC signing
//!
//! Every non-OPTIONS request carries `X-Timestamp` and `X-Signature` headers.
//! The signature is a hex HMAC-SHA256 over a canonical string built from the
//! timestamp, the HTTP method and the fully-qualified URL; query parameters
//! are sorted lexicographically by key before they enter the URL, and JSON
//! bodies are appended with their top-level keys sorted. The server rebuilds
//! the same string from the request it received, so the URL used for signing
//! must be byte-identical to the URL sent.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::Value;
use sha2::Sha256;
use url::Url;

use crate::error::{NodehostError, Result};

/// Header carrying the unix-seconds timestamp the signature was computed at
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";
/// Header carrying the hex HMAC-SHA256 signature
pub const SIGNATURE_HEADER: &str = "X-Signature";

type HmacSha256 = Hmac<Sha256>;

/// Produces authentication headers for outbound requests.
///
/// Pure apart from reading the clock: the signature is a function of the
/// secret, timestamp, method, URL and payload.
#[derive(Clone)]
pub struct Signer {
    secret: SecretString,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Build the authentication headers for a request, timestamped now.
    ///
    /// OPTIONS requests pass through unsigned: the returned map is empty.
    pub fn headers(&self, method: &Method, url: &Url, body: Option<&Value>) -> Result<HeaderMap> {
        self.headers_at(method, url, body, unix_timestamp())
    }

    /// Build the authentication headers with an explicit timestamp.
    pub fn headers_at(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        timestamp: u64,
    ) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if *method == Method::OPTIONS {
            return Ok(headers);
        }

        let signature = self.sign(&signature_base(timestamp, method, url.as_str(), body))?;

        headers.insert(
            TIMESTAMP_HEADER,
            HeaderValue::from_str(&timestamp.to_string())
                .map_err(|e| NodehostError::Signing(e.to_string()))?,
        );
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&signature)
                .map_err(|e| NodehostError::Signing(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        Ok(headers)
    }

    /// Hex HMAC-SHA256 of a canonical signature base under the shared secret.
    pub fn sign(&self, base: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| NodehostError::Signing(e.to_string()))?;
        mac.update(base.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Compose the canonical string that gets hashed: `timestamp + method + url`,
/// with the sorted-key JSON serialization of the body appended for
/// body-bearing requests. The URL is expected to already carry its query
/// parameters sorted (see [`query_url`]).
pub fn signature_base(timestamp: u64, method: &Method, url: &str, body: Option<&Value>) -> String {
    let mut base = format!("{timestamp}{method}{url}");
    if let Some(body) = body {
        base.push_str(&canonical_json(body));
    }
    base
}

/// Serialize a JSON value with its top-level object keys sorted.
///
/// Top-level sort only; nested objects are serialized as-is.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            serde_json::to_string(&sorted).unwrap_or_default()
        }
        other => other.to_string(),
    }
}

/// Join `path` onto the base URL and append query parameters sorted
/// lexicographically by key, so that logically-equal parameter sets always
/// produce the same URL and therefore the same signature.
pub fn query_url(base_url: &Url, path: &str, params: &[(&str, String)]) -> Result<Url> {
    let mut url = base_url.join(path)?;

    if !params.is_empty() {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let mut pairs = url.query_pairs_mut();
        for (key, value) in sorted {
            pairs.append_pair(key, value);
        }
        drop(pairs);
    }

    Ok(url)
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn signer() -> Signer {
        Signer::new(SecretString::from("s3cr3t"))
    }

    #[test]
    fn test_get_signature_base_vector() {
        let base_url = Url::parse("https://api.example").unwrap();
        let url = query_url(&base_url, "/user_projects", &[("user_id", "7".to_string())]).unwrap();

        let base = signature_base(1_700_000_000, &Method::GET, url.as_str(), None);
        assert_eq!(
            base,
            "1700000000GEThttps://api.example/user_projects?user_id=7"
        );
    }

    #[test]
    fn test_query_order_does_not_change_signature() {
        let base_url = Url::parse("https://api.example").unwrap();
        let forward = query_url(
            &base_url,
            "/verify_email",
            &[("token", "abc".to_string()), ("email", "a@b.c".to_string())],
        )
        .unwrap();
        let reversed = query_url(
            &base_url,
            "/verify_email",
            &[("email", "a@b.c".to_string()), ("token", "abc".to_string())],
        )
        .unwrap();

        assert_eq!(forward, reversed);

        let signer = signer();
        let a = signer
            .headers_at(&Method::GET, &forward, None, 1_700_000_000)
            .unwrap();
        let b = signer
            .headers_at(&Method::GET, &reversed, None, 1_700_000_000)
            .unwrap();
        assert_eq!(a.get(SIGNATURE_HEADER), b.get(SIGNATURE_HEADER));
    }

    #[test]
    fn test_body_key_order_does_not_change_signature() {
        let mut forward = serde_json::Map::new();
        forward.insert("user_id".into(), json!(1));
        forward.insert("project_id".into(), json!(2));

        let mut reversed = serde_json::Map::new();
        reversed.insert("project_id".into(), json!(2));
        reversed.insert("user_id".into(), json!(1));

        assert_eq!(
            canonical_json(&Value::Object(forward)),
            canonical_json(&Value::Object(reversed)),
        );
    }

    #[test]
    fn test_post_body_appended_to_base() {
        let body = json!({"email": "a@b.c", "password": "pw"});
        let base = signature_base(
            1_700_000_000,
            &Method::POST,
            "https://api.example/login",
            Some(&body),
        );
        assert_eq!(
            base,
            "1700000000POSThttps://api.example/login{\"email\":\"a@b.c\",\"password\":\"pw\"}"
        );
    }

    #[test]
    fn test_options_requests_are_unsigned() {
        let url = Url::parse("https://api.example/login").unwrap();
        let headers = signer()
            .headers_at(&Method::OPTIONS, &url, None, 1_700_000_000)
            .unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_signature_is_hex_encoded() {
        let url = Url::parse("https://api.example/login").unwrap();
        let headers = signer()
            .headers_at(&Method::GET, &url, None, 1_700_000_000)
            .unwrap();

        let signature = headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            headers.get(TIMESTAMP_HEADER).unwrap().to_str().unwrap(),
            "1700000000"
        );
    }
}
