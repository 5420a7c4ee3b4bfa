//! HMAC-SHA256 payload signing.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Compute the integrity tag for a delivery payload.
///
/// The payload is canonicalized (object keys sorted, recursively) before
/// hashing, so the same payload always produces the same tag regardless of
/// how the caller assembled it. The output is prefixed with the algorithm
/// name so subscribers can support additional algorithms later.
pub fn sign_payload(payload: &Value, secret: &str) -> String {
    let canonical = canonicalize(payload).to_string();
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    let result = mac.finalize();
    format!("sha256={}", hex::encode(result.into_bytes()))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .iter()
                .map(|(key, inner)| (key.clone(), canonicalize(inner)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
