// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Redaction of sensitive values in captured JSON payloads.
//!
//! Two modes:
//! - **mask-all** (no keys given): every string leaf becomes [`MASK_PLACEHOLDER`]. Traversal stops
//!   at [`MAX_DEPTH`]; deeper nodes are replaced with `null` instead of being visited.
//! - **selective** (keys given): the value of every object member whose name matches a key,
//!   ignoring ASCII case, is replaced whole; everything else is walked without a depth limit.
//!
//! Input that does not parse as JSON is returned unchanged, so capture never fails the host.

use std::collections::HashSet;

use serde_json::Value;
use tracing::trace;

use crate::constants::MASK_PLACEHOLDER;

/// Deepest level visited in mask-all mode. The root is level 0.
pub const MAX_DEPTH: usize = 8;

/// Field names masked in captured bodies and messages.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "pass",
    "passwd",
    "pwd",
    "token",
    "access_token",
    "accessToken",
    "refresh_token",
    "refreshToken",
    "secret",
    "api_key",
    "apiKey",
    "authorization",
    "auth_token",
    "authToken",
    "jwt",
    "session_id",
    "sessionId",
    "sessionToken",
    "client_secret",
    "clientSecret",
    "private_key",
    "privateKey",
    "public_key",
    "publicKey",
    "key",
    "encryption_key",
    "encryptionKey",
    "credit_card",
    "creditCard",
    "card_number",
    "cardNumber",
    "cvv",
    "cvc",
    "ssn",
    "sin",
    "pin",
    "security_code",
    "securityCode",
    "bank_account",
    "bankAccount",
    "iban",
    "swift",
    "bic",
    "routing_number",
    "routingNumber",
    "license_key",
    "licenseKey",
    "otp",
    "mfa_code",
    "mfaCode",
    "phone_number",
    "phoneNumber",
    "email",
    "address",
    "dob",
    "tax_id",
    "taxId",
    "passport_number",
    "passportNumber",
    "driver_license",
    "driverLicense",
    "set-cookie",
    "cookie",
    "proxyAuthorization",
];

/// Header names masked in captured request and response headers.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "set-cookie",
    "cookie",
    "authorization",
    "proxyAuthorization",
];

/// Masks `input_json`. An empty `keys_to_mask` selects mask-all mode.
pub fn mask_json<S: AsRef<str>>(input_json: &str, keys_to_mask: &[S]) -> String {
    mask_json_with_max_depth(input_json, keys_to_mask, MAX_DEPTH)
}

/// [`mask_json`] with an explicit depth limit for mask-all mode.
pub fn mask_json_with_max_depth<S: AsRef<str>>(
    input_json: &str,
    keys_to_mask: &[S],
    max_depth: usize,
) -> String {
    let root: Value = match serde_json::from_str(input_json) {
        Ok(root) => root,
        Err(e) => {
            trace!("Payload is not JSON, leaving it unmasked: {e}");
            return input_json.to_string();
        }
    };

    let masked = if keys_to_mask.is_empty() {
        mask_all(root, 0, max_depth)
    } else {
        let keys: HashSet<String> = keys_to_mask
            .iter()
            .map(|key| key.as_ref().to_ascii_lowercase())
            .collect();
        mask_selected(root, &keys)
    };

    // A literal `null` document has nothing to mask.
    if masked.is_null() {
        return input_json.to_string();
    }
    serde_json::to_string(&masked).unwrap_or_else(|_| input_json.to_string())
}

fn mask_all(node: Value, depth: usize, max_depth: usize) -> Value {
    if depth > max_depth {
        return Value::Null;
    }
    match node {
        Value::String(_) => Value::String(MASK_PLACEHOLDER.to_string()),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| mask_all(item, depth + 1, max_depth))
                .collect(),
        ),
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .map(|(key, value)| (key, mask_all(value, depth + 1, max_depth)))
                .collect(),
        ),
        scalar => scalar,
    }
}

fn mask_selected(node: Value, keys: &HashSet<String>) -> Value {
    match node {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| mask_selected(item, keys))
                .collect(),
        ),
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .map(|(key, value)| {
                    if keys.contains(&key.to_ascii_lowercase()) {
                        (key, Value::String(MASK_PLACEHOLDER.to_string()))
                    } else {
                        let value = mask_selected(value, keys);
                        (key, value)
                    }
                })
                .collect(),
        ),
        other => other,
    }
}

/// Masks a captured body or message with [`SENSITIVE_FIELDS`].
pub fn mask_body(body: &str) -> String {
    mask_json(body, SENSITIVE_FIELDS)
}

/// Masks captured headers, serialized as a JSON object, with [`SENSITIVE_HEADERS`].
pub fn mask_headers(headers_json: &str) -> String {
    mask_json(headers_json, SENSITIVE_HEADERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duplicate::duplicate_item;

    const NO_KEYS: &[&str] = &[];

    #[test]
    fn test_selective_masks_only_listed_keys() {
        assert_eq!(
            mask_json(r#"{"user":"alice","password":"x"}"#, &["password"]),
            r#"{"user":"alice","password":"***MASKED***"}"#
        );
    }

    #[test]
    fn test_selective_is_case_insensitive() {
        assert_eq!(
            mask_json(r#"{"PassWord":"x","Token":1}"#, &["password", "TOKEN"]),
            r#"{"PassWord":"***MASKED***","Token":"***MASKED***"}"#
        );
    }

    #[test]
    fn test_selective_replaces_whole_subtree() {
        assert_eq!(
            mask_json(
                r#"{"secret":{"nested":["a",{"b":2}]},"keep":true}"#,
                &["secret"]
            ),
            r#"{"secret":"***MASKED***","keep":true}"#
        );
    }

    #[test]
    fn test_selective_walks_arrays_and_deep_nesting() {
        let deep = r#"{"a":[{"b":{"c":{"d":{"e":{"f":{"g":{"h":{"i":{"token":"t"}}}}}}}}}]}"#;
        assert_eq!(
            mask_json(deep, &["token"]),
            r#"{"a":[{"b":{"c":{"d":{"e":{"f":{"g":{"h":{"i":{"token":"***MASKED***"}}}}}}}}}]}"#
        );
    }

    #[test]
    fn test_mask_all_strings_only() {
        assert_eq!(
            mask_json(
                r#"{"name":"bob","age":42,"admin":false,"nick":null,"tags":["a","b"]}"#,
                NO_KEYS
            ),
            r#"{"name":"***MASKED***","age":42,"admin":false,"nick":null,"tags":["***MASKED***","***MASKED***"]}"#
        );
    }

    #[test]
    fn test_mask_all_top_level_string() {
        assert_eq!(mask_json(r#""hello""#, NO_KEYS), r#""***MASKED***""#);
        assert_eq!(mask_json("17", NO_KEYS), "17");
    }

    #[test]
    fn test_mask_all_depth_limit() {
        let masked = mask_json_with_max_depth(r#"{"a":{"b":{"c":"v"}}}"#, NO_KEYS, 1);
        assert_eq!(masked, r#"{"a":{"b":null}}"#);

        let masked = mask_json_with_max_depth(r#"{"a":{"b":{"c":"v"}}}"#, NO_KEYS, 0);
        assert_eq!(masked, r#"{"a":null}"#);
    }

    #[test]
    fn test_mask_all_pathological_nesting() {
        let depth = 2_000;
        let input = format!("{}\"x\"{}", "[".repeat(depth), "]".repeat(depth));
        // serde_json refuses to parse past its recursion limit, which falls back to passthrough
        let masked = mask_json(&input, NO_KEYS);
        assert!(masked == input || masked.contains("null"));

        let input = format!("{}\"x\"{}", "[".repeat(20), "]".repeat(20));
        let masked = mask_json(&input, NO_KEYS);
        assert!(!masked.contains('x'));
        assert!(masked.contains("null"));
    }

    #[duplicate_item(
        test_name                     input;
        [test_passthrough_plain_text] ["not json"];
        [test_passthrough_truncated]  [r#"{"password":"#];
        [test_passthrough_empty]      [""];
        [test_passthrough_null]       ["null"];
    )]
    #[test]
    fn test_name() {
        assert_eq!(mask_json(input, &["password"]), input);
        assert_eq!(mask_json(input, NO_KEYS), input);
    }

    #[test]
    fn test_non_ascii_not_escaped() {
        assert_eq!(
            mask_json(r#"{"city":"Zürich","pin":"1234","note":"<b>ok</b> & 😀"}"#, &["pin"]),
            r#"{"city":"Zürich","pin":"***MASKED***","note":"<b>ok</b> & 😀"}"#
        );
    }

    #[test]
    fn test_default_denylists() {
        assert_eq!(
            mask_body(r#"{"email":"a@b.c","accessToken":"t","item":"book"}"#),
            r#"{"email":"***MASKED***","accessToken":"***MASKED***","item":"book"}"#
        );
        assert_eq!(
            mask_headers(r#"{"Authorization":"Bearer x","content-type":"application/json"}"#),
            r#"{"Authorization":"***MASKED***","content-type":"application/json"}"#
        );
    }

    #[test]
    fn test_whitespace_is_compacted() {
        assert_eq!(
            mask_json("{ \"a\" : [ 1 , 2 ] }", &["b"]),
            r#"{"a":[1,2]}"#
        );
    }
}
