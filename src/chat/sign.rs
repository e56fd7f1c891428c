//! AWS Signature Version 4 request signing.
//!
//! Both Bedrock endpoints this client talks to (the runtime Converse API
//! and the control-plane inference-profile listing) authenticate with
//! SigV4 over the `bedrock` service scope. The output is the set of
//! headers to attach to the request.

use std::fmt::Write as _;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use super::credentials::AwsCredentials;

const SERVICE: &str = "bedrock";

type HmacSha256 = Hmac<Sha256>;

/// Headers produced by signing one request.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: String,
    pub security_token: Option<String>,
}

/// Signs a request against the given URL and payload.
///
/// `now` is injected so tests can pin the date; callers pass `Utc::now()`.
pub fn sign_request(
    method: &str,
    url: &Url,
    payload: &[u8],
    credentials: &AwsCredentials,
    region: &str,
    now: DateTime<Utc>,
) -> Result<SignedHeaders> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(payload);
    let host = host_header(url)?;

    let mut headers = vec![
        ("content-type".to_string(), "application/json".to_string()),
        ("host".to_string(), host),
        ("x-amz-content-sha256".to_string(), payload_hash.clone()),
        ("x-amz-date".to_string(), amz_date.clone()),
    ];
    if let Some(token) = credentials.session_token.as_deref() {
        headers.push(("x-amz-security-token".to_string(), token.to_string()));
    }
    headers.sort_by(|left, right| left.0.cmp(&right.0));

    let signed_header_names = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let mut canonical_header_block = String::new();
    for (name, value) in &headers {
        writeln!(&mut canonical_header_block, "{name}:{}", value.trim())
            .context("Failed to build canonical header block")?;
    }

    let canonical_request = format!(
        "{method}\n{uri}\n{query}\n{canonical_header_block}\n{signed_header_names}\n{payload_hash}",
        uri = canonical_uri(url),
        query = canonical_query(url),
    );
    let scope = format!("{date_stamp}/{region}/{SERVICE}/aws4_request");
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{hash}",
        hash = sha256_hex(canonical_request.as_bytes())
    );
    let signature = hex_encode(&derive_signature(
        &credentials.secret_access_key,
        &date_stamp,
        region,
        &string_to_sign,
    )?);

    Ok(SignedHeaders {
        authorization: format!(
            "AWS4-HMAC-SHA256 Credential={key_id}/{scope}, SignedHeaders={signed_header_names}, Signature={signature}",
            key_id = credentials.access_key_id,
        ),
        amz_date,
        content_sha256: payload_hash,
        security_token: credentials.session_token.clone(),
    })
}

fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("Endpoint URL is missing a host"))?;
    Ok(url
        .port()
        .map_or_else(|| host.to_string(), |port| format!("{host}:{port}")))
}

fn canonical_uri(url: &Url) -> String {
    let segments = url
        .path_segments()
        .map(|parts| parts.map(percent_encode).collect::<Vec<_>>())
        .unwrap_or_default();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn canonical_query(url: &Url) -> String {
    let mut pairs = url
        .query_pairs()
        .map(|(key, value)| (percent_encode(&key), percent_encode(&value)))
        .collect::<Vec<_>>();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

// SigV4 uses the strict RFC 3986 unreserved set; anything else is encoded,
// including the `:` that appears in Bedrock model ids.
fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push('%');
            encoded.push(hex_digit(byte >> 4));
            encoded.push(hex_digit(byte & 0x0f));
        }
    }
    encoded
}

fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => char::from(b'0' + nibble),
        10..=15 => char::from(b'A' + nibble - 10),
        _ => '0',
    }
}

fn derive_signature(
    secret_access_key: &str,
    date_stamp: &str,
    region: &str,
    string_to_sign: &str,
) -> Result<Vec<u8>> {
    let key_date = hmac_sha256(
        format!("AWS4{secret_access_key}").as_bytes(),
        date_stamp.as_bytes(),
    )?;
    let key_region = hmac_sha256(&key_date, region.as_bytes())?;
    let key_service = hmac_sha256(&key_region, SERVICE.as_bytes())?;
    let key_signing = hmac_sha256(&key_service, b"aws4_request")?;
    hmac_sha256(&key_signing, string_to_sign.as_bytes())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|err| anyhow!("Failed to initialize HMAC: {err}"))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex_encode(&Sha256::digest(bytes))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn credentials(token: Option<&str>) -> AwsCredentials {
        AwsCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            session_token: token.map(str::to_string),
            region: None,
        }
    }

    #[test]
    fn signed_headers_carry_scope_and_security_token() {
        let url = Url::parse(
            "https://bedrock-runtime.us-west-2.amazonaws.com/model/us.amazon.nova-pro-v1%3A0/converse",
        )
        .expect("url");
        let now = Utc
            .with_ymd_and_hms(2026, 2, 10, 8, 0, 0)
            .single()
            .expect("datetime");

        let headers = sign_request(
            "POST",
            &url,
            br#"{"messages":[{"role":"user","content":[{"text":"Ping"}]}]}"#,
            &credentials(Some("session-token")),
            "us-west-2",
            now,
        )
        .expect("sign request");

        assert!(headers
            .authorization
            .contains("Credential=AKIDEXAMPLE/20260210/us-west-2/bedrock/aws4_request"));
        assert!(headers.authorization.contains(
            "SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date;x-amz-security-token"
        ));
        assert_eq!(headers.amz_date, "20260210T080000Z");
        assert_eq!(headers.security_token.as_deref(), Some("session-token"));
        assert_eq!(headers.content_sha256.len(), 64);
    }

    #[test]
    fn token_header_is_omitted_without_a_session_token() {
        let url = Url::parse("https://bedrock.us-east-1.amazonaws.com/inference-profiles")
            .expect("url");
        let now = Utc
            .with_ymd_and_hms(2026, 2, 10, 8, 0, 0)
            .single()
            .expect("datetime");

        let headers =
            sign_request("GET", &url, b"", &credentials(None), "us-east-1", now).expect("sign");
        assert!(headers
            .authorization
            .contains("SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date,"));
        assert_eq!(headers.security_token, None);
    }

    #[test]
    fn query_parameters_are_sorted_into_the_canonical_form() {
        assert_eq!(
            canonical_query(
                &Url::parse("https://example.com/x?b=2&a=1&a=0").expect("url")
            ),
            "a=0&a=1&b=2"
        );
    }

    #[test]
    fn model_id_colon_is_percent_encoded() {
        assert_eq!(
            percent_encode("us.amazon.nova-pro-v1:0"),
            "us.amazon.nova-pro-v1%3A0"
        );
    }
}
