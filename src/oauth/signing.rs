//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! Shared by the OAuth 1.0a sign-in flow and the Twitter API client.

use crate::utils::crypto::generate_nonce;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid HMAC key")]
    InvalidKey,
}

/// Percent-encode per RFC 3986, leaving only unreserved characters
#[must_use]
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Consumer credentials plus the (optional) token being used
#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    consumer_key: String,
    consumer_secret: String,
    token: Option<String>,
    token_secret: Option<String>,
}

impl OAuth1Signer {
    #[must_use]
    pub fn new(consumer_key: &str, consumer_secret: &str) -> Self {
        Self {
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
            token: None,
            token_secret: None,
        }
    }

    /// Sign on behalf of `token`
    #[must_use]
    pub fn with_token(mut self, token: &str, token_secret: &str) -> Self {
        self.token = Some(token.to_string());
        self.token_secret = Some(token_secret.to_string());
        self
    }

    /// Build the `Authorization` header value for a request
    ///
    /// `params` are the request's query or form parameters; query parameters
    /// already present on `url` are included automatically. `oauth_params`
    /// are extra protocol parameters such as `oauth_callback` or
    /// `oauth_verifier`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        oauth_params: &[(&str, &str)],
    ) -> Result<String, SigningError> {
        let nonce = generate_nonce(24);
        let timestamp = Utc::now().timestamp().to_string();
        self.authorization_header_with(method, url, params, oauth_params, &nonce, &timestamp)
    }

    /// Same as [`Self::authorization_header`] with a fixed nonce and timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed
    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        oauth_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, SigningError> {
        let mut protocol = self.protocol_params(oauth_params, nonce, timestamp);
        let signature = self.signature(method, url, params, &protocol)?;
        protocol.push(("oauth_signature".to_string(), signature));
        protocol.sort();

        let fields: Vec<String> = protocol
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
            .collect();
        Ok(format!("OAuth {}", fields.join(", ")))
    }

    fn protocol_params(
        &self,
        oauth_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Vec<(String, String)> {
        let mut protocol = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];
        if let Some(token) = &self.token {
            protocol.push(("oauth_token".to_string(), token.clone()));
        }
        for (key, value) in oauth_params {
            protocol.push(((*key).to_string(), (*value).to_string()));
        }
        protocol
    }

    /// Compute `oauth_signature` over the request
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed
    pub fn signature(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        protocol: &[(String, String)],
    ) -> Result<String, SigningError> {
        let base = signature_base_string(method, url, params, protocol)?;
        let key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(self.token_secret.as_deref().unwrap_or_default())
        );

        let mut mac =
            HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| SigningError::InvalidKey)?;
        mac.update(base.as_bytes());
        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// `METHOD&base_url&normalized_params`, each part percent-encoded
///
/// # Errors
///
/// Returns an error if the URL cannot be parsed
pub fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(String, String)],
    protocol: &[(String, String)],
) -> Result<String, SigningError> {
    let mut parsed = url::Url::parse(url)?;

    let mut encoded: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
        .collect();
    encoded.extend(
        params
            .iter()
            .chain(protocol)
            .map(|(k, v)| (percent_encode(k), percent_encode(v))),
    );
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    parsed.set_query(None);
    parsed.set_fragment(None);

    Ok(format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(parsed.as_str()),
        percent_encode(&normalized)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Hello Ladies + Gentlemen, a signed OAuth request!";

    fn example_signer() -> OAuth1Signer {
        OAuth1Signer::new(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
        )
        .with_token(
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        )
    }

    fn example_params() -> Vec<(String, String)> {
        vec![("status".to_string(), STATUS.to_string())]
    }

    #[test]
    fn test_percent_encode_reserved_characters() {
        assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(percent_encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn test_published_twitter_signature() {
        let signer = example_signer();
        let protocol = signer.protocol_params(
            &[],
            "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            "1318622958",
        );
        let signature = signer
            .signature(
                "POST",
                "https://api.twitter.com/1.1/statuses/update.json?include_entities=true",
                &example_params(),
                &protocol,
            )
            .unwrap();
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_base_string_sorts_and_encodes() {
        let base = signature_base_string(
            "post",
            "https://api.twitter.com/1.1/statuses/update.json?include_entities=true",
            &example_params(),
            &[("oauth_version".to_string(), "1.0".to_string())],
        )
        .unwrap();
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&\
             include_entities%3Dtrue%26oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"
        );
    }

    #[test]
    fn test_authorization_header_shape() {
        let header = example_signer()
            .authorization_header_with(
                "POST",
                "https://api.twitter.com/1.1/statuses/update.json?include_entities=true",
                &example_params(),
                &[],
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
                "1318622958",
            )
            .unwrap();
        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\", "));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.ends_with("oauth_version=\"1.0\""));
    }

    #[test]
    fn test_request_token_header_carries_callback() {
        let header = OAuth1Signer::new("key", "secret")
            .authorization_header(
                "POST",
                "https://api.twitter.com/oauth/request_token",
                &[],
                &[("oauth_callback", "http://localhost:8080/auth/twitter/callback")],
            )
            .unwrap();
        assert!(header.contains(
            "oauth_callback=\"http%3A%2F%2Flocalhost%3A8080%2Fauth%2Ftwitter%2Fcallback\""
        ));
        assert!(!header.contains("oauth_token="));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(OAuth1Signer::new("k", "s")
            .authorization_header("GET", "not a url", &[], &[])
            .is_err());
    }
}
