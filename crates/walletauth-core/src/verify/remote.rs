/*
[INPUT]:  HTTP configuration (base URL, timeouts), message/signature/nonce
[OUTPUT]: Verification verdict from a remote verification service
[POS]:    Verification layer - network-backed capability
[UPDATE]: When the verification endpoint or its payload changes
*/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::challenge::Nonce;
use crate::error::{AuthError, Result};

use super::VerificationCapability;

const VERIFY_ENDPOINT: &str = "verify";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    message: &'a str,
    signature: &'a str,
    nonce: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    verified: bool,
}

/// Delegates verification to a remote service
///
/// POST {base_url}/verify with `{"message", "signature", "nonce"}`,
/// expecting `{"verified": bool}`.
#[derive(Debug, Clone)]
pub struct RemoteVerifier {
    http_client: Client,
    base_url: Url,
}

impl RemoteVerifier {
    /// Create a verifier with default client configuration
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, ClientConfig::default())
    }

    /// Create a verifier with custom client configuration
    pub fn with_config(base_url: &str, config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        // Url::join drops the last path segment unless it ends with '/'
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        Ok(self.http_client.request(method, url))
    }
}

#[async_trait]
impl VerificationCapability for RemoteVerifier {
    async fn verify(
        &self,
        message: &str,
        signature: &str,
        expected_nonce: &Nonce,
    ) -> Result<bool> {
        let body = VerifyRequest {
            message,
            signature,
            nonce: expected_nonce.as_str(),
        };

        let response = self
            .request(Method::POST, VERIFY_ENDPOINT)?
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(status = %status, body = %text, "verification service returned error");
            return Err(AuthError::api_error(status, text));
        }

        let bytes = response.bytes().await?;
        let verdict: VerifyResponse = serde_json::from_slice(&bytes)?;
        Ok(verdict.verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn nonce() -> Nonce {
        Nonce::parse("abcdef0123456789").unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let verifier = RemoteVerifier::new("https://auth.example.com/siwe").unwrap();
        assert_eq!(verifier.base_url().as_str(), "https://auth.example.com/siwe/");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            RemoteVerifier::new("not a url"),
            Err(AuthError::UrlParse(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_verified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/siwe/verify"))
            .and(body_json(serde_json::json!({
                "message": "msg",
                "signature": "0xsig",
                "nonce": "abcdef0123456789",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"verified": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let verifier = RemoteVerifier::new(&format!("{}/siwe", server.uri())).unwrap();
        let verified = verifier.verify("msg", "0xsig", &nonce()).await.unwrap();
        assert!(verified);
    }

    #[tokio::test]
    async fn test_remote_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"verified": false})),
            )
            .mount(&server)
            .await;

        let verifier = RemoteVerifier::new(&server.uri()).unwrap();
        let verified = verifier.verify("msg", "0xsig", &nonce()).await.unwrap();
        assert!(!verified);
    }

    #[tokio::test]
    async fn test_remote_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let verifier = RemoteVerifier::new(&server.uri()).unwrap();
        let err = verifier.verify("msg", "0xsig", &nonce()).await.unwrap_err();
        match err {
            AuthError::Api { code, message } => {
                assert_eq!(code, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remote_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let verifier = RemoteVerifier::new(&server.uri()).unwrap();
        let err = verifier.verify("msg", "0xsig", &nonce()).await.unwrap_err();
        assert!(matches!(err, AuthError::Serialization(_)));
    }
}
