use crate::config::{Config, ProviderCredentials};
use crate::errors::{AppError, ResultExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::Duration;

const XML_MEDIA_TYPE: &str = "application/xml";

/// Raw provider reply. Non-2xx statuses are data here, not errors.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ProviderResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Client for the CLEAR search API.
///
/// Every call carries HTTP Basic credentials and, in production, a PKCS#12
/// client certificate for mutual TLS.
#[derive(Clone)]
pub struct ClearClient {
    client: reqwest::Client,
    username: String,
    password: String,
}

impl ClearClient {
    /// Creates a client presenting the configured client certificate.
    ///
    /// Reads and parses the PKCS#12 bundle immediately, so a bad path or
    /// passphrase is reported at startup.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let creds = &config.credentials;
        let der = std::fs::read(&creds.cert_path).map_err(|e| {
            AppError::Internal(format!(
                "Failed to read client certificate {}: {}",
                creds.cert_path, e
            ))
        })?;
        let identity =
            reqwest::Identity::from_pkcs12_der(&der, &creds.cert_passphrase).map_err(|e| {
                AppError::Internal(format!(
                    "Failed to load client certificate {}: {}",
                    creds.cert_path, e
                ))
            })?;

        let client = reqwest::Client::builder()
            .identity(identity)
            .timeout(config.provider_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create CLEAR client: {}", e)))?;

        Ok(Self::from_parts(client, creds))
    }

    fn from_parts(client: reqwest::Client, creds: &ProviderCredentials) -> Self {
        Self {
            client,
            username: creds.username.clone(),
            password: creds.password.clone(),
        }
    }

    /// Plain client with only a timeout, no client certificate.
    ///
    /// For deployments where mutual TLS is terminated by a sidecar, and for
    /// tests against a plain HTTP mock provider.
    pub fn without_identity(
        creds: &ProviderCredentials,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create CLEAR client: {}", e)))?;
        Ok(Self::from_parts(client, creds))
    }

    /// Submits a search document.
    pub async fn submit(
        &self,
        endpoint: &str,
        xml_body: String,
    ) -> Result<ProviderResponse, AppError> {
        tracing::info!("Submitting search to CLEAR: {}", endpoint);
        tracing::debug!("Search document: {} bytes", xml_body.len());

        let request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, XML_MEDIA_TYPE)
            .header(ACCEPT, XML_MEDIA_TYPE)
            .basic_auth(&self.username, Some(&self.password))
            .body(xml_body);

        Self::execute(request, endpoint).await
    }

    /// Fetches a continuation URI (result listing or per-group detail).
    pub async fn fetch(&self, uri: &str) -> Result<ProviderResponse, AppError> {
        tracing::debug!("Fetching from CLEAR: {}", uri);

        let request = self
            .client
            .get(uri)
            .header(ACCEPT, XML_MEDIA_TYPE)
            .basic_auth(&self.username, Some(&self.password));

        Self::execute(request, uri).await
    }

    async fn execute(
        request: reqwest::RequestBuilder,
        target: &str,
    ) -> Result<ProviderResponse, AppError> {
        let response = request
            .send()
            .await
            .map_err(AppError::from)
            .with_context(|| format!("CLEAR request to {}", target))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(AppError::from)
            .with_context(|| format!("reading CLEAR response from {}", target))?;

        if !status.is_success() {
            tracing::warn!("CLEAR returned {} for {}", status, target);
        }

        Ok(ProviderResponse { status, body })
    }
}
