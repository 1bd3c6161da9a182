//! HTTP client for the Mycel directory and login service

use async_trait::async_trait;
use mycel_api::{AuthResponse, ClientPolicy, Credentials, DirectoryResponse, HardwareSpecs};
use mycel_host_api::{AuthService, Directory, HostError, HostResult, IdentityError};
use mycel_util::HardwareId;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Talks to the Mycel HTTP API at `{api}/api/...`
#[derive(Debug, Clone)]
pub struct MycelHttpClient {
    client: Client,
    api_url: String,
}

impl MycelHttpClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> HostResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| HostError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

/// Map a directory response onto a policy or an identity error
pub fn classify_lookup(
    status: StatusCode,
    body: &str,
    hardware_id: &HardwareId,
) -> Result<ClientPolicy, IdentityError> {
    if status == StatusCode::NOT_FOUND {
        return Err(IdentityError::NotRegistered(hardware_id.clone()));
    }
    if status != StatusCode::OK {
        return Err(IdentityError::Transient(format!("HTTP {}", status)));
    }

    serde_json::from_str::<DirectoryResponse>(body)
        .map(|r| r.client)
        .map_err(|e| IdentityError::Decode(e.to_string()))
}

#[async_trait]
impl Directory for MycelHttpClient {
    async fn lookup(&self, hardware_id: &HardwareId) -> Result<ClientPolicy, IdentityError> {
        let response = self
            .client
            .get(self.url("/api/clients/"))
            .query(&[("mac", hardware_id.as_str())])
            .send()
            .await
            .map_err(|e| IdentityError::Transient(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::Transient(e.to_string()))?;

        debug!(hardware_id = %hardware_id, status = status.as_u16(), "Directory lookup");
        classify_lookup(status, &body, hardware_id)
    }

    async fn keep_alive(&self, hardware_id: &HardwareId) -> HostResult<()> {
        let url = self.url("/api/keep_alive/");
        let response = self
            .client
            .get(&url)
            .query(&[("mac", hardware_id.as_str())])
            .send()
            .await
            .map_err(|e| HostError::Network(e.to_string()))?;

        check_status(response.status(), &url)
    }

    async fn report_specs(&self, specs: &HardwareSpecs) -> HostResult<()> {
        let url = self.url("/api/client_specs");
        let response = self
            .client
            .post(&url)
            .json(specs)
            .send()
            .await
            .map_err(|e| HostError::Network(e.to_string()))?;

        check_status(response.status(), &url)
    }
}

#[async_trait]
impl AuthService for MycelHttpClient {
    async fn authenticate(&self, credentials: &Credentials) -> HostResult<AuthResponse> {
        let url = self.url("/api/users/authenticate");
        let response = self
            .client
            .post(&url)
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| HostError::Network(e.to_string()))?;

        check_status(response.status(), &url)?;

        let body = response
            .text()
            .await
            .map_err(|e| HostError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| HostError::Decode(e.to_string()))
    }
}

fn check_status(status: StatusCode, url: &str) -> HostResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(HostError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}
