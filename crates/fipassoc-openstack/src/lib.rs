// # OpenStack Compute Client
//
// This crate implements the fipassoc compute client surface against the
// OpenStack Compute (Nova) API.
//
// ## Behavior
//
// - One HTTP request per call; no retry, backoff or polling
// - 30 second HTTP timeout
// - HTTP status codes mapped onto fipassoc errors (401/403, 404, 409, 429, 5xx)
// - 404 is reported as `Error::NotFound` so the adapter can treat it as absence
// - Dry-run mode: lookups are sent, mutating calls are only logged
//
// ## Security Requirements
//
// - The auth token NEVER appears in logs or Debug output
// - A client cannot be built with an empty token
//
// ## API Reference
//
// - Add floating IP: POST `/servers/{server_id}/action` `{"addFloatingIp": {...}}`
// - Remove floating IP: POST `/servers/{server_id}/action` `{"removeFloatingIp": {...}}`
// - Show floating IP: GET `/os-floating-ips/{id}`

use async_trait::async_trait;
use fipassoc_core::config::ProviderConfig;
use fipassoc_core::traits::{
    AssociateOpts, ComputeClient, ComputeClientFactory, DisassociateOpts, FloatingIp,
};
use fipassoc_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Name used in logs and provider errors
const PROVIDER_NAME: &str = "openstack";

/// Header carrying the Keystone token
const AUTH_HEADER: &str = "X-Auth-Token";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum ServerAction<'a> {
    AddFloatingIp {
        address: &'a str,
        #[serde(skip_serializing_if = "str::is_empty")]
        fixed_address: &'a str,
    },
    RemoveFloatingIp {
        address: &'a str,
    },
}

#[derive(Debug, Deserialize)]
struct FloatingIpEnvelope {
    floating_ip: FloatingIpBody,
}

/// Nova reports unattached fields as `null`
#[derive(Debug, Deserialize)]
struct FloatingIpBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    fixed_ip: Option<String>,
    #[serde(default)]
    instance_id: Option<String>,
    #[serde(default)]
    pool: Option<String>,
}

impl From<FloatingIpBody> for FloatingIp {
    fn from(body: FloatingIpBody) -> Self {
        FloatingIp {
            id: body.id.unwrap_or_default(),
            ip: body.ip.unwrap_or_default(),
            fixed_ip: body.fixed_ip.unwrap_or_default(),
            instance_id: body.instance_id.unwrap_or_default(),
            pool: body.pool.unwrap_or_default(),
        }
    }
}

/// OpenStack Compute client bound to one region's endpoint
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the client still performs lookups but only
/// logs the action payload of associate/disassociate calls. Lookups of an
/// address this client has pretended to associate report the planned
/// attachment, so a create reads back as present.
pub struct OpenStackComputeClient {
    /// Compute endpoint, e.g. `https://nova.example.net/v2.1`
    endpoint: String,

    /// Keystone token
    /// ⚠️ NEVER log this value
    auth_token: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, skip mutating requests
    dry_run: bool,

    /// Dry-run attachments by floating IP: (instance_id, fixed_ip)
    planned: Mutex<HashMap<String, (String, String)>>,
}

// Custom Debug implementation that hides the auth token
impl std::fmt::Debug for OpenStackComputeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenStackComputeClient")
            .field("endpoint", &self.endpoint)
            .field("auth_token", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl OpenStackComputeClient {
    /// Create a client for `endpoint`
    ///
    /// # Errors
    ///
    /// `Error::ClientInit` if the token or endpoint is empty or the HTTP
    /// client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let auth_token = auth_token.into();

        if auth_token.is_empty() {
            return Err(Error::client_init("OpenStack auth token cannot be empty"));
        }
        if endpoint.is_empty() {
            return Err(Error::client_init("OpenStack compute endpoint cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::client_init(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            auth_token,
            client,
            dry_run,
            planned: Mutex::new(HashMap::new()),
        })
    }

    /// Compute endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn planned(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, String)>> {
        self.planned.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// POST a server action
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /servers/:server_id/action
    /// X-Auth-Token: <token>
    /// ```
    async fn server_action(&self, instance_id: &str, action: &ServerAction<'_>) -> Result<()> {
        let url = format!("{}/servers/{}/action", self.endpoint, instance_id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                url,
                serde_json::to_string(action)?
            );
            return Ok(());
        }

        let response = self
            .client
            .post(&url)
            .header(AUTH_HEADER, &self.auth_token)
            .json(action)
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &format!("server {}", instance_id)).await);
        }

        Ok(())
    }
}

/// Map an unsuccessful response onto a fipassoc error
async fn error_from_response(response: reqwest::Response, subject: &str) -> Error {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {}", subject, error_text)),
        409 => Error::provider(
            PROVIDER_NAME,
            format!("Conflict on {}: {} - {}", subject, status, error_text),
        ),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("Compute server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("Request for {} failed: {} - {}", subject, status, error_text),
        ),
    }
}

#[async_trait]
impl ComputeClient for OpenStackComputeClient {
    async fn associate_instance(&self, instance_id: &str, opts: &AssociateOpts) -> Result<()> {
        tracing::debug!(
            "Adding floating IP {} to server {}",
            opts.floating_ip,
            instance_id
        );

        self.server_action(
            instance_id,
            &ServerAction::AddFloatingIp {
                address: &opts.floating_ip,
                fixed_address: &opts.fixed_ip,
            },
        )
        .await?;

        if self.dry_run {
            self.planned().insert(
                opts.floating_ip.clone(),
                (instance_id.to_string(), opts.fixed_ip.clone()),
            );
        }
        Ok(())
    }

    async fn disassociate_instance(
        &self,
        instance_id: &str,
        opts: &DisassociateOpts,
    ) -> Result<()> {
        tracing::debug!(
            "Removing floating IP {} from server {}",
            opts.floating_ip,
            instance_id
        );

        self.server_action(
            instance_id,
            &ServerAction::RemoveFloatingIp {
                address: &opts.floating_ip,
            },
        )
        .await?;

        if self.dry_run {
            self.planned().remove(&opts.floating_ip);
        }
        Ok(())
    }

    /// # API Call
    ///
    /// ```http
    /// GET /os-floating-ips/:id
    /// X-Auth-Token: <token>
    /// ```
    async fn get_floating_ip(&self, floating_ip: &str) -> Result<FloatingIp> {
        let url = format!("{}/os-floating-ips/{}", self.endpoint, floating_ip);

        let response = self
            .client
            .get(&url)
            .header(AUTH_HEADER, &self.auth_token)
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(
                error_from_response(response, &format!("floating ip {}", floating_ip)).await,
            );
        }

        let envelope: FloatingIpEnvelope = response.json().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e))
        })?;

        let mut fip: FloatingIp = envelope.floating_ip.into();
        if let Some((instance_id, fixed_ip)) = self.planned().get(floating_ip) {
            tracing::info!(
                "[DRY-RUN] Reporting planned attachment of {} to server {}",
                floating_ip,
                instance_id
            );
            fip.instance_id = instance_id.clone();
            if !fixed_ip.is_empty() {
                fip.fixed_ip = fixed_ip.clone();
            }
        }
        Ok(fip)
    }

    fn client_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Builds region-scoped OpenStack compute clients
pub struct OpenStackClientFactory {
    auth_token: String,
    endpoints: HashMap<String, String>,
    default_endpoint: Option<String>,
    dry_run: bool,
}

impl std::fmt::Debug for OpenStackClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenStackClientFactory")
            .field("auth_token", &"<REDACTED>")
            .field("endpoints", &self.endpoints)
            .field("default_endpoint", &self.default_endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl OpenStackClientFactory {
    /// Build a factory from provider configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        match config {
            ProviderConfig::OpenStack {
                auth_token,
                endpoints,
                default_endpoint,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!(
                        "OpenStack client running in DRY-RUN mode - no changes will be made"
                    );
                }

                Ok(Self {
                    auth_token: auth_token.clone(),
                    endpoints: endpoints.clone(),
                    default_endpoint: default_endpoint.clone().filter(|e| !e.is_empty()),
                    dry_run: *dry_run,
                })
            }
        }
    }

    fn endpoint_for(&self, region: &str) -> Option<&str> {
        self.endpoints
            .get(region)
            .or(self.default_endpoint.as_ref())
            .map(String::as_str)
    }
}

impl ComputeClientFactory for OpenStackClientFactory {
    fn client(&self, region: &str) -> Result<Arc<dyn ComputeClient>> {
        let endpoint = self.endpoint_for(region).ok_or_else(|| {
            Error::client_init(format!(
                "No OpenStack compute endpoint configured for region '{}'",
                region
            ))
        })?;

        tracing::debug!("Using compute endpoint {} for region '{}'", endpoint, region);
        let client = OpenStackComputeClient::new(endpoint, self.auth_token.clone(), self.dry_run)?;
        Ok(Arc::new(client))
    }
}
