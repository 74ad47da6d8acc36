//! Cloudflare Tunnel API client.
//!
//! Wraps the v4 API operations the workflow needs: named-tunnel
//! creation, ingress configuration, DNS record management, connection
//! status and teardown. Credentials and identifiers are resolved from
//! the environment at call time; a missing variable fails fast with an
//! error naming it.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::ProviderError;
use crate::provider::{TunnelConnection, TunnelEndpoint, TunnelProvider, TunnelStatus};

const API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Configuration the client needs for every call.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API bearer credential.
    pub api_token: String,
    /// Account owning the tunnels.
    pub account_id: String,
    /// DNS zone the tunnel hostnames live in.
    pub zone_id: String,
    /// Fixed hostname suffix; tunnels are `{slug}.{tunnel_domain}`.
    pub tunnel_domain: String,
    /// Internal address the `/mcp` path prefix routes to.
    pub engine_service: String,
    /// Internal address every other path routes to.
    pub dashboard_service: String,
}

impl ProviderConfig {
    /// Resolve configuration from the environment.
    pub fn from_env() -> Result<Self, ProviderError> {
        Ok(Self {
            api_token: require("CLOUDFLARE_API_TOKEN")?,
            account_id: require("CLOUDFLARE_ACCOUNT_ID")?,
            zone_id: require("CLOUDFLARE_ZONE_ID")?,
            tunnel_domain: require("TUNNEL_DOMAIN")?,
            engine_service: std::env::var("ENGINE_SERVICE_URL")
                .unwrap_or_else(|_| "http://engine:8080".into()),
            dashboard_service: std::env::var("DASHBOARD_SERVICE_URL")
                .unwrap_or_else(|_| "http://dashboard:3000".into()),
        })
    }
}

fn require(name: &'static str) -> Result<String, ProviderError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ProviderError::MissingConfig(name))
}

/// Cloudflare Tunnel client.
pub struct CloudflareClient {
    http: reqwest::Client,
    base_url: String,
    config: Option<ProviderConfig>,
}

impl CloudflareClient {
    /// Client against the production API, configured from the
    /// environment at call time.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: API_BASE.to_string(),
            config: None,
        }
    }

    /// Client with a fixed base URL and configuration. Used by tests
    /// against a local API double.
    pub fn with_config(base_url: impl Into<String>, config: ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            config: Some(config),
        }
    }

    fn config(&self) -> Result<ProviderConfig, ProviderError> {
        match &self.config {
            Some(cfg) => Ok(cfg.clone()),
            None => ProviderConfig::from_env(),
        }
    }

    /// Parse a v4 API envelope, surfacing the provider's own diagnostic
    /// on failure.
    async fn parse<T: DeserializeOwned>(
        resp: reqwest::Response,
        operation: &'static str,
    ) -> Result<T, ProviderError> {
        let status = resp.status();
        let body = resp.text().await?;

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(env) if status.is_success() && env.success => env.result.ok_or(ProviderError::Api {
                status: status.as_u16(),
                operation,
                message: "response envelope missing result".into(),
            }),
            Ok(env) => Err(ProviderError::Api {
                status: status.as_u16(),
                operation,
                message: env
                    .errors
                    .into_iter()
                    .next()
                    .map(|e| e.message)
                    .unwrap_or(body),
            }),
            Err(_) => Err(ProviderError::Api {
                status: status.as_u16(),
                operation,
                message: body,
            }),
        }
    }

    /// Fire a best-effort delete: log and continue on any failure,
    /// treating 404 as already gone.
    async fn delete_best_effort(&self, url: String, api_token: &str, what: &'static str) {
        match self.http.delete(&url).bearer_auth(api_token).send().await {
            Ok(resp) if resp.status().is_success() || resp.status() == StatusCode::NOT_FOUND => {}
            Ok(resp) => {
                warn!(status = %resp.status(), what, "delete sub-step failed, continuing")
            }
            Err(e) => warn!(error = %e, what, "delete sub-step failed, continuing"),
        }
    }
}

impl Default for CloudflareClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TunnelProvider for CloudflareClient {
    async fn create_tunnel(&self, org_slug: &str) -> Result<TunnelEndpoint, ProviderError> {
        let cfg = self.config()?;
        let hostname = format!("{org_slug}.{}", cfg.tunnel_domain);

        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);

        // 1. Named tunnel resource with a fresh secret.
        let resp = self
            .http
            .post(format!(
                "{}/accounts/{}/cfd_tunnel",
                self.base_url, cfg.account_id
            ))
            .bearer_auth(&cfg.api_token)
            .json(&json!({
                "name": hostname,
                "tunnel_secret": BASE64.encode(secret),
                "config_src": "cloudflare",
            }))
            .send()
            .await?;
        let tunnel: CreatedTunnel = Self::parse(resp, "create tunnel").await?;

        // 2. Ingress rules: /mcp to the engine, everything else to the
        // dashboard, with the mandatory catch-all fallback.
        let resp = self
            .http
            .put(format!(
                "{}/accounts/{}/cfd_tunnel/{}/configurations",
                self.base_url, cfg.account_id, tunnel.id
            ))
            .bearer_auth(&cfg.api_token)
            .json(&json!({
                "config": {
                    "ingress": [
                        { "hostname": hostname, "path": "^/mcp", "service": cfg.engine_service },
                        { "hostname": hostname, "service": cfg.dashboard_service },
                        { "service": "http_status:404" },
                    ]
                }
            }))
            .send()
            .await?;
        let _: serde_json::Value = Self::parse(resp, "configure ingress").await?;

        // 3. Proxied CNAME pointing the hostname at the tunnel.
        let resp = self
            .http
            .post(format!(
                "{}/zones/{}/dns_records",
                self.base_url, cfg.zone_id
            ))
            .bearer_auth(&cfg.api_token)
            .json(&json!({
                "type": "CNAME",
                "name": hostname,
                "content": format!("{}.cfargotunnel.com", tunnel.id),
                "proxied": true,
            }))
            .send()
            .await?;
        let record: CreatedRecord = Self::parse(resp, "create dns record").await?;

        info!(slug = org_slug, hostname, tunnel_id = %tunnel.id, "tunnel created");
        Ok(TunnelEndpoint {
            tunnel_id: tunnel.id,
            token: tunnel.token,
            hostname,
            dns_record_id: record.id,
        })
    }

    async fn delete_tunnel(
        &self,
        tunnel_id: &str,
        dns_record_id: &str,
    ) -> Result<(), ProviderError> {
        let cfg = self.config()?;

        // DNS record first, so the hostname stops resolving before the
        // tunnel itself is torn down.
        self.delete_best_effort(
            format!(
                "{}/zones/{}/dns_records/{}",
                self.base_url, cfg.zone_id, dns_record_id
            ),
            &cfg.api_token,
            "dns record",
        )
        .await;

        // Force-close any live agent connections.
        self.delete_best_effort(
            format!(
                "{}/accounts/{}/cfd_tunnel/{}/connections",
                self.base_url, cfg.account_id, tunnel_id
            ),
            &cfg.api_token,
            "tunnel connections",
        )
        .await;

        // The tunnel resource itself. Only this final step raises; an
        // already-deleted tunnel counts as success.
        let resp = self
            .http
            .delete(format!(
                "{}/accounts/{}/cfd_tunnel/{}",
                self.base_url, cfg.account_id, tunnel_id
            ))
            .bearer_auth(&cfg.api_token)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            info!(tunnel_id, "tunnel deleted");
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|env| env.errors.into_iter().next().map(|e| e.message))
            .unwrap_or(body);
        Err(ProviderError::Api {
            status: status.as_u16(),
            operation: "delete tunnel",
            message,
        })
    }

    async fn rotate_tunnel(
        &self,
        org_slug: &str,
        old_tunnel_id: &str,
        old_dns_record_id: &str,
    ) -> Result<TunnelEndpoint, ProviderError> {
        // Delete-then-create: the provider has no atomic regenerate, so
        // there is a window with no tunnel at all.
        self.delete_tunnel(old_tunnel_id, old_dns_record_id).await?;
        self.create_tunnel(org_slug).await
    }

    async fn tunnel_status(&self, tunnel_id: &str) -> Result<TunnelStatus, ProviderError> {
        let cfg = self.config()?;
        let resp = self
            .http
            .get(format!(
                "{}/accounts/{}/cfd_tunnel/{}/connections",
                self.base_url, cfg.account_id, tunnel_id
            ))
            .bearer_auth(&cfg.api_token)
            .send()
            .await?;
        let connections: Vec<TunnelConnection> = Self::parse(resp, "tunnel status").await?;
        Ok(TunnelStatus { connections })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[allow(dead_code)]
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CreatedTunnel {
    id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: String,
}
