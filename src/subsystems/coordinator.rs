//! Consul coordination client.
//!
//! Registers this instance with the local Consul agent on start and
//! deregisters it on shutdown.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Settings;
use crate::lifecycle::{BoxError, Subsystem};
use crate::resilience::RetryPolicy;

/// Service name under which every instance registers.
pub const SERVICE_NAME: &str = "service-host";

const AGENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of `PUT /v1/agent/service/register`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Registration {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub meta: BTreeMap<String, String>,
    pub check: HealthCheck,
}

/// HTTP check run by the agent against the health endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheck {
    #[serde(rename = "HTTP")]
    pub http: String,
    pub interval: String,
    pub timeout: String,
    pub deregister_critical_service_after: String,
}

impl Registration {
    pub fn from_settings(settings: &Settings) -> Self {
        let meta = BTreeMap::from([
            ("instance_id".to_string(), settings.instance_id.clone()),
            (
                "external_host_address".to_string(),
                settings.external_host_address.clone(),
            ),
            ("rest_port".to_string(), settings.rest_port.to_string()),
        ]);

        Self {
            id: format!("{SERVICE_NAME}-{}", settings.instance_id),
            name: SERVICE_NAME.to_string(),
            address: settings.internal_host_address.clone(),
            port: settings.grpc_port,
            meta,
            check: HealthCheck {
                http: format!(
                    "http://{}:{}/health",
                    settings.internal_host_address, settings.rest_port
                ),
                interval: "10s".to_string(),
                timeout: "2s".to_string(),
                deregister_critical_service_after: "1m".to_string(),
            },
        }
    }
}

/// Base URL of the agent for a `host:port` or URL setting.
pub fn agent_url(consul: &str) -> String {
    let consul = consul.trim_end_matches('/');
    if consul.starts_with("http://") || consul.starts_with("https://") {
        consul.to_string()
    } else {
        format!("http://{consul}")
    }
}

/// Keeps this instance registered with Consul while it runs.
pub struct ConsulRegistration {
    agent: String,
    registration: Registration,
    retry: RetryPolicy,
    client: Option<reqwest::Client>,
}

impl ConsulRegistration {
    pub fn new(settings: &Settings) -> Self {
        Self {
            agent: agent_url(&settings.consul),
            registration: Registration::from_settings(settings),
            retry: RetryPolicy::default(),
            client: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn is_registered(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl Subsystem for ConsulRegistration {
    fn name(&self) -> &str {
        "coordinator"
    }

    async fn start(&mut self) -> Result<(), BoxError> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(AGENT_REQUEST_TIMEOUT)
            .build()?;
        let url = format!("{}/v1/agent/service/register", self.agent);
        let registration = &self.registration;

        self.retry
            .run("consul register", |_| {
                let request = client.put(&url).json(registration);
                async move {
                    request.send().await?.error_for_status()?;
                    Ok::<(), reqwest::Error>(())
                }
            })
            .await?;

        tracing::info!(
            service_id = %self.registration.id,
            agent = %self.agent,
            "Registered with Consul"
        );
        self.client = Some(client);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), BoxError> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };

        let url = format!(
            "{}/v1/agent/service/deregister/{}",
            self.agent, self.registration.id
        );
        client.put(&url).send().await?.error_for_status()?;

        tracing::info!(service_id = %self.registration.id, "Deregistered from Consul");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_url() {
        assert_eq!(agent_url("localhost:8500"), "http://localhost:8500");
        assert_eq!(agent_url("http://consul:8500/"), "http://consul:8500");
        assert_eq!(agent_url("https://consul.internal"), "https://consul.internal");
    }

    #[test]
    fn test_registration_body() {
        let mut settings = Settings::local("node-3");
        settings.internal_host_address = "10.0.0.5".to_string();
        let body = serde_json::to_value(Registration::from_settings(&settings)).unwrap();

        assert_eq!(body["ID"], "service-host-node-3");
        assert_eq!(body["Name"], "service-host");
        assert_eq!(body["Address"], "10.0.0.5");
        assert_eq!(body["Port"], 50055);
        assert_eq!(body["Meta"]["instance_id"], "node-3");
        assert_eq!(body["Check"]["HTTP"], "http://10.0.0.5:8880/health");
        assert_eq!(body["Check"]["DeregisterCriticalServiceAfter"], "1m");
    }

    #[tokio::test]
    async fn test_unreachable_agent_fails_start() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut settings = Settings::local("1");
        settings.consul = format!("127.0.0.1:{port}");
        let mut coordinator = ConsulRegistration::new(&settings).with_retry(RetryPolicy {
            attempts: 2,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
        });

        assert!(coordinator.start().await.is_err());
        assert!(!coordinator.is_registered());
        coordinator.shutdown().await.unwrap();
    }
}
