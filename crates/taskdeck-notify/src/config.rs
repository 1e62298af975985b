use serde::{Deserialize, Serialize};

/// Configuration for the notification subsystem.
///
/// All constants here are tunables, not invariants: the retention bound and
/// concurrency cap in particular are deployment decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Global switch. When false, `dispatch` returns a success-shaped empty
    /// result without touching the network.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Base URL of the primary delivery agent, e.g. `http://127.0.0.1:7100`.
    pub agent_base_url: String,
    /// Optional dedicated "from" identity handed to the agent with each send.
    #[serde(default)]
    pub sender_address: Option<String>,
    /// Routing prefix prepended to bare 10-digit local subscriber numbers.
    #[serde(default = "default_route_prefix")]
    pub default_route_prefix: String,
    /// Directory fallback artifacts are written into.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
    /// Public path prefix the UI serves artifacts from.
    #[serde(default = "default_artifact_public_prefix")]
    pub artifact_public_prefix: String,
    /// Maximum artifacts retained in the in-process log.
    #[serde(default = "default_artifact_retention")]
    pub artifact_retention: usize,
    /// Maximum concurrent in-flight recipient operations per batch.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
    /// Artifact rendering/persistence gets a slightly longer allowance than
    /// the network paths.
    #[serde(default = "default_artifact_timeout_secs")]
    pub artifact_timeout_secs: u64,
    /// Overall deadline for one dispatch batch.
    #[serde(default = "default_dispatch_deadline_secs")]
    pub dispatch_deadline_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_route_prefix() -> String {
    "91".to_string()
}

fn default_artifact_dir() -> String {
    "public/qr".to_string()
}

fn default_artifact_public_prefix() -> String {
    "/static/qr".to_string()
}

fn default_artifact_retention() -> usize {
    200
}

fn default_max_concurrency() -> usize {
    5
}

fn default_health_timeout_secs() -> u64 {
    3
}

fn default_send_timeout_secs() -> u64 {
    5
}

fn default_artifact_timeout_secs() -> u64 {
    8
}

fn default_dispatch_deadline_secs() -> u64 {
    30
}

impl NotifyConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Builds a config from `TASKDECK_NOTIFY_*` environment variables,
    /// falling back to the serde defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Fails when `TASKDECK_NOTIFY_AGENT_URL` is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::with_agent_url(
            &std::env::var("TASKDECK_NOTIFY_AGENT_URL")
                .map_err(|_| anyhow::anyhow!("TASKDECK_NOTIFY_AGENT_URL is not set"))?,
        );

        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_ENABLED") {
            config.enabled = v.parse()?;
        }
        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_SENDER") {
            config.sender_address = Some(v);
        }
        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_ROUTE_PREFIX") {
            config.default_route_prefix = v;
        }
        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_ARTIFACT_DIR") {
            config.artifact_dir = v;
        }
        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_ARTIFACT_PREFIX") {
            config.artifact_public_prefix = v;
        }
        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_ARTIFACT_RETENTION") {
            config.artifact_retention = v.parse()?;
        }
        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_MAX_CONCURRENCY") {
            config.max_concurrency = v.parse()?;
        }
        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_HEALTH_TIMEOUT_SECS") {
            config.health_timeout_secs = v.parse()?;
        }
        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_SEND_TIMEOUT_SECS") {
            config.send_timeout_secs = v.parse()?;
        }
        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_ARTIFACT_TIMEOUT_SECS") {
            config.artifact_timeout_secs = v.parse()?;
        }
        if let Ok(v) = std::env::var("TASKDECK_NOTIFY_DEADLINE_SECS") {
            config.dispatch_deadline_secs = v.parse()?;
        }

        Ok(config)
    }

    /// Defaults with the given agent URL. Handy in tests and callers that
    /// configure programmatically.
    pub fn with_agent_url(agent_base_url: &str) -> Self {
        Self {
            enabled: default_enabled(),
            agent_base_url: agent_base_url.to_string(),
            sender_address: None,
            default_route_prefix: default_route_prefix(),
            artifact_dir: default_artifact_dir(),
            artifact_public_prefix: default_artifact_public_prefix(),
            artifact_retention: default_artifact_retention(),
            max_concurrency: default_max_concurrency(),
            health_timeout_secs: default_health_timeout_secs(),
            send_timeout_secs: default_send_timeout_secs(),
            artifact_timeout_secs: default_artifact_timeout_secs(),
            dispatch_deadline_secs: default_dispatch_deadline_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: NotifyConfig =
            toml::from_str(r#"agent_base_url = "http://localhost:7100""#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.default_route_prefix, "91");
        assert_eq!(config.artifact_retention, 200);
        assert_eq!(config.max_concurrency, 5);
        assert!(config.sender_address.is_none());
    }

    #[test]
    fn from_env_covers_every_tunable() {
        std::env::set_var("TASKDECK_NOTIFY_AGENT_URL", "http://agent:7100");
        std::env::set_var("TASKDECK_NOTIFY_HEALTH_TIMEOUT_SECS", "7");
        std::env::set_var("TASKDECK_NOTIFY_SEND_TIMEOUT_SECS", "9");
        std::env::set_var("TASKDECK_NOTIFY_ARTIFACT_TIMEOUT_SECS", "11");
        std::env::set_var("TASKDECK_NOTIFY_DEADLINE_SECS", "13");

        let config = NotifyConfig::from_env().unwrap();
        assert_eq!(config.agent_base_url, "http://agent:7100");
        assert_eq!(config.health_timeout_secs, 7);
        assert_eq!(config.send_timeout_secs, 9);
        assert_eq!(config.artifact_timeout_secs, 11);
        assert_eq!(config.dispatch_deadline_secs, 13);
        // Untouched variables keep their defaults.
        assert!(config.enabled);
        assert_eq!(config.max_concurrency, 5);

        for var in [
            "TASKDECK_NOTIFY_AGENT_URL",
            "TASKDECK_NOTIFY_HEALTH_TIMEOUT_SECS",
            "TASKDECK_NOTIFY_SEND_TIMEOUT_SECS",
            "TASKDECK_NOTIFY_ARTIFACT_TIMEOUT_SECS",
            "TASKDECK_NOTIFY_DEADLINE_SECS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let config: NotifyConfig = toml::from_str(
            r#"
            agent_base_url = "http://agent:7100"
            enabled = false
            sender_address = "918800000000"
            artifact_retention = 50
            "#,
        )
        .unwrap();
        assert!(!config.enabled);
        assert_eq!(config.sender_address.as_deref(), Some("918800000000"));
        assert_eq!(config.artifact_retention, 50);
    }
}
