//! Launcher script for the VictoriaMetrics process.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

use crate::artifact::TemplateArtifact;
use crate::defaults::{DEFAULT_PORT, DEFAULT_RETENTION, SCRIPT_TEMPLATE_PATH};

// Whole days, no leading zero, ASCII digits only.
static RETENTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]*d$").expect("retention pattern is valid"));

/// Normalize a retention window: valid input is kept, anything else
/// (including empty) becomes [`DEFAULT_RETENTION`].
pub fn normalize_retention(retention: &str) -> String {
    if RETENTION_PATTERN.is_match(retention) {
        retention.to_string()
    } else {
        debug!(
            requested = retention,
            applied = DEFAULT_RETENTION,
            "Retention replaced by default"
        );
        DEFAULT_RETENTION.to_string()
    }
}

/// Parameters of the collector launch script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VictoriaMetricsScript {
    #[serde(rename = "IP")]
    ip: String,
    port: u16,
    deploy_dir: String,
    data_dir: String,
    log_dir: String,
    #[serde(serialize_with = "crate::artifact::unset_as_empty")]
    numa_node: Option<String>,
    retention: String,
    #[serde(skip)]
    template_file: Option<String>,
}

impl VictoriaMetricsScript {
    pub fn new(
        ip: impl Into<String>,
        deploy_dir: impl Into<String>,
        data_dir: impl Into<String>,
        log_dir: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            port: DEFAULT_PORT,
            deploy_dir: deploy_dir.into(),
            data_dir: data_dir.into(),
            log_dir: log_dir.into(),
            numa_node: None,
            retention: DEFAULT_RETENTION.to_string(),
            template_file: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// NUMA nodes passed to `numactl`, e.g. `"0"` or `"0,1"`.
    pub fn with_numa_node(mut self, numa_node: impl Into<String>) -> Self {
        self.numa_node = Some(numa_node.into());
        self
    }

    pub fn with_retention(mut self, retention: &str) -> Self {
        self.retention = normalize_retention(retention);
        self
    }

    /// Render from this asset path instead of the built-in launcher template.
    pub fn with_template_file(mut self, path: impl Into<String>) -> Self {
        self.template_file = Some(path.into());
        self
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn deploy_dir(&self) -> &str {
        &self.deploy_dir
    }

    pub fn data_dir(&self) -> &str {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &str {
        &self.log_dir
    }

    pub fn numa_node(&self) -> Option<&str> {
        self.numa_node.as_deref()
    }

    pub fn retention(&self) -> &str {
        &self.retention
    }

    pub fn template_file(&self) -> Option<&str> {
        self.template_file.as_deref()
    }
}

impl TemplateArtifact for VictoriaMetricsScript {
    fn template_path(&self) -> &str {
        self.template_file.as_deref().unwrap_or(SCRIPT_TEMPLATE_PATH)
    }
}
