//! Scrape configuration for the cluster's VictoriaMetrics instance.
//!
//! [`VictoriaMetricsConfig`] collects the endpoints of every cluster
//! component the collector scrapes, then renders
//! `templates/config/VictoriaMetrics.yml.tpl` through [`TemplateArtifact`].
//!
//! ```
//! use vmgen::{TemplateArtifact, VictoriaMetricsConfig};
//!
//! let mut config = VictoriaMetricsConfig::new("prod", false);
//! config
//!     .add_pd("10.0.0.1", 2379)
//!     .add_tikv("10.0.0.2", 20180)
//!     .add_monitored_server("10.0.0.2");
//! let yaml = String::from_utf8(config.render().unwrap()).unwrap();
//! assert!(yaml.contains("10.0.0.1:2379"));
//! ```

use serde::Serialize;

use crate::artifact::TemplateArtifact;
use crate::defaults::CONFIG_TEMPLATE_PATH;

/// Component classes whose endpoints are listed in the scrape config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrapeTarget {
    /// Message-bus nodes.
    Kafka,
    /// Host-metrics exporters.
    NodeExporter,
    /// Database frontend status endpoints.
    Tidb,
    /// Storage-node status endpoints.
    Tikv,
    /// Placement drivers.
    Pd,
    /// Columnar-replica status endpoints.
    Tiflash,
    /// Columnar-replica learner status endpoints.
    TiflashLearner,
    /// Binlog pumps.
    Pump,
    /// Binlog drainers.
    Drainer,
    /// Change-data-capture nodes.
    Cdc,
    /// Coordination service.
    Zookeeper,
    BlackboxExporter,
    /// Bulk loader.
    Lightning,
    Alertmanager,
    /// Data-migration masters.
    DmMaster,
    /// Data-migration workers.
    DmWorker,
}

impl ScrapeTarget {
    pub const ALL: [ScrapeTarget; 16] = [
        ScrapeTarget::Kafka,
        ScrapeTarget::NodeExporter,
        ScrapeTarget::Tidb,
        ScrapeTarget::Tikv,
        ScrapeTarget::Pd,
        ScrapeTarget::Tiflash,
        ScrapeTarget::TiflashLearner,
        ScrapeTarget::Pump,
        ScrapeTarget::Drainer,
        ScrapeTarget::Cdc,
        ScrapeTarget::Zookeeper,
        ScrapeTarget::BlackboxExporter,
        ScrapeTarget::Lightning,
        ScrapeTarget::Alertmanager,
        ScrapeTarget::DmMaster,
        ScrapeTarget::DmWorker,
    ];

    /// Name of the template field holding this class's addresses.
    pub fn field_name(self) -> &'static str {
        match self {
            ScrapeTarget::Kafka => "KafkaAddrs",
            ScrapeTarget::NodeExporter => "NodeExporterAddrs",
            ScrapeTarget::Tidb => "TiDBStatusAddrs",
            ScrapeTarget::Tikv => "TiKVStatusAddrs",
            ScrapeTarget::Pd => "PDAddrs",
            ScrapeTarget::Tiflash => "TiFlashStatusAddrs",
            ScrapeTarget::TiflashLearner => "TiFlashLearnerStatusAddrs",
            ScrapeTarget::Pump => "PumpAddrs",
            ScrapeTarget::Drainer => "DrainerAddrs",
            ScrapeTarget::Cdc => "CDCAddrs",
            ScrapeTarget::Zookeeper => "ZookeeperAddrs",
            ScrapeTarget::BlackboxExporter => "BlackboxExporterAddrs",
            ScrapeTarget::Lightning => "LightningAddrs",
            ScrapeTarget::Alertmanager => "AlertmanagerAddrs",
            ScrapeTarget::DmMaster => "DMMasterAddrs",
            ScrapeTarget::DmWorker => "DMWorkerAddrs",
        }
    }
}

/// `host:port`, host verbatim.
///
/// Ports are `u16`; anything above 65535 cannot be expressed.
pub fn address(host: &str, port: u16) -> String {
    format!("{}:{}", host, port)
}

/// Parameters of the VictoriaMetrics scrape configuration.
///
/// Serialized field names are the template's variable names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VictoriaMetricsConfig {
    cluster_name: String,
    #[serde(rename = "TLSEnabled")]
    tls_enabled: bool,
    kafka_addrs: Vec<String>,
    node_exporter_addrs: Vec<String>,
    #[serde(rename = "TiDBStatusAddrs")]
    tidb_status_addrs: Vec<String>,
    #[serde(rename = "TiKVStatusAddrs")]
    tikv_status_addrs: Vec<String>,
    #[serde(rename = "PDAddrs")]
    pd_addrs: Vec<String>,
    #[serde(rename = "TiFlashStatusAddrs")]
    tiflash_status_addrs: Vec<String>,
    #[serde(rename = "TiFlashLearnerStatusAddrs")]
    tiflash_learner_status_addrs: Vec<String>,
    pump_addrs: Vec<String>,
    drainer_addrs: Vec<String>,
    #[serde(rename = "CDCAddrs")]
    cdc_addrs: Vec<String>,
    zookeeper_addrs: Vec<String>,
    blackbox_exporter_addrs: Vec<String>,
    lightning_addrs: Vec<String>,
    monitored_servers: Vec<String>,
    alertmanager_addrs: Vec<String>,
    #[serde(serialize_with = "crate::artifact::unset_as_empty")]
    pushgateway_addr: Option<String>,
    #[serde(serialize_with = "crate::artifact::unset_as_empty")]
    blackbox_addr: Option<String>,
    #[serde(serialize_with = "crate::artifact::unset_as_empty")]
    kafka_exporter_addr: Option<String>,
    #[serde(serialize_with = "crate::artifact::unset_as_empty")]
    grafana_addr: Option<String>,
    #[serde(rename = "DMMasterAddrs")]
    dm_master_addrs: Vec<String>,
    #[serde(rename = "DMWorkerAddrs")]
    dm_worker_addrs: Vec<String>,
}

macro_rules! target_accumulators {
    ($($(#[$meta:meta])* $method:ident => $target:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $method(&mut self, host: &str, port: u16) -> &mut Self {
                self.add_target(ScrapeTarget::$target, host, port)
            }
        )*
    };
}

impl VictoriaMetricsConfig {
    /// TLS is fixed here; nothing toggles it afterwards.
    pub fn new(cluster_name: impl Into<String>, tls_enabled: bool) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            tls_enabled,
            kafka_addrs: Vec::new(),
            node_exporter_addrs: Vec::new(),
            tidb_status_addrs: Vec::new(),
            tikv_status_addrs: Vec::new(),
            pd_addrs: Vec::new(),
            tiflash_status_addrs: Vec::new(),
            tiflash_learner_status_addrs: Vec::new(),
            pump_addrs: Vec::new(),
            drainer_addrs: Vec::new(),
            cdc_addrs: Vec::new(),
            zookeeper_addrs: Vec::new(),
            blackbox_exporter_addrs: Vec::new(),
            lightning_addrs: Vec::new(),
            monitored_servers: Vec::new(),
            alertmanager_addrs: Vec::new(),
            pushgateway_addr: None,
            blackbox_addr: None,
            kafka_exporter_addr: None,
            grafana_addr: None,
            dm_master_addrs: Vec::new(),
            dm_worker_addrs: Vec::new(),
        }
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls_enabled
    }

    /// Append `host:port` to the list for `target`.
    pub fn add_target(&mut self, target: ScrapeTarget, host: &str, port: u16) -> &mut Self {
        self.list_mut(target).push(address(host, port));
        self
    }

    /// Addresses added for `target`, in insertion order.
    pub fn targets(&self, target: ScrapeTarget) -> &[String] {
        match target {
            ScrapeTarget::Kafka => &self.kafka_addrs,
            ScrapeTarget::NodeExporter => &self.node_exporter_addrs,
            ScrapeTarget::Tidb => &self.tidb_status_addrs,
            ScrapeTarget::Tikv => &self.tikv_status_addrs,
            ScrapeTarget::Pd => &self.pd_addrs,
            ScrapeTarget::Tiflash => &self.tiflash_status_addrs,
            ScrapeTarget::TiflashLearner => &self.tiflash_learner_status_addrs,
            ScrapeTarget::Pump => &self.pump_addrs,
            ScrapeTarget::Drainer => &self.drainer_addrs,
            ScrapeTarget::Cdc => &self.cdc_addrs,
            ScrapeTarget::Zookeeper => &self.zookeeper_addrs,
            ScrapeTarget::BlackboxExporter => &self.blackbox_exporter_addrs,
            ScrapeTarget::Lightning => &self.lightning_addrs,
            ScrapeTarget::Alertmanager => &self.alertmanager_addrs,
            ScrapeTarget::DmMaster => &self.dm_master_addrs,
            ScrapeTarget::DmWorker => &self.dm_worker_addrs,
        }
    }

    fn list_mut(&mut self, target: ScrapeTarget) -> &mut Vec<String> {
        match target {
            ScrapeTarget::Kafka => &mut self.kafka_addrs,
            ScrapeTarget::NodeExporter => &mut self.node_exporter_addrs,
            ScrapeTarget::Tidb => &mut self.tidb_status_addrs,
            ScrapeTarget::Tikv => &mut self.tikv_status_addrs,
            ScrapeTarget::Pd => &mut self.pd_addrs,
            ScrapeTarget::Tiflash => &mut self.tiflash_status_addrs,
            ScrapeTarget::TiflashLearner => &mut self.tiflash_learner_status_addrs,
            ScrapeTarget::Pump => &mut self.pump_addrs,
            ScrapeTarget::Drainer => &mut self.drainer_addrs,
            ScrapeTarget::Cdc => &mut self.cdc_addrs,
            ScrapeTarget::Zookeeper => &mut self.zookeeper_addrs,
            ScrapeTarget::BlackboxExporter => &mut self.blackbox_exporter_addrs,
            ScrapeTarget::Lightning => &mut self.lightning_addrs,
            ScrapeTarget::Alertmanager => &mut self.alertmanager_addrs,
            ScrapeTarget::DmMaster => &mut self.dm_master_addrs,
            ScrapeTarget::DmWorker => &mut self.dm_worker_addrs,
        }
    }

    target_accumulators! {
        add_kafka => Kafka;
        add_node_exporter => NodeExporter;
        /// Database frontend status port.
        add_tidb => Tidb;
        /// Storage node status port.
        add_tikv => Tikv;
        add_pd => Pd;
        add_tiflash => Tiflash;
        add_tiflash_learner => TiflashLearner;
        add_pump => Pump;
        add_drainer => Drainer;
        add_cdc => Cdc;
        add_zookeeper => Zookeeper;
        add_blackbox_exporter => BlackboxExporter;
        add_lightning => Lightning;
        add_alertmanager => Alertmanager;
        add_dm_master => DmMaster;
        add_dm_worker => DmWorker;
    }

    /// Append a bare host pinged through the blackbox exporter.
    pub fn add_monitored_server(&mut self, host: &str) -> &mut Self {
        self.monitored_servers.push(host.to_string());
        self
    }

    pub fn monitored_servers(&self) -> &[String] {
        &self.monitored_servers
    }

    /// Single-address slots: the last call wins.
    pub fn set_pushgateway(&mut self, host: &str, port: u16) -> &mut Self {
        self.pushgateway_addr = Some(address(host, port));
        self
    }

    pub fn set_blackbox(&mut self, host: &str, port: u16) -> &mut Self {
        self.blackbox_addr = Some(address(host, port));
        self
    }

    pub fn set_kafka_exporter(&mut self, host: &str, port: u16) -> &mut Self {
        self.kafka_exporter_addr = Some(address(host, port));
        self
    }

    /// Dashboard address.
    pub fn set_grafana(&mut self, host: &str, port: u16) -> &mut Self {
        self.grafana_addr = Some(address(host, port));
        self
    }

    pub fn pushgateway(&self) -> Option<&str> {
        self.pushgateway_addr.as_deref()
    }

    pub fn blackbox(&self) -> Option<&str> {
        self.blackbox_addr.as_deref()
    }

    pub fn kafka_exporter(&self) -> Option<&str> {
        self.kafka_exporter_addr.as_deref()
    }

    pub fn grafana(&self) -> Option<&str> {
        self.grafana_addr.as_deref()
    }
}

impl TemplateArtifact for VictoriaMetricsConfig {
    fn template_path(&self) -> &str {
        CONFIG_TEMPLATE_PATH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn accumulators_append_in_order() {
        let mut config = VictoriaMetricsConfig::new("c1", false);
        config.add_pd("10.0.0.1", 2379).add_pd("10.0.0.2", 2379);
        assert_eq!(config.targets(ScrapeTarget::Pd), ["10.0.0.1:2379", "10.0.0.2:2379"]);
        assert!(config.targets(ScrapeTarget::Tikv).is_empty());
    }

    #[test]
    fn named_accumulators_reach_their_class() {
        let mut config = VictoriaMetricsConfig::new("c1", false);
        config
            .add_kafka("h", 1)
            .add_node_exporter("h", 2)
            .add_tidb("h", 3)
            .add_tikv("h", 4)
            .add_pd("h", 5)
            .add_tiflash("h", 6)
            .add_tiflash_learner("h", 7)
            .add_pump("h", 8)
            .add_drainer("h", 9)
            .add_cdc("h", 10)
            .add_zookeeper("h", 11)
            .add_blackbox_exporter("h", 12)
            .add_lightning("h", 13)
            .add_alertmanager("h", 14)
            .add_dm_master("h", 15)
            .add_dm_worker("h", 16);

        for (i, target) in ScrapeTarget::ALL.iter().enumerate() {
            assert_eq!(config.targets(*target), [format!("h:{}", i + 1)], "{:?}", target);
        }
    }

    #[test]
    fn slots_keep_last_assignment() {
        let mut config = VictoriaMetricsConfig::new("c1", false);
        config.set_grafana("a", 3000).set_grafana("b", 3001);
        assert_eq!(config.grafana(), Some("b:3001"));
        assert_eq!(config.pushgateway(), None);
    }

    #[test]
    fn field_names_match_serialized_record() {
        let config = VictoriaMetricsConfig::new("c1", true);
        let value = serde_json::to_value(&config).unwrap();
        let Value::Object(record) = value else {
            panic!("config should serialize as a record");
        };
        for target in ScrapeTarget::ALL {
            assert!(record.contains_key(target.field_name()), "{}", target.field_name());
        }
        for field in [
            "ClusterName",
            "TLSEnabled",
            "MonitoredServers",
            "PushgatewayAddr",
            "BlackboxAddr",
            "KafkaExporterAddr",
            "GrafanaAddr",
        ] {
            assert!(record.contains_key(field), "{}", field);
        }
        assert_eq!(record.len(), ScrapeTarget::ALL.len() + 7);
    }

    #[test]
    fn hosts_pass_through_verbatim() {
        assert_eq!(address("[::1]", 9100), "[::1]:9100");
        assert_eq!(address("db-1.local", 0), "db-1.local:0");
    }
}
