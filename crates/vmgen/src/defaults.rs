//! Canonical default values for generated monitoring artifacts.

/// Listen port of the metrics collector when none is given.
pub const DEFAULT_PORT: u16 = 9090;
/// Retention window applied when the requested one is empty or malformed.
pub const DEFAULT_RETENTION: &str = "30d";

pub const CONFIG_TEMPLATE_PATH: &str = "templates/config/VictoriaMetrics.yml.tpl";
/// Launcher script template. The asset keeps its historical name.
pub const SCRIPT_TEMPLATE_PATH: &str = "templates/scripts/run_prometheus.sh.tpl";

/// Name reported in template errors.
pub const TEMPLATE_NAME: &str = "VictoriaMetrics";

/// Permission bits for written artifacts, config included.
pub const OUTPUT_FILE_MODE: u32 = 0o755;
