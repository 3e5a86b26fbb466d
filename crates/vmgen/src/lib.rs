//! Monitoring artifacts for a database cluster's VictoriaMetrics collector.
//!
//! Two builders produce the files a deployment needs:
//!
//! - [`VictoriaMetricsConfig`]: the YAML scrape configuration listing every
//!   component endpoint to scrape.
//! - [`VictoriaMetricsScript`]: the shell script launching the collector.
//!
//! Both render an embedded Go-style template (see [`vmgen_template`])
//! through [`TemplateArtifact`] and can write the result with
//! [`TemplateArtifact::render_to`]. Template and filesystem access go through
//! the [`AssetReader`] and [`FileSink`] traits so callers can substitute
//! their own.
//!
//! # Modules
//!
//! - [`scrape_config`]: scrape target accumulation
//! - [`launch_script`]: launcher parameters and retention normalization
//! - [`artifact`]: render / write surface
//! - [`embed`]: template assets
//! - [`sink`]: output destinations
//! - [`defaults`]: canonical defaults

pub mod artifact;
pub mod defaults;
pub mod embed;
pub mod error;
pub mod launch_script;
pub mod scrape_config;
pub mod sink;

pub use artifact::TemplateArtifact;
pub use embed::{AssetReader, EmbeddedAssets, MemoryAssets};
pub use error::{GenerateError, Result};
pub use launch_script::{normalize_retention, VictoriaMetricsScript};
pub use scrape_config::{ScrapeTarget, VictoriaMetricsConfig};
pub use sink::{FileSink, FsSink};
