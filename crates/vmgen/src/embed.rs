//! Template assets.
//!
//! Asset paths are virtual and forward-slash separated. A leading `/` is
//! ignored, so `/templates/x` and `templates/x` name the same asset.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::defaults::{CONFIG_TEMPLATE_PATH, SCRIPT_TEMPLATE_PATH};

const VICTORIA_METRICS_CONFIG: &str = include_str!("../templates/config/VictoriaMetrics.yml.tpl");
const RUN_SCRIPT: &str = include_str!("../templates/scripts/run_prometheus.sh.tpl");

const EMBEDDED: &[(&str, &str)] = &[
    (CONFIG_TEMPLATE_PATH, VICTORIA_METRICS_CONFIG),
    (SCRIPT_TEMPLATE_PATH, RUN_SCRIPT),
];

/// Read-only source of template bytes.
pub trait AssetReader {
    /// Bytes of the asset at `path`, or `None` when it does not exist.
    fn read(&self, path: &str) -> Option<Cow<'_, [u8]>>;
}

impl<A: AssetReader + ?Sized> AssetReader for &A {
    fn read(&self, path: &str) -> Option<Cow<'_, [u8]>> {
        (**self).read(path)
    }
}

/// Strip the leading `/` of an absolute-looking asset path.
pub fn normalize_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Templates compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedAssets;

impl AssetReader for EmbeddedAssets {
    fn read(&self, path: &str) -> Option<Cow<'_, [u8]>> {
        let path = normalize_path(path);
        EMBEDDED
            .iter()
            .find(|(embedded, _)| *embedded == path)
            .map(|(_, contents)| Cow::Borrowed(contents.as_bytes()))
    }
}

/// In-memory assets, for template overrides and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: &str, contents: impl Into<Vec<u8>>) {
        self.files
            .insert(normalize_path(path).to_string(), contents.into());
    }
}

impl AssetReader for MemoryAssets {
    fn read(&self, path: &str) -> Option<Cow<'_, [u8]>> {
        self.files
            .get(normalize_path(path))
            .map(|contents| Cow::Borrowed(contents.as_slice()))
    }
}
