//! Render and write surface shared by every generated artifact.

use serde::{Serialize, Serializer};
use std::path::Path;
use tracing::{debug, info};
use vmgen_template::{ParseError, Template};

use crate::defaults::{OUTPUT_FILE_MODE, TEMPLATE_NAME};
use crate::embed::{AssetReader, EmbeddedAssets};
use crate::error::{GenerateError, Result};
use crate::sink::{FileSink, FsSink};

/// Serialize an unset optional string as `""`.
pub(crate) fn unset_as_empty<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

/// Decode a template asset. Invalid UTF-8 is a syntax error naming the asset.
fn decode_template<'a>(path: &str, source: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(source).map_err(|err| {
        let valid = &source[..err.valid_up_to()];
        let line = 1 + valid.iter().filter(|b| **b == b'\n').count();
        GenerateError::TemplateSyntax(ParseError {
            name: path.to_string(),
            line,
            message: format!("invalid UTF-8 at byte {}", err.valid_up_to()),
        })
    })
}

/// A parameter record rendered through a template asset.
///
/// Implementors only name their template; the record's serialized fields
/// are what the template sees.
pub trait TemplateArtifact: Serialize {
    /// Asset path of the template to render.
    fn template_path(&self) -> &str;

    /// Render with the embedded templates.
    fn render(&self) -> Result<Vec<u8>> {
        self.render_from(&EmbeddedAssets)
    }

    /// Render with templates read from `assets`.
    fn render_from<A: AssetReader + ?Sized>(&self, assets: &A) -> Result<Vec<u8>> {
        let path = self.template_path();
        let source = assets
            .read(path)
            .ok_or_else(|| GenerateError::AssetMissing {
                path: path.to_string(),
            })?;
        debug!(template = path, bytes = source.len(), "Loaded template");
        let source = decode_template(path, &source)?;
        self.render_with_template(source)
    }

    /// Render against an explicit template source.
    fn render_with_template(&self, source: &str) -> Result<Vec<u8>> {
        let template = Template::parse(TEMPLATE_NAME, source)?;
        let rendered = template.execute(self)?;
        debug!(bytes = rendered.len(), "Rendered template");
        Ok(rendered)
    }

    /// Render with the embedded templates and write to `path` on disk.
    fn render_to(&self, path: impl AsRef<Path>) -> Result<()> {
        self.render_to_sink(&EmbeddedAssets, &FsSink, path.as_ref())
    }

    /// Render from `assets` and hand the bytes to `sink`.
    ///
    /// Nothing reaches the sink when rendering fails.
    fn render_to_sink<A, S>(&self, assets: &A, sink: &S, path: &Path) -> Result<()>
    where
        A: AssetReader + ?Sized,
        S: FileSink + ?Sized,
    {
        let contents = self.render_from(assets)?;
        sink.write(path, &contents, OUTPUT_FILE_MODE)
            .map_err(|source| GenerateError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            path = %path.display(),
            bytes = contents.len(),
            mode = OUTPUT_FILE_MODE,
            "Wrote artifact"
        );
        Ok(())
    }
}
