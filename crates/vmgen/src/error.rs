use std::io;
use std::path::PathBuf;
use thiserror::Error;
use vmgen_template::{ExecError, ParseError};

/// Errors returned while rendering or writing an artifact.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Template asset not found: {path}")]
    AssetMissing { path: String },

    #[error("Invalid template: {0}")]
    TemplateSyntax(#[from] ParseError),

    #[error("Template execution failed: {0}")]
    TemplateExecution(#[from] ExecError),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GenerateError>;
