//! Errors raised while parsing or executing a template.

use thiserror::Error;

/// A template source failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template: {name}:{line}: {message}")]
pub struct ParseError {
    /// Template name given to [`crate::Template::parse`].
    pub name: String,
    /// 1-based line of the offending action.
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(name: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            line,
            message: message.into(),
        }
    }
}

/// A parsed template failed while executing against its data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template: {name}:{line}: executing \"{name}\": {message}")]
pub struct ExecError {
    pub name: String,
    pub line: usize,
    pub message: String,
}

impl ExecError {
    pub(crate) fn new(name: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            line,
            message: message.into(),
        }
    }
}

/// Either half of a one-shot [`crate::render`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}
