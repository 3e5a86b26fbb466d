//! Go-style text templates rendered against serde data.
//!
//! Templates are plain text with `{{ }}` actions in the dialect of Go's
//! `text/template`, so template files written for Go tooling render here
//! unchanged. The supported subset:
//!
//! - `{{.}}`, `{{.Field.Sub}}`, `{{$}}`, `{{$var.Field}}`
//! - `{{if}}` / `{{else if}}` / `{{else}}` / `{{end}}`
//! - `{{range}}` over lists and maps, with `$v :=` or `$i, $v :=`
//! - `{{with}}`, variable declaration and assignment
//! - pipelines (`{{.List | len}}`) and parenthesized arguments
//! - builtins: `and or not len index eq ne lt le gt ge print`
//! - trim markers `{{- ` / ` -}}` and `{{/* comments */}}`
//!
//! Data is bound through `serde::Serialize`: a struct becomes a record whose
//! fields are addressed by their serialized names. Referencing a field the
//! record does not have is an execution error.
//!
//! ```
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct Data {
//!     port: u16,
//! }
//!
//! let out = vmgen_template::render("port", "P={{.Port}}", &Data { port: 9090 }).unwrap();
//! assert_eq!(out, b"P=9090");
//! ```

mod error;
mod exec;
mod funcs;
mod lex;
mod parse;
mod value;

pub use error::{ExecError, ParseError, TemplateError};

use serde::Serialize;
use tracing::trace;

/// A parsed template, reusable across executions.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    root: Vec<parse::Node>,
}

impl Template {
    /// Parse `source`. `name` is only used in error messages.
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, ParseError> {
        let name = name.into();
        let items = lex::lex(&name, source)?;
        let root = parse::parse(&name, items)?;
        trace!(template = %name, nodes = root.len(), "parsed template");
        Ok(Self { name, root })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute against `data`, returning the rendered bytes.
    pub fn execute<T: Serialize + ?Sized>(&self, data: &T) -> Result<Vec<u8>, ExecError> {
        self.execute_to_string(data).map(String::into_bytes)
    }

    pub fn execute_to_string<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, ExecError> {
        let value = serde_json::to_value(data).map_err(|e| {
            ExecError::new(&self.name, 1, format!("cannot bind template data: {}", e))
        })?;
        exec::execute(&self.name, &self.root, &value)
    }
}

/// Parse `source` and execute it once against `data`.
pub fn render<T: Serialize + ?Sized>(
    name: &str,
    source: &str,
    data: &T,
) -> Result<Vec<u8>, TemplateError> {
    let template = Template::parse(name, source)?;
    Ok(template.execute(data)?)
}
