//! Walks the node tree against a data value.

use crate::error::ExecError;
use crate::funcs;
use crate::parse::{Arg, Branch, Command, Node, Pipeline};
use crate::value::{truthy, type_name, write_value};
use serde_json::Value;

/// Execute `nodes` with `data` as both `.` and `$`.
pub(crate) fn execute(name: &str, nodes: &[Node], data: &Value) -> Result<String, ExecError> {
    let mut state = State {
        name,
        out: String::new(),
        vars: vec![("$".to_string(), data.clone())],
        line: 1,
    };
    state.walk(data, nodes)?;
    Ok(state.out)
}

struct State<'a> {
    name: &'a str,
    out: String,
    /// Variable stack, innermost last.
    vars: Vec<(String, Value)>,
    line: usize,
}

impl<'a> State<'a> {
    fn error(&self, message: impl Into<String>) -> ExecError {
        ExecError::new(self.name, self.line, message)
    }

    fn walk(&mut self, dot: &Value, nodes: &[Node]) -> Result<(), ExecError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Action(pipe) => {
                    let value = self.eval_pipeline(dot, pipe)?;
                    if pipe.decl.is_empty() {
                        write_value(&mut self.out, &value);
                    } else {
                        self.bind(pipe, value)?;
                    }
                }
                Node::If(branch) => self.walk_if(dot, branch)?,
                Node::With(branch) => self.walk_with(dot, branch)?,
                Node::Range(branch) => self.walk_range(dot, branch)?,
            }
        }
        Ok(())
    }

    fn walk_if(&mut self, dot: &Value, branch: &Branch) -> Result<(), ExecError> {
        let scope = self.vars.len();
        let value = self.eval_pipeline(dot, &branch.pipe)?;
        let taken = truthy(&value);
        self.bind(&branch.pipe, value)?;
        if taken {
            self.walk(dot, &branch.body)?;
        } else {
            self.walk(dot, &branch.otherwise)?;
        }
        self.vars.truncate(scope);
        Ok(())
    }

    fn walk_with(&mut self, dot: &Value, branch: &Branch) -> Result<(), ExecError> {
        let scope = self.vars.len();
        let value = self.eval_pipeline(dot, &branch.pipe)?;
        self.bind(&branch.pipe, value.clone())?;
        if truthy(&value) {
            self.walk(&value, &branch.body)?;
        } else {
            self.walk(dot, &branch.otherwise)?;
        }
        self.vars.truncate(scope);
        Ok(())
    }

    fn walk_range(&mut self, dot: &Value, branch: &Branch) -> Result<(), ExecError> {
        let value = self.eval_pipeline(dot, &branch.pipe)?;
        let entries: Vec<(Value, Value)> = match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Value::from(i), item))
                .collect(),
            Value::Object(map) => map
                .into_iter()
                .map(|(key, item)| (Value::String(key), item))
                .collect(),
            other => {
                return Err(self.error(format!(
                    "range can't iterate over {}",
                    type_name(&other)
                )))
            }
        };

        if entries.is_empty() {
            let scope = self.vars.len();
            self.walk(dot, &branch.otherwise)?;
            self.vars.truncate(scope);
            return Ok(());
        }

        for (key, item) in entries {
            let scope = self.vars.len();
            match branch.pipe.decl.as_slice() {
                [] => {}
                [elem] => self.declare(elem, item.clone()),
                [index, elem, ..] => {
                    self.declare(index, key);
                    self.declare(elem, item.clone());
                }
            }
            self.walk(&item, &branch.body)?;
            self.vars.truncate(scope);
        }
        Ok(())
    }

    /// Bind a non-range pipeline's declaration to its value.
    fn bind(&mut self, pipe: &Pipeline, value: Value) -> Result<(), ExecError> {
        let Some(name) = pipe.decl.first() else {
            return Ok(());
        };
        if !pipe.is_assign {
            self.declare(name, value);
            return Ok(());
        }
        if let Some((_, slot)) = self.vars.iter_mut().rev().find(|(var, _)| var == name) {
            *slot = value;
            return Ok(());
        }
        Err(self.error(format!("undefined variable: {}", name)))
    }

    fn declare(&mut self, name: &str, value: Value) {
        self.vars.push((name.to_string(), value));
    }

    fn lookup(&self, name: &str) -> Result<&Value, ExecError> {
        self.vars
            .iter()
            .rev()
            .find(|(var, _)| var == name)
            .map(|(_, value)| value)
            .ok_or_else(|| self.error(format!("undefined variable: {}", name)))
    }

    fn eval_pipeline(&mut self, dot: &Value, pipe: &Pipeline) -> Result<Value, ExecError> {
        self.line = pipe.line;
        let mut piped: Option<Value> = None;
        for cmd in &pipe.cmds {
            piped = Some(self.eval_command(dot, cmd, piped.take())?);
        }
        Ok(piped.unwrap_or(Value::Null))
    }

    fn eval_command(
        &mut self,
        dot: &Value,
        cmd: &Command,
        piped: Option<Value>,
    ) -> Result<Value, ExecError> {
        let Some((first, rest)) = cmd.args.split_first() else {
            return Err(self.error("empty command"));
        };
        match first {
            Arg::Function(name) if name == "and" || name == "or" => {
                self.short_circuit(dot, name, rest, piped)
            }
            Arg::Function(name) => {
                let mut args = Vec::with_capacity(rest.len() + 1);
                for arg in rest {
                    args.push(self.eval_arg(dot, arg)?);
                }
                args.extend(piped);
                funcs::call(name, args).map_err(|message| self.call_error(name, message))
            }
            _ if piped.is_some() => Err(self.error("can't give argument to non-function")),
            arg => self.eval_arg(dot, arg),
        }
    }

    /// `and` / `or`: arguments are evaluated left to right and evaluation
    /// stops at the first one that decides the result. A piped value is the
    /// final argument.
    fn short_circuit(
        &mut self,
        dot: &Value,
        name: &str,
        args: &[Arg],
        piped: Option<Value>,
    ) -> Result<Value, ExecError> {
        if args.is_empty() && piped.is_none() {
            return Err(self.call_error(
                name,
                format!("wrong number of args for {}: want at least 1 got 0", name),
            ));
        }
        let decided_by = name == "or";
        let mut last = Value::Null;
        for arg in args {
            last = self.eval_arg(dot, arg)?;
            if truthy(&last) == decided_by {
                return Ok(last);
            }
        }
        Ok(piped.unwrap_or(last))
    }

    fn call_error(&self, name: &str, message: impl std::fmt::Display) -> ExecError {
        self.error(format!("error calling {}: {}", name, message))
    }

    fn eval_arg(&mut self, dot: &Value, arg: &Arg) -> Result<Value, ExecError> {
        match arg {
            Arg::Dot => Ok(dot.clone()),
            Arg::Field(chain) => self.fields(dot, chain),
            Arg::Variable { name, fields } => {
                let value = self.lookup(name)?;
                self.fields(value, fields)
            }
            Arg::Function(name) => {
                funcs::call(name, Vec::new()).map_err(|message| self.call_error(name, message))
            }
            Arg::Str(s) => Ok(Value::String(s.clone())),
            Arg::Int(n) => Ok(Value::from(*n)),
            Arg::Bool(b) => Ok(Value::Bool(*b)),
            Arg::Nil => Ok(Value::Null),
            Arg::Pipe(pipe) => {
                let line = self.line;
                let value = self.eval_pipeline(dot, pipe);
                self.line = line;
                value
            }
        }
    }

    /// Resolve a field chain; a record missing the field is an error.
    fn fields(&self, value: &Value, chain: &[String]) -> Result<Value, ExecError> {
        let mut current = value;
        for field in chain {
            current = match current {
                Value::Object(map) => map.get(field).ok_or_else(|| {
                    self.error(format!("can't evaluate field {} in type record", field))
                })?,
                Value::Null => {
                    return Err(self.error(format!("nil pointer evaluating nil.{}", field)))
                }
                other => {
                    return Err(self.error(format!(
                        "can't evaluate field {} in type {}",
                        field,
                        type_name(other)
                    )))
                }
            };
        }
        Ok(current.clone())
    }
}
