//! Builds the node tree from lexed items.

use crate::error::ParseError;
use crate::funcs;
use crate::lex::{Item, Token};

/// A node of the parsed template.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    /// `{{pipeline}}`; prints unless the pipeline declares a variable.
    Action(Pipeline),
    If(Branch),
    Range(Branch),
    With(Branch),
}

/// Shared shape of `if`, `range` and `with`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branch {
    pub pipe: Pipeline,
    pub body: Vec<Node>,
    pub otherwise: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    pub line: usize,
    /// Declared (or reassigned) variables, `$`-prefixed.
    pub decl: Vec<String>,
    /// `=` instead of `:=`.
    pub is_assign: bool,
    pub cmds: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Command {
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Arg {
    Dot,
    Field(Vec<String>),
    Variable { name: String, fields: Vec<String> },
    Function(String),
    Str(String),
    Int(i64),
    Bool(bool),
    Nil,
    Pipe(Box<Pipeline>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchKind {
    If,
    Range,
    With,
}

impl BranchKind {
    fn keyword(self) -> &'static str {
        match self {
            BranchKind::If => "if",
            BranchKind::Range => "range",
            BranchKind::With => "with",
        }
    }

    fn max_decl(self) -> usize {
        match self {
            BranchKind::Range => 2,
            BranchKind::If | BranchKind::With => 1,
        }
    }

    fn wrap(self, branch: Branch) -> Node {
        match self {
            BranchKind::If => Node::If(branch),
            BranchKind::Range => Node::Range(branch),
            BranchKind::With => Node::With(branch),
        }
    }
}

/// How a node list ended.
enum Close {
    End,
    Else { line: usize, rest: Vec<Token> },
    Eof,
}

/// Parse lexed items into a node list.
pub(crate) fn parse(name: &str, items: Vec<Item>) -> Result<Vec<Node>, ParseError> {
    let mut parser = Parser {
        name,
        items: items.into_iter(),
        vars: vec!["$".to_string()],
        line: 1,
    };
    let (nodes, close) = parser.parse_list()?;
    match close {
        Close::Eof => Ok(nodes),
        Close::End => Err(parser.error(parser.line, "unexpected {{end}}")),
        Close::Else { line, .. } => Err(parser.error(line, "unexpected {{else}}")),
    }
}

struct Parser<'a> {
    name: &'a str,
    items: std::vec::IntoIter<Item>,
    /// Variables in scope, innermost last.
    vars: Vec<String>,
    line: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, line: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(self.name, line, message)
    }

    fn parse_list(&mut self) -> Result<(Vec<Node>, Close), ParseError> {
        let mut nodes = Vec::new();
        while let Some(item) = self.items.next() {
            let (line, tokens) = match item {
                Item::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Item::Action { line, tokens } => (line, tokens),
            };
            self.line = line;

            let keyword = match tokens.first() {
                Some(Token::Ident(word)) => word.as_str(),
                _ => "",
            };
            match keyword {
                "end" => {
                    if tokens.len() > 1 {
                        return Err(self.error(line, format!("unexpected {} in end", tokens[1])));
                    }
                    return Ok((nodes, Close::End));
                }
                "else" => {
                    return Ok((
                        nodes,
                        Close::Else {
                            line,
                            rest: tokens[1..].to_vec(),
                        },
                    ));
                }
                "if" => nodes.push(self.parse_branch(BranchKind::If, line, &tokens[1..])?),
                "range" => nodes.push(self.parse_branch(BranchKind::Range, line, &tokens[1..])?),
                "with" => nodes.push(self.parse_branch(BranchKind::With, line, &tokens[1..])?),
                "define" | "template" | "block" | "break" | "continue" => {
                    return Err(self.error(line, format!("unsupported action {:?}", keyword)));
                }
                _ => {
                    let pipe = self.parse_pipeline(line, &tokens, 1, "command")?;
                    self.vars.extend(pipe.decl.iter().filter(|_| !pipe.is_assign).cloned());
                    nodes.push(Node::Action(pipe));
                }
            }
        }
        Ok((nodes, Close::Eof))
    }

    fn parse_branch(
        &mut self,
        kind: BranchKind,
        line: usize,
        tokens: &[Token],
    ) -> Result<Node, ParseError> {
        let scope = self.vars.len();
        let pipe = self.parse_pipeline(line, tokens, kind.max_decl(), kind.keyword())?;
        if !pipe.is_assign {
            self.vars.extend(pipe.decl.iter().cloned());
        }

        let (body, close) = self.parse_list()?;
        let otherwise = match close {
            Close::End => Vec::new(),
            Close::Eof => {
                return Err(self.error(line, format!("unexpected EOF in {}", kind.keyword())))
            }
            Close::Else {
                line: else_line,
                rest,
            } => {
                // Variables declared in the body are not visible in the else arm.
                self.vars.truncate(scope);
                if !pipe.is_assign {
                    self.vars.extend(pipe.decl.iter().cloned());
                }
                if rest.is_empty() {
                    let (otherwise, close) = self.parse_list()?;
                    match close {
                        Close::End => otherwise,
                        Close::Eof => {
                            return Err(
                                self.error(line, format!("unexpected EOF in {}", kind.keyword()))
                            )
                        }
                        Close::Else { line, .. } => {
                            return Err(self.error(line, "expected end; found {{else}}"))
                        }
                    }
                } else if kind != BranchKind::Range
                    && rest.first() == Some(&Token::Ident(kind.keyword().to_string()))
                {
                    // `else if` / `else with` chains share the outer `end`.
                    vec![self.parse_branch(kind, else_line, &rest[1..])?]
                } else {
                    return Err(self.error(else_line, format!("unexpected {} in else", rest[0])));
                }
            }
        };
        self.vars.truncate(scope);

        Ok(kind.wrap(Branch {
            pipe,
            body,
            otherwise,
        }))
    }

    fn parse_pipeline(
        &self,
        line: usize,
        tokens: &[Token],
        max_decl: usize,
        context: &str,
    ) -> Result<Pipeline, ParseError> {
        let (decl, is_assign, rest) = self.parse_declaration(line, tokens, max_decl)?;
        if rest.is_empty() {
            return Err(self.error(line, format!("missing value for {}", context)));
        }

        let mut cmds = Vec::new();
        for (index, segment) in split_pipes(rest).into_iter().enumerate() {
            if segment.is_empty() {
                return Err(self.error(line, "missing command in pipeline"));
            }
            let cmd = self.parse_command(line, segment)?;
            if index > 0 && !matches!(cmd.args.first(), Some(Arg::Function(_))) {
                return Err(self.error(line, "non-function command in pipeline stage"));
            }
            cmds.push(cmd);
        }

        Ok(Pipeline {
            line,
            decl,
            is_assign,
            cmds,
        })
    }

    fn parse_declaration<'t>(
        &self,
        line: usize,
        tokens: &'t [Token],
        max_decl: usize,
    ) -> Result<(Vec<String>, bool, &'t [Token]), ParseError> {
        let (names, op, rest): (Vec<&str>, &Token, &[Token]) = match tokens {
            [Token::Variable { name, fields }, op @ (Token::Declare | Token::Assign), rest @ ..]
                if fields.is_empty() =>
            {
                (vec![name.as_str()], op, rest)
            }
            [Token::Variable { name: a, fields: fa }, Token::Comma, Token::Variable { name: b, fields: fb }, op @ (Token::Declare | Token::Assign), rest @ ..]
                if fa.is_empty() && fb.is_empty() =>
            {
                (vec![a.as_str(), b.as_str()], op, rest)
            }
            _ => return Ok((Vec::new(), false, tokens)),
        };

        if names.len() > max_decl {
            return Err(self.error(line, "too many declarations in command"));
        }
        let is_assign = *op == Token::Assign;
        for name in &names {
            if *name == "$" {
                return Err(self.error(line, "cannot declare $"));
            }
            if is_assign && !self.vars.iter().any(|v| v == name) {
                return Err(self.error(line, format!("undefined variable {:?}", name)));
            }
        }
        Ok((names.into_iter().map(str::to_string).collect(), is_assign, rest))
    }

    fn parse_command(&self, line: usize, tokens: &[Token]) -> Result<Command, ParseError> {
        let mut args = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let arg = match &tokens[i] {
                Token::Dot => Arg::Dot,
                Token::Field(chain) => Arg::Field(chain.clone()),
                Token::Variable { name, fields } => {
                    if !self.vars.iter().any(|v| v == name) {
                        return Err(self.error(line, format!("undefined variable {:?}", name)));
                    }
                    Arg::Variable {
                        name: name.clone(),
                        fields: fields.clone(),
                    }
                }
                Token::Ident(name) => {
                    if !funcs::is_builtin(name) {
                        return Err(self.error(line, format!("function {:?} not defined", name)));
                    }
                    Arg::Function(name.clone())
                }
                Token::Str(s) => Arg::Str(s.clone()),
                Token::Int(n) => Arg::Int(*n),
                Token::Bool(b) => Arg::Bool(*b),
                Token::Nil => Arg::Nil,
                Token::LeftParen => {
                    let close = matching_paren(&tokens[i..])
                        .ok_or_else(|| self.error(line, "unclosed left paren"))?;
                    let inner = &tokens[i + 1..i + close];
                    let pipe = self.parse_pipeline(line, inner, 0, "parenthesized pipeline")?;
                    i += close;
                    Arg::Pipe(Box::new(pipe))
                }
                other => {
                    return Err(self.error(line, format!("unexpected {} in operand", other)));
                }
            };
            args.push(arg);
            i += 1;
        }

        match args.first() {
            Some(Arg::Function(_)) => {}
            Some(Arg::Nil) => return Err(self.error(line, "nil is not a command")),
            Some(first) if args.len() > 1 => {
                return Err(self.error(
                    line,
                    format!("can't give argument to non-function {}", describe(first)),
                ));
            }
            _ => {}
        }
        Ok(Command { args })
    }
}

/// Split on top-level `|` tokens.
fn split_pipes(tokens: &[Token]) -> Vec<&[Token]> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LeftParen => depth += 1,
            Token::RightParen => depth = depth.saturating_sub(1),
            Token::Pipe if depth == 0 => {
                segments.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&tokens[start..]);
    segments
}

/// Offset of the `)` matching the `(` at `tokens[0]`.
fn matching_paren(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn describe(arg: &Arg) -> String {
    match arg {
        Arg::Dot => ".".to_string(),
        Arg::Field(chain) => format!(".{}", chain.join(".")),
        Arg::Variable { name, .. } => name.clone(),
        Arg::Function(name) => name.clone(),
        Arg::Str(s) => format!("{:?}", s),
        Arg::Int(n) => n.to_string(),
        Arg::Bool(b) => b.to_string(),
        Arg::Nil => "nil".to_string(),
        Arg::Pipe(_) => "(pipeline)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::lex;

    fn parse_src(source: &str) -> Result<Vec<Node>, ParseError> {
        parse("t", lex("t", source)?)
    }

    #[test]
    fn parses_if_else() {
        let nodes = parse_src("{{if .A}}yes{{else}}no{{end}}").unwrap();
        let [Node::If(branch)] = nodes.as_slice() else {
            panic!("expected a single if, got {:?}", nodes);
        };
        assert_eq!(branch.body, vec![Node::Text("yes".into())]);
        assert_eq!(branch.otherwise, vec![Node::Text("no".into())]);
    }

    #[test]
    fn else_if_nests_under_one_end() {
        let nodes = parse_src("{{if .A}}a{{else if .B}}b{{else}}c{{end}}tail").unwrap();
        assert_eq!(nodes.len(), 2);
        let Node::If(outer) = &nodes[0] else {
            panic!("expected if");
        };
        let [Node::If(inner)] = outer.otherwise.as_slice() else {
            panic!("expected nested if, got {:?}", outer.otherwise);
        };
        assert_eq!(inner.otherwise, vec![Node::Text("c".into())]);
        assert_eq!(nodes[1], Node::Text("tail".into()));
    }

    #[test]
    fn range_declares_two_variables() {
        let nodes = parse_src("{{range $i, $v := .L}}{{$i}}={{$v}}{{end}}").unwrap();
        let Node::Range(branch) = &nodes[0] else {
            panic!("expected range");
        };
        assert_eq!(branch.pipe.decl, vec!["$i".to_string(), "$v".to_string()]);
    }

    #[test]
    fn range_variables_go_out_of_scope() {
        let err = parse_src("{{range $v := .L}}{{end}}{{$v}}").unwrap_err();
        assert_eq!(err.message, "undefined variable \"$v\"");
    }

    #[test]
    fn pipelines_split_on_pipe() {
        let nodes = parse_src("{{.L | len}}").unwrap();
        let Node::Action(pipe) = &nodes[0] else {
            panic!("expected action");
        };
        assert_eq!(pipe.cmds.len(), 2);
    }

    #[test]
    fn rejects_unknown_functions() {
        let err = parse_src("line one\n{{frobnicate .A}}").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.message, "function \"frobnicate\" not defined");
    }

    #[test]
    fn rejects_stray_end_and_missing_end() {
        assert_eq!(parse_src("{{end}}").unwrap_err().message, "unexpected {{end}}");
        assert_eq!(
            parse_src("{{if .A}}open").unwrap_err().message,
            "unexpected EOF in if"
        );
    }

    #[test]
    fn rejects_arguments_to_fields() {
        let err = parse_src("{{.A .B}}").unwrap_err();
        assert_eq!(err.message, "can't give argument to non-function .A");
    }

    #[test]
    fn parenthesized_pipelines() {
        let nodes = parse_src("{{not (eq .A 1)}}").unwrap();
        let Node::Action(pipe) = &nodes[0] else {
            panic!("expected action");
        };
        assert!(matches!(pipe.cmds[0].args[1], Arg::Pipe(_)));
    }
}
