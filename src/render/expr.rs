use std::fmt;

use thiserror::Error;

use crate::render::context::VariableBindings;
use crate::render::diagnostic::{Diagnostics, ErrorKind, Location, WarningKind};
use crate::render::filter::{Filter, FilterError};
use crate::render::scanner::{Delimiters, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<String>,
}

impl fmt::Display for FilterCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| {
                if a.contains('"') {
                    format!("'{a}'")
                } else {
                    format!("\"{a}\"")
                }
            })
            .collect();
        write!(f, "({})", args.join(", "))
    }
}

/// A parsed placeholder body: `name | filter | filter(arg, arg)`.
///
/// The method-call spelling `name.lower().replace('-', '_')` is accepted; each
/// call becomes a filter, in order, ahead of the piped ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub variable: String,
    pub filters: Vec<FilterCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid expression")]
pub struct ParseError;

impl Expression {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let segments = split_unquoted(text, '|').ok_or(ParseError)?;
        let (head, rest) = segments.split_first().ok_or(ParseError)?;
        let head = head.trim();

        // `a.b.lower().replace('x', 'y')`: dotted name, then method calls.
        let parts = split_unquoted(head, '.').ok_or(ParseError)?;
        let first_call = parts
            .iter()
            .position(|p| p.contains('('))
            .unwrap_or(parts.len());
        if first_call == 0 {
            return Err(ParseError);
        }

        let variable = parts[..first_call].join(".");
        let mut filters = Vec::new();
        for part in &parts[first_call..] {
            let part = part.trim();
            if !part.ends_with(')') {
                return Err(ParseError);
            }
            let call = parse_call(part)?;
            if !is_identifier(&call.name) {
                return Err(ParseError);
            }
            filters.push(call);
        }

        if !is_variable_name(&variable) {
            return Err(ParseError);
        }

        for segment in rest {
            let call = parse_call(segment.trim())?;
            if !is_identifier(&call.name) {
                return Err(ParseError);
            }
            filters.push(call);
        }

        Ok(Self { variable, filters })
    }

    /// The filter chain in canonical `a | b("x", "y")` form.
    pub fn filters_text(&self) -> String {
        self.filters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

fn parse_call(text: &str) -> Result<FilterCall, ParseError> {
    let Some(paren) = text.find('(') else {
        return Ok(FilterCall {
            name: text.to_string(),
            args: Vec::new(),
        });
    };
    if !text.ends_with(')') {
        return Err(ParseError);
    }
    let name = text[..paren].trim().to_string();
    let inner = &text[paren + 1..text.len() - 1];
    Ok(FilterCall {
        name,
        args: parse_args(inner)?,
    })
}

fn parse_args(inner: &str) -> Result<Vec<String>, ParseError> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_unquoted(inner, ',')
        .ok_or(ParseError)?
        .into_iter()
        .map(|arg| {
            let arg = arg.trim();
            let quote = arg.chars().next().ok_or(ParseError)?;
            if arg.len() >= 2 && (quote == '\'' || quote == '"') && arg.ends_with(quote) {
                Ok(arg[1..arg.len() - 1].to_string())
            } else {
                Err(ParseError)
            }
        })
        .collect()
}

/// Split on `sep` outside of single or double quotes. `None` on an
/// unbalanced quote.
fn split_unquoted(text: &str, sep: char) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut last = 0;

    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == sep => {
                parts.push(&text[last..i]);
                last = i + c.len_utf8();
            }
            None => {}
        }
    }

    if quote.is_some() {
        return None;
    }
    parts.push(&text[last..]);
    Some(parts)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

fn is_variable_name(s: &str) -> bool {
    s.split('.').all(is_identifier)
}

/// Resolves placeholders against one set of bindings.
pub struct Evaluator<'a> {
    bindings: &'a VariableBindings,
    delimiters: &'a Delimiters,
    namespace: Option<&'a str>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        bindings: &'a VariableBindings,
        delimiters: &'a Delimiters,
        namespace: Option<&'a str>,
    ) -> Self {
        Self {
            bindings,
            delimiters,
            namespace,
        }
    }

    /// Evaluate one placeholder body. Problems are recorded in `diags` and
    /// never abort: an undefined variable or bad expression yields `""`, a
    /// bad filter is skipped.
    pub fn evaluate(&self, text: &str, location: &Location, diags: &mut Diagnostics) -> String {
        let expr = match Expression::parse(text) {
            Ok(expr) => expr,
            Err(_) => {
                diags.error(
                    ErrorKind::InvalidExpression {
                        expr: text.trim().to_string(),
                    },
                    location.clone(),
                );
                return String::new();
            }
        };

        self.evaluate_expr(&expr, location, diags)
    }

    /// Evaluate an already parsed expression.
    pub fn evaluate_expr(
        &self,
        expr: &Expression,
        location: &Location,
        diags: &mut Diagnostics,
    ) -> String {
        let Some(value) = self.bindings.get(self.strip_namespace(&expr.variable)) else {
            diags.error(
                ErrorKind::UndefinedVariable {
                    name: expr.variable.clone(),
                },
                location.clone(),
            );
            return String::new();
        };

        let mut value = value.to_string();
        for call in &expr.filters {
            match Filter::from_call(&call.name, &call.args) {
                Ok(filter) => value = filter.apply(&value),
                Err(FilterError::Unknown(name)) => {
                    diags.error(ErrorKind::UnknownFilter { name }, location.clone());
                }
                Err(FilterError::Arguments { name, reason }) => {
                    diags.error(
                        ErrorKind::InvalidFilterArguments { name, reason },
                        location.clone(),
                    );
                }
            }
        }
        value
    }

    /// Replace every placeholder in `text`. `location` addresses the start of
    /// `text`; content offsets are reported relative to it.
    pub fn render_str(&self, text: &str, location: &Location, diags: &mut Diagnostics) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for token in self.delimiters.scan(text) {
            match token {
                Token::Placeholder(p) => {
                    out.push_str(&text[last..p.start]);
                    out.push_str(&self.evaluate(p.expr, &location.with_offset(p.start), diags));
                    last = p.end;
                }
                Token::Unterminated { offset } => {
                    diags.warn(
                        WarningKind::MalformedPlaceholder,
                        location.with_offset(offset),
                    );
                }
            }
        }

        out.push_str(&text[last..]);
        out
    }

    fn strip_namespace<'n>(&self, name: &'n str) -> &'n str {
        self.namespace
            .and_then(|ns| name.strip_prefix(ns))
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name)
    }
}
