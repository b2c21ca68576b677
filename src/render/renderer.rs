//! Template rendering glue.
//!
//! The renderer decides which template source and which data to evaluate; it
//! does not own an expression language. It scans `<%= ... %>` tags, handles
//! the helpers that need this crate's state itself (`partial`, `assetPath`,
//! `t`, `formatNumber`, `formatDate`) and hands every other expression to a
//! pluggable [`TemplateEngine`].

use crate::error::{Error, Result};
use crate::i18n::{I18n, Translator, Vars};
use crate::render::{AssetManifest, TemplateResolver};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};

/// Data key holding per-request template suffixes (a string or list of strings).
pub const SUFFIXES_KEY: &str = "templateSuffixes";

/// How deep partials may include other partials.
pub const MAX_PARTIAL_DEPTH: usize = 16;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static CALL_REGEX: OnceLock<Regex> = OnceLock::new();
static PATH_REGEX: OnceLock<Regex> = OnceLock::new();

/// Evaluates the expressions the renderer does not handle itself.
pub trait TemplateEngine: Send + Sync {
    fn evaluate(&self, expression: &str, data: &Map<String, Value>) -> Result<String>;
}

/// Minimal engine: an expression is a dotted path into the data.
///
/// Missing values render as the empty string; anything that is not a path is
/// an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataEngine;

impl TemplateEngine for DataEngine {
    fn evaluate(&self, expression: &str, data: &Map<String, Value>) -> Result<String> {
        if !is_path(expression) {
            return Err(Error::Render(format!(
                "unsupported expression `{}`",
                expression
            )));
        }
        Ok(match lookup(data, expression) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        })
    }
}

/// Look up a dotted path (`user.name`, `users.0.name`) in JSON data.
pub fn lookup<'a>(data: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = data.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn is_path(expression: &str) -> bool {
    PATH_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)*$").unwrap())
        .is_match(expression)
}

/// Read the per-request suffix override from render data.
pub fn template_suffixes(data: &Map<String, Value>) -> Vec<String> {
    match data.get(SUFFIXES_KEY) {
        Some(Value::String(suffix)) => vec![suffix.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// A helper-call argument.
#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Str(String),
    Num(f64),
    Path(String),
}

impl Arg {
    fn resolve(&self, data: &Map<String, Value>) -> Value {
        match self {
            Arg::Str(s) => Value::String(s.clone()),
            Arg::Num(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Arg::Path(path) => lookup(data, path).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Split `"a", 3, user.name` into arguments.
fn parse_args(source: &str) -> Result<Vec<Arg>> {
    let mut args = Vec::new();
    let mut chars = source.trim().chars().peekable();

    while chars.peek().is_some() {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        if chars.next_if_eq(&'"').is_some() {
            let mut literal = String::new();
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(escaped) => literal.push(escaped),
                        None => break,
                    },
                    Some('"') => break,
                    Some(c) => literal.push(c),
                    None => {
                        return Err(Error::Render(format!(
                            "unterminated string in `{}`",
                            source
                        )))
                    }
                }
            }
            args.push(Arg::Str(literal));
        } else {
            let mut token = String::new();
            while let Some(c) = chars.next_if(|c| *c != ',') {
                token.push(c);
            }
            let token = token.trim();
            if let Ok(n) = token.parse::<f64>() {
                args.push(Arg::Num(n));
            } else if is_path(token) {
                args.push(Arg::Path(token.to_string()));
            } else {
                return Err(Error::Render(format!(
                    "invalid argument `{}` in `{}`",
                    token, source
                )));
            }
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') | None => {}
            Some(c) => {
                return Err(Error::Render(format!(
                    "unexpected `{}` in `{}`",
                    c, source
                )))
            }
        }
    }
    Ok(args)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_to_number(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::Render(format!("invalid number {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| Error::Render(format!("invalid number {:?}", s))),
        other => Err(Error::Render(format!("invalid number {}", other))),
    }
}

fn value_to_count(value: &Value) -> Result<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.abs() as u64))
            .ok_or_else(|| Error::Render(format!("invalid count {}", n))),
        Value::Array(items) => Ok(items.len() as u64),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| Error::Render(format!("invalid count {:?}", s))),
        other => Err(Error::Render(format!("invalid count {}", other))),
    }
}

/// Per-render state threaded through partial inclusion.
struct Scope<'a> {
    data: &'a Map<String, Value>,
    translator: Option<&'a Translator>,
}

/// Renders templates from a resolver, with asset and translation helpers.
#[derive(Clone)]
pub struct Renderer {
    resolver: TemplateResolver,
    manifest: Arc<AssetManifest>,
    engine: Arc<dyn TemplateEngine>,
}

impl Renderer {
    pub fn new(resolver: TemplateResolver, manifest: Arc<AssetManifest>) -> Self {
        Self {
            resolver,
            manifest,
            engine: Arc::new(DataEngine),
        }
    }

    /// Replace the engine used for non-helper expressions.
    pub fn with_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    /// Render the template `name` with `data`.
    ///
    /// Suffixes listed under [`SUFFIXES_KEY`] in `data` pick template variants.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` for a missing template or partial
    /// * `Error::ManifestCorrupt` when an `assetPath` lookup hits a corrupt manifest
    /// * `Error::Render` for expressions the engine rejects
    pub fn render(
        &self,
        name: &str,
        data: &Map<String, Value>,
        translator: Option<&Translator>,
    ) -> Result<String> {
        self.render_any(&[name.to_string()], data, translator)
    }

    /// Render the first existing template among `names`.
    pub fn render_any(
        &self,
        names: &[String],
        data: &Map<String, Value>,
        translator: Option<&Translator>,
    ) -> Result<String> {
        let template = self.resolver.resolve_any(names, &template_suffixes(data))?;
        let scope = Scope { data, translator };
        self.expand(&template.content, &scope, 0)
    }

    /// Render a view, trying the locale-qualified name first when `i18n`
    /// has localized views enabled.
    pub fn render_view(
        &self,
        i18n: &I18n,
        name: &str,
        data: &Map<String, Value>,
        translator: &Translator,
    ) -> Result<String> {
        let names = i18n.view_candidates(name, translator.current_locale());
        self.render_any(&names, data, Some(translator))
    }

    fn expand(&self, content: &str, scope: &Scope<'_>, depth: usize) -> Result<String> {
        let regex = TAG_REGEX.get_or_init(|| Regex::new(r"(?s)<%=\s*(.*?)\s*%>").unwrap());

        let mut out = String::with_capacity(content.len());
        let mut last = 0;
        for caps in regex.captures_iter(content) {
            let (Some(tag), Some(expression)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&content[last..tag.start()]);
            out.push_str(&self.evaluate(expression.as_str(), scope, depth)?);
            last = tag.end();
        }
        out.push_str(&content[last..]);
        Ok(out)
    }

    fn evaluate(&self, expression: &str, scope: &Scope<'_>, depth: usize) -> Result<String> {
        let call = CALL_REGEX
            .get_or_init(|| Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)$").unwrap())
            .captures(expression);

        let Some(call) = call else {
            return self.engine.evaluate(expression, scope.data);
        };

        let args = || -> Result<Vec<Value>> {
            Ok(parse_args(&call[2])?
                .iter()
                .map(|arg| arg.resolve(scope.data))
                .collect())
        };

        match &call[1] {
            "partial" => {
                let args = args()?;
                let [reference] = args.as_slice() else {
                    return Err(Error::Render("partial() takes one argument".to_string()));
                };
                let reference = value_to_string(reference);
                if depth >= MAX_PARTIAL_DEPTH {
                    return Err(Error::PartialDepthExceeded {
                        name: reference,
                        depth: MAX_PARTIAL_DEPTH,
                    });
                }
                let partial = self.resolver.resolve_partial(&reference)?;
                self.expand(&partial.content, scope, depth + 1)
            }
            "assetPath" => {
                let args = args()?;
                let [path] = args.as_slice() else {
                    return Err(Error::Render("assetPath() takes one argument".to_string()));
                };
                self.manifest.asset_path(&value_to_string(path))
            }
            "t" => {
                let args = args()?;
                let Some((key, rest)) = args.split_first() else {
                    return Err(Error::Render("t() needs a key".to_string()));
                };
                let key = value_to_string(key);
                let (count, extra) = match rest {
                    [] => (None, None),
                    [Value::Object(vars)] => (None, Some(vars)),
                    [count] => (Some(value_to_count(count)?), None),
                    [count, Value::Object(vars)] => (Some(value_to_count(count)?), Some(vars)),
                    _ => {
                        return Err(Error::Render(
                            "t() takes a key, an optional count and optional variables".to_string(),
                        ))
                    }
                };
                let Some(translator) = scope.translator else {
                    return Ok(key);
                };

                let mut vars = Vars::from_json(scope.data);
                if let Some(extra) = extra {
                    vars = vars.merge(Vars::from_json(extra));
                }
                Ok(match count {
                    Some(count) => translator.translate_plural(&key, count, &vars),
                    None => translator.translate(&key, &vars),
                })
            }
            "formatNumber" => {
                let args = args()?;
                let (value, decimals) = match args.as_slice() {
                    [value] => (value_to_number(value)?, 0),
                    [value, decimals] => (value_to_number(value)?, value_to_count(decimals)? as usize),
                    _ => {
                        return Err(Error::Render(
                            "formatNumber() takes a value and optional decimals".to_string(),
                        ))
                    }
                };
                Ok(match scope.translator {
                    Some(translator) => translator.format_number(value, decimals),
                    None => format!("{:.*}", decimals, value),
                })
            }
            "formatDate" => {
                let args = args()?;
                let [date] = args.as_slice() else {
                    return Err(Error::Render("formatDate() takes one argument".to_string()));
                };
                let date = value_to_string(date);
                let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
                    .map_err(|e| Error::Render(format!("invalid date {:?}: {}", date, e)))?;
                Ok(match scope.translator {
                    Some(translator) => translator.format_date(parsed),
                    None => parsed.format("%Y-%m-%d").to_string(),
                })
            }
            _ => self.engine.evaluate(expression, scope.data),
        }
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("resolver", &self.resolver)
            .field("manifest", &self.manifest)
            .finish()
    }
}
