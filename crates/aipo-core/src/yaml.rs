//! Restricted YAML subset reader for legacy AIPO artifacts.
//!
//! Supports block mappings, block sequences (`- item`, `- key: value`),
//! and plain scalars (double-quoted with JSON escapes, single-quoted
//! with `''` escaping, numbers, booleans, null). Comments start at `#`
//! outside of quotes. Everything else — tabs, anchors, aliases, flow
//! collections, multi-document streams, block scalars — is a hard parse
//! error naming the file and line, never a silent misparse.

use crate::error::{AipoError, Result};
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static INT_RE: OnceLock<Regex> = OnceLock::new();
static FLOAT_RE: OnceLock<Regex> = OnceLock::new();

fn int_re() -> &'static Regex {
    INT_RE.get_or_init(|| Regex::new(r"^-?\d+$").unwrap())
}

fn float_re() -> &'static Regex {
    FLOAT_RE.get_or_init(|| Regex::new(r"^-?\d+\.\d+$").unwrap())
}

// ---------------------------------------------------------------------------
// Line scanning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Line {
    number: usize,
    indent: usize,
    text: String,
}

/// Strip a trailing `#` comment, keeping `#` inside quoted strings.
fn strip_comment(line: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    for (i, ch) in line.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double => return line[..i].trim_end(),
            _ => {}
        }
    }
    line.trim_end()
}

fn scan_lines(text: &str, path: &Path) -> Result<Vec<Line>> {
    let mut out = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let number = i + 1;
        let stripped = strip_comment(raw);
        if stripped.trim().is_empty() {
            continue;
        }
        if stripped.contains('\t') {
            return Err(parse_err(path, number, "tabs are not supported"));
        }
        let indent = stripped.len() - stripped.trim_start_matches(' ').len();
        let content = stripped[indent..].to_string();
        if content == "---" || content.starts_with("--- ") {
            return Err(parse_err(
                path,
                number,
                "multi-document streams are not supported",
            ));
        }
        out.push(Line {
            number,
            indent,
            text: content,
        });
    }
    Ok(out)
}

fn parse_err(path: &Path, line: usize, message: &str) -> AipoError {
    AipoError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a full document into a generic value tree. An empty document
/// yields an empty mapping.
pub fn parse_document(text: &str, path: &Path) -> Result<Value> {
    let lines = scan_lines(text, path)?;
    if lines.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let base = lines[0].indent;
    let mut parser = Parser {
        lines,
        pos: 0,
        path: path.to_path_buf(),
    };
    let root = parser.parse_node(base)?;
    if let Some(line) = parser.peek() {
        return Err(parser.err(line.number, "invalid indentation"));
    }
    Ok(root)
}

struct Parser {
    lines: Vec<Line>,
    pos: usize,
    path: PathBuf,
}

fn is_sequence_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Split `key: value` / `key:` at the first colon followed by whitespace
/// or end of line. Returns (key, rest-of-line).
fn split_key(text: &str) -> Option<(&str, &str)> {
    for (i, ch) in text.char_indices() {
        if ch != ':' {
            continue;
        }
        let rest = &text[i + 1..];
        if rest.is_empty() {
            return Some((text[..i].trim(), ""));
        }
        if rest.starts_with(' ') {
            return Some((text[..i].trim(), rest.trim()));
        }
    }
    None
}

impl Parser {
    fn peek(&self) -> Option<Line> {
        self.lines.get(self.pos).cloned()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn err(&self, line: usize, message: &str) -> AipoError {
        parse_err(&self.path, line, message)
    }

    fn parse_node(&mut self, indent: usize) -> Result<Value> {
        match self.peek() {
            Some(line) if is_sequence_item(&line.text) => self.parse_sequence(indent),
            Some(_) => self.parse_mapping(indent),
            None => Ok(Value::Null),
        }
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<Value> {
        let mut map = Map::new();
        self.parse_mapping_entries(indent, &mut map)?;
        Ok(Value::Object(map))
    }

    fn parse_mapping_entries(&mut self, indent: usize, map: &mut Map<String, Value>) -> Result<()> {
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(self.err(line.number, "unexpected indentation"));
            }
            if is_sequence_item(&line.text) {
                return Err(self.err(line.number, "unexpected list item in mapping"));
            }
            self.reject_unsupported(&line.text, line.number)?;
            let Some((key, rest)) = split_key(&line.text) else {
                return Err(self.err(line.number, "expected 'key: value' mapping entry"));
            };
            if key.is_empty() {
                return Err(self.err(line.number, "empty mapping key"));
            }
            let key = key.to_string();
            self.advance();
            let value = if rest.is_empty() {
                self.parse_nested(indent, line.number)?
            } else {
                self.scalar(rest, line.number)?
            };
            map.insert(key, value);
        }
        Ok(())
    }

    /// Value for a `key:` entry with nothing inline: a deeper block, a
    /// same-indent sequence, or null.
    fn parse_nested(&mut self, indent: usize, _line: usize) -> Result<Value> {
        match self.peek() {
            Some(next) if next.indent > indent => self.parse_node(next.indent),
            Some(next) if next.indent == indent && is_sequence_item(&next.text) => {
                self.parse_sequence(indent)
            }
            _ => Ok(Value::Null),
        }
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<Value> {
        let mut seq = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent < indent || !is_sequence_item(&line.text) {
                break;
            }
            if line.indent > indent {
                return Err(self.err(line.number, "unexpected indentation"));
            }
            self.advance();
            if line.text == "-" {
                let value = match self.peek() {
                    Some(next) if next.indent > indent => self.parse_node(next.indent)?,
                    _ => Value::Null,
                };
                seq.push(value);
                continue;
            }

            let body = line.text[2..].trim_start();
            let body_indent = indent + (line.text.len() - body.len());
            self.reject_unsupported(body, line.number)?;

            if let Some((key, rest)) = split_key(body) {
                if key.is_empty() {
                    return Err(self.err(line.number, "empty mapping key"));
                }
                let mut map = Map::new();
                let first = if rest.is_empty() {
                    self.parse_nested(body_indent, line.number)?
                } else {
                    self.scalar(rest, line.number)?
                };
                map.insert(key.to_string(), first);
                // Continuation keys of the same list item align under the
                // first key, past the dash.
                if let Some(next) = self.peek() {
                    if next.indent == body_indent && !is_sequence_item(&next.text) {
                        self.parse_mapping_entries(body_indent, &mut map)?;
                    }
                }
                seq.push(Value::Object(map));
            } else {
                seq.push(self.scalar(body, line.number)?);
            }
        }
        Ok(Value::Array(seq))
    }

    fn reject_unsupported(&self, text: &str, line: usize) -> Result<()> {
        let message = match text.chars().next() {
            Some('&') => "anchors are not supported",
            Some('*') => "aliases are not supported",
            Some('[') | Some('{') => "flow collections are not supported",
            _ => return Ok(()),
        };
        Err(self.err(line, message))
    }

    fn scalar(&self, raw: &str, line: usize) -> Result<Value> {
        let s = raw.trim();
        if s.starts_with('"') {
            return match serde_json::from_str::<String>(s) {
                Ok(v) => Ok(Value::String(v)),
                Err(_) => Err(self.err(line, "invalid double-quoted string")),
            };
        }
        if let Some(stripped) = s.strip_prefix('\'') {
            let Some(inner) = stripped.strip_suffix('\'') else {
                return Err(self.err(line, "unterminated single-quoted string"));
            };
            return Ok(Value::String(inner.replace("''", "'")));
        }
        match s.chars().next() {
            Some('&') => return Err(self.err(line, "anchors are not supported")),
            Some('*') => return Err(self.err(line, "aliases are not supported")),
            Some('[') | Some('{') => {
                return Err(self.err(line, "flow collections are not supported"))
            }
            Some('|') | Some('>') => return Err(self.err(line, "block scalars are not supported")),
            _ => {}
        }
        let low = s.to_ascii_lowercase();
        if low == "null" || low == "~" {
            return Ok(Value::Null);
        }
        if low == "true" {
            return Ok(Value::Bool(true));
        }
        if low == "false" {
            return Ok(Value::Bool(false));
        }
        if int_re().is_match(s) {
            if let Ok(n) = s.parse::<i64>() {
                return Ok(Value::Number(Number::from(n)));
            }
        }
        if float_re().is_match(s) {
            if let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64) {
                return Ok(Value::Number(n));
            }
        }
        Ok(Value::String(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
