//! URI construction from a base template with optional path segments.
//!
//! # Design
//! A template is literal text plus `{/a,b,c}` groups (the RFC 6570 path
//! operator). Expansion walks each group's variables in declared order and
//! emits `/value` only for variables that are present and non-empty, so an
//! address with missing parts never produces empty segments.
//!
//! Path and query variables are ordered slices rather than maps, which keeps
//! expansion deterministic without sorting.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Segments(Vec<String>),
}

/// A parsed URI template. Parse once, expand per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    parts: Vec<Part>,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let mut parts = Vec::new();
        let mut rest = template;

        while !rest.is_empty() {
            let Some(pos) = rest.find(|c: char| c == '{' || c == '}') else {
                parts.push(Part::Literal(rest.to_string()));
                break;
            };
            if rest.as_bytes()[pos] == b'}' {
                return Err(malformed(template, "unmatched '}'"));
            }
            if pos > 0 {
                parts.push(Part::Literal(rest[..pos].to_string()));
            }

            let group = &rest[pos + 1..];
            let end = group
                .find('}')
                .ok_or_else(|| malformed(template, "unterminated group"))?;
            let body = &group[..end];
            if body.contains('{') {
                return Err(malformed(template, "nested group"));
            }
            parts.push(Part::Segments(parse_group(template, body)?));
            rest = &group[end + 1..];
        }

        Ok(Self { parts })
    }

    /// Variable names in expansion order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Segments(names) => Some(names),
                Part::Literal(_) => None,
            })
            .flatten()
            .map(String::as_str)
    }

    /// Expand the template. `query` of `Some` (even empty) always appends `?`.
    pub fn expand(&self, path: &[(&str, Option<&str>)], query: Option<&[(&str, &str)]>) -> String {
        let mut uri = String::new();

        for part in &self.parts {
            match part {
                Part::Literal(text) => uri.push_str(text),
                Part::Segments(names) => {
                    for name in names {
                        if let Some(value) = lookup(path, name) {
                            uri.push('/');
                            uri.push_str(&urlencoding::encode(value));
                        }
                    }
                }
            }
        }

        if let Some(query) = query {
            uri.push('?');
            let pairs: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            uri.push_str(&pairs.join("&"));
        }

        uri
    }
}

/// Parse `template` and expand it in one step.
pub fn build_uri(
    template: &str,
    path: &[(&str, Option<&str>)],
    query: Option<&[(&str, &str)]>,
) -> Result<String> {
    Ok(UriTemplate::parse(template)?.expand(path, query))
}

fn lookup<'a>(path: &[(&str, Option<&'a str>)], name: &str) -> Option<&'a str> {
    path.iter()
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| *value)
        .filter(|value| !value.is_empty())
}

fn parse_group(template: &str, body: &str) -> Result<Vec<String>> {
    let names = body
        .strip_prefix('/')
        .ok_or_else(|| malformed(template, "only the '/' operator is supported"))?;

    names
        .split(',')
        .map(|name| {
            let valid = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            if valid {
                Ok(name.to_string())
            } else {
                Err(malformed(template, &format!("invalid variable name {name:?}")))
            }
        })
        .collect()
}

fn malformed(template: &str, why: &str) -> Error {
    Error::MalformedTemplate(format!("{why} in {template:?}"))
}
