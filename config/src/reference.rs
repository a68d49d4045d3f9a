//! `$` strings.
//!
//! A string that is exactly `$key` is an alias: it stands for the node, variable or
//! registry entry named `key`. Any other string may embed `$VAR` or `${VAR}` tokens
//! which are interpolated from variables; `$$` is a literal `$`.

use crate::value::{join_path, Value};

pub const SIGIL: char = '$';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
  /// `$key`.
  Alias(String),
  /// A string embedding the listed variables, e.g. `$HOME/logs`.
  Template(Vec<String>),
}

impl Reference {
  /// Classifies a string. Returns `None` for strings with nothing to resolve.
  pub fn parse(s: &str) -> Option<Reference> {
    if let Some(name) = as_alias(s) {
      return Some(Reference::Alias(name.to_string()));
    }
    let variables = template_variables(s);
    if variables.is_empty() {
      None
    } else {
      Some(Reference::Template(variables))
    }
  }
}

/// The alias target of `s` when `s` is a whole-string `$key`.
///
/// Alias targets may contain `.` and `-` (registry aliases such as `Model.from_pretrained`
/// are legal), which template variables may not.
pub fn as_alias(s: &str) -> Option<&str> {
  let name = s.strip_prefix(SIGIL)?;
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return None,
  }
  chars
    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    .then_some(name)
}

fn is_variable_name(name: &str) -> bool {
  let mut bytes = name.bytes();
  match bytes.next() {
    Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
    _ => return false,
  }
  bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

enum Segment<'a> {
  Literal(&'a str),
  Dollar,
  Variable { name: &'a str, raw: &'a str },
}

// `start` indexes a `$`. Returns the token and the index just past it, or `None` when
// the `$` does not begin a token and stays literal.
fn scan_token(s: &str, start: usize) -> Option<(Segment<'_>, usize)> {
  let rest = &s[start + 1..];
  if rest.starts_with(SIGIL) {
    return Some((Segment::Dollar, start + 2));
  }
  if let Some(inner) = rest.strip_prefix('{') {
    let close = inner.find('}')?;
    let name = &inner[..close];
    if !is_variable_name(name) {
      return None;
    }
    let end = start + 2 + close + 1;
    return Some((Segment::Variable { name, raw: &s[start..end] }, end));
  }
  let len = rest
    .bytes()
    .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
    .count();
  let name = &rest[..len];
  if !is_variable_name(name) {
    return None;
  }
  let end = start + 1 + len;
  Some((Segment::Variable { name, raw: &s[start..end] }, end))
}

fn segments(s: &str) -> Vec<Segment<'_>> {
  let bytes = s.as_bytes();
  let mut out = Vec::new();
  let mut literal_start = 0;
  let mut i = 0;
  while i < bytes.len() {
    if bytes[i] != b'$' {
      i += 1;
      continue;
    }
    match scan_token(s, i) {
      Some((segment, end)) => {
        if literal_start < i {
          out.push(Segment::Literal(&s[literal_start..i]));
        }
        out.push(segment);
        i = end;
        literal_start = end;
      }
      None => i += 1,
    }
  }
  if literal_start < s.len() {
    out.push(Segment::Literal(&s[literal_start..]));
  }
  out
}

/// Variable names embedded in `s`, first occurrence order, without duplicates.
pub fn template_variables(s: &str) -> Vec<String> {
  let mut names: Vec<String> = Vec::new();
  for segment in segments(s) {
    if let Segment::Variable { name, .. } = segment {
      if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
      }
    }
  }
  names
}

/// Replaces every `$VAR` / `${VAR}` token for which `lookup` has a value. Unknown
/// variables are left verbatim and `$$` collapses to `$`.
pub fn interpolate<F>(s: &str, mut lookup: F) -> String
where
  F: FnMut(&str) -> Option<String>,
{
  let mut out = String::with_capacity(s.len());
  for segment in segments(s) {
    match segment {
      Segment::Literal(text) => out.push_str(text),
      Segment::Dollar => out.push(SIGIL),
      Segment::Variable { name, raw } => match lookup(name) {
        Some(replacement) => out.push_str(&replacement),
        None => out.push_str(raw),
      },
    }
  }
  out
}

/// Where an alias occurs and what it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasSite {
  pub path: String,
  pub target: String,
}

/// Every alias below (and including) `value`, in document order.
pub fn aliases(value: &Value, prefix: &str) -> Vec<AliasSite> {
  let mut sites = Vec::new();
  value.walk(prefix, &mut |path, node| {
    if let Some(target) = node.as_str().and_then(as_alias) {
      sites.push(AliasSite {
        path: path.to_string(),
        target: target.to_string(),
      });
    }
  });
  sites
}

/// Aliases below each entry of a mapping, with paths rooted at the mapping.
pub(crate) fn aliases_in(entries: &crate::value::Mapping) -> Vec<AliasSite> {
  entries
    .iter()
    .flat_map(|(key, value)| aliases(value, &join_path("", key)))
    .collect()
}
