//! Static checks over a document: dangling references, reference cycles and schemas.
//!
//! None of these build anything. They answer whether a document is well formed
//! before it is handed to a builder.

use crate::document::Document;
use crate::reference::as_alias;
use crate::value::{Value, ValueKind};

use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// A single problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
  DanglingReference { path: String, target: String },
  ReferenceCycle { chain: Vec<String> },
  MissingField { path: String },
  WrongKind {
    path: String,
    expected: Expect,
    found: ValueKind,
  },
}

impl fmt::Display for Issue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Issue::DanglingReference { path, target } => {
        write!(f, "{}: reference `${}` does not name a top-level node", path, target)
      }
      Issue::ReferenceCycle { chain } => write!(f, "reference cycle: {}", chain.join(" -> ")),
      Issue::MissingField { path } => write!(f, "{}: required field is missing", path),
      Issue::WrongKind {
        path,
        expected,
        found,
      } => write!(f, "{}: expected {}, found {}", path, expected, found),
    }
  }
}

/// Aliases whose target is neither a top-level key of `doc` nor one of `known`
/// (variables, registry entries).
pub fn check_references<'a, I>(doc: &Document, known: I) -> Vec<Issue>
where
  I: IntoIterator<Item = &'a str>,
{
  let known: HashSet<&str> = known.into_iter().collect();
  doc
    .references()
    .into_iter()
    .filter(|site| !doc.contains_key(&site.target) && !known.contains(site.target.as_str()))
    .map(|site| Issue::DanglingReference {
      path: site.path,
      target: site.target,
    })
    .collect()
}

/// Cycles among top-level nodes, following the aliases inside each node. Every
/// elementary cycle is reported once, starting from its earliest key in document order,
/// so two loops sharing keys are two issues.
pub fn check_cycles(doc: &Document) -> Vec<Issue> {
  let keys: Vec<&str> = doc.keys().collect();
  let order: HashMap<&str, usize> = keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();

  let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
  for (key, value) in doc.root().iter() {
    let mut targets: Vec<&str> = Vec::new();
    value.walk("", &mut |_, node| {
      if let Some(target) = node.as_str().and_then(as_alias) {
        if let Some(index) = order.get(target) {
          let target = keys[*index];
          if !targets.contains(&target) {
            targets.push(target);
          }
        }
      }
    });
    edges.insert(key, targets);
  }

  let mut issues = Vec::new();
  for (rank, &start) in keys.iter().enumerate() {
    let mut path = vec![start];
    cycles_through(start, start, rank, &order, &edges, &mut path, &mut |cycle: &[&str]| {
      issues.push(Issue::ReferenceCycle {
        chain: cycle.iter().map(|k| k.to_string()).collect(),
      });
    });
  }
  issues
}

// Elementary cycles that return to `start` and otherwise only visit keys later in the
// document, so every cycle is found exactly once, from its earliest key. `path` holds
// the keys from `start` to `node`.
fn cycles_through<'a, F>(
  start: &'a str,
  node: &'a str,
  rank: usize,
  order: &HashMap<&'a str, usize>,
  edges: &HashMap<&'a str, Vec<&'a str>>,
  path: &mut Vec<&'a str>,
  on_cycle: &mut F,
) where
  F: FnMut(&[&'a str]),
{
  let Some(targets) = edges.get(node) else {
    return;
  };
  for &target in targets {
    if target == start {
      path.push(start);
      on_cycle(&path[..]);
      path.pop();
    } else if order[target] > rank && !path.contains(&target) {
      path.push(target);
      cycles_through(start, target, rank, order, edges, path, on_cycle);
      path.pop();
    }
  }
}

// --- Schema ---

/// What a schema expects to find at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
  Any,
  Number,
  Integer,
  Bool,
  String,
  Map,
  List,
  /// A `_name`-tagged mapping, optionally of one specific component.
  Component(Option<String>),
}

impl Expect {
  pub fn matches(&self, value: &Value) -> bool {
    match self {
      Expect::Any => true,
      Expect::Number => value.is_number(),
      Expect::Integer => matches!(value, Value::Integer(_)),
      Expect::Bool => matches!(value, Value::Bool(_)),
      Expect::String => matches!(value, Value::String(_)),
      Expect::Map => matches!(value, Value::Map(_)),
      Expect::List => matches!(value, Value::List(_)),
      Expect::Component(None) => value.component_name().is_some(),
      Expect::Component(Some(name)) => value.component_name() == Some(name.as_str()),
    }
  }
}

impl fmt::Display for Expect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expect::Any => f.write_str("any value"),
      Expect::Number => f.write_str("a number"),
      Expect::Integer => f.write_str("an integer"),
      Expect::Bool => f.write_str("a bool"),
      Expect::String => f.write_str("a string"),
      Expect::Map => f.write_str("a map"),
      Expect::List => f.write_str("a list"),
      Expect::Component(None) => f.write_str("a component"),
      Expect::Component(Some(name)) => write!(f, "a `{}` component", name),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
  pub path: String,
  pub expected: Expect,
}

/// Returned by [`Schema::validate`]; carries every violation, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema validation failed: {}", render_issues(.0))]
pub struct SchemaErrors(pub Vec<Issue>);

fn render_issues(issues: &[Issue]) -> String {
  issues
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

/// An ordered list of required fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
  rules: Vec<FieldRule>,
}

impl Schema {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn require(mut self, path: impl Into<String>, expected: Expect) -> Self {
    self.rules.push(FieldRule {
      path: path.into(),
      expected,
    });
    self
  }

  pub fn rules(&self) -> &[FieldRule] {
    &self.rules
  }

  /// The fields every experiment document carries.
  pub fn experiment() -> Self {
    Schema::new()
      .require("dataset", Expect::Map)
      .require("model", Expect::Map)
      .require("optimizer", Expect::Map)
      .require("trainer", Expect::Map)
      .require("model.num_classes", Expect::Number)
  }

  pub fn check(&self, doc: &Document) -> Vec<Issue> {
    self
      .rules
      .iter()
      .filter_map(|rule| match doc.lookup(&rule.path) {
        None => Some(Issue::MissingField {
          path: rule.path.clone(),
        }),
        Some(value) if !rule.expected.matches(value) => Some(Issue::WrongKind {
          path: rule.path.clone(),
          expected: rule.expected.clone(),
          found: value.kind(),
        }),
        Some(_) => None,
      })
      .collect()
  }

  pub fn validate(&self, doc: &Document) -> Result<(), SchemaErrors> {
    let issues = self.check(doc);
    if issues.is_empty() {
      Ok(())
    } else {
      Err(SchemaErrors(issues))
    }
  }
}

// --- Report ---

/// Outcome of the structural checks on a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
  pub issues: Vec<Issue>,
}

impl Report {
  pub fn is_ok(&self) -> bool {
    self.issues.is_empty()
  }

  pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
    self.issues.extend(issues);
  }
}

impl Document {
  /// Reference and cycle checks with only top-level keys as valid targets.
  pub fn validate(&self) -> Report {
    self.validate_with(std::iter::empty())
  }

  /// Like [`Document::validate`], with extra names (variables, registry entries) that
  /// aliases may also point at.
  pub fn validate_with<'a, I>(&self, known: I) -> Report
  where
    I: IntoIterator<Item = &'a str>,
  {
    let mut report = Report::default();
    report.extend(check_references(self, known));
    report.extend(check_cycles(self));
    report
  }
}
