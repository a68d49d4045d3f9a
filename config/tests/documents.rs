// config/tests/documents.rs

//! Integration tests over the sample fine-tuning documents.

use pretty_assertions::assert_eq;
use trellis_config::{Component, Document, Expect, Format, Mapping, Schema, Value};

const MULTITASK: &str = include_str!("fixtures/finetune_multitask.json");
const ADAPTERS: &str = include_str!("fixtures/finetune_adapters.json");

fn multitask() -> Document {
  Document::parse(MULTITASK, Format::Json).expect("multitask fixture parses")
}

fn adapters() -> Document {
  Document::parse(ADAPTERS, Format::Json).expect("adapters fixture parses")
}

// --- Structure ---

#[test]
fn test_top_level_keys_in_document_order() {
  for doc in [multitask(), adapters()] {
    assert_eq!(
      doc.keys().collect::<Vec<_>>(),
      vec!["dataset", "model", "optimizer", "trainer"]
    );
  }
}

#[test]
fn test_every_reference_names_a_top_level_node() {
  for doc in [multitask(), adapters()] {
    let report = doc.validate();
    assert!(report.is_ok(), "unexpected issues: {:?}", report.issues);
    for site in doc.references() {
      assert!(doc.contains_key(&site.target), "{} -> {}", site.path, site.target);
    }
  }
}

#[test]
fn test_reference_sites() {
  let targets: Vec<(String, String)> = multitask()
    .references()
    .into_iter()
    .map(|site| (site.path, site.target))
    .collect();
  let expected = [
    ("optimizer.params.model", "model"),
    ("trainer.model", "model"),
    ("trainer.dataset_splits", "dataset"),
    ("trainer.optimizer", "optimizer"),
    ("trainer.lr_scheduler.optimizer", "optimizer"),
  ];
  assert_eq!(
    targets,
    expected
      .iter()
      .map(|(p, t)| (p.to_string(), t.to_string()))
      .collect::<Vec<_>>()
  );
}

#[test]
fn test_components_are_listed_with_paths() {
  let components = adapters().components();
  assert_eq!(
    &components[..3],
    &[
      Component {
        path: "dataset".into(),
        name: "BertCLFFinetuningDataset".into()
      },
      Component {
        path: "model".into(),
        name: "TransformerWithClfHeadAndAdapters".into()
      },
      Component {
        path: "optimizer".into(),
        name: "Adam".into()
      },
    ]
  );
  assert!(components
    .iter()
    .any(|c| c.path == "trainer.metrics.loss.loss_fn" && c.name == "FineTuningLoss"));
}

// --- Round trips ---

#[test]
fn test_round_trip_is_stable_in_every_format() {
  for doc in [multitask(), adapters()] {
    for format in [Format::Yaml, Format::Json, Format::Toml] {
      let text = doc.render(format).unwrap();
      let reparsed = Document::parse(&text, format).unwrap();
      assert_eq!(reparsed, doc, "{} round trip changed the tree", format);
    }
  }
}

#[test]
fn test_yaml_and_json_round_trips_keep_key_order() {
  let doc = multitask();
  for format in [Format::Yaml, Format::Json] {
    let reparsed = Document::parse(&doc.render(format).unwrap(), format).unwrap();
    let trainer = reparsed.get("trainer").and_then(Value::as_map).unwrap();
    let original = doc.get("trainer").and_then(Value::as_map).unwrap();
    assert_eq!(
      trainer.keys().collect::<Vec<_>>(),
      original.keys().collect::<Vec<_>>()
    );
  }
}

// TOML writes a table's plain values before its sub-tables, so within every mapping the
// non-mapping keys come first. Each group keeps its document order.
fn toml_key_order(map: &Mapping) -> Vec<&str> {
  let (tables, values): (Vec<_>, Vec<_>) = map.iter().partition(|(_, v)| v.as_map().is_some());
  values.into_iter().chain(tables).map(|(k, _)| k).collect()
}

fn assert_toml_order(reparsed: &Mapping, original: &Mapping, path: &str) {
  assert_eq!(
    reparsed.keys().collect::<Vec<_>>(),
    toml_key_order(original),
    "key order at `{}`",
    path
  );
  for (key, value) in original.iter() {
    if let (Some(inner), Some(reinner)) = (value.as_map(), reparsed.get(key).and_then(Value::as_map)) {
      assert_toml_order(reinner, inner, &format!("{}.{}", path, key));
    }
  }
}

#[test]
fn test_toml_round_trip_moves_tables_after_values() {
  for doc in [multitask(), adapters()] {
    let reparsed = Document::parse(&doc.render(Format::Toml).unwrap(), Format::Toml).unwrap();

    // Same tree, and same order where TOML allows it.
    assert_eq!(reparsed, doc);
    assert_toml_order(reparsed.root(), doc.root(), "");
  }

  let trainer = Document::parse(&multitask().render(Format::Toml).unwrap(), Format::Toml)
    .unwrap()
    .get("trainer")
    .and_then(Value::as_map)
    .map(|m| m.keys().map(str::to_owned).collect::<Vec<_>>())
    .unwrap();
  assert_eq!(&trainer[trainer.len() - 3..], &["loss", "lr_scheduler", "metrics"]);
}

#[test]
fn test_adaptation_settings_survive_verbatim() {
  let doc = adapters();
  for format in [Format::Yaml, Format::Json, Format::Toml] {
    let reparsed = Document::parse(&doc.render(format).unwrap(), format).unwrap();
    assert_eq!(
      reparsed.lookup("trainer.adaptation"),
      Some(&Value::from("hard-freezing"))
    );
    assert_eq!(reparsed.lookup("trainer.pretrained"), Some(&Value::Bool(true)));
  }
}

#[test]
fn test_interpolated_strings_are_not_touched_by_parsing() {
  let doc = multitask();
  assert_eq!(
    doc.lookup("trainer.tensorboard_logs").and_then(Value::as_str),
    Some("$HOME/transfer-nlp-data/trec/tensorboard/multitask")
  );
}

// --- Schema ---

#[test]
fn test_num_classes_is_present_and_numeric_in_both_documents() {
  let schema = Schema::experiment();
  for doc in [multitask(), adapters()] {
    schema.validate(&doc).unwrap();
    assert_eq!(doc.lookup("model.num_classes"), Some(&Value::Integer(6)));
  }
}

#[test]
fn test_schema_rejects_non_numeric_num_classes() {
  let mut root = multitask().into_root();
  if let Some(Value::Map(model)) = root.get_mut("model") {
    model.insert("num_classes", "six");
  }
  let doc = Document::from_mapping(root);
  let err = Schema::experiment().validate(&doc).unwrap_err();
  assert_eq!(err.0.len(), 1);
  assert!(err.to_string().contains("model.num_classes: expected a number, found string"));
}

#[test]
fn test_schema_can_pin_component_types() {
  let schema = Schema::new()
    .require("trainer", Expect::Component(Some("SingleTaskFineTuner".into())))
    .require("trainer.pretrained", Expect::Bool);
  assert!(schema.validate(&adapters()).is_ok());
  assert!(schema.validate(&multitask()).is_err());
}

// --- Files ---

#[test]
fn test_load_and_save_pick_format_from_extension() {
  let dir = tempfile::tempdir().unwrap();
  let yaml_path = dir.path().join("experiment.yaml");
  let toml_path = dir.path().join("experiment.toml");

  let doc = adapters();
  doc.save(&yaml_path).unwrap();
  doc.save(&toml_path).unwrap();

  let from_yaml = Document::load(&yaml_path).unwrap();
  let from_toml = Document::load(&toml_path).unwrap();
  assert_eq!(from_yaml, doc);
  assert_eq!(from_toml, doc);
  assert_eq!(from_yaml.source(), Some(yaml_path.as_path()));
}

#[test]
fn test_load_reports_missing_file_and_bad_extension() {
  let dir = tempfile::tempdir().unwrap();
  let missing = Document::load(dir.path().join("nope.json")).unwrap_err();
  assert!(matches!(missing, trellis_config::Error::Read { .. }));

  let ini = dir.path().join("experiment.ini");
  std::fs::write(&ini, "[a]\n").unwrap();
  let unsupported = Document::load(&ini).unwrap_err();
  assert!(matches!(unsupported, trellis_config::Error::UnsupportedFormat { .. }));
}

#[test]
fn test_parse_errors_name_the_format() {
  let err = Document::parse("{\"a\": ", Format::Json).unwrap_err();
  assert!(err.to_string().starts_with("Failed to parse json configuration"));
}
