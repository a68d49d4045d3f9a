// ioc/tests/advanced.rs

mod common;

use common::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use trellis_config::{Document, Format};
use trellis_ioc::{Error, Experiment, ExperimentBuilder, PluginError, Registry};

fn offline(registry: Arc<Registry>) -> ExperimentBuilder {
  Experiment::builder()
    .registry(registry)
    .variable("HOME", "/home/ada")
    .process_env(false)
}

fn multitask() -> Experiment {
  offline(finetuning_registry())
    .parse(MULTITASK, Format::Json)
    .unwrap()
}

// --- Fine-tuning Documents ---

#[test]
fn test_multitask_builds_every_top_level_key_in_order() {
  // Act
  let experiment = multitask();

  // Assert
  assert_eq!(
    experiment.keys().collect::<Vec<_>>(),
    vec!["dataset", "model", "optimizer", "trainer"]
  );
  assert_eq!(experiment.len(), experiment.document().root().len());
}

#[test]
fn test_aliases_share_one_instance() {
  // Arrange
  let experiment = multitask();

  // Act
  let from_trainer = experiment.lookup("trainer.optimizer").unwrap();
  let top_level = experiment.get("optimizer").unwrap();

  // Assert: the node itself and the typed objects are the same allocation.
  assert!(Arc::ptr_eq(from_trainer, top_level));

  let trainer = experiment.object::<Trainer>("trainer").unwrap();
  let optimizer = experiment.object::<Adam>("optimizer").unwrap();
  let model = experiment.object::<Model>("model").unwrap();
  assert!(Arc::ptr_eq(&trainer.optimizer, &optimizer));
  assert!(Arc::ptr_eq(&trainer.model, &model));
  assert!(Arc::ptr_eq(&optimizer.params.model, &model));
  assert!(Arc::ptr_eq(&trainer.dataset, &experiment.object::<Dataset>("dataset").unwrap()));
}

#[test]
fn test_scheduler_steps_the_trainers_optimizer() {
  let experiment = multitask();
  let trainer = experiment.object::<Trainer>("trainer").unwrap();

  assert!(Arc::ptr_eq(&trainer.scheduler.optimizer, &trainer.optimizer));
  assert_eq!(trainer.scheduler.patience, 1);
  assert_eq!(trainer.scheduler.factor, 0.5);
  assert!(Arc::ptr_eq(
    experiment.lookup("trainer.lr_scheduler.optimizer").unwrap(),
    experiment.get("optimizer").unwrap()
  ));
}

#[test]
fn test_nested_components_are_distinct_instances() {
  // The trainer loss and the metric loss are written out twice, so they are two objects.
  let experiment = multitask();
  let trainer = experiment.object::<Trainer>("trainer").unwrap();
  let metric = experiment
    .object::<LossMetric>("trainer.metrics.loss")
    .unwrap();

  assert_eq!(trainer.loss.kind, "MultiTaskLoss");
  assert_eq!(trainer.loss.lm_coef, 0.5);
  assert_eq!(metric.loss_fn.clf_coef, 1.0);
  assert!(!Arc::ptr_eq(&trainer.loss, &metric.loss_fn));
  assert!(experiment.object::<Accuracy>("trainer.metrics.accuracy").is_some());
  assert!(trainer.metrics.child("accuracy").is_some());
}

#[test]
fn test_strings_are_interpolated_from_variables() {
  let experiment = multitask();
  let trainer = experiment.object::<Trainer>("trainer").unwrap();
  let dataset = experiment.object::<Dataset>("dataset").unwrap();

  assert_eq!(
    trainer.tensorboard_logs,
    "/home/ada/transfer-nlp-data/trec/tensorboard/multitask"
  );
  assert_eq!(dataset.data_file, "/home/ada/transfer-nlp-data/trec/trec.csv");
  assert_eq!(dataset.batch_size, 16);
  // The document itself is left as written.
  assert_eq!(
    experiment.document().lookup("dataset.data_file").and_then(|v| v.as_str()),
    Some("$HOME/transfer-nlp-data/trec/trec.csv")
  );
}

#[test]
fn test_model_hyperparameters() {
  let experiment = multitask();
  let model = experiment.object::<Model>("model").unwrap();

  assert_eq!(model.kind, "TransformerWithClfHeadAndLMHead");
  assert_eq!(model.num_classes, 6);
  assert_eq!(model.adapters_dim, None);
  assert!(!model.causal);
  let names: Vec<&str> = model.hyperparameters.iter().map(|(k, _)| k.as_str()).collect();
  assert!(names.contains(&"embed_dim"));
  assert!(names.contains(&"initializer_range"));
}

#[test]
fn test_adapters_document() {
  // Act
  let experiment = offline(finetuning_registry())
    .parse(ADAPTERS, Format::Json)
    .unwrap();

  // Assert
  let trainer = experiment.object::<Trainer>("trainer").unwrap();
  assert_eq!(trainer.kind, "SingleTaskFineTuner");
  assert_eq!(trainer.adaptation.as_deref(), Some("hard-freezing"));
  assert!(trainer.pretrained);
  assert_eq!(trainer.loss.kind, "FineTuningLoss");
  assert_eq!(trainer.model.adapters_dim, Some(32));
  assert_eq!(trainer.model.num_classes, 6);
  assert_eq!(trainer.optimizer.lr, 0.001);
  assert_eq!(trainer.num_epochs, 3);
  let settings: Vec<&str> = trainer.settings.iter().map(|(k, _)| k.as_str()).collect();
  assert_eq!(settings, vec!["gradient_clipping", "seed", "device"]);
}

#[test]
fn test_load_from_disk_in_every_format() {
  // Arrange
  let dir = tempfile::tempdir().unwrap();
  let document = Document::parse(MULTITASK, Format::Json).unwrap();

  for format in [Format::Yaml, Format::Json, Format::Toml] {
    let path = dir.path().join(format!("experiment.{}", format.extension()));
    document.save(&path).unwrap();

    // Act
    let experiment = offline(finetuning_registry()).load(&path).unwrap();

    // Assert
    assert_eq!(experiment.document().source(), Some(path.as_path()));
    let trainer = experiment.object::<Trainer>("trainer").unwrap();
    assert!(Arc::ptr_eq(&trainer.optimizer, &experiment.object::<Adam>("optimizer").unwrap()));
  }
}

// --- Reference Resolution ---

fn demo_registry() -> Arc<Registry> {
  let registry = Arc::new(Registry::new());
  registry
    .register("f", |args| {
      let a = args.i64("a")?;
      Ok(a * 2)
    })
    .unwrap();
  registry
}

#[test]
fn test_values_lists_and_forward_aliases() {
  // Arrange
  let text = r#"
test: coucou
third: $second
second: [$VAR, $test]
"#;

  // Act
  let experiment = Experiment::builder()
    .registry(demo_registry())
    .variable("VAR", 5)
    .process_env(false)
    .parse(text, Format::Yaml)
    .unwrap();

  // Assert
  assert_eq!(experiment.get("test").unwrap().as_str(), Some("coucou"));
  let second = experiment.get("second").unwrap();
  let items = second.as_list().unwrap();
  assert_eq!(items[0].as_value().and_then(|v| v.as_i64()), Some(5));
  assert!(Arc::ptr_eq(&items[1], experiment.get("test").unwrap()));
  assert!(Arc::ptr_eq(experiment.get("third").unwrap(), second));
}

#[test]
fn test_unexpected_keyword_argument() {
  // Act
  let result = Experiment::builder()
    .registry(demo_registry())
    .parse("f: {_name: f, a: 1, r: 5}\n", Format::Yaml);

  // Assert
  match result {
    Err(Error::Instantiation { path, plugin, source }) => {
      assert_eq!(path, "f");
      assert_eq!(plugin, "f");
      assert!(matches!(source, PluginError::UnexpectedArguments(ref names) if names == &["r"]));
    }
    other => panic!("unexpected: {:?}", other.map(|e| e.len())),
  }
}

#[test]
fn test_missing_argument_names_the_component() {
  let result = Experiment::builder()
    .registry(demo_registry())
    .parse("outer: {inner: {_name: f}}\n", Format::Yaml);

  let err = result.err().unwrap();
  assert!(matches!(
    err,
    Error::Instantiation { ref path, source: PluginError::MissingArgument(ref name), .. }
      if path == "outer.inner" && name == "a"
  ));
  assert!(err.to_string().contains("\"outer.inner\""));
}

#[test]
fn test_unknown_plugin() {
  let result = Experiment::builder()
    .registry(demo_registry())
    .parse("model: {_name: Missing}\n", Format::Yaml);

  match result {
    Err(Error::UnknownPlugin { name, path }) => {
      assert_eq!(name, "Missing");
      assert_eq!(path, "model");
    }
    other => panic!("unexpected: {:?}", other.map(|e| e.len())),
  }
}

#[test]
fn test_non_string_component_name() {
  let result = Experiment::builder()
    .registry(demo_registry())
    .parse("model: {_name: 3}\n", Format::Yaml);

  assert!(matches!(result, Err(Error::InvalidComponentName { ref path, .. }) if path == "model"));
}

#[test]
fn test_loops_are_reported_with_their_chain() {
  // Arrange
  let text = "a: {_name: f, a: $b}\nb: [$c]\nc: {x: $a}\n";

  // Act
  let result = Experiment::builder()
    .registry(demo_registry())
    .process_env(false)
    .parse(text, Format::Yaml);

  // Assert
  match result {
    Err(err @ Error::CyclicReference { .. }) => {
      assert_eq!(err.to_string(), "Loop in config: a -> b -> c -> a");
    }
    other => panic!("unexpected: {:?}", other.map(|e| e.len())),
  }
}

#[test]
fn test_self_reference_is_a_loop() {
  let result = Experiment::builder()
    .registry(demo_registry())
    .process_env(false)
    .parse("a: [1, $a]\n", Format::Yaml);

  assert!(matches!(result, Err(Error::CyclicReference { ref chain }) if chain == &["a", "a"]));
}

#[test]
fn test_strict_mode() {
  let text = "paths: {logs: $LOGS/run}\n";

  let lenient = Experiment::builder()
    .registry(demo_registry())
    .process_env(false)
    .parse(text, Format::Yaml)
    .unwrap();
  assert_eq!(
    lenient.lookup("paths.logs").and_then(|i| i.as_str()),
    Some("$LOGS/run")
  );

  let strict = Experiment::builder()
    .registry(demo_registry())
    .process_env(false)
    .strict(true)
    .parse(text, Format::Yaml);
  assert!(matches!(
    strict,
    Err(Error::UnresolvedReference { ref path, ref target }) if path == "paths.logs" && target == "LOGS"
  ));
}

#[test]
fn test_escaped_and_braced_variables() {
  let experiment = Experiment::builder()
    .registry(demo_registry())
    .variable("RUN", "r1")
    .process_env(false)
    .parse("cost: '$$5 for ${RUN}_final'\n", Format::Yaml)
    .unwrap();

  assert_eq!(experiment.get("cost").unwrap().as_str(), Some("$5 for r1_final"));
}

#[test]
fn test_process_environment_is_the_last_resort() {
  // Arrange: a variable name no other test or machine is likely to set.
  std::env::set_var("TRELLIS_ADVANCED_ENV_VALUE", "from-env");
  let text = "a: $TRELLIS_ADVANCED_ENV_VALUE\nb: $TRELLIS_ADVANCED_ENV_VALUE/x\n";

  // Act
  let from_env = Experiment::builder()
    .registry(demo_registry())
    .parse(text, Format::Yaml)
    .unwrap();
  let from_vars = Experiment::builder()
    .registry(demo_registry())
    .variable("TRELLIS_ADVANCED_ENV_VALUE", "from-vars")
    .parse(text, Format::Yaml)
    .unwrap();

  // Assert
  assert_eq!(from_env.get("a").unwrap().as_str(), Some("from-env"));
  assert_eq!(from_env.get("b").unwrap().as_str(), Some("from-env/x"));
  assert_eq!(from_vars.get("a").unwrap().as_str(), Some("from-vars"));
  assert_eq!(from_vars.get("b").unwrap().as_str(), Some("from-vars/x"));
}

#[test]
fn test_document_errors_surface_as_config_errors() {
  let result = Experiment::builder()
    .registry(demo_registry())
    .parse("- just\n- a list\n", Format::Yaml);

  assert!(matches!(
    result,
    Err(Error::Config(trellis_config::Error::NotAMapping { .. }))
  ));
}
