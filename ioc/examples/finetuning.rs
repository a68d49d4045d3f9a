//! Builds a small fine-tuning experiment and shows that every `$` reference hands out
//! the same instance.
//!
//! Run with `RUST_LOG=trellis_ioc=info` to watch each component being instantiated.

use std::sync::Arc;
use trellis_config::Format;
use trellis_ioc::{resolve, Experiment, PluginError, Registry};
use tracing_subscriber::EnvFilter;

struct Model {
  num_classes: i64,
}

struct Adam {
  lr: f64,
  model: Arc<Model>,
}

struct Trainer {
  model: Arc<Model>,
  optimizer: Arc<Adam>,
  num_epochs: i64,
  logs: String,
}

const DOCUMENT: &str = r#"
model:
  _name: Model
  num_classes: 6
optimizer:
  _name: Adam
  lr: 6.5e-05
  model: $model
trainer:
  _name: Trainer
  model: $model
  optimizer: $optimizer
  num_epochs: 3
  logs: $HOME/experiments/finetuning
"#;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let registry = Arc::new(Registry::new());
  registry
    .register("Model", |args| {
      let num_classes = args.i64("num_classes")?;
      if num_classes < 2 {
        return Err(PluginError::custom("a classifier needs at least two classes"));
      }
      Ok(Model { num_classes })
    })
    .unwrap();
  registry
    .register("Adam", |args| {
      Ok(Adam {
        lr: args.f64("lr")?,
        model: args.object("model")?,
      })
    })
    .unwrap();
  registry
    .register("Trainer", |args| {
      Ok(Trainer {
        model: args.object("model")?,
        optimizer: args.object("optimizer")?,
        num_epochs: args.i64_or("num_epochs", 1)?,
        logs: args.string("logs")?,
      })
    })
    .unwrap();

  let experiment = Experiment::builder()
    .registry(registry)
    .variable("HOME", "/home/ada")
    .parse(DOCUMENT, Format::Yaml)
    .unwrap();

  let trainer = resolve!(experiment, Trainer, "trainer");
  println!(
    "Training a {}-class model for {} epochs (lr {}), logging to {}",
    trainer.model.num_classes, trainer.num_epochs, trainer.optimizer.lr, trainer.logs
  );

  let model = resolve!(experiment, Model, "model");
  assert!(Arc::ptr_eq(&trainer.model, &model));
  assert!(Arc::ptr_eq(&trainer.optimizer.model, &model));
  println!("Trainer and optimizer share the model built under `model`.");
}
