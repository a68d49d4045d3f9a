// ioc/tests/common/mod.rs

//! Stand-in components for the sample fine-tuning documents.
//!
//! They only record what they were built with, which is all the tests look at.

#![allow(dead_code)]

use std::sync::Arc;
use trellis_ioc::{Args, PluginError, Registry, Shared};

pub const MULTITASK: &str = include_str!("../../../config/tests/fixtures/finetune_multitask.json");
pub const ADAPTERS: &str = include_str!("../../../config/tests/fixtures/finetune_adapters.json");

pub struct Dataset {
  pub data_file: String,
  pub batch_size: i64,
}

pub struct Model {
  pub kind: &'static str,
  pub num_classes: i64,
  pub adapters_dim: Option<i64>,
  pub dropout: f64,
  pub causal: bool,
  pub hyperparameters: Vec<(String, Shared)>,
}

pub struct TrainableParameters {
  pub model: Arc<Model>,
}

pub struct Adam {
  pub lr: f64,
  pub params: Arc<TrainableParameters>,
}

pub struct Loss {
  pub kind: &'static str,
  pub clf_coef: f64,
  pub lm_coef: f64,
}

pub struct Scheduler {
  pub optimizer: Arc<Adam>,
  pub patience: i64,
  pub factor: f64,
}

pub struct Accuracy;

pub struct LossMetric {
  pub loss_fn: Arc<Loss>,
}

pub struct Trainer {
  pub kind: &'static str,
  pub model: Arc<Model>,
  pub dataset: Arc<Dataset>,
  pub optimizer: Arc<Adam>,
  pub scheduler: Arc<Scheduler>,
  pub loss: Arc<Loss>,
  pub metrics: Shared,
  pub adaptation: Option<String>,
  pub pretrained: bool,
  pub tensorboard_logs: String,
  pub num_epochs: i64,
  pub settings: Vec<(String, Shared)>,
}

fn model(kind: &'static str, args: &mut Args) -> Result<Model, PluginError> {
  Ok(Model {
    kind,
    num_classes: args.i64("num_classes")?,
    adapters_dim: if args.contains("adapters_dim") {
      Some(args.i64("adapters_dim")?)
    } else {
      None
    },
    dropout: args.f64_or("dropout", 0.0)?,
    causal: args.bool_or("causal", false)?,
    hyperparameters: args.rest(),
  })
}

fn trainer(kind: &'static str, args: &mut Args) -> Result<Trainer, PluginError> {
  Ok(Trainer {
    kind,
    model: args.object("model")?,
    dataset: args.object("dataset_splits")?,
    optimizer: args.object("optimizer")?,
    scheduler: args.object("lr_scheduler")?,
    loss: args.object("loss")?,
    metrics: args.instance("metrics")?,
    adaptation: if args.contains("adaptation") {
      Some(args.string("adaptation")?)
    } else {
      None
    },
    pretrained: args.bool_or("pretrained", false)?,
    tensorboard_logs: args.string("tensorboard_logs")?,
    num_epochs: args.i64("num_epochs")?,
    settings: args.rest(),
  })
}

/// A registry knowing every component the sample documents name.
pub fn finetuning_registry() -> Arc<Registry> {
  let registry = Arc::new(Registry::new());

  registry
    .register("BertCLFFinetuningDataset", |args| {
      Ok(Dataset {
        data_file: args.string("data_file")?,
        batch_size: args.i64("batch_size")?,
      })
    })
    .unwrap();
  registry
    .register("TransformerWithClfHeadAndLMHead", |args| {
      model("TransformerWithClfHeadAndLMHead", args)
    })
    .unwrap();
  registry
    .register("TransformerWithClfHeadAndAdapters", |args| {
      model("TransformerWithClfHeadAndAdapters", args)
    })
    .unwrap();
  registry
    .register("TrainableParameters", |args| {
      Ok(TrainableParameters {
        model: args.object("model")?,
      })
    })
    .unwrap();
  registry
    .register("Adam", |args| {
      Ok(Adam {
        lr: args.f64("lr")?,
        params: args.object("params")?,
      })
    })
    .unwrap();
  registry
    .register("MultiTaskLoss", |args| {
      Ok(Loss {
        kind: "MultiTaskLoss",
        clf_coef: args.f64("clf_coef")?,
        lm_coef: args.f64("lm_coef")?,
      })
    })
    .unwrap();
  registry
    .register("FineTuningLoss", |_| {
      Ok(Loss {
        kind: "FineTuningLoss",
        clf_coef: 1.0,
        lm_coef: 0.0,
      })
    })
    .unwrap();
  registry
    .register("ReduceLROnPlateau", |args| {
      Ok(Scheduler {
        optimizer: args.object("optimizer")?,
        patience: args.i64_or("patience", 10)?,
        factor: args.f64_or("factor", 0.1)?,
      })
    })
    .unwrap();
  registry.register("Accuracy", |_| Ok(Accuracy)).unwrap();
  registry
    .register("LossMetric", |args| {
      Ok(LossMetric {
        loss_fn: args.object("loss_fn")?,
      })
    })
    .unwrap();
  registry
    .register("MultiTaskTrainer", |args| trainer("MultiTaskTrainer", args))
    .unwrap();
  registry
    .register("SingleTaskFineTuner", |args| trainer("SingleTaskFineTuner", args))
    .unwrap();

  registry
}
