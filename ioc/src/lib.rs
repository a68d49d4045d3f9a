//! # Trellis IoC
//!
//! Builds experiments out of configuration documents.
//!
//! A document names the components it needs; the host program registers a factory per
//! component name. Building walks the document, instantiates every `_name`-tagged node
//! through its factory and wires references between nodes.
//!
//! ## Core Concepts
//!
//! - **Registry**: the thread-safe table of plugins (factories) and plain values.
//! - **Global Registry**: a static, globally-available registry, accessible via `global()`.
//! - **Args**: the built keyword arguments handed to a factory. Unread arguments are an
//!   error, and so are missing or mistyped ones.
//! - **References**: `$key` resolves to a variable, a registry entry or another
//!   top-level node. Nodes are built once; every reference shares the same instance.
//! - **Loops**: a node that (indirectly) refers to itself is reported, with the chain.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use trellis_config::Format;
//! use trellis_ioc::{resolve, Experiment, Registry};
//!
//! struct Model {
//!   num_classes: i64,
//! }
//!
//! struct Trainer {
//!   model: Arc<Model>,
//!   logs: String,
//! }
//!
//! let registry = Arc::new(Registry::new());
//! registry
//!   .register("Model", |args| Ok(Model { num_classes: args.i64("num_classes")? }))
//!   .unwrap();
//! registry
//!   .register("Trainer", |args| {
//!     Ok(Trainer {
//!       model: args.object::<Model>("model")?,
//!       logs: args.string("logs")?,
//!     })
//!   })
//!   .unwrap();
//!
//! let experiment = Experiment::builder()
//!   .registry(registry)
//!   .variable("HOME", "/home/ada")
//!   .parse(
//!     "model: {_name: Model, num_classes: 6}\n\
//!      trainer: {_name: Trainer, model: $model, logs: $HOME/logs}\n",
//!     Format::Yaml,
//!   )
//!   .unwrap();
//!
//! let trainer = resolve!(experiment, Trainer, "trainer");
//! let model = resolve!(experiment, Model, "model");
//!
//! // The trainer holds the very same model instance.
//! assert!(Arc::ptr_eq(&trainer.model, &model));
//! assert_eq!(model.num_classes, 6);
//! assert_eq!(trainer.logs, "/home/ada/logs");
//! ```

mod args;
mod builder;
mod core;
pub mod error;
mod experiment;
mod global;
mod instance;
mod macros;
mod registry;

pub use args::Args;
pub use error::{Error, PluginError, Result};
pub use experiment::{Experiment, ExperimentBuilder};
pub use global::global;
pub use instance::{Instance, Object, Shared};
pub use registry::{Plugin, Registry};
