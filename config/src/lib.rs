//! # Trellis Config
//!
//! Experiment configuration documents: a tree of mappings, lists and scalars read from
//! YAML, JSON or TOML.
//!
//! Two conventions give the tree its meaning:
//!
//! - **Components**: a mapping carrying the reserved key `_name` describes a component to
//!   construct; the other keys are its arguments.
//! - **References**: a string that is exactly `$key` is an alias for another top-level
//!   node (or a variable, or a registry entry). Strings such as `$HOME/logs` embed
//!   variables that are interpolated at build time.
//!
//! This crate only reads, writes and checks documents. Building objects out of them is
//! the job of `trellis_ioc`.
//!
//! ```
//! use trellis_config::{Document, Format, Schema};
//!
//! let doc = Document::parse(
//!   r#"{
//!     "dataset": {"_name": "CsvDataset", "batch_size": 32},
//!     "model": {"_name": "Classifier", "num_classes": 6},
//!     "optimizer": {"_name": "Adam", "lr": 0.001, "params": {"model": "$model"}},
//!     "trainer": {"_name": "Trainer", "optimizer": "$optimizer"}
//!   }"#,
//!   Format::Json,
//! )
//! .unwrap();
//!
//! assert!(doc.validate().is_ok());
//! assert!(Schema::experiment().validate(&doc).is_ok());
//! assert_eq!(doc.references().len(), 2);
//! ```

mod de;
pub mod document;
pub mod error;
pub mod reference;
mod ser;
pub mod validate;
pub mod value;

pub use document::{Component, Document, Format};
pub use error::{Error, Result};
pub use reference::{interpolate, AliasSite, Reference};
pub use validate::{Expect, FieldRule, Issue, Report, Schema, SchemaErrors};
pub use value::{Mapping, Value, ValueKind, COMPONENT_KEY};
