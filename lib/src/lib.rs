//! # tabular-nn
//!
//! Turns delimited tabular text into normalized, split numeric matrices,
//! proposes a feed-forward network architecture for them, and reconciles
//! tensor shapes before handing the data to an external training library.
//!
//! ## Core Design Principles
//!
//! - **Fit once, reuse verbatim**: encoders and normalization parameters are
//!   learned from the full upload and reused unchanged for every prediction.
//! - **Deterministic where it matters**: label order is first-occurrence
//!   order, the architecture heuristic is a pure function, and the
//!   train/test split accepts a seed.
//! - **One place for reshaping**: only the [`reconcile`] module converts
//!   between one-hot and scalar targets, and it reports every conversion.
//! - **Training is delegated**: the network itself sits behind the
//!   [`model::ModelBuilder`] and [`model::Model`] traits.
//!
//! ## Quick Start
//!
//! ```rust
//! use tabular_nn::config::PipelineConfig;
//! use tabular_nn::session::Session;
//!
//! let csv = "x1,x2,label\n1,2,A\n2,1,B\n3,4,A\n4,3,C\n5,6,A\n6,5,B\n";
//!
//! let mut session = Session::new(PipelineConfig::new().with_seed(7)).unwrap();
//! let descriptor = session.load_csv(csv, "label").unwrap();
//! assert_eq!(descriptor.label_names(), vec!["A", "B", "C"]);
//!
//! let rec = session.recommendation().unwrap();
//! assert_eq!(rec.neurons_per_layer, vec![10, 3]);
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: CSV ingestion, raw tables and dataset analysis
//! - `preprocessing`: feature/target encoding, normalization, train/test split
//! - `architecture`: heuristic architecture sizing and model descriptions
//! - `reconcile`: model/data shape reconciliation
//! - `model`: collaborator traits and a baseline linear model
//! - `trainer`: reconcile, fit and evaluate orchestration
//! - `session`: explicit per-user pipeline context
//! - `config`: pipeline configuration
//! - `serialization`: byte and file persistence of fitted parameters

/// Heuristic architecture sizing and model descriptions.
pub mod architecture;

/// Pipeline configuration.
pub mod config;

/// Data loading utilities and dataset abstractions.
pub mod dataset;

/// Error type shared by all pipeline stages.
pub mod error;

/// Model collaborator interfaces and a baseline implementation.
pub mod model;

/// Data preprocessing transformers.
pub mod preprocessing;

/// Shape reconciliation between models and encoded targets.
pub mod reconcile;

/// Parameter persistence utilities.
pub mod serialization;

/// Explicit pipeline session context.
pub mod session;

/// High-level training orchestration.
pub mod trainer;

pub use error::{PipelineError, Result};
