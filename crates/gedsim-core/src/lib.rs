//! Structure layer for learned GED similarity.
//!
//! `gedsim-core` owns everything the neural layers treat as given: the
//! labeled-graph data model, the dataset provider with its fixed
//! train/validation/test pair partitions, the ground-truth GED lookup,
//! and the per-pair tensor bundle the model consumes.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use gedsim_core::{GedDataset, LabeledGraph, Split};
//!
//! let train = vec![
//!     LabeledGraph::new(vec![0, 1], vec![(0, 1, 0)]),
//!     LabeledGraph::new(vec![0, 1, 1], vec![(0, 1, 0), (1, 2, 0)]),
//! ];
//! let mut ged = HashMap::new();
//! ged.insert((0, 1), 1.0);
//!
//! let ds = GedDataset::new(train, vec![], ged, 0.0)?;
//! let record = ds.get_data((0, 1), Split::Training)?;
//! assert!(ds.target(&record) > 0.0 && ds.target(&record) <= 1.0);
//! # Ok::<(), gedsim_core::Error>(())
//! ```

mod dataset;
mod error;
mod graph;

pub use dataset::{GedDataset, GraphIndexPair, PairRecord, PairTensors, Split};
pub use error::{Error, Result};
pub use graph::{GraphRecord, LabeledGraph};
