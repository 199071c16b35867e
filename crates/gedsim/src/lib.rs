//! Learned graph edit distance similarity.
//!
//! Pairs labeled graphs with a shared convolution encoder, fuses
//! tensor-network interaction scores, a similarity histogram, and an
//! optional node-to-graph matching feature, and regresses a similarity
//! score in (0, 1) against `exp(-nGED)` targets.
//!
//! ```no_run
//! use gedsim::{GedSimTrainer, GedsimConfig};
//! use gedsim_core::GedDataset;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GedsimConfig::default();
//! let dataset = GedDataset::load(
//!     &config.dataset_root,
//!     &config.dataset_name,
//!     config.validation_fraction,
//! )?;
//! let mut trainer = GedSimTrainer::new(config, dataset)?;
//! trainer.train()?;
//! let report = trainer.test()?;
//! println!("rho {:.4}, p@10 {:.4}", report.rho, report.prec_at_10);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod trainer;

pub use config::GedsimConfig;
pub use error::{Error, Result};
pub use metrics::PairLossKind;
pub use model::GedSim;
pub use trainer::{GedSimTrainer, TestReport};
