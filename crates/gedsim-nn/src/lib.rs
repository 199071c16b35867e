//! Neural layers for learned GED similarity.
//!
//! `gedsim-nn` provides the candle message-passing building blocks the
//! model crate composes: the node/edge convolution encoder, the two
//! pooling reducers, the pairwise tensor-interaction scorer, and the
//! node-to-graph matching module. It sits between the structure layer
//! (`gedsim-core`) and the model/trainer crate (`gedsim`).
//!
//! # Modules
//!
//! - [`conv`]: node/edge co-convolution encoder over both edge directions
//! - [`pooling`]: average and attention reducers
//! - [`interaction`]: bilinear tensor-network scorer
//! - [`matching`]: cross-graph node alignment feature
//!
//! # Example: encoder forward pass
//!
//! ```rust,ignore
//! use gedsim_nn::conv::NodeEdgeConv;
//! use candle_core::{DType, Device, Tensor};
//! use candle_nn::{VarBuilder, VarMap};
//!
//! let varmap = VarMap::new();
//! let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
//! let conv = NodeEdgeConv::new(8, 4, 16, vb)?;
//! let (nodes, edges) = conv.forward(&x, &edge_index, &e, &trans_edge_index)?;
//! ```

pub mod conv;
pub mod error;
pub mod interaction;
pub mod matching;
pub mod pooling;

pub use conv::NodeEdgeConv;
pub use error::{Error, Result};
pub use interaction::TensorNetwork;
pub use matching::NodeGraphMatching;
pub use pooling::{AttentionPooling, AvgPooling};
