//! Node-to-graph cross alignment.
//!
//! [`NodeGraphMatching`] compares the full node-embedding sets of two
//! graphs (not their pooled summaries). Each node is soft-aligned to the
//! other graph through a softmax over the cross-similarity matrix, and
//! the per-node agreement is reduced to a fixed `4 * hidden_size`
//! feature: mean absolute difference and mean elementwise product
//! against the aligned counterpart, for each side.

use candle_core::Tensor;
use candle_nn::ops::softmax;
use candle_nn::{linear, Linear, Module, VarBuilder};

use crate::error::Result;

/// Cross-graph soft-alignment feature over node embedding sets.
pub struct NodeGraphMatching {
    lin: Linear,
}

impl NodeGraphMatching {
    /// Create a matching module over `hidden_size`-wide node embeddings.
    pub fn new(hidden_size: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            lin: linear(hidden_size, hidden_size, vb.pp("lin"))?,
        })
    }

    /// Compute the `(1, 4 * hidden)` alignment feature.
    ///
    /// The two inputs are `(n1, hidden)` and `(n2, hidden)`; `n1` and
    /// `n2` may differ.
    pub fn forward(&self, x1: &Tensor, x2: &Tensor) -> Result<Tensor> {
        let h1 = self.lin.forward(x1)?;
        let h2 = self.lin.forward(x2)?;
        let sim = h1.matmul(&h2.t()?)?;

        let aligned_1 = softmax(&sim, 1)?.matmul(x2)?;
        let aligned_2 = softmax(&sim.t()?, 1)?.matmul(x1)?;

        let f1 = agreement(x1, &aligned_1)?;
        let f2 = agreement(x2, &aligned_2)?;
        Ok(Tensor::cat(&[&f1, &f2], 0)?.unsqueeze(0)?)
    }
}

/// Mean |x - aligned| and mean x * aligned, concatenated to `(2h,)`.
fn agreement(x: &Tensor, aligned: &Tensor) -> Result<Tensor> {
    let diff = (x - aligned)?.abs()?.mean(0)?;
    let prod = (x * aligned)?.mean(0)?;
    Ok(Tensor::cat(&[&diff, &prod], 0)?)
}
