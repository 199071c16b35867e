//! Pairwise tensor-interaction scoring.
//!
//! [`TensorNetwork`] compares two graph-level vectors through a learned
//! bilinear form plus a linear term:
//!
//! ```text
//! score_k = relu( e1^T W_k e2 + V_k [e1 ; e2] + b_k )
//! ```
//!
//! with one slice `W_k` per output neuron. The output width is the
//! configured `tensor_neurons` constant, independent of graph size.

use candle_core::Tensor;
use candle_nn::{init, Init, VarBuilder};

use crate::error::{Error, Result};

/// Bilinear interaction scorer between two fixed-width vectors.
pub struct TensorNetwork {
    /// Bilinear slices, stored `(d, d * k)`.
    weight: Tensor,
    /// Linear term over the concatenated pair, `(k, 2d)`.
    weight_block: Tensor,
    /// Bias, `(1, k)`.
    bias: Tensor,
    tensor_neurons: usize,
}

impl TensorNetwork {
    /// Create a scorer for `hidden_size`-wide inputs producing a
    /// `tensor_neurons`-wide score vector.
    pub fn new(hidden_size: usize, tensor_neurons: usize, vb: VarBuilder) -> Result<Self> {
        if tensor_neurons == 0 {
            return Err(Error::InvalidConfig(
                "tensor_neurons must be non-zero".into(),
            ));
        }
        let weight = vb.get_with_hints(
            (hidden_size, hidden_size * tensor_neurons),
            "weight",
            init::DEFAULT_KAIMING_NORMAL,
        )?;
        let weight_block = vb.get_with_hints(
            (tensor_neurons, 2 * hidden_size),
            "weight_block",
            init::DEFAULT_KAIMING_NORMAL,
        )?;
        let bias = vb.get_with_hints((1, tensor_neurons), "bias", Init::Const(0.))?;
        Ok(Self {
            weight,
            weight_block,
            bias,
            tensor_neurons,
        })
    }

    /// Score a pair of `(1, d)` vectors into `(1, tensor_neurons)`.
    pub fn forward(&self, e1: &Tensor, e2: &Tensor) -> Result<Tensor> {
        let d = e1.dim(1)?;
        let scoring = e1.matmul(&self.weight)?.reshape((d, self.tensor_neurons))?;
        let bilinear = e2.matmul(&scoring)?;
        let combined = Tensor::cat(&[e1, e2], 1)?;
        let linear = combined.matmul(&self.weight_block.t()?)?;
        Ok(((bilinear + linear)? + &self.bias)?.relu()?)
    }
}
