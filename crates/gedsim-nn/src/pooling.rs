//! Reducers: variable-count embedding sets to one fixed-width vector.
//!
//! Two interchangeable strategies. [`AvgPooling`] is deterministic and
//! parameter-free; [`AttentionPooling`] weights rows by a learned global
//! context and a softmax over the row axis. One attention instance is
//! shared between the two graphs of a pair so both sides are scored in
//! the same embedding space; node and edge attention use distinct
//! instances.

use candle_core::Tensor;
use candle_nn::ops::softmax;
use candle_nn::{init, VarBuilder};

use crate::error::Result;

/// Unweighted column mean over the row axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvgPooling;

impl AvgPooling {
    pub fn new() -> Self {
        Self
    }

    /// Reduce `(n, d)` to `(1, d)` by arithmetic mean.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        Ok(x.mean(0)?.unsqueeze(0)?)
    }
}

/// Learned attention-weighted aggregation.
///
/// A global context `c = tanh(mean(X) W)` scores each row; weights are
/// softmax-normalized over the row axis before the weighted sum:
///
/// ```text
/// a_i = softmax_i(x_i . c),   out = sum_i a_i x_i
/// ```
pub struct AttentionPooling {
    weight: Tensor,
}

impl AttentionPooling {
    /// Create an attention reducer over `hidden_size`-wide rows.
    pub fn new(hidden_size: usize, vb: VarBuilder) -> Result<Self> {
        let weight = vb.get_with_hints(
            (hidden_size, hidden_size),
            "weight",
            init::DEFAULT_KAIMING_NORMAL,
        )?;
        Ok(Self { weight })
    }

    /// Reduce `(n, d)` to `(1, d)`; no maximum row count is assumed.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let mean = x.mean(0)?.unsqueeze(0)?;
        let context = mean.matmul(&self.weight)?.tanh()?;
        let scores = x.matmul(&context.t()?)?;
        let weights = softmax(&scores, 0)?;
        Ok(x.broadcast_mul(&weights)?.sum(0)?.unsqueeze(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn rows(device: &Device) -> Tensor {
        Tensor::from_vec(vec![1f32, 2., 3., 4., 5., 6.], (3, 2), device).unwrap()
    }

    #[test]
    fn test_avg_pooling_is_column_mean() {
        let device = Device::Cpu;
        let pooled = AvgPooling::new().forward(&rows(&device)).unwrap();
        assert_eq!(pooled.dims(), &[1, 2]);
        let v = pooled.to_vec2::<f32>().unwrap();
        assert!((v[0][0] - 3.0).abs() < 1e-6);
        assert!((v[0][1] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_avg_pooling_permutation_invariant() {
        let device = Device::Cpu;
        let permuted =
            Tensor::from_vec(vec![5f32, 6., 1., 2., 3., 4.], (3, 2), &device).unwrap();
        let a = AvgPooling::new().forward(&rows(&device)).unwrap();
        let b = AvgPooling::new().forward(&permuted).unwrap();
        assert_eq!(
            a.to_vec2::<f32>().unwrap(),
            b.to_vec2::<f32>().unwrap()
        );
    }

    #[test]
    fn test_attention_pooling_shape() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let att = AttentionPooling::new(2, vb).unwrap();

        let pooled = att.forward(&rows(&device)).unwrap();
        assert_eq!(pooled.dims(), &[1, 2]);

        // Softmax weights form a convex combination, so the output stays
        // inside the per-column min/max of the inputs.
        let v = pooled.to_vec2::<f32>().unwrap();
        assert!(v[0][0] >= 1.0 && v[0][0] <= 5.0);
        assert!(v[0][1] >= 2.0 && v[0][1] <= 6.0);
    }

    #[test]
    fn test_attention_pooling_single_row_is_identity() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let att = AttentionPooling::new(2, vb).unwrap();

        let x = Tensor::from_vec(vec![0.5f32, -1.5], (1, 2), &device).unwrap();
        let pooled = att.forward(&x).unwrap();
        let v = pooled.to_vec2::<f32>().unwrap();
        assert!((v[0][0] - 0.5).abs() < 1e-6);
        assert!((v[0][1] + 1.5).abs() < 1e-6);
    }
}
