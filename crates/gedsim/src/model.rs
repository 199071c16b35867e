//! GED similarity model.
//!
//! [`GedSim`] encodes both graphs of a pair with the shared node/edge
//! convolution encoder, then runs a fixed-order list of feature
//! contributors over the embeddings. Each contributor declares its
//! output width up front, so the fused feature width is computed once at
//! construction and the forward pass is a single concatenate-and-project
//! pipeline instead of scattered feature-flag branching.
//!
//! Contributor order is fixed: tensor-interaction scores, histogram,
//! node-graph matching. At least one of the tensor network and the
//! histogram must be enabled for the fused vector to be well-defined.

use candle_core::{DType, Tensor};
use candle_nn::ops::sigmoid;
use candle_nn::{linear, Linear, Module, VarBuilder};

use gedsim_core::PairTensors;
use gedsim_nn::{AttentionPooling, AvgPooling, NodeEdgeConv, NodeGraphMatching, TensorNetwork};

use crate::config::GedsimConfig;
use crate::error::{Error, Result};

/// Per-pair embeddings produced by the encoder, consumed by contributors.
pub struct PairEmbeddings {
    pub nodes_1: Tensor,
    pub nodes_2: Tensor,
    pub edges_1: Tensor,
    pub edges_2: Tensor,
}

/// One optional feature stream of the fused vector.
trait FeatureContributor {
    /// Output width, fixed at construction.
    fn width(&self) -> usize;
    /// Compute the `(1, width)` feature for one pair.
    fn compute(&self, pair: &PairEmbeddings) -> Result<Tensor>;
}

/// Pooling strategy selected by configuration.
enum Reducer {
    Average(AvgPooling),
    Attention(AttentionPooling),
}

impl Reducer {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        match self {
            Reducer::Average(p) => Ok(p.forward(x)?),
            Reducer::Attention(p) => Ok(p.forward(x)?),
        }
    }
}

/// Tensor-network scores over pooled node and pooled edge vectors.
///
/// The same bilinear scorer is applied to both streams; the node and
/// edge reducers are distinct (attention keeps separate parameters per
/// stream, shared across the two graphs of a pair).
struct TensorScores {
    node_reducer: Reducer,
    edge_reducer: Reducer,
    tensor_network: TensorNetwork,
    tensor_neurons: usize,
}

impl TensorScores {
    fn new(config: &GedsimConfig, vb: VarBuilder) -> Result<Self> {
        let (node_reducer, edge_reducer) = if config.attention_module {
            (
                Reducer::Attention(AttentionPooling::new(config.hidden_size, vb.pp("attention"))?),
                Reducer::Attention(AttentionPooling::new(
                    config.hidden_size,
                    vb.pp("attention_edge"),
                )?),
            )
        } else {
            (
                Reducer::Average(AvgPooling::new()),
                Reducer::Average(AvgPooling::new()),
            )
        };
        let tensor_network = TensorNetwork::new(
            config.hidden_size,
            config.tensor_neurons,
            vb.pp("tensor_network"),
        )?;
        Ok(Self {
            node_reducer,
            edge_reducer,
            tensor_network,
            tensor_neurons: config.tensor_neurons,
        })
    }
}

impl FeatureContributor for TensorScores {
    fn width(&self) -> usize {
        2 * self.tensor_neurons
    }

    fn compute(&self, pair: &PairEmbeddings) -> Result<Tensor> {
        let pooled_1 = self.node_reducer.forward(&pair.nodes_1)?;
        let pooled_2 = self.node_reducer.forward(&pair.nodes_2)?;
        let pooled_edge_1 = self.edge_reducer.forward(&pair.edges_1)?;
        let pooled_edge_2 = self.edge_reducer.forward(&pair.edges_2)?;

        let scores_node = self.tensor_network.forward(&pooled_1, &pooled_2)?;
        let scores_edge = self.tensor_network.forward(&pooled_edge_1, &pooled_edge_2)?;
        Ok(Tensor::cat(&[&scores_node, &scores_edge], 1)?)
    }
}

/// L1-normalized histogram of cross-graph node-embedding inner products.
struct HistogramFeature {
    bins: usize,
}

impl FeatureContributor for HistogramFeature {
    fn width(&self) -> usize {
        self.bins
    }

    fn compute(&self, pair: &PairEmbeddings) -> Result<Tensor> {
        histogram(&pair.nodes_1, &pair.nodes_2, self.bins)
    }
}

/// Node-to-graph matching feature, `4 * hidden` wide.
struct MatchingFeature {
    module: NodeGraphMatching,
    hidden_size: usize,
}

impl FeatureContributor for MatchingFeature {
    fn width(&self) -> usize {
        4 * self.hidden_size
    }

    fn compute(&self, pair: &PairEmbeddings) -> Result<Tensor> {
        Ok(self.module.forward(&pair.nodes_1, &pair.nodes_2)?)
    }
}

/// Similarity histogram over all pairwise inner products.
///
/// Bins span the observed [min, max] of the score matrix and counts are
/// L1-normalized. If either side has zero nodes the score matrix is
/// empty and the histogram is defined as the zero vector. Computed from
/// detached embeddings on the host; no gradient flows through it.
pub(crate) fn histogram(nodes_1: &Tensor, nodes_2: &Tensor, bins: usize) -> Result<Tensor> {
    let device = nodes_1.device();
    if nodes_1.dim(0)? == 0 || nodes_2.dim(0)? == 0 {
        return Ok(Tensor::zeros((1, bins), DType::F32, device)?);
    }

    let scores = nodes_1.matmul(&nodes_2.t()?)?.detach();
    let values = scores.flatten_all()?.to_vec1::<f32>()?;

    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;

    let mut counts = vec![0.0f32; bins];
    for v in &values {
        let bin = if range > 0.0 {
            (((v - min) / range) * bins as f32) as usize
        } else {
            0
        };
        counts[bin.min(bins - 1)] += 1.0;
    }
    let total = values.len() as f32;
    for c in &mut counts {
        *c /= total;
    }
    Ok(Tensor::from_vec(counts, (1, bins), device)?)
}

/// The GED similarity regressor.
pub struct GedSim {
    encoder: NodeEdgeConv,
    contributors: Vec<Box<dyn FeatureContributor>>,
    fully_connected: Linear,
    scoring: Linear,
    feature_count: usize,
}

impl GedSim {
    /// Build the model from configuration and dataset label counts.
    ///
    /// Fails with [`Error::InvalidConfig`] when both the tensor network
    /// and the histogram are disabled, which would leave the fused
    /// feature vector empty.
    pub fn new(
        config: &GedsimConfig,
        number_of_node_labels: usize,
        number_of_edge_labels: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        if !config.tensor_network && !config.histogram {
            return Err(Error::InvalidConfig(
                "at least one of tensor_network and histogram must be enabled".into(),
            ));
        }

        let encoder = NodeEdgeConv::new(
            number_of_node_labels,
            number_of_edge_labels,
            config.hidden_size,
            vb.pp("convolution"),
        )?;

        let mut contributors: Vec<Box<dyn FeatureContributor>> = Vec::new();
        if config.tensor_network {
            contributors.push(Box::new(TensorScores::new(config, vb.pp("tensor_scores"))?));
        }
        if config.histogram {
            contributors.push(Box::new(HistogramFeature { bins: config.bins }));
        }
        if config.node_graph_matching {
            contributors.push(Box::new(MatchingFeature {
                module: NodeGraphMatching::new(config.hidden_size, vb.pp("matching"))?,
                hidden_size: config.hidden_size,
            }));
        }

        let feature_count = contributors.iter().map(|c| c.width()).sum();
        let fully_connected = linear(
            feature_count,
            config.bottle_neck_neurons,
            vb.pp("fully_connected"),
        )?;
        let scoring = linear(config.bottle_neck_neurons, 1, vb.pp("scoring"))?;

        Ok(Self {
            encoder,
            contributors,
            fully_connected,
            scoring,
            feature_count,
        })
    }

    /// Fused feature width, fixed at construction.
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Predict the similarity of one pair: a `(1, 1)` score in (0, 1).
    pub fn forward(&self, data: &PairTensors) -> Result<Tensor> {
        let (nodes_1, edges_1) = self.encoder.forward(
            &data.node_features_1,
            &data.edge_index_1,
            &data.edge_features_1,
            &data.trans_edge_index_1,
        )?;
        let (nodes_2, edges_2) = self.encoder.forward(
            &data.node_features_2,
            &data.edge_index_2,
            &data.edge_features_2,
            &data.trans_edge_index_2,
        )?;
        let pair = PairEmbeddings {
            nodes_1,
            nodes_2,
            edges_1,
            edges_2,
        };

        let mut features = Vec::with_capacity(self.contributors.len());
        for contributor in &self.contributors {
            features.push(contributor.compute(&pair)?);
        }
        let refs: Vec<&Tensor> = features.iter().collect();
        let fused = Tensor::cat(&refs, 1)?;

        let hidden = self.fully_connected.forward(&fused)?.relu()?;
        Ok(sigmoid(&self.scoring.forward(&hidden)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use candle_nn::VarMap;
    use gedsim_core::{GedDataset, LabeledGraph, Split};
    use std::collections::HashMap;

    fn toy_dataset() -> GedDataset {
        let train = vec![
            LabeledGraph::new(vec![0, 1, 0], vec![(0, 1, 0), (1, 2, 1)]),
            LabeledGraph::new(vec![1, 0, 1, 0], vec![(0, 1, 0), (1, 2, 0), (2, 3, 1)]),
        ];
        let mut ged = HashMap::new();
        ged.insert((0, 1), 1.0);
        GedDataset::new(train, vec![], ged, 0.0).unwrap()
    }

    fn build(config: &GedsimConfig, ds: &GedDataset) -> Result<GedSim> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        GedSim::new(
            config,
            ds.number_of_node_labels(),
            ds.number_of_edge_labels(),
            vb,
        )
    }

    #[test]
    fn test_feature_width_per_configuration() {
        let ds = toy_dataset();
        let base = GedsimConfig::default()
            .with_hidden_size(8)
            .with_tensor_network(true, 10)
            .with_histogram(true, 7);

        let model = build(&base, &ds).unwrap();
        assert_eq!(model.feature_count(), 2 * 10 + 7);

        let no_hist = base.clone().with_histogram(false, 7);
        assert_eq!(build(&no_hist, &ds).unwrap().feature_count(), 20);

        let hist_only = base.clone().with_tensor_network(false, 10);
        assert_eq!(build(&hist_only, &ds).unwrap().feature_count(), 7);

        let all = base.clone().with_node_graph_matching(true);
        assert_eq!(build(&all, &ds).unwrap().feature_count(), 20 + 7 + 4 * 8);
    }

    #[test]
    fn test_zero_width_configuration_is_rejected() {
        let ds = toy_dataset();
        let config = GedsimConfig::default()
            .with_tensor_network(false, 0)
            .with_histogram(false, 0);
        assert!(matches!(
            build(&config, &ds),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_forward_is_bounded() {
        let ds = toy_dataset();
        for attention in [false, true] {
            for matching in [false, true] {
                let config = GedsimConfig::default()
                    .with_hidden_size(6)
                    .with_attention_module(attention)
                    .with_node_graph_matching(matching);
                let model = build(&config, &ds).unwrap();

                let record = ds.get_data((0, 1), Split::Training).unwrap();
                let data = ds.to_tensors(&record, &Device::Cpu).unwrap();
                let score = model.forward(&data).unwrap();
                assert_eq!(score.dims(), &[1, 1]);
                let v = score.to_vec2::<f32>().unwrap()[0][0];
                assert!(v > 0.0 && v < 1.0, "score {v} out of (0, 1)");
            }
        }
    }

    #[test]
    fn test_histogram_sums_to_one() {
        let device = Device::Cpu;
        let x1 = Tensor::randn(0f32, 1f32, (3, 4), &device).unwrap();
        let x2 = Tensor::randn(0f32, 1f32, (5, 4), &device).unwrap();
        let hist = histogram(&x1, &x2, 8).unwrap();
        assert_eq!(hist.dims(), &[1, 8]);
        let sum: f32 = hist.to_vec2::<f32>().unwrap()[0].iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_histogram_of_empty_graph_is_zero() {
        let device = Device::Cpu;
        let empty = Tensor::from_vec(Vec::<f32>::new(), (0, 4), &device).unwrap();
        let x2 = Tensor::randn(0f32, 1f32, (5, 4), &device).unwrap();
        let hist = histogram(&empty, &x2, 8).unwrap();
        let row = hist.to_vec2::<f32>().unwrap();
        assert!(row[0].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_histogram_constant_scores() {
        let device = Device::Cpu;
        // Identical one-hot rows make every inner product equal; the
        // whole mass lands in a single bin.
        let x = Tensor::from_vec(vec![1f32, 0., 1., 0.], (2, 2), &device).unwrap();
        let hist = histogram(&x, &x, 4).unwrap();
        let row = hist.to_vec2::<f32>().unwrap();
        assert!((row[0][0] - 1.0).abs() < 1e-6);
        assert!(row[0][1..].iter().all(|v| *v == 0.0));
    }
}
