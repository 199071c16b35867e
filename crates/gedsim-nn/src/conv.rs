//! Node/edge co-convolution encoder.
//!
//! [`NodeEdgeConv`] turns raw one-hot node and edge features into
//! fixed-width per-node and per-edge embeddings via message passing over
//! both edge directions. Each layer updates nodes from four streams —
//! a self term, forward neighbors, reverse neighbors (via the transposed
//! edge index), and incident edge features — and updates edges from the
//! edge's own features plus both endpoint embeddings.
//!
//! Aggregation is mean-normalized and implemented as dense
//! adjacency/incidence matmuls built from the edge index per call, so
//! graphs of any (varying) size are accepted. Edge indices out of node
//! range are a caller contract violation and are not checked here.

use candle_core::Tensor;
use candle_nn::{linear, Linear, Module, VarBuilder};

use crate::error::{Error, Result};

/// One node/edge message-passing layer.
struct NodeEdgeConvLayer {
    lin_self: Linear,
    lin_fwd: Linear,
    lin_rev: Linear,
    lin_edge: Linear,
    lin_edge_self: Linear,
    lin_src: Linear,
    lin_dst: Linear,
}

impl NodeEdgeConvLayer {
    fn new(node_in: usize, edge_in: usize, out: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            lin_self: linear(node_in, out, vb.pp("lin_self"))?,
            lin_fwd: linear(node_in, out, vb.pp("lin_fwd"))?,
            lin_rev: linear(node_in, out, vb.pp("lin_rev"))?,
            lin_edge: linear(edge_in, out, vb.pp("lin_edge"))?,
            lin_edge_self: linear(edge_in, out, vb.pp("lin_edge_self"))?,
            lin_src: linear(node_in, out, vb.pp("lin_src"))?,
            lin_dst: linear(node_in, out, vb.pp("lin_dst"))?,
        })
    }

    fn forward(
        &self,
        x: &Tensor,
        e: &Tensor,
        edge_index: &Tensor,
        trans_edge_index: &Tensor,
    ) -> Result<(Tensor, Tensor)> {
        let n = x.dim(0)?;

        let a_fwd = mean_adjacency(edge_index, n)?;
        let a_rev = mean_adjacency(trans_edge_index, n)?;
        let b_inc = mean_incidence(edge_index, n)?;

        let node = (self.lin_self.forward(x)? + a_fwd.matmul(&self.lin_fwd.forward(x)?)?)?;
        let node = (node + a_rev.matmul(&self.lin_rev.forward(x)?)?)?;
        let node = (node + b_inc.matmul(&self.lin_edge.forward(e)?)?)?;
        let node = node.relu()?;

        let srcs = edge_index.narrow(0, 0, 1)?.squeeze(0)?;
        let dsts = edge_index.narrow(0, 1, 1)?.squeeze(0)?;
        let x_src = x.index_select(&srcs, 0)?;
        let x_dst = x.index_select(&dsts, 0)?;
        let edge = (self.lin_edge_self.forward(e)? + self.lin_src.forward(&x_src)?)?;
        let edge = (edge + self.lin_dst.forward(&x_dst)?)?.relu()?;

        Ok((node, edge))
    }
}

/// Stacked node/edge convolution encoder.
///
/// Three layers: labels → hidden, then hidden → hidden twice. Output
/// widths are `hidden_size` for both node and edge embeddings.
pub struct NodeEdgeConv {
    layers: Vec<NodeEdgeConvLayer>,
}

impl NodeEdgeConv {
    /// Create the encoder.
    ///
    /// # Arguments
    /// - `num_node_labels`: one-hot node feature width
    /// - `num_edge_labels`: one-hot edge feature width
    /// - `hidden_size`: embedding width for nodes and edges
    /// - `vb`: variable builder for parameter initialization
    pub fn new(
        num_node_labels: usize,
        num_edge_labels: usize,
        hidden_size: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        if hidden_size == 0 {
            return Err(Error::InvalidConfig("hidden_size must be non-zero".into()));
        }
        let layers = vec![
            NodeEdgeConvLayer::new(num_node_labels, num_edge_labels, hidden_size, vb.pp("layer_0"))?,
            NodeEdgeConvLayer::new(hidden_size, hidden_size, hidden_size, vb.pp("layer_1"))?,
            NodeEdgeConvLayer::new(hidden_size, hidden_size, hidden_size, vb.pp("layer_2"))?,
        ];
        Ok(Self { layers })
    }

    /// Forward pass over one graph.
    ///
    /// # Arguments
    /// - `x`: one-hot node features `(n, num_node_labels)`
    /// - `edge_index`: `(2, m)` u32 rows `[src; dst]`
    /// - `e`: one-hot edge features `(m, num_edge_labels)`
    /// - `trans_edge_index`: `(2, m)` u32 rows `[dst; src]`
    ///
    /// # Returns
    /// `(node_embeddings, edge_embeddings)` of shapes `(n, hidden)` and
    /// `(m, hidden)`.
    pub fn forward(
        &self,
        x: &Tensor,
        edge_index: &Tensor,
        e: &Tensor,
        trans_edge_index: &Tensor,
    ) -> Result<(Tensor, Tensor)> {
        let mut nodes = x.clone();
        let mut edges = e.clone();
        for layer in &self.layers {
            let (n, ed) = layer.forward(&nodes, &edges, edge_index, trans_edge_index)?;
            nodes = n;
            edges = ed;
        }
        Ok((nodes, edges))
    }
}

/// Mean-normalized message adjacency: row `d` averages over sources `s`
/// of edges `(s, d)`.
fn mean_adjacency(edge_index: &Tensor, n: usize) -> Result<Tensor> {
    let idx = edge_index.to_vec2::<u32>()?;
    let mut data = vec![0f32; n * n];
    for (s, d) in idx[0].iter().zip(idx[1].iter()) {
        data[*d as usize * n + *s as usize] += 1.0;
    }
    normalize_rows(&mut data, n, n);
    Ok(Tensor::from_vec(data, (n, n), edge_index.device())?)
}

/// Mean-normalized node-edge incidence: row `v` averages over edges
/// touching `v` at either endpoint.
fn mean_incidence(edge_index: &Tensor, n: usize) -> Result<Tensor> {
    let idx = edge_index.to_vec2::<u32>()?;
    let m = idx[0].len();
    let mut data = vec![0f32; n * m];
    for (j, (s, d)) in idx[0].iter().zip(idx[1].iter()).enumerate() {
        data[*s as usize * m + j] += 1.0;
        data[*d as usize * m + j] += 1.0;
    }
    normalize_rows(&mut data, n, m);
    Ok(Tensor::from_vec(data, (n, m), edge_index.device())?)
}

fn normalize_rows(data: &mut [f32], rows: usize, cols: usize) {
    for row in 0..rows {
        let slice = &mut data[row * cols..(row + 1) * cols];
        let sum: f32 = slice.iter().sum();
        if sum > 0.0 {
            for v in slice.iter_mut() {
                *v /= sum;
            }
        }
    }
}
