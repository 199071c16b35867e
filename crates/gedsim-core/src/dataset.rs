//! GED dataset provider.
//!
//! A [`GedDataset`] owns two graph collections (training and test), a
//! ground-truth GED lookup keyed by global graph id, and three fixed pair
//! partitions. Training pairs enumerate ordered training-graph pairs; a
//! validation slice is carved off the end of that sequence once, at
//! construction. Test pairs are laid out query-major in contiguous
//! blocks, one block per test query graph, with the test collection
//! itself as the candidate set — so each block has exactly as many
//! entries as there are query graphs, which is the structural contract
//! the block-wise precision-at-k protocol relies on.
//!
//! Ground-truth GED values are normalized by mean graph size and mapped
//! to a similarity in (0, 1]:
//!
//! ```text
//! nGED(g1, g2) = ged / (0.5 * (|V1| + |V2|))
//! target       = exp(-nGED)
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use candle_core::{Device, Tensor};

use crate::error::{Error, Result};
use crate::graph::LabeledGraph;

/// An ordered `(query index, candidate index)` pair within one split.
pub type GraphIndexPair = (usize, usize);

/// Which fixed partition a pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Training,
    Validation,
    Test,
}

/// Raw per-pair record: the two graphs and their ground-truth GED.
#[derive(Debug, Clone)]
pub struct PairRecord<'a> {
    pub graph_1: &'a LabeledGraph,
    pub graph_2: &'a LabeledGraph,
    /// Global id of the query graph.
    pub query_id: usize,
    /// Global id of the candidate graph.
    pub candidate_id: usize,
    /// Raw (unnormalized) graph edit distance.
    pub ged: f32,
}

/// Tensor-ready bundle for one graph pair — the sole input unit the
/// model consumes. Built fresh per access.
#[derive(Debug)]
pub struct PairTensors {
    /// One-hot node features, `(n_i, number_of_node_labels)`.
    pub node_features_1: Tensor,
    pub node_features_2: Tensor,
    /// One-hot edge features, `(m_i, number_of_edge_labels)`.
    pub edge_features_1: Tensor,
    pub edge_features_2: Tensor,
    /// Edge connectivity, `(2, m_i)` u32 rows `[src; dst]`.
    pub edge_index_1: Tensor,
    pub edge_index_2: Tensor,
    /// Reverse connectivity, `(2, m_i)` u32 rows `[dst; src]`.
    pub trans_edge_index_1: Tensor,
    pub trans_edge_index_2: Tensor,
    /// Ground-truth similarity, `(1, 1)`.
    pub target: Tensor,
}

/// Graph collections, GED lookup, and fixed pair partitions.
#[derive(Debug, Clone)]
pub struct GedDataset {
    training_graphs: Vec<LabeledGraph>,
    test_graphs: Vec<LabeledGraph>,
    /// GED keyed by `(query_id, candidate_id)` global ids. Training
    /// graphs occupy ids `0..T`, test graphs `T..T+S`.
    ged: HashMap<(usize, usize), f32>,
    number_of_node_labels: usize,
    number_of_edge_labels: usize,
    training_pairs: Vec<GraphIndexPair>,
    validation_pairs: Vec<GraphIndexPair>,
    test_pairs: Vec<GraphIndexPair>,
}

impl GedDataset {
    /// Build a dataset with the default pair partitions.
    ///
    /// `validation_fraction` of the ordered training pairs (taken from
    /// the end of the sequence) becomes the validation partition.
    /// Partition membership is fixed here and never changes.
    pub fn new(
        training_graphs: Vec<LabeledGraph>,
        test_graphs: Vec<LabeledGraph>,
        ged: HashMap<(usize, usize), f32>,
        validation_fraction: f32,
    ) -> Result<Self> {
        if training_graphs.is_empty() {
            return Err(Error::EmptyDataset("no training graphs".into()));
        }

        let t = training_graphs.len();
        let s = test_graphs.len();

        let mut training_pairs: Vec<GraphIndexPair> = Vec::with_capacity(t * t);
        for i in 0..t {
            for j in 0..t {
                training_pairs.push((i, j));
            }
        }
        let validation_len =
            ((training_pairs.len() as f32) * validation_fraction).floor() as usize;
        let validation_pairs = training_pairs.split_off(training_pairs.len() - validation_len);

        let mut test_pairs: Vec<GraphIndexPair> = Vec::with_capacity(s * s);
        for i in 0..s {
            for j in 0..s {
                test_pairs.push((i, j));
            }
        }

        Self::from_parts(
            training_graphs,
            test_graphs,
            ged,
            training_pairs,
            validation_pairs,
            test_pairs,
        )
    }

    /// Build a dataset with explicit pair partitions.
    ///
    /// Escape hatch for external providers with their own pair layout;
    /// the test partition is still expected to honor the contiguous
    /// query-block contract if block-wise evaluation will run on it.
    pub fn from_parts(
        training_graphs: Vec<LabeledGraph>,
        test_graphs: Vec<LabeledGraph>,
        ged: HashMap<(usize, usize), f32>,
        training_pairs: Vec<GraphIndexPair>,
        validation_pairs: Vec<GraphIndexPair>,
        test_pairs: Vec<GraphIndexPair>,
    ) -> Result<Self> {
        if training_graphs.is_empty() {
            return Err(Error::EmptyDataset("no training graphs".into()));
        }

        let all = training_graphs.iter().chain(test_graphs.iter());
        let mut max_node_label = 0usize;
        let mut max_edge_label = 0usize;
        for g in all {
            max_node_label = max_node_label.max(g.max_node_label().map_or(0, |l| l + 1));
            max_edge_label = max_edge_label.max(g.max_edge_label().map_or(0, |l| l + 1));
        }

        Ok(Self {
            training_graphs,
            test_graphs,
            ged,
            number_of_node_labels: max_node_label.max(1),
            number_of_edge_labels: max_edge_label.max(1),
            training_pairs,
            validation_pairs,
            test_pairs,
        })
    }

    /// Load a dataset from `<root>/<name>/{train,test}/*.json` and
    /// `<root>/<name>/<name>_ged.json`.
    ///
    /// Graph files are read in file-name order so graph ids are stable
    /// across runs. The GED file holds `[query_id, candidate_id, ged]`
    /// triples over global ids.
    pub fn load(root: &Path, name: &str, validation_fraction: f32) -> Result<Self> {
        let base = root.join(name);
        let training_graphs = load_graph_dir(&base.join("train"))?;
        let test_graphs = load_graph_dir(&base.join("test"))?;

        let ged_path = base.join(format!("{name}_ged.json"));
        let reader = BufReader::new(File::open(ged_path)?);
        let entries: Vec<(usize, usize, f32)> = serde_json::from_reader(reader)?;
        let ged = entries.into_iter().map(|(q, c, g)| ((q, c), g)).collect();

        Self::new(training_graphs, test_graphs, ged, validation_fraction)
    }

    /// Number of distinct node labels across both collections.
    pub fn number_of_node_labels(&self) -> usize {
        self.number_of_node_labels
    }

    /// Number of distinct edge labels across both collections.
    pub fn number_of_edge_labels(&self) -> usize {
        self.number_of_edge_labels
    }

    pub fn training_graphs(&self) -> &[LabeledGraph] {
        &self.training_graphs
    }

    pub fn test_graphs(&self) -> &[LabeledGraph] {
        &self.test_graphs
    }

    /// Ordered training pair sequence.
    pub fn training_graph_index_pairs(&self) -> &[GraphIndexPair] {
        &self.training_pairs
    }

    /// Ordered validation pair sequence.
    pub fn validation_graph_index_pairs(&self) -> &[GraphIndexPair] {
        &self.validation_pairs
    }

    /// Ordered test pair sequence, contiguous blocks per query graph.
    pub fn test_graph_index_pairs(&self) -> &[GraphIndexPair] {
        &self.test_pairs
    }

    /// Resolve a pair of split-local indices into a raw record.
    pub fn get_data(&self, pair: GraphIndexPair, split: Split) -> Result<PairRecord<'_>> {
        let (i, j) = pair;
        let t = self.training_graphs.len();
        let (graph_1, graph_2, query_id, candidate_id) = match split {
            Split::Training | Split::Validation => (
                self.graph_at(&self.training_graphs, i)?,
                self.graph_at(&self.training_graphs, j)?,
                i,
                j,
            ),
            Split::Test => (
                self.graph_at(&self.test_graphs, i)?,
                self.graph_at(&self.test_graphs, j)?,
                t + i,
                t + j,
            ),
        };
        let ged = self.ged(query_id, candidate_id)?;
        Ok(PairRecord {
            graph_1,
            graph_2,
            query_id,
            candidate_id,
            ged,
        })
    }

    /// Ground-truth GED for a global id pair. Lookup is symmetric; a
    /// graph paired with itself defaults to zero when no entry exists.
    pub fn ged(&self, query_id: usize, candidate_id: usize) -> Result<f32> {
        if let Some(&g) = self.ged.get(&(query_id, candidate_id)) {
            return Ok(g);
        }
        if let Some(&g) = self.ged.get(&(candidate_id, query_id)) {
            return Ok(g);
        }
        if query_id == candidate_id {
            return Ok(0.0);
        }
        Err(Error::GedNotFound {
            query: query_id,
            candidate: candidate_id,
        })
    }

    /// GED normalized by mean graph size.
    pub fn normalized_ged(&self, record: &PairRecord<'_>) -> f32 {
        let size = record.graph_1.node_count() + record.graph_2.node_count();
        if size == 0 {
            return 0.0;
        }
        record.ged / (0.5 * size as f32)
    }

    /// Ground-truth similarity target `exp(-nGED)`, in (0, 1].
    pub fn target(&self, record: &PairRecord<'_>) -> f32 {
        (-self.normalized_ged(record)).exp()
    }

    /// Materialize the tensor bundle for one pair.
    pub fn to_tensors(&self, record: &PairRecord<'_>, device: &Device) -> Result<PairTensors> {
        let (node_features_1, edge_features_1, edge_index_1, trans_edge_index_1) =
            self.graph_tensors(record.graph_1, device)?;
        let (node_features_2, edge_features_2, edge_index_2, trans_edge_index_2) =
            self.graph_tensors(record.graph_2, device)?;
        let target = Tensor::from_vec(vec![self.target(record)], (1, 1), device)?;
        Ok(PairTensors {
            node_features_1,
            node_features_2,
            edge_features_1,
            edge_features_2,
            edge_index_1,
            edge_index_2,
            trans_edge_index_1,
            trans_edge_index_2,
            target,
        })
    }

    fn graph_tensors(
        &self,
        graph: &LabeledGraph,
        device: &Device,
    ) -> Result<(Tensor, Tensor, Tensor, Tensor)> {
        let nodes = one_hot(
            &graph.node_labels(),
            self.number_of_node_labels,
            device,
        )?;

        let edge_list = graph.edge_list();
        let m = edge_list.len();
        let labels: Vec<usize> = edge_list.iter().map(|&(_, _, l)| l).collect();
        let edges = one_hot(&labels, self.number_of_edge_labels, device)?;

        let mut forward = Vec::with_capacity(2 * m);
        forward.extend(edge_list.iter().map(|&(s, _, _)| s as u32));
        forward.extend(edge_list.iter().map(|&(_, d, _)| d as u32));
        let mut reverse = Vec::with_capacity(2 * m);
        reverse.extend(edge_list.iter().map(|&(_, d, _)| d as u32));
        reverse.extend(edge_list.iter().map(|&(s, _, _)| s as u32));

        let edge_index = Tensor::from_vec(forward, (2, m), device)?;
        let trans_edge_index = Tensor::from_vec(reverse, (2, m), device)?;
        Ok((nodes, edges, edge_index, trans_edge_index))
    }

    fn graph_at<'a>(&self, graphs: &'a [LabeledGraph], index: usize) -> Result<&'a LabeledGraph> {
        graphs.get(index).ok_or(Error::GraphNotFound {
            index,
            len: graphs.len(),
        })
    }
}

/// One-hot encode label ids into a `(len, width)` f32 tensor.
fn one_hot(labels: &[usize], width: usize, device: &Device) -> Result<Tensor> {
    let mut data = vec![0.0f32; labels.len() * width];
    for (row, &label) in labels.iter().enumerate() {
        data[row * width + label] = 1.0;
    }
    Ok(Tensor::from_vec(data, (labels.len(), width), device)?)
}

fn load_graph_dir(dir: &Path) -> Result<Vec<LabeledGraph>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut graphs = Vec::with_capacity(paths.len());
    for path in paths {
        let reader = BufReader::new(File::open(path)?);
        graphs.push(serde_json::from_reader(reader)?);
    }
    Ok(graphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(n: usize) -> LabeledGraph {
        // Path graph with alternating node labels.
        let labels = (0..n).map(|i| i % 2).collect();
        let edges = (0..n.saturating_sub(1)).map(|i| (i, i + 1, 0)).collect();
        LabeledGraph::new(labels, edges)
    }

    fn full_ged(t: usize, s: usize) -> HashMap<(usize, usize), f32> {
        let total = t + s;
        let mut ged = HashMap::new();
        for i in 0..total {
            for j in 0..total {
                ged.insert((i, j), (i as f32 - j as f32).abs());
            }
        }
        ged
    }

    fn dataset() -> GedDataset {
        let train = vec![graph(3), graph(4), graph(5)];
        let test = vec![graph(3), graph(6)];
        GedDataset::new(train, test, full_ged(3, 2), 0.25).unwrap()
    }

    #[test]
    fn test_pair_partitions() {
        let ds = dataset();
        // 9 ordered training pairs, floor(9 * 0.25) = 2 for validation.
        assert_eq!(ds.training_graph_index_pairs().len(), 7);
        assert_eq!(ds.validation_graph_index_pairs().len(), 2);
        assert_eq!(ds.validation_graph_index_pairs(), &[(2, 1), (2, 2)]);
        // Query-major test blocks over the test collection.
        assert_eq!(
            ds.test_graph_index_pairs(),
            &[(0, 0), (0, 1), (1, 0), (1, 1)]
        );
    }

    #[test]
    fn test_label_counts() {
        let ds = dataset();
        assert_eq!(ds.number_of_node_labels(), 2);
        assert_eq!(ds.number_of_edge_labels(), 1);
    }

    #[test]
    fn test_get_data_maps_global_ids() {
        let ds = dataset();
        let record = ds.get_data((1, 0), Split::Test).unwrap();
        assert_eq!(record.query_id, 4);
        assert_eq!(record.candidate_id, 3);
        assert_eq!(record.graph_1.node_count(), 6);
        assert_eq!(record.graph_2.node_count(), 3);
    }

    #[test]
    fn test_ged_lookup_is_symmetric() {
        let train = vec![graph(3), graph(4)];
        let mut ged = HashMap::new();
        ged.insert((0, 1), 2.0);
        let ds = GedDataset::new(train, vec![], ged, 0.0).unwrap();
        assert_eq!(ds.ged(0, 1).unwrap(), 2.0);
        assert_eq!(ds.ged(1, 0).unwrap(), 2.0);
        // Diagonal defaults to zero.
        assert_eq!(ds.ged(0, 0).unwrap(), 0.0);
        assert!(matches!(
            ds.ged(0, 7),
            Err(Error::GedNotFound { query: 0, candidate: 7 })
        ));
    }

    #[test]
    fn test_normalized_ged_and_target() {
        let ds = dataset();
        let record = ds.get_data((0, 2), Split::Training).unwrap();
        // ged = 2, sizes 3 and 5 -> nGED = 2 / 4 = 0.5.
        assert!((ds.normalized_ged(&record) - 0.5).abs() < 1e-6);
        assert!((ds.target(&record) - (-0.5f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_to_tensors_shapes() {
        let ds = dataset();
        let record = ds.get_data((0, 1), Split::Training).unwrap();
        let data = ds.to_tensors(&record, &Device::Cpu).unwrap();
        assert_eq!(data.node_features_1.dims(), &[3, 2]);
        assert_eq!(data.node_features_2.dims(), &[4, 2]);
        assert_eq!(data.edge_features_1.dims(), &[2, 1]);
        assert_eq!(data.edge_index_1.dims(), &[2, 2]);
        assert_eq!(data.trans_edge_index_2.dims(), &[2, 3]);
        assert_eq!(data.target.dims(), &[1, 1]);

        // Transposed index swaps the rows.
        let fwd = data.edge_index_1.to_vec2::<u32>().unwrap();
        let rev = data.trans_edge_index_1.to_vec2::<u32>().unwrap();
        assert_eq!(fwd[0], rev[1]);
        assert_eq!(fwd[1], rev[0]);
    }

    #[test]
    fn test_empty_training_set_is_rejected() {
        let err = GedDataset::new(vec![], vec![graph(3)], HashMap::new(), 0.0);
        assert!(matches!(err, Err(Error::EmptyDataset(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("toy");
        std::fs::create_dir_all(base.join("train")).unwrap();
        std::fs::create_dir_all(base.join("test")).unwrap();

        for (i, g) in [graph(3), graph(4)].iter().enumerate() {
            let file = File::create(base.join("train").join(format!("{i}.json"))).unwrap();
            serde_json::to_writer(file, g).unwrap();
        }
        let file = File::create(base.join("test").join("0.json")).unwrap();
        serde_json::to_writer(file, &graph(5)).unwrap();

        let entries: Vec<(usize, usize, f32)> = vec![(0, 1, 1.0), (2, 0, 2.0), (2, 1, 1.0)];
        let file = File::create(base.join("toy_ged.json")).unwrap();
        serde_json::to_writer(file, &entries).unwrap();

        let ds = GedDataset::load(dir.path(), "toy", 0.0).unwrap();
        assert_eq!(ds.training_graphs().len(), 2);
        assert_eq!(ds.test_graphs().len(), 1);
        assert_eq!(ds.ged(0, 1).unwrap(), 1.0);
        assert_eq!(ds.ged(2, 0).unwrap(), 2.0);
    }
}
