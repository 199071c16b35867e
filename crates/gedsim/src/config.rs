//! Run configuration.
//!
//! A [`GedsimConfig`] is built once at startup and passed by reference to
//! every component constructor; derived file paths are methods rather
//! than mutated fields, so a config value never changes after
//! construction.

use std::path::PathBuf;

use candle_core::Device;

use crate::metrics::PairLossKind;

/// Immutable run configuration.
///
/// Feature flags change the fused feature width and control flow; see
/// the model crate for the width computation. Checkpoint and dataset
/// paths are derived from the root/name/filename components.
#[derive(Debug, Clone)]
pub struct GedsimConfig {
    /// Tensor placement for all parameters and per-pair bundles.
    pub device: Device,

    /// Enable the histogram similarity feature.
    pub histogram: bool,
    /// Histogram bin count.
    pub bins: usize,
    /// Enable the pairwise tensor-interaction scorer.
    pub tensor_network: bool,
    /// Tensor-network output width per pooled stream.
    pub tensor_neurons: usize,
    /// Use attention pooling instead of average pooling.
    pub attention_module: bool,
    /// Enable the node-to-graph matching feature.
    pub node_graph_matching: bool,
    /// Node/edge embedding width.
    pub hidden_size: usize,
    /// Bottleneck layer width in the regression head.
    pub bottle_neck_neurons: usize,

    /// Training pairs per optimizer step.
    pub batch_size: usize,
    /// Number of training epochs.
    pub epochs: usize,
    /// AdamW learning rate.
    pub learning_rate: f32,
    /// AdamW weight decay.
    pub weight_decay: f32,
    /// Run per-epoch validation with best-checkpoint tracking.
    pub validate: bool,
    /// Fraction of training pairs carved off for validation.
    pub validation_fraction: f32,
    /// Per-pair metric used for validation/test error reporting.
    pub validation_metric: PairLossKind,

    /// Dataset root directory.
    pub dataset_root: PathBuf,
    /// Dataset name under the root.
    pub dataset_name: String,
    /// Checkpoint file name.
    pub filename: String,
    /// Directory for checkpoint files.
    pub model_root: PathBuf,
}

impl Default for GedsimConfig {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            histogram: true,
            bins: 16,
            tensor_network: true,
            tensor_neurons: 16,
            attention_module: true,
            node_graph_matching: false,
            hidden_size: 16,
            bottle_neck_neurons: 16,
            batch_size: 128,
            epochs: 5,
            learning_rate: 0.001,
            weight_decay: 5e-4,
            validate: true,
            validation_fraction: 0.25,
            validation_metric: PairLossKind::SquaredError,
            dataset_root: PathBuf::from("datasets"),
            dataset_name: "aids".into(),
            filename: "gedsim.safetensors".into(),
            model_root: PathBuf::from("pretrained_models"),
        }
    }
}

impl GedsimConfig {
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn with_histogram(mut self, enabled: bool, bins: usize) -> Self {
        self.histogram = enabled;
        self.bins = bins;
        self
    }

    pub fn with_tensor_network(mut self, enabled: bool, tensor_neurons: usize) -> Self {
        self.tensor_network = enabled;
        self.tensor_neurons = tensor_neurons;
        self
    }

    pub fn with_attention_module(mut self, enabled: bool) -> Self {
        self.attention_module = enabled;
        self
    }

    pub fn with_node_graph_matching(mut self, enabled: bool) -> Self {
        self.node_graph_matching = enabled;
        self
    }

    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    pub fn with_bottle_neck_neurons(mut self, n: usize) -> Self {
        self.bottle_neck_neurons = n;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_weight_decay(mut self, wd: f32) -> Self {
        self.weight_decay = wd;
        self
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_paths(
        mut self,
        dataset_root: impl Into<PathBuf>,
        dataset_name: impl Into<String>,
        model_root: impl Into<PathBuf>,
        filename: impl Into<String>,
    ) -> Self {
        self.dataset_root = dataset_root.into();
        self.dataset_name = dataset_name.into();
        self.model_root = model_root.into();
        self.filename = filename.into();
        self
    }

    /// General checkpoint path.
    pub fn save_path(&self) -> PathBuf {
        self.model_root.join(&self.filename)
    }

    /// Best-validation checkpoint path, distinct from [`save_path`].
    ///
    /// [`save_path`]: Self::save_path
    pub fn best_model_path(&self) -> PathBuf {
        self.model_root.join(format!("{}-best-val", self.filename))
    }

    /// Dataset directory `<root>/<name>`.
    pub fn dataset_dir(&self) -> PathBuf {
        self.dataset_root.join(&self.dataset_name)
    }
}
