//! Training, validation, and test orchestration.
//!
//! [`GedSimTrainer`] owns the model parameters in a [`VarMap`], runs the
//! epoch loop over batched training pairs, tracks the best validation
//! checkpoint on disk, and evaluates the test partition block-wise. The
//! optimizer is created lazily on the first batch so a trainer built
//! only for inference never allocates optimizer state.

use std::path::Path;

use candle_core::{DType, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use log::{debug, info};

use gedsim_core::{GedDataset, GraphIndexPair, Split};

use crate::config::GedsimConfig;
use crate::error::{Error, Result};
use crate::metrics::{kendall_tau, mean, pair_loss, prec_at_ks, spearman_rho, variance};
use crate::model::GedSim;

/// Aggregate test-partition metrics.
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Mean per-pair error under the configured validation metric.
    pub model_error: f32,
    /// Spearman's rho over all test pairs.
    pub rho: f64,
    /// Kendall's tau-b over all test pairs.
    pub tau: f64,
    /// Precision at 10, averaged over query blocks.
    pub prec_at_10: f32,
    /// Precision at 20, averaged over query blocks.
    pub prec_at_20: f32,
    pub ground_truth_mean: f32,
    pub ground_truth_variance: f32,
    pub prediction_mean: f32,
    pub prediction_variance: f32,
}

/// Owns the model, its parameters, and the run state.
pub struct GedSimTrainer {
    config: GedsimConfig,
    dataset: GedDataset,
    model: GedSim,
    varmap: VarMap,
    optimizer: Option<AdamW>,
    epoch_loss_history: Vec<f32>,
    validation_error_history: Vec<f32>,
    best_epoch: usize,
    min_validation_error: f32,
}

impl GedSimTrainer {
    /// Build a trainer and a freshly initialized model over `dataset`.
    pub fn new(config: GedsimConfig, dataset: GedDataset) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &config.device);
        let model = GedSim::new(
            &config,
            dataset.number_of_node_labels(),
            dataset.number_of_edge_labels(),
            vb,
        )?;
        Ok(Self {
            config,
            dataset,
            model,
            varmap,
            optimizer: None,
            epoch_loss_history: Vec::new(),
            validation_error_history: Vec::new(),
            best_epoch: 0,
            min_validation_error: f32::INFINITY,
        })
    }

    pub fn model(&self) -> &GedSim {
        &self.model
    }

    pub fn dataset(&self) -> &GedDataset {
        &self.dataset
    }

    pub fn config(&self) -> &GedsimConfig {
        &self.config
    }

    /// Mean training loss per epoch, one entry per completed epoch.
    pub fn epoch_loss_history(&self) -> &[f32] {
        &self.epoch_loss_history
    }

    /// Validation error per epoch, present when validation is enabled.
    pub fn validation_error_history(&self) -> &[f32] {
        &self.validation_error_history
    }

    /// Epoch with the lowest validation error seen so far.
    pub fn best_epoch(&self) -> usize {
        self.best_epoch
    }

    /// Run the full epoch loop.
    ///
    /// With validation enabled, each epoch that improves the validation
    /// error overwrites the best checkpoint, and the best parameters are
    /// restored into the model after the last epoch.
    pub fn train(&mut self) -> Result<()> {
        info!(
            "training {} epochs over {} pairs (batch size {})",
            self.config.epochs,
            self.dataset.training_graph_index_pairs().len(),
            self.config.batch_size
        );

        for epoch in 0..self.config.epochs {
            let batches = self.create_batches();
            let mut loss_sum = 0.0f32;
            let mut seen = 0usize;
            for batch in &batches {
                // Raw batch sums are weighted by batch size before
                // averaging, so short trailing batches count less.
                let batch_loss = self.process_batch(batch)?;
                loss_sum += batch_loss * batch.len() as f32;
                seen += batch.len();
                debug!(
                    "epoch {epoch}: {seen} pairs, running loss {:.6}",
                    loss_sum / seen.max(1) as f32
                );
            }
            let epoch_loss = loss_sum / seen.max(1) as f32;
            self.epoch_loss_history.push(epoch_loss);
            info!("epoch {epoch}: mean training loss {epoch_loss:.6}");

            if self.config.validate {
                let error = self.validate(epoch)?;
                info!("epoch {epoch}: validation error {error:.6}");
            }
        }

        if self.config.validate && !self.validation_error_history.is_empty() {
            self.varmap.load(self.config.best_model_path())?;
            info!(
                "restored best checkpoint (epoch {}, validation error {:.6})",
                self.best_epoch, self.min_validation_error
            );
        }
        Ok(())
    }

    /// Chunk the ordered training pair sequence into batches.
    fn create_batches(&self) -> Vec<Vec<GraphIndexPair>> {
        self.dataset
            .training_graph_index_pairs()
            .chunks(self.config.batch_size.max(1))
            .map(|c| c.to_vec())
            .collect()
    }

    /// One optimizer step over a batch. Returns the raw loss sum, not
    /// the mean, so callers can weight running averages by pair count.
    fn process_batch(&mut self, batch: &[GraphIndexPair]) -> Result<f32> {
        let mut batch_loss: Option<Tensor> = None;
        for &pair in batch {
            let record = self.dataset.get_data(pair, Split::Training)?;
            let data = self.dataset.to_tensors(&record, &self.config.device)?;
            let prediction = self.model.forward(&data)?;
            let loss = prediction.sub(&data.target)?.sqr()?.sum_all()?;
            batch_loss = Some(match batch_loss {
                Some(acc) => (acc + loss)?,
                None => loss,
            });
        }
        let Some(loss) = batch_loss else {
            return Ok(0.0);
        };

        self.ensure_optimizer()?;
        if let Some(optimizer) = self.optimizer.as_mut() {
            optimizer.backward_step(&loss)?;
        }
        Ok(loss.to_scalar::<f32>()?)
    }

    fn ensure_optimizer(&mut self) -> Result<()> {
        if self.optimizer.is_none() {
            let params = ParamsAdamW {
                lr: self.config.learning_rate as f64,
                weight_decay: self.config.weight_decay as f64,
                ..Default::default()
            };
            self.optimizer = Some(AdamW::new(self.varmap.all_vars(), params)?);
        }
        Ok(())
    }

    /// Mean validation error for one epoch, recorded into the
    /// best-checkpoint tracking state.
    fn validate(&mut self, epoch: usize) -> Result<f32> {
        let pairs: Vec<GraphIndexPair> = self.dataset.validation_graph_index_pairs().to_vec();
        let mut errors = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let (prediction, target) = self.predict(pair, Split::Validation)?;
            errors.push(pair_loss(prediction, target, self.config.validation_metric));
        }
        let error = mean(&errors);
        self.record_validation(epoch, error)?;
        Ok(error)
    }

    /// Track `(epoch, error)`; an improvement overwrites the best
    /// checkpoint on disk.
    fn record_validation(&mut self, epoch: usize, error: f32) -> Result<()> {
        self.validation_error_history.push(error);
        if error < self.min_validation_error {
            self.min_validation_error = error;
            self.best_epoch = epoch;
            if let Some(parent) = self.config.best_model_path().parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.varmap.save(self.config.best_model_path())?;
        }
        Ok(())
    }

    /// Evaluate the test partition.
    ///
    /// Precision at k is computed per contiguous query block and
    /// averaged; rank correlations and the error are computed over the
    /// full pair sequence. The pair sequence must divide evenly into
    /// blocks of one-per-test-graph, or the layout is rejected.
    pub fn test(&self) -> Result<TestReport> {
        let pairs = self.dataset.test_graph_index_pairs();
        let block_size = self.dataset.test_graphs().len();
        if block_size == 0 || pairs.len() % block_size != 0 {
            return Err(Error::InvalidTestLayout {
                pairs: pairs.len(),
                block_size,
            });
        }

        let mut predictions = Vec::with_capacity(pairs.len());
        let mut targets = Vec::with_capacity(pairs.len());
        let mut errors = Vec::with_capacity(pairs.len());
        let mut block_predictions = Vec::with_capacity(block_size);
        let mut block_targets = Vec::with_capacity(block_size);
        let mut precisions_10 = Vec::new();
        let mut precisions_20 = Vec::new();

        for &pair in pairs {
            let (prediction, target) = self.predict(pair, Split::Test)?;
            errors.push(pair_loss(prediction, target, self.config.validation_metric));
            predictions.push(prediction);
            targets.push(target);
            block_predictions.push(prediction);
            block_targets.push(target);

            if block_predictions.len() == block_size {
                precisions_10.push(prec_at_ks(&block_targets, &block_predictions, 10));
                precisions_20.push(prec_at_ks(&block_targets, &block_predictions, 20));
                block_predictions.clear();
                block_targets.clear();
            }
        }

        let report = TestReport {
            model_error: mean(&errors),
            rho: spearman_rho(&targets, &predictions),
            tau: kendall_tau(&targets, &predictions),
            prec_at_10: mean(&precisions_10),
            prec_at_20: mean(&precisions_20),
            ground_truth_mean: mean(&targets),
            ground_truth_variance: variance(&targets),
            prediction_mean: mean(&predictions),
            prediction_variance: variance(&predictions),
        };
        info!(
            "test: error {:.6}, rho {:.4}, tau {:.4}, p@10 {:.4}, p@20 {:.4}",
            report.model_error, report.rho, report.tau, report.prec_at_10, report.prec_at_20
        );
        Ok(report)
    }

    /// Predict one pair; returns `(prediction, target)` scalars.
    pub fn predict(&self, pair: GraphIndexPair, split: Split) -> Result<(f32, f32)> {
        let record = self.dataset.get_data(pair, split)?;
        let data = self.dataset.to_tensors(&record, &self.config.device)?;
        let prediction = self.model.forward(&data)?;
        let prediction = prediction.flatten_all()?.to_vec1::<f32>()?[0];
        Ok((prediction, self.dataset.target(&record)))
    }

    /// Save the current parameters, to `path` or the configured
    /// checkpoint path.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let default = self.config.save_path();
        let path = path.unwrap_or(&default);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.varmap.save(path)?;
        Ok(())
    }

    /// Load parameters from the configured checkpoint path.
    pub fn load(&mut self) -> Result<()> {
        self.varmap.load(self.config.save_path())?;
        Ok(())
    }
}
