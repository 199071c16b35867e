//! End-to-end runs over a small synthetic dataset.

use std::collections::HashMap;

use candle_core::Device;
use gedsim::{GedSimTrainer, GedsimConfig};
use gedsim_core::{GedDataset, LabeledGraph, Split};

fn cycle_graph(n: usize) -> LabeledGraph {
    let labels = (0..n).map(|i| i % 3).collect();
    let edges = (0..n).map(|i| (i, (i + 1) % n, i % 2)).collect();
    LabeledGraph::new(labels, edges)
}

fn synthetic_dataset(validation_fraction: f32) -> GedDataset {
    let train = vec![cycle_graph(3), cycle_graph(4), cycle_graph(5), cycle_graph(6)];
    let test = vec![cycle_graph(4), cycle_graph(5), cycle_graph(7)];
    let total = train.len() + test.len();

    // Size difference as a stand-in edit distance.
    let sizes: Vec<usize> = train
        .iter()
        .chain(test.iter())
        .map(|g| g.node_count())
        .collect();
    let mut ged = HashMap::new();
    for i in 0..total {
        for j in 0..total {
            ged.insert((i, j), (sizes[i] as f32 - sizes[j] as f32).abs());
        }
    }
    GedDataset::new(train, test, ged, validation_fraction).unwrap()
}

fn small_config(model_root: &std::path::Path) -> GedsimConfig {
    GedsimConfig::default()
        .with_device(Device::Cpu)
        .with_hidden_size(8)
        .with_tensor_network(true, 8)
        .with_histogram(true, 8)
        .with_bottle_neck_neurons(8)
        .with_batch_size(8)
        .with_epochs(2)
        .with_learning_rate(0.01)
        .with_paths("datasets", "synthetic", model_root, "synthetic.safetensors")
}

#[test]
fn histogram_only_model_predicts_in_unit_interval() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path())
        .with_tensor_network(false, 0)
        .with_validate(false);
    let trainer = GedSimTrainer::new(config, synthetic_dataset(0.0)).unwrap();
    assert_eq!(trainer.model().feature_count(), 8);

    for &pair in trainer.dataset().training_graph_index_pairs() {
        let (prediction, target) = trainer.predict(pair, Split::Training).unwrap();
        assert!(prediction > 0.0 && prediction < 1.0);
        assert!(target > 0.0 && target <= 1.0);
    }
}

#[test]
fn training_reduces_loss_history_to_finite_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path()).with_node_graph_matching(true);
    let mut trainer = GedSimTrainer::new(config, synthetic_dataset(0.25)).unwrap();

    trainer.train().unwrap();
    assert_eq!(trainer.epoch_loss_history().len(), 2);
    assert!(trainer.epoch_loss_history().iter().all(|l| l.is_finite()));
    assert_eq!(trainer.validation_error_history().len(), 2);
    assert!(trainer.config().best_model_path().exists());
}

#[test]
fn test_partition_evaluates_per_query_block() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path()).with_validate(false);
    let trainer = GedSimTrainer::new(config, synthetic_dataset(0.0)).unwrap();

    // Three test graphs give three blocks of three pairs each.
    assert_eq!(trainer.dataset().test_graph_index_pairs().len(), 9);
    let report = trainer.test().unwrap();
    assert!(report.model_error.is_finite());
    assert!((0.0..=1.0).contains(&report.prec_at_10));
    assert!((0.0..=1.0).contains(&report.prec_at_20));
    assert!(report.rho.abs() <= 1.0 + 1e-9);
    assert!(report.tau.abs() <= 1.0 + 1e-9);
}

#[test]
fn saved_model_reloads_with_identical_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path()).with_epochs(1).with_validate(false);
    let mut trainer = GedSimTrainer::new(config.clone(), synthetic_dataset(0.0)).unwrap();
    trainer.train().unwrap();
    trainer.save(None).unwrap();

    let pair = (0, 3);
    let (trained, _) = trainer.predict(pair, Split::Training).unwrap();

    let mut fresh = GedSimTrainer::new(config, synthetic_dataset(0.0)).unwrap();
    fresh.load().unwrap();
    let (reloaded, _) = fresh.predict(pair, Split::Training).unwrap();
    assert!((trained - reloaded).abs() < 1e-6);
}
