//! Optimize-then-evaluate driver.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use kqbit_compile::{PassManager, PassManagerBuilder, PassReport};
use kqbit_ir::Node;

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::evaluator::Evaluator;
use crate::statevector::Statevector;

/// Outcome of [`Simulator::run`].
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Final state, starting from `|0…0⟩`.
    pub state: Statevector,
    /// Node counts recorded by the optimizer.
    pub report: PassReport,
    /// Wall time spent optimizing and evaluating.
    pub elapsed: Duration,
}

/// Optimizes trees at the configured level and evaluates them.
pub struct Simulator {
    config: SimConfig,
    passes: PassManager,
    evaluator: Evaluator,
}

impl Simulator {
    /// Create a simulator with the default configuration.
    pub fn new() -> Self {
        let config = SimConfig::default();
        Self {
            passes: pass_manager(&config),
            evaluator: Evaluator::new(&config),
            config,
        }
    }

    /// Create a simulator from a validated configuration.
    pub fn with_config(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            passes: pass_manager(&config),
            evaluator: Evaluator::new(&config),
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The passes run before evaluation.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.pass_names()
    }

    /// Optimize `tree` and apply it to `|0…0⟩`.
    ///
    /// The qubit limit is checked before any pass runs, so oversized trees
    /// fail without being rewritten.
    #[instrument(skip(self, tree), fields(qubits = tree.num_qubits()))]
    pub fn run(&self, tree: Node) -> SimResult<SimulationResult> {
        let start = Instant::now();

        if self.config.validate_trees {
            tree.validate()?;
        }
        self.evaluator.check_size(&tree)?;

        let (optimized, report) = self.passes.run_with_report(tree);
        debug!(
            initial_nodes = report.initial_nodes,
            final_nodes = report.final_nodes,
            depth = report.final_depth,
            "Tree optimized"
        );

        let state = self.evaluator.compute_statevector(&optimized)?;
        let elapsed = start.elapsed();
        info!("Simulation completed in {:?}", elapsed);

        Ok(SimulationResult {
            state,
            report,
            elapsed,
        })
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

fn pass_manager(config: &SimConfig) -> PassManager {
    PassManagerBuilder::new()
        .with_optimization_level(config.optimization_level)
        .with_max_fused_qubits(config.max_fused_qubits)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use kqbit_ir::{CircuitTree, identity_tree};

    #[test]
    fn test_default_pipeline() {
        let sim = Simulator::new();
        assert_eq!(sim.pass_names().len(), 7);
        assert_eq!(sim.config().optimization_level, 2);
    }

    #[test]
    fn test_run_bell() {
        let result = Simulator::new().run(CircuitTree::bell().into_root()).unwrap();
        let probs = result.state.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-10);
        assert!((probs[3] - 0.5).abs() < 1e-10);
        assert!(result.report.final_nodes < result.report.initial_nodes);
    }

    #[test]
    fn test_level_zero_skips_passes() {
        let config = SimConfig::default().with_optimization_level(0);
        let sim = Simulator::with_config(config).unwrap();
        assert!(sim.pass_names().is_empty());
        let result = sim.run(CircuitTree::ghz(3).into_root()).unwrap();
        assert_eq!(result.report.initial_nodes, result.report.final_nodes);
        assert!(result.report.passes.is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimConfig::default().with_optimization_level(9);
        assert!(matches!(
            Simulator::with_config(config),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_size_checked_before_optimizing() {
        let config = SimConfig::default().with_max_qubits(3);
        let sim = Simulator::with_config(config).unwrap();
        let err = sim.run(identity_tree(4)).unwrap_err();
        assert!(matches!(
            err,
            SimError::TooManyQubits {
                requested: 4,
                max: 3
            }
        ));
    }
}
