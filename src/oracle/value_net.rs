use std::fs;
use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::encoding::{encode_candidates, game_positions, to_tensor};
use super::network::{ValueNetwork, ValueNetworkConfig};
use super::{ScoringOracle, TrainReport};
use crate::error::OracleError;
use crate::game::{Board, Move, Player};
use crate::training::replay_buffer::{LabeledPosition, ReplayBuffer};

type InferBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferBackend>;

const WEIGHTS_FILE: &str = "value_network";
const STATE_FILE: &str = "training_state.json";

/// Value network hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    pub max_iterations: usize,
    pub error_threshold: f32,
    pub batch_size: usize,
    pub replay_capacity: usize,
    pub seed: Option<u64>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            hidden_layers: vec![15, 15],
            learning_rate: 1e-2,
            max_iterations: 200,
            error_threshold: 0.005,
            batch_size: 64,
            replay_capacity: 20_000,
            seed: None,
        }
    }
}

/// Persisted alongside the weights so a resumed oracle keeps its counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueNetTrainingState {
    pub board_size: usize,
    pub games_trained: usize,
    pub step_count: usize,
    pub config: OracleConfig,
}

/// Scores a move by the estimated probability that its player goes on to win
/// from the resulting position.
pub struct ValueNetOracle {
    network: ValueNetwork<TrainBackend>,
    inference: ValueNetwork<InferBackend>,
    optimizer: burn::optim::adaptor::OptimizerAdaptor<burn::optim::Adam, ValueNetwork<TrainBackend>, TrainBackend>,
    replay_buffer: ReplayBuffer,
    config: OracleConfig,
    board_size: usize,
    device: <TrainBackend as Backend>::Device,
    games_trained: usize,
    step_count: usize,
}

impl ValueNetOracle {
    pub fn new(config: OracleConfig, board_size: usize) -> Self {
        let device = Default::default();
        let network: ValueNetwork<TrainBackend> = Self::network_config(&config, board_size).init(&device);
        let inference = network.valid();
        let optimizer = AdamConfig::new().init();
        let replay_buffer = match config.seed {
            Some(seed) => ReplayBuffer::with_seed(config.replay_capacity, seed),
            None => ReplayBuffer::new(config.replay_capacity),
        };

        ValueNetOracle {
            network,
            inference,
            optimizer,
            replay_buffer,
            config,
            board_size,
            device,
            games_trained: 0,
            step_count: 0,
        }
    }

    fn network_config(config: &OracleConfig, board_size: usize) -> ValueNetworkConfig {
        ValueNetworkConfig {
            inputs: board_size * board_size,
            hidden_layers: config.hidden_layers.clone(),
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    /// Estimated probability that X wins from each of `positions`.
    pub fn evaluate(&self, positions: &[Vec<f32>]) -> Vec<f32> {
        if positions.is_empty() {
            return Vec::new();
        }
        let width = self.board_size * self.board_size;
        let flat: Vec<f32> = positions.iter().flatten().copied().collect();
        let input = to_tensor::<InferBackend>(&flat, positions.len(), width, &self.device);
        self.inference
            .forward(input)
            .into_data()
            .to_vec()
            .expect("f32 tensor data extraction")
    }

    pub fn training_state(&self) -> ValueNetTrainingState {
        ValueNetTrainingState {
            board_size: self.board_size,
            games_trained: self.games_trained,
            step_count: self.step_count,
            config: self.config.clone(),
        }
    }

    /// One Adam step on a minibatch. Returns the MSE before the update.
    fn train_step(&mut self, batch: &[LabeledPosition]) -> f32 {
        let width = self.board_size * self.board_size;
        let mut features = Vec::with_capacity(batch.len() * width);
        let mut targets = Vec::with_capacity(batch.len());
        for sample in batch {
            features.extend_from_slice(&sample.features);
            targets.push(sample.target);
        }

        let inputs = to_tensor::<TrainBackend>(&features, batch.len(), width, &self.device);
        let targets = to_tensor::<TrainBackend>(&targets, batch.len(), 1, &self.device);

        let error = self.network.forward(inputs) - targets;
        let loss = (error.clone() * error).mean();
        let loss_value: f32 = loss
            .clone()
            .into_data()
            .to_vec::<f32>()
            .expect("f32 loss extraction")[0];

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optimizer
            .step(self.config.learning_rate, self.network.clone(), grads);
        self.step_count += 1;

        loss_value
    }
}

/// X wins with probability `p`; O's view is the complement.
fn mover_score(player: Player, p: f32) -> f32 {
    match player {
        Player::X => p,
        Player::O => 1.0 - p,
    }
}

impl ScoringOracle for ValueNetOracle {
    fn name(&self) -> &str {
        "ValueNet"
    }

    fn is_trained(&self) -> bool {
        self.games_trained > 0
    }

    fn score(&self, board: &Board, candidate: &Move) -> f32 {
        self.score_all(board, std::slice::from_ref(candidate))[0]
    }

    fn score_all(&self, board: &Board, candidates: &[Move]) -> Vec<f32> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let input = encode_candidates::<InferBackend>(board, candidates, &self.device);
        let values: Vec<f32> = self
            .inference
            .forward(input)
            .into_data()
            .to_vec()
            .expect("f32 tensor data extraction");
        candidates
            .iter()
            .zip(values)
            .map(|(m, p)| mover_score(m.player, p))
            .collect()
    }

    fn train(&mut self, board: &Board) -> Result<TrainReport, OracleError> {
        self.check_board(board)?;
        let outcome = board.status().outcome().ok_or(OracleError::UnfinishedGame)?;
        let target = outcome.x_value();

        let positions = game_positions(board);
        let samples = positions.len();
        for features in positions {
            self.replay_buffer.push(LabeledPosition { features, target });
        }

        let mut report = TrainReport {
            samples,
            ..TrainReport::default()
        };
        if self.replay_buffer.is_empty() {
            return Ok(report);
        }

        let batch_size = self.config.batch_size.min(self.replay_buffer.len());
        while report.iterations < self.config.max_iterations {
            let batch = self.replay_buffer.sample(batch_size);
            report.loss = self.train_step(&batch);
            report.iterations += 1;
            if report.loss < self.config.error_threshold {
                break;
            }
        }

        self.inference = self.network.valid();
        self.games_trained += 1;
        debug!(
            outcome = ?outcome,
            samples,
            iterations = report.iterations,
            loss = report.loss,
            "oracle trained"
        );
        Ok(report)
    }

    fn check_board(&self, board: &Board) -> Result<(), OracleError> {
        if board.size() != self.board_size {
            return Err(OracleError::BoardSizeMismatch {
                expected: self.board_size,
                actual: board.size(),
            });
        }
        Ok(())
    }

    fn games_trained(&self) -> usize {
        self.games_trained
    }

    fn save_to_dir(&self, dir: &Path) -> Result<(), OracleError> {
        let recorder = DefaultRecorder::default();
        self.network
            .clone()
            .valid()
            .save_file(dir.join(WEIGHTS_FILE), &recorder)
            .map_err(|e| OracleError::Weights(e.to_string()))?;
        let json = serde_json::to_string_pretty(&self.training_state())?;
        fs::write(dir.join(STATE_FILE), json)?;
        Ok(())
    }

    /// Restores weights and counters. The saved layer shape replaces the
    /// configured one because the weights depend on it; every training
    /// setting keeps its configured value.
    fn load_from_dir(&mut self, dir: &Path) -> Result<(), OracleError> {
        let json = fs::read_to_string(dir.join(STATE_FILE))?;
        let state: ValueNetTrainingState = serde_json::from_str(&json)?;
        if state.board_size != self.board_size {
            return Err(OracleError::BoardSizeMismatch {
                expected: self.board_size,
                actual: state.board_size,
            });
        }

        let recorder = DefaultRecorder::default();
        let network: ValueNetwork<TrainBackend> = Self::network_config(&state.config, state.board_size)
            .init(&self.device)
            .load_file(dir.join(WEIGHTS_FILE), &recorder, &self.device)
            .map_err(|e| OracleError::Weights(e.to_string()))?;

        self.inference = network.valid();
        self.network = network;
        self.optimizer = AdamConfig::new().init();
        self.games_trained = state.games_trained;
        self.step_count = state.step_count;
        if state.config != self.config {
            warn!(
                saved = ?state.config,
                configured = ?self.config,
                "checkpoint oracle settings differ from configuration, keeping configured training settings"
            );
        }
        self.config.hidden_layers = state.config.hidden_layers;
        Ok(())
    }
}
