use burn::prelude::*;
use burn::tensor::TensorData;

use crate::game::{Board, Move};

/// Feature value of an empty cell; occupied cells take `Player::value()`.
pub const EMPTY_CELL: f32 = 0.5;

/// Encode a board as one feature per cell in row-major order.
pub fn encode_board(board: &Board) -> Vec<f32> {
    board
        .cells()
        .iter()
        .map(|cell| cell.map_or(EMPTY_CELL, |p| p.value()))
        .collect()
}

/// Encode the position that would follow `candidate` (S_{t+1}).
pub fn encode_after(board: &Board, candidate: &Move) -> Vec<f32> {
    let mut features = encode_board(board);
    features[candidate.y * board.size() + candidate.x] = candidate.player_value();
    features
}

/// Encode every position of a game, one per move, in play order.
pub fn game_positions(board: &Board) -> Vec<Vec<f32>> {
    let size = board.size();
    let mut features = vec![EMPTY_CELL; size * size];
    board
        .moves()
        .iter()
        .map(|m| {
            features[m.y * size + m.x] = m.player_value();
            features.clone()
        })
        .collect()
}

/// Encode all candidate successor positions as a `[candidates, cells]` batch.
pub fn encode_candidates<B: Backend>(
    board: &Board,
    candidates: &[Move],
    device: &B::Device,
) -> Tensor<B, 2> {
    let width = board.size() * board.size();
    let mut flat = Vec::with_capacity(candidates.len() * width);
    for candidate in candidates {
        flat.extend_from_slice(&encode_after(board, candidate));
    }
    to_tensor(&flat, candidates.len(), width, device)
}

/// Reshape a flat feature buffer into a `[rows, width]` tensor.
pub fn to_tensor<B: Backend>(flat: &[f32], rows: usize, width: usize, device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 2>::from_data(TensorData::new(flat.to_vec(), [rows, width]), device)
}
