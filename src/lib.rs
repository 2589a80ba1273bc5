//! A depth-limited agent for playing the board game 'Connect 4'
//!
//! This agent uses a minimax game tree search with alpha-beta pruning,
//! a positional heuristic for the positions where the search stops, and a
//! transposition cache that remembers positions it has already evaluated.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_minimax::{board::BoardState, search::choose_move, transposition_table::TranspositionCache};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let board = BoardState::from_moves("172736")?;
//! let mut cache = TranspositionCache::new();
//! let result = choose_move(&board, 2, true, &mut cache);
//!
//! assert_eq!(result.column, Some(3));
//! assert_eq!(result.score, connect4_minimax::WIN_SCORE);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod board;

pub mod evaluator;

pub mod transposition_table;

pub mod cache_file;

pub mod search;


pub use board::{BoardError, BoardState, Cell, Player};
pub use search::{choose_move, parallel_choose_move, Searcher};
pub use transposition_table::{Fingerprint, SearchResult, TranspositionCache};

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

/// Score of a position that player one has won
pub const WIN_SCORE: i32 = 99_999;

/// Score of a position that player two has won
pub const LOSS_SCORE: i32 = -WIN_SCORE;

/// Score of a full board with no winner
pub const DRAW_SCORE: i32 = 0;

// the fingerprint packs 2 bits per cell into a u128
const_assert!(2 * WIDTH * HEIGHT <= 128);
// the cache codec stores columns (and the "no column" marker) in a byte
const_assert!(WIDTH < u8::MAX as usize);
// a window of four has to fit in both directions
const_assert!(WIDTH >= 4 && HEIGHT >= 4);
