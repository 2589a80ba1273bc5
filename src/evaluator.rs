//! Static scoring of positions the search stops at without a result
//!
//! The score rewards pieces in the centre column and open lines of four,
//! and penalises lines the opponent is one piece away from completing.
//! Scores are reported on a fixed axis where positive is good for player
//! one, so results for both players can be compared by the search.

use crate::{
    board::{BoardState, Cell, Player, Window, WINDOWS},
    HEIGHT, WIDTH,
};

/// Points per own piece in the centre column
pub const CENTER_WEIGHT: i32 = 10;
/// Window with three own pieces and one empty cell
pub const THREE_BONUS: i32 = 5;
/// Window with two own pieces and two empty cells
pub const TWO_BONUS: i32 = 2;
/// Window with three opponent pieces and one empty cell
pub const OPPONENT_THREE_PENALTY: i32 = 4;
/// Extra penalty for an open opponent three on a diagonal
pub const DIAGONAL_THREAT_PENALTY: i32 = 100;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct WindowCounts {
    own: usize,
    opponent: usize,
    empty: usize,
}

impl WindowCounts {
    fn of(cells: &[Cell; WIDTH * HEIGHT], window: &Window, own: Cell) -> Self {
        let mut counts = Self {
            own: 0,
            opponent: 0,
            empty: 0,
        };
        for &i in window.cells.iter() {
            match cells[i] {
                Cell::Empty => counts.empty += 1,
                cell if cell == own => counts.own += 1,
                _ => counts.opponent += 1,
            }
        }
        counts
    }

    fn score(self) -> i32 {
        match (self.own, self.opponent, self.empty) {
            (3, 0, 1) => THREE_BONUS,
            (2, 0, 2) => TWO_BONUS,
            (0, 3, 1) => -OPPONENT_THREE_PENALTY,
            _ => 0,
        }
    }

    fn is_opponent_threat(self) -> bool {
        self.opponent == 3 && self.empty == 1
    }
}

/// Scores the board from the point of view of `player`, higher is better for them
pub fn position_score(board: &BoardState, player: Player) -> i32 {
    let own = player.cell();
    let cells = board.cells();

    let center = (0..HEIGHT)
        .filter(|&row| board.cell(row, WIDTH / 2) == own)
        .count() as i32;
    let mut score = center * CENTER_WEIGHT;

    for window in WINDOWS.iter() {
        let counts = WindowCounts::of(cells, window, own);
        score += counts.score();
        // open opponent diagonals are penalised on top of the table
        if window.direction.is_diagonal() && counts.is_opponent_threat() {
            score -= DIAGONAL_THREAT_PENALTY;
        }
    }
    score
}

/// Scores the board from the point of view of `player`, on player one's axis
pub fn score(board: &BoardState, player: Player) -> i32 {
    let score = position_score(board, player);
    if player.is_maximizing() {
        score
    } else {
        -score
    }
}
