use anyhow::Result;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};
use thiserror::Error;

use std::fmt;
use std::io::Write;

use crate::{transposition_table::Fingerprint, HEIGHT, WIDTH};

/// One of the two sides of the game
///
/// `One` is the maximizing side of the search, `Two` the minimizing side.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub fn cell(self) -> Cell {
        match self {
            Player::One => Cell::PlayerOne,
            Player::Two => Cell::PlayerTwo,
        }
    }

    /// The player whose turn it is in a search node with the given flag
    pub fn from_maximizing(maximizing: bool) -> Self {
        if maximizing {
            Player::One
        } else {
            Player::Two
        }
    }

    pub fn is_maximizing(self) -> bool {
        self == Player::One
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => write!(f, "player 1"),
            Player::Two => write!(f, "player 2"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Cell {
    PlayerOne,
    PlayerTwo,
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            _ => false,
        }
    }

    // 2-bit code used by the fingerprint, 0 must stay reserved for empty
    fn code(self) -> Fingerprint {
        match self {
            Cell::Empty => 0b00,
            Cell::PlayerOne => 0b01,
            Cell::PlayerTwo => 0b10,
        }
    }
}

/// Contract violations of the board layer
#[derive(Error, Copy, Clone, Eq, PartialEq, Debug)]
pub enum BoardError {
    #[error("column {column} out of range, columns must be below {width}", width = WIDTH)]
    InvalidColumn { column: usize },

    #[error("column {column} is full")]
    ColumnFull { column: usize },

    #[error("could not parse '{character}' as a valid move")]
    Unparseable { character: char },

    #[error("the game is already over")]
    GameOver,
}

/// The four orientations a line of four can take
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Direction {
    Horizontal,
    Vertical,
    /// bottom-left to top-right
    DiagonalUp,
    /// top-left to bottom-right
    DiagonalDown,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::DiagonalUp,
        Direction::DiagonalDown,
    ];

    // (columns, rows) moved per step
    const fn step(self) -> (isize, isize) {
        match self {
            Direction::Horizontal => (1, 0),
            Direction::Vertical => (0, 1),
            Direction::DiagonalUp => (1, 1),
            Direction::DiagonalDown => (1, -1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        match self {
            Direction::DiagonalUp | Direction::DiagonalDown => true,
            _ => false,
        }
    }
}

/// Four consecutive cells lying entirely on the board
#[derive(Copy, Clone, Debug)]
pub struct Window {
    pub direction: Direction,
    /// cell indices in storage order, see [`BoardState::index`]
    pub cells: [usize; 4],
}

/// The number of distinct lines of four on the board
pub const NUM_WINDOWS: usize =
    HEIGHT * (WIDTH - 3) + WIDTH * (HEIGHT - 3) + 2 * (WIDTH - 3) * (HEIGHT - 3);

/// Every line of four on the board, grouped by direction
pub static WINDOWS: [Window; NUM_WINDOWS] = all_windows();

const fn all_windows() -> [Window; NUM_WINDOWS] {
    let mut windows = [Window {
        direction: Direction::Horizontal,
        cells: [0; 4],
    }; NUM_WINDOWS];
    let mut n = 0;
    let mut d = 0;
    while d < 4 {
        let direction = Direction::ALL[d];
        let (dx, dy) = direction.step();
        let mut row = 0;
        while row < HEIGHT {
            let mut column = 0;
            while column < WIDTH {
                // only keep windows whose far end is still on the board
                let end_x = column as isize + 3 * dx;
                let end_y = row as isize + 3 * dy;
                if end_x >= 0 && end_x < WIDTH as isize && end_y >= 0 && end_y < HEIGHT as isize {
                    let mut cells = [0; 4];
                    let mut i = 0;
                    while i < 4 {
                        let x = column as isize + i as isize * dx;
                        let y = row as isize + i as isize * dy;
                        cells[i] = (x + WIDTH as isize * y) as usize;
                        i += 1;
                    }
                    windows[n] = Window { direction, cells };
                    n += 1;
                }
                column += 1;
            }
            row += 1;
        }
        d += 1;
    }
    windows
}

/// A Connect 4 grid
///
/// Pieces are always packed from the bottom of each column upwards, the only
/// way to change the grid is [`BoardState::drop`]. Cloning produces a fully
/// independent copy, which is what the search relies on to explore
/// hypothetical moves.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct BoardState {
    cells: [Cell; WIDTH * HEIGHT], // cells are stored left-to-right, bottom-to-top
    heights: [usize; WIDTH],
}

impl BoardState {
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; WIDTH * HEIGHT],
            heights: [0; WIDTH],
        }
    }

    /// Builds a board from a string of one-indexed columns, player one moving first
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self, BoardError> {
        let mut board = Self::new();
        let mut player = Player::One;

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    // abort if the position was already won
                    if board.winner().is_some() {
                        return Err(BoardError::GameOver);
                    }
                    board.drop(column - 1, player)?;
                    player = player.opponent();
                }
                _ => {
                    return Err(BoardError::Unparseable {
                        character: column_char,
                    })
                }
            }
        }
        Ok(board)
    }

    /// Storage index of a cell, row 0 being the bottom row
    pub const fn index(row: usize, column: usize) -> usize {
        column + WIDTH * row
    }

    pub fn cell(&self, row: usize, column: usize) -> Cell {
        self.cells[Self::index(row, column)]
    }

    pub(crate) fn cells(&self) -> &[Cell; WIDTH * HEIGHT] {
        &self.cells
    }

    /// The number of pieces in a column
    pub fn height(&self, column: usize) -> usize {
        self.heights[column]
    }

    pub fn num_moves(&self) -> usize {
        self.heights.iter().sum()
    }

    pub fn playable(&self, column: usize) -> bool {
        column < WIDTH && self.heights[column] < HEIGHT
    }

    /// Drops a piece into a column, returning the row it landed on
    pub fn drop(&mut self, column: usize, player: Player) -> Result<usize, BoardError> {
        if column >= WIDTH {
            return Err(BoardError::InvalidColumn { column });
        }
        let row = self.heights[column];
        if row >= HEIGHT {
            return Err(BoardError::ColumnFull { column });
        }
        self.cells[Self::index(row, column)] = player.cell();
        self.heights[column] += 1;
        Ok(row)
    }

    /// Every column that can still take a piece, in ascending order
    pub fn legal_moves(&self) -> Vec<usize> {
        (0..WIDTH).filter(|&column| self.playable(column)).collect()
    }

    pub fn is_full(&self) -> bool {
        self.heights.iter().all(|&height| height == HEIGHT)
    }

    /// Whether the player has four or more pieces in a line
    pub fn check_win(&self, player: Player) -> bool {
        let cell = player.cell();
        WINDOWS
            .iter()
            .any(|window| window.cells.iter().all(|&i| self.cells[i] == cell))
    }

    /// The winning player, player one taking precedence if both have a line
    pub fn winner(&self) -> Option<Player> {
        if self.check_win(Player::One) {
            Some(Player::One)
        } else if self.check_win(Player::Two) {
            Some(Player::Two)
        } else {
            None
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }

    /// The player to move next, assuming player one moved first
    pub fn side_to_move(&self) -> Player {
        let ones = self
            .cells
            .iter()
            .filter(|&&cell| cell == Cell::PlayerOne)
            .count();
        let twos = self
            .cells
            .iter()
            .filter(|&&cell| cell == Cell::PlayerTwo)
            .count();
        if ones > twos {
            Player::Two
        } else {
            Player::One
        }
    }

    /// Canonical 2-bit-per-cell encoding of the whole grid
    pub fn fingerprint(&self) -> Fingerprint {
        self.cells
            .iter()
            .enumerate()
            .fold(0, |fingerprint, (i, cell)| fingerprint | cell.code() << (2 * i))
    }

    /// Draws the board with coloured pieces, top row first
    pub fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        for row in (0..HEIGHT).rev() {
            for column in 0..WIDTH {
                out.queue(PrintStyledContent(
                    style("O")
                        .attribute(Attribute::Bold)
                        .on(Color::DarkBlue)
                        .with(match self.cell(row, column) {
                            Cell::PlayerOne => Color::Red,
                            Cell::PlayerTwo => Color::Yellow,
                            Cell::Empty => Color::DarkBlue,
                        }),
                ))?;
            }
            out.queue(PrintStyledContent(style("\n")))?;
        }
        let cols: String = (1..=WIDTH).map(|x| x.to_string()).collect();
        out.queue(PrintStyledContent(style(cols + "\n")))?;
        out.flush()?;
        Ok(())
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            for column in 0..WIDTH {
                let symbol = match self.cell(row, column) {
                    Cell::PlayerOne => 'X',
                    Cell::PlayerTwo => 'O',
                    Cell::Empty => '.',
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
