//! Tic-Tac-Toe board rules.
//!
//! Two boards are played in the arcade: the classic 3×3 board with
//! three-in-a-row, and the 5×5 "madness" board where four cells are blocked and
//! only a fixed set of four-cell lines win.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CLASSIC_LINES: &[&[usize]] = &[
    &[0, 1, 2],
    &[3, 4, 5],
    &[6, 7, 8],
    &[0, 3, 6],
    &[1, 4, 7],
    &[2, 5, 8],
    &[0, 4, 8],
    &[2, 4, 6],
];

const MADNESS_BLOCKED: &[usize] = &[4, 6, 15, 23];

const MADNESS_LINES: &[&[usize]] = &[
    &[0, 1, 2, 3],
    &[10, 11, 12, 13],
    &[11, 12, 13, 14],
    &[16, 17, 18, 19],
    &[1, 7, 13, 19],
    &[8, 12, 16, 20],
    &[9, 13, 17, 21],
    &[2, 7, 12, 17],
    &[7, 12, 17, 22],
    &[3, 8, 13, 18],
    &[9, 14, 19, 24],
];

/// Board errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("The game is already over")]
    GameOver,

    #[error("Cell {0} is outside the board")]
    OutOfRange(usize),

    #[error("Cell {0} is blocked")]
    Blocked(usize),

    #[error("Cell {0} is already taken")]
    Taken(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(&self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    Won(Mark),
    Draw,
}

/// Board variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// 3×3, three in a row
    Classic,
    /// 5×5 with blocked cells, four in a row
    Madness,
}

/// A board in play. Player 1 is X and moves first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    variant: Variant,
    cells: Vec<Option<Mark>>,
    turn: Mark,
}

impl Board {
    pub fn new(variant: Variant) -> Self {
        let size = match variant {
            Variant::Classic => 9,
            Variant::Madness => 25,
        };
        Self {
            variant,
            cells: vec![None; size],
            turn: Mark::X,
        }
    }

    pub fn classic() -> Self {
        Self::new(Variant::Classic)
    }

    pub fn madness() -> Self {
        Self::new(Variant::Madness)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Mark to play next
    pub fn turn(&self) -> Mark {
        self.turn
    }

    pub fn cells(&self) -> &[Option<Mark>] {
        &self.cells
    }

    pub fn blocked_cells(&self) -> &'static [usize] {
        match self.variant {
            Variant::Classic => &[],
            Variant::Madness => MADNESS_BLOCKED,
        }
    }

    pub fn is_blocked(&self, index: usize) -> bool {
        self.blocked_cells().contains(&index)
    }

    /// Place the current mark at `index` and pass the turn.
    pub fn play(&mut self, index: usize) -> Result<Outcome, BoardError> {
        if self.outcome() != Outcome::InProgress {
            return Err(BoardError::GameOver);
        }
        if index >= self.cells.len() {
            return Err(BoardError::OutOfRange(index));
        }
        if self.is_blocked(index) {
            return Err(BoardError::Blocked(index));
        }
        if self.cells[index].is_some() {
            return Err(BoardError::Taken(index));
        }

        self.cells[index] = Some(self.turn);
        self.turn = self.turn.other();
        Ok(self.outcome())
    }

    pub fn outcome(&self) -> Outcome {
        let lines = match self.variant {
            Variant::Classic => CLASSIC_LINES,
            Variant::Madness => MADNESS_LINES,
        };

        for line in lines {
            if line.iter().any(|&cell| self.is_blocked(cell)) {
                continue;
            }
            if let Some(mark) = self.cells[line[0]] {
                if line.iter().all(|&cell| self.cells[cell] == Some(mark)) {
                    return Outcome::Won(mark);
                }
            }
        }

        let free = (0..self.cells.len()).any(|i| self.cells[i].is_none() && !self.is_blocked(i));
        if free {
            Outcome::InProgress
        } else {
            Outcome::Draw
        }
    }

    /// Tournament points `(player1, player2)`: 1 for the winner, 0 otherwise.
    ///
    /// `None` while the game is still running.
    pub fn points(&self) -> Option<(u32, u32)> {
        match self.outcome() {
            Outcome::InProgress => None,
            Outcome::Won(Mark::X) => Some((1, 0)),
            Outcome::Won(Mark::O) => Some((0, 1)),
            Outcome::Draw => Some((0, 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_all(board: &mut Board, moves: &[usize]) -> Outcome {
        let mut outcome = board.outcome();
        for &index in moves {
            outcome = board.play(index).unwrap();
        }
        outcome
    }

    #[test]
    fn test_classic_row_win() {
        let mut board = Board::classic();
        // X: 0 1 2, O: 3 4
        let outcome = play_all(&mut board, &[0, 3, 1, 4, 2]);
        assert_eq!(outcome, Outcome::Won(Mark::X));
        assert_eq!(board.points(), Some((1, 0)));
        assert_eq!(board.play(8), Err(BoardError::GameOver));
    }

    #[test]
    fn test_classic_diagonal_for_o() {
        let mut board = Board::classic();
        let outcome = play_all(&mut board, &[0, 2, 1, 4, 8, 6]);
        assert_eq!(outcome, Outcome::Won(Mark::O));
        assert_eq!(board.points(), Some((0, 1)));
    }

    #[test]
    fn test_classic_draw() {
        let mut board = Board::classic();
        // X O X / X O O / O X X
        let outcome = play_all(&mut board, &[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert_eq!(outcome, Outcome::Draw);
        assert_eq!(board.points(), Some((0, 0)));
    }

    #[test]
    fn test_turns_alternate() {
        let mut board = Board::classic();
        assert_eq!(board.turn(), Mark::X);
        board.play(4).unwrap();
        assert_eq!(board.turn(), Mark::O);
        assert_eq!(board.cells()[4], Some(Mark::X));
        assert!(board.points().is_none());
    }

    #[test]
    fn test_invalid_moves() {
        let mut board = Board::classic();
        board.play(0).unwrap();
        assert_eq!(board.play(0), Err(BoardError::Taken(0)));
        assert_eq!(board.play(9), Err(BoardError::OutOfRange(9)));

        let mut madness = Board::madness();
        assert_eq!(madness.play(4), Err(BoardError::Blocked(4)));
        assert_eq!(madness.play(23), Err(BoardError::Blocked(23)));
        assert_eq!(madness.turn(), Mark::X);
    }

    #[test]
    fn test_madness_four_in_a_row() {
        let mut board = Board::madness();
        // X: 10 11 12 13, O: 0 1 2
        let outcome = play_all(&mut board, &[10, 0, 11, 1, 12, 2, 13]);
        assert_eq!(outcome, Outcome::Won(Mark::X));
    }

    #[test]
    fn test_madness_three_is_not_enough() {
        let mut board = Board::madness();
        // X takes 20 21 22 24 (not a winning line), O scatters
        let outcome = play_all(&mut board, &[20, 0, 21, 5, 22, 10, 24]);
        assert_eq!(outcome, Outcome::InProgress);
    }

    #[test]
    fn test_madness_draw_ignores_blocked_cells() {
        let mut board = Board::madness();
        let free: Vec<usize> = (0..25).filter(|i| !board.is_blocked(*i)).collect();
        assert_eq!(free.len(), 21);

        // Fill every free cell, alternating, as long as nobody wins
        for index in free {
            if board.outcome() != Outcome::InProgress {
                break;
            }
            board.play(index).unwrap();
        }
        assert_ne!(board.outcome(), Outcome::InProgress);
    }
}
