//! Coordinate orderings over a rectangular region: the clockwise inward spiral
//! and the corner selection.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use shared::{
    domain::Coordinate,
    error::{ErrorCode, GridFault},
};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TraversalError {
    #[error("cannot traverse an empty {rows}x{columns} region")]
    EmptyRegion { rows: usize, columns: usize },
    #[error("expected: {expected} and got: {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

impl From<&TraversalError> for GridFault {
    fn from(value: &TraversalError) -> Self {
        let code = match value {
            TraversalError::EmptyRegion { .. } => ErrorCode::EmptyRegion,
            TraversalError::CountMismatch { .. } => ErrorCode::CountMismatch,
        };
        GridFault::new(code, value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(name)
    }
}

/// Traversal cursor: a bounding box (`max_*` exclusive), a position inside it
/// and the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub min_row: usize,
    pub max_row: usize,
    pub min_column: usize,
    pub max_column: usize,
    pub row: usize,
    pub column: usize,
    pub direction: Direction,
}

impl Move {
    /// Cursor at `(0, 0)` heading right over the full `rows x columns` box.
    pub fn start(rows: usize, columns: usize) -> Self {
        Self {
            min_row: 0,
            max_row: rows,
            min_column: 0,
            max_column: columns,
            row: 0,
            column: 0,
            direction: Direction::Right,
        }
    }

    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.row, self.column)
    }

    fn can_move_right(&self) -> bool {
        self.column + 1 < self.max_column
    }

    fn can_move_left(&self) -> bool {
        self.column > self.min_column
    }

    // Stops one short of `min_row`: the top edge of the box is consumed by the
    // initial rightward pass.
    fn can_move_up(&self) -> bool {
        self.row > self.min_row + 1
    }

    fn can_move_down(&self) -> bool {
        self.row + 1 < self.max_row
    }

    fn inset(&self) -> Self {
        let min_row = self.min_row + 1;
        let min_column = self.min_column + 1;
        Self {
            min_row,
            max_row: self.max_row - 1,
            min_column,
            max_column: self.max_column - 1,
            row: min_row,
            column: min_column,
            direction: Direction::Right,
        }
    }

    /// Next step of the clockwise spiral. Returns `self` unchanged once no
    /// further movement is possible.
    pub fn next_clockwise(self) -> Self {
        let mut candidate = self;
        let next = loop {
            match candidate.direction {
                Direction::Right => {
                    if candidate.can_move_right() {
                        candidate.column += 1;
                        break candidate;
                    }
                    if !candidate.can_move_down() {
                        break self;
                    }
                    candidate.direction = Direction::Down;
                }
                Direction::Down => {
                    if candidate.can_move_down() {
                        candidate.row += 1;
                        break candidate;
                    }
                    if !candidate.can_move_left() {
                        break self;
                    }
                    candidate.direction = Direction::Left;
                }
                Direction::Left => {
                    if candidate.can_move_left() {
                        candidate.column -= 1;
                        break candidate;
                    }
                    if !candidate.can_move_up() {
                        break self;
                    }
                    candidate.direction = Direction::Up;
                }
                Direction::Up => {
                    if candidate.can_move_up() {
                        candidate.row -= 1;
                        break candidate;
                    }
                    if candidate.min_row >= candidate.max_row {
                        break self;
                    }
                    let inset = candidate.inset();
                    if inset.column >= inset.max_column || inset.row >= inset.max_row {
                        break self;
                    }
                    break inset;
                }
            }
        };

        if next == self {
            trace!(position = %self.position(), "spiral: unable to move");
        } else {
            trace!(
                from = %self.position(),
                to = %next.position(),
                direction = %next.direction,
                "spiral: moved"
            );
        }
        next
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, direction: {}", self.position(), self.direction)
    }
}

/// Iterator over the clockwise inward spiral of a rectangle, starting at `(0, 0)`.
#[derive(Debug, Clone)]
pub struct SpiralTraversal {
    current: Move,
    started: bool,
    finished: bool,
}

impl SpiralTraversal {
    pub fn new(rows: usize, columns: usize) -> Result<Self, TraversalError> {
        if rows == 0 || columns == 0 {
            return Err(TraversalError::EmptyRegion { rows, columns });
        }
        Ok(Self {
            current: Move::start(rows, columns),
            started: false,
            finished: false,
        })
    }

    pub fn cursor(&self) -> Move {
        self.current
    }
}

impl Iterator for SpiralTraversal {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.current.position());
        }

        let next = self.current.next_clockwise();
        if next == self.current {
            self.finished = true;
            return None;
        }
        self.current = next;
        Some(next.position())
    }
}

/// Full spiral order for a `rows x columns` grid, checked to cover every
/// coordinate exactly once.
pub fn spiral_order(rows: usize, columns: usize) -> Result<Vec<Coordinate>, TraversalError> {
    let expected = rows * columns;
    // One extra step is enough to detect an overrun without looping forever.
    let order: Vec<Coordinate> = SpiralTraversal::new(rows, columns)?
        .take(expected + 1)
        .collect();

    let distinct = order.iter().collect::<HashSet<_>>().len();
    if order.len() != expected || distinct != expected {
        return Err(TraversalError::CountMismatch {
            expected,
            actual: order.len(),
        });
    }
    Ok(order)
}

pub fn is_corner(coordinate: Coordinate, rows: usize, columns: usize) -> bool {
    let corner_row = coordinate.row == 0 || coordinate.row + 1 == rows;
    let corner_column = coordinate.column == 0 || coordinate.column + 1 == columns;
    corner_row && corner_column
}

/// Coordinates on both a boundary row and a boundary column, in row-major order.
/// A single row or column counts as a boundary on both sides, so grids no
/// larger than 2x2 select every cell.
pub fn corner_coordinates(rows: usize, columns: usize) -> Result<Vec<Coordinate>, TraversalError> {
    if rows == 0 || columns == 0 {
        return Err(TraversalError::EmptyRegion { rows, columns });
    }
    Ok((0..rows)
        .flat_map(|row| (0..columns).map(move |column| Coordinate::new(row, column)))
        .filter(|coordinate| is_corner(*coordinate, rows, columns))
        .collect())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
