use serde::{Deserialize, Serialize};

use crate::{
    domain::{Cell, GridId, RunId},
    error::GridFault,
};

/// Operation requested by a UI for one grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GridCommand {
    Reset,
    FlipCorners { fps: f64 },
    Clockwise { fps: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Pushed to observers in the order the grid timeline applied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GridEvent {
    RunStarted {
        grid_id: GridId,
        run_id: RunId,
        steps: usize,
        ticks_per_second: f64,
    },
    CellUpdated {
        grid_id: GridId,
        run_id: RunId,
        step: usize,
        cell: Cell,
    },
    RunCompleted {
        grid_id: GridId,
        run_id: RunId,
    },
    RunCancelled {
        grid_id: GridId,
        run_id: RunId,
        applied_steps: usize,
    },
    GridReset {
        grid_id: GridId,
    },
    OperationFailed {
        grid_id: GridId,
        fault: GridFault,
    },
}

impl GridEvent {
    pub fn grid_id(&self) -> GridId {
        match self {
            Self::RunStarted { grid_id, .. }
            | Self::CellUpdated { grid_id, .. }
            | Self::RunCompleted { grid_id, .. }
            | Self::RunCancelled { grid_id, .. }
            | Self::GridReset { grid_id }
            | Self::OperationFailed { grid_id, .. } => *grid_id,
        }
    }

    pub fn run_id(&self) -> Option<RunId> {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::CellUpdated { run_id, .. }
            | Self::RunCompleted { run_id, .. }
            | Self::RunCancelled { run_id, .. } => Some(*run_id),
            Self::GridReset { .. } | Self::OperationFailed { .. } => None,
        }
    }
}

/// Read-only copy of a grid, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub grid_id: GridId,
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<Cell>,
}

impl GridSnapshot {
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }

    pub fn highlighted_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_pristine()).count()
    }
}
