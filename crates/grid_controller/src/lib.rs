//! Orchestration surface consumed by UIs: builds the grid, derives coordinate
//! orders and hands them to the sequencer, cancelling any prior run first.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use matrix::{Matrix, MatrixError};
use sequencer::{cadence_period, AnimationSequencer, RunHandle, SequencerError};
use shared::{
    domain::{Cell, Coordinate, GridId, RunId},
    error::GridFault,
    protocol::{GridCommand, GridEvent, GridSnapshot},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};
use traversal::{corner_coordinates, spiral_order, TraversalError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error(transparent)]
    Traversal(#[from] TraversalError),
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

impl From<&GridError> for GridFault {
    fn from(value: &GridError) -> Self {
        match value {
            GridError::Matrix(source) => GridFault::from(source),
            GridError::Traversal(source) => GridFault::from(source),
            GridError::Sequencer(source) => GridFault::from(source),
        }
    }
}

#[async_trait]
pub trait GridSurface: Send + Sync {
    fn grid_id(&self) -> GridId;
    fn dimensions(&self) -> (usize, usize);
    async fn reset(&self);
    async fn flip_corners(&self, fps: f64) -> Result<RunHandle, GridError>;
    async fn clockwise(&self, fps: f64) -> Result<RunHandle, GridError>;
    /// Stops the active run, leaving cells as they are.
    async fn cancel(&self) -> Option<RunId>;
    async fn cell(&self, row: usize, column: usize) -> Result<Cell, GridError>;
    async fn snapshot(&self) -> GridSnapshot;
    fn subscribe_events(&self) -> broadcast::Receiver<GridEvent>;

    async fn apply(&self, command: GridCommand) -> Result<Option<RunHandle>, GridError> {
        match command {
            GridCommand::Reset => {
                self.reset().await;
                Ok(None)
            }
            GridCommand::FlipCorners { fps } => self.flip_corners(fps).await.map(Some),
            GridCommand::Clockwise { fps } => self.clockwise(fps).await.map(Some),
        }
    }
}

pub struct GridController {
    grid_id: GridId,
    rows: usize,
    columns: usize,
    sequencer: AnimationSequencer,
    last_error: Mutex<Option<TraversalError>>,
}

impl GridController {
    pub fn new(grid_id: GridId, rows: usize, columns: usize) -> Result<Self, GridError> {
        let cells = Matrix::create(rows, columns, Cell::new)?;
        Ok(Self {
            grid_id,
            rows,
            columns,
            sequencer: AnimationSequencer::new(grid_id, cells),
            last_error: Mutex::new(None),
        })
    }

    pub fn grid_id(&self) -> GridId {
        self.grid_id
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub async fn reset(&self) {
        self.last_error.lock().await.take();
        self.sequencer.reset().await;
    }

    /// Resets, then rotates and highlights the corner cells in row-major order.
    pub async fn flip_corners(&self, fps: f64) -> Result<RunHandle, GridError> {
        info!(grid = %self.grid_id, fps, "flip corners requested");
        self.ensure_cadence(fps)?;
        self.reset().await;

        let corners =
            corner_coordinates(self.rows, self.columns).map_err(|error| self.fail(error))?;
        self.start_run(corners, fps).await
    }

    /// Resets, then rotates and highlights every cell along the clockwise spiral.
    pub async fn clockwise(&self, fps: f64) -> Result<RunHandle, GridError> {
        info!(grid = %self.grid_id, fps, "clockwise requested");
        self.ensure_cadence(fps)?;
        self.reset().await;

        let order = self
            .checked_spiral(spiral_order(self.rows, self.columns))
            .await?;
        self.start_run(order, fps).await
    }

    pub async fn cancel(&self) -> Option<RunId> {
        self.sequencer.cancel_active().await
    }

    pub async fn cell(&self, row: usize, column: usize) -> Result<Cell, GridError> {
        Ok(self.sequencer.cell(row, column).await?)
    }

    pub async fn snapshot(&self) -> GridSnapshot {
        self.sequencer.snapshot().await
    }

    pub async fn active_run(&self) -> Option<RunId> {
        self.sequencer.active_run().await
    }

    /// Post-condition failure of the last spiral, cleared by every reset.
    pub async fn last_error(&self) -> Option<TraversalError> {
        *self.last_error.lock().await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<GridEvent> {
        self.sequencer.subscribe_events()
    }

    fn ensure_cadence(&self, fps: f64) -> Result<(), GridError> {
        cadence_period(fps).map_err(|error| self.fail(error))?;
        Ok(())
    }

    async fn checked_spiral(
        &self,
        order: Result<Vec<Coordinate>, TraversalError>,
    ) -> Result<Vec<Coordinate>, GridError> {
        match order {
            Ok(order) => Ok(order),
            Err(error) => {
                *self.last_error.lock().await = Some(error);
                Err(self.fail(error))
            }
        }
    }

    async fn start_run(
        &self,
        coordinates: Vec<Coordinate>,
        fps: f64,
    ) -> Result<RunHandle, GridError> {
        self.sequencer
            .start(coordinates, fps, Cell::flipped)
            .await
            .map_err(|error| self.fail(error))
    }

    fn fail(&self, error: impl Into<GridError>) -> GridError {
        let error = error.into();
        warn!(grid = %self.grid_id, %error, "grid operation failed");
        self.sequencer.publish(GridEvent::OperationFailed {
            grid_id: self.grid_id,
            fault: GridFault::from(&error),
        });
        error
    }
}

#[async_trait]
impl GridSurface for GridController {
    fn grid_id(&self) -> GridId {
        self.grid_id
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    async fn reset(&self) {
        GridController::reset(self).await
    }

    async fn flip_corners(&self, fps: f64) -> Result<RunHandle, GridError> {
        GridController::flip_corners(self, fps).await
    }

    async fn clockwise(&self, fps: f64) -> Result<RunHandle, GridError> {
        GridController::clockwise(self, fps).await
    }

    async fn cancel(&self) -> Option<RunId> {
        GridController::cancel(self).await
    }

    async fn cell(&self, row: usize, column: usize) -> Result<Cell, GridError> {
        GridController::cell(self, row, column).await
    }

    async fn snapshot(&self) -> GridSnapshot {
        GridController::snapshot(self).await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<GridEvent> {
        GridController::subscribe_events(self)
    }
}

/// Independent grids driven together. Each grid keeps its own timeline; no
/// ordering holds across grids.
#[derive(Clone, Default)]
pub struct GridBoard {
    grids: Vec<Arc<dyn GridSurface>>,
}

impl GridBoard {
    pub fn new(grids: Vec<Arc<dyn GridSurface>>) -> Self {
        Self { grids }
    }

    /// One controller per `(rows, columns)` shape, numbered from 1.
    pub fn from_shapes(shapes: &[(usize, usize)]) -> Result<Self, GridError> {
        let mut grids: Vec<Arc<dyn GridSurface>> = Vec::with_capacity(shapes.len());
        for (index, &(rows, columns)) in shapes.iter().enumerate() {
            let grid_id = GridId(index as u64 + 1);
            grids.push(Arc::new(GridController::new(grid_id, rows, columns)?));
        }
        Ok(Self { grids })
    }

    pub fn grids(&self) -> &[Arc<dyn GridSurface>] {
        &self.grids
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    pub fn subscribe_all(&self) -> Vec<broadcast::Receiver<GridEvent>> {
        self.grids.iter().map(|grid| grid.subscribe_events()).collect()
    }

    pub async fn reset_all(&self) {
        join_all(self.grids.iter().map(|grid| grid.reset())).await;
    }

    pub async fn flip_corners_all(&self, fps: f64) -> Vec<Result<RunHandle, GridError>> {
        join_all(self.grids.iter().map(|grid| grid.flip_corners(fps))).await
    }

    pub async fn clockwise_all(&self, fps: f64) -> Vec<Result<RunHandle, GridError>> {
        join_all(self.grids.iter().map(|grid| grid.clockwise(fps))).await
    }

    /// Ids of the runs that were stopped.
    pub async fn cancel_all(&self) -> Vec<RunId> {
        join_all(self.grids.iter().map(|grid| grid.cancel()))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    pub async fn apply_all(
        &self,
        command: GridCommand,
    ) -> Vec<Result<Option<RunHandle>, GridError>> {
        join_all(self.grids.iter().map(|grid| grid.apply(command))).await
    }

    pub async fn snapshots(&self) -> Vec<GridSnapshot> {
        join_all(self.grids.iter().map(|grid| grid.snapshot())).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
