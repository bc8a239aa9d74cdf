//! Timed, cancellable application of a per-cell mutation over an ordered
//! coordinate list. One sequencer owns one grid timeline; at most one run is
//! active on it at a time.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use matrix::{Matrix, MatrixError};
use shared::{
    domain::{Cell, Coordinate, GridId, RunId},
    error::{ErrorCode, GridFault},
    protocol::{GridEvent, GridSnapshot, RunStatus},
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequencerError {
    #[error("ticks per second must be a positive finite number, got {0}")]
    InvalidCadence(f64),
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

impl From<&SequencerError> for GridFault {
    fn from(value: &SequencerError) -> Self {
        match value {
            SequencerError::InvalidCadence(_) => {
                GridFault::new(ErrorCode::InvalidCadence, value.to_string())
            }
            SequencerError::Matrix(source) => GridFault::from(source),
        }
    }
}

/// Caller's view of one run.
#[derive(Debug, Clone)]
pub struct RunHandle {
    grid_id: GridId,
    run_id: RunId,
    steps: usize,
    status: watch::Receiver<RunStatus>,
}

impl RunHandle {
    pub fn grid_id(&self) -> GridId {
        self.grid_id
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Number of coordinates scheduled, one per tick.
    pub fn len(&self) -> usize {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }

    pub fn status(&self) -> RunStatus {
        *self.status.borrow()
    }

    /// Resolves once the run has completed or been cancelled.
    pub async fn finished(&self) -> RunStatus {
        let mut status = self.status.clone();
        let terminal = match status.wait_for(|status| status.is_terminal()).await {
            Ok(status) => *status,
            Err(_) => RunStatus::Cancelled,
        };
        terminal
    }
}

struct ActiveRun {
    run_id: RunId,
    applied: usize,
    status: watch::Sender<RunStatus>,
    task: Option<JoinHandle<()>>,
}

struct Timeline {
    cells: Matrix<Cell>,
    active: Option<ActiveRun>,
}

pub struct AnimationSequencer {
    grid_id: GridId,
    timeline: Arc<Mutex<Timeline>>,
    next_run_id: AtomicU64,
    events: broadcast::Sender<GridEvent>,
}

impl AnimationSequencer {
    pub fn new(grid_id: GridId, cells: Matrix<Cell>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            grid_id,
            timeline: Arc::new(Mutex::new(Timeline {
                cells,
                active: None,
            })),
            next_run_id: AtomicU64::new(1),
            events,
        }
    }

    pub fn grid_id(&self) -> GridId {
        self.grid_id
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<GridEvent> {
        self.events.subscribe()
    }

    /// Pushes an event onto this grid's observer channel.
    pub fn publish(&self, event: GridEvent) {
        let _ = self.events.send(event);
    }

    /// Schedules `mutate` over `coordinates`, one coordinate every
    /// `1 / ticks_per_second` seconds. Any run already active on this grid is
    /// cancelled under the same lock before the new one is registered.
    pub async fn start<F>(
        &self,
        coordinates: Vec<Coordinate>,
        ticks_per_second: f64,
        mutate: F,
    ) -> Result<RunHandle, SequencerError>
    where
        F: Fn(Cell) -> Cell + Send + Sync + 'static,
    {
        let period = cadence_period(ticks_per_second)?;

        let mut timeline = self.timeline.lock().await;
        for coordinate in &coordinates {
            timeline.cells.get_ref(coordinate.row, coordinate.column)?;
        }
        self.cancel_locked(&mut timeline);

        let run_id = RunId(self.next_run_id.fetch_add(1, Ordering::Relaxed));
        let steps = coordinates.len();
        let (status, status_rx) = watch::channel(RunStatus::Running);
        let handle = RunHandle {
            grid_id: self.grid_id,
            run_id,
            steps,
            status: status_rx,
        };

        info!(
            grid = %self.grid_id,
            run = %run_id,
            steps,
            fps = ticks_per_second,
            "animation run started"
        );
        let _ = self.events.send(GridEvent::RunStarted {
            grid_id: self.grid_id,
            run_id,
            steps,
            ticks_per_second,
        });

        if coordinates.is_empty() {
            status.send_replace(RunStatus::Completed);
            let _ = self.events.send(GridEvent::RunCompleted {
                grid_id: self.grid_id,
                run_id,
            });
            return Ok(handle);
        }

        let task = tokio::spawn(drive_run(
            Arc::downgrade(&self.timeline),
            self.events.clone(),
            self.grid_id,
            run_id,
            coordinates,
            period,
            mutate,
        ));
        timeline.active = Some(ActiveRun {
            run_id,
            applied: 0,
            status,
            task: Some(task),
        });

        Ok(handle)
    }

    /// Stops the run behind `handle`. Returns `false` when that run already
    /// finished or was superseded.
    pub async fn cancel(&self, handle: &RunHandle) -> bool {
        let mut timeline = self.timeline.lock().await;
        let is_target = timeline
            .active
            .as_ref()
            .is_some_and(|active| active.run_id == handle.run_id);
        if is_target {
            self.cancel_locked(&mut timeline);
        }
        is_target
    }

    pub async fn cancel_active(&self) -> Option<RunId> {
        let mut timeline = self.timeline.lock().await;
        self.cancel_locked(&mut timeline)
    }

    /// Cancels any active run, then returns every cell to its identity defaults.
    /// No ticks are involved.
    pub async fn reset(&self) {
        let mut timeline = self.timeline.lock().await;
        self.cancel_locked(&mut timeline);
        timeline.cells = timeline.cells.map(Cell::new);
        debug!(grid = %self.grid_id, "grid reset");
        let _ = self.events.send(GridEvent::GridReset {
            grid_id: self.grid_id,
        });
    }

    pub async fn cell(&self, row: usize, column: usize) -> Result<Cell, MatrixError> {
        self.timeline.lock().await.cells.get(row, column)
    }

    pub async fn snapshot(&self) -> GridSnapshot {
        let timeline = self.timeline.lock().await;
        GridSnapshot {
            grid_id: self.grid_id,
            rows: timeline.cells.rows(),
            columns: timeline.cells.columns(),
            cells: timeline.cells.values().copied().collect(),
        }
    }

    pub async fn active_run(&self) -> Option<RunId> {
        self.timeline
            .lock()
            .await
            .active
            .as_ref()
            .map(|active| active.run_id)
    }

    fn cancel_locked(&self, timeline: &mut Timeline) -> Option<RunId> {
        let mut active = timeline.active.take()?;
        if let Some(task) = active.task.take() {
            task.abort();
        }
        active.status.send_replace(RunStatus::Cancelled);

        info!(
            grid = %self.grid_id,
            run = %active.run_id,
            applied = active.applied,
            "animation run cancelled"
        );
        let _ = self.events.send(GridEvent::RunCancelled {
            grid_id: self.grid_id,
            run_id: active.run_id,
            applied_steps: active.applied,
        });
        Some(active.run_id)
    }
}

/// Tick period for a cadence; rejects anything that is not a positive, finite,
/// representable rate.
pub fn cadence_period(ticks_per_second: f64) -> Result<Duration, SequencerError> {
    if !ticks_per_second.is_finite() || ticks_per_second <= 0.0 {
        return Err(SequencerError::InvalidCadence(ticks_per_second));
    }
    match Duration::try_from_secs_f64(ticks_per_second.recip()) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(SequencerError::InvalidCadence(ticks_per_second)),
    }
}

/// Tick loop for one run. Every tick re-checks, under the grid lock, that its
/// run is still the active one; a tick that lost that race is discarded.
async fn drive_run<F>(
    timeline: Weak<Mutex<Timeline>>,
    events: broadcast::Sender<GridEvent>,
    grid_id: GridId,
    run_id: RunId,
    coordinates: Vec<Coordinate>,
    period: Duration,
    mutate: F,
) where
    F: Fn(Cell) -> Cell + Send + Sync + 'static,
{
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for (step, coordinate) in coordinates.into_iter().enumerate() {
        ticker.tick().await;

        let Some(timeline) = timeline.upgrade() else {
            return;
        };
        let mut guard = timeline.lock().await;
        let state = &mut *guard;
        let Some(active) = state
            .active
            .as_mut()
            .filter(|active| active.run_id == run_id)
        else {
            debug!(grid = %grid_id, run = %run_id, step, "tick discarded for inactive run");
            return;
        };

        let cell = match state.cells.at(coordinate) {
            Ok(cell) => mutate(cell),
            Err(error) => {
                warn!(grid = %grid_id, run = %run_id, %error, "skipping tick");
                continue;
            }
        };
        if let Err(error) = state.cells.set(coordinate.row, coordinate.column, cell) {
            warn!(grid = %grid_id, run = %run_id, %error, "skipping tick");
            continue;
        }
        active.applied = step + 1;

        debug!(
            grid = %grid_id,
            run = %run_id,
            step,
            row = coordinate.row,
            column = coordinate.column,
            "cell updated"
        );
        let _ = events.send(GridEvent::CellUpdated {
            grid_id,
            run_id,
            step,
            cell,
        });
    }

    let Some(timeline) = timeline.upgrade() else {
        return;
    };
    let mut guard = timeline.lock().await;
    if guard
        .active
        .as_ref()
        .is_some_and(|active| active.run_id == run_id)
    {
        if let Some(active) = guard.active.take() {
            active.status.send_replace(RunStatus::Completed);
            info!(grid = %grid_id, run = %run_id, steps = active.applied, "animation run completed");
            let _ = events.send(GridEvent::RunCompleted { grid_id, run_id });
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
