use super::*;

use shared::domain::ColorTag;

fn sequencer(rows: usize, columns: usize) -> AnimationSequencer {
    let cells = Matrix::create(rows, columns, Cell::new).expect("cells");
    AnimationSequencer::new(GridId(7), cells)
}

fn coordinates(pairs: &[(usize, usize)]) -> Vec<Coordinate> {
    pairs.iter().copied().map(Coordinate::from).collect()
}

async fn next_update(events: &mut broadcast::Receiver<GridEvent>) -> (RunId, Cell) {
    loop {
        if let GridEvent::CellUpdated { run_id, cell, .. } = events.recv().await.expect("event") {
            return (run_id, cell);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn rejects_non_positive_cadence() {
    let sequencer = sequencer(2, 2);
    for fps in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        let err = sequencer
            .start(coordinates(&[(0, 0)]), fps, Cell::flipped)
            .await
            .expect_err("cadence should be rejected");
        assert!(matches!(err, SequencerError::InvalidCadence(_)));
    }
    assert_eq!(sequencer.active_run().await, None);
}

#[tokio::test(start_paused = true)]
async fn rejects_coordinates_outside_the_grid() {
    let sequencer = sequencer(2, 2);
    let err = sequencer
        .start(coordinates(&[(0, 0), (2, 0)]), 10.0, Cell::flipped)
        .await
        .expect_err("out of bounds");
    assert!(matches!(
        err,
        SequencerError::Matrix(MatrixError::OutOfBounds { row: 2, .. })
    ));
    assert_eq!(
        GridFault::from(&err).code,
        ErrorCode::OutOfBounds,
        "fault should keep the matrix error code"
    );
}

#[tokio::test(start_paused = true)]
async fn applies_one_coordinate_per_tick_in_order() {
    let sequencer = sequencer(2, 2);
    let handle = sequencer
        .start(coordinates(&[(1, 1), (0, 0)]), 10.0, Cell::flipped)
        .await
        .expect("start");
    assert_eq!(handle.len(), 2);
    assert_eq!(handle.status(), RunStatus::Running);

    time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sequencer.snapshot().await.highlighted_count(), 0);

    time::sleep(Duration::from_millis(100)).await;
    assert!(!sequencer.cell(1, 1).await.expect("cell").is_pristine());
    assert!(sequencer.cell(0, 0).await.expect("cell").is_pristine());

    assert_eq!(handle.finished().await, RunStatus::Completed);
    let corner = sequencer.cell(0, 0).await.expect("cell");
    assert_eq!(corner.rotation_degrees, 90.0);
    assert_eq!(corner.color, ColorTag::Highlighted);
    assert!(sequencer.cell(0, 1).await.expect("cell").is_pristine());
    assert_eq!(sequencer.active_run().await, None);
}

#[tokio::test(start_paused = true)]
async fn events_follow_the_timeline() {
    let sequencer = sequencer(1, 3);
    let mut events = sequencer.subscribe_events();
    let handle = sequencer
        .start(coordinates(&[(0, 2), (0, 1)]), 30.0, Cell::flipped)
        .await
        .expect("start");
    handle.finished().await;

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    let run_id = handle.run_id();
    assert!(matches!(received[0], GridEvent::RunStarted { steps: 2, .. }));
    assert!(matches!(
        received[1],
        GridEvent::CellUpdated { step: 0, cell: Cell { column: 2, .. }, .. }
    ));
    assert!(matches!(
        received[2],
        GridEvent::CellUpdated { step: 1, cell: Cell { column: 1, .. }, .. }
    ));
    assert_eq!(
        received[3],
        GridEvent::RunCompleted {
            grid_id: GridId(7),
            run_id
        }
    );
    assert_eq!(received.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn empty_sequence_completes_without_ticks() {
    let sequencer = sequencer(2, 2);
    let handle = sequencer
        .start(Vec::new(), 10.0, Cell::flipped)
        .await
        .expect("start");
    assert!(handle.is_empty());
    assert_eq!(handle.status(), RunStatus::Completed);
    assert_eq!(sequencer.active_run().await, None);
    assert_eq!(sequencer.snapshot().await.highlighted_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn mutation_sees_the_current_cell() {
    let sequencer = sequencer(1, 1);
    let handle = sequencer
        .start(coordinates(&[(0, 0), (0, 0), (0, 0)]), 60.0, Cell::flipped)
        .await
        .expect("start");
    handle.finished().await;
    assert_eq!(
        sequencer.cell(0, 0).await.expect("cell").rotation_degrees,
        270.0
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_freezes_the_grid() {
    let sequencer = sequencer(1, 4);
    let mut events = sequencer.subscribe_events();
    let handle = sequencer
        .start(
            coordinates(&[(0, 0), (0, 1), (0, 2), (0, 3)]),
            10.0,
            Cell::flipped,
        )
        .await
        .expect("start");

    next_update(&mut events).await;
    assert!(sequencer.cancel(&handle).await);
    let frozen = sequencer.snapshot().await;
    assert_eq!(frozen.highlighted_count(), 1);

    time::sleep(Duration::from_secs(5)).await;
    assert_eq!(sequencer.snapshot().await, frozen);
    assert_eq!(handle.finished().await, RunStatus::Cancelled);
    assert!(!sequencer.cancel(&handle).await, "already cancelled");

    let mut cancelled = None;
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, GridEvent::CellUpdated { .. }),
            "no update after cancellation"
        );
        if let GridEvent::RunCancelled { applied_steps, .. } = event {
            cancelled = Some(applied_steps);
        }
    }
    assert_eq!(cancelled, Some(1));
}

#[tokio::test(start_paused = true)]
async fn new_run_supersedes_the_active_one() {
    let sequencer = sequencer(2, 3);
    let mut events = sequencer.subscribe_events();
    let first = sequencer
        .start(coordinates(&[(0, 0), (0, 1), (0, 2)]), 10.0, Cell::flipped)
        .await
        .expect("first");
    let (run_id, _) = next_update(&mut events).await;
    assert_eq!(run_id, first.run_id());

    let second = sequencer
        .start(coordinates(&[(1, 0), (1, 1)]), 10.0, Cell::flipped)
        .await
        .expect("second");
    assert_eq!(first.status(), RunStatus::Cancelled);
    assert_eq!(second.finished().await, RunStatus::Completed);

    while let Ok(event) = events.try_recv() {
        if let GridEvent::CellUpdated { run_id, .. } = event {
            assert_eq!(run_id, second.run_id(), "stale tick from superseded run");
        }
    }
    let snapshot = sequencer.snapshot().await;
    assert!(!snapshot.cell(0, 0).expect("cell").is_pristine());
    assert!(snapshot.cell(0, 1).expect("cell").is_pristine());
    assert!(snapshot.cell(0, 2).expect("cell").is_pristine());
    assert_eq!(snapshot.highlighted_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_and_clears_synchronously() {
    let sequencer = sequencer(3, 4);
    let mut events = sequencer.subscribe_events();
    let handle = sequencer
        .start(coordinates(&[(0, 0), (1, 1), (2, 2)]), 10.0, Cell::flipped)
        .await
        .expect("start");
    next_update(&mut events).await;

    sequencer.reset().await;
    assert_eq!(handle.status(), RunStatus::Cancelled);
    assert_eq!(sequencer.active_run().await, None);
    assert_eq!(sequencer.snapshot().await.highlighted_count(), 0);

    time::sleep(Duration::from_secs(1)).await;
    let snapshot = sequencer.snapshot().await;
    assert_eq!(snapshot.highlighted_count(), 0);
    assert_eq!(snapshot.cells.len(), 12);
}

#[tokio::test(start_paused = true)]
async fn grids_run_on_independent_timelines() {
    let left = sequencer(1, 2);
    let right = sequencer(1, 2);
    let left_run = left
        .start(coordinates(&[(0, 0), (0, 1)]), 10.0, Cell::flipped)
        .await
        .expect("left");
    let right_run = right
        .start(coordinates(&[(0, 1)]), 20.0, Cell::flipped)
        .await
        .expect("right");

    right.cancel_active().await;
    assert_eq!(right_run.status(), RunStatus::Cancelled);
    assert_eq!(left_run.finished().await, RunStatus::Completed);
    assert_eq!(left.snapshot().await.highlighted_count(), 2);
    assert_eq!(right.snapshot().await.highlighted_count(), 0);
}
