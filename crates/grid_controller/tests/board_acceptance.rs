use grid_controller::{GridBoard, GridError, GridSurface};
use shared::{
    domain::GridId,
    protocol::{GridCommand, GridEvent, RunStatus},
};
use traversal::spiral_order;

const SHAPES: [(usize, usize); 8] = [
    (1, 3),
    (2, 3),
    (3, 3),
    (3, 1),
    (3, 2),
    (3, 4),
    (3, 5),
    (13, 17),
];

#[tokio::test(start_paused = true)]
async fn board_of_mixed_shapes_spirals_every_grid() {
    let board = GridBoard::from_shapes(&SHAPES).expect("board");
    assert_eq!(board.len(), SHAPES.len());
    let mut receivers = board.subscribe_all();

    let runs: Vec<_> = board
        .clockwise_all(120.0)
        .await
        .into_iter()
        .collect::<Result<_, GridError>>()
        .expect("every grid starts");
    for run in &runs {
        assert_eq!(run.finished().await, RunStatus::Completed);
    }

    for ((receiver, &(rows, columns)), run) in receivers.iter_mut().zip(SHAPES.iter()).zip(&runs)
    {
        let mut order = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            assert_eq!(event.grid_id(), run.grid_id(), "events stay on their grid");
            if let GridEvent::CellUpdated { cell, .. } = event {
                order.push(cell.coordinate());
            }
        }
        assert_eq!(order, spiral_order(rows, columns).expect("spiral"));
    }

    for snapshot in board.snapshots().await {
        assert_eq!(
            snapshot.highlighted_count(),
            snapshot.rows * snapshot.columns
        );
    }
}

#[tokio::test(start_paused = true)]
async fn flip_corners_then_reset_all() {
    let board = GridBoard::from_shapes(&SHAPES).expect("board");
    let runs = board.flip_corners_all(60.0).await;
    for run in runs {
        run.expect("flip").finished().await;
    }

    let snapshots = board.snapshots().await;
    let highlighted: Vec<_> = snapshots
        .iter()
        .map(|snapshot| snapshot.highlighted_count())
        .collect();
    assert_eq!(highlighted, vec![2, 4, 4, 2, 4, 4, 4, 4]);
    let large = &snapshots[7];
    assert_eq!(large.grid_id, GridId(8));
    assert!(!large.cell(12, 16).expect("corner").is_pristine());
    assert!(large.cell(6, 8).expect("center").is_pristine());

    board.reset_all().await;
    for snapshot in board.snapshots().await {
        assert_eq!(snapshot.highlighted_count(), 0);
    }
}

#[tokio::test(start_paused = true)]
async fn one_grid_restarting_does_not_disturb_the_others() {
    let board = GridBoard::from_shapes(&[(3, 4), (3, 4)]).expect("board");
    let runs = board.clockwise_all(10.0).await;
    let left = runs[0].as_ref().expect("left");
    let right = runs[1].as_ref().expect("right");

    board.grids()[1].reset().await;
    assert_eq!(right.status(), RunStatus::Cancelled);
    assert_eq!(left.finished().await, RunStatus::Completed);

    let snapshots = board.snapshots().await;
    assert_eq!(snapshots[0].highlighted_count(), 12);
    assert_eq!(snapshots[1].highlighted_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn commands_parsed_from_json_reach_every_grid() {
    let board = GridBoard::from_shapes(&[(2, 3), (3, 2)]).expect("board");
    let command: GridCommand =
        serde_json::from_str(r#"{"type":"clockwise","payload":{"fps":48.0}}"#).expect("command");

    for outcome in board.apply_all(command).await {
        let run = outcome.expect("apply").expect("run");
        assert_eq!(run.len(), 6);
        run.finished().await;
    }

    let rejected = board
        .apply_all(GridCommand::FlipCorners { fps: -1.0 })
        .await;
    assert!(rejected.iter().all(Result::is_err));
    for snapshot in board.snapshots().await {
        assert_eq!(snapshot.highlighted_count(), 6, "rejected command changed nothing");
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_all_freezes_every_grid() {
    let board = GridBoard::from_shapes(&[(3, 3), (2, 3)]).expect("board");
    let runs: Vec<_> = board
        .clockwise_all(10.0)
        .await
        .into_iter()
        .map(|run| run.expect("run"))
        .collect();
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;

    let cancelled = board.cancel_all().await;
    assert_eq!(cancelled.len(), 2);
    assert!(runs.iter().all(|run| run.status() == RunStatus::Cancelled));
    let frozen = board.snapshots().await;
    assert!(frozen.iter().all(|snapshot| snapshot.highlighted_count() == 2));

    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    assert_eq!(board.snapshots().await, frozen);
    assert!(board.cancel_all().await.is_empty());
}

#[test]
fn board_rejects_an_empty_shape() {
    assert!(GridBoard::from_shapes(&[(3, 3), (0, 4)]).is_err());
}
