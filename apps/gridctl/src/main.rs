use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::{future::join_all, stream::select_all, FutureExt, StreamExt};
use grid_controller::GridBoard;
use sequencer::RunHandle;
use shared::protocol::{GridCommand, GridEvent, GridSnapshot};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use traversal::{corner_coordinates, spiral_order};

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "gridctl", about = "Drive animated grids from the terminal")]
struct Cli {
    /// TOML settings file; `gridctl.toml` is read when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the clockwise spiral order, one `row,column` per line.
    Spiral { rows: usize, columns: usize },
    /// Print the corner cells selected by flip-corners.
    Corners { rows: usize, columns: usize },
    /// Run an operation and stream its events until every run finishes.
    Run {
        operation: Operation,
        #[arg(long)]
        fps: Option<f64>,
        #[arg(long, conflicts_with = "board")]
        rows: Option<usize>,
        #[arg(long, conflicts_with = "board")]
        columns: Option<usize>,
        /// Drive every shape of the configured board instead of one grid.
        #[arg(long)]
        board: bool,
        /// Emit events as JSON lines on stdout.
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Operation {
    Reset,
    FlipCorners,
    Clockwise,
}

impl Operation {
    fn command(self, fps: f64) -> GridCommand {
        match self {
            Self::Reset => GridCommand::Reset,
            Self::FlipCorners => GridCommand::FlipCorners { fps },
            Self::Clockwise => GridCommand::Clockwise { fps },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    init_tracing(&settings.log_filter);

    match cli.command {
        Command::Spiral { rows, columns } => {
            let order = spiral_order(rows, columns)
                .with_context(|| format!("no spiral for a {rows}x{columns} grid"))?;
            for coordinate in order {
                println!("{},{}", coordinate.row, coordinate.column);
            }
        }
        Command::Corners { rows, columns } => {
            let corners = corner_coordinates(rows, columns)
                .with_context(|| format!("no corners for a {rows}x{columns} grid"))?;
            for coordinate in corners {
                println!("{},{}", coordinate.row, coordinate.column);
            }
        }
        Command::Run {
            operation,
            fps,
            rows,
            columns,
            board,
            json,
        } => {
            let shapes = if board {
                settings.board.clone()
            } else {
                vec![(
                    rows.unwrap_or(settings.rows),
                    columns.unwrap_or(settings.columns),
                )]
            };
            let command = operation.command(fps.unwrap_or(settings.fps));
            run(&shapes, command, json).await?;
        }
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(shapes: &[(usize, usize)], command: GridCommand, json: bool) -> Result<()> {
    let board = GridBoard::from_shapes(shapes).context("failed to build grids")?;
    info!(grids = board.len(), ?command, "applying command");

    let mut events = select_all(board.subscribe_all().into_iter().map(BroadcastStream::new));
    let mut runs: Vec<RunHandle> = Vec::new();
    let mut rejected = 0;
    for (grid, outcome) in board.grids().iter().zip(board.apply_all(command).await) {
        match outcome {
            Ok(Some(run)) => runs.push(run),
            Ok(None) => {}
            Err(error) => {
                warn!(grid = %grid.grid_id(), %error, "command rejected");
                rejected += 1;
            }
        }
    }

    let finished = join_all(runs.iter().map(RunHandle::finished)).fuse();
    tokio::pin!(finished);
    loop {
        tokio::select! {
            _ = &mut finished => break,
            interrupt = tokio::signal::ctrl_c() => {
                interrupt.context("failed to listen for ctrl-c")?;
                let cancelled = board.cancel_all().await;
                info!(runs = cancelled.len(), "interrupted, runs cancelled");
                break;
            }
            Some(event) = events.next() => report(event, json)?,
        }
    }
    while let Some(Some(event)) = events.next().now_or_never() {
        report(event, json)?;
    }

    for snapshot in board.snapshots().await {
        print_summary(&snapshot);
    }

    if rejected > 0 {
        bail!("{rejected} of {} grid(s) rejected the command", board.len());
    }
    Ok(())
}

fn report(
    event: Result<GridEvent, tokio_stream::wrappers::errors::BroadcastStreamRecvError>,
    json: bool,
) -> Result<()> {
    let event = match event {
        Ok(event) => event,
        Err(error) => {
            warn!(%error, "event stream lagged");
            return Ok(());
        }
    };
    if json {
        println!("{}", serde_json::to_string(&event)?);
    } else {
        info!(grid = %event.grid_id(), ?event, "grid event");
    }
    Ok(())
}

fn print_summary(snapshot: &GridSnapshot) {
    println!(
        "grid {} ({}x{}): {}/{} rotated",
        snapshot.grid_id,
        snapshot.rows,
        snapshot.columns,
        snapshot.highlighted_count(),
        snapshot.cells.len()
    );
    for row in snapshot.cells.chunks(snapshot.columns.max(1)) {
        let line: Vec<String> = row
            .iter()
            .map(|cell| format!("{:>4}", cell.rotation_degrees))
            .collect();
        println!("{}", line.join(""));
    }
}
