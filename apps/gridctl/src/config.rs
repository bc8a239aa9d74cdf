use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "gridctl.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rows: usize,
    pub columns: usize,
    pub fps: f64,
    pub board: Vec<(usize, usize)>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rows: 11,
            columns: 15,
            fps: 6.0,
            board: vec![
                (1, 3),
                (2, 3),
                (3, 3),
                (3, 1),
                (3, 2),
                (3, 4),
                (3, 5),
                (13, 17),
            ],
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    rows: Option<usize>,
    columns: Option<usize>,
    fps: Option<f64>,
    board: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, then the TOML file, then `APP__*` variables from the process
/// environment.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    apply_file(&mut settings, config_path)?;
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, config_path: Option<&Path>) -> anyhow::Result<()> {
    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound && !required => return Ok(()),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };
    let file_cfg: FileSettings = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))?;

    if let Some(v) = file_cfg.rows {
        settings.rows = v;
    }
    if let Some(v) = file_cfg.columns {
        settings.columns = v;
    }
    if let Some(v) = file_cfg.fps {
        settings.fps = v;
    }
    if let Some(v) = file_cfg.board {
        settings.board = parse_board(&v)
            .with_context(|| format!("invalid board in '{}'", path.display()))?;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

/// Overrides from `APP__*` variables. Values that do not parse keep the
/// previous layer.
fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("APP__ROWS").and_then(|v| v.trim().parse().ok()) {
        settings.rows = v;
    }
    if let Some(v) = lookup("APP__COLUMNS").and_then(|v| v.trim().parse().ok()) {
        settings.columns = v;
    }
    if let Some(v) = lookup("APP__FPS").and_then(|v| v.trim().parse().ok()) {
        settings.fps = v;
    }
    if let Some(v) = lookup("APP__BOARD").and_then(|v| parse_board(&v).ok()) {
        settings.board = v;
    }
    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

/// Parses `RxC` shapes separated by commas, e.g. `3x4,13x17`.
pub fn parse_board(raw: &str) -> anyhow::Result<Vec<(usize, usize)>> {
    let mut shapes = Vec::new();
    for shape in raw.split(',').map(str::trim).filter(|shape| !shape.is_empty()) {
        let Some((rows, columns)) = shape.split_once(['x', 'X']) else {
            bail!("shape '{shape}' is not of the form <rows>x<columns>");
        };
        let rows = rows
            .trim()
            .parse()
            .with_context(|| format!("bad row count in '{shape}'"))?;
        let columns = columns
            .trim()
            .parse()
            .with_context(|| format!("bad column count in '{shape}'"))?;
        shapes.push((rows, columns));
    }
    if shapes.is_empty() {
        bail!("board lists no shapes");
    }
    Ok(shapes)
}
