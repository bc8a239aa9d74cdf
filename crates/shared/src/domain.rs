use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(GridId);
id_newtype!(RunId);

/// Zero-based position inside a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: usize,
    pub column: usize,
}

impl Coordinate {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl From<(usize, usize)> for Coordinate {
    fn from((row, column): (usize, usize)) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:2}, {:2}]", self.row, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTag {
    #[default]
    Neutral,
    Highlighted,
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neutral => f.write_str("neutral"),
            Self::Highlighted => f.write_str("highlighted"),
        }
    }
}

/// Visual state of one grid position. The `(row, column)` pair never changes
/// once the cell exists; only rotation and color are mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub column: usize,
    pub rotation_degrees: f64,
    pub color: ColorTag,
}

impl Cell {
    pub const ROTATION_STEP_DEGREES: f64 = 90.0;

    pub fn new(row: usize, column: usize) -> Self {
        Self {
            row,
            column,
            rotation_degrees: 0.0,
            color: ColorTag::Neutral,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.row, self.column)
    }

    /// Stable key for list-based renderers.
    pub fn id(&self) -> usize {
        self.row * 1_000_000 + self.column
    }

    pub fn is_pristine(&self) -> bool {
        self.rotation_degrees == 0.0 && self.color == ColorTag::Neutral
    }

    /// Quarter turn clockwise plus highlight: the mutation applied by both grid animations.
    pub fn flipped(self) -> Self {
        Self {
            rotation_degrees: self.rotation_degrees + Self::ROTATION_STEP_DEGREES,
            color: ColorTag::Highlighted,
            ..self
        }
    }

    pub fn cleared(self) -> Self {
        Self::new(self.row, self.column)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, rotation: {}, color: {}",
            self.coordinate(),
            self.rotation_degrees,
            self.color
        )
    }
}
