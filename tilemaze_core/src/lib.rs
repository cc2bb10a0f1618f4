use std::fmt;

use serde::{Deserialize, Serialize};

pub mod arrow;
pub mod catalog;
pub mod door;
pub mod explorer;
pub mod map;

use arrow::Direction;
use door::Heading;
use map::GridError;

/// Represents a 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The colour of a sliding door and of the switches that move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorColor {
    Red,
    Green,
    Cyan,
    Magenta,
}

impl DoorColor {
    pub const ALL: [DoorColor; 4] = [
        DoorColor::Red,
        DoorColor::Green,
        DoorColor::Cyan,
        DoorColor::Magenta,
    ];

    /// Maps a maze-source colour tag to its colour.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'r' => Some(DoorColor::Red),
            'g' => Some(DoorColor::Green),
            'c' => Some(DoorColor::Cyan),
            'm' => Some(DoorColor::Magenta),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            DoorColor::Red => 0,
            DoorColor::Green => 1,
            DoorColor::Cyan => 2,
            DoorColor::Magenta => 3,
        }
    }
}

/// Which end of a sliding door is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DoorSide {
    #[default]
    Left,
    Right,
}

impl DoorSide {
    pub fn flipped(self) -> Self {
        match self {
            DoorSide::Left => DoorSide::Right,
            DoorSide::Right => DoorSide::Left,
        }
    }
}

/// Lifecycle of a single maze session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Playing,
    /// Goal or exit reached; no further moves are accepted until reset.
    Won,
}

/// A door whose open side was set by entering a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorChange {
    pub color: DoorColor,
    pub side: DoorSide,
}

/// State reported back to the presentation layer after an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub position: Position,
    /// Step size after the move (arrow maze only).
    pub step_size: Option<isize>,
    /// Door set by a switch on the destination cell (door maze only).
    pub door_changed: Option<DoorChange>,
    /// The goal or exit was reached by this move.
    pub terminal: bool,
}

/// Represents the outcome of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted(MoveReport),
    Rejected(IllegalMove),
}

impl MoveOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted(_))
    }

    pub fn report(&self) -> Option<&MoveReport> {
        match self {
            MoveOutcome::Accepted(report) => Some(report),
            MoveOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<IllegalMove> {
        match self {
            MoveOutcome::Accepted(_) => None,
            MoveOutcome::Rejected(reason) => Some(*reason),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MoveOutcome::Accepted(MoveReport { terminal: true, .. }))
    }
}

/// Reasons a move is refused. Refusals never mutate engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    #[error("Move to the current tile")]
    NullMove,
    #[error("Offset ({dx}, {dy}) is not on a cardinal or diagonal ray")]
    OffRay { dx: isize, dy: isize },
    #[error("Offset ({dx}, {dy}) does not match step size {step_size}")]
    WrongStepSize {
        dx: isize,
        dy: isize,
        step_size: isize,
    },
    #[error("Tile has no {direction:?} arrow")]
    NoArrow { direction: Direction },
    #[error("{to} is not adjacent to {from}")]
    NotAdjacent { from: Position, to: Position },
    #[error("Wall on the {side:?} edge")]
    Wall { side: Heading },
    #[error("{color:?} door is closed on this side")]
    DoorClosed { color: DoorColor },
    #[error("Cannot enter the middle of the {color:?} door")]
    DoorInterior { color: DoorColor },
    #[error("Target ({x}, {y}) is outside the maze")]
    OutOfBounds { x: isize, y: isize },
    #[error("The maze is already solved")]
    GameOver,
}

/// Errors raised while loading maze data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MazeError {
    #[error("Invalid maze data: {0}")]
    InvalidMazeData(String),
    #[error("No maze with id {0} in the catalog")]
    UnknownMaze(u16),
    #[error(transparent)]
    Grid(#[from] GridError),
}
