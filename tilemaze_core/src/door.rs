//! Sliding-door maze: four-way single-step movement blocked by walls and by
//! coloured sliding doors whose open end is set by switch tiles.
//!
//! The maze source is a comma separated token grid, one row per line. Each
//! token is an unordered set of one-character tags:
//!
//! * `T` `L` `R` `B`: wall on the top, left, right or bottom edge
//! * `r` `g` `c` `m`: door colour, used with `<`/`>` (switch) or `d` (door cell)
//! * `-` `+`: left or right accessible end of a door; no marker means the
//!   impassable middle
//! * `e`: exit, `s`: start, `*`: goal-corner decoration
//!
//! Walls are only checked on the cell being left, so a maze must mark every
//! wall on both of the cells it separates.

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::{
    DoorChange, DoorColor, DoorSide, GameStatus, IllegalMove, MazeError, MoveOutcome,
    MoveReport, Position, map::Grid,
};

/// A keyboard direction, also used to name the edge of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::Up, Heading::Down, Heading::Left, Heading::Right];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
        }
    }

    /// Heading from `from` to an orthogonally adjacent `to`.
    pub fn between(from: Position, to: Position) -> Option<Self> {
        match (to.x.abs_diff(from.x), to.y.abs_diff(from.y)) {
            (1, 0) if to.x > from.x => Some(Heading::Right),
            (1, 0) => Some(Heading::Left),
            (0, 1) if to.y > from.y => Some(Heading::Down),
            (0, 1) => Some(Heading::Up),
            _ => None,
        }
    }
}

/// Wall flags of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Walls {
    pub top: bool,
    pub left: bool,
    pub right: bool,
    pub bottom: bool,
}

impl Walls {
    /// True if this cell's wall on the `heading` edge is present.
    pub fn blocks(&self, heading: Heading) -> bool {
        match heading {
            Heading::Up => self.top,
            Heading::Down => self.bottom,
            Heading::Left => self.left,
            Heading::Right => self.right,
        }
    }
}

/// Which part of a sliding door a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorPart {
    LeftEnd,
    Middle,
    RightEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellFeature {
    /// Entering the cell sets the door's open side.
    Switch { color: DoorColor, side: DoorSide },
    Door { color: DoorColor, part: DoorPart },
}

/// A door-maze cell, decoded once from its source token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DoorCell {
    pub walls: Walls,
    pub feature: Option<CellFeature>,
    pub exit: bool,
    pub goal_corner: bool,
    pub start: bool,
}

impl DoorCell {
    /// Decodes one token. Tag order does not matter.
    pub fn parse(token: &str) -> Result<Self, String> {
        let mut cell = DoorCell::default();
        let mut color = None;
        let mut switch_side = None;
        let mut door = false;
        let mut end = None;

        for tag in token.trim().chars() {
            match tag {
                'T' => cell.walls.top = true,
                'L' => cell.walls.left = true,
                'R' => cell.walls.right = true,
                'B' => cell.walls.bottom = true,
                'e' => cell.exit = true,
                '*' => cell.goal_corner = true,
                's' => cell.start = true,
                'd' => door = true,
                '<' | '>' => {
                    let side = if tag == '<' { DoorSide::Left } else { DoorSide::Right };
                    if switch_side.is_some_and(|s| s != side) {
                        return Err(format!("'{token}' points a switch both ways"));
                    }
                    switch_side = Some(side);
                }
                '-' | '+' => {
                    let side = if tag == '-' { DoorSide::Left } else { DoorSide::Right };
                    if end.is_some_and(|s| s != side) {
                        return Err(format!("'{token}' marks both ends of a door"));
                    }
                    end = Some(side);
                }
                other => match DoorColor::from_tag(other) {
                    Some(c) if color.is_some_and(|existing| existing != c) => {
                        return Err(format!("'{token}' names two door colours"));
                    }
                    Some(c) => color = Some(c),
                    None => return Err(format!("unknown tag '{other}' in '{token}'")),
                },
            }
        }

        cell.feature = match (color, switch_side, door, end) {
            (None, None, false, None) => None,
            (Some(color), Some(side), false, None) => Some(CellFeature::Switch { color, side }),
            (Some(color), None, true, end) => Some(CellFeature::Door {
                color,
                part: match end {
                    Some(DoorSide::Left) => DoorPart::LeftEnd,
                    Some(DoorSide::Right) => DoorPart::RightEnd,
                    None => DoorPart::Middle,
                },
            }),
            (None, _, _, _) => {
                return Err(format!("'{token}' has a door or switch tag but no colour"));
            }
            (Some(_), None, false, _) => {
                return Err(format!("'{token}' has a colour but no switch or door"));
            }
            (Some(_), _, _, _) => {
                return Err(format!("'{token}' mixes switch and door tags"));
            }
        };

        if cell.exit && cell.feature.is_some() {
            return Err(format!("'{token}' puts the exit on a door or switch"));
        }
        Ok(cell)
    }
}

/// The two accessible ends of a door. Cells strictly between them are the
/// door's impassable middle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorTrack {
    pub color: DoorColor,
    pub left_end: Position,
    pub right_end: Position,
}

/// Open side of every door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DoorStates([DoorSide; 4]);

impl DoorStates {
    pub fn get(&self, color: DoorColor) -> DoorSide {
        self.0[color.index()]
    }

    /// Sets a door's side and returns the previous one.
    pub fn set(&mut self, color: DoorColor, side: DoorSide) -> DoorSide {
        std::mem::replace(&mut self.0[color.index()], side)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DoorColor, DoorSide)> + '_ {
        DoorColor::ALL
            .into_iter()
            .map(move |color| (color, self.get(color)))
    }
}

/// An immutable, decoded door maze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorMaze {
    grid: Grid<DoorCell>,
    start: Position,
    tracks: [Option<DoorTrack>; 4],
}

impl DoorMaze {
    /// Parses and validates a maze source.
    pub fn parse(source: &str) -> Result<Self, MazeError> {
        let rows: Vec<Vec<&str>> = source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.split(',').collect())
            .collect();

        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(MazeError::InvalidMazeData("maze source is empty".to_string()));
        }

        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(MazeError::InvalidMazeData(format!(
                    "inconsistent width at row {y}: expected {width}, found {}",
                    row.len()
                )));
            }
            for (x, token) in row.iter().enumerate() {
                let cell = DoorCell::parse(token).map_err(|reason| {
                    MazeError::InvalidMazeData(format!("cell ({x}, {y}): {reason}"))
                })?;
                cells.push(cell);
            }
        }
        let grid = Grid::from_cells(width, height, cells)?;

        let starts: Vec<Position> = grid
            .enumerate()
            .filter_map(|(pos, cell)| cell.start.then_some(pos))
            .collect();
        let start = match starts.as_slice() {
            [start] => *start,
            [] => return Err(MazeError::InvalidMazeData("no start cell".to_string())),
            _ => {
                return Err(MazeError::InvalidMazeData(format!(
                    "{} start cells",
                    starts.len()
                )));
            }
        };
        if !grid.as_slice().iter().any(|cell| cell.exit) {
            return Err(MazeError::InvalidMazeData("no exit cell".to_string()));
        }

        let mut tracks = [None; 4];
        for color in DoorColor::ALL {
            tracks[color.index()] = door_track(&grid, color)?;
        }
        for (pos, cell) in grid.enumerate() {
            if let Some(CellFeature::Switch { color, .. }) = cell.feature {
                if tracks[color.index()].is_none() {
                    return Err(MazeError::InvalidMazeData(format!(
                        "switch at {pos} controls a missing {color:?} door"
                    )));
                }
            }
        }

        Ok(DoorMaze {
            grid,
            start,
            tracks,
        })
    }

    pub fn grid(&self) -> &Grid<DoorCell> {
        &self.grid
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn cell(&self, position: Position) -> Option<&DoorCell> {
        self.grid.get(position.x, position.y)
    }

    pub fn door_track(&self, color: DoorColor) -> Option<DoorTrack> {
        self.tracks[color.index()]
    }

    pub fn doors(&self) -> impl Iterator<Item = DoorTrack> + '_ {
        self.tracks.iter().flatten().copied()
    }
}

/// Locates and validates the cells of one door.
fn door_track(grid: &Grid<DoorCell>, color: DoorColor) -> Result<Option<DoorTrack>, MazeError> {
    let parts: Vec<(Position, DoorPart)> = grid
        .enumerate()
        .filter_map(|(pos, cell)| match cell.feature {
            Some(CellFeature::Door { color: c, part }) if c == color => Some((pos, part)),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return Ok(None);
    }

    let ends = |wanted: DoorPart| -> Vec<Position> {
        parts
            .iter()
            .filter(|(_, part)| *part == wanted)
            .map(|(pos, _)| *pos)
            .collect()
    };
    let lefts = ends(DoorPart::LeftEnd);
    let rights = ends(DoorPart::RightEnd);
    let (left_end, right_end) = match (lefts.as_slice(), rights.as_slice()) {
        ([left], [right]) => (*left, *right),
        _ => {
            return Err(MazeError::InvalidMazeData(format!(
                "{color:?} door needs exactly one left end and one right end"
            )));
        }
    };
    if left_end.y != right_end.y || left_end.x + 1 >= right_end.x {
        return Err(MazeError::InvalidMazeData(format!(
            "{color:?} door ends {left_end} and {right_end} do not enclose a middle"
        )));
    }
    let span = right_end.x - left_end.x + 1;
    let contiguous = parts
        .iter()
        .all(|(pos, _)| pos.y == left_end.y && (left_end.x..=right_end.x).contains(&pos.x));
    if !contiguous || parts.len() != span {
        return Err(MazeError::InvalidMazeData(format!(
            "{color:?} door cells are not a single row between {left_end} and {right_end}"
        )));
    }

    Ok(Some(DoorTrack {
        color,
        left_end,
        right_end,
    }))
}

/// Session state for one door maze.
#[derive(Debug, Clone)]
pub struct DoorMazeEngine {
    maze: DoorMaze,
    position: Position,
    doors: DoorStates,
    status: GameStatus,
}

impl DoorMazeEngine {
    pub fn new(maze: DoorMaze) -> Self {
        let position = maze.start();
        DoorMazeEngine {
            maze,
            position,
            doors: DoorStates::default(),
            status: GameStatus::Playing,
        }
    }

    /// Swaps in another maze and resets position, doors and status.
    pub fn load_maze(&mut self, maze: DoorMaze) {
        info!(
            "Loading {}x{} door maze starting at {}",
            maze.grid().width(),
            maze.grid().height(),
            maze.start()
        );
        *self = DoorMazeEngine::new(maze);
    }

    /// Restarts the current maze.
    pub fn reset(&mut self) {
        self.position = self.maze.start();
        self.doors = DoorStates::default();
        self.status = GameStatus::Playing;
    }

    pub fn maze(&self) -> &DoorMaze {
        &self.maze
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn door_state(&self, color: DoorColor) -> DoorSide {
        self.doors.get(color)
    }

    pub fn door_states(&self) -> &DoorStates {
        &self.doors
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status == GameStatus::Won
    }

    /// For door cells, whether the cell can currently be entered.
    /// Returns `None` for any other cell.
    pub fn door_cell_open(&self, position: Position) -> Option<bool> {
        match self.maze.cell(position)?.feature {
            Some(CellFeature::Door { color, part }) => Some(self.door_part_open(color, part)),
            _ => None,
        }
    }

    fn door_part_open(&self, color: DoorColor, part: DoorPart) -> bool {
        match part {
            DoorPart::LeftEnd => self.doors.get(color) == DoorSide::Left,
            DoorPart::RightEnd => self.doors.get(color) == DoorSide::Right,
            DoorPart::Middle => false,
        }
    }

    pub fn can_move(&self, next: Position) -> bool {
        self.check_move(next).is_ok()
    }

    pub fn check_move(&self, next: Position) -> Result<(), IllegalMove> {
        if self.status == GameStatus::Won {
            return Err(IllegalMove::GameOver);
        }
        let grid = self.maze.grid();
        let Some(dest) = grid.get(next.x, next.y) else {
            return Err(IllegalMove::OutOfBounds {
                x: isize::try_from(next.x).unwrap_or(isize::MAX),
                y: isize::try_from(next.y).unwrap_or(isize::MAX),
            });
        };
        let heading = Heading::between(self.position, next).ok_or(IllegalMove::NotAdjacent {
            from: self.position,
            to: next,
        })?;

        // Only the wall of the cell being left is consulted.
        if grid[self.position].walls.blocks(heading) {
            return Err(IllegalMove::Wall { side: heading });
        }

        match dest.feature {
            Some(CellFeature::Door {
                color,
                part: DoorPart::Middle,
            }) => Err(IllegalMove::DoorInterior { color }),
            Some(CellFeature::Door { color, part }) if !self.door_part_open(color, part) => {
                Err(IllegalMove::DoorClosed { color })
            }
            _ => Ok(()),
        }
    }

    /// Moves the explorer to `next` if the move is legal.
    ///
    /// An illegal request leaves the engine untouched and reports why.
    pub fn apply_move(&mut self, next: Position) -> MoveOutcome {
        if let Err(reason) = self.check_move(next) {
            trace!("Rejected door move {} -> {}: {}", self.position, next, reason);
            return MoveOutcome::Rejected(reason);
        }

        self.position = next;
        let cell = self.maze.grid()[next];

        let door_changed = match cell.feature {
            Some(CellFeature::Switch { color, side }) => {
                let previous = self.doors.set(color, side);
                if previous != side {
                    debug!("{color:?} door now open on the {side:?}");
                }
                Some(DoorChange { color, side })
            }
            _ => None,
        };

        if cell.exit {
            self.status = GameStatus::Won;
            info!("Door maze exit reached at {}", next);
        }
        debug!("Moved to {}", next);

        MoveOutcome::Accepted(MoveReport {
            position: next,
            step_size: None,
            door_changed,
            terminal: cell.exit,
        })
    }

    /// Entry point for an arrow key.
    pub fn request_move(&mut self, heading: Heading) -> MoveOutcome {
        if self.status == GameStatus::Won {
            return MoveOutcome::Rejected(IllegalMove::GameOver);
        }
        let (dx, dy) = heading.delta();
        match self.maze.grid().offset(self.position, dx, dy) {
            Some(next) => self.apply_move(next),
            None => MoveOutcome::Rejected(IllegalMove::OutOfBounds {
                x: self.position.x as isize + dx,
                y: self.position.y as isize + dy,
            }),
        }
    }

    /// Entry point for an explicit target cell.
    pub fn request_move_to(&mut self, target: Position) -> MoveOutcome {
        self.apply_move(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SMALL: &str = "
        s,,r>,r<
        Lrd-,rd,rd,Rrd+
        ,,,e
    ";

    fn small() -> DoorMazeEngine {
        DoorMazeEngine::new(DoorMaze::parse(SMALL).unwrap())
    }

    /// An open grid with the start at `start` and the exit in the far corner.
    fn open_maze(width: usize, height: usize, start: Position) -> DoorMaze {
        let source: Vec<String> = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| {
                        if (x, y) == (start.x, start.y) {
                            "s"
                        } else if (x, y) == (width - 1, height - 1) {
                            "e"
                        } else {
                            ""
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();
        DoorMaze::parse(&source.join("\n")).unwrap()
    }

    #[test]
    fn tags_are_order_insensitive() {
        assert_eq!(DoorCell::parse("Lrd-"), DoorCell::parse("-drL"));
        let cell = DoorCell::parse("TRBc<").unwrap();
        assert!(cell.walls.top && cell.walls.right && cell.walls.bottom && !cell.walls.left);
        assert_eq!(
            cell.feature,
            Some(CellFeature::Switch {
                color: DoorColor::Cyan,
                side: DoorSide::Left
            })
        );
        let cell = DoorCell::parse("TLe*").unwrap();
        assert!(cell.exit && cell.goal_corner && cell.feature.is_none());
        assert_eq!(DoorCell::parse(""), Ok(DoorCell::default()));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(DoorCell::parse("Tx").is_err());
        assert!(DoorCell::parse("r").is_err());
        assert!(DoorCell::parse("d-").is_err());
        assert!(DoorCell::parse("rd<").is_err());
        assert!(DoorCell::parse("rgd").is_err());
        assert!(DoorCell::parse("r<>").is_err());
    }

    #[test]
    fn parse_validates_structure() {
        let invalid = [
            "",
            "s,\n,,e",
            ",\n,e",
            "s,s\n,e",
            "s,\n,",
            "s,g>\n,e",
            "s,gd-,gd+\n,,e",
            "s,gd-,gd,gd\n,,,e",
            "s,gd-,,gd+\n,,,e",
        ];
        for source in invalid {
            assert!(
                matches!(DoorMaze::parse(source), Err(MazeError::InvalidMazeData(_))),
                "{source:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_finds_start_and_tracks() {
        let maze = DoorMaze::parse(SMALL).unwrap();
        assert_eq!(maze.start(), Position::new(0, 0));
        assert_eq!(
            maze.door_track(DoorColor::Red),
            Some(DoorTrack {
                color: DoorColor::Red,
                left_end: Position::new(0, 1),
                right_end: Position::new(3, 1),
            })
        );
        assert_eq!(maze.door_track(DoorColor::Green), None);
        assert_eq!(maze.doors().count(), 1);
    }

    #[test]
    fn doors_start_open_on_the_left() {
        let engine = small();
        for (_, side) in engine.door_states().iter() {
            assert_eq!(side, DoorSide::Left);
        }
        assert_eq!(engine.door_cell_open(Position::new(0, 1)), Some(true));
        assert_eq!(engine.door_cell_open(Position::new(1, 1)), Some(false));
        assert_eq!(engine.door_cell_open(Position::new(3, 1)), Some(false));
        assert_eq!(engine.door_cell_open(Position::new(0, 0)), None);
    }

    #[test]
    fn door_middle_is_never_passable() {
        let mut engine = small();
        assert!(engine.request_move(Heading::Right).accepted());
        assert_eq!(
            engine.check_move(Position::new(1, 1)),
            Err(IllegalMove::DoorInterior {
                color: DoorColor::Red
            })
        );
    }

    #[test]
    fn switch_flips_both_ends_at_once() {
        let mut engine = small();
        assert!(engine.request_move(Heading::Right).accepted());
        let outcome = engine.request_move(Heading::Right);
        assert_eq!(
            outcome.report().and_then(|r| r.door_changed),
            Some(DoorChange {
                color: DoorColor::Red,
                side: DoorSide::Right
            })
        );
        assert_eq!(engine.door_state(DoorColor::Red), DoorSide::Right);
        assert_eq!(engine.door_cell_open(Position::new(0, 1)), Some(false));
        assert_eq!(engine.door_cell_open(Position::new(3, 1)), Some(true));
        for color in [DoorColor::Green, DoorColor::Cyan, DoorColor::Magenta] {
            assert_eq!(engine.door_state(color), DoorSide::Left);
        }

        // Stepping onto the '<' switch closes the right end again.
        assert!(engine.request_move(Heading::Right).accepted());
        assert_eq!(
            engine.check_move(Position::new(3, 1)),
            Err(IllegalMove::DoorClosed {
                color: DoorColor::Red
            })
        );
    }

    #[test]
    fn switch_already_in_place_is_accepted_without_change() {
        let mut engine = DoorMazeEngine::new(
            DoorMaze::parse("s,r<,r<\nLrd-,rd,Rrd+\n,,e").unwrap(),
        );
        let before = *engine.door_states();
        let outcome = engine.request_move(Heading::Right);
        assert!(outcome.accepted());
        assert_eq!(*engine.door_states(), before);
        assert!(engine.request_move(Heading::Right).accepted());
        assert_eq!(*engine.door_states(), before);
    }

    #[test]
    fn walls_are_checked_on_the_source_cell_only() {
        let mut engine = DoorMazeEngine::new(DoorMaze::parse("s,L\n,e").unwrap());
        // The wall is only marked on the destination, so the move goes through.
        assert!(engine.request_move(Heading::Right).accepted());
        assert_eq!(
            engine.request_move(Heading::Left),
            MoveOutcome::Rejected(IllegalMove::Wall {
                side: Heading::Left
            })
        );
        assert_eq!(engine.position(), Position::new(1, 0));
    }

    #[test]
    fn exit_is_terminal_until_reset() {
        let mut engine = DoorMazeEngine::new(DoorMaze::parse("s,e").unwrap());
        let outcome = engine.request_move(Heading::Right);
        assert!(outcome.is_terminal());
        assert!(engine.is_terminal());
        assert_eq!(
            engine.request_move(Heading::Left),
            MoveOutcome::Rejected(IllegalMove::GameOver)
        );
        assert_eq!(
            engine.request_move_to(Position::new(0, 0)),
            MoveOutcome::Rejected(IllegalMove::GameOver)
        );

        engine.reset();
        assert_eq!(engine.position(), Position::new(0, 0));
        assert!(engine.request_move(Heading::Right).accepted());
    }

    #[test]
    fn reset_restores_doors() {
        let mut engine = small();
        engine.request_move(Heading::Right);
        engine.request_move(Heading::Right);
        assert_eq!(engine.door_state(DoorColor::Red), DoorSide::Right);
        engine.reset();
        assert_eq!(engine.door_state(DoorColor::Red), DoorSide::Left);
        assert_eq!(engine.position(), Position::new(0, 0));
    }

    #[test]
    fn keyboard_moves_off_the_grid_are_rejected() {
        let mut engine = small();
        assert_eq!(
            engine.request_move(Heading::Up),
            MoveOutcome::Rejected(IllegalMove::OutOfBounds { x: 0, y: -1 })
        );
        assert_eq!(
            engine.request_move_to(Position::new(9, 0)),
            MoveOutcome::Rejected(IllegalMove::OutOfBounds { x: 9, y: 0 })
        );
    }

    proptest! {
        #[test]
        fn only_orthogonal_neighbours_are_reachable(tx in 0usize..5, ty in 0usize..5) {
            let engine = DoorMazeEngine::new(open_maze(5, 5, Position::new(2, 2)));
            let distance = tx.abs_diff(2) + ty.abs_diff(2);
            prop_assert_eq!(engine.can_move(Position::new(tx, ty)), distance == 1);
        }
    }
}
