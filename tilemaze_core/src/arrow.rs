//! Arrow maze: a token may leave a tile only along one of the tile's arrows,
//! and only by exactly the current step size.
//!
//! Each tile is a packed `u16`:
//!
//! | bits     | meaning                                              |
//! |----------|------------------------------------------------------|
//! | `0x00FF` | direction mask, one bit per [`Direction`]            |
//! | `0x0300` | step modifier applied on entry ([`StepModifier`])    |
//! | `0x0C00` | tile category, cosmetic only ([`TileCategory`])      |
//!
//! A maze record is a four word header `[id, start_row, start_col, reserved]`
//! followed by the 10×10 tiles in row-major order.

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::{
    GameStatus, IllegalMove, MazeError, MoveOutcome, MoveReport, Position, map::Grid,
};

/// Width and height of every arrow maze.
pub const ARROW_MAZE_SIZE: usize = 10;
/// Number of header words preceding the tiles.
pub const HEADER_LEN: usize = 4;
/// Total length of an encoded maze record.
pub const RECORD_LEN: usize = HEADER_LEN + ARROW_MAZE_SIZE * ARROW_MAZE_SIZE;

const DIRECTION_BITS: u16 = 0x00FF;
const MODIFIER_BITS: u16 = 0x0300;
const CATEGORY_BITS: u16 = 0x0C00;

/// One of the eight compass directions. North is towards row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The bit this direction occupies in a tile's direction mask.
    pub fn mask(self) -> u8 {
        match self {
            Direction::NorthEast => 0x01,
            Direction::SouthEast => 0x02,
            Direction::SouthWest => 0x04,
            Direction::NorthWest => 0x08,
            Direction::North => 0x10,
            Direction::East => 0x20,
            Direction::South => 0x40,
            Direction::West => 0x80,
        }
    }

    /// Unit offset `(dx, dy)` of this direction.
    pub fn unit(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    /// Classifies an offset by the sign of each axis.
    ///
    /// Returns `None` only for the null offset. Callers must check that the
    /// offset actually lies on a ray; `(2, 1)` classifies as south-east.
    pub fn from_signs(dx: isize, dy: isize) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Direction::North),
            (1, -1) => Some(Direction::NorthEast),
            (1, 0) => Some(Direction::East),
            (1, 1) => Some(Direction::SouthEast),
            (0, 1) => Some(Direction::South),
            (-1, 1) => Some(Direction::SouthWest),
            (-1, 0) => Some(Direction::West),
            (-1, -1) => Some(Direction::NorthWest),
            _ => None,
        }
    }
}

/// Change applied to the step size when a tile is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepModifier {
    #[default]
    None,
    Decrement,
    Increment,
}

impl StepModifier {
    pub fn delta(self) -> isize {
        match self {
            StepModifier::None => 0,
            StepModifier::Decrement => -1,
            StepModifier::Increment => 1,
        }
    }
}

/// Cosmetic tile category. Interior tiles are background and are not offered
/// as click targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileCategory {
    #[default]
    Interior,
    /// Category B tile.
    Blue,
    /// Category G tile.
    Green,
}

/// A decoded arrow-maze tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArrowCell {
    directions: u8,
    modifier: StepModifier,
    category: TileCategory,
}

impl ArrowCell {
    /// Decodes one packed tile word.
    pub fn decode(word: u16) -> Result<Self, MazeError> {
        if word & !(DIRECTION_BITS | MODIFIER_BITS | CATEGORY_BITS) != 0 {
            return Err(MazeError::InvalidMazeData(format!(
                "tile word {word:#06x} uses reserved bits"
            )));
        }
        let modifier = match word & MODIFIER_BITS {
            0x0000 => StepModifier::None,
            0x0100 => StepModifier::Decrement,
            0x0200 => StepModifier::Increment,
            _ => {
                return Err(MazeError::InvalidMazeData(format!(
                    "tile word {word:#06x} both increments and decrements the step size"
                )));
            }
        };
        let category = match word & CATEGORY_BITS {
            0x0000 => TileCategory::Interior,
            0x0400 => TileCategory::Blue,
            0x0800 => TileCategory::Green,
            _ => {
                return Err(MazeError::InvalidMazeData(format!(
                    "tile word {word:#06x} has an unknown category"
                )));
            }
        };
        Ok(ArrowCell {
            directions: (word & DIRECTION_BITS) as u8,
            modifier,
            category,
        })
    }

    /// Raw direction mask.
    pub fn direction_mask(&self) -> u8 {
        self.directions
    }

    pub fn has(&self, direction: Direction) -> bool {
        self.directions & direction.mask() != 0
    }

    /// Directions this tile allows leaving along.
    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(move |d| self.has(*d))
    }

    /// A tile without any arrows is the goal.
    pub fn is_goal(&self) -> bool {
        self.directions == 0
    }

    pub fn modifier(&self) -> StepModifier {
        self.modifier
    }

    pub fn category(&self) -> TileCategory {
        self.category
    }
}

/// An immutable, decoded arrow maze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrowMaze {
    id: u16,
    start: Position,
    grid: Grid<ArrowCell>,
}

impl ArrowMaze {
    /// Decodes a maze record: the header followed by 100 tile words.
    pub fn decode(words: &[u16]) -> Result<Self, MazeError> {
        if words.len() != RECORD_LEN {
            return Err(MazeError::InvalidMazeData(format!(
                "expected {RECORD_LEN} words, found {}",
                words.len()
            )));
        }
        let (header, tiles) = words.split_at(HEADER_LEN);
        let id = header[0];
        let start = Position {
            x: usize::from(header[2]),
            y: usize::from(header[1]),
        };

        let cells = tiles
            .iter()
            .map(|word| ArrowCell::decode(*word))
            .collect::<Result<Vec<_>, _>>()?;
        let grid = Grid::from_cells(ARROW_MAZE_SIZE, ARROW_MAZE_SIZE, cells)?;

        if !grid.is_valid(start.x, start.y) {
            return Err(MazeError::InvalidMazeData(format!(
                "start {start} lies outside the maze"
            )));
        }

        Ok(ArrowMaze { id, start, grid })
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn grid(&self) -> &Grid<ArrowCell> {
        &self.grid
    }

    pub fn cell(&self, position: Position) -> Option<&ArrowCell> {
        self.grid.get(position.x, position.y)
    }

    /// True for tiles a player may click on (every non-interior tile).
    pub fn is_selectable(&self, position: Position) -> bool {
        self.cell(position)
            .is_some_and(|cell| cell.category() != TileCategory::Interior)
    }

    /// Positions of every goal tile.
    pub fn goals(&self) -> Vec<Position> {
        self.grid
            .enumerate()
            .filter_map(|(pos, cell)| cell.is_goal().then_some(pos))
            .collect()
    }
}

/// Session state for one arrow maze.
#[derive(Debug, Clone)]
pub struct ArrowMazeEngine {
    maze: ArrowMaze,
    position: Position,
    step_size: isize,
    status: GameStatus,
}

impl ArrowMazeEngine {
    pub fn new(maze: ArrowMaze) -> Self {
        let position = maze.start();
        ArrowMazeEngine {
            maze,
            position,
            step_size: 1,
            status: GameStatus::Playing,
        }
    }

    /// Swaps in another maze and resets position, step size and status.
    pub fn load_maze(&mut self, maze: ArrowMaze) {
        info!("Loading arrow maze {} starting at {}", maze.id(), maze.start());
        *self = ArrowMazeEngine::new(maze);
    }

    /// Restarts the current maze.
    pub fn reset(&mut self) {
        self.position = self.maze.start();
        self.step_size = 1;
        self.status = GameStatus::Playing;
    }

    pub fn maze(&self) -> &ArrowMaze {
        &self.maze
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn step_size(&self) -> isize {
        self.step_size
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status == GameStatus::Won
    }

    /// True iff the tile at `(x, y)` has no arrows. Off-grid tiles are never goals.
    pub fn is_goal(&self, x: usize, y: usize) -> bool {
        self.maze.grid().get(x, y).is_some_and(ArrowCell::is_goal)
    }

    pub fn can_move(&self, dx: isize, dy: isize) -> bool {
        self.check_move(dx, dy).is_ok()
    }

    /// Validates an offset from the current position and returns the destination.
    pub fn check_move(&self, dx: isize, dy: isize) -> Result<Position, IllegalMove> {
        if self.status == GameStatus::Won {
            return Err(IllegalMove::GameOver);
        }
        if dx == 0 && dy == 0 {
            return Err(IllegalMove::NullMove);
        }
        if dx != 0 && dy != 0 && dx.unsigned_abs() != dy.unsigned_abs() {
            return Err(IllegalMove::OffRay { dx, dy });
        }
        let step = self.step_size;
        if (dx != 0 && dx.checked_abs() != Some(step)) || (dy != 0 && dy.checked_abs() != Some(step))
        {
            return Err(IllegalMove::WrongStepSize {
                dx,
                dy,
                step_size: step,
            });
        }
        let direction = Direction::from_signs(dx, dy).ok_or(IllegalMove::NullMove)?;

        let source = self.maze.grid()[self.position];
        if !source.has(direction) {
            return Err(IllegalMove::NoArrow { direction });
        }

        self.maze
            .grid()
            .offset(self.position, dx, dy)
            .ok_or(IllegalMove::OutOfBounds {
                x: (self.position.x as isize).saturating_add(dx),
                y: (self.position.y as isize).saturating_add(dy),
            })
    }

    /// Moves the token to `dest` if the implied offset is legal.
    ///
    /// An illegal request leaves the engine untouched and reports why.
    pub fn apply_move(&mut self, dest: Position) -> MoveOutcome {
        let Some((dx, dy)) = signed_offset(self.position, dest) else {
            return MoveOutcome::Rejected(IllegalMove::OutOfBounds {
                x: isize::try_from(dest.x).unwrap_or(isize::MAX),
                y: isize::try_from(dest.y).unwrap_or(isize::MAX),
            });
        };

        let dest = match self.check_move(dx, dy) {
            Ok(dest) => dest,
            Err(reason) => {
                trace!("Rejected arrow move {} -> {}: {}", self.position, dest, reason);
                return MoveOutcome::Rejected(reason);
            }
        };

        self.position = dest;
        let cell = self.maze.grid()[dest];
        // No floor: a step size of 0 or less leaves the token stuck.
        self.step_size += cell.modifier().delta();

        let terminal = cell.is_goal();
        if terminal {
            self.status = GameStatus::Won;
            info!("Arrow maze {} solved at {}", self.maze.id(), dest);
        }
        debug!("Moved to {} with step size {}", dest, self.step_size);

        MoveOutcome::Accepted(MoveReport {
            position: dest,
            step_size: Some(self.step_size),
            door_changed: None,
            terminal,
        })
    }

    /// Entry point for a clicked tile.
    pub fn request_move(&mut self, target: Position) -> MoveOutcome {
        self.apply_move(target)
    }
}

fn signed_offset(from: Position, to: Position) -> Option<(isize, isize)> {
    let dx = isize::try_from(to.x)
        .ok()?
        .checked_sub(isize::try_from(from.x).ok()?)?;
    let dy = isize::try_from(to.y)
        .ok()?
        .checked_sub(isize::try_from(from.y).ok()?)?;
    Some((dx, dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OPEN: u16 = 0x04FF;

    /// Builds a maze full of all-direction tiles with the given overrides.
    fn maze_with(start: Position, tiles: &[(Position, u16)]) -> ArrowMaze {
        let mut words = vec![OPEN; RECORD_LEN];
        words[0] = 99;
        words[1] = start.y as u16;
        words[2] = start.x as u16;
        words[3] = 0;
        for (pos, word) in tiles {
            words[HEADER_LEN + pos.y * ARROW_MAZE_SIZE + pos.x] = *word;
        }
        ArrowMaze::decode(&words).unwrap()
    }

    #[test]
    fn direction_masks_match_encoding() {
        let masks: Vec<u8> = Direction::ALL.iter().map(|d| d.mask()).collect();
        assert_eq!(masks, vec![0x10, 0x01, 0x20, 0x02, 0x40, 0x04, 0x80, 0x08]);
        for direction in Direction::ALL {
            let (dx, dy) = direction.unit();
            assert_eq!(Direction::from_signs(dx * 3, dy * 3), Some(direction));
        }
        assert_eq!(Direction::from_signs(0, 0), None);
    }

    #[test]
    fn decode_rejects_malformed_records() {
        assert!(matches!(
            ArrowMaze::decode(&[1, 0, 0, 0]),
            Err(MazeError::InvalidMazeData(_))
        ));

        let mut words = vec![OPEN; RECORD_LEN];
        words[1] = 10;
        assert!(matches!(
            ArrowMaze::decode(&words),
            Err(MazeError::InvalidMazeData(_))
        ));

        assert!(ArrowCell::decode(0x0310).is_err());
        assert!(ArrowCell::decode(0x0C10).is_err());
        assert!(ArrowCell::decode(0x1010).is_err());
    }

    #[test]
    fn decode_splits_fields() {
        let cell = ArrowCell::decode(0x0A22).unwrap();
        assert_eq!(cell.direction_mask(), 0x22);
        assert_eq!(cell.modifier(), StepModifier::Increment);
        assert_eq!(cell.category(), TileCategory::Green);
        assert_eq!(
            cell.directions().collect::<Vec<_>>(),
            vec![Direction::East, Direction::SouthEast]
        );
        assert!(!cell.is_goal());
        assert!(ArrowCell::decode(0x0500).unwrap().is_goal());
    }

    #[test]
    fn load_reads_start_from_header() {
        let engine = ArrowMazeEngine::new(maze_with(Position::new(7, 2), &[]));
        assert_eq!(engine.position(), Position::new(7, 2));
        assert_eq!(engine.step_size(), 1);
        assert!(!engine.is_terminal());
    }

    #[test]
    fn null_and_off_ray_moves_are_rejected() {
        let engine = ArrowMazeEngine::new(maze_with(Position::new(4, 4), &[]));
        assert_eq!(engine.check_move(0, 0), Err(IllegalMove::NullMove));
        assert_eq!(
            engine.check_move(2, 1),
            Err(IllegalMove::OffRay { dx: 2, dy: 1 })
        );
        assert_eq!(
            engine.check_move(2, 0),
            Err(IllegalMove::WrongStepSize {
                dx: 2,
                dy: 0,
                step_size: 1
            })
        );
    }

    #[test]
    fn missing_arrow_blocks_move() {
        let start = Position::new(4, 4);
        let engine = ArrowMazeEngine::new(maze_with(start, &[(start, 0x0420)]));
        assert!(engine.can_move(1, 0));
        assert_eq!(
            engine.check_move(-1, 0),
            Err(IllegalMove::NoArrow {
                direction: Direction::West
            })
        );
    }

    #[test]
    fn moves_off_the_grid_are_rejected() {
        let engine = ArrowMazeEngine::new(maze_with(Position::new(0, 0), &[]));
        assert_eq!(
            engine.check_move(-1, -1),
            Err(IllegalMove::OutOfBounds { x: -1, y: -1 })
        );
    }

    #[test]
    fn modifiers_adjust_step_size() {
        let start = Position::new(4, 4);
        let mut engine = ArrowMazeEngine::new(maze_with(
            start,
            &[
                (Position::new(5, 4), 0x06FF),
                (Position::new(7, 4), 0x05FF),
            ],
        ));

        let outcome = engine.apply_move(Position::new(5, 4));
        assert_eq!(outcome.report().and_then(|r| r.step_size), Some(2));

        assert!(!engine.can_move(1, 0));
        let outcome = engine.apply_move(Position::new(7, 4));
        assert!(outcome.accepted());
        assert_eq!(engine.step_size(), 1);
        assert_eq!(engine.position(), Position::new(7, 4));
    }

    #[test]
    fn step_size_is_not_clamped_at_zero() {
        let start = Position::new(4, 4);
        let mut engine =
            ArrowMazeEngine::new(maze_with(start, &[(Position::new(4, 3), 0x05FF)]));

        assert!(engine.apply_move(Position::new(4, 3)).accepted());
        assert_eq!(engine.step_size(), 0);

        for direction in Direction::ALL {
            let (ux, uy) = direction.unit();
            for length in 0..ARROW_MAZE_SIZE as isize {
                assert!(!engine.can_move(ux * length, uy * length));
            }
        }
    }

    #[test]
    fn illegal_apply_is_a_no_op() {
        let start = Position::new(4, 4);
        let mut engine = ArrowMazeEngine::new(maze_with(start, &[]));
        let outcome = engine.apply_move(Position::new(6, 5));
        assert_eq!(
            outcome,
            MoveOutcome::Rejected(IllegalMove::OffRay { dx: 2, dy: 1 })
        );
        assert_eq!(engine.position(), start);
        assert_eq!(engine.step_size(), 1);
    }

    #[test]
    fn reaching_goal_ends_the_session() {
        let start = Position::new(4, 4);
        let goal = Position::new(5, 5);
        let mut engine = ArrowMazeEngine::new(maze_with(start, &[(goal, 0x0400)]));
        assert!(engine.is_goal(5, 5));
        assert!(!engine.is_goal(4, 4));
        assert!(!engine.is_goal(10, 0));

        let outcome = engine.apply_move(goal);
        assert!(outcome.is_terminal());
        assert!(engine.is_terminal());
        assert_eq!(engine.check_move(-1, -1), Err(IllegalMove::GameOver));

        engine.reset();
        assert_eq!(engine.position(), start);
        assert_eq!(engine.status(), GameStatus::Playing);
    }

    #[test]
    fn load_maze_resets_state() {
        let start = Position::new(4, 4);
        let mut engine =
            ArrowMazeEngine::new(maze_with(start, &[(Position::new(5, 4), 0x06FF)]));
        engine.apply_move(Position::new(5, 4));
        assert_eq!(engine.step_size(), 2);

        engine.load_maze(maze_with(Position::new(1, 8), &[]));
        assert_eq!(engine.position(), Position::new(1, 8));
        assert_eq!(engine.step_size(), 1);
    }

    #[test]
    fn interior_tiles_are_not_selectable() {
        let maze = maze_with(Position::new(4, 4), &[(Position::new(0, 0), 0x00FF)]);
        assert!(!maze.is_selectable(Position::new(0, 0)));
        assert!(maze.is_selectable(Position::new(1, 0)));
        assert!(!maze.is_selectable(Position::new(10, 0)));
    }

    fn any_direction() -> impl Strategy<Value = Direction> {
        proptest::sample::select(Direction::ALL.to_vec())
    }

    fn any_modifier() -> impl Strategy<Value = (u16, isize)> {
        prop_oneof![Just((0x0000, 0)), Just((0x0100, -1)), Just((0x0200, 1))]
    }

    proptest! {
        #[test]
        fn move_accepted_iff_arrow_present(
            step in 1isize..=4,
            direction in any_direction(),
            mask in any::<u8>(),
        ) {
            let start = Position::new(4, 4);
            let mut engine = ArrowMazeEngine::new(maze_with(start, &[(start, 0x0400 | u16::from(mask))]));
            engine.step_size = step;
            let (ux, uy) = direction.unit();
            prop_assert_eq!(engine.can_move(ux * step, uy * step), mask & direction.mask() != 0);
        }

        #[test]
        fn null_move_always_rejected(mask in any::<u8>(), step in -2isize..=5) {
            let start = Position::new(4, 4);
            let mut engine = ArrowMazeEngine::new(maze_with(start, &[(start, 0x0800 | u16::from(mask))]));
            engine.step_size = step;
            prop_assert!(!engine.can_move(0, 0));
        }

        #[test]
        fn off_ray_offsets_always_rejected(dx in -9isize..=9, dy in -9isize..=9) {
            prop_assume!(dx != 0 && dy != 0 && dx.abs() != dy.abs());
            let engine = ArrowMazeEngine::new(maze_with(Position::new(4, 4), &[]));
            prop_assert_eq!(engine.check_move(dx, dy), Err(IllegalMove::OffRay { dx, dy }));
        }

        #[test]
        fn modifier_shifts_step_by_exactly_one(
            step in 1isize..=4,
            direction in any_direction(),
            (modifier, delta) in any_modifier(),
        ) {
            let start = Position::new(4, 4);
            let (ux, uy) = direction.unit();
            let dest = Position::new((4 + ux * step) as usize, (4 + uy * step) as usize);
            let mut engine = ArrowMazeEngine::new(maze_with(start, &[(dest, OPEN | modifier)]));
            engine.step_size = step;
            prop_assert!(engine.apply_move(dest).accepted());
            prop_assert_eq!(engine.step_size(), step + delta);
        }
    }
}
