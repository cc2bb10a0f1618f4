use std::fmt::Debug;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    MoveOutcome, Position,
    arrow::ArrowMazeEngine,
    door::{DoorMazeEngine, Heading},
};

/// Common surface of both maze engines, as seen by an input source.
pub trait MazeSession {
    /// What an input device submits: a tile for the arrow maze, a key for the door maze.
    type Input: Copy + Debug;

    fn position(&self) -> Position;

    fn is_terminal(&self) -> bool;

    /// Every input a device could issue from the current state.
    fn inputs(&self) -> Vec<Self::Input>;

    /// Whether `input` would currently be accepted.
    fn accepts(&self, input: Self::Input) -> bool;

    fn submit(&mut self, input: Self::Input) -> MoveOutcome;

    fn reset(&mut self);
}

impl MazeSession for ArrowMazeEngine {
    type Input = Position;

    fn position(&self) -> Position {
        ArrowMazeEngine::position(self)
    }

    fn is_terminal(&self) -> bool {
        ArrowMazeEngine::is_terminal(self)
    }

    fn inputs(&self) -> Vec<Position> {
        self.maze()
            .grid()
            .enumerate()
            .map(|(pos, _)| pos)
            .filter(|pos| self.maze().is_selectable(*pos))
            .collect()
    }

    fn accepts(&self, target: Position) -> bool {
        let from = ArrowMazeEngine::position(self);
        let dx = target.x as isize - from.x as isize;
        let dy = target.y as isize - from.y as isize;
        self.can_move(dx, dy)
    }

    fn submit(&mut self, target: Position) -> MoveOutcome {
        self.request_move(target)
    }

    fn reset(&mut self) {
        ArrowMazeEngine::reset(self)
    }
}

impl MazeSession for DoorMazeEngine {
    type Input = Heading;

    fn position(&self) -> Position {
        DoorMazeEngine::position(self)
    }

    fn is_terminal(&self) -> bool {
        DoorMazeEngine::is_terminal(self)
    }

    fn inputs(&self) -> Vec<Heading> {
        Heading::ALL.to_vec()
    }

    fn accepts(&self, heading: Heading) -> bool {
        let (dx, dy) = heading.delta();
        self.maze()
            .grid()
            .offset(DoorMazeEngine::position(self), dx, dy)
            .is_some_and(|next| self.can_move(next))
    }

    fn submit(&mut self, heading: Heading) -> MoveOutcome {
        self.request_move(heading)
    }

    fn reset(&mut self) {
        DoorMazeEngine::reset(self)
    }
}

/// Trait defining an automated input source.
pub trait Explorer<S: MazeSession> {
    /// Picks the next input, or `None` when there is nothing left to try.
    fn next_input(&mut self, session: &S) -> Option<S::Input>;
}

/// Wanders by picking uniformly among the currently legal inputs.
#[derive(Debug)]
pub struct RandomExplorer {
    rng: StdRng,
}

impl RandomExplorer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<S: MazeSession> Explorer<S> for RandomExplorer {
    fn next_input(&mut self, session: &S) -> Option<S::Input> {
        if session.is_terminal() {
            return None;
        }
        let legal: Vec<S::Input> = session
            .inputs()
            .into_iter()
            .filter(|input| session.accepts(*input))
            .collect();
        if legal.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..legal.len());
        Some(legal[index])
    }
}

/// Asks `explorer` for one input and submits it.
///
/// Returns `None` when the explorer has nothing to submit.
pub fn step<S, E>(session: &mut S, explorer: &mut E) -> Option<MoveOutcome>
where
    S: MazeSession,
    E: Explorer<S>,
{
    let input = explorer.next_input(session)?;
    Some(session.submit(input))
}
