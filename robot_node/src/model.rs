//! State-update policy for the simulated robot.
//!
//! `RobotModel` owns the heading cycle, the current state and the RNG used
//! for the obstacle flag. It performs no I/O and no logging; the node wraps
//! it in a mutex and logs around it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use robot_common::robot::types::{Action, Heading, HeadingCycle, RobotState};

/// Heading/obstacle state plus the noise source that drives it.
#[derive(Debug, Clone)]
pub struct RobotModel {
    cycle: HeadingCycle,
    state: RobotState,
    rng: StdRng,
}

impl RobotModel {
    /// Create a model with heading and obstacle drawn uniformly at random.
    ///
    /// A `seed` makes the whole run reproducible.
    pub fn new(cycle: HeadingCycle, seed: Option<u64>) -> Self {
        let mut rng = make_rng(seed);
        let heading = cycle.get(rng.gen_range(0..HeadingCycle::LEN));
        let obstacle = rng.gen_bool(0.5);
        Self {
            cycle,
            state: RobotState::new(heading, obstacle),
            rng,
        }
    }

    /// Create a model with a fixed starting heading; the obstacle flag is
    /// still drawn at random.
    pub fn with_heading(cycle: HeadingCycle, heading: Heading, seed: Option<u64>) -> Self {
        let mut rng = make_rng(seed);
        let obstacle = rng.gen_bool(0.5);
        Self {
            cycle,
            state: RobotState::new(heading, obstacle),
            rng,
        }
    }

    /// Apply one operator action and return the resulting state.
    ///
    /// Turns rotate by position in the heading cycle; `continue` and
    /// unrecognized tokens keep the heading. The obstacle flag is resampled
    /// last, for every action.
    pub fn apply(&mut self, action: &Action) -> RobotState {
        self.state.heading = match action {
            Action::TurnLeft => self.cycle.left_of(self.state.heading),
            Action::TurnRight => self.cycle.right_of(self.state.heading),
            Action::Continue | Action::Unrecognized(_) => self.state.heading,
        };
        self.state.obstacle = self.rng.gen_bool(0.5);
        self.state
    }

    /// Current state.
    pub fn state(&self) -> RobotState {
        self.state
    }

    /// Heading cycle used for turns.
    pub fn cycle(&self) -> &HeadingCycle {
        &self.cycle
    }

    /// Snapshot string: `"<heading> <obstacle>"`.
    pub fn snapshot(&self) -> String {
        self.state.to_string()
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
