//! Heading, action and state types.
//!
//! - `Heading` - one of four compass directions
//! - `HeadingCycle` - the fixed rotation order used by turn actions
//! - `RobotState` - heading plus obstacle flag, rendered as a snapshot
//! - `Action` - operator command token

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Compass heading of the simulated robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    /// North
    North,
    /// East
    East,
    /// South
    South,
    /// West
    West,
}

impl Heading {
    /// All headings in canonical order.
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    /// Lowercase token used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Heading::North => "north",
            Heading::East => "east",
            Heading::South => "south",
            Heading::West => "west",
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a heading token is not one of the four canonical values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown heading '{0}'")]
pub struct ParseHeadingError(pub String);

impl FromStr for Heading {
    type Err = ParseHeadingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Heading::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| ParseHeadingError(s.to_string()))
    }
}

/// Ordered rotation sequence for turn actions.
///
/// Turning right moves one position forward, turning left one position
/// backward, both wrapping modulo 4. Every heading appears exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[Heading; 4]", into = "[Heading; 4]")]
pub struct HeadingCycle([Heading; 4]);

impl HeadingCycle {
    /// Number of positions in the cycle.
    pub const LEN: usize = 4;

    /// Build a cycle from four headings.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if a heading is repeated.
    pub fn new(headings: [Heading; 4]) -> Result<Self, ConfigError> {
        for (idx, heading) in headings.iter().enumerate() {
            if headings[..idx].contains(heading) {
                return Err(ConfigError::ValidationError(format!(
                    "heading '{heading}' appears more than once in the heading cycle"
                )));
            }
        }
        Ok(Self(headings))
    }

    /// Headings in rotation order.
    pub fn headings(&self) -> &[Heading; 4] {
        &self.0
    }

    /// Heading at `index`, wrapping modulo 4.
    pub fn get(&self, index: usize) -> Heading {
        self.0[index % Self::LEN]
    }

    /// Position of `heading` in the cycle.
    pub fn position(&self, heading: Heading) -> usize {
        // Four distinct entries over a four-value enum always contain every heading.
        self.0.iter().position(|h| *h == heading).unwrap_or(0)
    }

    /// Heading one step backward (turn left).
    pub fn left_of(&self, heading: Heading) -> Heading {
        self.get(self.position(heading) + Self::LEN - 1)
    }

    /// Heading one step forward (turn right).
    pub fn right_of(&self, heading: Heading) -> Heading {
        self.get(self.position(heading) + 1)
    }
}

impl Default for HeadingCycle {
    fn default() -> Self {
        Self(Heading::ALL)
    }
}

impl TryFrom<[Heading; 4]> for HeadingCycle {
    type Error = ConfigError;

    fn try_from(headings: [Heading; 4]) -> Result<Self, Self::Error> {
        Self::new(headings)
    }
}

impl From<HeadingCycle> for [Heading; 4] {
    fn from(cycle: HeadingCycle) -> Self {
        cycle.0
    }
}

/// Current robot state: heading plus simulated obstacle flag.
///
/// `Display` renders the snapshot broadcast on every tick:
/// `"<heading> <obstacle>"`, e.g. `"east false"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RobotState {
    /// Current heading
    pub heading: Heading,
    /// Simulated obstacle flag
    pub obstacle: bool,
}

impl RobotState {
    /// Create a state from its parts.
    pub fn new(heading: Heading, obstacle: bool) -> Self {
        Self { heading, obstacle }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.heading, self.obstacle)
    }
}

/// Error returned when a snapshot string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseStateError {
    /// Snapshot did not contain exactly two tokens.
    #[error("malformed snapshot '{0}': expected '<heading> <obstacle>'")]
    Malformed(String),

    /// Heading token invalid.
    #[error(transparent)]
    Heading(#[from] ParseHeadingError),

    /// Obstacle token was not `true` or `false`.
    #[error("invalid obstacle flag '{0}'")]
    Obstacle(String),
}

impl FromStr for RobotState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let (Some(heading), Some(obstacle), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ParseStateError::Malformed(s.to_string()));
        };

        let heading = heading.parse::<Heading>()?;
        let obstacle = obstacle
            .parse::<bool>()
            .map_err(|_| ParseStateError::Obstacle(obstacle.to_string()))?;
        Ok(Self { heading, obstacle })
    }
}

/// Operator command.
///
/// Parsing is total: tokens outside the known set become
/// [`Action::Unrecognized`], which leaves the heading unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Keep the current heading.
    Continue,
    /// Rotate one step backward in the heading cycle.
    TurnLeft,
    /// Rotate one step forward in the heading cycle.
    TurnRight,
    /// Any other token, kept verbatim for logging.
    Unrecognized(String),
}

impl Action {
    /// Token for [`Action::Continue`].
    pub const CONTINUE: &'static str = "continue";
    /// Token for [`Action::TurnLeft`].
    pub const TURN_LEFT: &'static str = "turn_left";
    /// Token for [`Action::TurnRight`].
    pub const TURN_RIGHT: &'static str = "turn_right";

    /// Parse an action token. Surrounding whitespace is ignored.
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            Self::CONTINUE => Action::Continue,
            Self::TURN_LEFT => Action::TurnLeft,
            Self::TURN_RIGHT => Action::TurnRight,
            other => Action::Unrecognized(other.to_string()),
        }
    }

    /// Token form of this action.
    pub fn as_str(&self) -> &str {
        match self {
            Action::Continue => Self::CONTINUE,
            Action::TurnLeft => Self::TURN_LEFT,
            Action::TurnRight => Self::TURN_RIGHT,
            Action::Unrecognized(token) => token,
        }
    }

    /// Whether this is one of the three known commands.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Action::Unrecognized(_))
    }
}

impl From<&str> for Action {
    fn from(token: &str) -> Self {
        Action::parse(token)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
