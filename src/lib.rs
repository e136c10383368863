//! Snake Arena - a multi-threaded arcade snake simulation
//!
//! Core modules:
//! - `sim`: Simulation (world objects, registry, snake, spawns, clock)
//! - `coordinator`: Render/physics/logic loops and cooperative signals
//! - `input`: Running/Paused input handler state machine
//! - `config`: Typed configuration with logged defaults
//! - `audio` / `render`: Seams for the audio and video collaborators

pub mod audio;
pub mod config;
pub mod coordinator;
pub mod input;
pub mod render;
pub mod sim;

pub use config::Config;
pub use coordinator::{Coordinator, Signals};

use glam::IVec2;

/// Engine constants that are not exposed through configuration
pub mod consts {
    /// Polling cadence shared by the physics and logic loops (ms)
    pub const LOOP_POLL_MS: u64 = 5;
    /// Candidate positions tried per spawn before giving up for this tick
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 32;
    /// Slowest allowed snake speed (grid steps per second)
    pub const MIN_SNAKE_SPEED: u32 = 1;
    /// Fastest allowed snake speed (grid steps per second)
    pub const MAX_SNAKE_SPEED: u32 = 60;
}

/// Cardinal movement direction on the grid (screen coordinates, y grows down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Relative turn applied to the current heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

impl Direction {
    /// Unit step for this direction
    #[inline]
    pub fn step(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Heading after a quarter turn
    pub fn turned(self, turn: Turn) -> Self {
        match (self, turn) {
            (Direction::Up, Turn::Left) | (Direction::Down, Turn::Right) => Direction::Left,
            (Direction::Up, Turn::Right) | (Direction::Down, Turn::Left) => Direction::Right,
            (Direction::Left, Turn::Left) | (Direction::Right, Turn::Right) => Direction::Down,
            (Direction::Left, Turn::Right) | (Direction::Right, Turn::Left) => Direction::Up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_is_quarter_rotation() {
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            let left = dir.turned(Turn::Left);
            let right = dir.turned(Turn::Right);
            assert_eq!(left.opposite(), right);
            assert_eq!(left.turned(Turn::Right), dir);
            // Quarter turns are perpendicular to the original heading
            assert_eq!(left.step().dot(dir.step()), 0);
        }
    }

    #[test]
    fn test_screen_up_is_negative_y() {
        assert_eq!(Direction::Up.step(), IVec2::new(0, -1));
        assert_eq!(Direction::Right.turned(Turn::Left), Direction::Up);
    }
}
