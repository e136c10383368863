//! Render seam
//!
//! Once per render tick the coordinator captures a `Frame` (a read-only
//! snapshot of the graphics view plus HUD values) and hands it to the
//! embedder's `Renderer`.

use std::sync::Arc;

use crate::sim::object::{Bounds, Color, WorldObject};
use crate::sim::world::{GamePhase, GameWorld};

/// Everything needed to draw one frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub background: Color,
    /// Graphics view in draw order
    pub objects: Vec<Arc<WorldObject>>,
    /// Snake head cell, drawn over the body
    pub head: Option<Bounds>,
    pub head_color: Color,
    pub score: i64,
    pub phase: GamePhase,
    pub paused: bool,
}

impl Frame {
    pub fn capture(world: &GameWorld, paused: bool) -> Self {
        let config = world.config();
        let parts = world.frame_parts();
        Self {
            background: config.screen.bg_color,
            objects: parts.objects,
            head: parts.head,
            head_color: config.snake.head_color,
            score: parts.status.score,
            phase: parts.status.phase,
            paused,
        }
    }
}

/// Video collaborator
pub trait Renderer {
    fn draw(&mut self, frame: &Frame);
}

/// Logs HUD changes instead of drawing (headless runs)
#[derive(Debug, Default)]
pub struct LogRenderer {
    last: Option<(i64, GamePhase, bool)>,
    frames: u64,
}

impl LogRenderer {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for LogRenderer {
    fn draw(&mut self, frame: &Frame) {
        self.frames += 1;
        let hud = (frame.score, frame.phase, frame.paused);
        if self.last != Some(hud) {
            log::info!(
                "score {} | {:?}{} | {} objects",
                frame.score,
                frame.phase,
                if frame.paused { " (paused)" } else { "" },
                frame.objects.len()
            );
            self.last = Some(hud);
        }
    }
}
