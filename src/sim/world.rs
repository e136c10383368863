//! Game world: one snake, one spawn scheduler, the shared registry and score
//!
//! Every loop shares the world through an `Arc`. Locks are always taken in
//! the order spawns -> snake -> status, and each public operation takes each
//! lock at most once.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::clock::{Clock, Timer};
use super::object::{Bounds, ObjectIds, ObjectKind, Reaction, WorldObject};
use super::registry::ObjectRegistry;
use super::snake::{Segment, Snake};
use super::spawn::SpawnScheduler;
use crate::audio::{AudioSink, SoundCue};
use crate::config::{Config, SpawnEffect};
use crate::input::{Key, MouseButton};
use crate::{Direction, Turn};

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Snake is alive
    Playing,
    /// Snake hit a wall, a mine or itself; waiting for `reset`
    Lost,
}

/// Score and phase snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub score: i64,
    pub phase: GamePhase,
}

/// Consistent snapshot for drawing one frame
#[derive(Debug, Clone)]
pub struct FrameParts {
    /// Graphics view in draw order
    pub objects: Vec<Arc<WorldObject>>,
    pub head: Option<Bounds>,
    pub status: Status,
}

#[derive(Debug)]
struct StatusState {
    score: i64,
    phase: GamePhase,
    point_timer: Timer,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct GameWorld {
    config: Arc<Config>,
    clock: Clock,
    ids: Arc<ObjectIds>,
    registry: Arc<ObjectRegistry>,
    audio: Arc<dyn AudioSink>,
    spawns: Mutex<SpawnScheduler>,
    snake: Mutex<Snake>,
    status: Mutex<StatusState>,
}

impl GameWorld {
    pub fn new(
        config: Arc<Config>,
        clock: Clock,
        registry: Arc<ObjectRegistry>,
        audio: Arc<dyn AudioSink>,
    ) -> Self {
        let ids = Arc::new(ObjectIds::new());
        registry.clear();
        add_walls(&config, &ids, &registry);
        let snake = Snake::new(
            &config.snake,
            &clock,
            Arc::clone(&ids),
            config.screen.center(),
            &registry,
        );
        let spawns = SpawnScheduler::new(&config.spawns, config.seed, &clock, Arc::clone(&ids));
        let status = StatusState {
            score: 0,
            phase: GamePhase::Playing,
            point_timer: Timer::new(&clock),
        };
        log::info!(
            "World ready: {}x{} arena, {} walls, {} spawn classes",
            config.screen.width,
            config.screen.height,
            config.walls.len(),
            config.spawns.classes.len()
        );

        let world = Self {
            config,
            clock,
            ids,
            registry,
            audio,
            spawns: Mutex::new(spawns),
            snake: Mutex::new(snake),
            status: Mutex::new(status),
        };
        world.music(true);
        world
    }

    fn cue(&self, cue: SoundCue) {
        if self.config.sound {
            self.audio.play(cue);
        }
    }

    fn music(&self, playing: bool) {
        if self.config.music {
            self.audio.set_music(playing);
        }
    }

    /// Advance one logic tick: spawns, movement, points, collisions
    pub fn update(&self) -> GamePhase {
        let mut spawns = lock(&self.spawns);
        let mut snake = lock(&self.snake);
        if self.phase() == GamePhase::Lost {
            return GamePhase::Lost;
        }

        let report = spawns.tick(&self.registry);
        if report.spawned > 0 {
            self.cue(SoundCue::Spawn);
        }

        snake.update(&self.registry);

        {
            let mut status = lock(&self.status);
            if status.point_timer.reset_if_has_elapsed(self.config.point_gain_period) {
                status.score = status.score.saturating_add(self.config.point_gain_amount);
            }
        }

        self.collide(&mut spawns, &mut snake)
    }

    /// Run only the collision pass (physics loop)
    pub fn resolve_collisions(&self) -> GamePhase {
        let mut spawns = lock(&self.spawns);
        let mut snake = lock(&self.snake);
        self.collide(&mut spawns, &mut snake)
    }

    fn collide(&self, spawns: &mut SpawnScheduler, snake: &mut Snake) -> GamePhase {
        if self.phase() == GamePhase::Lost {
            return GamePhase::Lost;
        }
        let (Some(head), Some(head_bounds)) = (snake.head(), snake.head_bounds()) else {
            return GamePhase::Playing;
        };
        if snake.bites_itself() {
            return self.lose("bit itself");
        }

        for object in self.registry.physics() {
            if !object.bounds.overlaps(&head_bounds) {
                continue;
            }
            match object.reaction(head.id) {
                Reaction::Ignore => {}
                Reaction::Eat => self.eat(&object, spawns, snake),
                Reaction::Kill => {
                    return self.lose(match object.kind {
                        ObjectKind::Wall => "hit a wall",
                        ObjectKind::Mine => "hit a mine",
                        _ => "bit itself",
                    });
                }
            }
        }
        GamePhase::Playing
    }

    fn eat(&self, object: &WorldObject, spawns: &mut SpawnScheduler, snake: &mut Snake) {
        let Some(spawn) = spawns.take(object.id) else {
            // Already eaten by another pass
            return;
        };
        self.registry.remove(object.id);
        let SpawnEffect::Food(food) = spawn.effect else {
            return;
        };
        let points = snake.eat_food(&food);
        let score = {
            let mut status = lock(&self.status);
            status.score = status.score.saturating_add(points);
            status.score
        };
        log::debug!(
            "Ate food worth {points} (score {score}, projected length {})",
            snake.projected_length()
        );
        self.cue(SoundCue::Eat);
    }

    fn lose(&self, reason: &str) -> GamePhase {
        let mut status = lock(&self.status);
        if status.phase == GamePhase::Playing {
            status.phase = GamePhase::Lost;
            log::info!("Snake {reason}, final score {}", status.score);
            drop(status);
            self.music(false);
            self.cue(SoundCue::Die);
        }
        GamePhase::Lost
    }

    /// Start a fresh run: walls, snake, spawns, score
    pub fn reset(&self) {
        let mut spawns = lock(&self.spawns);
        let mut snake = lock(&self.snake);
        let mut status = lock(&self.status);

        self.registry.clear();
        add_walls(&self.config, &self.ids, &self.registry);
        snake.reset(self.config.screen.center(), &self.registry);
        spawns.reset(&self.registry);

        status.score = 0;
        status.phase = GamePhase::Playing;
        status.point_timer.reset();
        drop(status);
        self.music(true);
        log::info!("World reset");
    }

    /// Steering keys: arrows or WASD
    pub fn key_notify(&self, key: Key) {
        let direction = match key {
            Key::Up | Key::Char('w') => Direction::Up,
            Key::Down | Key::Char('s') => Direction::Down,
            Key::Left | Key::Char('a') => Direction::Left,
            Key::Right | Key::Char('d') => Direction::Right,
            _ => return,
        };
        lock(&self.snake).change_direction(direction);
    }

    /// Mouse buttons turn relative to the heading
    pub fn mouse_notify(&self, button: MouseButton) {
        let turn = match button {
            MouseButton::Left => Turn::Left,
            MouseButton::Right => Turn::Right,
            MouseButton::Middle => return,
        };
        lock(&self.snake).turn(turn);
    }

    pub fn status(&self) -> Status {
        let status = lock(&self.status);
        Status {
            score: status.score,
            phase: status.phase,
        }
    }

    pub fn phase(&self) -> GamePhase {
        lock(&self.status).phase
    }

    pub fn score(&self) -> i64 {
        lock(&self.status).score
    }

    /// Graphics view, head and status from one instant.
    ///
    /// Every registry mutation happens under the snake lock, so holding it
    /// keeps the three parts in step.
    pub fn frame_parts(&self) -> FrameParts {
        let snake = lock(&self.snake);
        let status = lock(&self.status);
        FrameParts {
            objects: self.registry.graphics(),
            head: snake.head_bounds(),
            status: Status {
                score: status.score,
                phase: status.phase,
            },
        }
    }

    /// Copy of the snake path, head first
    pub fn snake_segments(&self) -> Vec<Segment> {
        lock(&self.snake).segments()
    }

    /// (length, projected length, speed)
    pub fn snake_stats(&self) -> (u32, u32, u32) {
        let snake = lock(&self.snake);
        (snake.length(), snake.projected_length(), snake.speed())
    }

    pub fn registry(&self) -> &Arc<ObjectRegistry> {
        &self.registry
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

fn add_walls(config: &Config, ids: &ObjectIds, registry: &ObjectRegistry) {
    for wall in &config.walls {
        registry.add(Arc::new(WorldObject::new(
            ids.next(),
            ObjectKind::Wall,
            wall.bounds,
            wall.color,
        )));
    }
}
