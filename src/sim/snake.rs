//! The snake: an ordered path of grid cells with growth and speed state
//!
//! `Snake` is plain data. The world keeps it behind a single mutex that each
//! public operation takes once; helpers here work on `&mut self` and never
//! lock anything themselves.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::IVec2;

use super::clock::{Clock, Timer};
use super::object::{Bounds, ObjectId, ObjectIds, ObjectKind, WorldObject};
use super::registry::ObjectRegistry;
use crate::config::{FoodEffect, SnakeConfig};
use crate::{Direction, Turn};

/// One cell of the snake's body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub id: ObjectId,
    /// Top-left corner of the cell
    pub position: IVec2,
    pub facing: Direction,
}

#[derive(Debug)]
pub struct Snake {
    config: SnakeConfig,
    ids: Arc<ObjectIds>,
    /// Head first
    path: VecDeque<Segment>,
    length: u32,
    projected_length: u32,
    /// Grid steps per second
    speed: u32,
    /// Direction of the last move
    heading: Direction,
    /// Direction of the next move
    pending: Direction,
    move_timer: Timer,
    speedup_timer: Timer,
}

impl Snake {
    /// Build a snake centered on `center` and register its segments
    pub fn new(
        config: &SnakeConfig,
        clock: &Clock,
        ids: Arc<ObjectIds>,
        center: IVec2,
        registry: &ObjectRegistry,
    ) -> Self {
        let mut snake = Self {
            config: config.clone(),
            ids,
            path: VecDeque::new(),
            length: 0,
            projected_length: 0,
            speed: config.starting_speed,
            heading: Direction::Right,
            pending: Direction::Right,
            move_timer: Timer::new(clock),
            speedup_timer: Timer::new(clock),
        };
        snake.init(center, registry);
        snake
    }

    /// Back to the starting state at `center`
    pub fn reset(&mut self, center: IVec2, registry: &ObjectRegistry) {
        self.deregister(registry);
        self.init(center, registry);
    }

    fn init(&mut self, center: IVec2, registry: &ObjectRegistry) {
        let w = self.config.width;
        // Snap to the grid so every cell lines up with its neighbours
        let head = (center.div_euclid(IVec2::splat(w))) * w;

        self.path.clear();
        self.heading = Direction::Right;
        self.pending = Direction::Right;
        self.speed = self.config.starting_speed;
        self.length = self.config.starting_length;
        self.projected_length = self.config.starting_length;

        // Body trails behind the head, opposite the heading
        let back = self.heading.opposite().step() * w;
        let mut position = head;
        for _ in 0..self.config.starting_length {
            let segment = self.make_segment(position, self.heading, registry);
            self.path.push_back(segment);
            position += back;
        }

        self.move_timer.reset();
        self.speedup_timer.reset();
    }

    fn make_segment(&self, position: IVec2, facing: Direction, registry: &ObjectRegistry) -> Segment {
        let segment = Segment {
            id: self.ids.next(),
            position,
            facing,
        };
        registry.add(Arc::new(WorldObject::new(
            segment.id,
            ObjectKind::Segment,
            Bounds::square(position, self.config.width),
            self.config.color,
        )));
        segment
    }

    /// Remove every segment from the registry
    pub fn deregister(&self, registry: &ObjectRegistry) {
        for segment in &self.path {
            registry.remove(segment.id);
        }
    }

    /// Steer toward `direction`. Reversing onto the body is ignored.
    pub fn change_direction(&mut self, direction: Direction) {
        if direction != self.heading.opposite() {
            self.pending = direction;
        }
    }

    /// Steer a quarter turn relative to the current heading
    pub fn turn(&mut self, turn: Turn) {
        self.pending = self.heading.turned(turn);
    }

    /// Milliseconds between moves at the current speed
    pub fn move_interval(&self) -> u64 {
        1000 / u64::from(self.speed.max(1))
    }

    /// Advance speed-up and movement. Returns true if the snake moved.
    pub fn update(&mut self, registry: &ObjectRegistry) -> bool {
        if self.speedup_timer.reset_if_has_elapsed(self.config.speedup_period) {
            self.speed = self
                .speed
                .saturating_add(self.config.speedup_amount)
                .min(self.config.max_speed);
            log::debug!("Snake sped up to {}", self.speed);
        }

        if !self.move_timer.reset_if_has_elapsed(self.move_interval()) {
            return false;
        }

        self.heading = self.pending;
        let Some(head) = self.path.front() else {
            return false;
        };
        let next = head.position + self.heading.step() * self.config.width;
        let segment = self.make_segment(next, self.heading, registry);
        self.path.push_front(segment);

        if self.length >= self.projected_length {
            if let Some(tail) = self.path.pop_back() {
                registry.remove(tail.id);
            }
        } else {
            self.length += 1;
        }
        true
    }

    /// Digest a food item and return the points it is worth
    pub fn eat_food(&mut self, food: &FoodEffect) -> i64 {
        // f64 keeps huge or non-finite growth from overflowing before the clamp
        let growth = (food.calories * self.config.growth_rate).floor();
        let projected = f64::from(self.projected_length) + growth;
        let cap = self.config.growth_cap.max(self.length);
        self.projected_length = if projected.is_nan() {
            self.projected_length
        } else {
            projected.clamp(f64::from(self.length), f64::from(cap)) as u32
        };

        let speed = (i64::from(self.speed) + i64::from(food.speed_delta)).clamp(
            i64::from(self.config.min_speed),
            i64::from(self.config.max_speed),
        );
        self.speed = speed as u32;

        food.points
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn projected_length(&self) -> u32 {
        self.projected_length
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn head(&self) -> Option<Segment> {
        self.path.front().copied()
    }

    pub fn head_bounds(&self) -> Option<Bounds> {
        self.head()
            .map(|h| Bounds::square(h.position, self.config.width))
    }

    /// Copy of the path, head first
    pub fn segments(&self) -> Vec<Segment> {
        self.path.iter().copied().collect()
    }

    /// True when the head occupies the same cell as any other segment
    pub fn bites_itself(&self) -> bool {
        let mut cells = self.path.iter();
        match cells.next() {
            Some(head) => cells.any(|s| s.position == head.position),
            None => false,
        }
    }

    pub fn width(&self) -> i32 {
        self.config.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CENTER: IVec2 = IVec2::new(400, 300);

    fn setup(config: SnakeConfig) -> (Clock, ObjectRegistry, Snake) {
        let clock = Clock::manual();
        let registry = ObjectRegistry::new();
        let snake = Snake::new(&config, &clock, Arc::new(ObjectIds::new()), CENTER, &registry);
        (clock, registry, snake)
    }

    fn food(calories: f64, points: i64, speed_delta: i32) -> FoodEffect {
        FoodEffect {
            calories,
            points,
            speed_delta,
        }
    }

    fn assert_path_invariants(snake: &Snake, registry: &ObjectRegistry) {
        let path = snake.segments();
        assert_eq!(path.len() as u32, snake.length());
        assert!(snake.length() <= snake.projected_length());
        for pair in path.windows(2) {
            let d = pair[0].position - pair[1].position;
            assert!(d.x == 0 || d.y == 0);
            assert_eq!(d.x.abs() + d.y.abs(), snake.width());
        }
        for segment in &path {
            assert!(registry.contains(segment.id));
        }
        assert_eq!(registry.len(), path.len());
    }

    #[test]
    fn test_starting_state() {
        let (_, registry, snake) = setup(SnakeConfig::default());
        assert_eq!(snake.length(), 5);
        assert_eq!(snake.projected_length(), 5);
        assert_eq!(snake.speed(), 8);
        assert_eq!(snake.head().unwrap().position, CENTER);
        assert_eq!(snake.heading(), Direction::Right);
        assert_path_invariants(&snake, &registry);
    }

    #[test]
    fn test_moves_one_step_per_interval() {
        let (clock, registry, mut snake) = setup(SnakeConfig::default());
        let interval = snake.move_interval();
        assert_eq!(interval, 125);

        clock.advance(interval - 1);
        assert!(!snake.update(&registry));

        clock.advance(1);
        assert!(snake.update(&registry));
        assert_eq!(snake.head().unwrap().position, CENTER + IVec2::new(10, 0));
        assert_eq!(snake.length(), 5);
        assert_path_invariants(&snake, &registry);
    }

    #[test]
    fn test_reverse_direction_is_ignored() {
        let (clock, registry, mut snake) = setup(SnakeConfig::default());
        snake.change_direction(Direction::Left);
        clock.advance(snake.move_interval());
        snake.update(&registry);
        assert_eq!(snake.heading(), Direction::Right);

        snake.change_direction(Direction::Up);
        clock.advance(snake.move_interval());
        snake.update(&registry);
        assert_eq!(snake.heading(), Direction::Up);
        assert_eq!(snake.head().unwrap().position, CENTER + IVec2::new(10, -10));
    }

    #[test]
    fn test_turn_is_relative_to_heading() {
        let (clock, registry, mut snake) = setup(SnakeConfig::default());
        snake.turn(Turn::Right);
        clock.advance(snake.move_interval());
        snake.update(&registry);
        assert_eq!(snake.heading(), Direction::Down);
        assert_eq!(snake.head().unwrap().facing, Direction::Down);
    }

    #[test]
    fn test_eat_food_grows_and_scores() {
        let (_, _, mut snake) = setup(SnakeConfig {
            growth_rate: 0.3,
            growth_cap: 1000,
            ..SnakeConfig::default()
        });
        let points = snake.eat_food(&food(1000.0, 1000, 0));
        assert_eq!(points, 1000);
        assert_eq!(snake.projected_length(), 305);
        assert_eq!(snake.length(), 5);
    }

    #[test]
    fn test_eat_food_respects_growth_cap() {
        let (_, _, mut snake) = setup(SnakeConfig {
            growth_rate: 0.3,
            growth_cap: 100,
            ..SnakeConfig::default()
        });
        snake.eat_food(&food(1000.0, 1000, 0));
        assert_eq!(snake.projected_length(), 100);
    }

    #[test]
    fn test_huge_growth_saturates_at_cap() {
        let (_, _, mut snake) = setup(SnakeConfig::default());
        snake.eat_food(&food(1e300, 0, 0));
        assert_eq!(snake.projected_length(), 400);
        snake.eat_food(&food(f64::INFINITY, 0, 0));
        assert_eq!(snake.projected_length(), 400);
        snake.eat_food(&food(f64::NEG_INFINITY, 0, 0));
        assert_eq!(snake.projected_length(), snake.length());
        snake.eat_food(&food(f64::NAN, 0, 0));
        assert_eq!(snake.projected_length(), snake.length());
    }

    #[test]
    fn test_negative_calories_never_shrink_below_length() {
        let (_, _, mut snake) = setup(SnakeConfig::default());
        snake.eat_food(&food(-1000.0, 0, 0));
        assert_eq!(snake.projected_length(), snake.length());
    }

    #[test]
    fn test_speed_delta_is_clamped() {
        let (_, _, mut snake) = setup(SnakeConfig::default());
        snake.eat_food(&food(0.0, 0, 100));
        assert_eq!(snake.speed(), 30);
        snake.eat_food(&food(0.0, 0, -100));
        assert_eq!(snake.speed(), 4);
    }

    #[test]
    fn test_growth_extends_one_segment_per_move() {
        let (clock, registry, mut snake) = setup(SnakeConfig::default());
        snake.eat_food(&food(30.0, 0, 0));
        assert_eq!(snake.projected_length(), 8);
        for expected in 6..=8 {
            clock.advance(snake.move_interval());
            assert!(snake.update(&registry));
            assert_eq!(snake.length(), expected);
        }
        clock.advance(snake.move_interval());
        snake.update(&registry);
        assert_eq!(snake.length(), 8);
        assert_path_invariants(&snake, &registry);
    }

    #[test]
    fn test_speedup_schedule() {
        let (clock, registry, mut snake) = setup(SnakeConfig {
            speedup_period: 1000,
            speedup_amount: 5,
            max_speed: 20,
            ..SnakeConfig::default()
        });
        clock.advance(1000);
        snake.update(&registry);
        assert_eq!(snake.speed(), 13);
        clock.advance(1000);
        snake.update(&registry);
        assert_eq!(snake.speed(), 18);
        clock.advance(1000);
        snake.update(&registry);
        assert_eq!(snake.speed(), 20);
    }

    #[test]
    fn test_paused_clock_stops_movement() {
        let (clock, registry, mut snake) = setup(SnakeConfig::default());
        clock.pause();
        clock.advance(10_000);
        assert!(!snake.update(&registry));
        assert_eq!(snake.head().unwrap().position, CENTER);
    }

    #[test]
    fn test_reset_twice_is_identical() {
        let (clock, registry, mut snake) = setup(SnakeConfig::default());
        snake.eat_food(&food(100.0, 0, 3));
        snake.change_direction(Direction::Down);
        clock.advance(500);
        snake.update(&registry);

        snake.reset(CENTER, &registry);
        let first: Vec<_> = snake.segments().iter().map(|s| (s.position, s.facing)).collect();
        let first_state = (snake.length(), snake.projected_length(), snake.speed(), snake.heading());

        snake.reset(CENTER, &registry);
        let second: Vec<_> = snake.segments().iter().map(|s| (s.position, s.facing)).collect();
        let second_state = (snake.length(), snake.projected_length(), snake.speed(), snake.heading());

        assert_eq!(first, second);
        assert_eq!(first_state, second_state);
        assert_path_invariants(&snake, &registry);
    }

    #[test]
    fn test_bites_itself() {
        let (clock, registry, mut snake) = setup(SnakeConfig::default());
        assert!(!snake.bites_itself());
        // A tight loop of length 5 runs the head into the body
        for dir in [Direction::Down, Direction::Left, Direction::Up] {
            snake.change_direction(dir);
            clock.advance(snake.move_interval());
            snake.update(&registry);
        }
        assert!(snake.bites_itself());
    }

    proptest! {
        #[test]
        fn prop_path_invariants_hold(
            steps in prop::collection::vec((0u8..6, 0u64..400), 1..80)
        ) {
            let (clock, registry, mut snake) = setup(SnakeConfig::default());
            for (action, dt) in steps {
                match action {
                    0 => snake.change_direction(Direction::Up),
                    1 => snake.change_direction(Direction::Down),
                    2 => snake.change_direction(Direction::Left),
                    3 => snake.change_direction(Direction::Right),
                    4 => snake.turn(Turn::Left),
                    _ => { snake.eat_food(&food(dt as f64, 0, 0)); }
                }
                clock.advance(dt);
                snake.update(&registry);
                assert_path_invariants(&snake, &registry);
            }
        }
    }
}
