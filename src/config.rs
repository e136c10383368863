//! Game configuration
//!
//! Values are read once at startup and never re-read. Every field falls back
//! to its default when missing (logged at debug) or invalid (logged as a
//! warning); a bad configuration never stops the game.

use std::path::Path;

use glam::IVec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::{MAX_SNAKE_SPEED, MIN_SNAKE_SPEED};
use crate::sim::object::{Bounds, Color};

/// A named section of the configuration document
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    path: String,
    value: Option<&'a Value>,
}

impl<'a> Scope<'a> {
    pub fn root(value: &'a Value) -> Self {
        Self {
            path: String::new(),
            value: Some(value),
        }
    }

    fn qualified(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        }
    }

    /// Sub-scope (absent sub-scopes yield all defaults)
    pub fn scope(&self, name: &str) -> Scope<'a> {
        Scope {
            path: self.qualified(name),
            value: self.value.and_then(|v| v.get(name)),
        }
    }

    /// Elements of a list-valued field, or None if the field is missing
    pub fn list(&self, name: &str) -> Option<Vec<Scope<'a>>> {
        let path = self.qualified(name);
        match self.value.and_then(|v| v.get(name)) {
            None => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Scope {
                        path: format!("{path}[{i}]"),
                        value: Some(item),
                    })
                    .collect(),
            ),
            Some(_) => {
                log::warn!("Field {path} is not a list, using defaults");
                None
            }
        }
    }

    /// Read a typed field, falling back to `default`
    pub fn field<T: DeserializeOwned>(&self, name: &str, default: T) -> T {
        let Some(raw) = self.value.and_then(|v| v.get(name)) else {
            log::debug!("Field {} not found", self.qualified(name));
            return default;
        };
        match T::deserialize(raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Field {} is invalid ({e}), using default", self.qualified(name));
                default
            }
        }
    }
}

/// Screen dimensions and background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
    pub bg_color: Color,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            bg_color: Color::BLACK,
        }
    }
}

impl ScreenConfig {
    fn read(scope: &Scope) -> Self {
        let d = Self::default();
        Self {
            width: scope.field("width", d.width),
            height: scope.field("height", d.height),
            bg_color: scope.field("bg_color", d.bg_color),
        }
    }

    pub fn center(&self) -> IVec2 {
        IVec2::new(self.width as i32 / 2, self.height as i32 / 2)
    }
}

/// Snake starting parameters and progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeConfig {
    pub head_color: Color,
    pub color: Color,
    pub starting_length: u32,
    /// Side of one segment cell, also the grid step
    pub width: i32,
    /// Grid steps per second
    pub starting_speed: u32,
    pub min_speed: u32,
    pub max_speed: u32,
    /// Milliseconds between automatic speed-ups
    pub speedup_period: u64,
    pub speedup_amount: u32,
    /// Segments gained per calorie
    pub growth_rate: f64,
    /// Maximum projected length
    pub growth_cap: u32,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            head_color: Color::new(255, 255, 0),
            color: Color::new(0, 200, 0),
            starting_length: 5,
            width: 10,
            starting_speed: 8,
            min_speed: 4,
            max_speed: 30,
            speedup_period: 10_000,
            speedup_amount: 1,
            growth_rate: 0.1,
            growth_cap: 400,
        }
    }
}

impl SnakeConfig {
    fn read(scope: &Scope) -> Self {
        let d = Self::default();
        let head = scope.scope("head");
        Self {
            head_color: head.field("color", d.head_color),
            color: scope.field("color", d.color),
            starting_length: scope.field("starting_length", d.starting_length),
            width: scope.field("width", d.width),
            starting_speed: scope.field("starting_speed", d.starting_speed),
            min_speed: scope.field("min_speed", d.min_speed),
            max_speed: scope.field("max_speed", d.max_speed),
            speedup_period: scope.field("speedup_period", d.speedup_period),
            speedup_amount: scope.field("speedup_amount", d.speedup_amount),
            growth_rate: scope.field("growth_rate", d.growth_rate),
            growth_cap: scope.field("growth_cap", d.growth_cap),
        }
    }
}

/// A static wall segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallConfig {
    pub bounds: Bounds,
    pub color: Color,
}

impl WallConfig {
    const COLOR: Color = Color::new(128, 128, 128);

    fn read(scope: &Scope, fallback: &WallConfig) -> Self {
        Self {
            bounds: scope.field("bounds", fallback.bounds),
            color: scope.field("color", fallback.color),
        }
    }

    /// Four walls of `thickness` around the screen edge
    pub fn perimeter(screen: &ScreenConfig, thickness: i32) -> Vec<WallConfig> {
        let (w, h) = (screen.width as i32, screen.height as i32);
        let t = thickness;
        let rect = |x0, y0, x1, y1| WallConfig {
            bounds: Bounds::new(IVec2::new(x0, y0), IVec2::new(x1, y1)),
            color: Self::COLOR,
        };
        vec![
            rect(0, 0, w, t),
            rect(0, h - t, w, h),
            rect(0, t, t, h - t),
            rect(w - t, t, w, h - t),
        ]
    }
}

/// Effect of eating a food spawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodEffect {
    pub calories: f64,
    pub points: i64,
    pub speed_delta: i32,
}

/// What a spawn class produces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnEffect {
    Food(FoodEffect),
    /// Contact ends the run
    Mine,
}

/// One kind of periodically spawned item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnClass {
    pub name: String,
    pub color: Color,
    /// Side of the spawn square
    pub size: i32,
    /// Empty space required around the spawn
    pub cushion: i32,
    /// Milliseconds before the spawn disappears
    pub expiry: u64,
    /// Chance of spawning on each period boundary
    pub rate: f64,
    pub effect: SpawnEffect,
}

impl SpawnClass {
    pub fn food(name: &str, color: Color, rate: f64, calories: f64, points: i64, speed_delta: i32) -> Self {
        Self {
            name: name.to_string(),
            color,
            size: 10,
            cushion: 20,
            expiry: 15_000,
            rate,
            effect: SpawnEffect::Food(FoodEffect {
                calories,
                points,
                speed_delta,
            }),
        }
    }

    pub fn mine() -> Self {
        Self {
            name: "mine".to_string(),
            color: Color::new(255, 128, 0),
            size: 10,
            cushion: 30,
            expiry: 20_000,
            rate: 0.15,
            effect: SpawnEffect::Mine,
        }
    }

    fn read(scope: &Scope, fallback: &SpawnClass) -> Self {
        let effect = match fallback.effect {
            SpawnEffect::Food(d) => SpawnEffect::Food(FoodEffect {
                calories: scope.field("calories", d.calories),
                points: scope.field("points", d.points),
                speed_delta: scope.field("speed_delta", d.speed_delta),
            }),
            SpawnEffect::Mine => SpawnEffect::Mine,
        };
        Self {
            name: scope.field("name", fallback.name.clone()),
            color: scope.field("color", fallback.color),
            size: scope.field("size", fallback.size),
            cushion: scope.field("cushion", fallback.cushion),
            expiry: scope.field("expiry", fallback.expiry),
            rate: scope.field("rate", fallback.rate),
            effect,
        }
    }
}

/// Spawn area, cadence and classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnsConfig {
    pub bounds: Bounds,
    /// Milliseconds between spawn trials
    pub period: u64,
    pub classes: Vec<SpawnClass>,
}

impl Default for SpawnsConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::new(IVec2::new(10, 10), IVec2::new(790, 590)),
            period: 1000,
            classes: vec![
                SpawnClass::food("ice", Color::new(0, 0, 255), 0.1, -25.0, 500, -3),
                SpawnClass::food("celery", Color::new(127, 255, 127), 0.2, 30.0, 250, 0),
                SpawnClass::food("normal", Color::new(0, 255, 255), 0.5, 100.0, 1000, 0),
                SpawnClass::food("donut", Color::new(200, 0, 0), 0.1, 300.0, 4000, 1),
                SpawnClass::mine(),
            ],
        }
    }
}

impl SpawnsConfig {
    fn read(scope: &Scope) -> Self {
        let d = Self::default();
        let food_template = d
            .classes
            .iter()
            .find(|c| c.name == "normal")
            .cloned()
            .unwrap_or_else(|| SpawnClass::food("normal", Color::new(0, 255, 255), 0.5, 100.0, 1000, 0));
        let mine_template = SpawnClass::mine();

        let foods = scope.list("food");
        let mines = scope.list("mine");
        let classes = if foods.is_none() && mines.is_none() {
            d.classes
        } else {
            let mut classes: Vec<SpawnClass> = Vec::new();
            for s in foods.unwrap_or_default() {
                classes.push(SpawnClass::read(&s, &food_template));
            }
            for s in mines.unwrap_or_default() {
                classes.push(SpawnClass::read(&s, &mine_template));
            }
            classes
        };

        Self {
            bounds: scope.field("bounds", d.bounds),
            period: scope.field("period", d.period),
            classes,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Seed for spawn placement
    pub seed: u64,
    pub music: bool,
    pub sound: bool,
    pub fps: u32,
    pub screen: ScreenConfig,
    pub walls: Vec<WallConfig>,
    pub spawns: SpawnsConfig,
    /// Milliseconds between passive point gains
    pub point_gain_period: u64,
    pub point_gain_amount: i64,
    pub snake: SnakeConfig,
}

impl Default for Config {
    fn default() -> Self {
        let screen = ScreenConfig::default();
        Self {
            seed: 0x5EED,
            music: false,
            sound: true,
            fps: 60,
            walls: WallConfig::perimeter(&screen, 10),
            screen,
            spawns: SpawnsConfig::default(),
            point_gain_period: 1000,
            point_gain_amount: 10,
            snake: SnakeConfig::default(),
        }
    }
}

impl Config {
    /// Build from a parsed JSON document
    pub fn from_value(root: &Value) -> Self {
        let scope = Scope::root(root);
        let d = Self::default();
        let screen = ScreenConfig::read(&scope.scope("screen"));
        let default_walls = WallConfig::perimeter(&screen, 10);
        let walls = match scope.list("walls") {
            Some(items) => items
                .iter()
                .zip(default_walls.iter().cycle())
                .map(|(s, fallback)| WallConfig::read(s, fallback))
                .collect(),
            None => default_walls,
        };

        Self {
            seed: scope.field("seed", d.seed),
            music: scope.field("music", d.music),
            sound: scope.field("sound", d.sound),
            fps: scope.field("fps", d.fps),
            screen,
            walls,
            spawns: SpawnsConfig::read(&scope.scope("spawns")),
            point_gain_period: scope.field("point_gain_period", d.point_gain_period),
            point_gain_amount: scope.field("point_gain_amount", d.point_gain_amount),
            snake: SnakeConfig::read(&scope.scope("snake")),
        }
        .sanitized()
    }

    /// Parse a JSON document, falling back to defaults if it is malformed
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Value>(json) {
            Ok(root) => Self::from_value(&root),
            Err(e) => {
                log::warn!("Config is not valid JSON ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Load from a file, falling back to defaults if it cannot be read
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                log::info!("Loaded config from {}", path.display());
                Self::from_json(&json)
            }
            Err(e) => {
                log::warn!("Cannot read config {} ({e}), using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Replace values the engine cannot run with
    fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.fps == 0 {
            log::warn!("fps must be positive, using {}", d.fps);
            self.fps = d.fps;
        }
        let snake = &mut self.snake;
        if snake.width <= 0 {
            log::warn!("snake.width must be positive, using {}", d.snake.width);
            snake.width = d.snake.width;
        }
        // The starting body trails left of center and must stay inside the screen
        let fits = (self.screen.width / 2 / snake.width.unsigned_abs()).max(1);
        if snake.starting_length == 0 || snake.starting_length > fits {
            let length = snake.starting_length.clamp(1, fits);
            log::warn!(
                "snake.starting_length {} must be in [1, {fits}], using {length}",
                snake.starting_length
            );
            snake.starting_length = length;
        }
        if !snake.growth_rate.is_finite() || snake.growth_rate < 0.0 {
            log::warn!(
                "snake.growth_rate {} must be finite and non-negative, using {}",
                snake.growth_rate, d.snake.growth_rate
            );
            snake.growth_rate = d.snake.growth_rate;
        }
        snake.min_speed = snake.min_speed.clamp(MIN_SNAKE_SPEED, MAX_SNAKE_SPEED);
        snake.max_speed = snake.max_speed.clamp(snake.min_speed, MAX_SNAKE_SPEED);
        snake.starting_speed = snake.starting_speed.clamp(snake.min_speed, snake.max_speed);
        snake.growth_cap = snake.growth_cap.max(snake.starting_length);
        for class in &mut self.spawns.classes {
            if !(0.0..=1.0).contains(&class.rate) {
                log::warn!("spawn {} rate {} outside [0, 1], clamping", class.name, class.rate);
                class.rate = class.rate.clamp(0.0, 1.0);
            }
            if let SpawnEffect::Food(food) = &mut class.effect {
                if !food.calories.is_finite() {
                    log::warn!("spawn {} calories must be finite, using 0", class.name);
                    food.calories = 0.0;
                }
            }
            class.size = class.size.max(1);
            class.cushion = class.cushion.max(0);
        }
        self
    }
}
