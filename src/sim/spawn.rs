//! Periodic Food/Mine spawning and expiry
//!
//! Placement uses a seeded PCG stream so a given seed always produces the
//! same sequence of candidate positions.

use std::sync::Arc;

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::clock::{Clock, Timer};
use super::object::{Bounds, ObjectId, ObjectIds, ObjectKind, WorldObject};
use super::registry::ObjectRegistry;
use crate::config::{SpawnClass, SpawnEffect, SpawnsConfig};
use crate::consts::MAX_PLACEMENT_ATTEMPTS;

/// An active Food or Mine
#[derive(Debug, Clone)]
pub struct Spawn {
    pub object: Arc<WorldObject>,
    pub effect: SpawnEffect,
    /// Game time of creation (ms)
    pub created_at: u64,
    /// Lifetime (ms)
    pub expiry: u64,
}

impl Spawn {
    pub fn id(&self) -> ObjectId {
        self.object.id
    }
}

/// What one scheduler tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnTick {
    pub expired: usize,
    pub spawned: usize,
}

#[derive(Debug)]
pub struct SpawnScheduler {
    config: SpawnsConfig,
    clock: Clock,
    ids: Arc<ObjectIds>,
    rng: Pcg32,
    period_timer: Timer,
    active: Vec<Spawn>,
}

impl SpawnScheduler {
    pub fn new(config: &SpawnsConfig, seed: u64, clock: &Clock, ids: Arc<ObjectIds>) -> Self {
        Self {
            config: config.clone(),
            clock: clock.clone(),
            ids,
            rng: Pcg32::seed_from_u64(seed),
            period_timer: Timer::new(clock),
            active: Vec::new(),
        }
    }

    /// Drop all spawns and restart the period. The RNG stream continues.
    pub fn reset(&mut self, registry: &ObjectRegistry) {
        for spawn in self.active.drain(..) {
            registry.remove(spawn.id());
        }
        self.period_timer.reset();
    }

    /// Expire stale spawns, then run the spawn trials if a period has passed
    pub fn tick(&mut self, registry: &ObjectRegistry) -> SpawnTick {
        let mut report = SpawnTick {
            expired: self.expire(registry),
            ..Default::default()
        };

        if !self.period_timer.reset_if_has_elapsed(self.config.period) {
            return report;
        }

        for class in 0..self.config.classes.len() {
            let rate = self.config.classes[class].rate;
            if !self.rng.random_bool(rate.clamp(0.0, 1.0)) {
                continue;
            }
            match self.find_position(class, registry) {
                Some(bounds) => {
                    self.place(class, bounds.min, registry);
                    report.spawned += 1;
                }
                None => log::debug!(
                    "No room for {} this tick",
                    self.config.classes[class].name
                ),
            }
        }
        report
    }

    /// Remove every spawn older than its expiry
    fn expire(&mut self, registry: &ObjectRegistry) -> usize {
        let now = self.clock.now_ms();
        let before = self.active.len();
        self.active.retain(|spawn| {
            let alive = now.saturating_sub(spawn.created_at) <= spawn.expiry;
            if !alive {
                registry.remove(spawn.id());
            }
            alive
        });
        before - self.active.len()
    }

    /// Pick a random spot for `class` clear of the boundary and every other object.
    ///
    /// Candidates keep more than `cushion` of Chebyshev clearance from the edge
    /// of the spawn area and from each existing object. Returns None when the
    /// retry budget runs out.
    pub fn find_position(&mut self, class: usize, registry: &ObjectRegistry) -> Option<Bounds> {
        let SpawnClass { size, cushion, .. } = *self.config.classes.get(class)?;
        // Strictly more than `cushion` from every edge of the spawn area
        let area = self.config.bounds.shrunk(cushion + 1);
        let lo = area.min;
        let hi = area.max - IVec2::splat(size);
        if lo.x > hi.x || lo.y > hi.y {
            return None;
        }

        let mut obstacles: Vec<Bounds> = registry.physics().iter().map(|o| o.bounds).collect();
        obstacles.extend(self.active.iter().map(|s| s.object.bounds));

        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let origin = IVec2::new(
                self.rng.random_range(lo.x..=hi.x),
                self.rng.random_range(lo.y..=hi.y),
            );
            let candidate = Bounds::square(origin, size);
            if obstacles.iter().all(|o| candidate.gap(o) > cushion) {
                return Some(candidate);
            }
        }
        None
    }

    /// Create a spawn of `class` at `origin` and register it
    pub fn place(&mut self, class: usize, origin: IVec2, registry: &ObjectRegistry) -> Option<ObjectId> {
        let class = self.config.classes.get(class)?;
        let object = Arc::new(WorldObject::new(
            self.ids.next(),
            match class.effect {
                SpawnEffect::Food(_) => ObjectKind::Food,
                SpawnEffect::Mine => ObjectKind::Mine,
            },
            Bounds::square(origin, class.size),
            class.color,
        ));
        let id = object.id;
        registry.add(Arc::clone(&object));
        log::debug!("Spawned {} at {}", class.name, origin);
        self.active.push(Spawn {
            object,
            effect: class.effect,
            created_at: self.clock.now_ms(),
            expiry: class.expiry,
        });
        Some(id)
    }

    /// Claim an active spawn. Each spawn can be taken at most once.
    ///
    /// The registry entry is left for the caller to remove.
    pub fn take(&mut self, id: ObjectId) -> Option<Spawn> {
        let index = self.active.iter().position(|s| s.id() == id)?;
        Some(self.active.remove(index))
    }

    pub fn active(&self) -> &[Spawn] {
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FoodEffect;
    use crate::sim::object::Color;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Bounds {
        Bounds::new(IVec2::new(x0, y0), IVec2::new(x1, y1))
    }

    fn class(cushion: i32, size: i32, rate: f64) -> SpawnClass {
        SpawnClass {
            name: "apple".to_string(),
            color: Color::new(0, 255, 0),
            size,
            cushion,
            expiry: 1000,
            rate,
            effect: SpawnEffect::Food(FoodEffect {
                calories: 10.0,
                points: 100,
                speed_delta: 0,
            }),
        }
    }

    fn scheduler(bounds: Bounds, classes: Vec<SpawnClass>, seed: u64) -> (Clock, ObjectRegistry, SpawnScheduler) {
        let clock = Clock::manual();
        let config = SpawnsConfig {
            bounds,
            period: 100,
            classes,
        };
        let scheduler = SpawnScheduler::new(&config, seed, &clock, Arc::new(ObjectIds::new()));
        (clock, ObjectRegistry::new(), scheduler)
    }

    #[test]
    fn test_placement_keeps_cushion() {
        for seed in 0..20 {
            let (_, registry, mut spawns) = scheduler(rect(0, 0, 100, 100), vec![class(5, 1, 1.0)], seed);
            spawns.place(0, IVec2::new(50, 50), &registry).unwrap();

            for _ in 0..200 {
                let Some(found) = spawns.find_position(0, &registry) else {
                    continue;
                };
                let p = found.min;
                let d = (p - IVec2::new(50, 50)).abs();
                assert!(d.x.max(d.y) > 5, "{p} too close to existing spawn");
                assert!(p.x > 5 && p.y > 5, "{p} too close to the top/left edge");
                assert!(found.max.x < 95 && found.max.y < 95, "{p} too close to the bottom/right edge");
            }
        }
    }

    #[test]
    fn test_no_room_is_skipped() {
        let (clock, registry, mut spawns) = scheduler(rect(0, 0, 20, 20), vec![class(10, 5, 1.0)], 7);
        assert!(spawns.find_position(0, &registry).is_none());
        clock.advance(100);
        let report = spawns.tick(&registry);
        assert_eq!(report.spawned, 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_crowded_area_exhausts_retry_budget() {
        let (_, registry, mut spawns) = scheduler(rect(0, 0, 40, 40), vec![class(2, 4, 1.0)], 3);
        // One obstacle covering the whole interior
        registry.add(Arc::new(WorldObject::new(
            ObjectId(999),
            ObjectKind::Wall,
            rect(0, 0, 40, 40),
            Color::BLACK,
        )));
        assert!(spawns.find_position(0, &registry).is_none());
    }

    #[test]
    fn test_tick_spawns_on_period_boundary() {
        let (clock, registry, mut spawns) = scheduler(rect(0, 0, 500, 500), vec![class(5, 10, 1.0)], 1);
        clock.advance(99);
        assert_eq!(spawns.tick(&registry).spawned, 0);
        clock.advance(1);
        assert_eq!(spawns.tick(&registry).spawned, 1);
        assert_eq!(spawns.active().len(), 1);
        assert_eq!(registry.len(), 1);
        // Timer rebased: nothing new until the next period
        assert_eq!(spawns.tick(&registry).spawned, 0);
    }

    #[test]
    fn test_zero_rate_never_spawns() {
        let (clock, registry, mut spawns) = scheduler(rect(0, 0, 500, 500), vec![class(5, 10, 0.0)], 1);
        for _ in 0..50 {
            clock.advance(100);
            spawns.tick(&registry);
        }
        assert!(spawns.active().is_empty());
    }

    #[test]
    fn test_spawns_expire() {
        let (clock, registry, mut spawns) = scheduler(rect(0, 0, 500, 500), vec![class(5, 10, 0.0)], 1);
        let id = spawns.place(0, IVec2::new(100, 100), &registry).unwrap();
        clock.advance(1000);
        assert_eq!(spawns.tick(&registry).expired, 0);
        clock.advance(1);
        assert_eq!(spawns.tick(&registry).expired, 1);
        assert!(!registry.contains(id));
        assert!(spawns.active().is_empty());
    }

    #[test]
    fn test_paused_clock_stops_expiry() {
        let (clock, registry, mut spawns) = scheduler(rect(0, 0, 500, 500), vec![class(5, 10, 0.0)], 1);
        spawns.place(0, IVec2::new(100, 100), &registry).unwrap();
        clock.pause();
        clock.advance(5000);
        assert_eq!(spawns.tick(&registry).expired, 0);
        assert_eq!(spawns.active().len(), 1);
    }

    #[test]
    fn test_take_claims_once() {
        let (_, registry, mut spawns) = scheduler(rect(0, 0, 500, 500), vec![class(5, 10, 0.0)], 1);
        let id = spawns.place(0, IVec2::new(100, 100), &registry).unwrap();
        assert!(spawns.take(id).is_some());
        assert!(spawns.take(id).is_none());
    }

    #[test]
    fn test_same_seed_same_positions() {
        let positions = |seed| {
            let (_, registry, mut spawns) = scheduler(rect(0, 0, 500, 500), vec![class(5, 10, 1.0)], seed);
            (0..10)
                .filter_map(|_| spawns.find_position(0, &registry))
                .map(|b| b.min)
                .collect::<Vec<_>>()
        };
        assert_eq!(positions(42), positions(42));
        assert_ne!(positions(42), positions(43));
    }

    #[test]
    fn test_reset_clears_spawns() {
        let (_, registry, mut spawns) = scheduler(rect(0, 0, 500, 500), vec![class(5, 10, 0.0)], 1);
        spawns.place(0, IVec2::new(100, 100), &registry).unwrap();
        spawns.place(0, IVec2::new(300, 300), &registry).unwrap();
        spawns.reset(&registry);
        assert!(spawns.active().is_empty());
        assert!(registry.is_empty());
    }
}
