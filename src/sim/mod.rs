//! Simulation module
//!
//! All gameplay state lives here:
//! - Time comes from the shared pausable `Clock` only
//! - Spawn placement uses a seeded RNG only
//! - Registry iteration order is stable (by layer, then object ID)
//! - No rendering or platform dependencies

pub mod clock;
pub mod object;
pub mod registry;
pub mod snake;
pub mod spawn;
pub mod world;

pub use clock::{Clock, Timer};
pub use object::{Bounds, Color, ObjectId, ObjectIds, ObjectKind, Reaction, WorldObject};
pub use registry::ObjectRegistry;
pub use snake::{Segment, Snake};
pub use spawn::{Spawn, SpawnScheduler, SpawnTick};
pub use world::{FrameParts, GamePhase, GameWorld, Status};
