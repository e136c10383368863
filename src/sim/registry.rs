//! Shared registry of active world objects
//!
//! Holds two views over the same objects: the graphics view (draw order) and
//! the physics view (id order). Both views live behind one lock so every
//! physically active object always has its renderable entry.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::object::{ObjectId, WorldObject};

/// Draw order key: layer first, then id for stable ordering
type DrawKey = (u8, ObjectId);

#[derive(Debug, Default)]
struct Views {
    graphics: BTreeMap<DrawKey, Arc<WorldObject>>,
    physics: BTreeMap<ObjectId, Arc<WorldObject>>,
}

/// Thread-safe collection of active objects
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    views: RwLock<Views>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking loop must not wedge the other loops.
    fn read(&self) -> RwLockReadGuard<'_, Views> {
        self.views.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Views> {
        self.views.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an object in both views. Returns false if the id was already present.
    pub fn add(&self, object: Arc<WorldObject>) -> bool {
        let mut views = self.write();
        if views.physics.contains_key(&object.id) {
            return false;
        }
        views
            .graphics
            .insert((object.kind.layer(), object.id), Arc::clone(&object));
        views.physics.insert(object.id, object);
        true
    }

    /// Remove an object from both views. Returns the removed object, if any.
    pub fn remove(&self, id: ObjectId) -> Option<Arc<WorldObject>> {
        let mut views = self.write();
        let object = views.physics.remove(&id)?;
        views.graphics.remove(&(object.kind.layer(), id));
        Some(object)
    }

    pub fn clear(&self) {
        let mut views = self.write();
        views.graphics.clear();
        views.physics.clear();
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.read().physics.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.read().physics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the graphics view in draw order
    pub fn graphics(&self) -> Vec<Arc<WorldObject>> {
        self.read().graphics.values().cloned().collect()
    }

    /// Snapshot of the physics view in id order
    pub fn physics(&self) -> Vec<Arc<WorldObject>> {
        self.read().physics.values().cloned().collect()
    }

    /// Visit the graphics view under the read lock.
    ///
    /// The callback must not call back into the registry.
    pub fn for_each_graphics<F: FnMut(&WorldObject)>(&self, mut f: F) {
        for object in self.read().graphics.values() {
            f(object);
        }
    }
}
