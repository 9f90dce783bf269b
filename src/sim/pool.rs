//! Obstacle entity pool
//!
//! One arena per movement type. Entities are addressed by generation-checked
//! handles: every release bumps the generation, so a handle held across a
//! recycle can no longer touch the entity.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::lane::{Lane, MovementType};
use crate::consts::{OFF_TRACK_X, OFF_TRACK_Z};
use crate::error::PoolError;
use crate::platform::EntityHost;
use crate::settings::PoolSettings;

/// Stable reference to a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObstacleHandle {
    pub kind: MovementType,
    pub index: u32,
    pub generation: u32,
}

/// Lifecycle of a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityState {
    /// Hidden, uncollidable, parked off-track
    Pooled,
    /// Visible, colliding, scrolling
    Active,
}

/// Where and what an activation places
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activation {
    pub position: Vec3,
    pub lane: Lane,
    pub tutorial: bool,
}

/// A pooled obstacle entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PooledObstacle {
    pub kind: MovementType,
    pub state: EntityState,
    pub position: Vec3,
    pub lane: Lane,
    pub generation: u32,
    /// Reset on every activation
    pub has_damaged_player: bool,
    pub tutorial: bool,
    /// Lent out by `acquire` but not yet activated
    #[serde(skip)]
    lent: bool,
}

impl PooledObstacle {
    fn new(kind: MovementType) -> Self {
        Self {
            kind,
            state: EntityState::Pooled,
            position: off_track(),
            lane: Lane::Center,
            generation: 0,
            has_damaged_player: false,
            tutorial: false,
            lent: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == EntityState::Active
    }
}

#[inline]
fn off_track() -> Vec3 {
    Vec3::new(OFF_TRACK_X, 0.0, OFF_TRACK_Z)
}

/// Entities and free-list for one movement type
#[derive(Debug, Clone, Default)]
struct PoolBucket {
    entities: Vec<PooledObstacle>,
    free: Vec<u32>,
}

/// Per-type pools of obstacle entities
pub struct ObstaclePool {
    buckets: [PoolBucket; 3],
    settings: PoolSettings,
    host: Box<dyn EntityHost>,
}

impl std::fmt::Debug for ObstaclePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObstaclePool")
            .field("buckets", &self.buckets)
            .field("settings", &self.settings)
            .finish()
    }
}

impl ObstaclePool {
    /// Create the pool and pre-warm every configured bucket
    pub fn new(settings: PoolSettings, host: Box<dyn EntityHost>) -> Self {
        let mut pool = Self {
            buckets: Default::default(),
            settings,
            host,
        };

        for kind in MovementType::ALL {
            if pool.settings.entity_classes.for_kind(kind).is_none() {
                log::warn!(
                    "No entity class configured for {:?}; these obstacles will be skipped",
                    kind
                );
                continue;
            }
            let created = pool.expand(kind, pool.settings.initial_size);
            log::info!("Pool {:?} initialized with {} entities", kind, created);
        }

        pool
    }

    /// Lend out a pooled entity of `kind`, growing the bucket if it is empty.
    ///
    /// The entity is still `Pooled` when returned; `activate` brings it into play.
    pub fn acquire(&mut self, kind: MovementType) -> Result<ObstacleHandle, PoolError> {
        if self.settings.entity_classes.for_kind(kind).is_none() {
            return Err(PoolError::MissingEntityClass(kind));
        }

        if self.buckets[kind.index()].free.is_empty() {
            let created = self.expand(kind, self.settings.growth);
            if created == 0 {
                return Err(PoolError::Exhausted { kind });
            }
            log::info!(
                "Pool {:?} expanded by {} (total {})",
                kind,
                created,
                self.total(kind)
            );
        }

        let bucket = &mut self.buckets[kind.index()];
        let index = bucket.free.pop().ok_or(PoolError::Exhausted { kind })?;
        let entity = &mut bucket.entities[index as usize];
        debug_assert_eq!(entity.state, EntityState::Pooled);
        entity.lent = true;

        Ok(ObstacleHandle {
            kind,
            index,
            generation: entity.generation,
        })
    }

    /// Bring a lent entity into play. Returns false for stale or already-active handles.
    pub fn activate(&mut self, handle: ObstacleHandle, activation: Activation) -> bool {
        let Some(entity) = self.entity_mut(handle) else {
            return false;
        };
        if entity.state != EntityState::Pooled {
            return false;
        }
        entity.state = EntityState::Active;
        entity.position = activation.position;
        entity.lane = activation.lane;
        entity.tutorial = activation.tutorial;
        entity.has_damaged_player = false;
        entity.lent = false;
        true
    }

    /// Return an entity to the pool. Stale handles are ignored.
    ///
    /// Returns true if the entity changed state.
    pub fn release(&mut self, handle: ObstacleHandle) -> bool {
        let Some(entity) = self.entity_mut(handle) else {
            return false;
        };
        if entity.state == EntityState::Pooled && !entity.lent {
            return false;
        }
        entity.state = EntityState::Pooled;
        entity.position = off_track();
        entity.tutorial = false;
        entity.has_damaged_player = false;
        entity.lent = false;
        entity.generation = entity.generation.wrapping_add(1);
        self.buckets[handle.kind.index()].free.push(handle.index);
        true
    }

    pub fn get(&self, handle: ObstacleHandle) -> Option<&PooledObstacle> {
        self.buckets[handle.kind.index()]
            .entities
            .get(handle.index as usize)
            .filter(|e| e.generation == handle.generation)
    }

    fn entity_mut(&mut self, handle: ObstacleHandle) -> Option<&mut PooledObstacle> {
        self.buckets[handle.kind.index()]
            .entities
            .get_mut(handle.index as usize)
            .filter(|e| e.generation == handle.generation)
    }

    /// Set the per-activation damage flag. False if already set or not active.
    pub fn mark_damaged(&mut self, handle: ObstacleHandle) -> bool {
        match self.entity_mut(handle) {
            Some(entity) if entity.is_active() && !entity.has_damaged_player => {
                entity.has_damaged_player = true;
                true
            }
            _ => false,
        }
    }

    /// Move every active entity along X
    pub fn translate_active(&mut self, dx: f32) {
        for bucket in &mut self.buckets {
            for entity in bucket.entities.iter_mut().filter(|e| e.is_active()) {
                entity.position.x += dx;
            }
        }
    }

    /// Handles of all active entities (stable order: type, then index)
    pub fn active_handles(&self) -> Vec<ObstacleHandle> {
        let mut handles = Vec::new();
        for kind in MovementType::ALL {
            for (index, entity) in self.buckets[kind.index()].entities.iter().enumerate() {
                if entity.is_active() {
                    handles.push(ObstacleHandle {
                        kind,
                        index: index as u32,
                        generation: entity.generation,
                    });
                }
            }
        }
        handles
    }

    pub fn active_count(&self) -> usize {
        self.buckets
            .iter()
            .map(|b| b.entities.iter().filter(|e| e.is_active()).count())
            .sum()
    }

    pub fn active_of(&self, kind: MovementType) -> usize {
        self.buckets[kind.index()]
            .entities
            .iter()
            .filter(|e| e.is_active())
            .count()
    }

    /// Entities ever created for `kind` (never decreases)
    pub fn total(&self, kind: MovementType) -> usize {
        self.buckets[kind.index()].entities.len()
    }

    pub fn free_count(&self, kind: MovementType) -> usize {
        self.buckets[kind.index()].free.len()
    }

    /// Create up to `count` entities through the host
    fn expand(&mut self, kind: MovementType, count: u32) -> usize {
        let Some(class) = self.settings.entity_classes.for_kind(kind) else {
            return 0;
        };
        let bucket = &mut self.buckets[kind.index()];
        let mut created = 0;
        for _ in 0..count {
            match self.host.create_entity(kind, class) {
                Ok(()) => {
                    let index = bucket.entities.len() as u32;
                    bucket.entities.push(PooledObstacle::new(kind));
                    bucket.free.push(index);
                    created += 1;
                }
                Err(err) => {
                    log::error!("Failed to create pooled {:?} entity: {}", kind, err);
                }
            }
        }
        created
    }
}
