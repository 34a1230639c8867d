//! Reusable storage for high-churn objects (player shots, explosions)
//!
//! Retired objects go to a free list and are handed back out by
//! [`Pool::acquire`], so a steady stream of shots does not allocate every
//! frame.

use serde::{Deserialize, Serialize};

use super::entity::{Explosion, Projectile, ProjectileKind};

/// Objects that can live in a [`Pool`]
pub trait Poolable: Default {
    /// Still in use; dead objects are reclaimed by [`Pool::reclaim`]
    fn is_live(&self) -> bool;
}

impl Default for Projectile {
    fn default() -> Self {
        let mut shot = Projectile::new(ProjectileKind::Shot, glam::Vec2::ZERO, glam::Vec2::ZERO);
        shot.alive = false;
        shot
    }
}

impl Poolable for Projectile {
    fn is_live(&self) -> bool {
        self.alive
    }
}

impl Poolable for Explosion {
    fn is_live(&self) -> bool {
        self.frames_left > 0
    }
}

/// Fixed-capacity object pool with a free list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool<T> {
    active: Vec<T>,
    #[serde(skip)]
    free: Vec<T>,
    capacity: usize,
}

impl<T: Poolable> Pool<T> {
    /// Create a pool holding at most `capacity` live objects, pre-warmed
    pub fn with_capacity(capacity: usize) -> Self {
        let mut free = Vec::with_capacity(capacity);
        free.resize_with(capacity, T::default);
        Self {
            active: Vec::with_capacity(capacity),
            free,
            capacity,
        }
    }

    /// Take an object from the free list and initialise it.
    /// Returns `None` when the pool is at capacity.
    pub fn acquire(&mut self, init: impl FnOnce(&mut T)) -> Option<&mut T> {
        if self.active.len() >= self.capacity {
            return None;
        }
        let mut item = self.free.pop().unwrap_or_default();
        init(&mut item);
        self.active.push(item);
        self.active.last_mut()
    }

    /// Move dead objects back to the free list, keeping live ones in order
    pub fn reclaim(&mut self) -> usize {
        let mut write = 0;
        for read in 0..self.active.len() {
            if self.active[read].is_live() {
                self.active.swap(write, read);
                write += 1;
            }
        }
        let reclaimed = self.active.len() - write;
        self.free.extend(self.active.drain(write..));
        reclaimed
    }

    /// Return everything to the free list
    pub fn clear(&mut self) {
        self.free.append(&mut self.active);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.active.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.active.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.active
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Objects waiting for reuse
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
