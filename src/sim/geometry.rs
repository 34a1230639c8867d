//! Axis-aligned boxes
//!
//! Screen space: x grows to the right along the level, y grows downward.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{CULL_MARGIN, VIEWPORT_WIDTH};

/// An axis-aligned bounding box given by its top-left corner and size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Strict overlap test (touching edges do not count)
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && other.min.x < a_max.x && self.min.y < b_max.y && other.min.y < a_max.y
    }

    /// Vertical distance between the two boxes (0 when their y ranges overlap)
    pub fn vertical_gap(&self, other: &Aabb) -> f32 {
        let a_max = self.max();
        let b_max = other.max();
        if a_max.y < other.min.y {
            other.min.y - a_max.y
        } else if b_max.y < self.min.y {
            self.min.y - b_max.y
        } else {
            0.0
        }
    }
}

/// Visibility test used by the cull pass
#[inline]
pub fn in_camera_window(x: f32, camera_x: f32) -> bool {
    camera_x - CULL_MARGIN < x && x < camera_x + VIEWPORT_WIDTH + CULL_MARGIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0));
        let c = Aabb::new(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c), "touching edges are not a hit");
    }

    #[test]
    fn test_vertical_gap() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let below = Aabb::new(Vec2::new(0.0, 30.0), Vec2::new(10.0, 10.0));
        assert_eq!(a.vertical_gap(&below), 20.0);
        assert_eq!(below.vertical_gap(&a), 20.0);
        let beside = Aabb::new(Vec2::new(50.0, 5.0), Vec2::new(10.0, 10.0));
        assert_eq!(a.vertical_gap(&beside), 0.0);
    }

    #[test]
    fn test_camera_window() {
        assert!(in_camera_window(100.0, 0.0));
        assert!(in_camera_window(-CULL_MARGIN + 1.0, 0.0));
        assert!(!in_camera_window(-CULL_MARGIN, 0.0));
        assert!(!in_camera_window(VIEWPORT_WIDTH + CULL_MARGIN, 0.0));
    }
}
