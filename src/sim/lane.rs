//! Lanes, movement types and spawn descriptors
//!
//! Everything here is plain data. Layout code works on relative positions
//! (0..1 along a segment); world conversion happens in the spawner.

use serde::{Deserialize, Serialize};

use crate::consts::LANE_SPACING;

/// One of the three runway lanes (ordered left to right)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Center,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Center, Lane::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Lane::Left => 0,
            Lane::Center => 1,
            Lane::Right => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Fixed world-space Y coordinate of the lane centerline
    #[inline]
    pub fn world_y(self) -> f32 {
        match self {
            Lane::Left => -LANE_SPACING,
            Lane::Center => 0.0,
            Lane::Right => LANE_SPACING,
        }
    }
}

/// The avoidance action an obstacle demands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MovementType {
    /// Jump over it
    LowObstacle,
    /// Duck (slide) under it
    TallObstacle,
    /// Impassable, change lanes
    FullBlock,
}

impl MovementType {
    pub const ALL: [MovementType; 3] = [
        MovementType::LowObstacle,
        MovementType::TallObstacle,
        MovementType::FullBlock,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            MovementType::LowObstacle => 0,
            MovementType::TallObstacle => 1,
            MovementType::FullBlock => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::LowObstacle => "low",
            MovementType::TallObstacle => "tall",
            MovementType::FullBlock => "full",
        }
    }

    /// Only full blocks take a lane out of play
    #[inline]
    pub fn is_blocking(self) -> bool {
        self == MovementType::FullBlock
    }
}

/// A single obstacle placement inside a segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpawnDescriptor {
    pub kind: MovementType,
    pub lane: Lane,
    /// Position along the segment, 0 = start, 1 = end
    pub relative_position: f32,
    #[serde(default)]
    pub vertical_offset: f32,
}

impl ObstacleSpawnDescriptor {
    pub fn new(kind: MovementType, lane: Lane, relative_position: f32) -> Self {
        Self {
            kind,
            lane,
            relative_position,
            vertical_offset: 0.0,
        }
    }

    pub fn with_vertical_offset(mut self, offset: f32) -> Self {
        self.vertical_offset = offset;
        self
    }
}

/// Sort descriptors by position, then lane, for stable downstream iteration
pub fn sort_by_position(layout: &mut [ObstacleSpawnDescriptor]) {
    layout.sort_by(|a, b| {
        a.relative_position
            .total_cmp(&b.relative_position)
            .then(a.lane.cmp(&b.lane))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_ordering_and_world_y() {
        assert!(Lane::Left < Lane::Center && Lane::Center < Lane::Right);
        assert_eq!(Lane::Left.world_y(), -LANE_SPACING);
        assert_eq!(Lane::Center.world_y(), 0.0);
        assert_eq!(Lane::Right.world_y(), LANE_SPACING);
    }

    #[test]
    fn test_lane_index_round_trip() {
        for lane in Lane::ALL {
            assert_eq!(Lane::from_index(lane.index()), Some(lane));
        }
        assert_eq!(Lane::from_index(3), None);
    }

    #[test]
    fn test_only_full_block_is_blocking() {
        assert!(MovementType::FullBlock.is_blocking());
        assert!(!MovementType::LowObstacle.is_blocking());
        assert!(!MovementType::TallObstacle.is_blocking());
    }

    #[test]
    fn test_sort_by_position() {
        let mut layout = vec![
            ObstacleSpawnDescriptor::new(MovementType::FullBlock, Lane::Right, 0.6),
            ObstacleSpawnDescriptor::new(MovementType::FullBlock, Lane::Left, 0.6),
            ObstacleSpawnDescriptor::new(MovementType::LowObstacle, Lane::Center, 0.1),
        ];
        sort_by_position(&mut layout);
        assert_eq!(layout[0].lane, Lane::Center);
        assert_eq!(layout[1].lane, Lane::Left);
        assert_eq!(layout[2].lane, Lane::Right);
    }
}
