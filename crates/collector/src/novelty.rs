//! Spatial-novelty filter
//!
//! Greedy minimum-distance acceptance test: a frame is kept iff its ground
//! position is at least `min_distance` away from every previously accepted
//! position. Linear scan; the accepted list tops out at the global frame
//! target (300 by default) so quadratic growth never matters here.

/// Accepted 2D position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Minimum-distance frame acceptance filter
#[derive(Debug, Clone)]
pub struct NoveltyFilter {
    min_distance: f64,
    positions: Vec<Position>,
}

impl NoveltyFilter {
    pub fn new(min_distance: f64) -> Self {
        Self {
            min_distance,
            positions: Vec::new(),
        }
    }

    /// Accept (and record) the position iff no previously accepted position
    /// is closer than the threshold. The first position is always accepted.
    pub fn check_and_record(&mut self, x: f64, y: f64) -> bool {
        let candidate = Position { x, y };
        let is_new = self
            .positions
            .iter()
            .all(|p| p.distance_to(&candidate) >= self.min_distance);

        if is_new {
            self.positions.push(candidate);
        }
        is_new
    }

    /// Forget all accepted positions
    pub fn reset(&mut self) {
        self.positions.clear();
    }

    /// Number of accepted positions so far
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Accepted positions, in acceptance order
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }
}
