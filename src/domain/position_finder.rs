// First-fit slot search over a breakpoint arrangement
use super::collision::collides_with_any;
use super::geometry::{max_bottom, GridRect, Placement};

pub const DEFAULT_SEARCH_DEPTH: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionFinder {
    search_depth: u32,
}

impl Default for PositionFinder {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEPTH)
    }
}

impl PositionFinder {
    pub fn new(search_depth: u32) -> Self {
        Self {
            search_depth: search_depth.max(1),
        }
    }

    pub fn search_depth(&self) -> u32 {
        self.search_depth
    }

    /// Scan rows from `start_y` downwards and columns left to right for the
    /// first slot where a `width` x `height` rectangle collides with nothing.
    ///
    /// Width is clamped to `columns`. When the bounded scan finds nothing the
    /// rectangle goes to `(0, max_bottom)`, below everything else.
    pub fn find_position(
        &self,
        width: u32,
        height: u32,
        placements: &[Placement],
        columns: u32,
        start_y: u32,
    ) -> (u32, u32) {
        let columns = columns.max(1);
        let width = width.clamp(1, columns);
        let height = height.max(1);

        let end_y = start_y.saturating_add(self.search_depth);
        for y in start_y..end_y {
            for x in 0..=columns - width {
                let candidate = GridRect::new(x, y, width, height);
                if !collides_with_any(&candidate, placements, None) {
                    return (x, y);
                }
            }
        }

        let fallback = (0, max_bottom(placements).max(start_y));
        tracing::debug!(
            "No free slot for {}x{} within {} rows of y={}, appending at {:?}",
            width,
            height,
            self.search_depth,
            start_y,
            fallback
        );
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::PanelId;

    fn placement(id: &str, x: u32, y: u32, w: u32, h: u32) -> Placement {
        Placement::new(PanelId::new(id), GridRect::new(x, y, w, h))
    }

    #[test]
    fn test_empty_grid_starts_at_origin() {
        let finder = PositionFinder::default();
        assert_eq!(finder.find_position(4, 2, &[], 12, 0), (0, 0));
    }

    #[test]
    fn test_fills_row_left_to_right() {
        let finder = PositionFinder::default();
        let mut placements = Vec::new();
        let mut found = Vec::new();

        for i in 0..3 {
            let (x, y) = finder.find_position(4, 2, &placements, 12, 0);
            found.push((x, y));
            placements.push(placement(&format!("p{i}"), x, y, 4, 2));
        }

        assert_eq!(found, vec![(0, 0), (4, 0), (8, 0)]);
        assert_eq!(finder.find_position(6, 2, &placements, 12, 0), (0, 2));
    }

    #[test]
    fn test_uses_hole_in_row() {
        let finder = PositionFinder::default();
        let placements = vec![placement("a", 0, 0, 4, 2), placement("b", 8, 0, 4, 2)];
        assert_eq!(finder.find_position(4, 2, &placements, 12, 0), (4, 0));
        assert_eq!(finder.find_position(5, 1, &placements, 12, 0), (0, 2));
    }

    #[test]
    fn test_full_width_goes_to_column_zero() {
        let finder = PositionFinder::default();
        let placements = vec![placement("a", 3, 0, 2, 3)];
        assert_eq!(finder.find_position(12, 1, &placements, 12, 0), (0, 3));
    }

    #[test]
    fn test_oversized_width_is_clamped() {
        let finder = PositionFinder::default();
        assert_eq!(finder.find_position(20, 2, &[], 12, 0), (0, 0));
    }

    #[test]
    fn test_respects_start_row() {
        let finder = PositionFinder::default();
        assert_eq!(finder.find_position(2, 2, &[], 12, 5), (0, 5));
    }

    #[test]
    fn test_falls_back_below_everything() {
        let finder = PositionFinder::new(3);
        let placements = vec![placement("wall", 0, 0, 12, 10)];
        assert_eq!(finder.find_position(4, 2, &placements, 12, 0), (0, 10));
    }
}
