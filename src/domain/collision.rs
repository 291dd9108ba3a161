// Collision detection between grid rectangles
use super::geometry::{GridRect, PanelId, Placement};

/// True iff the rectangles share positive area. Touching edges do not count.
pub fn collides(a: &GridRect, b: &GridRect) -> bool {
    if a.w == 0 || a.h == 0 || b.w == 0 || b.h == 0 {
        return false;
    }
    a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
}

/// First placement (other than `exclude`) that `candidate` collides with.
pub fn first_collision<'a>(
    candidate: &GridRect,
    placements: &'a [Placement],
    exclude: Option<&PanelId>,
) -> Option<&'a Placement> {
    placements
        .iter()
        .filter(|p| exclude != Some(&p.id))
        .find(|p| collides(candidate, &p.rect))
}

pub fn collides_with_any(
    candidate: &GridRect,
    placements: &[Placement],
    exclude: Option<&PanelId>,
) -> bool {
    first_collision(candidate, placements, exclude).is_some()
}

/// Every pair of ids whose rectangles overlap, in list order.
pub fn overlapping_pairs(placements: &[Placement]) -> Vec<(PanelId, PanelId)> {
    let mut pairs = Vec::new();
    for (i, a) in placements.iter().enumerate() {
        for b in &placements[i + 1..] {
            if collides(&a.rect, &b.rect) {
                pairs.push((a.id.clone(), b.id.clone()));
            }
        }
    }
    pairs
}
