// Vertical compaction and collision resolution
use super::collision::first_collision;
use super::geometry::{GridRect, PanelId, Placement};

/// Indices of `placements` in ascending `(y, x)` order, list order on ties.
fn reading_order(placements: &[Placement]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..placements.len()).collect();
    order.sort_by_key(|&i| (placements[i].rect.y, placements[i].rect.x, i));
    order
}

/// Pull every panel up as far as it goes without colliding.
///
/// Panels are settled top to bottom, so a panel can only rise into space left
/// free by panels above it. Only `y` changes and the list order is kept.
pub fn compact(placements: &[Placement]) -> Vec<Placement> {
    let mut result = placements.to_vec();
    let mut settled: Vec<GridRect> = Vec::with_capacity(placements.len());

    for i in reading_order(placements) {
        let mut rect = placements[i].rect;
        // lands on the lowest settled bottom among panels sharing a column
        rect.y = settled
            .iter()
            .filter(|s| shares_columns(s, &rect) && s.y <= rect.y)
            .map(|s| s.bottom().min(rect.y))
            .max()
            .unwrap_or(0);
        settled.push(rect);
        result[i].rect = rect;
    }

    result
}

fn shares_columns(a: &GridRect, b: &GridRect) -> bool {
    a.x < b.right() && b.x < a.right()
}

/// Keep `anchor` where it is and push every panel that ends up overlapping
/// it (directly or through a cascade) down below the obstruction.
pub fn resolve_collisions(placements: &[Placement], anchor: &PanelId) -> Vec<Placement> {
    let mut result = placements.to_vec();
    let mut settled: Vec<Placement> = Vec::with_capacity(placements.len());

    if let Some(fixed) = placements.iter().find(|p| &p.id == anchor) {
        settled.push(fixed.clone());
    }

    for i in reading_order(placements) {
        if &placements[i].id == anchor {
            continue;
        }
        let mut rect = placements[i].rect;
        while let Some(hit) = first_collision(&rect, &settled, None) {
            rect.y = hit.rect.bottom();
        }
        if rect != placements[i].rect {
            tracing::debug!(
                "Pushed panel {} from y={} to y={}",
                placements[i].id,
                placements[i].rect.y,
                rect.y
            );
        }
        result[i].rect = rect;
        settled.push(Placement::new(placements[i].id.clone(), rect));
    }

    result
}
