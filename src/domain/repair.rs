// Load-time repair of externally supplied dashboards
use super::breakpoint::{Breakpoint, BreakpointManager, LayoutProfile};
use super::collision::collides_with_any;
use super::dashboard::Dashboard;
use super::geometry::{GridRect, PanelId, Placement, MAX_ROWS};
use super::panel::{IdAllocator, Panel};
use super::position_finder::PositionFinder;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Unchecked rectangle as read from a document; any field may be out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftRect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl DraftRect {
    pub fn new(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self { x, y, w, h }
    }
}

impl From<GridRect> for DraftRect {
    fn from(rect: GridRect) -> Self {
        Self::new(
            i64::from(rect.x),
            i64::from(rect.y),
            i64::from(rect.w),
            i64::from(rect.h),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelDraft {
    pub panel: Panel,
    pub placements: BTreeMap<Breakpoint, DraftRect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardDraft {
    pub panels: Vec<PanelDraft>,
    pub layouts: BTreeMap<Breakpoint, LayoutProfile>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairReason {
    DuplicateId { original: PanelId },
    NegativeCoordinate,
    DegenerateSize,
    WidthExceedsColumns { columns: u32 },
    OutOfBounds { columns: u32 },
    BeyondRowLimit { max_rows: u32 },
    Overlap { moved_to: (u32, u32) },
}

impl fmt::Display for RepairReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairReason::DuplicateId { original } => {
                write!(f, "duplicate id '{original}' replaced")
            }
            RepairReason::NegativeCoordinate => write!(f, "negative coordinate zeroed"),
            RepairReason::DegenerateSize => write!(f, "size below 1x1 raised to minimum"),
            RepairReason::WidthExceedsColumns { columns } => {
                write!(f, "width truncated to {columns} columns")
            }
            RepairReason::OutOfBounds { columns } => {
                write!(f, "shifted left to fit {columns} columns")
            }
            RepairReason::BeyondRowLimit { max_rows } => {
                write!(f, "pulled up to end within {max_rows} rows")
            }
            RepairReason::Overlap { moved_to } => {
                write!(f, "overlap resolved by moving to ({}, {})", moved_to.0, moved_to.1)
            }
        }
    }
}

/// One repair applied while loading. `breakpoint` is `None` for panel-wide
/// repairs such as id reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub panel_id: PanelId,
    pub breakpoint: Option<Breakpoint>,
    pub reason: RepairReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    pub dashboard: Dashboard,
    pub diagnostics: Vec<Diagnostic>,
}

/// Clamp a draft rectangle into the grid, recording what had to change.
fn clamp_rect(rect: DraftRect, columns: u32, reasons: &mut Vec<RepairReason>) -> GridRect {
    let columns = i64::from(columns.max(1));
    let DraftRect { mut x, mut y, mut w, mut h } = rect;

    if x < 0 || y < 0 {
        reasons.push(RepairReason::NegativeCoordinate);
        x = x.max(0);
        y = y.max(0);
    }
    if w < 1 || h < 1 {
        reasons.push(RepairReason::DegenerateSize);
        w = w.max(1);
        h = h.max(1);
    }
    if w > columns {
        reasons.push(RepairReason::WidthExceedsColumns {
            columns: columns as u32,
        });
        w = columns;
    }
    if x.saturating_add(w) > columns {
        reasons.push(RepairReason::OutOfBounds {
            columns: columns as u32,
        });
        x = columns - w;
    }
    let max_rows = i64::from(MAX_ROWS);
    if y.saturating_add(h) > max_rows {
        reasons.push(RepairReason::BeyondRowLimit { max_rows: MAX_ROWS });
        h = h.min(max_rows);
        y = max_rows - h;
    }

    let to_u32 = |v: i64| u32::try_from(v).unwrap_or(u32::MAX);
    GridRect::new(to_u32(x), to_u32(y), to_u32(w), to_u32(h))
}

/// Bring a draft into a state that satisfies every layout invariant.
///
/// Valid drafts come back unchanged with no diagnostics. Rectangles that were
/// derived for a breakpoint the draft had no placement for are repaired
/// silently.
pub fn repair(draft: DashboardDraft, finder: &PositionFinder) -> Repaired {
    let mut diagnostics = Vec::new();
    let mut layouts = draft.layouts;
    for bp in Breakpoint::ALL {
        let profile = BreakpointManager::active_profile(&layouts, bp);
        if profile != profile.sanitized() {
            tracing::warn!("Profile {} had zero columns or row height, raised to 1", bp);
        }
        layouts.insert(bp, profile.sanitized());
    }

    // Unique ids first so diagnostics reference the final id.
    let mut seen: HashSet<PanelId> = HashSet::new();
    let all_ids: HashSet<PanelId> = draft.panels.iter().map(|d| d.panel.id.clone()).collect();
    let mut ids = IdAllocator::new();
    let mut panels = draft.panels;
    for draft_panel in &mut panels {
        let id = draft_panel.panel.id.clone();
        if id.as_str().is_empty() || !seen.insert(id.clone()) {
            let fresh = ids.allocate(|c| all_ids.contains(c) || seen.contains(c));
            tracing::warn!("Panel id '{}' is not unique, reassigned to {}", id, fresh);
            seen.insert(fresh.clone());
            diagnostics.push(Diagnostic {
                panel_id: fresh.clone(),
                breakpoint: None,
                reason: RepairReason::DuplicateId { original: id },
            });
            draft_panel.panel.id = fresh;
        }
    }

    let mut arrangements = BTreeMap::new();
    for bp in Breakpoint::ALL {
        let columns = layouts[&bp].columns;
        let mut accepted: Vec<Placement> = Vec::with_capacity(panels.len());

        for draft_panel in &panels {
            let id = &draft_panel.panel.id;
            let (raw, explicit) = match draft_panel.placements.get(&bp) {
                Some(rect) => (*rect, true),
                None => {
                    let derived = draft_panel
                        .placements
                        .get(&Breakpoint::PRIMARY)
                        .or_else(|| draft_panel.placements.values().next())
                        .copied()
                        .unwrap_or(DraftRect::new(0, 0, 1, 1));
                    tracing::debug!("Panel {} has no {} placement, deriving one", id, bp);
                    (derived, false)
                }
            };

            let mut reasons = Vec::new();
            let mut rect = clamp_rect(raw, columns, &mut reasons);

            if collides_with_any(&rect, &accepted, None) {
                let (x, y) = finder.find_position(rect.w, rect.h, &accepted, columns, 0);
                rect = rect.with_origin(x, y);
                reasons.push(RepairReason::Overlap { moved_to: (x, y) });
            }

            if explicit {
                for reason in reasons {
                    tracing::warn!("Repaired panel {} at {}: {}", id, bp, reason);
                    diagnostics.push(Diagnostic {
                        panel_id: id.clone(),
                        breakpoint: Some(bp),
                        reason,
                    });
                }
            }
            accepted.push(Placement::new(id.clone(), rect));
        }

        arrangements.insert(bp, accepted);
    }

    let dashboard = Dashboard::from_parts(
        panels.into_iter().map(|d| d.panel).collect(),
        layouts,
        arrangements,
        draft.last_modified,
    );

    Repaired {
        dashboard,
        diagnostics,
    }
}
