// Dashboard domain model
use super::breakpoint::{default_profiles, Breakpoint, BreakpointManager, LayoutProfile};
use super::collision::overlapping_pairs;
use super::geometry::{GridRect, PanelId, Placement};
use super::panel::{Panel, PanelView};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Shared panel set plus one independent arrangement per breakpoint.
///
/// Every arrangement lists the panels in the same order as `panels`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    panels: Vec<Panel>,
    layouts: BTreeMap<Breakpoint, LayoutProfile>,
    arrangements: BTreeMap<Breakpoint, Vec<Placement>>,
    last_modified: DateTime<Utc>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(default_profiles(), Utc::now())
    }
}

impl Dashboard {
    pub fn new(layouts: BTreeMap<Breakpoint, LayoutProfile>, last_modified: DateTime<Utc>) -> Self {
        Self {
            panels: Vec::new(),
            layouts,
            arrangements: Breakpoint::ALL.iter().map(|bp| (*bp, Vec::new())).collect(),
            last_modified,
        }
    }

    /// Assemble a dashboard from parts that already satisfy the invariants.
    pub(crate) fn from_parts(
        panels: Vec<Panel>,
        layouts: BTreeMap<Breakpoint, LayoutProfile>,
        arrangements: BTreeMap<Breakpoint, Vec<Placement>>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            panels,
            layouts,
            arrangements,
            last_modified,
        }
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, id: &PanelId) -> Option<&Panel> {
        self.panels.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PanelId) -> bool {
        self.panel(id).is_some()
    }

    pub fn layouts(&self) -> &BTreeMap<Breakpoint, LayoutProfile> {
        &self.layouts
    }

    pub fn profile(&self, breakpoint: Breakpoint) -> LayoutProfile {
        BreakpointManager::active_profile(&self.layouts, breakpoint).sanitized()
    }

    pub fn arrangement(&self, breakpoint: Breakpoint) -> &[Placement] {
        self.arrangements
            .get(&breakpoint)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn placement(&self, breakpoint: Breakpoint, id: &PanelId) -> Option<GridRect> {
        self.arrangement(breakpoint)
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.rect)
    }

    /// Panels joined with their rectangles in `breakpoint`, in list order.
    pub fn views(&self, breakpoint: Breakpoint) -> Vec<PanelView> {
        self.panels
            .iter()
            .filter_map(|panel| {
                self.placement(breakpoint, &panel.id).map(|rect| PanelView {
                    panel: panel.clone(),
                    rect,
                })
            })
            .collect()
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Human-readable invariant violations; empty for a valid dashboard.
    pub fn violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for bp in Breakpoint::ALL {
            let columns = self.profile(bp).columns;
            let arrangement = self.arrangement(bp);

            if arrangement.len() != self.panels.len() {
                problems.push(format!(
                    "{bp}: {} placements for {} panels",
                    arrangement.len(),
                    self.panels.len()
                ));
            }
            for p in arrangement {
                if !p.rect.fits(columns) {
                    problems.push(format!("{bp}: panel {} out of bounds {:?}", p.id, p.rect));
                }
            }
            for (a, b) in overlapping_pairs(arrangement) {
                problems.push(format!("{bp}: panels {a} and {b} overlap"));
            }
        }
        problems
    }

    pub(crate) fn push_panel(&mut self, panel: Panel, rects: BTreeMap<Breakpoint, GridRect>) {
        for bp in Breakpoint::ALL {
            let rect = rects.get(&bp).copied().unwrap_or(GridRect::new(0, 0, 1, 1));
            self.arrangements
                .entry(bp)
                .or_default()
                .push(Placement::new(panel.id.clone(), rect));
        }
        self.panels.push(panel);
    }

    pub(crate) fn remove_panel(&mut self, id: &PanelId) -> Option<Panel> {
        let idx = self.panels.iter().position(|p| &p.id == id)?;
        for arrangement in self.arrangements.values_mut() {
            arrangement.retain(|p| &p.id != id);
        }
        Some(self.panels.remove(idx))
    }

    pub(crate) fn set_arrangement(&mut self, breakpoint: Breakpoint, placements: Vec<Placement>) {
        self.arrangements.insert(breakpoint, placements);
    }

    pub(crate) fn set_profile(&mut self, breakpoint: Breakpoint, profile: LayoutProfile) {
        self.layouts.insert(breakpoint, profile);
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(id: &str) -> Panel {
        Panel::new(PanelId::new(id), "line".into(), id.into())
    }

    fn everywhere(rect: GridRect) -> BTreeMap<Breakpoint, GridRect> {
        Breakpoint::ALL.iter().map(|bp| (*bp, rect)).collect()
    }

    #[test]
    fn test_new_dashboard_is_empty_and_valid() {
        let dashboard = Dashboard::default();
        assert!(dashboard.panels().is_empty());
        assert_eq!(dashboard.layouts().len(), 5);
        assert!(dashboard.violations().is_empty());
    }

    #[test]
    fn test_push_and_remove_keep_arrangements_aligned() {
        let mut dashboard = Dashboard::default();
        dashboard.push_panel(panel("a"), everywhere(GridRect::new(0, 0, 2, 2)));
        dashboard.push_panel(panel("b"), everywhere(GridRect::new(2, 0, 2, 2)));

        assert_eq!(dashboard.views(Breakpoint::Xs).len(), 2);
        assert!(dashboard.violations().is_empty());

        let removed = dashboard.remove_panel(&PanelId::new("a"));
        assert_eq!(removed.map(|p| p.id), Some(PanelId::new("a")));
        for bp in Breakpoint::ALL {
            assert_eq!(dashboard.arrangement(bp).len(), 1);
        }
        assert!(dashboard.remove_panel(&PanelId::new("missing")).is_none());
    }

    #[test]
    fn test_violations_report_overlap_and_bounds() {
        let mut dashboard = Dashboard::default();
        dashboard.push_panel(panel("a"), everywhere(GridRect::new(0, 0, 4, 2)));
        dashboard.push_panel(panel("b"), everywhere(GridRect::new(2, 1, 3, 2)));

        let problems = dashboard.violations();
        // xs has only 4 columns, so "b" is also out of bounds there
        assert!(problems.iter().any(|p| p.contains("overlap")));
        assert!(problems.iter().any(|p| p.starts_with("xs: panel b out of bounds")));
    }
}
