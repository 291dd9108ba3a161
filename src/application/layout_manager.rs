// Layout manager - The public API over canonical dashboard state
use crate::application::events::{LayoutEvent, LayoutListener, LayoutSnapshot};
use crate::domain::breakpoint::{Breakpoint, BreakpointManager, LayoutProfile};
use crate::domain::collision::collides_with_any;
use crate::domain::compactor::{compact, resolve_collisions};
use crate::domain::dashboard::Dashboard;
use crate::domain::geometry::{GridRect, PanelId, PixelPoint, Placement, MAX_ROWS};
use crate::domain::panel::{IdAllocator, Panel, PanelTemplate, PanelView};
use crate::domain::position_finder::{PositionFinder, DEFAULT_SEARCH_DEPTH};
use crate::domain::repair::{repair, DashboardDraft, Diagnostic};
use crate::domain::session::{
    DragSession, ResizeHandle, ResizeSession, Session, SessionEnd, SessionFrame, SessionKind,
};
use chrono::Utc;
use std::collections::BTreeMap;

pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Rows scanned by the position finder before appending below everything.
    pub search_depth: u32,
    /// Run the compactor after a resize commit as well as after a drag.
    pub compact_after_resize: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            search_depth: DEFAULT_SEARCH_DEPTH,
            compact_after_resize: true,
        }
    }
}

/// Owns the canonical dashboard, the breakpoint tracker and the single
/// interaction session.
///
/// Every method runs to completion synchronously and leaves the dashboard
/// satisfying the layout invariants. Listeners hear about committed changes
/// only; pointer moves inside a session are visible through [`Self::views`].
pub struct LayoutManager {
    dashboard: Dashboard,
    breakpoints: BreakpointManager,
    session: Option<Session>,
    selection: Option<PanelId>,
    ids: IdAllocator,
    finder: PositionFinder,
    options: LayoutOptions,
    listeners: Vec<LayoutListener>,
    revision: u64,
}

impl LayoutManager {
    pub fn new(options: LayoutOptions, viewport_width: f64) -> Self {
        Self::from_dashboard(Dashboard::default(), options, viewport_width)
    }

    /// Wrap a dashboard that already satisfies the invariants.
    pub fn from_dashboard(dashboard: Dashboard, options: LayoutOptions, viewport_width: f64) -> Self {
        Self {
            dashboard,
            breakpoints: BreakpointManager::new(viewport_width),
            session: None,
            selection: None,
            ids: IdAllocator::new(),
            finder: PositionFinder::new(options.search_depth),
            options,
            listeners: Vec::new(),
            revision: 0,
        }
    }

    /// Repair an externally supplied document and wrap the result.
    pub fn load(
        draft: DashboardDraft,
        options: LayoutOptions,
        viewport_width: f64,
    ) -> (Self, Vec<Diagnostic>) {
        let repaired = repair(draft, &PositionFinder::new(options.search_depth));
        if !repaired.diagnostics.is_empty() {
            tracing::warn!(
                "Loaded dashboard needed {} repairs",
                repaired.diagnostics.len()
            );
        }
        (
            Self::from_dashboard(repaired.dashboard, options, viewport_width),
            repaired.diagnostics,
        )
    }

    pub fn subscribe(&mut self, listener: LayoutListener) {
        self.listeners.push(listener);
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    /// Bumped on every committed mutation of the dashboard.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn active_breakpoint(&self) -> Breakpoint {
        self.breakpoints.active()
    }

    pub fn active_profile(&self) -> LayoutProfile {
        self.dashboard.profile(self.active_breakpoint())
    }

    pub fn viewport_width(&self) -> f64 {
        self.breakpoints.viewport_width()
    }

    pub fn selection(&self) -> Option<&PanelId> {
        self.selection.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Panels of `breakpoint` as they should be drawn right now, including the
    /// live rectangle of an in-progress gesture.
    pub fn views(&self, breakpoint: Breakpoint) -> Vec<PanelView> {
        let mut views = self.dashboard.views(breakpoint);
        if let Some(session) = self.session.as_ref().filter(|s| s.breakpoint() == breakpoint) {
            if let Some(view) = views.iter_mut().find(|v| &v.panel.id == session.panel_id()) {
                view.rect = session.live();
            }
        }
        views
    }

    pub fn snapshot(&self, breakpoint: Breakpoint) -> LayoutSnapshot {
        LayoutSnapshot {
            breakpoint,
            panels: self.dashboard.views(breakpoint),
            profiles: self.dashboard.layouts().clone(),
            last_modified: self.dashboard.last_modified(),
        }
    }

    // ---- panel CRUD -------------------------------------------------------

    /// Add a panel, placing it at the first free slot of every breakpoint.
    pub fn add_panel(&mut self, template: PanelTemplate) -> PanelId {
        let id = self.allocate_id();
        let mut rects = BTreeMap::new();
        for bp in Breakpoint::ALL {
            let columns = self.dashboard.profile(bp).columns;
            let w = template.w.clamp(1, columns);
            let h = template.h.clamp(1, MAX_ROWS);
            let (x, y) = self
                .finder
                .find_position(w, h, self.dashboard.arrangement(bp), columns, 0);
            rects.insert(bp, GridRect::new(x, y, w, h));
        }

        let mut panel = Panel::new(id.clone(), template.kind, template.title);
        panel.data_binding = template.data_binding;
        panel.config = template.config;

        tracing::debug!(
            "Added panel {} at {:?}",
            id,
            rects.get(&self.active_breakpoint())
        );
        self.dashboard.push_panel(panel, rects);
        self.commit_change(self.active_breakpoint());
        id
    }

    /// Remove a panel from every breakpoint. Returns false for unknown ids.
    pub fn remove_panel(&mut self, id: &PanelId) -> bool {
        if self.dashboard.remove_panel(id).is_none() {
            return false;
        }

        if self.session.as_ref().is_some_and(|s| s.panel_id() == id) {
            tracing::debug!("Aborting session on removed panel {}", id);
            self.session = None;
        }
        self.commit_change(self.active_breakpoint());

        if self.selection.as_ref() == Some(id) {
            self.set_selection(None);
        }
        true
    }

    /// Copy a panel next to (or below) the original in every breakpoint.
    pub fn duplicate_panel(&mut self, id: &PanelId) -> Option<PanelId> {
        let source = self.dashboard.panel(id)?.clone();
        let new_id = self.allocate_id();

        let mut rects = BTreeMap::new();
        for bp in Breakpoint::ALL {
            let columns = self.dashboard.profile(bp).columns;
            let arrangement = self.dashboard.arrangement(bp);
            let src = self
                .dashboard
                .placement(bp, id)
                .unwrap_or(GridRect::new(0, 0, 1, 1));

            let naive = if src.x + 2 * src.w <= columns {
                src.with_origin(src.x + src.w, src.y)
            } else {
                src.with_origin(src.x, src.bottom())
            };

            let rect = if collides_with_any(&naive, arrangement, None) {
                let (x, y) = self
                    .finder
                    .find_position(src.w, src.h, arrangement, columns, 0);
                GridRect::new(x, y, src.w.min(columns), src.h)
            } else {
                naive
            };
            rects.insert(bp, rect);
        }

        self.dashboard.push_panel(source.duplicate_as(new_id.clone()), rects);
        self.commit_change(self.active_breakpoint());
        Some(new_id)
    }

    pub fn remove_selected(&mut self) -> bool {
        match self.selection.clone() {
            Some(id) => self.remove_panel(&id),
            None => false,
        }
    }

    pub fn duplicate_selected(&mut self) -> Option<PanelId> {
        let id = self.selection.clone()?;
        self.duplicate_panel(&id)
    }

    // ---- whole-layout operations -------------------------------------------

    /// Re-lay the active breakpoint as a plain grid in list order.
    ///
    /// `columns / 4` items per row (at least one), each as wide as its cell;
    /// heights are kept and a row starts below the tallest item above it.
    pub fn reset_layout(&mut self) {
        let bp = self.active_breakpoint();
        let columns = self.dashboard.profile(bp).columns;
        let per_row = (columns / 4).max(1);
        let cell_w = (columns / per_row).max(1);

        let mut y = 0u32;
        let mut row_height = 0u32;
        let placements: Vec<Placement> = self
            .dashboard
            .arrangement(bp)
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let col = i as u32 % per_row;
                if col == 0 && i > 0 {
                    y += row_height;
                    row_height = 0;
                }
                row_height = row_height.max(p.rect.h);
                Placement::new(p.id.clone(), GridRect::new(col * cell_w, y, cell_w, p.rect.h))
            })
            .collect();

        tracing::debug!("Reset {} panels on {}", placements.len(), bp);
        self.dashboard.set_arrangement(bp, placements);
        self.commit_change(bp);
    }

    /// Greedy shelf packing of the active breakpoint.
    ///
    /// Largest area first (reading order, then list order, on ties). Each
    /// panel is placed at the first free slot at or below the bottom edge of
    /// everything placed so far.
    pub fn auto_arrange(&mut self) {
        let bp = self.active_breakpoint();
        let columns = self.dashboard.profile(bp).columns;
        let current = self.dashboard.arrangement(bp).to_vec();

        let mut order: Vec<usize> = (0..current.len()).collect();
        order.sort_by_key(|&i| {
            let rect = current[i].rect;
            let reading = u64::from(rect.y) * u64::from(columns) + u64::from(rect.x);
            (std::cmp::Reverse(rect.area()), reading, i)
        });

        let mut placed: Vec<Placement> = Vec::with_capacity(current.len());
        let mut current_y = 0u32;
        for i in order {
            let rect = current[i].rect;
            let w = rect.w.min(columns);
            let (x, y) = self
                .finder
                .find_position(w, rect.h, &placed, columns, current_y);
            let rect = GridRect::new(x, y, w, rect.h);
            current_y = current_y.max(rect.bottom());
            placed.push(Placement::new(current[i].id.clone(), rect));
        }

        // back to list order
        let placements: Vec<Placement> = current
            .iter()
            .filter_map(|p| placed.iter().find(|q| q.id == p.id).cloned())
            .collect();

        tracing::debug!("Auto-arranged {} panels on {}", placements.len(), bp);
        self.dashboard.set_arrangement(bp, placements);
        self.commit_change(bp);
    }

    /// Replace the stored profile of `breakpoint`.
    ///
    /// Panels that still fit are left alone; panels that no longer fit the
    /// column count are narrowed or shifted left and relocated if that makes
    /// them overlap.
    pub fn set_breakpoint_layout(&mut self, breakpoint: Breakpoint, profile: LayoutProfile) {
        let profile = profile.sanitized();
        self.dashboard.set_profile(breakpoint, profile);

        let columns = profile.columns;
        let mut placements = self.dashboard.arrangement(breakpoint).to_vec();
        let violators: Vec<usize> = (0..placements.len())
            .filter(|&i| !placements[i].rect.fits(columns))
            .collect();

        for &i in &violators {
            let rect = &mut placements[i].rect;
            rect.w = rect.w.clamp(1, columns);
            rect.x = rect.x.min(columns - rect.w);
        }
        for &i in &violators {
            let id = placements[i].id.clone();
            let rect = placements[i].rect;
            if collides_with_any(&rect, &placements, Some(&id)) {
                let others: Vec<Placement> =
                    placements.iter().filter(|p| p.id != id).cloned().collect();
                let (x, y) = self.finder.find_position(rect.w, rect.h, &others, columns, 0);
                placements[i].rect = rect.with_origin(x, y);
            }
            tracing::debug!(
                "Panel {} refitted to {:?} for {} columns on {}",
                id,
                placements[i].rect,
                columns,
                breakpoint
            );
        }

        self.dashboard.set_arrangement(breakpoint, placements);
        self.commit_change(breakpoint);
    }

    // ---- breakpoints and selection -----------------------------------------

    /// Feed a viewport width from the host. Returns the new breakpoint when it
    /// changed. A running session keeps the breakpoint it started on.
    pub fn set_viewport_width(&mut self, viewport_width: f64) -> Option<Breakpoint> {
        let changed = self.breakpoints.update_viewport(viewport_width)?;
        tracing::debug!("Viewport {}px now maps to {}", viewport_width, changed);
        self.emit(LayoutEvent::LayoutChange(self.snapshot(changed)));
        Some(changed)
    }

    pub fn set_active_breakpoint(&mut self, breakpoint: Breakpoint) -> bool {
        if self.breakpoints.set_active(breakpoint).is_none() {
            return false;
        }
        self.emit(LayoutEvent::LayoutChange(self.snapshot(breakpoint)));
        true
    }

    /// Select a panel (or clear with `None`). Unknown ids are ignored.
    pub fn select(&mut self, id: Option<PanelId>) -> bool {
        if let Some(id) = &id {
            if !self.dashboard.contains(id) {
                return false;
            }
        }
        if self.selection == id {
            return false;
        }
        self.set_selection(id);
        true
    }

    // ---- interaction sessions ----------------------------------------------

    /// Start dragging `id` from pointer position `pointer`.
    ///
    /// Ignored (returns false) while another session is active or when the
    /// panel does not exist.
    pub fn begin_drag(&mut self, id: &PanelId, pointer: PixelPoint) -> bool {
        match self.session_frame(id, pointer) {
            Some(frame) => {
                self.session = Some(Session::Drag(DragSession::begin(frame)));
                true
            }
            None => false,
        }
    }

    /// Start resizing `id` by `handle`. Same exclusivity rules as dragging.
    pub fn begin_resize(&mut self, id: &PanelId, handle: ResizeHandle, pointer: PixelPoint) -> bool {
        match self.session_frame(id, pointer) {
            Some(frame) => {
                self.session = Some(Session::Resize(ResizeSession::begin(frame, handle)));
                true
            }
            None => false,
        }
    }

    /// Report a pointer move. Returns the live rectangle, or `None` when idle.
    pub fn update_session(&mut self, pointer: PixelPoint) -> Option<GridRect> {
        self.session.as_mut().map(|s| s.update(pointer))
    }

    /// Pointer-up: make the live rectangle canonical.
    ///
    /// Panels overlapping it are pushed below it, then the arrangement is
    /// compacted (always after a drag, after a resize when configured).
    pub fn commit_session(&mut self) -> Option<SessionEnd> {
        let session = self.session.take()?;
        let bp = session.breakpoint();
        let id = session.panel_id().clone();
        let columns = self.dashboard.profile(bp).columns;

        let mut rect = session.live();
        if !rect.fits(columns) {
            // profile narrowed mid-gesture
            rect.w = rect.w.clamp(1, columns);
            rect.x = rect.x.min(columns - rect.w);
        }

        let mut placements = self.dashboard.arrangement(bp).to_vec();
        let target = placements.iter_mut().find(|p| p.id == id)?;
        target.rect = rect;

        let mut placements = resolve_collisions(&placements, &id);
        if session.kind() == SessionKind::Drag || self.options.compact_after_resize {
            placements = compact(&placements);
        }
        let final_rect = placements
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.rect)
            .unwrap_or(rect);

        tracing::debug!(
            "Committed {:?} of panel {} on {}: {:?} -> {:?}",
            session.kind(),
            id,
            bp,
            session.original(),
            final_rect
        );
        self.dashboard.set_arrangement(bp, placements);
        self.commit_change(bp);

        Some(SessionEnd::Committed {
            panel_id: id,
            rect: final_rect,
        })
    }

    /// Abort the gesture. Canonical state was never touched, so nothing is
    /// compacted and no change is emitted.
    pub fn cancel_session(&mut self) -> Option<SessionEnd> {
        let session = self.session.take()?;
        let id = session.panel_id().clone();
        let restored = self
            .dashboard
            .placement(session.breakpoint(), &id)
            .unwrap_or(session.original());
        tracing::debug!("Cancelled {:?} of panel {}", session.kind(), id);
        Some(SessionEnd::Cancelled {
            panel_id: id,
            restored,
        })
    }

    // ---- internals ----------------------------------------------------------

    fn session_frame(&self, id: &PanelId, pointer: PixelPoint) -> Option<SessionFrame> {
        if let Some(active) = &self.session {
            tracing::debug!(
                "Ignoring session start on {} while {:?} of {} is active",
                id,
                active.kind(),
                active.panel_id()
            );
            return None;
        }
        let bp = self.active_breakpoint();
        let original = self.dashboard.placement(bp, id)?;
        Some(SessionFrame::new(
            id.clone(),
            bp,
            self.dashboard.profile(bp),
            self.viewport_width(),
            original,
            pointer,
        ))
    }

    fn allocate_id(&mut self) -> PanelId {
        let dashboard = &self.dashboard;
        self.ids.allocate(|id| dashboard.contains(id))
    }

    fn set_selection(&mut self, id: Option<PanelId>) {
        self.selection = id.clone();
        self.emit(LayoutEvent::SelectionChange(id));
    }

    fn commit_change(&mut self, breakpoint: Breakpoint) {
        self.dashboard.touch(Utc::now());
        self.revision += 1;
        debug_assert!(
            self.dashboard.violations().is_empty(),
            "{:?}",
            self.dashboard.violations()
        );
        self.emit(LayoutEvent::LayoutChange(self.snapshot(breakpoint)));
    }

    fn emit(&mut self, event: LayoutEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}
