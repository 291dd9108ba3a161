// Interactive drag and resize sessions
//
// A session owns the live rectangle of exactly one panel while a pointer
// gesture is in progress. Canonical state is only touched on commit, so the
// stored arrangement never shows mid-gesture overlap.
use super::breakpoint::{Breakpoint, LayoutProfile};
use super::geometry::{GridRect, PanelId, PixelPoint, MAX_ROWS};
use super::grid_math::GridMath;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::N,
        ResizeHandle::S,
        ResizeHandle::E,
        ResizeHandle::W,
        ResizeHandle::Ne,
        ResizeHandle::Nw,
        ResizeHandle::Se,
        ResizeHandle::Sw,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResizeHandle::N => "n",
            ResizeHandle::S => "s",
            ResizeHandle::E => "e",
            ResizeHandle::W => "w",
            ResizeHandle::Ne => "ne",
            ResizeHandle::Nw => "nw",
            ResizeHandle::Se => "se",
            ResizeHandle::Sw => "sw",
        }
    }

    pub fn north(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::Ne | ResizeHandle::Nw)
    }

    pub fn south(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::Se | ResizeHandle::Sw)
    }

    pub fn east(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::Ne | ResizeHandle::Se)
    }

    pub fn west(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::Nw | ResizeHandle::Sw)
    }
}

impl fmt::Display for ResizeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resize handle '{0}'")]
pub struct UnknownHandle(pub String);

impl FromStr for ResizeHandle {
    type Err = UnknownHandle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| UnknownHandle(s.to_string()))
    }
}

/// Apply a grid-unit delta to `original` as if `handle` had been dragged.
///
/// Edges opposite the handle stay put. The result is at least 1x1, stays
/// inside `[0, columns)` horizontally and never grows past [`MAX_ROWS`].
pub fn resize_rect(
    original: GridRect,
    handle: ResizeHandle,
    dx: i64,
    dy: i64,
    columns: u32,
) -> GridRect {
    let columns = i64::from(columns.max(1));
    let (x0, y0) = (i64::from(original.x), i64::from(original.y));
    let (w0, h0) = (i64::from(original.w), i64::from(original.h));
    let (right, bottom) = (x0 + w0, y0 + h0);

    let (mut x, mut y, mut w, mut h) = (x0, y0, w0, h0);

    if handle.east() {
        w = w0.saturating_add(dx).max(1).min((columns - x0).max(1));
    }
    if handle.west() {
        x = x0.saturating_add(dx).clamp(0, (right - 1).max(0));
        w = right - x;
    }
    if handle.south() {
        let limit = (i64::from(MAX_ROWS) - y0).max(h0).max(1);
        h = h0.saturating_add(dy).clamp(1, limit);
    }
    if handle.north() {
        y = y0.saturating_add(dy).clamp(0, (bottom - 1).max(0));
        h = bottom - y;
    }

    w = w.clamp(1, columns);
    x = x.clamp(0, columns - w);

    let to_u32 = |v: i64| u32::try_from(v).unwrap_or(u32::MAX);
    GridRect::new(to_u32(x), to_u32(y), to_u32(w), to_u32(h))
}

/// Context captured when a session starts. Later profile or viewport changes
/// do not affect a running session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFrame {
    pub panel_id: PanelId,
    pub breakpoint: Breakpoint,
    pub profile: LayoutProfile,
    pub math: GridMath,
    pub original: GridRect,
    pub start_pointer: PixelPoint,
}

impl SessionFrame {
    pub fn new(
        panel_id: PanelId,
        breakpoint: Breakpoint,
        profile: LayoutProfile,
        viewport_width: f64,
        original: GridRect,
        start_pointer: PixelPoint,
    ) -> Self {
        let profile = profile.sanitized();
        Self {
            panel_id,
            breakpoint,
            profile,
            math: GridMath::new(profile, viewport_width),
            original,
            start_pointer,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    frame: SessionFrame,
    pointer_offset: PixelPoint,
    live: GridRect,
}

impl DragSession {
    pub fn begin(frame: SessionFrame) -> Self {
        let origin = frame
            .math
            .grid_to_pixel(frame.original.x, frame.original.y);
        Self {
            pointer_offset: frame.start_pointer.offset_from(origin),
            live: frame.original,
            frame,
        }
    }

    /// Move the live rectangle so the grabbed point follows the pointer.
    pub fn update(&mut self, pointer: PixelPoint) -> GridRect {
        let origin = pointer.offset_from(self.pointer_offset);
        let (gx, gy) = self.frame.math.pixel_to_grid(origin);
        let max_x = i64::from(self.frame.profile.columns.saturating_sub(self.live.w));
        let max_y = i64::from(MAX_ROWS.saturating_sub(self.live.h));
        let x = gx.clamp(0, max_x);
        let y = gy.clamp(0, max_y);

        self.live = self.live.with_origin(
            u32::try_from(x).unwrap_or(0),
            u32::try_from(y).unwrap_or(0),
        );
        self.live
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    frame: SessionFrame,
    handle: ResizeHandle,
    live: GridRect,
}

impl ResizeSession {
    pub fn begin(frame: SessionFrame, handle: ResizeHandle) -> Self {
        Self {
            live: frame.original,
            frame,
            handle,
        }
    }

    pub fn handle(&self) -> ResizeHandle {
        self.handle
    }

    /// Recompute the live rectangle from the total pointer delta.
    pub fn update(&mut self, pointer: PixelPoint) -> GridRect {
        let delta = pointer.offset_from(self.frame.start_pointer);
        let (dx, dy) = self.frame.math.pixel_delta_to_grid(delta);
        self.live = resize_rect(
            self.frame.original,
            self.handle,
            dx,
            dy,
            self.frame.profile.columns,
        );
        self.live
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Drag,
    Resize,
}

/// The single in-progress gesture. `None` in the owner means idle.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Drag(DragSession),
    Resize(ResizeSession),
}

impl Session {
    fn frame(&self) -> &SessionFrame {
        match self {
            Session::Drag(drag) => &drag.frame,
            Session::Resize(resize) => &resize.frame,
        }
    }

    pub fn kind(&self) -> SessionKind {
        match self {
            Session::Drag(_) => SessionKind::Drag,
            Session::Resize(_) => SessionKind::Resize,
        }
    }

    pub fn panel_id(&self) -> &PanelId {
        &self.frame().panel_id
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.frame().breakpoint
    }

    pub fn original(&self) -> GridRect {
        self.frame().original
    }

    pub fn live(&self) -> GridRect {
        match self {
            Session::Drag(drag) => drag.live,
            Session::Resize(resize) => resize.live,
        }
    }

    pub fn update(&mut self, pointer: PixelPoint) -> GridRect {
        match self {
            Session::Drag(drag) => drag.update(pointer),
            Session::Resize(resize) => resize.update(pointer),
        }
    }
}

/// How a session left the active state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Committed { panel_id: PanelId, rect: GridRect },
    Cancelled { panel_id: PanelId, restored: GridRect },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(original: GridRect, pointer: PixelPoint) -> SessionFrame {
        SessionFrame::new(
            PanelId::new("p"),
            Breakpoint::Lg,
            Breakpoint::Lg.default_profile(),
            1280.0,
            original,
            pointer,
        )
    }

    #[test]
    fn test_handle_edges() {
        assert!(ResizeHandle::Se.south() && ResizeHandle::Se.east());
        assert!(!ResizeHandle::Se.north() && !ResizeHandle::Se.west());
        assert!(ResizeHandle::Nw.north() && ResizeHandle::Nw.west());
        assert!(ResizeHandle::N.north() && !ResizeHandle::N.east());
        assert_eq!("sw".parse::<ResizeHandle>(), Ok(ResizeHandle::Sw));
        assert!("x".parse::<ResizeHandle>().is_err());
    }

    #[test]
    fn test_resize_se_grows_right_and_down() {
        let rect = resize_rect(GridRect::new(0, 0, 4, 2), ResizeHandle::Se, 2, 1, 12);
        assert_eq!(rect, GridRect::new(0, 0, 6, 3));
    }

    #[test]
    fn test_resize_west_keeps_right_edge() {
        let rect = resize_rect(GridRect::new(4, 0, 4, 2), ResizeHandle::W, -2, 0, 12);
        assert_eq!(rect, GridRect::new(2, 0, 6, 2));

        let rect = resize_rect(GridRect::new(4, 0, 4, 2), ResizeHandle::W, 10, 0, 12);
        assert_eq!(rect, GridRect::new(7, 0, 1, 2));

        let rect = resize_rect(GridRect::new(4, 0, 4, 2), ResizeHandle::W, -10, 0, 12);
        assert_eq!(rect, GridRect::new(0, 0, 8, 2));
    }

    #[test]
    fn test_resize_north_keeps_bottom_edge() {
        let rect = resize_rect(GridRect::new(0, 3, 2, 2), ResizeHandle::N, 0, -2, 12);
        assert_eq!(rect, GridRect::new(0, 1, 2, 4));

        let rect = resize_rect(GridRect::new(0, 3, 2, 2), ResizeHandle::Nw, 0, -9, 12);
        assert_eq!(rect, GridRect::new(0, 0, 2, 5));
    }

    #[test]
    fn test_resize_clamps_to_minimum_and_columns() {
        let rect = resize_rect(GridRect::new(2, 0, 4, 2), ResizeHandle::Se, -10, -10, 12);
        assert_eq!(rect, GridRect::new(2, 0, 1, 1));

        let rect = resize_rect(GridRect::new(8, 0, 2, 2), ResizeHandle::E, 10, 0, 12);
        assert_eq!(rect, GridRect::new(8, 0, 4, 2));
    }

    #[test]
    fn test_resize_session_converts_pixels() {
        let start = PixelPoint::new(400.0, 120.0);
        let mut session = ResizeSession::begin(frame(GridRect::new(0, 0, 4, 2), start), ResizeHandle::Se);
        // column width is 104px at 1280px on lg, row height 60px
        let live = session.update(PixelPoint::new(400.0 + 208.0, 120.0 + 60.0));
        assert_eq!(live, GridRect::new(0, 0, 6, 3));
    }

    #[test]
    fn test_drag_follows_pointer_with_offset() {
        // grab the panel 10px inside its top-left corner
        let mut drag = DragSession::begin(frame(GridRect::new(0, 0, 4, 2), PixelPoint::new(26.0, 26.0)));
        let live = drag.update(PixelPoint::new(26.0 + 3.0 * 104.0, 26.0 + 2.0 * 60.0));
        assert_eq!(live, GridRect::new(3, 2, 4, 2));
    }

    #[test]
    fn test_drag_clamps_to_grid() {
        let mut drag = DragSession::begin(frame(GridRect::new(0, 0, 4, 2), PixelPoint::new(16.0, 16.0)));
        assert_eq!(
            drag.update(PixelPoint::new(5000.0, -400.0)),
            GridRect::new(8, 0, 4, 2)
        );
        assert_eq!(
            drag.update(PixelPoint::new(-5000.0, 16.0 + 60.0 * 7.0)),
            GridRect::new(0, 7, 4, 2)
        );
    }

    #[test]
    fn test_drag_stops_at_row_limit() {
        let mut drag = DragSession::begin(frame(GridRect::new(0, 0, 4, 2), PixelPoint::new(16.0, 16.0)));
        let live = drag.update(PixelPoint::new(16.0, 1e12));
        assert_eq!(live, GridRect::new(0, MAX_ROWS - 2, 4, 2));
        assert_eq!(live.bottom(), MAX_ROWS);
    }

    #[test]
    fn test_resize_stops_at_row_limit() {
        let rect = resize_rect(GridRect::new(0, 4, 12, 2), ResizeHandle::S, 0, i64::MAX, 12);
        assert_eq!(rect, GridRect::new(0, 4, 12, MAX_ROWS - 4));

        let start = PixelPoint::new(100.0, 100.0);
        let mut session = ResizeSession::begin(frame(GridRect::new(0, 0, 12, 2), start), ResizeHandle::Se);
        let live = session.update(PixelPoint::new(100.0, 1e12));
        assert_eq!(live, GridRect::new(0, 0, 12, MAX_ROWS));
    }

    #[test]
    fn test_resize_keeps_panels_already_past_row_limit() {
        let pushed = GridRect::new(0, MAX_ROWS + 3, 4, 2);
        assert_eq!(resize_rect(pushed, ResizeHandle::S, 0, 0, 12), pushed);
        assert_eq!(
            resize_rect(pushed, ResizeHandle::S, 0, -1, 12),
            GridRect::new(0, MAX_ROWS + 3, 4, 1)
        );
    }

    #[test]
    fn test_session_accessors() {
        let session = Session::Drag(DragSession::begin(frame(
            GridRect::new(1, 1, 2, 2),
            PixelPoint::default(),
        )));
        assert_eq!(session.kind(), SessionKind::Drag);
        assert_eq!(session.panel_id(), &PanelId::new("p"));
        assert_eq!(session.breakpoint(), Breakpoint::Lg);
        assert_eq!(session.live(), session.original());
    }
}
