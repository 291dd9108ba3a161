// Grid geometry primitives
use std::fmt;

/// Stable panel identifier, assigned once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(String);

impl PanelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deepest row a pointer gesture, a new panel or a loaded document may reach.
/// Pushes and appends can still go past it, but only by whole panel heights.
pub const MAX_ROWS: u32 = 10_000;

/// Axis-aligned rectangle in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> u32 {
        debug_assert!(self.x.checked_add(self.w).is_some(), "column overflow in {self:?}");
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        debug_assert!(self.y.checked_add(self.h).is_some(), "row overflow in {self:?}");
        self.y.saturating_add(self.h)
    }

    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    pub fn with_origin(self, x: u32, y: u32) -> Self {
        Self { x, y, ..self }
    }

    /// True when the rectangle fits a grid with `columns` columns.
    pub fn fits(&self, columns: u32) -> bool {
        self.w >= 1 && self.h >= 1 && self.right() <= columns
    }
}

/// One panel's rectangle inside a breakpoint arrangement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub id: PanelId,
    pub rect: GridRect,
}

impl Placement {
    pub fn new(id: PanelId, rect: GridRect) -> Self {
        Self { id, rect }
    }
}

/// Pixel-space point reported by the host (pointer coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, origin: PixelPoint) -> PixelPoint {
        PixelPoint::new(self.x - origin.x, self.y - origin.y)
    }
}

/// One past the lowest occupied row.
pub fn max_bottom(placements: &[Placement]) -> u32 {
    placements
        .iter()
        .map(|p| p.rect.bottom())
        .max()
        .unwrap_or(0)
}
