// Responsive breakpoints and their layout profiles
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 5] = [
        Breakpoint::Xs,
        Breakpoint::Sm,
        Breakpoint::Md,
        Breakpoint::Lg,
        Breakpoint::Xl,
    ];

    /// Breakpoint whose placements are stored inline on the panel blueprint.
    pub const PRIMARY: Breakpoint = Breakpoint::Lg;

    pub fn min_width(self) -> f64 {
        match self {
            Breakpoint::Xs => 0.0,
            Breakpoint::Sm => 576.0,
            Breakpoint::Md => 768.0,
            Breakpoint::Lg => 1024.0,
            Breakpoint::Xl => 1400.0,
        }
    }

    /// Largest breakpoint whose minimum width does not exceed `viewport_width`.
    pub fn classify(viewport_width: f64) -> Breakpoint {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|bp| bp.min_width() <= viewport_width)
            .unwrap_or(Breakpoint::Xs)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Breakpoint::Xs => "xs",
            Breakpoint::Sm => "sm",
            Breakpoint::Md => "md",
            Breakpoint::Lg => "lg",
            Breakpoint::Xl => "xl",
        }
    }

    pub fn default_profile(self) -> LayoutProfile {
        match self {
            Breakpoint::Xs => LayoutProfile::new(4, 60, Spacing::uniform(8), Spacing::uniform(8)),
            Breakpoint::Sm => LayoutProfile::new(6, 60, Spacing::uniform(10), Spacing::uniform(10)),
            Breakpoint::Md => LayoutProfile::new(8, 60, Spacing::uniform(12), Spacing::uniform(12)),
            Breakpoint::Lg => LayoutProfile::new(12, 60, Spacing::uniform(16), Spacing::uniform(16)),
            Breakpoint::Xl => LayoutProfile::new(16, 60, Spacing::uniform(16), Spacing::uniform(16)),
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown breakpoint '{0}'")]
pub struct UnknownBreakpoint(pub String);

impl FromStr for Breakpoint {
    type Err = UnknownBreakpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|bp| bp.as_str() == s)
            .ok_or_else(|| UnknownBreakpoint(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spacing {
    pub x: u32,
    pub y: u32,
}

impl Spacing {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn uniform(v: u32) -> Self {
        Self::new(v, v)
    }
}

/// Grid geometry of one breakpoint. Pixel quantities are whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutProfile {
    pub columns: u32,
    pub row_height: u32,
    pub margin: Spacing,
    pub padding: Spacing,
}

impl LayoutProfile {
    pub fn new(columns: u32, row_height: u32, margin: Spacing, padding: Spacing) -> Self {
        Self {
            columns,
            row_height,
            margin,
            padding,
        }
    }

    /// Copy with `columns` and `row_height` raised to at least 1.
    pub fn sanitized(self) -> Self {
        Self {
            columns: self.columns.max(1),
            row_height: self.row_height.max(1),
            ..self
        }
    }
}

pub fn default_profiles() -> BTreeMap<Breakpoint, LayoutProfile> {
    Breakpoint::ALL
        .iter()
        .map(|bp| (*bp, bp.default_profile()))
        .collect()
}

/// Tracks the viewport width reported by the host and the breakpoint it maps
/// to. The active breakpoint can also be pinned explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointManager {
    viewport_width: f64,
    active: Breakpoint,
}

impl BreakpointManager {
    pub fn new(viewport_width: f64) -> Self {
        Self {
            viewport_width,
            active: Breakpoint::classify(viewport_width),
        }
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn active(&self) -> Breakpoint {
        self.active
    }

    /// Record a new viewport width. Returns the new breakpoint if it changed.
    pub fn update_viewport(&mut self, viewport_width: f64) -> Option<Breakpoint> {
        self.viewport_width = viewport_width;
        self.set_active(Breakpoint::classify(viewport_width))
    }

    /// Returns the new breakpoint if it changed.
    pub fn set_active(&mut self, breakpoint: Breakpoint) -> Option<Breakpoint> {
        if self.active == breakpoint {
            return None;
        }
        self.active = breakpoint;
        Some(breakpoint)
    }

    /// Stored profile for `breakpoint`, or the built-in default.
    pub fn active_profile(
        profiles: &BTreeMap<Breakpoint, LayoutProfile>,
        breakpoint: Breakpoint,
    ) -> LayoutProfile {
        profiles
            .get(&breakpoint)
            .copied()
            .unwrap_or_else(|| breakpoint.default_profile())
    }
}
