// Events emitted by the layout manager to its collaborators
use crate::domain::breakpoint::{Breakpoint, LayoutProfile};
use crate::domain::geometry::PanelId;
use crate::domain::panel::PanelView;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Full panel list of one breakpoint plus every profile.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSnapshot {
    pub breakpoint: Breakpoint,
    pub panels: Vec<PanelView>,
    pub profiles: BTreeMap<Breakpoint, LayoutProfile>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    LayoutChange(LayoutSnapshot),
    SelectionChange(Option<PanelId>),
}

impl LayoutEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutEvent::LayoutChange(_) => "layout:change",
            LayoutEvent::SelectionChange(_) => "selection:change",
        }
    }
}

/// Caller-supplied change callback. Invoked synchronously, in registration
/// order, after the state change it reports.
pub type LayoutListener = Box<dyn FnMut(&LayoutEvent) + Send>;
