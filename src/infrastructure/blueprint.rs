// Blueprint mapper - Converts between domain models and the JSON document format
use crate::application::events::{LayoutEvent, LayoutSnapshot};
use crate::domain::breakpoint::{Breakpoint, LayoutProfile, Spacing};
use crate::domain::dashboard::Dashboard;
use crate::domain::geometry::{GridRect, PanelId};
use crate::domain::panel::{Panel, PanelView};
use crate::domain::repair::{DashboardDraft, Diagnostic, DraftRect, PanelDraft};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDocument {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDocument {
    pub w: i64,
    pub h: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectDocument {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

/// Spacing is written as a single number when both axes agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpacingDocument {
    Uniform(u32),
    Axes { x: u32, y: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    pub columns: u32,
    pub row_height: u32,
    pub margin: SpacingDocument,
    pub padding: SpacingDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelBlueprint {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub position: PositionDocument,
    pub size: SizeDocument,
    #[serde(default)]
    pub data_binding: Value,
    #[serde(default)]
    pub config: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub placements: BTreeMap<Breakpoint, RectDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    #[serde(default)]
    pub panels: Vec<PanelBlueprint>,
    #[serde(default)]
    pub layouts: BTreeMap<Breakpoint, ProfileDocument>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelViewMessage {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub data_binding: Value,
    pub config: Value,
    pub rect: RectDocument,
}

/// Event as sent over the wire, tagged with its event name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum EventMessage {
    #[serde(rename = "layout:change", rename_all = "camelCase")]
    LayoutChange {
        breakpoint: Breakpoint,
        panels: Vec<PanelViewMessage>,
        layouts: BTreeMap<Breakpoint, ProfileDocument>,
        last_modified: DateTime<Utc>,
    },
    #[serde(rename = "selection:change", rename_all = "camelCase")]
    SelectionChange { panel_id: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticDocument {
    pub panel_id: String,
    pub breakpoint: Option<Breakpoint>,
    pub reason: String,
}

impl From<Spacing> for SpacingDocument {
    fn from(spacing: Spacing) -> Self {
        if spacing.x == spacing.y {
            SpacingDocument::Uniform(spacing.x)
        } else {
            SpacingDocument::Axes {
                x: spacing.x,
                y: spacing.y,
            }
        }
    }
}

impl From<SpacingDocument> for Spacing {
    fn from(doc: SpacingDocument) -> Self {
        match doc {
            SpacingDocument::Uniform(v) => Spacing::uniform(v),
            SpacingDocument::Axes { x, y } => Spacing::new(x, y),
        }
    }
}

impl From<LayoutProfile> for ProfileDocument {
    fn from(profile: LayoutProfile) -> Self {
        Self {
            columns: profile.columns,
            row_height: profile.row_height,
            margin: profile.margin.into(),
            padding: profile.padding.into(),
        }
    }
}

impl From<ProfileDocument> for LayoutProfile {
    fn from(doc: ProfileDocument) -> Self {
        LayoutProfile::new(doc.columns, doc.row_height, doc.margin.into(), doc.padding.into())
    }
}

impl From<GridRect> for RectDocument {
    fn from(rect: GridRect) -> Self {
        Self {
            x: i64::from(rect.x),
            y: i64::from(rect.y),
            w: i64::from(rect.w),
            h: i64::from(rect.h),
        }
    }
}

impl From<RectDocument> for DraftRect {
    fn from(doc: RectDocument) -> Self {
        DraftRect::new(doc.x, doc.y, doc.w, doc.h)
    }
}

fn profile_documents(
    layouts: &BTreeMap<Breakpoint, LayoutProfile>,
) -> BTreeMap<Breakpoint, ProfileDocument> {
    layouts.iter().map(|(bp, p)| (*bp, (*p).into())).collect()
}

/// Serialize a dashboard. The lg placement goes inline as position/size;
/// every other breakpoint lands in `placements`.
pub fn to_document(dashboard: &Dashboard) -> DashboardDocument {
    let panels = dashboard
        .panels()
        .iter()
        .map(|panel| {
            let primary = dashboard
                .placement(Breakpoint::PRIMARY, &panel.id)
                .unwrap_or(GridRect::new(0, 0, 1, 1));
            let placements = Breakpoint::ALL
                .iter()
                .filter(|bp| **bp != Breakpoint::PRIMARY)
                .filter_map(|bp| {
                    dashboard
                        .placement(*bp, &panel.id)
                        .map(|rect| (*bp, RectDocument::from(rect)))
                })
                .collect();

            PanelBlueprint {
                id: panel.id.to_string(),
                kind: panel.kind.clone(),
                title: panel.title.clone(),
                position: PositionDocument {
                    x: i64::from(primary.x),
                    y: i64::from(primary.y),
                },
                size: SizeDocument {
                    w: i64::from(primary.w),
                    h: i64::from(primary.h),
                },
                data_binding: panel.data_binding.clone(),
                config: panel.config.clone(),
                placements,
            }
        })
        .collect();

    DashboardDocument {
        panels,
        layouts: profile_documents(dashboard.layouts()),
        last_modified: dashboard.last_modified(),
    }
}

/// Unchecked draft ready for repair.
pub fn into_draft(document: DashboardDocument) -> DashboardDraft {
    let panels = document
        .panels
        .into_iter()
        .map(|blueprint| {
            let mut placements: BTreeMap<Breakpoint, DraftRect> = blueprint
                .placements
                .into_iter()
                .filter(|(key, _)| *key != Breakpoint::PRIMARY)
                .map(|(key, rect)| (key, rect.into()))
                .collect();
            placements.insert(
                Breakpoint::PRIMARY,
                DraftRect::new(
                    blueprint.position.x,
                    blueprint.position.y,
                    blueprint.size.w,
                    blueprint.size.h,
                ),
            );

            PanelDraft {
                panel: Panel {
                    id: PanelId::new(blueprint.id),
                    kind: blueprint.kind,
                    title: blueprint.title,
                    data_binding: blueprint.data_binding,
                    config: blueprint.config,
                },
                placements,
            }
        })
        .collect();

    DashboardDraft {
        panels,
        layouts: document
            .layouts
            .into_iter()
            .map(|(bp, doc)| (bp, doc.into()))
            .collect(),
        last_modified: document.last_modified,
    }
}

fn view_message(view: &PanelView) -> PanelViewMessage {
    PanelViewMessage {
        id: view.panel.id.to_string(),
        kind: view.panel.kind.clone(),
        title: view.panel.title.clone(),
        data_binding: view.panel.data_binding.clone(),
        config: view.panel.config.clone(),
        rect: view.rect.into(),
    }
}

pub fn snapshot_message(snapshot: &LayoutSnapshot) -> EventMessage {
    EventMessage::LayoutChange {
        breakpoint: snapshot.breakpoint,
        panels: snapshot.panels.iter().map(view_message).collect(),
        layouts: profile_documents(&snapshot.profiles),
        last_modified: snapshot.last_modified,
    }
}

pub fn event_message(event: &LayoutEvent) -> EventMessage {
    match event {
        LayoutEvent::LayoutChange(snapshot) => snapshot_message(snapshot),
        LayoutEvent::SelectionChange(id) => EventMessage::SelectionChange {
            panel_id: id.as_ref().map(|id| id.to_string()),
        },
    }
}

pub fn diagnostic_document(diagnostic: &Diagnostic) -> DiagnosticDocument {
    DiagnosticDocument {
        panel_id: diagnostic.panel_id.to_string(),
        breakpoint: diagnostic.breakpoint,
        reason: diagnostic.reason.to_string(),
    }
}
