// Panel domain model
use super::geometry::{GridRect, PanelId};
use serde_json::Value;

/// Content half of a panel, shared by every breakpoint.
///
/// `kind`, `data_binding` and `config` belong to the visual registry and the
/// data layer; the layout engine only carries them around.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub id: PanelId,
    pub kind: String,
    pub title: String,
    pub data_binding: Value,
    pub config: Value,
}

impl Panel {
    pub fn new(id: PanelId, kind: String, title: String) -> Self {
        Self {
            id,
            kind,
            title,
            data_binding: Value::Null,
            config: Value::Null,
        }
    }

    /// Clone everything but the id; the title gets a copy suffix.
    pub fn duplicate_as(&self, id: PanelId) -> Self {
        Self {
            id,
            kind: self.kind.clone(),
            title: format!("{} (Copy)", self.title),
            data_binding: self.data_binding.clone(),
            config: self.config.clone(),
        }
    }
}

/// Requested shape of a new panel (toolbar "add panel" command).
#[derive(Debug, Clone, PartialEq)]
pub struct PanelTemplate {
    pub kind: String,
    pub title: String,
    pub w: u32,
    pub h: u32,
    pub data_binding: Value,
    pub config: Value,
}

impl PanelTemplate {
    pub fn new(kind: impl Into<String>, title: impl Into<String>, w: u32, h: u32) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            w,
            h,
            data_binding: Value::Null,
            config: Value::Null,
        }
    }
}

/// Hands out `panel-<n>` ids that are not already in use.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self, is_taken: impl Fn(&PanelId) -> bool) -> PanelId {
        loop {
            let candidate = PanelId::new(format!("panel-{}", self.next));
            self.next += 1;
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }
}

/// A panel joined with its rectangle in one breakpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub panel: Panel,
    pub rect: GridRect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_keeps_content() {
        let mut panel = Panel::new(PanelId::new("p1"), "bar".into(), "Revenue".into());
        panel.config = serde_json::json!({ "stacked": true });

        let copy = panel.duplicate_as(PanelId::new("p2"));
        assert_eq!(copy.id, PanelId::new("p2"));
        assert_eq!(copy.title, "Revenue (Copy)");
        assert_eq!(copy.kind, "bar");
        assert_eq!(copy.config, panel.config);
    }

    #[test]
    fn test_allocator_skips_taken_ids() {
        let mut ids = IdAllocator::new();
        let taken = [PanelId::new("panel-1"), PanelId::new("panel-2")];

        assert_eq!(ids.allocate(|id| taken.contains(id)), PanelId::new("panel-3"));
        assert_eq!(ids.allocate(|id| taken.contains(id)), PanelId::new("panel-4"));
    }
}
