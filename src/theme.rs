use serde::{Deserialize, Serialize};

use crate::catalog::EntityKind;

/// Fill/border pair for one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindStyle {
    pub fill: String,
    pub border: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub background: String,
    pub grid_color: String,
    pub header_fill: String,
    pub header_border: String,
    pub component: KindStyle,
    pub resource: KindStyle,
    pub selected_ring: String,
    pub highlighted_ring: String,
    pub center_ring: String,
    pub edge_color: String,
    pub edge_selected_color: String,
    pub chip_fill: String,
    pub chip_text: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            text_color: "#111827".to_string(),
            muted_text_color: "#6B7280".to_string(),
            background: "#F9FAFB".to_string(),
            grid_color: "#E5E7EB".to_string(),
            header_fill: "#F3F4F6".to_string(),
            header_border: "#E5E7EB".to_string(),
            component: KindStyle {
                fill: "#FFFFFF".to_string(),
                border: "#9CA3AF".to_string(),
                icon: "#6B7280".to_string(),
            },
            resource: KindStyle {
                fill: "#F0F9FF".to_string(),
                border: "#38BDF8".to_string(),
                icon: "#0EA5E9".to_string(),
            },
            selected_ring: "#0EA5E9".to_string(),
            highlighted_ring: "#FBBF24".to_string(),
            center_ring: "#A855F7".to_string(),
            edge_color: "#9CA3AF".to_string(),
            edge_selected_color: "#0DE6B4".to_string(),
            chip_fill: "#E5E7EB".to_string(),
            chip_text: "#374151".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            text_color: "#F9FAFB".to_string(),
            muted_text_color: "#9CA3AF".to_string(),
            background: "#111827".to_string(),
            grid_color: "#1F2937".to_string(),
            header_fill: "#374151".to_string(),
            header_border: "#4B5563".to_string(),
            component: KindStyle {
                fill: "#1F2937".to_string(),
                border: "#4B5563".to_string(),
                icon: "#6B7280".to_string(),
            },
            resource: KindStyle {
                fill: "#0C4A6E".to_string(),
                border: "#0369A1".to_string(),
                icon: "#0EA5E9".to_string(),
            },
            selected_ring: "#0EA5E9".to_string(),
            highlighted_ring: "#FBBF24".to_string(),
            center_ring: "#A855F7".to_string(),
            edge_color: "#9CA3AF".to_string(),
            edge_selected_color: "#0DE6B4".to_string(),
            chip_fill: "#374151".to_string(),
            chip_text: "#E5E7EB".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" | "default" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }

    /// Resources get their own palette; every other kind renders like a component.
    pub fn kind_style(&self, kind: &EntityKind) -> &KindStyle {
        match kind {
            EntityKind::Resource => &self.resource,
            _ => &self.component,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
