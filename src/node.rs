use serde::Serialize;

use crate::catalog::{DiagramNode, EntityKind};
use crate::config::NodeConfig;
use crate::layout::{Point, Size};
use crate::text_metrics;
use crate::theme::Theme;

const TITLE_ICON_GAP: f32 = 8.0;
const MENU_WIDTH: f32 = 24.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagChip {
    pub tag: String,
    /// Offset from the node's top-left corner.
    pub offset: Point,
    pub width: f32,
}

/// Measured content of a node box. The renderer reports `size` back to the canvas so edge
/// anchors follow the real box instead of the layout constants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMetrics {
    pub size: Size,
    pub title: String,
    pub chips: Vec<TagChip>,
}

/// Ring priority: center node, then selection, then edge highlight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    pub selected: bool,
    pub highlighted: bool,
}

pub fn measure_node(node: &DiagramNode, theme: &Theme, config: &NodeConfig) -> NodeMetrics {
    let title_room = (config.width
        - 2.0 * config.header_padding_x
        - config.icon_size
        - TITLE_ICON_GAP
        - MENU_WIDTH)
        .max(0.0);
    let title = text_metrics::truncate_to_width(
        &node.id,
        title_room,
        config.title_font_size,
        &theme.font_family,
        true,
    );

    let chips = layout_tag_chips(&node.tags, theme, config);
    let rows = chips
        .iter()
        .map(|chip| chip.offset.y)
        .fold(Vec::<f32>::new(), |mut rows, y| {
            if !rows.contains(&y) {
                rows.push(y);
            }
            rows
        })
        .len();
    let chip_block = if rows == 0 {
        0.0
    } else {
        rows as f32 * config.chip_height + (rows - 1) as f32 * config.chip_gap
    };
    let height = config.header_height + 2.0 * config.body_padding + chip_block;

    NodeMetrics {
        size: Size::new(config.width, height),
        title,
        chips,
    }
}

/// Flows tag chips left to right inside the body, wrapping onto a new row when the next chip
/// would overflow. A chip wider than the body gets a row of its own and is clipped to it.
pub fn layout_tag_chips(tags: &[String], theme: &Theme, config: &NodeConfig) -> Vec<TagChip> {
    let available = (config.width - 2.0 * config.body_padding).max(0.0);
    let left = config.body_padding;
    let mut x = left;
    let mut y = config.header_height + config.body_padding;
    let mut chips = Vec::with_capacity(tags.len());

    for tag in tags {
        let text = text_metrics::text_width(tag, config.chip_font_size, &theme.font_family, true);
        let width = (text + 2.0 * config.chip_padding_x).min(available);
        if x > left && x + width > left + available {
            x = left;
            y += config.chip_height + config.chip_gap;
        }
        chips.push(TagChip {
            tag: tag.clone(),
            offset: Point::new(x, y),
            width,
        });
        x += width + config.chip_gap;
    }
    chips
}

pub fn render_node(
    svg: &mut String,
    node: &DiagramNode,
    position: Point,
    metrics: &NodeMetrics,
    state: NodeState,
    theme: &Theme,
    config: &NodeConfig,
) {
    let style = theme.kind_style(&node.kind);
    let (ring_color, ring_width) = if node.is_center {
        (theme.center_ring.as_str(), 2.0)
    } else if state.selected {
        (theme.selected_ring.as_str(), 2.0)
    } else if state.highlighted {
        (theme.highlighted_ring.as_str(), 2.0)
    } else {
        (style.border.as_str(), 1.0)
    };
    let Size { width, height } = metrics.size;
    let radius = config.corner_radius;

    let viewable = if node.kind.is_viewable() {
        " data-viewable=\"true\""
    } else {
        ""
    };
    svg.push_str(&format!(
        "<g class=\"node\" data-id=\"{}\" data-kind=\"{}\"{viewable} transform=\"translate({:.2} {:.2})\">",
        escape_xml(&node.id),
        escape_xml(node.kind.as_str()),
        position.x,
        position.y
    ));
    svg.push_str(&format!("<title>{}</title>", escape_xml(&node.id)));
    svg.push_str(&format!(
        "<rect width=\"{width:.2}\" height=\"{height:.2}\" rx=\"{radius}\" ry=\"{radius}\" fill=\"{}\"/>",
        style.fill
    ));

    // Header band with rounded top corners only.
    let header = config.header_height;
    svg.push_str(&format!(
        "<path d=\"M 0 {header:.2} V {radius} Q 0 0 {radius} 0 H {:.2} Q {width:.2} 0 {width:.2} {radius} V {header:.2} Z\" fill=\"{}\"/>",
        width - radius,
        theme.header_fill
    ));
    svg.push_str(&format!(
        "<line x1=\"0\" y1=\"{header:.2}\" x2=\"{width:.2}\" y2=\"{header:.2}\" stroke=\"{}\" stroke-width=\"1\"/>",
        theme.header_border
    ));

    let icon_x = config.header_padding_x;
    let icon_y = (header - config.icon_size) / 2.0;
    push_kind_icon(svg, &node.kind, icon_x, icon_y, config.icon_size, &style.icon);

    let baseline = header / 2.0 + config.title_font_size * 0.35;
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{baseline:.2}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"700\" fill=\"{}\">{}</text>",
        icon_x + config.icon_size + TITLE_ICON_GAP,
        theme.font_family,
        config.title_font_size,
        theme.text_color,
        escape_xml(&metrics.title)
    ));

    // Overflow menu (vertical ellipsis) carrying the view action.
    let menu_x = width - config.header_padding_x - 4.0;
    svg.push_str(&format!("<g class=\"menu\" fill=\"{}\">", theme.muted_text_color));
    for dy in [-5.0f32, 0.0, 5.0] {
        svg.push_str(&format!(
            "<circle cx=\"{menu_x:.2}\" cy=\"{:.2}\" r=\"1.5\"/>",
            header / 2.0 + dy
        ));
    }
    svg.push_str("</g>");

    for chip in &metrics.chips {
        let chip_radius = config.chip_height / 2.0;
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{chip_radius:.2}\" ry=\"{chip_radius:.2}\" fill=\"{}\"/>",
            chip.offset.x,
            chip.offset.y,
            chip.width,
            config.chip_height,
            theme.chip_fill
        ));
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{}</text>",
            chip.offset.x + config.chip_padding_x,
            chip.offset.y + config.chip_height / 2.0 + config.chip_font_size * 0.35,
            theme.font_family,
            config.chip_font_size,
            theme.chip_text,
            escape_xml(&chip.tag)
        ));
    }

    svg.push_str(&format!(
        "<rect class=\"ring\" width=\"{width:.2}\" height=\"{height:.2}\" rx=\"{radius}\" ry=\"{radius}\" fill=\"none\" stroke=\"{ring_color}\" stroke-width=\"{ring_width}\"/>"
    ));
    svg.push_str("</g>");
}

fn push_kind_icon(svg: &mut String, kind: &EntityKind, x: f32, y: f32, size: f32, color: &str) {
    match kind {
        EntityKind::Resource => {
            // Database cylinder.
            let rx = size * 0.4;
            let ry = size * 0.15;
            let cx = x + size / 2.0;
            let top = y + size * 0.2;
            let bottom = y + size * 0.8;
            svg.push_str(&format!(
                "<g fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\"><ellipse cx=\"{cx:.2}\" cy=\"{top:.2}\" rx=\"{rx:.2}\" ry=\"{ry:.2}\"/><path d=\"M {:.2} {top:.2} V {bottom:.2} A {rx:.2} {ry:.2} 0 0 0 {:.2} {bottom:.2} V {top:.2}\"/></g>",
                cx - rx,
                cx + rx
            ));
        }
        _ => {
            // Component block with two connector tabs.
            let body_x = x + size * 0.25;
            let tab = size * 0.2;
            svg.push_str(&format!(
                "<g fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\"><rect x=\"{body_x:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"1.5\"/><rect x=\"{x:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{tab:.2}\"/><rect x=\"{x:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{tab:.2}\"/></g>",
                y + size * 0.1,
                size * 0.65,
                size * 0.8,
                y + size * 0.25,
                size * 0.4,
                y + size * 0.55,
                size * 0.4
            ));
        }
    }
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
