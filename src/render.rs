use crate::canvas::DiagramCanvas;
use crate::config::{Config, RenderConfig};
use crate::node::{NodeState, escape_xml, measure_node, render_node};
use crate::theme::Theme;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

pub const EMPTY_MESSAGE: &str = "No components found to display.";

/// Measures every node with the renderer's metrics and reports the sizes to the canvas, so
/// that edge anchors follow the real boxes. Returns how many sizes changed.
pub fn measure_nodes(canvas: &mut DiagramCanvas, theme: &Theme, config: &Config) -> usize {
    let sizes: Vec<(String, crate::layout::Size)> = canvas
        .nodes()
        .iter()
        .map(|node| (node.id().to_string(), measure_node(&node.node, theme, &config.node).size))
        .collect();
    let changed = sizes
        .into_iter()
        .filter(|(id, size)| canvas.report_node_size(id, *size))
        .count();
    debug!(changed, "reported node sizes");
    changed
}

/// Renders the canvas as it currently looks: grid, viewport transform, edges, then nodes.
pub fn render_svg(canvas: &DiagramCanvas, theme: &Theme, config: &Config) -> String {
    let mut svg = String::new();
    let size = canvas.viewport_size();
    let width = size.width.max(1.0);
    let height = size.height.max(1.0);
    let viewport = canvas.viewport();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" data-direction=\"{}\">",
        canvas.direction().token()
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.render.background
    ));

    if config.render.show_grid {
        let spacing = config.canvas.background_grid * viewport.scale;
        svg.push_str(&format!(
            "<defs><pattern id=\"grid\" width=\"{spacing:.2}\" height=\"{spacing:.2}\" patternUnits=\"userSpaceOnUse\" x=\"{:.2}\" y=\"{:.2}\"><path d=\"M {spacing:.2} 0 L 0 0 0 {spacing:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\"/></pattern></defs>",
            viewport.pan.x,
            viewport.pan.y,
            theme.grid_color
        ));
        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"url(#grid)\"/>");
    }

    if canvas.is_empty() {
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"14\" fill=\"{}\">{}</text>",
            width / 2.0,
            height / 2.0,
            theme.font_family,
            theme.muted_text_color,
            EMPTY_MESSAGE
        ));
        svg.push_str("</svg>");
        return svg;
    }

    svg.push_str(&format!("<g class=\"content\" transform=\"{}\">", viewport.transform()));

    let edges = canvas.edges();
    svg.push_str("<defs>");
    // Marker ids use the edge index; display ids are not unique.
    for (idx, edge) in edges.iter().enumerate() {
        let color = edge_color(edge.selected, theme);
        svg.push_str(&format!(
            "<marker id=\"arrowhead-{idx}\" viewBox=\"0 0 10 10\" refX=\"5\" refY=\"5\" markerWidth=\"5\" markerHeight=\"5\" orient=\"auto\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{color}\"/></marker>"
        ));
    }
    svg.push_str("</defs>");

    for (idx, edge) in edges.iter().enumerate() {
        let d = edge.path.svg_d();
        let id = escape_xml(&edge.id);
        let stroke_width = if edge.selected { 2 } else { 1 };
        svg.push_str(&format!(
            "<g class=\"edge\" data-id=\"{id}\" data-source=\"{}\" data-target=\"{}\">",
            escape_xml(&edge.source),
            escape_xml(&edge.target)
        ));
        svg.push_str(&format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{stroke_width}\" marker-end=\"url(#arrowhead-{idx})\"/>",
            edge_color(edge.selected, theme)
        ));
        svg.push_str(&format!(
            "<path class=\"hit\" d=\"{d}\" fill=\"none\" stroke=\"transparent\" stroke-width=\"{}\"/>",
            config.canvas.hit_stroke_width
        ));
        svg.push_str("</g>");
    }

    let selected = canvas.selection().node_id();
    for node in canvas.nodes() {
        let metrics = measure_node(&node.node, theme, &config.node);
        let state = NodeState {
            selected: selected == Some(node.id()),
            highlighted: canvas.is_highlighted(node.id()),
        };
        render_node(
            &mut svg,
            &node.node,
            node.position,
            &metrics,
            state,
            theme,
            &config.node,
        );
    }

    svg.push_str("</g>");
    svg.push_str("</svg>");
    svg
}

fn edge_color(selected: bool, theme: &Theme) -> &str {
    if selected {
        &theme.edge_selected_color
    } else {
        &theme.edge_color
    }
}

/// Two-pass render: measure and report node sizes, then draw with corrected edge anchors.
pub fn render_measured_svg(canvas: &mut DiagramCanvas, theme: &Theme, config: &Config) -> String {
    measure_nodes(canvas, theme, config);
    render_svg(canvas, theme, config)
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("invalid output size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap
        .save_png(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}
