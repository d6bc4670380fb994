use crate::canvas::{DiagramCanvas, Selection, Viewport};
use crate::geometry::Side;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub direction: String,
    pub width: f32,
    pub height: f32,
    pub viewport: Viewport,
    pub selection: Selection,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub tags: Vec<String>,
    pub layer: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub measured: bool,
    pub center: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub from: String,
    pub to: String,
    pub from_side: Side,
    pub to_side: Side,
    pub points: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_canvas(canvas: &DiagramCanvas) -> Self {
        let nodes = canvas
            .nodes()
            .iter()
            .filter_map(|node| {
                let node_box = canvas.node_box(node.id())?;
                Some(NodeDump {
                    id: node.id().to_string(),
                    kind: node.node.kind.to_string(),
                    tags: node.node.tags.clone(),
                    layer: node.layer,
                    x: node.position.x,
                    y: node.position.y,
                    width: node_box.size.width,
                    height: node_box.size.height,
                    measured: node.measured.is_some(),
                    center: node.node.is_center,
                })
            })
            .collect();

        let edges = canvas
            .edges()
            .into_iter()
            .map(|edge| EdgeDump {
                from_side: edge.anchors.source_side,
                to_side: edge.anchors.target_side,
                points: vec![
                    [edge.path.start.x, edge.path.start.y],
                    [edge.path.end.x, edge.path.end.y],
                ],
                id: edge.id,
                from: edge.source,
                to: edge.target,
            })
            .collect();

        let content = canvas.content_size();
        LayoutDump {
            direction: canvas.direction().token().to_string(),
            width: content.width,
            height: content.height,
            viewport: canvas.viewport(),
            selection: canvas.selection().clone(),
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, canvas: &DiagramCanvas) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_canvas(canvas);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Dependency, DependencyGraph, DiagramNode, EntityKind};
    use crate::config::Config;
    use crate::layout::Size;

    #[test]
    fn dump_serializes_canvas_state() {
        let mut canvas = DiagramCanvas::new(&Config::default(), Size::new(1200.0, 800.0));
        canvas.set_graph(DependencyGraph::new(
            vec![
                DiagramNode::new("a", EntityKind::Component),
                DiagramNode::new("b", EntityKind::Resource),
            ],
            vec![Dependency::new("a", "b")],
        ));
        let dump = LayoutDump::from_canvas(&canvas);
        let value = serde_json::to_value(&dump).unwrap();
        assert_eq!(value["direction"], "TB");
        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["edges"][0]["id"], "e-a-b");
        assert_eq!(value["edges"][0]["from_side"], "bottom");
        assert_eq!(value["nodes"][1]["kind"], "Resource");
        assert_eq!(value["selection"]["kind"], "none");
    }
}
