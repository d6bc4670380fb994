//! Interactive diagram canvas.
//!
//! The canvas owns a laid out graph and everything the user can change about its
//! presentation: the viewport transform, dragged node positions, measured node sizes and
//! the current selection. Hosts feed it pointer, wheel and frame events in screen
//! coordinates (relative to the canvas origin) and drain [`CanvasEvent`]s afterwards.

mod interaction;
mod selection;
mod viewport;

pub use interaction::{FrameScheduler, PointerButton, PointerState, snap_to_grid};
pub use selection::Selection;
pub use viewport::Viewport;

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::catalog::{Dependency, DependencyGraph, DiagramNode};
use crate::config::{CanvasConfig, Config, LayoutConfig};
use crate::geometry::{EdgeAnchors, EdgePath, NodeBox, edge_anchors};
use crate::layout::{Direction, LayoutCache, LayoutMode, Point, Size};

/// Notifications for the host, drained with [`DiagramCanvas::take_events`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CanvasEvent {
    NodeClicked { id: String },
    ViewRequested { id: String },
    SelectionChanged { selection: Selection },
    DirectionChanged { direction: Direction },
    /// A drag sample is waiting; the host should call `animation_frame` on its next frame.
    FrameRequested,
}

/// A laid out node plus the state the canvas layers on top of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasNode {
    #[serde(flatten)]
    pub node: DiagramNode,
    pub layer: usize,
    /// Top-left corner in diagram space. Dragging changes only this.
    pub position: Point,
    /// Rendered size once reported; layout constants are used until then.
    pub measured: Option<Size>,
}

impl CanvasNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub anchors: EdgeAnchors,
    pub path: EdgePath,
    pub selected: bool,
}

#[derive(Debug)]
pub struct DiagramCanvas {
    config: CanvasConfig,
    layout_config: LayoutConfig,
    viewport_size: Size,
    graph: DependencyGraph,
    mode: LayoutMode,
    direction: Direction,
    cache: LayoutCache,
    nodes: Vec<CanvasNode>,
    edges: Vec<Dependency>,
    content: Size,
    viewport: Viewport,
    pointer: PointerState,
    frames: FrameScheduler,
    selection: Selection,
    events: Vec<CanvasEvent>,
}

impl DiagramCanvas {
    /// Empty canvas. The initial direction follows the viewport width.
    pub fn new(config: &Config, viewport_size: Size) -> Self {
        Self {
            config: config.canvas.clone(),
            layout_config: config.layout.clone(),
            viewport_size,
            graph: DependencyGraph::default(),
            mode: LayoutMode::Packed,
            direction: Direction::for_viewport_width(viewport_size.width),
            cache: LayoutCache::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            content: Size::default(),
            viewport: Viewport::default(),
            pointer: PointerState::Idle,
            frames: FrameScheduler::default(),
            selection: Selection::None,
            events: Vec::new(),
        }
    }

    /// Replaces the graph with a whole catalog view (components packed).
    pub fn set_graph(&mut self, graph: DependencyGraph) {
        self.graph = graph;
        self.mode = LayoutMode::Packed;
        self.relayout();
    }

    /// Replaces the graph with a single-entity view (one block, no packing).
    pub fn set_focus_graph(&mut self, graph: DependencyGraph) {
        self.graph = graph;
        self.mode = LayoutMode::Focus;
        self.relayout();
    }

    pub fn set_direction(&mut self, direction: Direction) {
        if direction == self.direction {
            return;
        }
        self.direction = direction;
        self.events.push(CanvasEvent::DirectionChanged { direction });
        self.relayout();
    }

    pub fn toggle_direction(&mut self) {
        self.set_direction(self.direction.toggled());
    }

    /// Crossing the narrow-viewport breakpoint re-derives the direction; resizes on the same
    /// side keep a direction the user toggled.
    pub fn set_viewport_size(&mut self, size: Size) {
        let before = Direction::for_viewport_width(self.viewport_size.width);
        let after = Direction::for_viewport_width(size.width);
        self.viewport_size = size;
        if before != after {
            self.set_direction(after);
        }
    }

    fn relayout(&mut self) {
        let hits = self.cache.hits();
        let layout = self
            .cache
            .get(&self.graph, self.direction, self.mode, &self.layout_config)
            .clone();
        if self.cache.hits() > hits {
            trace!("layout unchanged; keeping canvas state");
            return;
        }

        if !self.pointer.is_idle() {
            debug!(state = self.pointer.name(), "layout changed; cancelling pointer interaction");
        }
        self.pointer = PointerState::Idle;
        self.frames.cancel();

        let measured: HashMap<String, Size> = self
            .nodes
            .iter()
            .filter_map(|node| node.measured.map(|size| (node.node.id.clone(), size)))
            .collect();
        self.nodes = layout
            .nodes
            .into_iter()
            .map(|positioned| CanvasNode {
                measured: measured.get(&positioned.node.id).copied(),
                node: positioned.node,
                layer: positioned.layer,
                position: positioned.position,
            })
            .collect();
        self.edges = layout.edges;
        self.content = Size::new(layout.width, layout.height);

        let stale = match &self.selection {
            Selection::None => false,
            Selection::Node(id) => self.node(id).is_none(),
            Selection::Edge(selected) => !self.edges.contains(selected),
        };
        if stale {
            self.set_selection(Selection::None);
        }

        self.fit_to_content();
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            scale = self.viewport.scale,
            "canvas reset to new layout"
        );
    }

    pub fn fit_to_content(&mut self) {
        self.viewport = if self.nodes.is_empty() {
            Viewport::default()
        } else {
            Viewport::fit(
                self.content,
                self.viewport_size,
                self.config.fit_padding,
                self.config.min_scale,
            )
        };
    }

    pub fn pointer_down(&mut self, point: Point, button: PointerButton) {
        if button != PointerButton::Primary || !self.pointer.is_idle() {
            return;
        }
        let diagram = self.viewport.screen_to_diagram(point);
        let hit = self
            .node_at(diagram)
            .map(|node| (node.node.id.clone(), node.position));
        self.pointer = match hit {
            Some((node, position)) => PointerState::Dragging {
                node,
                grab: Point::new(diagram.x - position.x, diagram.y - position.y),
                press: point,
                moved: false,
            },
            None => PointerState::Panning {
                origin: Point::new(point.x - self.viewport.pan.x, point.y - self.viewport.pan.y),
                press: point,
                moved: false,
                edge: self.edge_at(diagram),
            },
        };
        trace!(state = self.pointer.name(), "pointer down");
    }

    pub fn pointer_move(&mut self, point: Point) {
        match &mut self.pointer {
            PointerState::Idle => {}
            PointerState::Panning {
                origin,
                press,
                moved,
                ..
            } => {
                if point != *press {
                    *moved = true;
                }
                self.viewport.pan = Point::new(point.x - origin.x, point.y - origin.y);
            }
            PointerState::Dragging { press, moved, .. } => {
                if point != *press {
                    *moved = true;
                }
                if *moved && self.frames.request(point) {
                    self.events.push(CanvasEvent::FrameRequested);
                }
            }
        }
    }

    /// Applies the latest coalesced drag sample.
    pub fn animation_frame(&mut self) {
        let Some(point) = self.frames.take() else {
            return;
        };
        if let PointerState::Dragging { node, grab, .. } = &self.pointer {
            let (node, grab) = (node.clone(), *grab);
            self.apply_drag(&node, grab, point);
        }
    }

    pub fn pointer_up(&mut self, _point: Point) {
        let state = std::mem::replace(&mut self.pointer, PointerState::Idle);
        let pending = self.frames.take();
        match state {
            PointerState::Idle => {}
            PointerState::Dragging {
                node, grab, moved, ..
            } => {
                if moved {
                    if let Some(point) = pending {
                        self.apply_drag(&node, grab, point);
                    }
                } else {
                    self.click_node(&node);
                }
            }
            PointerState::Panning { moved, edge, .. } => {
                if !moved {
                    match edge {
                        Some(edge) => self.set_selection(Selection::Edge(edge)),
                        None => self.clear_selection(),
                    }
                }
            }
        }
        trace!("pointer up");
    }

    /// Leaving the canvas ends any interaction without a click; a pending drag sample is
    /// discarded.
    pub fn pointer_leave(&mut self) {
        self.frames.cancel();
        self.pointer = PointerState::Idle;
    }

    /// Wheel zoom anchored at the pointer. Positive `delta_y` zooms out.
    pub fn wheel(&mut self, point: Point, delta_y: f32) {
        if delta_y == 0.0 {
            return;
        }
        let factor = self.config.wheel_zoom_factor;
        let target = if delta_y > 0.0 {
            self.viewport.scale / factor
        } else {
            self.viewport.scale * factor
        };
        self.zoom_to(point, target);
    }

    pub fn zoom_in(&mut self) {
        let target = self.viewport.scale * self.config.button_zoom_factor;
        self.zoom_to(self.viewport_center(), target);
    }

    pub fn zoom_out(&mut self) {
        let target = self.viewport.scale / self.config.button_zoom_factor;
        self.zoom_to(self.viewport_center(), target);
    }

    fn zoom_to(&mut self, anchor: Point, scale: f32) {
        let clamped = scale.clamp(self.config.min_scale, self.config.max_scale);
        self.viewport.zoom_at(anchor, clamped);
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport_size.width / 2.0, self.viewport_size.height / 2.0)
    }

    /// Records the rendered size of a node. Returns `true` when edge geometry changes.
    pub fn report_node_size(&mut self, id: &str, size: Size) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|node| node.node.id == id) else {
            return false;
        };
        if node.measured == Some(size) {
            return false;
        }
        node.measured = Some(size);
        true
    }

    pub fn select_node(&mut self, id: &str) {
        if self.node(id).is_some() {
            self.set_selection(Selection::Node(id.to_string()));
        }
    }

    /// Selects the first edge carrying display id `id`.
    pub fn select_edge(&mut self, id: &str) {
        if let Some(edge) = self.edges.iter().find(|edge| edge.id() == id) {
            self.set_selection(Selection::Edge(edge.clone()));
        }
    }

    pub fn select_dependency(&mut self, source: &str, target: &str) {
        if let Some(edge) = self
            .edges
            .iter()
            .find(|edge| edge.source == source && edge.target == target)
        {
            self.set_selection(Selection::Edge(edge.clone()));
        }
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(Selection::None);
    }

    /// The "view" action. Only kinds with a detail page emit a request.
    pub fn request_view(&mut self, id: &str) -> bool {
        let viewable = self
            .node(id)
            .is_some_and(|node| node.node.kind.is_viewable());
        if viewable {
            self.events.push(CanvasEvent::ViewRequested { id: id.to_string() });
        }
        viewable
    }

    fn click_node(&mut self, id: &str) {
        self.select_node(id);
        self.events.push(CanvasEvent::NodeClicked { id: id.to_string() });
    }

    fn set_selection(&mut self, selection: Selection) {
        if self.selection == selection {
            return;
        }
        self.selection = selection.clone();
        self.events.push(CanvasEvent::SelectionChanged { selection });
    }

    fn apply_drag(&mut self, id: &str, grab: Point, screen: Point) {
        let diagram = self.viewport.screen_to_diagram(screen);
        let grid = self.config.grid_size;
        let position = Point::new(
            snap_to_grid(diagram.x - grab.x, grid),
            snap_to_grid(diagram.y - grab.y, grid),
        );
        if let Some(node) = self.nodes.iter_mut().find(|node| node.node.id == id) {
            node.position = position;
        }
    }

    fn fallback_size(&self) -> Size {
        Size::new(self.layout_config.node_width, self.layout_config.node_height)
    }

    pub fn node_box(&self, id: &str) -> Option<NodeBox> {
        self.node(id).map(|node| self.box_of(node))
    }

    fn box_of(&self, node: &CanvasNode) -> NodeBox {
        NodeBox::new(node.position, node.measured.unwrap_or_else(|| self.fallback_size()))
    }

    /// Topmost node under a diagram-space point; later nodes paint above earlier ones.
    fn node_at(&self, point: Point) -> Option<&CanvasNode> {
        self.nodes
            .iter()
            .rev()
            .find(|node| self.box_of(node).contains(point))
    }

    fn edge_at(&self, point: Point) -> Option<Dependency> {
        self.edges()
            .into_iter()
            .rev()
            .find(|edge| edge.path.hit_test(point, self.config.hit_stroke_width))
            .map(|edge| Dependency::new(edge.source, edge.target))
    }

    /// Edge geometry against the current node boxes. Edges whose endpoints are missing are
    /// skipped.
    pub fn edges(&self) -> Vec<RenderedEdge> {
        let boxes: HashMap<&str, NodeBox> = self
            .nodes
            .iter()
            .map(|node| (node.node.id.as_str(), self.box_of(node)))
            .collect();
        let selected = self.selection.edge();
        self.edges
            .iter()
            .filter_map(|edge| {
                let source = boxes.get(edge.source.as_str())?;
                let target = boxes.get(edge.target.as_str())?;
                let anchors = edge_anchors(source, target, self.config.anchor_tolerance);
                let id = edge.id();
                Some(RenderedEdge {
                    selected: selected == Some(edge),
                    path: EdgePath::shortened(&anchors, self.config.arrowhead_offset),
                    anchors,
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    id,
                })
            })
            .collect()
    }

    /// Whether `id` is an endpoint of the selected edge.
    pub fn is_highlighted(&self, id: &str) -> bool {
        self.selection
            .edge()
            .is_some_and(|edge| edge.source == id || edge.target == id)
    }

    pub fn node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|node| node.node.id == id)
    }

    pub fn nodes(&self) -> &[CanvasNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    pub fn content_size(&self) -> Size {
        self.content
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> &PointerState {
        &self.pointer
    }

    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntityKind;

    fn canvas_with(ids: &[(&str, EntityKind)], edges: &[(&str, &str)]) -> DiagramCanvas {
        let mut canvas = DiagramCanvas::new(&Config::default(), Size::new(1200.0, 800.0));
        canvas.set_graph(DependencyGraph::new(
            ids.iter()
                .map(|(id, kind)| DiagramNode::new(*id, kind.clone()))
                .collect(),
            edges
                .iter()
                .map(|(from, to)| Dependency::new(*from, *to))
                .collect(),
        ));
        canvas.take_events();
        canvas
    }

    fn pair() -> DiagramCanvas {
        canvas_with(
            &[("a", EntityKind::Component), ("b", EntityKind::Resource)],
            &[("a", "b")],
        )
    }

    fn screen_center_of(canvas: &DiagramCanvas, id: &str) -> Point {
        let center = canvas.node_box(id).map(|b| b.center()).unwrap_or(Point::ZERO);
        canvas.viewport().diagram_to_screen(center)
    }

    #[test]
    fn narrow_viewport_defaults_to_left_right() {
        let canvas = DiagramCanvas::new(&Config::default(), Size::new(500.0, 800.0));
        assert_eq!(canvas.direction(), Direction::LeftRight);
        let canvas = DiagramCanvas::new(&Config::default(), Size::new(1024.0, 800.0));
        assert_eq!(canvas.direction(), Direction::TopBottom);
    }

    #[test]
    fn new_layout_fits_and_centers() {
        let canvas = pair();
        let viewport = canvas.viewport();
        assert_eq!(viewport.scale, 1.0);
        let content = canvas.content_size();
        let center = viewport.diagram_to_screen(Point::new(content.width / 2.0, content.height / 2.0));
        assert!((center.x - 600.0).abs() < 1e-3 && (center.y - 400.0).abs() < 1e-3);
    }

    #[test]
    fn click_selects_node_and_emits_once() {
        let mut canvas = pair();
        let before = canvas.node("a").map(|node| node.position);
        let point = screen_center_of(&canvas, "a");
        canvas.pointer_down(point, PointerButton::Primary);
        assert_eq!(canvas.state().name(), "dragging-node");
        canvas.pointer_up(point);
        let events = canvas.take_events();
        let clicks = events
            .iter()
            .filter(|event| matches!(event, CanvasEvent::NodeClicked { .. }))
            .count();
        assert_eq!(clicks, 1);
        assert_eq!(canvas.selection().node_id(), Some("a"));
        assert_eq!(canvas.node("a").map(|node| node.position), before);
        assert!(canvas.state().is_idle());
    }

    #[test]
    fn secondary_button_is_ignored() {
        let mut canvas = pair();
        canvas.pointer_down(screen_center_of(&canvas, "a"), PointerButton::Secondary);
        assert!(canvas.state().is_idle());
    }

    #[test]
    fn selecting_edge_clears_node_and_highlights_endpoints() {
        let mut canvas = pair();
        canvas.select_node("a");
        canvas.select_edge("e-a-b");
        assert_eq!(canvas.selection(), &Selection::Edge(Dependency::new("a", "b")));
        assert!(canvas.is_highlighted("a") && canvas.is_highlighted("b"));
        canvas.select_node("b");
        assert_eq!(canvas.selection().edge(), None);
        assert!(!canvas.is_highlighted("a"));
    }

    #[test]
    fn background_click_clears_selection() {
        let mut canvas = pair();
        canvas.select_node("a");
        let corner = Point::new(2.0, 2.0);
        canvas.pointer_down(corner, PointerButton::Primary);
        assert_eq!(canvas.state().name(), "panning");
        canvas.pointer_up(corner);
        assert!(canvas.selection().is_none());
    }

    #[test]
    fn panning_follows_pointer_and_keeps_selection() {
        let mut canvas = pair();
        canvas.select_node("a");
        let pan = canvas.viewport().pan;
        canvas.pointer_down(Point::new(2.0, 2.0), PointerButton::Primary);
        canvas.pointer_move(Point::new(32.0, -8.0));
        canvas.pointer_up(Point::new(32.0, -8.0));
        assert_eq!(canvas.viewport().pan, Point::new(pan.x + 30.0, pan.y - 10.0));
        assert_eq!(canvas.selection().node_id(), Some("a"));
    }

    #[test]
    fn wheel_zoom_clamps_to_range() {
        let mut canvas = pair();
        for _ in 0..100 {
            canvas.wheel(Point::new(10.0, 10.0), 1.0);
        }
        assert!((canvas.viewport().scale - 0.1).abs() < 1e-6);
        for _ in 0..100 {
            canvas.wheel(Point::new(10.0, 10.0), -1.0);
        }
        assert!((canvas.viewport().scale - 5.0).abs() < 1e-6);
    }

    #[test]
    fn zoom_buttons_anchor_on_viewport_center() {
        let mut canvas = pair();
        let center = Point::new(600.0, 400.0);
        let before = canvas.viewport().screen_to_diagram(center);
        canvas.zoom_in();
        assert!((canvas.viewport().scale - 1.2).abs() < 1e-6);
        let after = canvas.viewport().screen_to_diagram(center);
        assert!((before.x - after.x).abs() < 1e-3 && (before.y - after.y).abs() < 1e-3);
    }

    #[test]
    fn view_only_for_components() {
        let mut canvas = pair();
        assert!(canvas.request_view("a"));
        assert!(!canvas.request_view("b"));
        assert!(!canvas.request_view("missing"));
        assert_eq!(
            canvas.take_events(),
            vec![CanvasEvent::ViewRequested { id: "a".into() }]
        );
    }

    #[test]
    fn measured_size_moves_edge_anchors() {
        let mut canvas = pair();
        let before = canvas.edges()[0].anchors.source;
        assert!(canvas.report_node_size("a", Size::new(224.0, 61.0)));
        assert!(!canvas.report_node_size("a", Size::new(224.0, 61.0)));
        let after = canvas.edges()[0].anchors.source;
        assert_ne!(before, after);
    }

    #[test]
    fn toggling_direction_relayouts_and_resets_drag() {
        let mut canvas = pair();
        canvas.pointer_down(screen_center_of(&canvas, "a"), PointerButton::Primary);
        canvas.toggle_direction();
        assert!(canvas.state().is_idle());
        assert_eq!(canvas.direction(), Direction::LeftRight);
        assert!(canvas
            .take_events()
            .contains(&CanvasEvent::DirectionChanged { direction: Direction::LeftRight }));
        let a = canvas.node("a").map(|node| node.position.x).unwrap_or(0.0);
        let b = canvas.node("b").map(|node| node.position.x).unwrap_or(0.0);
        assert!(b > a);
    }

    #[test]
    fn same_graph_keeps_dragged_positions() {
        let mut canvas = pair();
        let graph = DependencyGraph::new(
            vec![
                DiagramNode::new("a", EntityKind::Component),
                DiagramNode::new("b", EntityKind::Resource),
            ],
            vec![Dependency::new("a", "b")],
        );
        let start = screen_center_of(&canvas, "a");
        canvas.pointer_down(start, PointerButton::Primary);
        canvas.pointer_move(Point::new(start.x + 200.0, start.y));
        canvas.pointer_up(Point::new(start.x + 200.0, start.y));
        let dragged = canvas.node("a").map(|node| node.position);
        canvas.set_graph(graph);
        assert_eq!(canvas.node("a").map(|node| node.position), dragged);
    }

    #[test]
    fn resizing_across_breakpoint_switches_direction() {
        let mut canvas = pair();
        canvas.set_viewport_size(Size::new(1000.0, 800.0));
        assert_eq!(canvas.direction(), Direction::TopBottom);

        canvas.set_viewport_size(Size::new(600.0, 800.0));
        assert_eq!(canvas.direction(), Direction::LeftRight);
        assert!(canvas
            .take_events()
            .contains(&CanvasEvent::DirectionChanged { direction: Direction::LeftRight }));

        canvas.toggle_direction();
        canvas.set_viewport_size(Size::new(500.0, 800.0));
        assert_eq!(canvas.direction(), Direction::TopBottom);

        canvas.set_viewport_size(Size::new(900.0, 800.0));
        assert_eq!(canvas.direction(), Direction::TopBottom);
    }

    #[test]
    fn empty_graph_resets_viewport() {
        let mut canvas = pair();
        canvas.wheel(Point::new(0.0, 0.0), -1.0);
        canvas.set_graph(DependencyGraph::default());
        assert!(canvas.is_empty());
        assert_eq!(canvas.viewport(), Viewport::default());
    }
}
