use catalog_diagram::config::{Config, parse_config};
use catalog_diagram::layout::{Direction, Point, Size};
use catalog_diagram::layout_dump::LayoutDump;
use catalog_diagram::render::render_measured_svg;
use catalog_diagram::theme::Theme;
use catalog_diagram::{
    Catalog, DiagramCanvas, PointerButton, RenderOptions, TagFilter, build_canvas, render_catalog,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    direction: Option<String>,
    tags: Option<Vec<String>>,
    focus: Option<String>,
    /// Same shape as the CLI config file.
    config: Option<serde_json::Value>,
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_options(options_json: Option<String>) -> Result<CatalogRenderOptions, JsValue> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(to_js),
        None => Ok(CatalogRenderOptions::default()),
    }
}

fn build_render_options(options: CatalogRenderOptions) -> Result<RenderOptions, JsValue> {
    let mut config = match options.config {
        Some(value) => parse_config(&value.to_string()).map_err(to_js)?,
        None => Config::default(),
    };
    if let Some(name) = options.theme.as_deref() {
        let theme =
            Theme::by_name(name).ok_or_else(|| to_js(format!("unknown theme '{name}'")))?;
        config.render.background = theme.background.clone();
        config.theme = theme;
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(width) = options.width {
        config.render.width = width;
    }
    if let Some(height) = options.height {
        config.render.height = height;
    }
    let direction = match options.direction.as_deref() {
        Some(token) => Some(
            Direction::from_token(token)
                .ok_or_else(|| to_js(format!("expected TB or LR, got '{token}'")))?,
        ),
        None => None,
    };
    Ok(RenderOptions {
        config,
        direction,
        tags: options.tags,
        focus: options.focus,
    })
}

/// One-shot render of a catalog document to SVG.
#[wasm_bindgen]
pub fn render_catalog_svg(catalog_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = build_render_options(parse_options(options_json)?)?;
    render_catalog(catalog_json, &options).map_err(to_js)
}

/// Stateful canvas for hosts that forward pointer, wheel and frame events.
#[wasm_bindgen]
pub struct CanvasHandle {
    catalog: Catalog,
    options: RenderOptions,
    canvas: DiagramCanvas,
}

#[wasm_bindgen]
impl CanvasHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: &str, options_json: Option<String>) -> Result<CanvasHandle, JsValue> {
        let options = build_render_options(parse_options(options_json)?)?;
        let catalog = Catalog::from_json(catalog_json).map_err(to_js)?;
        let canvas = build_canvas(&catalog, &options).map_err(to_js)?;
        Ok(Self {
            catalog,
            options,
            canvas,
        })
    }

    /// Current scene as SVG, after measuring nodes.
    pub fn render(&mut self) -> String {
        let config = &self.options.config;
        render_measured_svg(&mut self.canvas, &config.theme, config)
    }

    /// Drains pending canvas events as a JSON array.
    pub fn take_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.canvas.take_events()).map_err(to_js)
    }

    pub fn layout_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&LayoutDump::from_canvas(&self.canvas)).map_err(to_js)
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, button: i16) {
        if let Some(button) = PointerButton::from_index(button) {
            self.canvas.pointer_down(Point::new(x, y), button);
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.canvas.pointer_move(Point::new(x, y));
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.canvas.pointer_up(Point::new(x, y));
    }

    pub fn pointer_leave(&mut self) {
        self.canvas.pointer_leave();
    }

    pub fn wheel(&mut self, x: f32, y: f32, delta_y: f32) {
        self.canvas.wheel(Point::new(x, y), delta_y);
    }

    pub fn animation_frame(&mut self) {
        self.canvas.animation_frame();
    }

    pub fn zoom_in(&mut self) {
        self.canvas.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.canvas.zoom_out();
    }

    pub fn fit(&mut self) {
        self.canvas.fit_to_content();
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.canvas.set_viewport_size(Size::new(width, height));
    }

    pub fn toggle_direction(&mut self) {
        self.canvas.toggle_direction();
    }

    /// Returns `true` when edge anchors moved and the host should redraw.
    pub fn report_node_size(&mut self, id: &str, width: f32, height: f32) -> bool {
        self.canvas.report_node_size(id, Size::new(width, height))
    }

    pub fn select_node(&mut self, id: &str) {
        self.canvas.select_node(id);
    }

    pub fn select_edge(&mut self, id: &str) {
        self.canvas.select_edge(id);
    }

    /// Unambiguous edge selection by endpoints.
    pub fn select_dependency(&mut self, source: &str, target: &str) {
        self.canvas.select_dependency(source, target);
    }

    pub fn clear_selection(&mut self) {
        self.canvas.clear_selection();
    }

    pub fn request_view(&mut self, id: &str) -> bool {
        self.canvas.request_view(id)
    }

    /// Every tag in the catalog as a JSON array, for building a filter UI.
    pub fn all_tags(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.catalog.all_tags()).map_err(to_js)
    }

    /// Flips one tag in the active filter and re-lays out the whole catalog.
    pub fn toggle_tag(&mut self, tag: &str) {
        let mut filter = match &self.options.tags {
            Some(tags) => TagFilter::new(tags.iter().cloned()),
            None => self.catalog.default_filter(),
        };
        filter.toggle(tag);
        self.options.tags = Some(filter.tags().map(str::to_string).collect());
        self.options.focus = None;
        self.canvas.set_graph(self.catalog.dependency_graph(&filter));
    }

    /// Switches to the single-entity view of `name`.
    pub fn focus(&mut self, name: &str) -> Result<(), JsValue> {
        let graph = self.catalog.focus_graph(name).map_err(to_js)?;
        self.options.focus = Some(name.to_string());
        self.canvas.set_focus_graph(graph);
        Ok(())
    }
}
