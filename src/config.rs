use crate::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub horizontal_gap: f32,
    pub vertical_gap: f32,
    /// Down+up barycenter sweeps per layout.
    pub order_passes: usize,
    pub component_gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 230.0,
            node_height: 110.0,
            horizontal_gap: 80.0,
            vertical_gap: 60.0,
            order_passes: 8,
            component_gap: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub wheel_zoom_factor: f32,
    pub button_zoom_factor: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub grid_size: f32,
    pub fit_padding: f32,
    pub anchor_tolerance: f32,
    pub arrowhead_offset: f32,
    pub hit_stroke_width: f32,
    /// Background grid spacing at scale 1.
    pub background_grid: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            wheel_zoom_factor: 1.1,
            button_zoom_factor: 1.2,
            min_scale: 0.1,
            max_scale: 5.0,
            grid_size: 10.0,
            fit_padding: 80.0,
            anchor_tolerance: 1.5,
            arrowhead_offset: 15.0,
            hit_stroke_width: 10.0,
            background_grid: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub width: f32,
    pub header_height: f32,
    pub header_padding_x: f32,
    pub icon_size: f32,
    pub title_font_size: f32,
    pub body_padding: f32,
    pub chip_height: f32,
    pub chip_gap: f32,
    pub chip_padding_x: f32,
    pub chip_font_size: f32,
    pub corner_radius: f32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            width: 224.0,
            header_height: 37.0,
            header_padding_x: 12.0,
            icon_size: 16.0,
            title_font_size: 14.0,
            body_padding: 12.0,
            chip_height: 20.0,
            chip_gap: 8.0,
            chip_padding_x: 10.0,
            chip_font_size: 12.0,
            corner_radius: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub show_grid: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#F9FAFB".to_string(),
            show_grid: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub canvas: CanvasConfig,
    pub node: NodeConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::light();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            canvas: CanvasConfig::default(),
            node: NodeConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    layout: Option<LayoutConfigFile>,
    canvas: Option<CanvasConfigFile>,
    node: Option<NodeConfigFile>,
    render: Option<RenderConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    horizontal_gap: Option<f32>,
    vertical_gap: Option<f32>,
    order_passes: Option<usize>,
    component_gap: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanvasConfigFile {
    wheel_zoom_factor: Option<f32>,
    button_zoom_factor: Option<f32>,
    min_scale: Option<f32>,
    max_scale: Option<f32>,
    grid_size: Option<f32>,
    fit_padding: Option<f32>,
    anchor_tolerance: Option<f32>,
    arrowhead_offset: Option<f32>,
    hit_stroke_width: Option<f32>,
    background_grid: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeConfigFile {
    width: Option<f32>,
    title_font_size: Option<f32>,
    chip_font_size: Option<f32>,
    chip_height: Option<f32>,
    chip_gap: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    background: Option<String>,
    show_grid: Option<bool>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config {}", path.display()))
}

/// Overlays a JSON (or JSON5) config document onto the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents).map_err(|_| json_err)?,
    };

    let mut config = Config::default();
    if let Some(name) = parsed.theme.as_deref() {
        let theme = Theme::by_name(name).with_context(|| format!("unknown theme {name:?}"))?;
        config.render.background = theme.background.clone();
        config.theme = theme;
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_width {
            config.layout.node_width = v;
        }
        if let Some(v) = layout.node_height {
            config.layout.node_height = v;
        }
        if let Some(v) = layout.horizontal_gap {
            config.layout.horizontal_gap = v;
        }
        if let Some(v) = layout.vertical_gap {
            config.layout.vertical_gap = v;
        }
        if let Some(v) = layout.order_passes {
            config.layout.order_passes = v;
        }
        if let Some(v) = layout.component_gap {
            config.layout.component_gap = v;
        }
    }

    if let Some(canvas) = parsed.canvas {
        if let Some(v) = canvas.wheel_zoom_factor {
            config.canvas.wheel_zoom_factor = v;
        }
        if let Some(v) = canvas.button_zoom_factor {
            config.canvas.button_zoom_factor = v;
        }
        if let Some(v) = canvas.min_scale {
            config.canvas.min_scale = v;
        }
        if let Some(v) = canvas.max_scale {
            config.canvas.max_scale = v;
        }
        if let Some(v) = canvas.grid_size {
            config.canvas.grid_size = v;
        }
        if let Some(v) = canvas.fit_padding {
            config.canvas.fit_padding = v;
        }
        if let Some(v) = canvas.anchor_tolerance {
            config.canvas.anchor_tolerance = v;
        }
        if let Some(v) = canvas.arrowhead_offset {
            config.canvas.arrowhead_offset = v;
        }
        if let Some(v) = canvas.hit_stroke_width {
            config.canvas.hit_stroke_width = v;
        }
        if let Some(v) = canvas.background_grid {
            config.canvas.background_grid = v;
        }
    }

    if let Some(node) = parsed.node {
        if let Some(v) = node.width {
            config.node.width = v;
        }
        if let Some(v) = node.title_font_size {
            config.node.title_font_size = v;
        }
        if let Some(v) = node.chip_font_size {
            config.node.chip_font_size = v;
        }
        if let Some(v) = node.chip_height {
            config.node.chip_height = v;
        }
        if let Some(v) = node.chip_gap {
            config.node.chip_gap = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
        if let Some(v) = render.show_grid {
            config.render.show_grid = v;
        }
    }

    if config.canvas.min_scale <= 0.0 || config.canvas.min_scale > config.canvas.max_scale {
        anyhow::bail!(
            "scale range [{}, {}] is invalid",
            config.canvas.min_scale,
            config.canvas.max_scale
        );
    }

    Ok(config)
}
