pub mod canvas;
pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod geometry;
pub mod layout;
pub mod layout_dump;
pub mod node;
pub mod render;
pub mod text_metrics;
pub mod theme;

pub use canvas::{CanvasEvent, DiagramCanvas, PointerButton};
pub use catalog::{Catalog, CatalogError, DependencyGraph, TagFilter};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::Config;
pub use layout::{Direction, Layout, compute_layout};

use layout::Size;

/// What to draw from a catalog in one shot.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub config: Config,
    /// `None` picks the direction from the viewport width.
    pub direction: Option<Direction>,
    /// Allowed tags; `None` allows every tag in the catalog.
    pub tags: Option<Vec<String>>,
    /// Render this entity and its direct relations instead of the whole catalog.
    pub focus: Option<String>,
}

/// Parses a catalog document and renders it to SVG through a fresh canvas.
pub fn render_catalog(source: &str, options: &RenderOptions) -> anyhow::Result<String> {
    let catalog = Catalog::from_json(source)?;
    let mut canvas = build_canvas(&catalog, options)?;
    Ok(render::render_measured_svg(
        &mut canvas,
        &options.config.theme,
        &options.config,
    ))
}

/// Canvas for `catalog` laid out according to `options`.
pub fn build_canvas(catalog: &Catalog, options: &RenderOptions) -> Result<DiagramCanvas, CatalogError> {
    let render = &options.config.render;
    let mut canvas = DiagramCanvas::new(&options.config, Size::new(render.width, render.height));
    if let Some(direction) = options.direction {
        canvas.set_direction(direction);
    }
    match options.focus.as_deref() {
        Some(name) => canvas.set_focus_graph(catalog.focus_graph(name)?),
        None => {
            let filter = options
                .tags
                .as_ref()
                .map(|tags| TagFilter::new(tags.iter().cloned()))
                .unwrap_or_else(|| catalog.default_filter());
            canvas.set_graph(catalog.dependency_graph(&filter));
        }
    }
    canvas.take_events();
    Ok(canvas)
}
