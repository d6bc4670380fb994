use serde::Serialize;

use crate::layout::{Point, Size};

/// Screen = diagram * scale + pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub scale: f32,
    pub pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan: Point::ZERO,
        }
    }
}

impl Viewport {
    pub fn screen_to_diagram(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan.x) / self.scale,
            (screen.y - self.pan.y) / self.scale,
        )
    }

    pub fn diagram_to_screen(&self, diagram: Point) -> Point {
        Point::new(
            diagram.x * self.scale + self.pan.x,
            diagram.y * self.scale + self.pan.y,
        )
    }

    /// Rescales to `scale` keeping the diagram point under `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: Point, scale: f32) {
        if scale <= 0.0 || !scale.is_finite() {
            return;
        }
        let ratio = scale / self.scale;
        self.pan = Point::new(
            anchor.x - (anchor.x - self.pan.x) * ratio,
            anchor.y - (anchor.y - self.pan.y) * ratio,
        );
        self.scale = scale;
    }

    /// Fits `content` into `viewport` with `padding` to spare, never magnifying beyond 1,
    /// and centers it.
    pub fn fit(content: Size, viewport: Size, padding: f32, min_scale: f32) -> Self {
        if content.width <= 0.0 || content.height <= 0.0 {
            return Self::default();
        }
        let scale_x = (viewport.width - padding) / content.width;
        let scale_y = (viewport.height - padding) / content.height;
        let scale = scale_x.min(scale_y).min(1.0).max(min_scale);
        Self {
            scale,
            pan: Point::new(
                viewport.width / 2.0 - content.width / 2.0 * scale,
                viewport.height / 2.0 - content.height / 2.0 * scale,
            ),
        }
    }

    /// SVG transform attribute for the content group.
    pub fn transform(&self) -> String {
        format!(
            "translate({:.2} {:.2}) scale({:.4})",
            self.pan.x, self.pan.y, self.scale
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport {
            scale: 0.8,
            pan: Point::new(40.0, -12.0),
        };
        let anchor = Point::new(300.0, 200.0);
        let before = viewport.screen_to_diagram(anchor);
        viewport.zoom_at(anchor, 1.7);
        let after = viewport.diagram_to_screen(before);
        assert!(close(after.x, anchor.x) && close(after.y, anchor.y));
    }

    #[test]
    fn fit_centers_and_never_magnifies() {
        let viewport = Viewport::fit(Size::new(200.0, 100.0), Size::new(1200.0, 800.0), 80.0, 0.1);
        assert_eq!(viewport.scale, 1.0);
        assert_eq!(viewport.pan, Point::new(500.0, 350.0));
    }

    #[test]
    fn fit_shrinks_large_content() {
        let viewport = Viewport::fit(Size::new(2240.0, 500.0), Size::new(1200.0, 800.0), 80.0, 0.1);
        assert!(close(viewport.scale, 0.5));
        assert!(close(viewport.pan.x, 600.0 - 560.0));
    }

    #[test]
    fn fit_of_empty_content_is_identity() {
        let viewport = Viewport::fit(Size::default(), Size::new(1200.0, 800.0), 80.0, 0.1);
        assert_eq!(viewport, Viewport::default());
    }
}
