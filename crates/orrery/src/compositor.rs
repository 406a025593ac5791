//! Drawing annotations: markers and text labels in window space.

use glam::{IVec2, Vec2};
use orrery_core::profiling::profile_function;
use orrery_render::{
    Annotation, AnnotationStyle, Color, GraphicsDevice, HorizontalAlignment, Marker, ViewParams,
    VerticalAlignment,
};
use orrery_text::SharedFont;
use std::sync::Arc;

/// Gap in pixels between a marker or anchor and its label.
pub const LABEL_PIXEL_OFFSET: i32 = 2;

/// Draws marker symbols. Text is handled by the compositor itself.
///
/// Painters may change any device state; the compositor rebinds its font
/// afterwards.
pub trait MarkerPainter {
    /// Draw `marker` centered on `position` (window pixels).
    fn draw_marker(&mut self, marker: &Marker, position: Vec2, color: Color);
}

/// Painter for callers that draw no markers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMarkers;

impl MarkerPainter for NoMarkers {
    fn draw_marker(&mut self, _marker: &Marker, _position: Vec2, _color: Color) {}
}

/// Offset of a label's pen position from its anchor.
///
/// `width` and `height` are the label's size in pixels, `descent` the font's
/// maximum descent. The style's clearance widens the gap on the aligned side.
pub fn label_offset(
    style: &AnnotationStyle,
    marker_size: f32,
    width: i32,
    height: i32,
    descent: i32,
) -> IVec2 {
    let clearance = style.clearance as i32;
    let x = match style.halign {
        HorizontalAlignment::Left if marker_size > 0.0 => {
            LABEL_PIXEL_OFFSET + (marker_size / 2.0) as i32 + clearance
        }
        HorizontalAlignment::Left => LABEL_PIXEL_OFFSET + clearance,
        HorizontalAlignment::Center => -width / 2,
        HorizontalAlignment::Right => -(width + LABEL_PIXEL_OFFSET + clearance),
    };
    let y = match style.valign {
        VerticalAlignment::Center => -height / 2,
        VerticalAlignment::Top => -height,
        VerticalAlignment::Bottom => descent,
    };
    IVec2::new(x, y)
}

/// Renders lists of annotations through a shared font.
pub struct AnnotationCompositor {
    device: Arc<dyn GraphicsDevice>,
    font: Option<SharedFont>,
    font_bound: bool,
    color: Option<Color>,
}

impl AnnotationCompositor {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            font: None,
            font_bound: false,
            color: None,
        }
    }

    pub fn set_font(&mut self, font: Option<SharedFont>) {
        self.font = font;
    }

    pub fn font(&self) -> Option<&SharedFont> {
        self.font.as_ref()
    }

    /// Draw `annotations` in order. Device state is unbound on return.
    pub fn render(
        &mut self,
        annotations: &[Annotation],
        view: &ViewParams,
        markers: &mut dyn MarkerPainter,
    ) {
        if annotations.is_empty() {
            return;
        }
        profile_function!();

        for annotation in annotations {
            self.draw(annotation, view, markers);
        }
        self.release_font();
    }

    fn draw(&mut self, annotation: &Annotation, view: &ViewParams, markers: &mut dyn MarkerPainter) {
        let Some(screen) = view.project(annotation.position) else {
            tracing::trace!("Annotation '{}' is behind the camera", annotation.label);
            return;
        };
        let anchor = Vec2::new(screen.x.floor(), screen.y.floor());

        if let Some(marker) = &annotation.marker {
            // Markers use their own program; queued text must go first.
            self.release_font();
            markers.draw_marker(marker, anchor, annotation.color);
        }

        if annotation.label.is_empty() {
            return;
        }
        let Some(font) = self.font.clone() else {
            return;
        };
        let mut font = font.lock();

        if !self.font_bound {
            font.bind();
            font.set_mvp_matrix(view.ortho_2d());
            self.font_bound = true;
            self.color = None;
        }
        if self.color != Some(annotation.color) {
            font.flush();
            self.device.set_vertex_color(annotation.color.to_array());
            self.color = Some(annotation.color);
        }

        let width = font.width(&annotation.label);
        let height = if annotation.style.size > 0.0 {
            annotation.style.size as i32
        } else {
            font.height()
        };
        let offset = label_offset(
            &annotation.style,
            annotation.marker_size(),
            width,
            height,
            font.max_descent(),
        );
        font.render_str(
            &annotation.label,
            anchor.x + offset.x as f32,
            anchor.y + offset.y as f32,
        );
    }

    fn release_font(&mut self) {
        if !self.font_bound {
            return;
        }
        if let Some(font) = &self.font {
            font.lock().unbind();
        }
        self.font_bound = false;
    }
}
