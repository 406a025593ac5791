//! Labels and markers queued for the overlay pass.

use crate::camera::ViewParams;
use crate::color::Color;
use glam::Vec3;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    Center,
    #[default]
    Bottom,
    Top,
}

/// Placement options for an annotation.
///
/// Defaults to left/bottom alignment with `size` 0, meaning the font's own
/// line height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnnotationStyle {
    pub halign: HorizontalAlignment,
    pub valign: VerticalAlignment,
    /// Size override in pixels, `0.0` to use the default.
    pub size: f32,
    /// Extra horizontal gap in pixels between the anchor and a left or right
    /// aligned label, such as the apparent radius of a planet's disc.
    pub clearance: f32,
}

impl AnnotationStyle {
    pub fn with_halign(mut self, halign: HorizontalAlignment) -> Self {
        self.halign = halign;
        self
    }

    pub fn with_valign(mut self, valign: VerticalAlignment) -> Self {
        self.valign = valign;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_clearance(mut self, pixels: f32) -> Self {
        self.clearance = pixels.max(0.0);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerSymbol {
    Diamond,
    Triangle,
    Square,
    FilledSquare,
    Plus,
    X,
    LeftArrow,
    RightArrow,
    UpArrow,
    DownArrow,
    Circle,
    Disk,
    Crosshair,
}

/// Symbol drawn at an annotation's anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub symbol: MarkerSymbol,
    /// Size in pixels.
    pub size: f32,
}

impl Marker {
    pub fn new(symbol: MarkerSymbol, size: f32) -> Self {
        Self { symbol, size }
    }
}

/// A label and/or marker anchored at a camera space position.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub label: String,
    pub marker: Option<Marker>,
    pub color: Color,
    /// Camera space anchor.
    pub position: Vec3,
    pub style: AnnotationStyle,
}

impl Annotation {
    pub fn label(text: impl Into<String>, position: Vec3, color: Color) -> Self {
        Self {
            label: text.into(),
            marker: None,
            color,
            position,
            style: AnnotationStyle::default(),
        }
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.style = style;
        self
    }

    /// Distance along the view direction.
    pub fn depth(&self) -> f32 {
        -self.position.z
    }

    pub fn marker_size(&self) -> f32 {
        self.marker.map_or(0.0, |m| m.size)
    }
}

/// Which pool an annotation goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationLayer {
    /// Drawn after everything else.
    Foreground,
    /// Drawn before any object.
    Background,
    /// Drawn interleaved with objects, ordered by depth.
    DepthSorted,
}

/// The three annotation pools of a frame.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    foreground: Vec<Annotation>,
    background: Vec<Annotation>,
    depth_sorted: Vec<Annotation>,
    object_annotations: Vec<Annotation>,
    collecting_objects: bool,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, layer: AnnotationLayer, annotation: Annotation) {
        match layer {
            AnnotationLayer::Foreground => self.foreground.push(annotation),
            AnnotationLayer::Background => self.background.push(annotation),
            AnnotationLayer::DepthSorted => self.depth_sorted.push(annotation),
        }
    }

    pub fn foreground(&self) -> &[Annotation] {
        &self.foreground
    }

    pub fn background(&self) -> &[Annotation] {
        &self.background
    }

    pub fn depth_sorted(&self) -> &[Annotation] {
        &self.depth_sorted
    }

    pub fn len(&self) -> usize {
        self.foreground.len() + self.background.len() + self.depth_sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.foreground.clear();
        self.background.clear();
        self.depth_sorted.clear();
        self.object_annotations.clear();
        self.collecting_objects = false;
    }

    /// Start collecting annotations attached to the object being drawn.
    pub fn begin_object_annotations(&mut self) {
        self.object_annotations.clear();
        self.collecting_objects = true;
    }

    /// Queue an annotation for the current object. Ignored outside a
    /// `begin_object_annotations`/`end_object_annotations` pair.
    pub fn add_object_annotation(&mut self, annotation: Annotation) {
        if self.collecting_objects {
            self.object_annotations.push(annotation);
        }
    }

    /// Move the collected object annotations into the depth sorted pool.
    pub fn end_object_annotations(&mut self) {
        self.collecting_objects = false;
        self.depth_sorted.append(&mut self.object_annotations);
    }

    /// Order the depth sorted pool farthest first. Equal depths keep their
    /// insertion order.
    pub fn sort(&mut self) {
        self.depth_sorted
            .sort_by(|a, b| b.depth().total_cmp(&a.depth()));
    }

    /// Range of depth sorted annotations whose depth lies in
    /// `[near_z, far_z)`. The pool must be sorted.
    pub fn depth_range(&self, near_z: f32, far_z: f32) -> Range<usize> {
        let start = self.depth_sorted.partition_point(|a| a.depth() >= far_z);
        let end = self.depth_sorted.partition_point(|a| a.depth() >= near_z);
        start..end.max(start)
    }

    /// Drop markers that land on top of a nearer marker on screen.
    pub fn dedup_markers(&mut self, view: &ViewParams) {
        for pool in [
            &mut self.foreground,
            &mut self.background,
            &mut self.depth_sorted,
        ] {
            dedup_overlapping_markers(pool, view);
        }
    }
}

/// Remove annotations whose marker overlaps the marker of a nearer
/// annotation once projected. Annotations without markers are untouched.
pub fn dedup_overlapping_markers(annotations: &mut Vec<Annotation>, view: &ViewParams) {
    let projected: Vec<Option<Vec3>> = annotations
        .iter()
        .map(|a| a.marker.and_then(|_| view.project(a.position)))
        .collect();

    let mut keep = vec![true; annotations.len()];
    for i in 0..annotations.len() {
        let Some(pi) = projected[i] else { continue };
        for j in (i + 1)..annotations.len() {
            if !keep[i] {
                break;
            }
            if !keep[j] {
                continue;
            }
            let Some(pj) = projected[j] else { continue };
            let reach = (annotations[i].marker_size() + annotations[j].marker_size()) / 2.0;
            if (pi.truncate() - pj.truncate()).length() < reach {
                if pi.z <= pj.z {
                    keep[j] = false;
                } else {
                    keep[i] = false;
                }
            }
        }
    }

    let mut flags = keep.into_iter();
    annotations.retain(|_| flags.next().unwrap_or(true));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn at(depth: f32) -> Annotation {
        Annotation::label(format!("{depth}"), Vec3::new(0.0, 0.0, -depth), Color::WHITE)
    }

    #[test]
    fn test_style_defaults() {
        let style = AnnotationStyle::default();
        assert_eq!(style.halign, HorizontalAlignment::Left);
        assert_eq!(style.valign, VerticalAlignment::Bottom);
        assert_eq!(style.size, 0.0);
    }

    #[test]
    fn test_sort_farther_first() {
        let mut set = AnnotationSet::new();
        set.add(AnnotationLayer::DepthSorted, at(10.0));
        set.add(AnnotationLayer::DepthSorted, at(100.0));
        set.add(AnnotationLayer::DepthSorted, at(50.0));
        set.sort();
        let depths: Vec<f32> = set.depth_sorted().iter().map(Annotation::depth).collect();
        assert_eq!(depths, vec![100.0, 50.0, 10.0]);
    }

    #[test]
    fn test_depth_range() {
        let mut set = AnnotationSet::new();
        for d in [1.0, 5.0, 10.0, 50.0, 100.0] {
            set.add(AnnotationLayer::DepthSorted, at(d));
        }
        set.sort();
        let range = set.depth_range(5.0, 50.0);
        let depths: Vec<f32> = set.depth_sorted()[range].iter().map(Annotation::depth).collect();
        assert_eq!(depths, vec![10.0, 5.0]);
        assert!(set.depth_range(200.0, 300.0).is_empty());
    }

    #[test]
    fn test_object_annotations_only_inside_block() {
        let mut set = AnnotationSet::new();
        set.add_object_annotation(at(1.0));
        assert!(set.is_empty());

        set.begin_object_annotations();
        set.add_object_annotation(at(2.0));
        set.add_object_annotation(at(3.0));
        set.end_object_annotations();
        assert_eq!(set.depth_sorted().len(), 2);

        set.add_object_annotation(at(4.0));
        assert_eq!(set.depth_sorted().len(), 2);
    }

    #[test]
    fn test_dedup_keeps_nearer_marker() {
        let view = ViewParams::new(FRAC_PI_2, 800, 600);
        let marker = Marker::new(MarkerSymbol::Diamond, 10.0);
        let mut list = vec![
            at(100.0).with_marker(marker),
            at(20.0).with_marker(marker),
            Annotation::label("off", Vec3::new(50.0, 0.0, -100.0), Color::WHITE).with_marker(marker),
            at(5.0),
        ];
        dedup_overlapping_markers(&mut list, &view);

        let depths: Vec<f32> = list.iter().map(Annotation::depth).collect();
        assert_eq!(depths, vec![20.0, 100.0, 5.0]);
        assert_eq!(list[1].label, "off");
    }
}
