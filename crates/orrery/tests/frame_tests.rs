//! Whole-frame rendering over a Sun/Earth/Moon scene with a mock device.

use glam::{DQuat, DVec3, Vec2, Vec3};
use orrery::prelude::*;
use orrery::render::{
    BodyMotion, FrameParent, MockDevice, RenderSettingsWatcher, Renderable, SceneQuery,
};
use orrery::LABEL_PIXEL_OFFSET;
use orrery::text::{MockRasterizer, TextError};
use orrery_core::math::astro::KM_PER_AU;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Entry(Renderable, usize),
    Orbit(Renderable, usize),
    Marker(Vec2),
}

type Log = Rc<RefCell<Vec<Event>>>;

struct Painter(Log);

impl ItemPainter for Painter {
    fn draw_entry(&mut self, entry: &RenderListEntry, partition: &DepthBufferPartition) {
        self.0
            .borrow_mut()
            .push(Event::Entry(entry.renderable, partition.index));
    }

    fn draw_orbit(&mut self, orbit: &OrbitPathListEntry, partition: &DepthBufferPartition) {
        self.0
            .borrow_mut()
            .push(Event::Orbit(orbit.renderable, partition.index));
    }
}

struct Markers(Log);

impl MarkerPainter for Markers {
    fn draw_marker(&mut self, _marker: &Marker, position: Vec2, _color: Color) {
        self.0.borrow_mut().push(Event::Marker(position));
    }
}

fn scene() -> StaticScene {
    let mut scene = StaticScene::new();
    let sun = scene.add_star(StarRecord::new("Sol", 696_000.0, 4.83), DVec3::ZERO);
    let earth = scene.add_body(
        FrameParent::Star(sun),
        BodyRecord::new("Earth", BodyClass::PLANET, 6_378.0).with_abs_magnitude(-3.9),
        BodyMotion::circular(KM_PER_AU, 365.25, 0.0),
    );
    scene.add_body(
        FrameParent::Body(earth),
        BodyRecord::new("Moon", BodyClass::MOON, 1_737.0).with_abs_magnitude(0.2),
        BodyMotion::circular(384_400.0, 27.3, 0.0),
    );
    scene
}

fn observer() -> Observer {
    Observer::new(DVec3::new(KM_PER_AU, 0.0, 1.0e6), DQuat::IDENTITY, 0.0)
}

fn renderer() -> (Arc<MockDevice>, Renderer) {
    orrery_core::logging::init();
    let device = Arc::new(MockDevice::new());
    let renderer = Renderer::new(device.clone(), ViewParams::new(45f64.to_radians(), 800, 600));
    (device, renderer)
}

fn render(renderer: &mut Renderer, scene: &dyn SceneQuery) -> (FrameStats, Vec<Event>) {
    let log = Log::default();
    let stats = renderer.render(
        scene,
        &observer(),
        &mut Painter(log.clone()),
        &mut Markers(log.clone()),
    );
    let events = log.borrow().clone();
    (stats, events)
}

fn marker_at(position: Vec3) -> Annotation {
    Annotation::label("", position, Color::WHITE).with_marker(Marker::new(MarkerSymbol::Diamond, 4.0))
}

#[test]
fn test_entries_drawn_back_to_front() {
    let (device, mut renderer) = renderer();
    let (stats, events) = render(&mut renderer, &scene());

    let partitions: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::Entry(_, p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(partitions.len(), stats.entries);
    assert_eq!(stats.entries, 2);
    assert!(partitions.windows(2).all(|w| w[0] <= w[1]));

    let depths: Vec<f32> = renderer
        .render_lists()
        .entries
        .iter()
        .map(|e| e.center_z)
        .collect();
    assert!(depths.windows(2).all(|w| w[0] >= w[1]));

    let mut drawn: Vec<usize> = partitions.clone();
    drawn.dedup();
    assert_eq!(device.count_depth_clears(), drawn.len());
    assert_eq!(stats.cleared_partitions, drawn.len());
}

/// Records the slice of every draw and how many depth clears preceded it.
struct ClearTracker {
    device: Arc<MockDevice>,
    draws: Vec<(&'static str, usize, usize)>,
}

impl ItemPainter for ClearTracker {
    fn draw_entry(&mut self, _entry: &RenderListEntry, partition: &DepthBufferPartition) {
        let clears = self.device.count_depth_clears();
        self.draws.push(("entry", partition.index, clears));
    }

    fn draw_orbit(&mut self, _orbit: &OrbitPathListEntry, partition: &DepthBufferPartition) {
        let clears = self.device.count_depth_clears();
        self.draws.push(("orbit", partition.index, clears));
    }
}

#[test]
fn test_orbit_in_empty_slice_gets_depth_clear() {
    // A distant star, a close one, and the close star's orbit lying in the
    // empty slice between them.
    let mut scene = StaticScene::new();
    scene.add_star(StarRecord::new("Far", 1.0e6, 4.83), DVec3::new(0.0, 0.0, -1.0e9));
    scene.add_star(
        StarRecord::new("Near", 10.0, 4.83).with_orbit(DVec3::new(0.0, 0.0, -1.0e5), 1.0e4),
        DVec3::new(0.0, 0.0, -100.0),
    );

    let (device, mut renderer) = renderer();
    renderer.set_render_flags(RenderFlags::DEFAULT | RenderFlags::SHOW_ORBITS);
    renderer.set_orbit_mask(BodyClass::DEFAULT_ORBIT_MASK | BodyClass::STELLAR);

    let mut tracker = ClearTracker {
        device: device.clone(),
        draws: Vec::new(),
    };
    let observer = Observer::new(DVec3::ZERO, DQuat::IDENTITY, 0.0);
    let stats = renderer.render(&scene, &observer, &mut tracker, &mut NoMarkers);

    assert_eq!(stats.entries, 2);
    assert_eq!(stats.orbits, 1);
    assert_eq!(stats.partitions, 3);
    assert_eq!(stats.occupied_partitions, 2);
    assert_eq!(
        tracker.draws,
        vec![("entry", 0, 1), ("orbit", 1, 2), ("entry", 2, 3)]
    );
    assert_eq!(device.count_depth_clears(), 3);
    assert_eq!(stats.cleared_partitions, 3);
}

#[test]
fn test_orbits_drawn_when_enabled() {
    let (_, mut renderer) = renderer();
    let (_, events) = render(&mut renderer, &scene());
    assert!(!events.iter().any(|e| matches!(e, Event::Orbit(..))));

    renderer.set_render_flags(RenderFlags::DEFAULT | RenderFlags::SHOW_ORBITS);
    let (stats, events) = render(&mut renderer, &scene());
    assert_eq!(stats.orbits, 2);
    for orbit in &renderer.render_lists().orbits {
        assert!(
            events
                .iter()
                .any(|e| matches!(e, Event::Orbit(r, _) if *r == orbit.renderable))
        );
    }
}

#[test]
fn test_annotation_layers_ordered() {
    let (_, mut renderer) = renderer();
    let annotations = renderer.annotations_mut();
    annotations.add(AnnotationLayer::Foreground, marker_at(Vec3::new(-5.0, 5.0, -10.0)));
    annotations.add(AnnotationLayer::Background, marker_at(Vec3::new(5.0, -5.0, -10.0)));
    annotations.add(AnnotationLayer::DepthSorted, marker_at(Vec3::new(0.0, 0.0, -1.0e12)));
    annotations.add(AnnotationLayer::DepthSorted, marker_at(Vec3::new(0.5, 0.0, -1.0)));

    let (stats, events) = render(&mut renderer, &scene());
    assert_eq!(stats.annotations, 4);

    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            Event::Entry(..) => "entry",
            Event::Orbit(..) => "orbit",
            Event::Marker(_) => "marker",
        })
        .collect();
    // Background, then the far sorted marker, the objects, the near sorted
    // marker and finally the foreground.
    assert_eq!(
        kinds,
        vec!["marker", "marker", "entry", "entry", "marker", "marker"]
    );
    assert_eq!(events[1], Event::Marker(Vec2::new(400.0, 300.0)));

    // The pools are consumed by the frame.
    assert!(renderer.annotations_mut().is_empty());
}

#[test]
fn test_labels_drawn_with_font() {
    let (device, mut renderer) = renderer();
    let font = TextureFont::new(Box::new(MockRasterizer::new()), device.clone())
        .unwrap()
        .into_shared();
    renderer.set_label_font(Some(font));
    renderer.set_label_flags(LabelFlags::PLANET);

    let (stats, _) = render(&mut renderer, &scene());
    assert_eq!(stats.labels, 1);
    assert_eq!(device.count_draws(), 1);

    let (vertices, _) = &device.draws()[0];
    assert_eq!(vertices.len(), "Earth".len() * 4);

    // Nothing is left bound for the next user of the device.
    assert_eq!(device.bound_texture(0), None);
    assert_eq!(device.current_program(), None);
}

#[test]
fn test_label_clears_planet_disc() {
    let (device, mut renderer) = renderer();
    let font = TextureFont::new(Box::new(MockRasterizer::new()), device.clone())
        .unwrap()
        .into_shared();
    renderer.set_label_font(Some(font));
    renderer.set_label_flags(LabelFlags::PLANET);
    render(&mut renderer, &scene());

    let label = &renderer.render_lists().labels[0];
    assert_eq!(label.name, "Earth");
    assert!(label.disc_size >= 1.0);

    let anchor = renderer.view().project(label.position).unwrap().x.floor();
    let expected = anchor + (LABEL_PIXEL_OFFSET + label.disc_size as i32) as f32;
    let (vertices, _) = &device.draws()[0];
    assert_eq!(vertices[0].position[0], expected);
}

#[test]
fn test_labels_skipped_without_font() {
    let (device, mut renderer) = renderer();
    renderer.set_label_flags(LabelFlags::PLANET);
    let (stats, _) = render(&mut renderer, &scene());
    assert_eq!(stats.labels, 1);
    assert_eq!(device.count_draws(), 0);
}

#[test]
fn test_label_font_uses_screen_dpi() {
    let (_, mut renderer) = renderer();
    assert_eq!(renderer.font_options().dpi, 96);
    renderer.set_screen_dpi(144);
    assert_eq!(renderer.font_options().dpi, 144);
    assert_eq!(renderer.font_options().pixel_size(), 24.0);

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("labels.ttf");
    let err = renderer
        .load_label_font(&format!("{},12", missing.display()))
        .err().unwrap();
    assert!(matches!(err, TextError::FontFileNotFound(path) if path == missing));
}

#[test]
fn test_empty_scene() {
    let (device, mut renderer) = renderer();
    let (stats, events) = render(&mut renderer, &StaticScene::new());
    assert_eq!(stats, FrameStats::default());
    assert!(events.is_empty());
    assert_eq!(device.count_depth_clears(), 0);
    assert_eq!(device.count_draws(), 0);
}

#[test]
fn test_settings_watchers() {
    let (_, mut renderer) = renderer();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let watcher: Arc<dyn RenderSettingsWatcher> = Arc::new(move |_: &RenderSettings| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let handle = renderer.add_watcher(watcher);

    renderer.set_faintest_magnitude(8.0);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // Setting the same value again is not a change.
    renderer.set_faintest_magnitude(8.0);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    renderer.set_render_flags(RenderFlags::DEFAULT | RenderFlags::SHOW_ORBITS);
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    assert!(renderer.remove_watcher(handle));
    renderer.set_screen_dpi(144);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(renderer.settings().screen_dpi, 144);
}
