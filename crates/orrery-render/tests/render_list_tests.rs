//! Render list construction over a small Sun/Earth/Moon scene.
//!
//! The observer hovers one million kilometres above the Earth looking down
//! `-Z`, so the Earth and Moon are in view and the Sun is far off to the side.

use glam::{DQuat, DVec3};
use orrery_core::math::astro::KM_PER_AU;
use orrery_render::*;

struct Fixture {
    scene: StaticScene,
    sun: StarId,
    earth: BodyId,
    moon: BodyId,
}

fn fixture() -> Fixture {
    let mut scene = StaticScene::new();
    let sun = scene.add_star(StarRecord::new("Sol", 696_000.0, 4.83), DVec3::ZERO);
    let earth = scene.add_body(
        FrameParent::Star(sun),
        BodyRecord::new("Earth", BodyClass::PLANET, 6_378.0).with_abs_magnitude(-3.9),
        BodyMotion::circular(KM_PER_AU, 365.25, 0.0),
    );
    let moon = scene.add_body(
        FrameParent::Body(earth),
        BodyRecord::new("Moon", BodyClass::MOON, 1_737.0).with_abs_magnitude(0.2),
        BodyMotion::circular(384_400.0, 27.3, 0.0),
    );
    Fixture {
        scene,
        sun,
        earth,
        moon,
    }
}

fn observer() -> Observer {
    Observer::new(DVec3::new(KM_PER_AU, 0.0, 1.0e6), DQuat::IDENTITY, 0.0)
}

fn view() -> ViewParams {
    ViewParams::new(45f64.to_radians(), 800, 600)
}

fn build(settings: &RenderSettings, observer: &Observer, scene: &StaticScene) -> RenderLists {
    let builder = RenderListBuilder::new(settings, observer, &view());
    let mut lists = builder.build(scene);
    lists.sort();
    lists
}

fn has(lists: &RenderLists, renderable: Renderable) -> bool {
    lists.entries.iter().any(|e| e.renderable == renderable)
}

#[test]
fn test_visible_bodies_enter_render_list() {
    let f = fixture();
    let lists = build(&RenderSettings::default(), &observer(), &f.scene);

    assert!(has(&lists, Renderable::Body(f.earth)));
    assert!(has(&lists, Renderable::Body(f.moon)));
    // The Sun is far outside the field of view.
    assert!(!has(&lists, Renderable::Star(f.sun)));
}

#[test]
fn test_entries_sorted_farthest_first() {
    let f = fixture();
    let lists = build(&RenderSettings::default(), &observer(), &f.scene);
    for pair in lists.entries.windows(2) {
        assert!(pair[0].center_z >= pair[1].center_z);
    }
}

#[test]
fn test_no_orbits_without_flag() {
    let f = fixture();
    let settings = RenderSettings::default();
    assert!(!settings.render_flags.contains(RenderFlags::SHOW_ORBITS));
    let lists = build(&settings, &observer(), &f.scene);
    assert!(lists.orbits.is_empty());
}

#[test]
fn test_orbits_with_flag() {
    let f = fixture();
    let settings =
        RenderSettings::default().with_render_flags(RenderFlags::DEFAULT | RenderFlags::SHOW_ORBITS);
    let lists = build(&settings, &observer(), &f.scene);

    assert_eq!(lists.orbits.len(), 2);
    // The Moon's orbit is nearer and smaller, so its key is larger.
    assert_eq!(lists.orbits[0].renderable, Renderable::Body(f.moon));
    assert_eq!(lists.orbits[1].renderable, Renderable::Body(f.earth));
    assert!(lists.orbits[0].sort_key() >= lists.orbits[1].sort_key());
    assert_eq!(lists.orbits[1].color, BodyClass::PLANET.orbit_color());
}

#[test]
fn test_orbit_mask_filters_classes() {
    let f = fixture();
    let settings = RenderSettings::default()
        .with_render_flags(RenderFlags::DEFAULT | RenderFlags::SHOW_ORBITS)
        .with_orbit_mask(BodyClass::PLANET);
    let lists = build(&settings, &observer(), &f.scene);

    assert_eq!(lists.orbits.len(), 1);
    assert_eq!(lists.orbits[0].renderable, Renderable::Body(f.earth));
}

#[test]
fn test_fading_orbits_reduce_opacity() {
    let f = fixture();
    let settings = RenderSettings::default()
        .with_render_flags(
            RenderFlags::DEFAULT | RenderFlags::SHOW_ORBITS | RenderFlags::SHOW_FADING_ORBITS,
        )
        .with_min_orbit_size(500.0);
    let lists = build(&settings, &observer(), &f.scene);

    assert_eq!(lists.orbits.len(), 1);
    let opacity = lists.orbits[0].opacity;
    assert!(opacity > 0.0 && opacity < 1.0, "opacity {opacity}");
}

#[test]
fn test_hidden_class_is_skipped() {
    let f = fixture();
    let flags = RenderFlags::DEFAULT - RenderFlags::SHOW_MOONS;
    let lists = build(
        &RenderSettings::default().with_render_flags(flags),
        &observer(),
        &f.scene,
    );
    assert!(has(&lists, Renderable::Body(f.earth)));
    assert!(!has(&lists, Renderable::Body(f.moon)));
}

#[test]
fn test_label_candidates_follow_label_flags() {
    let f = fixture();
    let settings = RenderSettings::default().with_label_flags(LabelFlags::PLANET);
    let lists = build(&settings, &observer(), &f.scene);

    assert_eq!(lists.labels.len(), 1);
    assert_eq!(lists.labels[0].name, "Earth");
    assert_eq!(lists.labels[0].color, BodyClass::PLANET.label_color());
}

#[test]
fn test_faint_objects_dropped_unless_labeled() {
    let mut f = fixture();
    let rock = f.scene.add_body(
        FrameParent::Star(f.sun),
        BodyRecord::new("Rock", BodyClass::ASTEROID, 1.0).with_abs_magnitude(20.0),
        BodyMotion::Fixed(DVec3::new(KM_PER_AU, 0.0, -1.0e7)),
    );

    let lists = build(&RenderSettings::default(), &observer(), &f.scene);
    assert!(!has(&lists, Renderable::Body(rock)));

    let labeled = RenderSettings::default().with_label_flags(LabelFlags::ASTEROID);
    let lists = build(&labeled, &observer(), &f.scene);
    assert!(has(&lists, Renderable::Body(rock)));
    assert!(lists.labels.iter().any(|l| l.name == "Rock"));
}

#[test]
fn test_distant_system_is_pruned() {
    let f = fixture();
    let far_away = Observer::new(DVec3::new(0.0, 0.0, 1.0e11), DQuat::IDENTITY, 0.0);
    let settings =
        RenderSettings::default().with_render_flags(RenderFlags::DEFAULT | RenderFlags::SHOW_ORBITS);
    let lists = build(&settings, &far_away, &f.scene);

    // Only the star itself remains; the planetary system is below the
    // minimum feature size.
    assert_eq!(lists.entries.len(), 1);
    assert_eq!(lists.entries[0].renderable, Renderable::Star(f.sun));
    assert!(lists.orbits.is_empty());
}

#[test]
fn test_empty_scene_yields_empty_lists() {
    let scene = StaticScene::new();
    let lists = build(&RenderSettings::default(), &observer(), &scene);
    assert!(lists.is_empty());
}

#[test]
fn test_second_pass_computes_extents() {
    let f = fixture();
    let settings = RenderSettings::default();
    let obs = observer();
    let builder = RenderListBuilder::new(&settings, &obs, &view());
    let mut lists = builder.build(&f.scene);
    remove_invisible_items(&mut lists.entries, builder.frustum());

    assert!(!lists.entries.is_empty());
    for entry in &lists.entries {
        assert!(entry.near_z > 0.0);
        assert!(entry.near_z <= entry.center_z);
        assert!(entry.far_z >= entry.center_z);
    }
}
