//! Depth partitioning of render lists built from real scenes.

use glam::{DQuat, DVec3};
use orrery_core::math::astro::{KM_PER_AU, KM_PER_LY};
use orrery_render::*;

fn pipeline(
    scene: &StaticScene,
    observer: &Observer,
    config: DepthPartitionConfig,
) -> (Vec<RenderListEntry>, DepthPartitions) {
    let settings = RenderSettings::default();
    let view = ViewParams::new(45f64.to_radians(), 1024, 768);
    let builder = RenderListBuilder::new(&settings, observer, &view);
    let mut lists = builder.build(scene);
    remove_invisible_items(&mut lists.entries, builder.frustum());
    lists.sort();
    let partitions = DepthPartitioner::new(config).partition(&lists.entries);
    (lists.entries, partitions)
}

/// Bodies strung out along `-Z` at distances spanning many orders of
/// magnitude, plus a distant star behind them. Their parent star sits well
/// off to the side of the view.
fn deep_scene() -> StaticScene {
    let mut scene = StaticScene::new();
    let sun_position = DVec3::new(1.0e9, 0.0, 0.0);
    let sun = scene.add_star(StarRecord::new("Sol", 696_000.0, 4.83), sun_position);
    scene.add_star(
        StarRecord::new("Far", 1.0e6, -5.0),
        DVec3::new(0.0, 0.0, -4.0 * KM_PER_LY),
    );
    for (i, distance) in [1.0e2, 1.0e4, 1.0e6, 1.0e8, KM_PER_AU * 5.0].iter().enumerate() {
        scene.add_body(
            FrameParent::Star(sun),
            BodyRecord::new(format!("Body {i}"), BodyClass::PLANET, distance / 50.0),
            BodyMotion::Fixed(DVec3::new(0.0, 0.0, -distance) - sun_position),
        );
    }
    scene
}

fn observer() -> Observer {
    Observer::new(DVec3::ZERO, DQuat::IDENTITY, 0.0)
}

#[test]
fn test_every_entry_in_exactly_one_partition() {
    let scene = deep_scene();
    let (entries, parts) = pipeline(&scene, &observer(), DepthPartitionConfig::default());

    assert!(entries.len() >= 6);
    for (i, entry) in entries.iter().enumerate() {
        let p = parts.partition_of(i).expect("unassigned entry");
        assert!(parts.partitions()[p].contains(entry.center_z), "entry {i} not in slice {p}");
    }
    let total: usize = (0..parts.len()).map(|p| parts.entries_in(p).count()).sum();
    assert_eq!(total, entries.len());
}

#[test]
fn test_partitions_descend_and_respect_ratio() {
    let scene = deep_scene();
    let config = DepthPartitionConfig::default().with_max_partitions(64);
    let (_, parts) = pipeline(&scene, &observer(), config);
    let slices = parts.partitions();

    assert!(slices.len() > 1);
    for pair in slices.windows(2) {
        assert!(pair[0].near_z <= pair[0].far_z);
        assert_eq!(pair[0].near_z, pair[1].far_z);
    }
    // Empty gap slices may be arbitrarily deep. The farthest slice carries a
    // small stretch of its far bound.
    let limit = config.max_ratio() * 1.02;
    for slice in slices.iter().filter(|s| s.occupied) {
        assert!(slice.far_z / slice.near_z <= limit, "{slice:?}");
    }
}

#[test]
fn test_partition_count_is_capped() {
    let scene = deep_scene();
    let config = DepthPartitionConfig::default()
        .with_depth_bits(8)
        .with_max_partitions(3);
    let (entries, parts) = pipeline(&scene, &observer(), config);

    assert_eq!(parts.len(), 3);
    assert!(parts.occupied_count() >= 1);
    for i in 0..entries.len() {
        assert!(parts.partition_of(i).is_some());
    }
}

#[test]
fn test_farthest_entry_lands_in_first_partition() {
    let scene = deep_scene();
    let (entries, parts) = pipeline(&scene, &observer(), DepthPartitionConfig::default());

    let farthest = entries
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.center_z.total_cmp(&b.1.center_z))
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(parts.partition_of(farthest), Some(0));
    assert!(parts.partitions()[0].occupied);
}
