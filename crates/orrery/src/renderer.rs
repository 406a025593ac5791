//! The per-frame pipeline.
//!
//! A frame runs these stages in order:
//!
//! 1. build the render, orbit and label lists and drop invisible entries
//! 2. partition the view volume by depth
//! 3. draw background annotations
//! 4. for each depth partition, farthest first: clear depth if it holds
//!    objects or orbits, draw its orbits and objects, then the sorted
//!    annotations within it
//! 5. draw foreground annotations
//!
//! Object and orbit drawing is delegated to an [`ItemPainter`].

use crate::compositor::{AnnotationCompositor, MarkerPainter};
use orrery_core::profiling::{self, profile_function, profile_scope};
use orrery_render::{
    Annotation, AnnotationLayer, AnnotationSet, AnnotationStyle, BodyClass, DepthBufferPartition,
    DepthPartitionConfig, DepthPartitioner, GraphicsDevice, LabelFlags, MIN_NEAR_PLANE_DISTANCE,
    Observer, OrbitPathListEntry, RenderFlags, RenderListBuilder, RenderListEntry, RenderLists,
    RenderSettings, RenderSettingsWatcher, SceneQuery, StarStyle, ViewParams, WatcherHandle,
    WatcherRegistry, remove_invisible_items,
};
use orrery_text::{FontLoadOptions, SharedFont, TextResult, TextureFont};
use std::sync::Arc;

/// Draws the objects of a frame.
pub trait ItemPainter {
    /// Draw one visible object inside `partition`.
    fn draw_entry(&mut self, entry: &RenderListEntry, partition: &DepthBufferPartition);

    /// Draw the part of an orbit path that falls inside `partition`.
    fn draw_orbit(&mut self, _orbit: &OrbitPathListEntry, _partition: &DepthBufferPartition) {}
}

/// Counts from the last rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub entries: usize,
    pub orbits: usize,
    pub labels: usize,
    pub partitions: usize,
    pub occupied_partitions: usize,
    /// Slices that received a depth clear, counting the stray orbit pass.
    pub cleared_partitions: usize,
    pub annotations: usize,
}

pub struct Renderer {
    device: Arc<dyn GraphicsDevice>,
    settings: RenderSettings,
    watchers: WatcherRegistry,
    partitioner: DepthPartitioner,
    view: ViewParams,
    compositor: AnnotationCompositor,
    annotations: AnnotationSet,
    lists: RenderLists,
    stats: FrameStats,
}

impl Renderer {
    pub fn new(device: Arc<dyn GraphicsDevice>, view: ViewParams) -> Self {
        Self {
            compositor: AnnotationCompositor::new(device.clone()),
            device,
            settings: RenderSettings::default(),
            watchers: WatcherRegistry::new(),
            partitioner: DepthPartitioner::default(),
            view,
            annotations: AnnotationSet::new(),
            lists: RenderLists::default(),
            stats: FrameStats::default(),
        }
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_partition_config(mut self, config: DepthPartitionConfig) -> Self {
        self.partitioner = DepthPartitioner::new(config);
        self
    }

    // Settings

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Replace the settings, notifying watchers if anything changed.
    pub fn set_settings(&mut self, settings: RenderSettings) {
        if settings == self.settings {
            return;
        }
        self.settings = settings;
        tracing::debug!("Render settings changed");
        self.watchers.notify_all(&self.settings);
    }

    fn update(&mut self, f: impl FnOnce(&mut RenderSettings)) {
        let mut settings = self.settings.clone();
        f(&mut settings);
        self.set_settings(settings);
    }

    pub fn set_render_flags(&mut self, flags: RenderFlags) {
        self.update(|s| s.render_flags = flags);
    }

    pub fn set_label_flags(&mut self, flags: LabelFlags) {
        self.update(|s| s.label_flags = flags);
    }

    pub fn set_orbit_mask(&mut self, mask: BodyClass) {
        self.update(|s| s.orbit_mask = mask);
    }

    pub fn set_min_orbit_size(&mut self, pixels: f32) {
        self.update(|s| s.min_orbit_size = pixels);
    }

    pub fn set_min_feature_size(&mut self, pixels: f32) {
        self.update(|s| s.min_feature_size = pixels);
    }

    pub fn set_distance_limit(&mut self, light_years: f32) {
        self.update(|s| s.distance_limit = light_years);
    }

    pub fn set_faintest_magnitude(&mut self, magnitude: f32) {
        self.update(|s| s.faintest_magnitude = magnitude);
    }

    pub fn set_star_style(&mut self, style: StarStyle) {
        self.update(|s| s.star_style = style);
    }

    pub fn set_screen_dpi(&mut self, dpi: u32) {
        self.update(|s| s.screen_dpi = dpi);
    }

    pub fn add_watcher(&mut self, watcher: Arc<dyn RenderSettingsWatcher>) -> WatcherHandle {
        self.watchers.add(watcher)
    }

    pub fn remove_watcher(&mut self, handle: WatcherHandle) -> bool {
        self.watchers.remove(handle)
    }

    // Viewport and resources

    pub fn view(&self) -> &ViewParams {
        &self.view
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.view.width = width;
        self.view.height = height;
    }

    pub fn set_field_of_view(&mut self, fov_y: f64) {
        self.view.fov_y = fov_y;
    }

    /// Font used for labels and annotations.
    pub fn set_label_font(&mut self, font: Option<SharedFont>) {
        self.compositor.set_font(font);
    }

    /// Font options at the configured screen DPI.
    pub fn font_options(&self) -> FontLoadOptions {
        FontLoadOptions::default().with_dpi(self.settings.screen_dpi)
    }

    /// Load the label font from a `"path,size"` spec at the screen DPI.
    pub fn load_label_font(&mut self, spec: &str) -> TextResult<SharedFont> {
        let font = TextureFont::load_spec(spec, 0, self.font_options(), self.device.clone())?
            .into_shared();
        self.compositor.set_font(Some(font.clone()));
        Ok(font)
    }

    /// Annotations queued for the next frame. The pools are emptied once the
    /// frame is drawn.
    pub fn annotations_mut(&mut self) -> &mut AnnotationSet {
        &mut self.annotations
    }

    /// Lists built by the last frame, entries sorted farthest first.
    pub fn render_lists(&self) -> &RenderLists {
        &self.lists
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    // Frame

    pub fn render(
        &mut self,
        scene: &dyn SceneQuery,
        observer: &Observer,
        painter: &mut dyn ItemPainter,
        markers: &mut dyn MarkerPainter,
    ) -> FrameStats {
        profiling::new_frame();
        profile_function!();

        let builder = RenderListBuilder::new(&self.settings, observer, &self.view);
        let mut lists = {
            profile_scope!("build_render_lists");
            builder.build(scene)
        };
        remove_invisible_items(&mut lists.entries, builder.frustum());
        lists.sort();
        let partitions = self.partitioner.partition(&lists.entries);

        let max_clearance = self.view.width.max(self.view.height) as f32;
        for label in &lists.labels {
            // An observer inside the disc gets no clearance.
            let clearance = if label.disc_size < max_clearance {
                label.disc_size
            } else {
                0.0
            };
            let style = AnnotationStyle::default().with_clearance(clearance);
            self.annotations.add(
                AnnotationLayer::DepthSorted,
                Annotation::label(label.name.clone(), label.position, label.color).with_style(style),
            );
        }
        self.annotations.dedup_markers(&self.view);
        self.annotations.sort();

        self.stats = FrameStats {
            entries: lists.entries.len(),
            orbits: lists.orbits.len(),
            labels: lists.labels.len(),
            partitions: partitions.len(),
            occupied_partitions: partitions.occupied_count(),
            cleared_partitions: 0,
            annotations: self.annotations.len(),
        };

        self.compositor
            .render(self.annotations.background(), &self.view, markers);

        self.device.set_depth_range(0.0, 1.0);
        let sorted = self.annotations.depth_sorted();
        let mut next_annotation = 0;
        let mut orbit_drawn = vec![false; lists.orbits.len()];

        for partition in partitions.partitions() {
            profile_scope!("depth_partition");

            // Sorted annotations beyond this slice belong to the gap behind it.
            let range = self
                .annotations
                .depth_range(partition.near_z, partition.far_z);
            if range.start > next_annotation {
                self.compositor
                    .render(&sorted[next_annotation..range.start], &self.view, markers);
            }

            // Orbits can pass through slices that hold no entries; those
            // need a clear too.
            let orbits: Vec<usize> = (0..lists.orbits.len())
                .filter(|&i| overlaps(&lists.orbits[i], partition))
                .collect();
            if partition.occupied || !orbits.is_empty() {
                self.device.clear_depth();
                self.stats.cleared_partitions += 1;
            }

            for i in orbits {
                painter.draw_orbit(&lists.orbits[i], partition);
                orbit_drawn[i] = true;
            }
            for index in partitions.entries_in(partition.index) {
                painter.draw_entry(&lists.entries[index], partition);
            }

            self.compositor
                .render(&sorted[range.clone()], &self.view, markers);
            next_annotation = range.end.max(next_annotation);
        }

        // Orbits that touch no slice get one of their own.
        let stray: Vec<&OrbitPathListEntry> = lists
            .orbits
            .iter()
            .zip(&orbit_drawn)
            .filter(|(_, drawn)| !**drawn)
            .map(|(orbit, _)| orbit)
            .collect();
        if !stray.is_empty() {
            self.device.clear_depth();
            self.stats.cleared_partitions += 1;
            for orbit in stray {
                let partition = orbit_partition(orbit, partitions.len());
                painter.draw_orbit(orbit, &partition);
            }
        }

        if next_annotation < sorted.len() {
            self.compositor
                .render(&sorted[next_annotation..], &self.view, markers);
        }
        self.compositor
            .render(self.annotations.foreground(), &self.view, markers);

        tracing::trace!(
            "Frame: {} entries, {} orbits, {} partitions",
            self.stats.entries,
            self.stats.orbits,
            self.stats.partitions
        );

        self.annotations.clear();
        self.lists = lists;
        self.stats
    }
}

fn overlaps(orbit: &OrbitPathListEntry, partition: &DepthBufferPartition) -> bool {
    orbit.center_z - orbit.radius < partition.far_z && orbit.center_z + orbit.radius >= partition.near_z
}

fn orbit_partition(orbit: &OrbitPathListEntry, index: usize) -> DepthBufferPartition {
    let far_z = (orbit.center_z + orbit.radius).max(MIN_NEAR_PLANE_DISTANCE * 2.0);
    DepthBufferPartition {
        index,
        near_z: (orbit.center_z - orbit.radius).max(MIN_NEAR_PLANE_DISTANCE),
        far_z,
        occupied: false,
    }
}
