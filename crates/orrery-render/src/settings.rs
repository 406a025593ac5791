//! Renderer configuration and change notification.

use crate::flags::{BodyClass, LabelFlags, RenderFlags, StarStyle};
use std::sync::Arc;

/// User facing renderer configuration.
///
/// ```
/// use orrery_render::{RenderFlags, RenderSettings};
///
/// let settings = RenderSettings::default()
///     .with_render_flags(RenderFlags::DEFAULT | RenderFlags::SHOW_ORBITS)
///     .with_faintest_magnitude(7.5);
/// assert!(settings.render_flags.contains(RenderFlags::SHOW_ORBITS));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub render_flags: RenderFlags,
    pub label_flags: LabelFlags,
    /// Classes whose orbits are drawn when `SHOW_ORBITS` is set.
    pub orbit_mask: BodyClass,
    /// Orbits smaller than this on screen (pixels) are skipped.
    pub min_orbit_size: f32,
    /// Objects and subtrees smaller than this on screen (pixels) are skipped
    /// unless they are labeled.
    pub min_feature_size: f32,
    /// Stars farther than this (light years) are not drawn.
    pub distance_limit: f32,
    /// Faintest apparent magnitude that still gets drawn.
    pub faintest_magnitude: f32,
    pub star_style: StarStyle,
    /// Screen resolution used to size label fonts.
    pub screen_dpi: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            render_flags: RenderFlags::DEFAULT,
            label_flags: LabelFlags::empty(),
            orbit_mask: BodyClass::DEFAULT_ORBIT_MASK,
            min_orbit_size: 20.0,
            min_feature_size: 20.0,
            distance_limit: 1.0e6,
            faintest_magnitude: 6.0,
            star_style: StarStyle::FuzzyPoint,
            screen_dpi: 96,
        }
    }
}

impl RenderSettings {
    pub fn with_render_flags(mut self, flags: RenderFlags) -> Self {
        self.render_flags = flags;
        self
    }

    pub fn with_label_flags(mut self, flags: LabelFlags) -> Self {
        self.label_flags = flags;
        self
    }

    pub fn with_orbit_mask(mut self, mask: BodyClass) -> Self {
        self.orbit_mask = mask;
        self
    }

    pub fn with_min_orbit_size(mut self, pixels: f32) -> Self {
        self.min_orbit_size = pixels;
        self
    }

    pub fn with_min_feature_size(mut self, pixels: f32) -> Self {
        self.min_feature_size = pixels;
        self
    }

    pub fn with_distance_limit(mut self, light_years: f32) -> Self {
        self.distance_limit = light_years;
        self
    }

    pub fn with_faintest_magnitude(mut self, magnitude: f32) -> Self {
        self.faintest_magnitude = magnitude;
        self
    }

    pub fn with_star_style(mut self, style: StarStyle) -> Self {
        self.star_style = style;
        self
    }

    pub fn with_screen_dpi(mut self, dpi: u32) -> Self {
        self.screen_dpi = dpi;
        self
    }
}

/// Receives a callback whenever renderer settings change.
///
/// Closures taking `&RenderSettings` implement this trait.
pub trait RenderSettingsWatcher: Send + Sync {
    fn settings_changed(&self, settings: &RenderSettings);
}

impl<F> RenderSettingsWatcher for F
where
    F: Fn(&RenderSettings) + Send + Sync,
{
    fn settings_changed(&self, settings: &RenderSettings) {
        self(settings)
    }
}

/// Handle returned by [`WatcherRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherHandle(u64);

/// Explicit registry of settings watchers.
///
/// Watchers are notified in registration order.
#[derive(Default)]
pub struct WatcherRegistry {
    watchers: Vec<(WatcherHandle, Arc<dyn RenderSettingsWatcher>)>,
    next_id: u64,
}

impl WatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, watcher: Arc<dyn RenderSettingsWatcher>) -> WatcherHandle {
        let handle = WatcherHandle(self.next_id);
        self.next_id += 1;
        self.watchers.push((handle, watcher));
        tracing::trace!("Added settings watcher {:?}", handle);
        handle
    }

    /// Remove a watcher. Returns `false` if the handle was not registered.
    pub fn remove(&mut self, handle: WatcherHandle) -> bool {
        let before = self.watchers.len();
        self.watchers.retain(|(h, _)| *h != handle);
        before != self.watchers.len()
    }

    pub fn notify_all(&self, settings: &RenderSettings) {
        for (_, watcher) in &self.watchers {
            watcher.settings_changed(settings);
        }
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }
}

impl std::fmt::Debug for WatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherRegistry")
            .field("watchers", &self.watchers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_defaults() {
        let s = RenderSettings::default();
        assert_eq!(s.min_orbit_size, 20.0);
        assert_eq!(s.faintest_magnitude, 6.0);
        assert_eq!(s.screen_dpi, 96);
        assert_eq!(s.label_flags, LabelFlags::empty());
    }

    #[test]
    fn test_notify_and_remove() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let mut registry = WatcherRegistry::new();
        let handle = registry.add(Arc::new(move |_: &RenderSettings| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        registry.notify_all(&RenderSettings::default());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(registry.remove(handle));
        assert!(!registry.remove(handle));
        registry.notify_all(&RenderSettings::default());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_watcher_sees_new_values() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let sink = seen.clone();
        let mut registry = WatcherRegistry::new();
        registry.add(Arc::new(move |s: &RenderSettings| {
            *sink.lock() = Some(s.faintest_magnitude);
        }));

        let settings = RenderSettings::default().with_faintest_magnitude(8.0);
        registry.notify_all(&settings);
        assert_eq!(*seen.lock(), Some(8.0));
    }
}
