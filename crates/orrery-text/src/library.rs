//! Process-wide font engine state.
//!
//! Glyph scaling goes through a single [`ScaleContext`] guarded by a mutex.
//! [`FontLibrary::init`] creates it, [`FontLibrary::shutdown`] drops it.
//! Faces loaded while the library is down fail to rasterize and fall back
//! like any other missing glyph.

use parking_lot::{Mutex, const_mutex};
use swash::scale::ScaleContext;

static LIBRARY: Mutex<Option<ScaleContext>> = const_mutex(None);

/// Handle to the shared font engine.
pub struct FontLibrary;

impl FontLibrary {
    /// Initialize the engine. Returns `false` if it was already running.
    pub fn init() -> bool {
        let mut library = LIBRARY.lock();
        if library.is_some() {
            return false;
        }
        *library = Some(ScaleContext::new());
        tracing::debug!("Font library initialized");
        true
    }

    /// Tear the engine down. Returns `false` if it was not running.
    pub fn shutdown() -> bool {
        let was_running = LIBRARY.lock().take().is_some();
        if was_running {
            tracing::debug!("Font library shut down");
        }
        was_running
    }

    pub fn is_initialized() -> bool {
        LIBRARY.lock().is_some()
    }

    /// Run `f` with exclusive access to the scale context.
    pub(crate) fn with_context<R>(f: impl FnOnce(&mut ScaleContext) -> R) -> Option<R> {
        LIBRARY.lock().as_mut().map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Other tests initialize the library concurrently, so only check the
    // transitions that hold regardless of ordering.
    #[test]
    fn test_init_is_idempotent() {
        FontLibrary::init();
        assert!(FontLibrary::is_initialized());
        assert!(!FontLibrary::init());
        assert!(FontLibrary::with_context(|_| ()).is_some());
    }
}
