//! Font library init and shutdown.
//!
//! Kept in its own test binary: shutting the library down would race with
//! tests that rasterize real faces.

use orrery_text::FontLibrary;

#[test]
fn test_init_shutdown_cycle() {
    FontLibrary::init();
    assert!(FontLibrary::is_initialized());
    assert!(!FontLibrary::init());

    assert!(FontLibrary::shutdown());
    assert!(!FontLibrary::is_initialized());
    assert!(!FontLibrary::shutdown());

    assert!(FontLibrary::init());
    assert!(FontLibrary::is_initialized());
}
