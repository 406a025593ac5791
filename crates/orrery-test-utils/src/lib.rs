//! Graphics device seam for Orrery.
//!
//! Every component that submits draw calls talks to a [`GraphicsDevice`]
//! instead of a concrete API. The real implementation lives in
//! `orrery-render` (wgpu); the `mock` feature adds `MockDevice`, which
//! records every call so tests can assert on what would have been drawn.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use orrery_test_utils::{GraphicsDevice, MockDevice, TextureDesc, TextureFormat};
//!
//! let device = MockDevice::new();
//! let texture = device
//!     .create_texture(&TextureDesc::new(64, 32, TextureFormat::Alpha8))
//!     .unwrap();
//! device.bind_texture(0, Some(texture));
//!
//! assert_eq!(device.count_texture_creates(), 1);
//! assert_eq!(device.bound_texture(0), Some(texture));
//! # }
//! ```
//!
//! The trait takes `&self` everywhere so a device can be shared through an
//! `Arc` by fonts, atlases and the renderer at the same time. Implementations
//! use interior mutability for their state.

pub mod device;
#[cfg(feature = "mock")]
pub mod mock_device;

pub use device::*;
#[cfg(feature = "mock")]
pub use mock_device::*;
