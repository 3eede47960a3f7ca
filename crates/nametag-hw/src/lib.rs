//! nametag-hw — V4L2 camera capture.
//!
//! Opens the default (or configured) capture device, negotiates a pixel
//! format, and hands out packed RGB frames ready for detection and display.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat};
pub use frame::Frame;
