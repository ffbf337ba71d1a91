//! Drawing abstractions. Game code renders against these traits so the same
//! code paths run on a browser canvas, in the headless runner, and in tests.

pub mod camera;
pub mod color;
pub mod surface;

pub use camera::{Camera, FixedCamera, ViewBounds};
pub use color::Rgba;
pub use surface::{CommandRecorder, DrawCommand, DrawSurface, Rect};
