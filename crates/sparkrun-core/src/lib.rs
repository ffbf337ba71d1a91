pub mod error;
pub mod events;
pub mod render;
pub mod time;

pub use error::CoreError;
pub use events::{EventBus, EventQueue, SubscriptionId};
pub use time::{Millis, SimClock};

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use glam::Vec2;

    use crate::render::{CommandRecorder, DrawCommand, FixedCamera};
    use crate::time::Millis;

    /// 640x480 camera at the world origin with 32 pixels per world unit.
    pub fn default_camera() -> FixedCamera {
        FixedCamera::new(Vec2::ZERO, 32.0, Vec2::new(640.0, 480.0))
    }

    /// Split `total` milliseconds into `steps` equal deltas.
    pub fn frame_deltas(total: Millis, steps: usize) -> Vec<Millis> {
        let step = total / steps.max(1) as Millis;
        vec![step; steps.max(1)]
    }

    /// Every global alpha value set on the recorder, in order.
    pub fn alpha_values(recorder: &CommandRecorder) -> Vec<f32> {
        recorder
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::GlobalAlpha(a) => Some(*a),
                _ => None,
            })
            .collect()
    }

    /// Assert two floats are within `eps`.
    pub fn assert_close(actual: f64, expected: f64, eps: f64) {
        assert!(
            (actual - expected).abs() <= eps,
            "expected {expected} (±{eps}), got {actual}"
        );
    }
}
