/// Linear map from `[0, duration]` seconds to `[0, width]` pixels.
///
/// The width is fixed when the timeline is built; there is no re-layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapper {
    duration_seconds: f64,
    width_px: f64,
}

impl AxisMapper {
    /// Both extents must be positive; callers validate before building.
    pub fn new(duration_seconds: f64, width_px: f64) -> Self {
        debug_assert!(duration_seconds > 0.0, "axis duration must be positive");
        debug_assert!(width_px > 0.0, "axis width must be positive");
        Self {
            duration_seconds,
            width_px,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    /// Seconds -> pixels. The domain is clamped to `[0, duration]`.
    pub fn to_px(&self, seconds: f64) -> f64 {
        let seconds = seconds.clamp(0.0, self.duration_seconds);
        seconds / self.duration_seconds * self.width_px
    }

    /// Pixels -> seconds. Not clamped; see [`AxisMapper::contains_seconds`].
    pub fn to_seconds(&self, px: f64) -> f64 {
        px / self.width_px * self.duration_seconds
    }

    pub fn contains_seconds(&self, seconds: f64) -> bool {
        (0.0..=self.duration_seconds).contains(&seconds)
    }
}
