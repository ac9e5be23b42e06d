use serde::Serialize;

/// Resolution the game lays out its UI for
pub const REFERENCE_WIDTH: f32 = 2560.0;
pub const REFERENCE_HEIGHT: f32 = 1600.0;

/// Converts unscaled UI units to window pixels.
///
/// `cull` is the horizontal offset of the letterboxed UI on windows wider
/// than the reference aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameScale {
    pub width_ratio: f32,
    pub height_ratio: f32,
    pub cull: f32,
}

impl Default for GameScale {
    fn default() -> Self {
        Self {
            width_ratio: 1.0,
            height_ratio: 1.0,
            cull: 0.0,
        }
    }
}

impl GameScale {
    pub fn from_window(width: f32, height: f32) -> Self {
        if width <= 0.0 || height <= 0.0 {
            return Self::default();
        }
        let max_width = height * REFERENCE_WIDTH / REFERENCE_HEIGHT;
        let (effective_width, cull) = if width > max_width {
            (max_width, (width - max_width) / 2.0)
        } else {
            (width, 0.0)
        };
        Self {
            width_ratio: effective_width / REFERENCE_WIDTH,
            height_ratio: height / REFERENCE_HEIGHT,
            cull,
        }
    }

    /// Width and height factors for an element's scale index and multiplier
    pub fn scale_value(&self, index: u8, multiplier: f32) -> (f32, f32) {
        let (width, height) = match index {
            1 => (self.width_ratio, self.width_ratio),
            2 => (self.height_ratio, self.height_ratio),
            3 => {
                let min = self.width_ratio.min(self.height_ratio);
                (min, min)
            }
            _ => (self.width_ratio, self.height_ratio),
        };
        (width * multiplier, height * multiplier)
    }
}
