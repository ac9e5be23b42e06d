//! UI element tree decoding

mod element;
mod important;
mod map;
mod scale;

pub use element::{MAX_UI_DEPTH, UiElementBase};
pub use important::ImportantUiElements;
pub use map::MapUiElement;
pub use scale::{GameScale, REFERENCE_HEIGHT, REFERENCE_WIDTH};
