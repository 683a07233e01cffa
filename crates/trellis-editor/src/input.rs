//! Input abstraction layer.
//!
//! Normalizes mouse, touch and pen events into plain structs in screen
//! coordinates. Hosts translate their windowing/DOM events into these.

/// Which pointer button triggered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// Modifier keys held during a pointer or key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    /// Ctrl on Linux/Windows, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Any modifier that turns a node click into a selection toggle.
    pub fn multi_select(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// A pointer event in screen (viewport) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    pub x: f64,
    pub y: f64,
    pub button: Button,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn with_button(mut self, button: Button) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn position(&self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }
}

/// A wheel / trackpad scroll in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelInput {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub modifiers: Modifiers,
}
