pub mod canvas;
pub mod drag;
pub mod events;
pub mod input;
pub mod selection;
pub mod shortcuts;

pub use canvas::Canvas;
pub use events::{CanvasEvent, EventBus, SubscriptionId};
pub use input::{Button, Modifiers, PointerInput, WheelInput};
pub use shortcuts::{ShortcutAction, ShortcutMap};
