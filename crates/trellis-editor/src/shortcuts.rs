//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. `key` follows
//! the DOM `KeyboardEvent.key` naming (`"Escape"`, `" "`, `"a"`).

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    ZoomIn,
    ZoomOut,
    ZoomToFit,
    SelectAll,
    /// Clear the selection and abandon a rubber band in progress.
    Deselect,
    /// Space held: primary drags pan instead of selecting.
    PanStart,
    PanEnd,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key press. Returns `None` if the combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if modifiers.command() {
            return match key {
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomToFit),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                _ => None,
            };
        }

        match key {
            "Escape" => Some(ShortcutAction::Deselect),
            " " => Some(ShortcutAction::PanStart),
            _ => None,
        }
    }

    /// Resolve a key release. Only the pan key reacts to release.
    pub fn resolve_release(key: &str) -> Option<ShortcutAction> {
        match key {
            " " => Some(ShortcutAction::PanEnd),
            _ => None,
        }
    }
}
