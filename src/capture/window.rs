//! Window and display descriptors returned by the OS enumeration boundary.

use serde::{Deserialize, Serialize};

/// Windows at or below this size in either dimension are not worth capturing.
const MIN_WINDOW_EXTENT: u32 = 100;

/// Window titles owned by the OS shell rather than an application.
const SYSTEM_WINDOW_TITLES: &[&str] = &["Window Server", "Dock"];

/// Screen-space rectangle of a window or display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Snapshot of one OS window. Re-fetched on demand; there is no lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDescriptor {
    pub id: u32,
    pub title: String,
    pub owner_name: String,
    pub bounds: Bounds,
}

/// Snapshot of one attached display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayDescriptor {
    /// Position in the enumeration order, used to pick a display for capture.
    pub index: usize,
    pub id: u32,
    pub name: String,
    pub bounds: Bounds,
    pub is_primary: bool,
}

impl WindowDescriptor {
    /// Returns true if the window is a capturable application window.
    pub fn is_capturable(&self) -> bool {
        let title = self.title.trim();
        if title.is_empty() {
            return false;
        }
        if SYSTEM_WINDOW_TITLES.iter().any(|system| title.contains(system)) {
            return false;
        }
        self.bounds.width > MIN_WINDOW_EXTENT && self.bounds.height > MIN_WINDOW_EXTENT
    }
}

/// Drops untitled, system and degenerate windows from an enumeration result.
pub fn visible_windows(windows: Vec<WindowDescriptor>) -> Vec<WindowDescriptor> {
    windows.into_iter().filter(|w| w.is_capturable()).collect()
}
