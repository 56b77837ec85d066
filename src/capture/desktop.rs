//! xcap-backed host capabilities for desktop sessions.
//!
//! The focused top-level window stands in for the active tab, and a monitor
//! stands in for the page being rasterized. Everything here blocks on the
//! window system, so callers run it via `spawn_blocking`.

use super::{encode_png, Rasterizer, RenderRoot};
use crate::environment::{ExtensionHost, HostAccessError, Tab, TabApi};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::RgbaImage;
use std::sync::Arc;
use xcap::{Monitor, Window};

/// Extension host backed by the desktop window list.
pub struct DesktopHost {
    tabs: Option<Arc<dyn TabApi>>,
}

impl DesktopHost {
    /// Check the window list once. Hosts that cannot enumerate windows
    /// (e.g. restricted Wayland sessions) expose no tab capability.
    pub fn detect() -> Self {
        let tabs: Option<Arc<dyn TabApi>> = match Window::all() {
            Ok(windows) if !windows.is_empty() => Some(Arc::new(FocusedWindowTabs)),
            Ok(_) => {
                log::warn!("[CAPTURE] No windows visible — window capture disabled");
                None
            }
            Err(e) => {
                log::warn!("[CAPTURE] Window enumeration failed: {}", e);
                None
            }
        };
        Self { tabs }
    }
}

impl ExtensionHost for DesktopHost {
    fn tabs(&self) -> Result<Option<Arc<dyn TabApi>>, HostAccessError> {
        Ok(self.tabs.clone())
    }
}

/// Treats the focused window as the active tab.
pub struct FocusedWindowTabs;

impl FocusedWindowTabs {
    fn focused_window() -> Result<Window, String> {
        let windows = Window::all().map_err(|e| format!("Failed to enumerate windows: {}", e))?;
        windows
            .into_iter()
            .filter(|w| !w.is_minimized().unwrap_or(true))
            .find(|w| w.is_focused().unwrap_or(false))
            .ok_or_else(|| "No focused window found".to_string())
    }
}

impl TabApi for FocusedWindowTabs {
    fn query_active_tab(&self) -> Result<Tab, String> {
        let window = Self::focused_window()?;
        Ok(Tab {
            id: window.id().ok(),
            title: window.title().ok(),
            url: None,
        })
    }

    fn capture_visible_tab(&self, tab: &Tab) -> Result<String, String> {
        let windows = Window::all().map_err(|e| format!("Failed to enumerate windows: {}", e))?;
        let window = match tab.id {
            Some(id) => windows
                .into_iter()
                .find(|w| w.id().ok() == Some(id))
                .ok_or_else(|| format!("Window {} is gone", id))?,
            None => Self::focused_window()?,
        };

        let image = window
            .capture_image()
            .map_err(|e| format!("Window capture failed: {}", e))?;
        let png = encode_png(image).map_err(|e| e.to_string())?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
    }
}

/// Rasterizes a whole monitor.
pub struct ScreenRasterizer;

impl Rasterizer for ScreenRasterizer {
    fn render_element_to_image(&self, root: &RenderRoot) -> Result<RgbaImage, String> {
        let monitors = Monitor::all().map_err(|e| format!("Failed to enumerate monitors: {}", e))?;

        let monitor = match root {
            RenderRoot::Primary => {
                // Fallback: if no monitor reports as primary, use the first one
                let index = monitors
                    .iter()
                    .position(|m| m.is_primary().unwrap_or(false))
                    .unwrap_or(0);
                monitors
                    .into_iter()
                    .nth(index)
                    .ok_or_else(|| "No monitor found".to_string())?
            }
            RenderRoot::Monitor(name) => monitors
                .into_iter()
                .find(|m| m.name().map(|n| &n == name).unwrap_or(false))
                .ok_or_else(|| format!("Monitor '{}' not found", name))?,
        };

        monitor
            .capture_image()
            .map_err(|e| format!("Screen capture failed: {}", e))
    }
}
