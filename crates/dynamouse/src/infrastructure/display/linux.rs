//! Linux display enumeration via the X11 Xlib API.
//!
//! Each X screen becomes one [`Display`] labelled `screen-<n>`.  Plain Xlib
//! does not expose per-monitor offsets without Xrandr, so every screen is
//! reported at (0, 0); setups with several monitors on one X screen should
//! list their displays in the `[[displays]]` config section instead.

use dynamouse_core::{Display, DisplayBounds};
use x11::xlib;

use super::DisplayError;

/// Enumerates X screens using `XOpenDisplay` and `XScreenCount`.
///
/// # Errors
///
/// Returns [`DisplayError::PlatformError`] if the X11 display cannot be
/// opened (for example when `DISPLAY` is unset) or reports no screens.
pub fn enumerate_displays() -> Result<Vec<Display>, DisplayError> {
    // SAFETY: a null name selects the display named by $DISPLAY.  The returned
    // pointer is freed by XCloseDisplay below.
    let display = unsafe { xlib::XOpenDisplay(std::ptr::null()) };

    if display.is_null() {
        let display_env = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
        return Err(DisplayError::PlatformError(format!(
            "XOpenDisplay failed; DISPLAY={display_env}"
        )));
    }

    // SAFETY: `display` is a valid non-null pointer returned by XOpenDisplay.
    let screen_count = unsafe { xlib::XScreenCount(display) };

    let mut displays = Vec::with_capacity(screen_count.max(0) as usize);
    for screen_num in 0..screen_count {
        // SAFETY: screen_num is in [0, screen_count).
        let width = unsafe { xlib::XDisplayWidth(display, screen_num) } as u32;
        let height = unsafe { xlib::XDisplayHeight(display, screen_num) } as u32;

        displays.push(Display::new(
            format!("screen-{screen_num}"),
            DisplayBounds::new(0, 0, width, height),
        ));
    }

    // SAFETY: `display` was successfully opened above and is not used after this.
    unsafe { xlib::XCloseDisplay(display) };

    if displays.is_empty() {
        return Err(DisplayError::PlatformError(
            "X11 reported zero screens".to_string(),
        ));
    }

    Ok(displays)
}
