//! Frontmost application lookup

use tracing::debug;

/// Source of the foreground application's name
pub trait AppNameSource: Send {
    /// Name of the foreground application, or an empty string if unknown
    fn frontmost_app_name(&self) -> String;
}

/// Queries the desktop for the focused application
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAppName;

#[cfg(target_os = "macos")]
impl AppNameSource for SystemAppName {
    fn frontmost_app_name(&self) -> String {
        const SCRIPT: &str = "tell application \"System Events\" to get name of \
                              first application process whose frontmost is true";
        super::run_command("osascript", &["-e", SCRIPT]).unwrap_or_else(|e| {
            debug!("Frontmost app query failed: {}", e);
            String::new()
        })
    }
}

#[cfg(target_os = "linux")]
impl AppNameSource for SystemAppName {
    fn frontmost_app_name(&self) -> String {
        super::run_command("xdotool", &["getactivewindow", "getwindowclassname"]).unwrap_or_else(
            |e| {
                debug!("Frontmost app query failed: {}", e);
                String::new()
            },
        )
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
impl AppNameSource for SystemAppName {
    fn frontmost_app_name(&self) -> String {
        debug!("Frontmost app lookup not supported on this platform");
        String::new()
    }
}
