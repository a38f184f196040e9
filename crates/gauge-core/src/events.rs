//! Application lifecycle events shared by every command.

use tracing::{error, info, warn};

use crate::errors::GaugeError;

pub fn log_app_startup() {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION")
    );
}

/// Log a command failure. User errors (bad config, missing credentials) are
/// warnings, everything else is an error.
pub fn log_app_error<E: GaugeError + ?Sized>(error: &E) {
    if error.is_user_error() {
        warn!(
            event = "core.app.error_occurred",
            error_code = error.error_code(),
            error = %error
        );
    } else {
        error!(
            event = "core.app.error_occurred",
            error_code = error.error_code(),
            error = %error
        );
    }
}
