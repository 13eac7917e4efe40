pub mod api;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod host;
pub mod source;
pub mod transform;

pub use host::{HostState, ScriptHost};

/// Folds an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
