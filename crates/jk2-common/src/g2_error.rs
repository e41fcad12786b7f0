// g2_error.rs — errors raised by the Ghoul2 transform and trace passes

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum G2Error {
    /// The per-frame vertex space cannot satisfy an allocation.
    #[error("Ran out of transform space for Ghoul2 Models ({requested} bytes requested, {available} free)")]
    OutOfVertSpace { requested: usize, available: usize },
    /// A visible surface has no skinned vertices for the current frame.
    #[error("surface {surface} traced before it was transformed this frame")]
    SurfaceNotTransformed { surface: i32 },
    /// Asset data rejected at registration.
    #[error("bad model: {0}")]
    BadModel(String),
}
