use anyhow::Result;

use crate::detect::labels::LabelTable;
use crate::detect::result::RawBox;
use crate::frame::Frame;

/// Detector backend trait.
///
/// A backend wraps one trained model and its label space. Backends are built
/// once at startup and shared read-only by every frame handler, so `detect`
/// takes `&self` and implementations must be `Send + Sync`.
///
/// `detect` is blocking and may be slow; it dominates per-frame latency.
/// Implementations must treat the frame as read-only and must not keep it
/// beyond the call.
pub trait ObjectDetector: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &str;

    /// Class-id → class-name table of the wrapped model.
    fn labels(&self) -> &LabelTable;

    /// Run detection on a frame.
    fn detect(&self, frame: &Frame) -> Result<Vec<RawBox>>;

    /// Optional warm-up hook.
    fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}
