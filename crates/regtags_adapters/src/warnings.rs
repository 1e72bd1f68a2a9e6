use regtags_core::ports::WarningSink;
use tracing::warn;

/// Surfaces configuration notices as `WARN` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarningSink;

impl WarningSink for TracingWarningSink {
    fn warn(&self, message: &str) {
        warn!("{}", message);
    }
}
