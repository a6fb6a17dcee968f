use crate::events::*;

pub trait PlayerRuntime: Send + Sync + 'static {
    fn emit_lifecycle(&self, event: PlayerLifecycleEvent);
    fn emit_progress(&self, event: PlayerProgressEvent);
    fn emit_error(&self, event: PlayerErrorEvent);
}
