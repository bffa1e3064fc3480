use gw_core::WorldTick;

use crate::context::SimContext;
use crate::error::SimResult;

/// A world subsystem that runs each tick.
///
/// Systems run in registration order inside the tick's transaction.
/// Events a system emits are processed by the synchronous handlers before
/// the next system runs, so later systems see their effects.
pub trait System: std::fmt::Debug {
    /// Name used in logs and error contexts.
    fn name(&self) -> &str;

    /// Whether the system has work at `tick`. Skipped systems are not ticked.
    fn is_due(&self, _tick: WorldTick) -> bool {
        true
    }

    /// Called once per due tick.
    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()>;

    /// Support downcasting to concrete types.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Support downcasting to concrete types.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
