//! Engine lifecycle hooks.

use portico_core::{BoxError, Context};
use std::fmt;

/// The point in the engine lifecycle at which a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// Before any plugin or device starts.
    BeforeStart,
    /// After every device has started.
    AfterStart,
    /// Before devices are stopped.
    BeforeStop,
    /// After every device has stopped.
    AfterStop,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecyclePhase::BeforeStart => "before-start",
            LifecyclePhase::AfterStart => "after-start",
            LifecyclePhase::BeforeStop => "before-stop",
            LifecyclePhase::AfterStop => "after-stop",
        };
        f.write_str(name)
    }
}

/// A lifecycle callback.
pub type LifecycleHook = Box<dyn Fn(&Context) -> Result<(), BoxError> + Send + Sync>;

/// Hooks grouped by phase, each group in registration order.
#[derive(Default)]
pub(crate) struct LifecycleHooks {
    before_start: Vec<LifecycleHook>,
    after_start: Vec<LifecycleHook>,
    before_stop: Vec<LifecycleHook>,
    after_stop: Vec<LifecycleHook>,
}

impl LifecycleHooks {
    pub(crate) fn push(&mut self, phase: LifecyclePhase, hook: LifecycleHook) {
        self.phase_mut(phase).push(hook);
    }

    pub(crate) fn phase(&self, phase: LifecyclePhase) -> &[LifecycleHook] {
        match phase {
            LifecyclePhase::BeforeStart => &self.before_start,
            LifecyclePhase::AfterStart => &self.after_start,
            LifecyclePhase::BeforeStop => &self.before_stop,
            LifecyclePhase::AfterStop => &self.after_stop,
        }
    }

    fn phase_mut(&mut self, phase: LifecyclePhase) -> &mut Vec<LifecycleHook> {
        match phase {
            LifecyclePhase::BeforeStart => &mut self.before_start,
            LifecyclePhase::AfterStart => &mut self.after_start,
            LifecyclePhase::BeforeStop => &mut self.before_stop,
            LifecyclePhase::AfterStop => &mut self.after_stop,
        }
    }

    /// Run one phase in order, stopping at the first failure.
    pub(crate) fn run(&self, phase: LifecyclePhase, ctx: &Context) -> Result<(), BoxError> {
        for hook in self.phase(phase) {
            hook(ctx)?;
        }
        Ok(())
    }
}
