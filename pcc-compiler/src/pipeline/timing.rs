//! Per-phase timing reports.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Instant,
};

use eyre::Result;

use super::{CompilationContext, Plugin};

/// Reports how long each phase took to the compiler output.
#[derive(Debug, Default)]
pub struct TimingPlugin {
    start_times: Mutex<HashMap<String, Instant>>,
}

impl TimingPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for TimingPlugin {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn on_before_phase(&self, phase: &str, _ctx: &mut CompilationContext<'_>) -> Result<()> {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(phase.to_string(), Instant::now());
        Ok(())
    }

    fn on_after_phase(&self, phase: &str, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let start = self
            .start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(phase);
        if let Some(start) = start {
            let elapsed = start.elapsed();
            ctx.progress(&format!("{}: {:.3}s", phase, elapsed.as_secs_f64()));
        }
        Ok(())
    }
}
