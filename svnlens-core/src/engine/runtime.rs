//! Process-wide engine runtime
//!
//! The runtime is initialized once, on the first repository handle, and lives
//! until the process exits. Every open handle holds a [`RuntimeGuard`] so the
//! number of live handles can be observed.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

struct EngineRuntime {
    live_handles: AtomicUsize,
}

static RUNTIME: OnceLock<EngineRuntime> = OnceLock::new();

fn runtime() -> &'static EngineRuntime {
    RUNTIME.get_or_init(|| {
        tracing::info!("Engine runtime initialized");
        EngineRuntime {
            live_handles: AtomicUsize::new(0),
        }
    })
}

/// Keeps the runtime accounted as in use; released on drop
#[derive(Debug)]
pub struct RuntimeGuard {
    _private: (),
}

impl RuntimeGuard {
    /// Initialize the runtime if needed and register one more live handle
    pub fn acquire() -> Self {
        let count = runtime().live_handles.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(live_handles = count, "Runtime guard acquired");
        Self { _private: () }
    }
}

impl Drop for RuntimeGuard {
    fn drop(&mut self) {
        let count = runtime().live_handles.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!(live_handles = count, "Runtime guard released");
    }
}

/// Whether any handle has initialized the runtime in this process
pub fn is_initialized() -> bool {
    RUNTIME.get().is_some()
}

/// Number of repository handles currently holding the runtime
pub fn live_handles() -> usize {
    RUNTIME
        .get()
        .map(|rt| rt.live_handles.load(Ordering::SeqCst))
        .unwrap_or(0)
}
