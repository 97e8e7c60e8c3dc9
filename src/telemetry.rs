//! Process-wide logger setup and the per-service logging context.

use env_logger::Env;

/// Log target handed to a component at construction. Components log through
/// it rather than the module path, so output is grouped by service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogContext {
    target: &'static str,
}

impl LogContext {
    pub const fn new(target: &'static str) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }
}

pub const PRODUCTS: LogContext = LogContext::new("products.service");
pub const ORDERS: LogContext = LogContext::new("orders.service");
pub const GATEWAY: LogContext = LogContext::new("gateway");
pub const OUTBOX: LogContext = LogContext::new("outbox.relay");

/// Flushes the global logger when dropped. Keep it alive for the life of
/// the process.
#[must_use = "dropping the guard flushes and ends the logging lifecycle"]
pub struct LogGuard(());

impl Drop for LogGuard {
    fn drop(&mut self) {
        log::logger().flush();
    }
}

/// Install the global logger. `RUST_LOG` overrides the `info` default.
/// Only the first call in a process installs anything.
pub fn init() -> LogGuard {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
    LogGuard(())
}
