/// Wall-clock timer for request timing. `std::time::Instant` is unavailable on wasm32, so the
/// browser clock is used there.
pub struct PerfTimer {
    started_ms: f64,
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    use once_cell::sync::Lazy;
    use std::time::Instant;

    static ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);
    ORIGIN.elapsed().as_secs_f64() * 1000.0
}

impl PerfTimer {
    pub fn start() -> Self {
        Self {
            started_ms: now_ms(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        (now_ms() - self.started_ms).max(0.0).round() as u64
    }

    #[inline]
    pub fn log(&self, scope: &str, details: &str) {
        let elapsed_ms = self.elapsed_ms();
        if details.trim().is_empty() {
            tracing::debug!(scope, elapsed_ms, "[perf]");
        } else {
            tracing::debug!(scope, elapsed_ms, details, "[perf]");
        }
    }
}
