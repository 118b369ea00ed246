/// Milliseconds since the UNIX epoch
pub fn timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Wall-clock time spent painting, excluding paused stretches.
///
/// Times are passed in explicitly so callers choose the time source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    started_at: u64,
    paused_at: Option<u64>,
    paused_total: u64,
}

impl SessionClock {
    pub fn start(now_ms: u64) -> Self {
        Self {
            started_at: now_ms,
            paused_at: None,
            paused_total: 0,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Pausing an already paused clock keeps the first pause time.
    pub fn pause(&mut self, now_ms: u64) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now_ms);
        }
    }

    pub fn resume(&mut self, now_ms: u64) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now_ms.saturating_sub(paused_at);
        }
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let end = self.paused_at.unwrap_or(now_ms);
        end.saturating_sub(self.started_at).saturating_sub(self.paused_total)
    }

    pub fn elapsed_secs(&self, now_ms: u64) -> u64 {
        self.elapsed_ms(now_ms) / 1000
    }
}
