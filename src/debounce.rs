/// A single-deadline debouncer driven by caller timestamps.
///
/// Scheduling while a deadline is pending replaces it, so a burst of requests fires once,
/// `delay_ms` after the last one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Debouncer {
    delay_ms: u64,
    deadline: Option<u64>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            deadline: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn set_delay_ms(&mut self, delay_ms: u64) {
        self.delay_ms = delay_ms;
    }

    pub fn schedule(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(self.delay_ms));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Returns `true` exactly once when the deadline has passed.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;

    #[test]
    fn rescheduling_replaces_the_deadline() {
        let mut d = Debouncer::new(100);
        d.schedule(0);
        d.schedule(60);
        assert!(!d.poll(100));
        assert_eq!(d.deadline(), Some(160));
        assert!(d.poll(160));
        assert!(!d.poll(500));
        assert!(!d.is_pending());
    }

    #[test]
    fn cancel_drops_the_pending_fire() {
        let mut d = Debouncer::new(10);
        d.schedule(0);
        d.cancel();
        assert!(!d.poll(1_000));
    }
}
