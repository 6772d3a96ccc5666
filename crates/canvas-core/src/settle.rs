use crate::tier::SettleParams;

/// One observation fed to the [`SettleDetector`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub scale: f64,
    pub document_height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleVerdict {
    /// Two consecutive measurements agreed; stop re-running.
    Stable,
    /// Measure again after `delay_ms`.
    Retry { delay_ms: u32 },
    /// `max_retries` reached without agreement.
    GaveUp,
}

/// Decides when start-up re-runs can stop: once fonts and images have
/// settled, two passes a short interval apart produce the same layout.
#[derive(Clone, Debug)]
pub struct SettleDetector {
    params: SettleParams,
    last: Option<Measurement>,
    attempts: u32,
    done: bool,
}

impl SettleDetector {
    pub fn new(params: SettleParams) -> Self {
        Self {
            params,
            last: None,
            attempts: 0,
            done: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn agrees(&self, a: &Measurement, b: &Measurement) -> bool {
        (a.scale - b.scale).abs() <= 1e-9
            && (a.document_height - b.document_height).abs() <= self.params.tolerance_px
    }

    pub fn observe(&mut self, m: Measurement) -> SettleVerdict {
        if self.done {
            return SettleVerdict::Stable;
        }
        self.attempts += 1;
        let stable = self.last.as_ref().is_some_and(|prev| self.agrees(prev, &m));
        self.last = Some(m);
        if stable {
            self.done = true;
            return SettleVerdict::Stable;
        }
        if self.attempts >= self.params.max_retries {
            self.done = true;
            return SettleVerdict::GaveUp;
        }
        SettleVerdict::Retry {
            delay_ms: self.params.interval_ms,
        }
    }

    /// A pass that produced no measurement: counts as an attempt and breaks
    /// any agreement streak.
    pub fn observe_failure(&mut self) -> SettleVerdict {
        if self.done {
            return SettleVerdict::Stable;
        }
        self.attempts += 1;
        self.last = None;
        if self.attempts >= self.params.max_retries {
            self.done = true;
            return SettleVerdict::GaveUp;
        }
        SettleVerdict::Retry {
            delay_ms: self.params.interval_ms,
        }
    }
}
