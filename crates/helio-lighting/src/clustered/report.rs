/// Caps how many times one kind of warning is logged by a grid.
///
/// Counters live on the grid instance, so two grids (split screen, say)
/// never silence each other.
#[derive(Debug, Clone)]
pub struct ReportLimiter {
    reported: u32,
    limit: u32,
}

pub const DEFAULT_REPORT_LIMIT: u32 = 5;

impl Default for ReportLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_LIMIT)
    }
}

impl ReportLimiter {
    pub fn new(limit: u32) -> Self {
        Self { reported: 0, limit }
    }

    /// Logs `message` as a warning unless the limit is used up.
    /// Returns whether it was logged.
    pub fn warn(&mut self, message: impl AsRef<str>) -> bool {
        if self.reported >= self.limit {
            return false;
        }
        self.reported += 1;
        if self.reported == self.limit {
            log::warn!("{} Giving up on reporting it.", message.as_ref());
        } else {
            log::warn!("{}", message.as_ref());
        }
        true
    }

    pub fn reported(&self) -> u32 {
        self.reported
    }

    pub fn exhausted(&self) -> bool {
        self.reported >= self.limit
    }
}
