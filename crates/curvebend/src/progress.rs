/// A sink for the fraction of work done by a long running bend.
pub trait Progress {
    /// Announce a new task.
    fn init(&mut self, _label: &str) {}

    /// Report the completed fraction, in `[0, 1]`.
    fn update(&mut self, fraction: f64);
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&mut self, _fraction: f64) {}
}

/// Logs progress at debug level in steps of ten percent.
#[derive(Debug, Default, Clone)]
pub struct LogProgress {
    label: String,
    last_decile: Option<u32>,
}

impl Progress for LogProgress {
    fn init(&mut self, label: &str) {
        self.label = label.to_string();
        self.last_decile = None;
    }

    fn update(&mut self, fraction: f64) {
        let decile = (fraction.clamp(0.0, 1.0) * 10.0) as u32;
        if self.last_decile != Some(decile) {
            self.last_decile = Some(decile);
            log::debug!("{}: {}%", self.label, decile * 10);
        }
    }
}

/// Forwards every report to a closure.
pub struct FnProgress<F: FnMut(f64)>(pub F);

impl<F: FnMut(f64)> Progress for FnProgress<F> {
    fn update(&mut self, fraction: f64) {
        (self.0)(fraction)
    }
}
