use std::fmt::Write;
use std::time::{Duration, Instant};

/// Run a function and measure its execution time.
///
/// # Returns
///
/// A tuple of (result, elapsed_time)
pub fn time_fn<F, R>(f: F) -> (R, Duration)
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    (result, elapsed)
}

/// Wall-clock time of each named pipeline stage, in execution order.
#[derive(Debug, Default)]
pub struct StageTimings {
    stages: Vec<(String, Duration)>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` and record its duration under `name`.
    pub fn time<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let (result, elapsed) = time_fn(f);
        self.stages.push((name.to_string(), elapsed));
        result
    }

    pub fn stages(&self) -> &[(String, Duration)] {
        &self.stages
    }

    pub fn total(&self) -> Duration {
        self.stages.iter().map(|(_, d)| *d).sum()
    }

    /// Aligned table of stage times in milliseconds.
    pub fn report(&self) -> String {
        let width = self
            .stages
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max("total".len());

        let mut out = String::new();
        for (name, elapsed) in &self.stages {
            let _ = writeln!(
                out,
                "{:<width$}  {:>10.3} ms",
                name,
                elapsed.as_secs_f64() * 1000.0,
                width = width
            );
        }
        let _ = writeln!(
            out,
            "{:<width$}  {:>10.3} ms",
            "total",
            self.total().as_secs_f64() * 1000.0,
            width = width
        );
        out
    }
}
