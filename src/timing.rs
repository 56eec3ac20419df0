// Cycle timing for diagnostics
//
// Caller-owned replacement for process-wide timer state: start a cycle,
// record its elapsed time, dump all samples as CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct CycleTimer {
    start: Option<Instant>,
    elapsed: Vec<f64>,
}

impl CycleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Record seconds since the last `start`; returns `None` if never started
    pub fn track(&mut self) -> Option<f64> {
        let secs = self.start?.elapsed().as_secs_f64();
        self.elapsed.push(secs);
        Some(secs)
    }

    pub fn samples(&self) -> &[f64] {
        &self.elapsed
    }

    /// One value per line
    pub fn write_csv(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for value in &self.elapsed {
            writeln!(out, "{}", value)?;
        }
        out.flush()
    }
}
