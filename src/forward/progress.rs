//! Byte counter and spinner, owned by one relay invocation.

use std::io::Write;

const GLYPHS: [char; 4] = ['|', '/', '-', '\\'];

/// Cumulative byte count plus a 4-phase rotating glyph.
///
/// Rendering overwrites the current stdout line with `\r`; log output goes
/// to stderr so the two never interleave.
#[derive(Debug)]
pub struct Progress {
    total: u64,
    phase: usize,
    render: bool,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            total: 0,
            phase: 0,
            render: true,
        }
    }

    /// A counter that never writes to stdout. Used by tests.
    pub fn disabled() -> Self {
        Self {
            total: 0,
            phase: 0,
            render: false,
        }
    }

    /// Total bytes moved in both directions since the last reset.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Zero the counter at the start of a relay invocation.
    pub fn reset(&mut self) {
        self.total = 0;
        self.render_tunneled();
    }

    /// Account for `n` bytes moved and refresh the indicator.
    pub fn add(&mut self, n: usize) {
        self.total += n as u64;
        self.render_tunneled();
    }

    /// Advance the spinner without changing the total.
    pub fn tick(&mut self) {
        self.render_tunneled();
    }

    /// Render the waiting-for-connection line, once per poll iteration.
    pub fn waiting(&mut self, port: u16) {
        let glyph = self.spin();
        if self.render {
            print!("\r{} Waiting for connection on port {}... ", glyph, port);
            let _ = std::io::stdout().flush();
        }
    }

    fn render_tunneled(&mut self) {
        let glyph = self.spin();
        if self.render {
            print!("\r{} Tunneled {} bytes...", glyph, self.total);
            let _ = std::io::stdout().flush();
        }
    }

    fn spin(&mut self) -> char {
        self.phase = (self.phase + 1) % GLYPHS.len();
        GLYPHS[self.phase]
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_bytes() {
        let mut progress = Progress::disabled();
        progress.reset();
        progress.add(10);
        progress.add(8);
        assert_eq!(progress.total(), 18);
    }

    #[test]
    fn reset_zeroes_the_total() {
        let mut progress = Progress::disabled();
        progress.add(512);
        progress.reset();
        assert_eq!(progress.total(), 0);
    }

    #[test]
    fn spinner_cycles_through_four_phases() {
        let mut progress = Progress::disabled();
        let first: Vec<char> = (0..4).map(|_| progress.spin()).collect();
        let second: Vec<char> = (0..4).map(|_| progress.spin()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), GLYPHS.len());
    }

    #[test]
    fn tick_does_not_change_the_total() {
        let mut progress = Progress::disabled();
        progress.add(7);
        progress.tick();
        assert_eq!(progress.total(), 7);
    }
}
