use ferroscreen_core::ProgressSink;

/// Writes progress and status lines to stderr so stdout stays machine-readable.
#[derive(Debug, Clone, Copy)]
pub struct TerminalProgress {
    quiet: bool,
}

impl TerminalProgress {
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressSink for TerminalProgress {
    fn on_progress(&self, fraction: f64) {
        if self.quiet {
            return;
        }
        eprintln!("{}", progress_bar(fraction));
    }

    fn on_status(&self, text: &str) {
        if !self.quiet {
            eprintln!("{text}");
        }
    }
}

const BAR_WIDTH: usize = 20;

fn progress_bar(fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        (fraction * 100.0).round() as u32
    )
}
