use owo_colors::Style;
use std::sync::OnceLock;

/// Whether stdout and stderr accept colors, detected once per process
static COLOR_STREAMS: OnceLock<(bool, bool)> = OnceLock::new();

/// Kind of CLI output line, each with its own color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Header,
    Success,
    Error,
    Warn,
    Info,
    Dim,
}

impl Tone {
    /// Errors and warnings go to stderr, everything else to stdout
    pub fn on_stderr(self) -> bool {
        matches!(self, Tone::Error | Tone::Warn)
    }

    pub fn colored(self) -> Style {
        match self {
            Tone::Header => Style::new().cyan().bold(),
            Tone::Success => Style::new().green().bold(),
            Tone::Error => Style::new().red().bold(),
            Tone::Warn => Style::new().yellow().bold(),
            Tone::Info => Style::new().magenta(),
            Tone::Dim => Style::new().white().dimmed(),
        }
    }
}

fn color_streams() -> (bool, bool) {
    *COLOR_STREAMS.get_or_init(|| {
        (
            console::Term::stdout().is_term() && console::colors_enabled(),
            console::Term::stderr().is_term() && console::colors_enabled_stderr(),
        )
    })
}

/// Style for `tone`; plain when its stream is piped or colors are disabled
pub fn style(tone: Tone) -> Style {
    let (stdout, stderr) = color_streams();
    let enabled = if tone.on_stderr() { stderr } else { stdout };
    if enabled {
        tone.colored()
    } else {
        Style::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_diagnostics_use_stderr() {
        assert!(Tone::Error.on_stderr());
        assert!(Tone::Warn.on_stderr());
        assert!(!Tone::Header.on_stderr());
        assert!(!Tone::Dim.on_stderr());
    }

    #[test]
    fn test_tones_are_distinct() {
        use owo_colors::OwoColorize;

        let paint = |tone: Tone| format!("{}", "x".style(tone.colored()));
        assert_ne!(paint(Tone::Error), paint(Tone::Warn));
        assert_ne!(paint(Tone::Success), "x");
    }
}
