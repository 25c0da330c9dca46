//! Output gating for CLI commands

/// Verbosity selected by the global `--verbose` / `--quiet` flags.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Errors only
    Quiet,
    /// Default output
    Normal,
    /// Extra detail: validation reports, step-budget derivations
    Verbose,
}

impl LogLevel {
    /// Whether a message gated at `required` should be printed.
    pub fn allows(self, required: LogLevel) -> bool {
        self != LogLevel::Quiet && (self == required || required == LogLevel::Normal)
    }
}

/// Print a message when the selected level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level.allows(required) {
        println!("{msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_suppresses_everything() {
        assert!(!LogLevel::Quiet.allows(LogLevel::Normal));
        assert!(!LogLevel::Quiet.allows(LogLevel::Verbose));
        assert!(!LogLevel::Quiet.allows(LogLevel::Quiet));
    }

    #[test]
    fn normal_passes_normal_but_not_verbose() {
        assert!(LogLevel::Normal.allows(LogLevel::Normal));
        assert!(!LogLevel::Normal.allows(LogLevel::Verbose));
    }

    #[test]
    fn verbose_passes_both() {
        assert!(LogLevel::Verbose.allows(LogLevel::Normal));
        assert!(LogLevel::Verbose.allows(LogLevel::Verbose));
    }
}
