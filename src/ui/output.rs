//! Output verbosity.

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Show everything, including the commands being run.
    Verbose,
    /// Show stage status lines.
    #[default]
    Normal,
    /// Show spinners and final status only.
    Quiet,
    /// Show nothing except errors.
    Silent,
}

impl OutputMode {
    /// Pick a mode from the global `--verbose` / `--quiet` / `--silent` flags.
    pub fn from_flags(verbose: bool, quiet: bool, silent: bool) -> Self {
        if silent {
            Self::Silent
        } else if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Whether commands are echoed.
    pub fn shows_commands(&self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Whether progress spinners are shown.
    pub fn shows_spinners(&self) -> bool {
        matches!(self, Self::Verbose | Self::Normal | Self::Quiet)
    }

    /// Whether informational messages are shown.
    pub fn shows_messages(&self) -> bool {
        matches!(self, Self::Verbose | Self::Normal)
    }

    /// Whether success and warning lines are shown.
    pub fn shows_status(&self) -> bool {
        !matches!(self, Self::Silent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quieter_flags_win() {
        assert_eq!(OutputMode::from_flags(true, true, true), OutputMode::Silent);
        assert_eq!(OutputMode::from_flags(true, true, false), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(true, false, false), OutputMode::Verbose);
        assert_eq!(OutputMode::from_flags(false, false, false), OutputMode::Normal);
    }

    #[test]
    fn quiet_hides_messages_but_not_status() {
        assert!(!OutputMode::Quiet.shows_messages());
        assert!(OutputMode::Quiet.shows_status());
        assert!(!OutputMode::Silent.shows_status());
    }

    #[test]
    fn only_verbose_shows_commands() {
        assert!(OutputMode::Verbose.shows_commands());
        assert!(!OutputMode::Normal.shows_commands());
    }

    #[test]
    fn output_mode_default() {
        assert_eq!(OutputMode::default(), OutputMode::Normal);
    }
}
