//! Control-byte protocol for terminal raw mode.
//!
//! In raw mode the terminal stops interpreting ^C, ^\ and friends, so the
//! supervisor receives them as plain bytes. A fixed table maps those bytes to
//! supervisor commands; every other byte is data for the child.
//!
//! | Byte | Key          | Command                                        |
//! |------|--------------|------------------------------------------------|
//! | 3    | `^C`         | SIGINT to child; repeat within 1s to shut down |
//! | 18   | `^R`         | Restart the child                              |
//! | 20   | `^T`         | SIGTERM to child; repeat within 1s to shut down|
//! | 28   | `^\`         | SIGQUIT to child; repeat within 1s to shut down|
//! | 31   | `^-` / `^?`  | Print the current command                      |
//! | 8    | `^H`         | Print hotkey help                              |
//! | 127  | `^H` (macOS) | Print hotkey help                              |

use std::time::Duration;

use crate::signal::KillSignal;

/// ^C
pub const CODE_INTERRUPT: u8 = 3;
/// ^H
pub const CODE_PRINT_HELP: u8 = 8;
/// ^R
pub const CODE_RESTART: u8 = 18;
/// ^T
pub const CODE_STOP: u8 = 20;
/// ^\
pub const CODE_QUIT: u8 = 28;
/// ^- or ^?
pub const CODE_PRINT_COMMAND: u8 = 31;
/// ^H on macOS terminals (ASCII DEL)
pub const CODE_PRINT_HELP_MACOS: u8 = 127;

/// Window within which a repeated signal hotkey escalates to shutdown.
pub const DOUBLE_PRESS_WINDOW: Duration = Duration::from_secs(1);

pub const HOTKEY_HELP: &str = "Control codes / hotkeys:

    3     ^C          Kill subprocess with SIGINT. Repeat within 1s to kill rewatch.
    18    ^R          Kill subprocess with SIGTERM, restart.
    20    ^T          Kill subprocess with SIGTERM. Repeat within 1s to kill rewatch.
    28    ^\\          Kill subprocess with SIGQUIT. Repeat within 1s to kill rewatch.
    31    ^- or ^?    Print currently running command.
    8     ^H          Print this help.
    127   ^H (macOS)  Print this help.";

/// A supervisor command encoded by a single control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Interrupt,
    Quit,
    Restart,
    Stop,
    PrintCommand,
    PrintHelp,
}

impl ControlCommand {
    /// Looks up a byte in the control table.
    ///
    /// Returns `None` for data bytes, which are forwarded to the child.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CODE_INTERRUPT => Some(ControlCommand::Interrupt),
            CODE_QUIT => Some(ControlCommand::Quit),
            CODE_RESTART => Some(ControlCommand::Restart),
            CODE_STOP => Some(ControlCommand::Stop),
            CODE_PRINT_COMMAND => Some(ControlCommand::PrintCommand),
            CODE_PRINT_HELP | CODE_PRINT_HELP_MACOS => Some(ControlCommand::PrintHelp),
            _ => None,
        }
    }

    /// The signal a signal-class command sends to the child.
    ///
    /// Only these commands take part in double-press escalation.
    #[must_use]
    pub fn kill_signal(self) -> Option<KillSignal> {
        match self {
            ControlCommand::Interrupt => Some(KillSignal::Interrupt),
            ControlCommand::Quit => Some(KillSignal::Quit),
            ControlCommand::Stop => Some(KillSignal::Terminate),
            _ => None,
        }
    }

    /// Caret notation for log messages.
    #[must_use]
    pub fn caret(self) -> &'static str {
        match self {
            ControlCommand::Interrupt => "^C",
            ControlCommand::Quit => "^\\",
            ControlCommand::Restart => "^R",
            ControlCommand::Stop => "^T",
            ControlCommand::PrintCommand => "^-",
            ControlCommand::PrintHelp => "^H",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup() {
        assert_eq!(ControlCommand::from_byte(3), Some(ControlCommand::Interrupt));
        assert_eq!(ControlCommand::from_byte(28), Some(ControlCommand::Quit));
        assert_eq!(ControlCommand::from_byte(18), Some(ControlCommand::Restart));
        assert_eq!(ControlCommand::from_byte(20), Some(ControlCommand::Stop));
        assert_eq!(ControlCommand::from_byte(31), Some(ControlCommand::PrintCommand));
        assert_eq!(ControlCommand::from_byte(8), Some(ControlCommand::PrintHelp));
        assert_eq!(ControlCommand::from_byte(127), Some(ControlCommand::PrintHelp));
    }

    #[test]
    fn test_data_bytes_are_not_commands() {
        let table = [3u8, 8, 18, 20, 28, 31, 127];
        for byte in 0..=u8::MAX {
            if !table.contains(&byte) {
                assert_eq!(ControlCommand::from_byte(byte), None, "byte {byte}");
            }
        }
    }

    #[test]
    fn test_only_signal_commands_carry_a_signal() {
        assert_eq!(ControlCommand::Stop.kill_signal(), Some(KillSignal::Terminate));
        assert_eq!(ControlCommand::Restart.kill_signal(), None);
        assert_eq!(ControlCommand::PrintHelp.kill_signal(), None);
    }
}
