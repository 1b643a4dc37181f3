//! Keyboard controls read from stdin.
//!
//! Commands are line-based so they work in any terminal without raw mode:
//! type a key and press Enter.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::driver::{Control, DriverHandle};

/// What a bare Enter means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMap {
    /// Enter toggles pause.
    Timer,
    /// Enter records a lap.
    Stopwatch,
}

impl KeyMap {
    /// One-line help shown before a run.
    #[must_use]
    pub const fn help(self) -> &'static str {
        match self {
            Self::Timer => "controls: Enter/p pause-resume, r restart, q quit",
            Self::Stopwatch => "controls: Enter/l lap, p start-stop, r restart, q quit",
        }
    }
}

/// Maps one input line to a control request.
#[must_use]
pub fn parse_command(line: &str, keymap: KeyMap) -> Option<Control> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Some(match keymap {
            KeyMap::Timer => Control::TogglePause,
            KeyMap::Stopwatch => Control::Lap,
        }),
        "p" | "pause" | "space" => Some(Control::TogglePause),
        "l" | "lap" => Some(Control::Lap),
        "r" | "restart" => Some(Control::Restart),
        "reset" => Some(Control::Reset),
        "q" | "quit" | "stop" | "x" => Some(Control::Stop),
        _ => None,
    }
}

/// Spawns a task forwarding stdin commands to the driver.
///
/// The task ends at end of input or once the driver is gone.
pub fn spawn(handle: DriverHandle, keymap: KeyMap) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_command(&line, keymap) {
                Some(control) => {
                    if !handle.send(control) {
                        break;
                    }
                }
                None => debug!(input = %line.trim(), "unknown command"),
            }
        }
        debug!("control input closed");
    })
}
