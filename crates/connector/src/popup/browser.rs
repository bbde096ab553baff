// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};

use crate::popup::{PopupHandle, PopupLauncher};

/// Launches popups by running a shell command.
///
/// The URL, title and size reach the command through `CONNECTOR_POPUP_*`
/// environment variables and are never interpolated into the shell string.
/// The popup counts as open for as long as the child process runs.
pub struct BrowserLauncher {
    shell: String,
    command: String,
    width: u32,
    height: u32,
}

impl BrowserLauncher {
    pub fn new(command: impl Into<String>, width: u32, height: u32) -> Self {
        Self { shell: "sh".to_owned(), command: command.into(), width, height }
    }

    /// Override the interpreter used to run the command (default `sh`).
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }
}

impl PopupLauncher for BrowserLauncher {
    fn launch(&self, url: &str, title: &str) -> Option<Box<dyn PopupHandle>> {
        let mut cmd = Command::new(&self.shell);
        cmd.args(["-c", &self.command]);
        cmd.env("CONNECTOR_POPUP_URL", url);
        cmd.env("CONNECTOR_POPUP_TITLE", title);
        cmd.env("CONNECTOR_POPUP_WIDTH", self.width.to_string());
        cmd.env("CONNECTOR_POPUP_HEIGHT", self.height.to_string());
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);

        match cmd.spawn() {
            Ok(child) => {
                tracing::debug!(title, pid = child.id(), "popup launched");
                Some(Box::new(BrowserWindow { child, exit: None }))
            }
            Err(e) => {
                tracing::warn!(title, err = %e, "failed to spawn popup command");
                None
            }
        }
    }
}

struct BrowserWindow {
    child: Child,
    exit: Option<ExitStatus>,
}

impl PopupHandle for BrowserWindow {
    fn is_closed(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => false,
            Ok(Some(status)) => {
                self.exit = Some(status);
                true
            }
            Err(e) => {
                tracing::debug!(err = %e, "popup status unavailable");
                true
            }
        }
    }

    /// A command that exits unsuccessfully (127 for a missing browser)
    /// never showed the consent screen.
    fn failed_to_open(&self) -> bool {
        self.exit.is_some_and(|status| !status.success())
    }

    fn close(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(err = %e, "popup already gone");
        }
    }
}

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;
