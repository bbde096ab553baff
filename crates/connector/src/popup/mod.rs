// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Popup browsing contexts for the authorization handshake.

pub mod browser;
pub mod closure;

/// A live popup. It can only report whether it is closed and be asked to close.
pub trait PopupHandle: Send {
    fn is_closed(&mut self) -> bool;

    /// Whether a closed popup never came up, e.g. the browser command
    /// failed. Only consulted after [`Self::is_closed`] returned true.
    fn failed_to_open(&self) -> bool {
        false
    }

    fn close(&mut self);
}

/// Opens a popup at a URL. `None` means the popup was blocked.
pub trait PopupLauncher: Send + Sync {
    fn launch(&self, url: &str, title: &str) -> Option<Box<dyn PopupHandle>>;
}
