// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navigation signals emitted by the session manager and route gate.

use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Move the client to this destination.
    Navigate(String),
    /// Path to return to once the visitor has authenticated.
    RememberReturnPath(String),
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &str);

    fn remember_return_path(&self, path: &str);
}

/// Forwards navigation signals over an unbounded channel to the host.
#[derive(Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Navigation>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Navigation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, navigation: Navigation) {
        if self.tx.send(navigation).is_err() {
            tracing::debug!("Navigation receiver dropped, signal discarded");
        }
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, destination: &str) {
        self.send(Navigation::Navigate(destination.to_string()));
    }

    fn remember_return_path(&self, path: &str) {
        self.send(Navigation::RememberReturnPath(path.to_string()));
    }
}
