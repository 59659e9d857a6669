//! Navigation capability injected into the identity controller.
//!
//! The controller never talks to a UI directly; it asks a [`Navigator`] to go
//! somewhere and whatever front-end is attached decides how to render it.

use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::{debug, info};

/// Route segment of the login screen.
pub const LOGIN_ROUTE: &str = "login";

pub trait Navigator: Send + Sync {
    /// Navigate to the route made of `path` segments, e.g. `&["login"]`.
    fn navigate(&self, path: &[&str]);

    fn navigate_to_login(&self) {
        self.navigate(&[LOGIN_ROUTE]);
    }
}

/// Publishes every navigation request on a broadcast channel.
///
/// A UI layer subscribes and performs the actual route change. Requests made
/// while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: broadcast::Sender<Vec<String>>,
}

impl ChannelNavigator {
    pub fn new() -> Self {
        // Navigation is rare; a small buffer is plenty for a lagging listener.
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Vec<String>> {
        self.tx.subscribe()
    }
}

impl Default for ChannelNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, path: &[&str]) {
        let route: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        if self.tx.send(route).is_err() {
            debug!("No navigation listener for /{}", path.join("/"));
        }
    }
}

/// Keeps every route it was asked to navigate to.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Vec<String>> {
        self.routes
            .lock()
            .map(|routes| routes.clone())
            .unwrap_or_default()
    }

    /// How many times navigation to exactly `path` was requested.
    pub fn count(&self, path: &[&str]) -> usize {
        self.routes().iter().filter(|r| r.as_slice() == path).count()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &[&str]) {
        info!("Navigate to /{}", path.join("/"));
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(path.iter().map(|s| s.to_string()).collect());
        }
    }
}
