// Host integration side channel
// An embedding host (e.g. an in-app browser shell) may consume readiness
// and theming signals; without one the channel is a no-op.

/// Outbound signals to an embedding host. Every method defaults to a
/// no-op so a bare front end can ignore the channel entirely.
pub trait HostBridge: Send + Sync {
    fn ready(&self) {}
    fn expand(&self) {}
    fn set_theme(&self, _header: &str, _background: &str) {}
}

/// Bridge used when no embedding host is present
pub struct NullHost;

impl HostBridge for NullHost {}

/// Header color announced to the host
pub const HEADER_COLOR: &str = "#ffffff";

/// Background color announced to the host
pub const BACKGROUND_COLOR: &str = "#f5f5f5";

/// Signal readiness to the host. Fired once, after the initial task load
/// has completed.
pub fn announce_ready(host: &dyn HostBridge) {
    host.ready();
    host.expand();
    host.set_theme(HEADER_COLOR, BACKGROUND_COLOR);
}
