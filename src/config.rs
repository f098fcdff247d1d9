// SPDX-License-Identifier: MIT OR Apache-2.0

use tokio::time::Duration;

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration parameters for session resolution.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Maximum time to wait for a single role lookup before falling back to the default role.
    ///
    /// Default: 5 seconds.
    pub(crate) resolve_timeout: Duration,
}

impl ResolverConfig {
    /// Return a default instance of `ResolverConfig`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Define the maximum time to wait for a single role lookup.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            resolve_timeout: RESOLVE_TIMEOUT,
        }
    }
}
