//! Proxy representation and status.

use std::time::Instant;
use url::Url;

/// Status of a proxy within the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStatus {
    /// The proxy is available for acquisition.
    Free,
    /// The proxy is held by a caller.
    Busy,
    /// The proxy is held by a caller and scheduled to be released later.
    Deferred,
    /// The proxy is banned and will never be selected.
    Banned,
}

/// A proxy tracked by the pool.
///
/// Entries carry no synchronization of their own; the pool mutates them while holding
/// its write lock.
#[derive(Debug, Clone)]
pub struct Proxy {
    /// The address of the proxy (e.g. "socks5://127.0.0.1:1080").
    url: Url,
    banned: bool,
    ban_reason: String,
    busy: bool,
    /// When set, the proxy is released by the first sweep at or after this instant.
    defer_until: Option<Instant>,
}

impl Proxy {
    /// Create a new free proxy for the given address.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            banned: false,
            ban_reason: String::new(),
            busy: false,
            defer_until: None,
        }
    }

    /// The address of this proxy.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The canonical string form of the address, used as the pool key.
    pub fn key(&self) -> &str {
        self.url.as_str()
    }

    /// Reason recorded by the last ban, empty when not banned.
    pub fn ban_reason(&self) -> &str {
        &self.ban_reason
    }

    /// Current state of the proxy.
    pub fn status(&self) -> ProxyStatus {
        if self.banned {
            ProxyStatus::Banned
        } else if self.is_deferred() {
            ProxyStatus::Deferred
        } else if self.busy {
            ProxyStatus::Busy
        } else {
            ProxyStatus::Free
        }
    }

    /// Selectable: neither busy nor banned.
    pub fn is_free(&self) -> bool {
        !self.banned && !self.busy
    }

    /// Held by a caller. Banned proxies are not counted here.
    pub fn is_busy(&self) -> bool {
        self.busy && !self.banned
    }

    /// Banned and out of rotation.
    pub fn is_banned(&self) -> bool {
        self.banned
    }

    /// Raw busy flag, which stays set on banned proxies.
    pub(crate) fn busy_flag(&self) -> bool {
        self.busy
    }

    /// Held with a release scheduled.
    pub fn is_deferred(&self) -> bool {
        self.is_busy() && self.defer_until.is_some()
    }

    /// Whether a scheduled release has come due at `now`.
    pub(crate) fn is_due(&self, now: Instant) -> bool {
        self.is_busy() && self.defer_until.is_some_and(|at| at <= now)
    }

    pub(crate) fn acquire(&mut self) {
        self.busy = true;
    }

    pub(crate) fn release(&mut self) {
        self.busy = false;
        self.defer_until = None;
    }

    /// Schedule a release. Ignored unless the proxy is busy.
    ///
    /// `None` drops any pending deadline and keeps the proxy held until released.
    pub(crate) fn defer_release(&mut self, at: Option<Instant>) {
        if self.is_busy() {
            self.defer_until = at;
        }
    }

    /// Ban the proxy. A ban always marks it busy and drops any scheduled release.
    pub(crate) fn ban(&mut self, reason: impl Into<String>) {
        self.banned = true;
        self.busy = true;
        self.ban_reason = reason.into();
        self.defer_until = None;
    }

    /// Lift a ban. The busy flag is left for the release path to clear.
    pub(crate) fn unban(&mut self) {
        self.banned = false;
        self.ban_reason.clear();
    }

    /// Convert the proxy address to a reqwest::Proxy.
    pub fn to_reqwest_proxy(&self) -> Result<reqwest::Proxy, reqwest::Error> {
        reqwest::Proxy::all(self.url.as_str())
    }
}
