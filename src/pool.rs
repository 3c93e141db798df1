//! Core proxy pool implementation.
//!
//! A [`ProxyPool`] tracks which proxies are free, held by a caller, scheduled for a
//! deferred release, or banned. The whole map sits behind one `RwLock`: queries take
//! it shared, anything that changes an entry takes it exclusively.
//!
//! Deferred releases are reclaimed lazily. `acquire`, `list`, `free_list`,
//! `busy_list`, `num_free`, `num_busy` and `get_stats` first release every proxy whose
//! deadline has passed; nothing runs in the background.

use crate::config::ProxyPoolConfig;
use crate::error::ProxyPoolError;
use crate::proxy::{Proxy, ProxyStatus};
use crate::utils;

use futures::future;
use log::{debug, info, warn};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use rand::seq::IndexedRandom;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Point-in-time counts of the pool's partitions.
///
/// `free + busy + banned == total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub total: usize,
    pub free: usize,
    pub busy: usize,
    pub banned: usize,
}

/// A pool of proxies handed out to one caller at a time.
pub struct ProxyPool {
    /// All proxies in the pool, keyed by the canonical form of their address.
    proxies: RwLock<HashMap<String, Proxy>>,
    /// Ceiling on simultaneously busy proxies, 0 for none.
    max_busy: AtomicUsize,
}

impl ProxyPool {
    /// Create a pool holding the given proxies, all free.
    pub fn new(proxies: impl IntoIterator<Item = Url>) -> Self {
        let pool = Self {
            proxies: RwLock::new(HashMap::new()),
            max_busy: AtomicUsize::new(0),
        };
        pool.add(proxies);
        pool
    }

    /// Create a pool from the inline proxies and busy ceiling of `config`.
    ///
    /// Sources are not fetched; see [`ProxyPool::load`].
    pub fn from_config(config: &ProxyPoolConfig) -> Result<Self, ProxyPoolError> {
        let proxies = config
            .proxies
            .iter()
            .map(|p| utils::parse_proxy(p, &config.default_scheme))
            .collect::<Result<Vec<_>, _>>()?;

        let pool = Self::new(proxies);
        pool.set_max_busy(config.max_busy);
        Ok(pool)
    }

    /// Create a pool from `config`, including every proxy its sources provide.
    ///
    /// Sources that fail to load are logged and skipped.
    pub async fn load(config: ProxyPoolConfig) -> Result<Arc<Self>, ProxyPoolError> {
        let pool = Self::from_config(&config)?;

        if !config.sources.is_empty() {
            info!("Loading proxy pool from {} sources", config.sources.len());
            let fetched = Self::fetch_all(&config.sources, &config.default_scheme).await;
            pool.add(fetched);
        }

        info!("Proxy pool ready with {} proxies", pool.len());
        Ok(Arc::new(pool))
    }

    /// Replace the pool's membership with the proxies currently listed by `sources`.
    ///
    /// Returns the number of proxies fetched. When no source yields anything the pool
    /// is left as it is.
    pub async fn refresh_from_sources(&self, sources: &[String], default_scheme: &str) -> usize {
        let fetched = Self::fetch_all(sources, default_scheme).await;
        if fetched.is_empty() {
            warn!(
                "No proxies fetched from {} sources, keeping current pool",
                sources.len()
            );
            return 0;
        }

        let count = fetched.len();
        self.replace(fetched);
        count
    }

    async fn fetch_all(sources: &[String], default_scheme: &str) -> HashSet<Url> {
        let results = future::join_all(
            sources
                .iter()
                .map(|source| utils::fetch_proxies_from_source(source, default_scheme)),
        )
        .await;

        let mut all_proxies = HashSet::new();
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(source_proxies) => {
                    info!("Fetched {} proxies from {}", source_proxies.len(), source);
                    all_proxies.extend(source_proxies);
                }
                Err(e) => {
                    warn!("Failed to fetch proxies from {}: {}", source, e);
                }
            }
        }
        all_proxies
    }

    /// Limit how many proxies may be busy at once. 0 removes the limit.
    pub fn set_max_busy(&self, max_busy: usize) {
        self.max_busy.store(max_busy, Ordering::Relaxed);
    }

    /// Current busy ceiling, 0 when unlimited.
    pub fn max_busy(&self) -> usize {
        self.max_busy.load(Ordering::Relaxed)
    }

    /// Number of proxies in the pool.
    pub fn len(&self) -> usize {
        self.proxies.read().len()
    }

    /// Whether the pool holds no proxies.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add proxies to the pool. Addresses already present keep their current state.
    pub fn add(&self, urls: impl IntoIterator<Item = Url>) {
        let mut proxies = self.proxies.write();
        for url in urls {
            if let Entry::Vacant(entry) = proxies.entry(url.as_str().to_owned()) {
                debug!("Adding proxy {}", url);
                entry.insert(Proxy::new(url));
            }
        }
    }

    /// Remove proxies from the pool, whatever their state.
    pub fn remove<'a>(&self, urls: impl IntoIterator<Item = &'a Url>) {
        let mut proxies = self.proxies.write();
        for url in urls {
            if proxies.remove(url.as_str()).is_some() {
                debug!("Removed proxy {}", url);
            }
        }
    }

    /// Whether the pool tracks `url`.
    pub fn contains(&self, url: &Url) -> bool {
        self.proxies.read().contains_key(url.as_str())
    }

    /// Make the pool hold exactly `urls`.
    ///
    /// Proxies already present are unbanned but otherwise keep their state, new ones
    /// start free, and every other proxy is dropped even if a caller still holds it.
    pub fn replace(&self, urls: impl IntoIterator<Item = Url>) {
        let mut proxies = self.proxies.write();
        let mut wanted = HashSet::new();

        for url in urls {
            let key = url.as_str().to_owned();
            match proxies.entry(key.clone()) {
                Entry::Occupied(mut entry) => entry.get_mut().unban(),
                Entry::Vacant(entry) => {
                    entry.insert(Proxy::new(url));
                }
            }
            wanted.insert(key);
        }

        let before = proxies.len();
        proxies.retain(|key, _| wanted.contains(key));
        info!(
            "Replaced proxy pool: {} proxies, {} dropped",
            proxies.len(),
            before - proxies.len()
        );
    }

    /// Remove every proxy.
    pub fn clear(&self) {
        self.proxies.write().clear();
    }

    /// Take a free proxy, chosen uniformly at random, and mark it busy.
    ///
    /// Returns `None` when no proxy is free or the busy ceiling has been reached. This
    /// never waits; callers poll with their own backoff.
    pub fn acquire(&self) -> Option<Url> {
        self.reclaim_deferred();
        let max_busy = self.max_busy();

        // Cheap shared-lock check before contending for the write lock.
        {
            let proxies = self.proxies.read();
            let stats = Self::stats_of(&proxies);
            if (max_busy > 0 && stats.busy >= max_busy) || stats.free == 0 {
                return None;
            }
        }

        // The state may have moved since the check above; this pass decides.
        let mut proxies = self.proxies.write();
        if max_busy > 0 && proxies.values().filter(|p| p.is_busy()).count() >= max_busy {
            return None;
        }

        let key = {
            let free: Vec<&str> = proxies
                .values()
                .filter(|p| p.is_free())
                .map(Proxy::key)
                .collect();
            (*free.choose(&mut rand::rng())?).to_owned()
        };

        let proxy = proxies.get_mut(&key)?;
        proxy.acquire();
        debug!("Acquired proxy {}", proxy.url());
        Some(proxy.url().clone())
    }

    /// Mark a proxy free again. Returns whether the pool knows the address.
    pub fn release(&self, url: &Url) -> bool {
        let mut proxies = self.proxies.write();
        match proxies.get_mut(url.as_str()) {
            Some(proxy) => {
                proxy.release();
                debug!("Released proxy {}", url);
                true
            }
            None => false,
        }
    }

    /// Schedule a busy proxy to become free once `delay` has elapsed.
    ///
    /// Has no effect on a proxy that is not busy. The release is applied by the next
    /// sweeping call after the deadline. A delay too large to represent keeps the
    /// proxy held until it is released explicitly. Returns whether the pool knows the
    /// address.
    pub fn defer_release(&self, url: &Url, delay: Duration) -> bool {
        let mut proxies = self.proxies.write();
        match proxies.get_mut(url.as_str()) {
            Some(proxy) => {
                proxy.defer_release(Instant::now().checked_add(delay));
                true
            }
            None => false,
        }
    }

    /// Ban a proxy. It stays out of rotation until unbanned and released.
    pub fn ban(&self, url: &Url, reason: impl Into<String>) -> bool {
        let mut proxies = self.proxies.write();
        match proxies.get_mut(url.as_str()) {
            Some(proxy) => {
                proxy.ban(reason);
                debug!("Banned proxy {}: {}", url, proxy.ban_reason());
                true
            }
            None => false,
        }
    }

    /// Lift a ban. The proxy remains busy until released.
    pub fn unban(&self, url: &Url) -> bool {
        let mut proxies = self.proxies.write();
        match proxies.get_mut(url.as_str()) {
            Some(proxy) => {
                proxy.unban();
                debug!("Unbanned proxy {}", url);
                true
            }
            None => false,
        }
    }

    /// Whether a proxy is banned, and why. `(false, "")` for unknown addresses.
    pub fn banned_status(&self, url: &Url) -> (bool, String) {
        self.proxies
            .read()
            .get(url.as_str())
            .map(|p| (p.is_banned(), p.ban_reason().to_owned()))
            .unwrap_or_default()
    }

    /// Whether a proxy is known and not marked busy. Banned proxies are never free.
    pub fn is_free(&self, url: &Url) -> bool {
        self.proxies
            .read()
            .get(url.as_str())
            .is_some_and(|p| !p.busy_flag())
    }

    /// Whether a proxy is known and marked busy, banned proxies included.
    pub fn is_busy(&self, url: &Url) -> bool {
        self.proxies
            .read()
            .get(url.as_str())
            .is_some_and(Proxy::busy_flag)
    }

    /// State of a proxy, `None` for unknown addresses.
    pub fn status(&self, url: &Url) -> Option<ProxyStatus> {
        self.proxies.read().get(url.as_str()).map(Proxy::status)
    }

    /// All proxies in the pool.
    pub fn list(&self) -> Vec<Url> {
        self.reclaim_deferred();
        self.collect_where(|_| true)
    }

    /// Proxies available for acquisition.
    pub fn free_list(&self) -> Vec<Url> {
        self.reclaim_deferred();
        self.collect_where(Proxy::is_free)
    }

    /// Busy proxies, not counting banned ones.
    pub fn busy_list(&self) -> Vec<Url> {
        self.reclaim_deferred();
        self.collect_where(Proxy::is_busy)
    }

    /// Banned proxies.
    pub fn banned_list(&self) -> Vec<Url> {
        self.collect_where(Proxy::is_banned)
    }

    /// Number of proxies available for acquisition.
    pub fn num_free(&self) -> usize {
        self.reclaim_deferred();
        self.count_where(Proxy::is_free)
    }

    /// Number of busy proxies, not counting banned ones.
    pub fn num_busy(&self) -> usize {
        self.reclaim_deferred();
        self.count_where(Proxy::is_busy)
    }

    /// Number of banned proxies.
    pub fn num_banned(&self) -> usize {
        self.count_where(Proxy::is_banned)
    }

    /// Get consistent counts of every partition.
    pub fn get_stats(&self) -> PoolStats {
        self.reclaim_deferred();
        Self::stats_of(&self.proxies.read())
    }

    fn stats_of(proxies: &HashMap<String, Proxy>) -> PoolStats {
        proxies.values().fold(
            PoolStats {
                total: proxies.len(),
                ..PoolStats::default()
            },
            |mut stats, proxy| {
                match proxy.status() {
                    ProxyStatus::Free => stats.free += 1,
                    ProxyStatus::Busy | ProxyStatus::Deferred => stats.busy += 1,
                    ProxyStatus::Banned => stats.banned += 1,
                }
                stats
            },
        )
    }

    fn collect_where(&self, pred: impl Fn(&Proxy) -> bool) -> Vec<Url> {
        self.proxies
            .read()
            .values()
            .filter(|p| pred(*p))
            .map(|p| p.url().clone())
            .collect()
    }

    fn count_where(&self, pred: impl Fn(&Proxy) -> bool) -> usize {
        self.proxies.read().values().filter(|p| pred(*p)).count()
    }

    /// Release every proxy whose deferred release has come due.
    fn reclaim_deferred(&self) {
        let now = Instant::now();
        let proxies = self.proxies.upgradable_read();
        if !proxies.values().any(|p| p.is_due(now)) {
            return;
        }

        let mut proxies = RwLockUpgradableReadGuard::upgrade(proxies);
        for proxy in proxies.values_mut().filter(|p| p.is_due(now)) {
            proxy.release();
            debug!("Deferred release of proxy {} came due", proxy.url());
        }
    }
}

impl Default for ProxyPool {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}
