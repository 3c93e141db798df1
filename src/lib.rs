//! # rotating-proxy-pool
//!
//! A thread-safe pool of proxy addresses for clients that rotate through several
//! upstreams.
//!
//! Callers [`acquire`](ProxyPool::acquire) a free proxy, use it however they like, then
//! [`release`](ProxyPool::release) it, schedule a
//! [deferred release](ProxyPool::defer_release), or [`ban`](ProxyPool::ban) it. The
//! pool only tracks eligibility; it never sends traffic through the proxies.
//!
//! ```
//! use rotating_proxy_pool::ProxyPool;
//! use url::Url;
//!
//! let pool = ProxyPool::new([
//!     Url::parse("socks5://127.0.0.1:1080").unwrap(),
//!     Url::parse("socks5://127.0.0.1:1081").unwrap(),
//! ]);
//!
//! let proxy = pool.acquire().unwrap();
//! assert!(pool.is_busy(&proxy));
//! pool.release(&proxy);
//! assert_eq!(pool.num_free(), 2);
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod proxy;
mod utils;

pub use config::{ProxyPoolConfig, ProxyPoolConfigBuilder, DEFAULT_SCHEME};
pub use error::ProxyPoolError;
pub use pool::{PoolStats, ProxyPool};
pub use proxy::{Proxy, ProxyStatus};
pub use utils::{fetch_proxies_from_source, parse_proxy, parse_proxy_list};
