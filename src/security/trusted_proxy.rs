//! Trusted reverse proxy set and its resolver.
//!
//! # Responsibilities
//! - Assemble trusted IPs/CIDRs from the remote feed, local addresses,
//!   static configuration and (optionally) a subnet probe
//! - Answer membership queries without I/O
//! - Rebuild on an explicit, rate-limited trigger
//!
//! # Design Decisions
//! - The set is immutable; a rebuild publishes a new one via `ArcSwap`
//! - Any source may fail; the build still yields a usable set
//! - An empty set trusts nothing

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;

use crate::config::TrustedProxyConfig;
use crate::environment::{EnvironmentKey, EnvironmentService};
use crate::observability::metrics;
use crate::security::cidr::{canonical, IpCidr};
use crate::security::feed::FeedClient;
use crate::security::{local, probe, TrustError};

/// Immutable set of trusted networks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedProxySet {
    entries: Vec<IpCidr>,
}

impl TrustedProxySet {
    /// Build a set, dropping duplicates while keeping first-seen order.
    pub fn new<I: IntoIterator<Item = IpCidr>>(entries: I) -> Self {
        let mut unique: Vec<IpCidr> = Vec::new();
        for entry in entries {
            if !unique.contains(&entry) {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Exact match or CIDR containment.
    pub fn is_trusted(&self, ip: IpAddr) -> bool {
        let ip = canonical(ip);
        self.entries.iter().any(|cidr| cidr.contains(ip))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpCidr> {
        self.entries.iter()
    }
}

const NEVER: u64 = u64::MAX;

/// Builds and holds the current [`TrustedProxySet`].
pub struct TrustedProxyResolver {
    config: TrustedProxyConfig,
    environment: Arc<EnvironmentService>,
    feed: FeedClient,
    current: ArcSwap<TrustedProxySet>,
    epoch: Instant,
    last_refresh_ms: AtomicU64,
}

impl TrustedProxyResolver {
    /// Create a resolver with an empty set. Call [`initialize`](Self::initialize)
    /// before serving traffic.
    pub fn new(
        config: TrustedProxyConfig,
        environment: Arc<EnvironmentService>,
    ) -> Result<Self, TrustError> {
        let feed = FeedClient::new(Duration::from_secs(config.feed_timeout_secs))?;
        Ok(Self {
            config,
            environment,
            feed,
            current: ArcSwap::from_pointee(TrustedProxySet::empty()),
            epoch: Instant::now(),
            last_refresh_ms: AtomicU64::new(NEVER),
        })
    }

    /// Build the first set, ignoring the rate limit.
    pub async fn initialize(&self) -> usize {
        self.last_refresh_ms.store(self.now_ms(), Ordering::SeqCst);
        self.rebuild().await
    }

    /// Rebuild the set unless the previous rebuild was too recent.
    pub async fn refresh(&self) -> Result<usize, TrustError> {
        self.claim_refresh_slot()?;
        Ok(self.rebuild().await)
    }

    pub fn current(&self) -> Arc<TrustedProxySet> {
        self.current.load_full()
    }

    /// Pure membership test against the current set.
    pub fn is_trusted(&self, ip: IpAddr) -> bool {
        self.current.load().is_trusted(ip)
    }

    /// Assemble a set from every configured source. Never fails.
    pub async fn build(&self) -> TrustedProxySet {
        let mut entries: Vec<IpCidr> = Vec::new();

        if self.config.fetch_feed {
            let cache = self.environment.cache();
            let urls = [
                cache.get_or(EnvironmentKey::CloudflareIpListV4, &self.config.feed_url_v4),
                cache.get_or(EnvironmentKey::CloudflareIpListV6, &self.config.feed_url_v6),
            ];
            entries.extend(self.feed.fetch_all(&urls).await);
        }

        let local_addrs = if self.config.include_local {
            local::local_addresses()
        } else {
            local::LOOPBACK.to_vec()
        };
        entries.extend(local_addrs.iter().copied().map(IpCidr::host));
        if self.config.include_local {
            entries.extend(local::default_gateways().into_iter().map(IpCidr::host));
        }

        for literal in &self.config.static_proxies {
            match literal.parse::<IpCidr>() {
                Ok(cidr) => entries.push(cidr),
                Err(e) => tracing::warn!(entry = %literal, error = %e, "Ignoring invalid static proxy"),
            }
        }

        if self.config.probe.enabled {
            for addr in local::subnet_candidates(&local_addrs) {
                let alive = probe::scan_subnet(addr, &self.config.probe).await;
                entries.extend(alive.into_iter().map(IpCidr::host));
            }
        }

        let set = TrustedProxySet::new(entries);
        tracing::info!(count = set.len(), "Constructed trusted proxy set");
        set
    }

    async fn rebuild(&self) -> usize {
        let set = self.build().await;
        let count = set.len();
        metrics::record_trusted_set_size(count);
        self.current.store(Arc::new(set));
        count
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn claim_refresh_slot(&self) -> Result<(), TrustError> {
        let min_ms = self.config.min_refresh_interval_secs.saturating_mul(1000);
        loop {
            let last = self.last_refresh_ms.load(Ordering::SeqCst);
            let now = self.now_ms();
            if last != NEVER && now.saturating_sub(last) < min_ms {
                let remaining = min_ms - now.saturating_sub(last);
                return Err(TrustError::RefreshRateLimited {
                    retry_after_secs: remaining.div_ceil(1000),
                });
            }
            if self
                .last_refresh_ms
                .compare_exchange(last, now, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Ok(());
            }
        }
    }
}
