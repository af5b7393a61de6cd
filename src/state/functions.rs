//! The impls and functions.
//!
use std::time::Instant;
use chrono::{DateTime, Duration, Local};
use log::*;
use serde_json::Value;
use anyhow::{Context, Result};
use crate::error::MesosCliError;
use crate::resolver::AddressResolver;
use crate::state::{CachedEntry, CachedValue, Clock, ClusterSnapshot, HttpJsonFetch, ReqwestFetcher, StateCache, SystemClock};

/// Default time the state is kept, in seconds.
pub const DEFAULT_STATE_TTL: i64 = 30;

impl<T> CachedValue<T> {
    pub fn new(ttl: Duration) -> Self {
        CachedValue { entry: None, ttl }
    }
    /// The stored value, if it is not expired at `now`.
    #[cfg(test)]
    pub fn get(&self, now: DateTime<Local>) -> Option<&T> {
        self.entry.as_ref()
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| &entry.value)
    }
    fn is_fresh(&self, entry: &CachedEntry<T>, now: DateTime<Local>) -> bool {
        now.signed_duration_since(entry.fetched_at) < self.ttl
    }
    /// Fetch and store a new value, regardless of the age of the stored one.
    ///
    /// When `fetch` fails the stored value is kept.
    pub fn refresh<E>(
        &mut self,
        now: DateTime<Local>,
        fetch: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E>
    {
        let value = fetch()?;
        Ok(&self.entry.insert(CachedEntry { value, fetched_at: now }).value)
    }
    /// Return the stored value if it is fresh at `now`, otherwise [CachedValue::refresh] it.
    pub fn get_or_refresh<E>(
        &mut self,
        now: DateTime<Local>,
        fetch: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E>
    {
        match self.entry.take() {
            Some(entry) if self.is_fresh(&entry, now) => Ok(&self.entry.insert(entry).value),
            previous => {
                self.entry = previous;
                self.refresh(now, fetch)
            }
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

impl ReqwestFetcher {
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| "Error building the http client")?;
        Ok(ReqwestFetcher { client })
    }
}

impl HttpJsonFetch for ReqwestFetcher {
    fn get_json(&self, url: &str) -> Result<Value> {
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            debug!("Non success response: {} = {}", url, response.status());
        } else {
            debug!("Success response: {} = {}", url, response.status());
        }
        Ok(response.error_for_status()?.json::<Value>()?)
    }
}

impl StateCache {
    pub fn new(
        master: &str,
        resolver: AddressResolver,
        fetcher: Box<dyn HttpJsonFetch>,
        ttl: Duration,
    ) -> Self
    {
        StateCache {
            master: master.to_string(),
            resolver,
            fetcher,
            clock: Box::new(SystemClock),
            state: CachedValue::new(ttl),
        }
    }
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
    /// The address of the leading master, resolved now.
    pub fn leader(&self) -> Result<String, MesosCliError> {
        self.resolver.resolve(&self.master)
    }
    /// The cluster state, fetched from the leading master if the cached one expired.
    pub fn snapshot(&mut self) -> Result<&ClusterSnapshot, MesosCliError> {
        let now = self.clock.now();
        let StateCache { master, resolver, fetcher, state, .. } = self;
        state.get_or_refresh(now, || StateCache::fetch_state(master, resolver, &**fetcher))
    }
    fn fetch_state(
        master: &str,
        resolver: &AddressResolver,
        fetcher: &dyn HttpJsonFetch,
    ) -> Result<ClusterSnapshot, MesosCliError>
    {
        let host = base_url(&resolver.resolve(master)?);
        let url = format!("{}/master/state.json", host);

        info!("begin http read: {}", url);
        let timer = Instant::now();

        let data = fetcher.get_json(&url)
            .map_err(|e| MesosCliError::Fetch { host: host.clone(), reason: format!("{:#}", e) })?;

        info!("end http read: {:?}", timer.elapsed());

        StateCache::parse_state(data)
            .map_err(|e| MesosCliError::Fetch { host, reason: format!("invalid state document: {}", e) })
    }
    // This is a separate function in order to allow tests to use it.
    fn parse_state(
        data: Value,
    ) -> serde_json::Result<ClusterSnapshot>
    {
        serde_json::from_value(data)
    }
}

/// `http://` + address, unless the address already has a scheme.
pub fn base_url(
    address: &str,
) -> String
{
    let address = address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}
