//! Scripted in-memory transport and page fixtures for unit tests

use crate::crawler::fetcher::Fetcher;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::transport::{Transport, TransportError, TransportResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

type Responder = Box<dyn Fn(&str) -> Result<TransportResponse, TransportError> + Send + Sync>;

/// Answers by URL substring (first matching route wins) and records every
/// requested URL
pub(crate) struct ScriptedTransport {
    routes: Vec<(String, Responder)>,
    requests: Mutex<Vec<String>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            routes: Vec::new(),
            requests: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every request sleeps this long, so concurrent calls overlap
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn route(
        mut self,
        fragment: &str,
        responder: impl Fn(&str) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        self.routes.push((fragment.to_string(), Box::new(responder)));
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count_matching(&self, fragment: &str) -> usize {
        self.requests()
            .iter()
            .filter(|url| url.contains(fragment))
            .count()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, responder)| responder(url))
            .unwrap_or_else(|| status(404, ""))
    }
}

pub(crate) fn ok(body: impl Into<String>) -> Result<TransportResponse, TransportError> {
    status(200, body)
}

pub(crate) fn status(code: u16, body: impl Into<String>) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status: code,
        elapsed: Duration::from_millis(15),
        body: body.into(),
    })
}

/// Fetcher with generous limits and a 1ms backoff base
pub(crate) fn fetcher(transport: Arc<dyn Transport>, max_attempts: u32) -> Fetcher {
    Fetcher::new(
        Url::parse("https://eu.finalfantasyxiv.com").unwrap(),
        transport,
        RateLimiter::new(1000, Duration::from_secs(1)),
        RateLimiter::new(1000, Duration::from_secs(1)),
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(10)),
    )
}

/// One listing row for entrant `id`
pub(crate) fn listing_row(id: u64, rank: usize, group: &str) -> String {
    format!(
        r#"<div class="ranking_set" data-href="/lodestone/character/{id}/">
            <h3>Player {id}</h3>
            <div class="order">{rank}</div>
            <div class="prev_order">-</div>
            <div class="world">Cerberus [{group}]</div>
            <div class="points">1000 +5</div>
            <div class="face-wrapper"><img src="https://img2.finalfantasyxiv.com/f/{id}_c0.jpg"/></div>
            <div class="wins">20</div>
        </div>"#
    )
}

/// A listing page with ids `first_id..first_id + rows`
pub(crate) fn listing_page(first_id: u64, rows: usize, group: &str) -> String {
    let body: String = (0..rows)
        .map(|i| listing_row(first_id + i as u64, i + 1, group))
        .collect();
    format!("<html><body>{}</body></html>", body)
}

/// A profile page showing the White Mage icon
pub(crate) fn profile_page() -> String {
    r#"<html><body><div class="character__class_icon">
        <img src="https://img.finalfantasyxiv.com/h/7/i20QvSPcSQTybykLZDbQCgPwMw.png?1700000000"/>
    </div></body></html>"#
        .to_string()
}
