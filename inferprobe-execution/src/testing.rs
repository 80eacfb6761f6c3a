//! Scripted executors for unit tests

use async_trait::async_trait;
use inferprobe_core::RequestOutcome;
use inferprobe_http::{HttpRequest, RequestExecutor};
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Script = dyn Fn(usize) -> RequestOutcome + Send + Sync;

/// Answers each call with `script(call_number)`, optionally after a delay,
/// and records what it saw
pub struct ScriptedExecutor {
    script: Box<Script>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(script: impl Fn(usize) -> RequestOutcome + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        })
    }

    pub fn delayed(
        delay: Duration,
        script: impl Fn(usize) -> RequestOutcome + Send + Sync + 'static,
    ) -> Arc<Self> {
        let mut executor = Self::new(script);
        if let Some(inner) = Arc::get_mut(&mut executor) {
            inner.delay = Some(delay);
        }
        executor
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(&self, request: &HttpRequest, _timeout: Duration) -> RequestOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(request.url.clone());

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.script)(call)
    }
}

pub fn ok_with_latency(ms: u64, payload: Option<JsonValue>) -> RequestOutcome {
    RequestOutcome::succeeded(200, Duration::from_millis(ms), payload)
}
