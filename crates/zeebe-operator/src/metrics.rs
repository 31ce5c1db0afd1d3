use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Operator metrics, kept in their own registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    reconciliations: IntCounterVec,
    reconcile_duration: Histogram,
    ready: Arc<AtomicBool>,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let reconciliations = IntCounterVec::new(
            Opts::new(
                "zeebe_operator_reconciliations_total",
                "Reconciliation passes by result",
            ),
            &["result"],
        )?;
        registry.register(Box::new(reconciliations.clone()))?;

        let reconcile_duration = Histogram::with_opts(HistogramOpts::new(
            "zeebe_operator_reconcile_duration_seconds",
            "Duration of a reconciliation pass in seconds",
        ))?;
        registry.register(Box::new(reconcile_duration.clone()))?;

        Ok(Self {
            registry,
            reconciliations,
            reconcile_duration,
            ready: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Count a finished pass. `result` is `success` or an error kind.
    pub fn record_reconciliation(&self, result: &str, duration_secs: f64) {
        self.reconciliations.with_label_values(&[result]).inc();
        self.reconcile_duration.observe(duration_secs);
    }

    pub fn reconciliations(&self, result: &str) -> u64 {
        self.reconciliations.with_label_values(&[result]).get()
    }

    /// Flip `/readyz` once the controller is watching.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    fn encode(&self) -> Result<Vec<u8>, String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| format!("Failed to encode metrics: {e}"))?;
        Ok(buffer)
    }

    /// Status line, content type and body for a request path.
    fn respond(&self, path: &str) -> (&'static str, &'static str, Vec<u8>) {
        match path {
            "/metrics" => match self.encode() {
                Ok(data) => ("200 OK", "text/plain; version=0.0.4; charset=utf-8", data),
                Err(e) => ("500 Internal Server Error", "text/plain", e.into_bytes()),
            },
            "/healthz" => ("200 OK", "text/plain", b"ok".to_vec()),
            "/readyz" if self.ready.load(Ordering::Relaxed) => {
                ("200 OK", "text/plain", b"ok".to_vec())
            }
            "/readyz" => ("503 Service Unavailable", "text/plain", b"not ready".to_vec()),
            _ => ("404 Not Found", "text/plain", b"not found".to_vec()),
        }
    }
}

/// Serve `/metrics`, `/healthz` and `/readyz` until `cancel` fires.
pub async fn serve(addr: &str, metrics: Metrics, cancel: CancellationToken) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Metrics server listening");

    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            accepted = listener.accept() => accepted,
        };

        let mut stream = match accepted {
            Ok((stream, _)) => stream,
            Err(e) => {
                error!("Failed to accept metrics connection: {e}");
                continue;
            }
        };

        let metrics = metrics.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let Ok(n) = stream.read(&mut buf).await else {
                return;
            };
            let request = String::from_utf8_lossy(&buf[..n]);
            let path = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/");

            let (status, content_type, body) = metrics.respond(path);
            let header = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );

            let _ = stream.write_all(header.as_bytes()).await;
            let _ = stream.write_all(&body).await;
        });
    }
}
