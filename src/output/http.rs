// HTTP workers. Each endpoint runs a small single-threaded runtime on its
// own thread and reads store snapshots; a bind failure is logged and the
// TUI keeps running.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use log::{error, info};

use super::prometheus;
use crate::store::{MetricStore, SeriesExport};

/// How often the graceful-shutdown watcher polls the flag.
const SHUTDOWN_POLL_MS: u64 = 200;

#[derive(Clone, Copy)]
enum Endpoint {
    Json,
    Prometheus,
}

/// Serve `GET /metrics` as JSON: `{name: {current, history}}`.
pub fn spawn_json(
    store: Arc<MetricStore>,
    host: &str,
    port: u16,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    serve(Endpoint::Json, format!("{host}:{port}"), store, shutdown)
}

/// Serve `GET /metrics` in Prometheus text exposition format.
pub fn spawn_prometheus(
    store: Arc<MetricStore>,
    port: u16,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    serve(
        Endpoint::Prometheus,
        format!("localhost:{port}"),
        store,
        shutdown,
    )
}

fn serve(
    endpoint: Endpoint,
    addr: String,
    store: Arc<MetricStore>,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("http".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("cannot start http runtime: {err}");
                    return;
                }
            };
            runtime.block_on(async move {
                let router = match endpoint {
                    Endpoint::Json => Router::new()
                        .route("/metrics", get(json_metrics))
                        .with_state(store),
                    Endpoint::Prometheus => Router::new()
                        .route("/metrics", get(prometheus_metrics))
                        .with_state(store),
                };
                let listener = match tokio::net::TcpListener::bind(&addr).await {
                    Ok(listener) => listener,
                    Err(err) => {
                        error!("cannot bind {addr}: {err}");
                        return;
                    }
                };
                info!("serving /metrics on {addr}");
                let result = axum::serve(listener, router)
                    .with_graceful_shutdown(wait_for_shutdown(shutdown))
                    .await;
                if let Err(err) = result {
                    info!("http worker stopped: {err}");
                }
            });
        })
        .expect("spawn http thread")
}

async fn wait_for_shutdown(shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Acquire) {
        tokio::time::sleep(Duration::from_millis(SHUTDOWN_POLL_MS)).await;
    }
}

async fn json_metrics(
    State(store): State<Arc<MetricStore>>,
) -> Json<BTreeMap<String, SeriesExport>> {
    Json(store.export().into_iter().collect())
}

async fn prometheus_metrics(State(store): State<Arc<MetricStore>>) -> impl IntoResponse {
    let body = prometheus::render(&store.export());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> Arc<MetricStore> {
        let store = Arc::new(MetricStore::new(4));
        store.ingest(&vec![("memory.system.total.used.percent".into(), 70.0)]);
        store.ingest(&vec![("memory.system.total.used.percent".into(), 78.5)]);
        store
    }

    #[test]
    fn test_json_body_shape() {
        let store = seeded_store();
        let body: BTreeMap<String, SeriesExport> = store.export().into_iter().collect();
        let json = serde_json::to_value(&body).unwrap();
        let series = &json["memory.system.total.used.percent"];
        assert_eq!(series["current"], 78.5);
        assert_eq!(series["history"].as_array().unwrap().len(), 2);
        assert_eq!(series["history"][0], 70.0);
    }
}
