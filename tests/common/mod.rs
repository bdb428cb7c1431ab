//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    http::{header, HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use cep_weather::http::{aggregator, gateway, AggregatorState, GatewayState, HttpServer};
use cep_weather::lifecycle::Shutdown;
use cep_weather::observability::Telemetry;
use cep_weather::resilience::build_client;
use cep_weather::upstream::{PostalClient, WeatherClient};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};
use tokio::net::TcpListener;

/// A request seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    /// Decoded query parameter `key`.
    #[allow(dead_code)]
    pub fn query_param(&self, key: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

/// Handle to a running mock upstream.
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Start a mock upstream that answers every request with `status` and `body`.
#[allow(dead_code)]
pub async fn start_mock_backend(status: u16, body: &'static str) -> MockUpstream {
    start_programmable_backend(move |_| async move { (status, body.to_string()) }).await
}

/// Start a programmable mock upstream on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockUpstream
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let recorded = requests.clone();
    let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap| {
        let f = f.clone();
        let recorded = recorded.clone();
        async move {
            let request = RecordedRequest {
                path: uri.path().to_string(),
                query: uri.query().map(str::to_string),
                headers,
            };
            recorded.lock().unwrap().push(request.clone());
            let (status, body) = f(request).await;
            (
                StatusCode::from_u16(status).unwrap(),
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response()
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, requests }
}

/// An independently initialized tracer pipeline, as each service process has.
pub struct TestTracer {
    pub provider: SdkTracerProvider,
    pub exporter: InMemorySpanExporter,
}

impl TestTracer {
    pub fn new() -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        Self { provider, exporter }
    }

    pub fn telemetry(&self, scope: &'static str) -> Telemetry {
        Telemetry::new(&self.provider, scope)
    }

    pub fn spans(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().unwrap()
    }

    /// The finished span called `name`; panics if absent.
    #[allow(dead_code)]
    pub fn span(&self, name: &str) -> SpanData {
        self.spans()
            .into_iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no span named {name}"))
    }
}

/// A service running on an ephemeral port.
pub struct RunningService {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl RunningService {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for RunningService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

async fn serve(name: &'static str, app: Router) -> RunningService {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(name, app, Duration::from_secs(30));
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    RunningService { addr, shutdown }
}

/// Start an aggregator wired to the given provider endpoints.
pub async fn start_aggregator(
    tracer: &TestTracer,
    postal_url: &str,
    weather_url: &str,
    outbound_timeout: Duration,
) -> RunningService {
    let telemetry = tracer.telemetry("service-b");
    let http = build_client(outbound_timeout).unwrap();
    let state = AggregatorState::new(
        PostalClient::new(http.clone(), postal_url, telemetry.clone()),
        WeatherClient::new(http, weather_url, "test-key", telemetry.clone()),
        telemetry,
    );
    serve("aggregator", aggregator::router(state)).await
}

/// Start a gateway forwarding to `aggregator_url`.
pub async fn start_gateway(
    tracer: &TestTracer,
    aggregator_url: &str,
    outbound_timeout: Duration,
) -> RunningService {
    let state = GatewayState::new(
        build_client(outbound_timeout).unwrap(),
        aggregator_url,
        tracer.telemetry("service-a"),
    );
    serve("gateway", gateway::router(state)).await
}

/// Client that never reuses connections between tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
