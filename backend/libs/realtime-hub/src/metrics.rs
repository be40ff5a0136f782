use std::rc::Rc;
use std::time::{Duration, Instant};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, TextEncoder,
};

use crate::connection::CloseReason;

const DEFAULT_SERVICE_NAME: &str = "realtime";

static SERVICE_NAME: OnceCell<String> = OnceCell::new();

/// Set the `service` label carried by every series below. Call once at startup, before the
/// first metric is touched; later calls are ignored.
pub fn init(service: &str) {
    let _ = SERVICE_NAME.set(service.to_string());
}

pub fn service_name() -> &'static str {
    SERVICE_NAME
        .get()
        .map(String::as_str)
        .unwrap_or(DEFAULT_SERVICE_NAME)
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).const_label("service", service_name())
}

static ACTIVE_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::with_opts(opts(
        "realtime_active_connections",
        "Connections currently registered in the hub",
    ))
    .expect("failed to create realtime_active_connections");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register realtime_active_connections");
    gauge
});

static CONNECTIONS_CLOSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        opts(
            "realtime_connections_closed_total",
            "Connections removed from the hub, by reason",
        ),
        &["reason"],
    )
    .expect("failed to create realtime_connections_closed_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register realtime_connections_closed_total");
    counter
});

static FRAMES_DELIVERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::with_opts(opts(
        "realtime_frames_delivered_total",
        "Frames accepted into connection outbound queues",
    ))
    .expect("failed to create realtime_frames_delivered_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register realtime_frames_delivered_total");
    counter
});

static TICKETS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        opts("realtime_tickets_total", "Upgrade tickets by lifecycle event"),
        &["event"],
    )
    .expect("failed to create realtime_tickets_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register realtime_tickets_total");
    counter
});

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        opts("http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("failed to create http_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new("http_request_duration_seconds", "HTTP request latency")
            .const_label("service", service_name())
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "path", "status"],
    )
    .expect("failed to create http_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register http_request_duration_seconds");
    histogram
});

pub fn connection_opened() {
    ACTIVE_CONNECTIONS.inc();
}

pub fn connection_closed(reason: CloseReason) {
    ACTIVE_CONNECTIONS.dec();
    CONNECTIONS_CLOSED_TOTAL
        .with_label_values(&[reason.as_str()])
        .inc();
}

pub fn frames_delivered(count: usize) {
    FRAMES_DELIVERED_TOTAL.inc_by(count as u64);
}

pub fn ticket_event(event: &str) {
    TICKETS_TOTAL.with_label_values(&[event]).inc();
}

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

/// Records count and latency of every HTTP request.
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        // Matched pattern keeps path labels bounded (ids stay out of the label set).
        let path = req
            .match_pattern()
            .unwrap_or_else(|| "unmatched".to_string());
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let result = service.call(req).await;
            let elapsed = start.elapsed();
            match &result {
                Ok(response) => {
                    observe_http_request(&method, &path, response.status().as_u16(), elapsed);
                }
                Err(err) => {
                    let status = err.as_response_error().status_code().as_u16();
                    observe_http_request(&method, &path, status, elapsed);
                }
            }
            result
        })
    }
}
