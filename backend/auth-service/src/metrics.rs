use actix_web::{HttpResponse, Responder};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, TextEncoder};

/// Handler that serialises Prometheus metrics in text format.
pub async fn metrics_handler() -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(buffer),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

/// Create a counter and register it with the default registry. A failure
/// is logged and the counter is dropped from exposition rather than
/// panicking in a lazy initializer.
fn register_counter(name: &str, help: &str) -> Option<IntCounter> {
    let counter = match IntCounter::new(name, help) {
        Ok(counter) => counter,
        Err(e) => {
            tracing::error!("failed to create {} counter: {}", name, e);
            return None;
        }
    };

    if let Err(e) = prometheus::default_registry().register(Box::new(counter.clone())) {
        tracing::error!("failed to register {} counter: {}", name, e);
    }
    Some(counter)
}

/// Login attempts over HTTP and gRPC
static LOGIN_REQUESTS_TOTAL: Lazy<Option<IntCounter>> = Lazy::new(|| {
    register_counter("login_requests_total", "Total number of login requests")
});

/// Wrong secret or unknown identity
static LOGIN_FAILURES_TOTAL: Lazy<Option<IntCounter>> = Lazy::new(|| {
    register_counter(
        "login_failures_total",
        "Total number of failed login attempts (wrong password or unknown identity)",
    )
});

/// A throttle key reached the attempt threshold
static LOGIN_LOCKOUTS_TOTAL: Lazy<Option<IntCounter>> = Lazy::new(|| {
    register_counter(
        "login_lockouts_total",
        "Total number of login lockouts triggered",
    )
});

static TOKENS_ISSUED_TOTAL: Lazy<Option<IntCounter>> = Lazy::new(|| {
    register_counter("tokens_issued_total", "Total number of access tokens issued")
});

static TOKENS_REVOKED_TOTAL: Lazy<Option<IntCounter>> = Lazy::new(|| {
    register_counter(
        "tokens_revoked_total",
        "Total number of access tokens revoked by logout",
    )
});

static TOKEN_VALIDATION_FAILURES_TOTAL: Lazy<Option<IntCounter>> = Lazy::new(|| {
    register_counter(
        "token_validation_failures_total",
        "Total number of tokens rejected by ValidateToken",
    )
});

/// Force registration so every counter shows up in /metrics from the start.
pub fn initialize_auth_metrics() {
    for counter in [
        &LOGIN_REQUESTS_TOTAL,
        &LOGIN_FAILURES_TOTAL,
        &LOGIN_LOCKOUTS_TOTAL,
        &TOKENS_ISSUED_TOTAL,
        &TOKENS_REVOKED_TOTAL,
        &TOKEN_VALIDATION_FAILURES_TOTAL,
    ] {
        Lazy::force(counter);
    }
}

#[inline]
fn inc(counter: &Lazy<Option<IntCounter>>) {
    if let Some(counter) = counter.as_ref() {
        counter.inc();
    }
}

#[inline]
pub fn inc_login_requests() {
    inc(&LOGIN_REQUESTS_TOTAL);
}

#[inline]
pub fn inc_login_failures() {
    inc(&LOGIN_FAILURES_TOTAL);
}

#[inline]
pub fn inc_login_lockouts() {
    inc(&LOGIN_LOCKOUTS_TOTAL);
}

#[inline]
pub fn inc_tokens_issued() {
    inc(&TOKENS_ISSUED_TOTAL);
}

#[inline]
pub fn inc_tokens_revoked() {
    inc(&TOKENS_REVOKED_TOTAL);
}

#[inline]
pub fn inc_token_validation_failures() {
    inc(&TOKEN_VALIDATION_FAILURES_TOTAL);
}
