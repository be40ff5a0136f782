use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts};

static EVENTS_PUBLISHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "event_channel_published_total",
            "Events written to the broker, by topic and result",
        ),
        &["topic", "result"],
    )
    .expect("failed to create event_channel_published_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register event_channel_published_total");
    counter
});

static EVENTS_CONSUMED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "event_channel_consumed_total",
            "Messages read from the broker, by topic and outcome",
        ),
        &["topic", "outcome"],
    )
    .expect("failed to create event_channel_consumed_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register event_channel_consumed_total");
    counter
});

static READ_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "event_channel_read_errors_total",
            "Transient broker read failures",
        ),
        &["topic"],
    )
    .expect("failed to create event_channel_read_errors_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register event_channel_read_errors_total");
    counter
});

pub fn record_publish(topic: &str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    EVENTS_PUBLISHED_TOTAL
        .with_label_values(&[topic, result])
        .inc();
}

#[cfg(test)]
pub(crate) fn published_total(topic: &str, result: &str) -> u64 {
    EVENTS_PUBLISHED_TOTAL
        .with_label_values(&[topic, result])
        .get()
}

pub fn record_consumed(topic: &str, outcome: &str) {
    EVENTS_CONSUMED_TOTAL
        .with_label_values(&[topic, outcome])
        .inc();
}

pub fn record_read_error(topic: &str) {
    READ_ERRORS_TOTAL.with_label_values(&[topic]).inc();
}
