//! Poll metrics tracking using OpenTelemetry.

use crate::notify::PollOutcome;
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use std::time::Duration;

/// Metrics collector for the polling worker.
///
/// Tracks poll attempts, their outcomes, and poll latency using
/// OpenTelemetry metrics.
///
/// # Examples
///
/// ```rust,no_run
/// use polled_config::metrics::PollMetrics;
/// use polled_config::notify::PollOutcome;
/// use opentelemetry::global;
/// use std::time::Duration;
///
/// let meter = global::meter("polled-config");
/// let metrics = PollMetrics::new(meter);
///
/// metrics.record_poll(PollOutcome::Published, Duration::from_millis(12));
/// ```
#[derive(Clone)]
pub struct PollMetrics {
    polls: Counter<u64>,
    publishes: Counter<u64>,
    unchanged: Counter<u64>,
    fetch_failures: Counter<u64>,
    parse_failures: Counter<u64>,
    poll_duration: Histogram<f64>,
}

impl PollMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let polls = meter
            .u64_counter("polled_config.poll.attempts")
            .with_description("Total number of polls")
            .build();

        let publishes = meter
            .u64_counter("polled_config.poll.published")
            .with_description("Number of polls that published a new snapshot")
            .build();

        let unchanged = meter
            .u64_counter("polled_config.poll.unchanged")
            .with_description("Number of polls that found identical content")
            .build();

        let fetch_failures = meter
            .u64_counter("polled_config.poll.fetch_failures")
            .with_description("Number of polls where the source could not be read")
            .build();

        let parse_failures = meter
            .u64_counter("polled_config.poll.parse_failures")
            .with_description("Number of polls where changed content failed to parse")
            .build();

        let poll_duration = meter
            .f64_histogram("polled_config.poll.duration")
            .with_description("Duration of poll operations in seconds")
            .with_unit("s")
            .build();

        Self {
            polls,
            publishes,
            unchanged,
            fetch_failures,
            parse_failures,
            poll_duration,
        }
    }

    /// Record one finished poll.
    pub fn record_poll(&self, outcome: PollOutcome, elapsed: Duration) {
        self.polls.add(1, &[]);

        let counter = match outcome {
            PollOutcome::Published => &self.publishes,
            PollOutcome::Unchanged => &self.unchanged,
            PollOutcome::FetchFailed => &self.fetch_failures,
            PollOutcome::ParseFailed => &self.parse_failures,
        };
        counter.add(1, &[]);

        self.poll_duration.record(
            elapsed.as_secs_f64(),
            &[KeyValue::new("outcome", outcome_label(outcome))],
        );
    }
}

fn outcome_label(outcome: PollOutcome) -> &'static str {
    match outcome {
        PollOutcome::Published => "published",
        PollOutcome::Unchanged => "unchanged",
        PollOutcome::FetchFailed => "fetch_failed",
        PollOutcome::ParseFailed => "parse_failed",
    }
}
