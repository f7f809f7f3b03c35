//! Metrics for event creation, image uploads and event queries.

use metrics::{counter, histogram};
use std::time::Instant;

/// Which listing or lookup produced a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Upcoming,
    Filtered,
    Details,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Upcoming => "upcoming",
            QueryKind::Filtered => "filtered",
            QueryKind::Details => "details",
        }
    }
}

pub struct EventMetrics;

impl EventMetrics {
    pub fn record_event_created(remote: bool) {
        counter!("events_created_total", "remote" => remote.to_string()).increment(1);
    }

    pub fn record_query(kind: QueryKind, results: usize) {
        counter!("event_queries_total", "kind" => kind.as_str()).increment(1);
        tracing::debug!(kind = kind.as_str(), results, "Event query served");
    }

    pub fn record_image_upload(success: bool, duration_secs: f64) {
        let status = if success { "success" } else { "failure" };
        counter!("image_uploads_total", "status" => status).increment(1);
        histogram!("image_upload_duration_seconds", "status" => status).record(duration_secs);
    }
}

/// Measures one image upload; call [`finish`](Self::finish) with the outcome.
pub struct UploadTimer {
    start: Instant,
}

impl UploadTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn finish(self, success: bool) {
        EventMetrics::record_image_upload(success, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_kind_labels() {
        assert_eq!(QueryKind::Upcoming.as_str(), "upcoming");
        assert_eq!(QueryKind::Filtered.as_str(), "filtered");
        assert_eq!(QueryKind::Details.as_str(), "details");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        EventMetrics::record_event_created(false);
        EventMetrics::record_query(QueryKind::Details, 1);
        UploadTimer::start().finish(true);
    }
}
