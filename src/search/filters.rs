// Filter pipeline: narrows a domain's raw collection before text matching.
//
// Each domain accepts its own subset of filters and ignores the rest:
//   Device / Identity: active_only
//   Event:             device_id, event_type, min_confidence, date_range

use crate::search::domain::{Device, Event, Identity};
use crate::search::SearchFilters;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Date bucket applied to event occurrence time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DateRange {
    Today,
    Last7Days,
    Last30Days,
    /// Inclusive on both ends
    Custom {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl DateRange {
    /// Parse the short forms accepted on the command line
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" => Some(Self::Today),
            "7d" | "week" | "last_7_days" => Some(Self::Last7Days),
            "30d" | "month" | "last_30_days" => Some(Self::Last30Days),
            _ => None,
        }
    }

    /// Lower and optional upper bound relative to `now`
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        match *self {
            Self::Today => (now.date_naive().and_time(NaiveTime::MIN).and_utc(), None),
            Self::Last7Days => (now - Duration::days(7), None),
            Self::Last30Days => (now - Duration::days(30), None),
            Self::Custom { from, to } => (from, Some(to)),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds(now);
        instant >= start && end.map_or(true, |end| instant <= end)
    }
}

impl SearchFilters {
    /// Clamp malformed values instead of rejecting them
    pub fn sanitized(mut self) -> Self {
        self.min_confidence = match self.min_confidence {
            Some(floor) if floor.is_nan() => None,
            Some(floor) => Some(floor.clamp(0.0, 1.0)),
            None => None,
        };

        self.event_type = self
            .event_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        self.device_id = self.device_id.filter(|id| !id.as_str().trim().is_empty());

        if let Some(DateRange::Custom { from, to }) = self.date_range {
            if from > to {
                self.date_range = Some(DateRange::Custom { from: to, to: from });
            }
        }

        self
    }
}

/// A raw record that knows which filters apply to it
pub trait Filterable {
    fn passes(&self, filters: &SearchFilters, now: DateTime<Utc>) -> bool;
}

impl Filterable for Device {
    fn passes(&self, filters: &SearchFilters, _now: DateTime<Utc>) -> bool {
        !filters.active_only || self.is_active
    }
}

impl Filterable for Identity {
    fn passes(&self, filters: &SearchFilters, _now: DateTime<Utc>) -> bool {
        !filters.active_only || self.is_active
    }
}

impl Filterable for Event {
    fn passes(&self, filters: &SearchFilters, now: DateTime<Utc>) -> bool {
        // Events that carry no device id were already narrowed by the event log
        if let (Some(wanted), Some(actual)) = (&filters.device_id, &self.device_id) {
            if actual != wanted {
                return false;
            }
        }

        if let Some(event_type) = &filters.event_type {
            if !self.event_type.eq_ignore_ascii_case(event_type) {
                return false;
            }
        }

        if let Some(floor) = filters.min_confidence {
            if self.confidence < floor {
                return false;
            }
        }

        if let Some(range) = &filters.date_range {
            if !range.contains(self.occurred_at, now) {
                return false;
            }
        }

        true
    }
}

/// Narrow `candidates` to the records every applicable filter accepts
pub fn apply_filters<T: Filterable>(
    candidates: Vec<T>,
    filters: &SearchFilters,
    now: DateTime<Utc>,
) -> Vec<T> {
    candidates
        .into_iter()
        .filter(|candidate| candidate.passes(filters, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::RecordId;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn device(id: i64, active: bool) -> Device {
        Device {
            id: RecordId::from(id),
            display_name: format!("Camera {}", id),
            location_label: None,
            is_active: active,
            created_at: now(),
        }
    }

    fn event(id: i64, device: i64, kind: &str, confidence: f64, hours_ago: i64) -> Event {
        Event {
            id: RecordId::from(id),
            device_id: Some(RecordId::from(device)),
            device_display_name: None,
            event_type: kind.to_string(),
            identity_id: None,
            identity_display_name: None,
            confidence,
            similarity_score: None,
            occurred_at: now() - Duration::hours(hours_ago),
            image_url: None,
            alert_sent: None,
        }
    }

    #[test]
    fn test_active_only_drops_inactive_devices() {
        let filters = SearchFilters::new().active_only(true);
        let kept = apply_filters(vec![device(1, true), device(2, false)], &filters, now());

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, RecordId::from("1"));
    }

    #[test]
    fn test_event_filters_ignored_by_devices() {
        let filters = SearchFilters::new()
            .with_device_id("99")
            .with_min_confidence(0.99)
            .with_event_type("unknown_face");
        let kept = apply_filters(vec![device(1, true), device(2, false)], &filters, now());

        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_min_confidence_is_inclusive_floor() {
        let filters = SearchFilters::new().with_min_confidence(0.9);
        let events = vec![
            event(1, 1, "face_detected", 0.85, 1),
            event(2, 1, "face_detected", 0.9, 1),
            event(3, 1, "face_detected", 0.95, 1),
        ];
        let kept = apply_filters(events, &filters, now());

        let ids: Vec<_> = kept.iter().map(|e| e.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_device_and_type_combine() {
        let filters = SearchFilters::new()
            .with_device_id("1")
            .with_event_type("UNKNOWN_FACE");
        let events = vec![
            event(1, 1, "unknown_face", 0.9, 1),
            event(2, 2, "unknown_face", 0.9, 1),
            event(3, 1, "known_face", 0.9, 1),
        ];
        let kept = apply_filters(events, &filters, now());

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, RecordId::from("1"));
    }

    #[test]
    fn test_device_filter_keeps_events_without_device_id() {
        let filters = SearchFilters::new().with_device_id("1");
        let untagged = Event {
            device_id: None,
            ..event(3, 0, "unknown_face", 0.9, 1)
        };
        let events = vec![
            event(1, 1, "unknown_face", 0.9, 1),
            event(2, 2, "unknown_face", 0.9, 1),
            untagged,
        ];
        let kept = apply_filters(events, &filters, now());

        let ids: Vec<_> = kept.iter().map(|e| e.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_date_range_buckets() {
        let events = vec![
            event(1, 1, "face_detected", 0.9, 2),
            event(2, 1, "face_detected", 0.9, 20),
            event(3, 1, "face_detected", 0.9, 24 * 10),
            event(4, 1, "face_detected", 0.9, 24 * 40),
        ];

        let today = SearchFilters::new().with_date_range(DateRange::Today);
        assert_eq!(apply_filters(events.clone(), &today, now()).len(), 1);

        let week = SearchFilters::new().with_date_range(DateRange::Last7Days);
        assert_eq!(apply_filters(events.clone(), &week, now()).len(), 2);

        let month = SearchFilters::new().with_date_range(DateRange::Last30Days);
        assert_eq!(apply_filters(events, &month, now()).len(), 3);
    }

    #[test]
    fn test_sanitize_clamps_and_swaps() {
        let later = now();
        let earlier = now() - Duration::days(2);
        let filters = SearchFilters::new()
            .with_min_confidence(-0.5)
            .with_event_type("   ")
            .with_date_range(DateRange::Custom {
                from: later,
                to: earlier,
            })
            .sanitized();

        assert_eq!(filters.min_confidence, Some(0.0));
        assert!(filters.event_type.is_none());
        assert_eq!(
            filters.date_range,
            Some(DateRange::Custom {
                from: earlier,
                to: later
            })
        );

        let nan = SearchFilters::new().with_min_confidence(f64::NAN).sanitized();
        assert!(nan.min_confidence.is_none());
    }
}
