//! Record builders shared by the integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use vigil::search::{Device, Event, Identity, RecordId};

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}

pub fn device(id: &str, name: &str, active: bool, created_at: DateTime<Utc>) -> Device {
    Device {
        id: RecordId::from(id),
        display_name: name.to_string(),
        location_label: None,
        is_active: active,
        created_at,
    }
}

pub fn identity(id: &str, name: &str, active: bool, created_at: DateTime<Utc>) -> Identity {
    Identity {
        id: RecordId::from(id),
        display_name: name.to_string(),
        description: None,
        is_active: active,
        created_at,
    }
}

pub fn event(id: &str, event_type: &str, confidence: f64, occurred_at: DateTime<Utc>) -> Event {
    Event {
        id: RecordId::from(id),
        device_id: None,
        device_display_name: None,
        event_type: event_type.to_string(),
        identity_id: None,
        identity_display_name: None,
        confidence,
        similarity_score: None,
        occurred_at,
        image_url: None,
        alert_sent: None,
    }
}

pub fn event_at_device(
    id: &str,
    device_id: &str,
    device_name: &str,
    confidence: f64,
    occurred_at: DateTime<Utc>,
) -> Event {
    Event {
        device_id: Some(RecordId::from(device_id)),
        device_display_name: Some(device_name.to_string()),
        ..event(id, "unknown_face", confidence, occurred_at)
    }
}
