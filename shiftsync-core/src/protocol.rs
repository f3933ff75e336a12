//! JSON protocol spoken with collaborator binaries over stdin/stdout.
//!
//! Store providers (`shiftsync-store-<name>`) get one request per process;
//! renderers (`shiftsync-renderer-<name>`) stay alive for a whole crawl and
//! get one request per line. Both answer with the same envelope.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::parse::{DayCell, LiveColumnMap};
use crate::shift::{RemoteEvent, Shift};

/// Request envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request<C> {
    pub command: C,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

// ============================================================================
// Store provider commands
// ============================================================================

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListEvents,
    InsertShift,
    DeleteEvent,
}

/// A shift as sent to a store: instants with their offset plus the zone name
/// so the store can keep wall-clock times stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftPayload {
    pub label: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub time_zone: String,
}

impl From<&Shift> for ShiftPayload {
    fn from(shift: &Shift) -> Self {
        ShiftPayload {
            label: shift.label.clone(),
            start: shift.start.fixed_offset(),
            end: shift.end.fixed_offset(),
            time_zone: shift.start.timezone().name().to_string(),
        }
    }
}

/// List events with the given label that overlap `[from, to)`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    #[serde(flatten)]
    pub store_config: serde_json::Map<String, serde_json::Value>,
    pub from: String,
    pub to: String,
    pub label: String,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<RemoteEvent>;
    fn command() -> Command {
        Command::ListEvents
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertShift {
    #[serde(flatten)]
    pub store_config: serde_json::Map<String, serde_json::Value>,
    pub shift: ShiftPayload,
}

impl ProviderCommand for InsertShift {
    type Response = RemoteEvent;
    fn command() -> Command {
        Command::InsertShift
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub store_config: serde_json::Map<String, serde_json::Value>,
    pub remote_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}

// ============================================================================
// Renderer commands
// ============================================================================

pub trait RendererCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> RenderCommand;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderCommand {
    Reset,
    Snapshot,
    ColumnDates,
    SelectDay,
    PanelText,
    NextPeriod,
}

/// Return to the first schedule period. Carries the renderer config.
#[derive(Debug, Serialize, Deserialize)]
pub struct Reset {
    #[serde(flatten)]
    pub renderer_config: serde_json::Map<String, serde_json::Value>,
}

impl RendererCommand for Reset {
    type Response = ();
    fn command() -> RenderCommand {
        RenderCommand::Reset
    }
}

/// Serialized markup of the current page.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {}

impl RendererCommand for Snapshot {
    type Response = Option<String>;
    fn command() -> RenderCommand {
        RenderCommand::Snapshot
    }
}

/// Column index to ISO date as read from the live DOM.
#[derive(Debug, Serialize, Deserialize)]
pub struct ColumnDates {}

impl RendererCommand for ColumnDates {
    type Response = Option<LiveColumnMap>;
    fn command() -> RenderCommand {
        RenderCommand::ColumnDates
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectDay {
    pub cell: DayCell,
}

impl RendererCommand for SelectDay {
    type Response = bool;
    fn command() -> RenderCommand {
        RenderCommand::SelectDay
    }
}

/// Text of whichever detail panel is currently visible.
#[derive(Debug, Serialize, Deserialize)]
pub struct PanelText {}

impl RendererCommand for PanelText {
    type Response = Option<String>;
    fn command() -> RenderCommand {
        RenderCommand::PanelText
    }
}

/// Advance one period; answers whether the visible period changed.
#[derive(Debug, Serialize, Deserialize)]
pub struct NextPeriod {}

impl RendererCommand for NextPeriod {
    type Response = bool;
    fn command() -> RenderCommand {
        RenderCommand::NextPeriod
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::America::New_York;

    #[test]
    fn test_shift_payload_keeps_zone_and_offset() {
        let shift = Shift::new(
            New_York.with_ymd_and_hms(2025, 8, 17, 7, 0, 0).unwrap(),
            New_York.with_ymd_and_hms(2025, 8, 17, 16, 0, 0).unwrap(),
            "Work",
        );
        let payload = ShiftPayload::from(&shift);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["start"], "2025-08-17T07:00:00-04:00");
        assert_eq!(json["end"], "2025-08-17T16:00:00-04:00");
        assert_eq!(json["time_zone"], "America/New_York");
    }

    #[test]
    fn test_request_shape() {
        let mut config = serde_json::Map::new();
        config.insert("calendar_id".into(), "primary".into());
        let cmd = ListEvents {
            store_config: config,
            from: "2025-08-14T10:00:00-04:00".into(),
            to: "2025-11-13T10:00:00-05:00".into(),
            label: "Work".into(),
        };
        let request = Request {
            command: ListEvents::command(),
            params: serde_json::to_value(cmd).unwrap(),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["command"], "list_events");
        assert_eq!(json["params"]["calendar_id"], "primary");
        assert_eq!(json["params"]["label"], "Work");
    }

    #[test]
    fn test_select_day_serializes_iso_date() {
        let cmd = SelectDay {
            cell: DayCell {
                date: NaiveDate::from_ymd_opt(2025, 8, 17).unwrap(),
                ordinal: 2,
            },
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["cell"]["date"], "2025-08-17");
        assert_eq!(json["cell"]["ordinal"], 2);
    }

    #[test]
    fn test_responses_parse() {
        let ok: Response<Option<LiveColumnMap>> =
            serde_json::from_str(r#"{"status":"success","data":{"0":"2025-08-17"}}"#).unwrap();
        match ok {
            Response::Success { data: Some(map) } => {
                assert_eq!(map.get(&0).map(String::as_str), Some("2025-08-17"))
            }
            _ => panic!("expected a column map"),
        }

        let err: Response<bool> =
            serde_json::from_str(r#"{"status":"error","error":"no grid"}"#).unwrap();
        assert!(matches!(err, Response::Error { error } if error == "no grid"));
    }
}
