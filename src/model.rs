use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One meeting attendee, paired positionally from the webhook's name and
/// email lists. The name may be empty; the email never is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attendee {
    pub name: String,
    pub email: String,
}

/// A meeting-completion event, built once per webhook call and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingEvent {
    pub title: String,
    pub recording_url: Option<String>,
    pub attendees: Vec<Attendee>,
}

/// A person confirmed by an exact-match email search in Pipedrive. Never
/// constructed speculatively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMatch {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Terminal classification of one attendee's processing for one event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutcomeStatus {
    FoundAndNoteAdded,
    FoundButNoteFailed,
    NotFoundInCrm,
}

impl OutcomeStatus {
    /// Format-stable audit strings; the on-disk log is read by an external
    /// viewer, so these must not change.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::FoundAndNoteAdded => "Found and Note Added",
            OutcomeStatus::FoundButNoteFailed => "Found but Note Failed",
            OutcomeStatus::NotFoundInCrm => "Not Found in Pipedrive",
        }
    }
}

/// One append-only audit row per non-excluded attendee per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub timestamp: DateTime<Utc>,
    pub attendee_name: String,
    pub attendee_email: String,
    pub meeting_title: String,
    pub status: OutcomeStatus,
    pub person_id: Option<i64>,
}
