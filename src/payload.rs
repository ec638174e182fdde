//! Webhook payload model and attendee extraction.
//!
//! Fathom delivers attendees as two correlated comma-separated strings
//! (`invitees`, `invitees_email`). Extraction pairs them positionally and is
//! deliberately forgiving: a malformed payload yields no attendees rather
//! than an error, and the webhook still reports success.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::model::{Attendee, MeetingEvent};

const DEFAULT_TITLE: &str = "Untitled Meeting";

/// Inbound webhook body. Every field is optional and tolerates non-string
/// JSON values (treated as absent) so that a surprising payload shape can
/// never fail the webhook.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct WebhookPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recording_url: Option<String>,
    /// Comma-separated attendee names.
    #[serde(default, deserialize_with = "lenient_string")]
    pub invitees: Option<String>,
    /// Comma-separated attendee emails.
    #[serde(default, deserialize_with = "lenient_string")]
    pub invitees_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

impl WebhookPayload {
    /// Build the event this payload describes, or `None` when the email list
    /// is absent entirely (as opposed to parsed-but-empty, which yields an
    /// event with no attendees).
    pub fn meeting_event(&self) -> Option<MeetingEvent> {
        let attendees =
            extract_attendees(self.invitees.as_deref(), self.invitees_email.as_deref())?;
        Some(MeetingEvent {
            title: self
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            recording_url: self.recording_url.clone().filter(|u| !u.is_empty()),
            attendees,
        })
    }
}

/// Pair the comma-separated name and email lists positionally.
///
/// The shorter list is padded with empty strings (the longer one is never
/// truncated), and any pair whose email is empty after trimming is dropped.
/// Returns `None` only when the email list itself is absent.
pub fn extract_attendees(names: Option<&str>, emails: Option<&str>) -> Option<Vec<Attendee>> {
    let emails = emails?;
    let names: Vec<&str> = names.unwrap_or("").split(',').map(str::trim).collect();
    let emails: Vec<&str> = emails.split(',').map(str::trim).collect();

    let mut attendees = Vec::new();
    for i in 0..names.len().max(emails.len()) {
        let email = emails.get(i).copied().unwrap_or("");
        if email.is_empty() {
            continue;
        }
        let name = names.get(i).copied().unwrap_or("");
        attendees.push(Attendee {
            name: name.to_string(),
            email: email.to_string(),
        });
    }
    Some(attendees)
}
