//! Per-event orchestration: filter, look up, publish, record.

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::audit::AuditLog;
use crate::model::{MeetingEvent, OutcomeRecord, OutcomeStatus};
use crate::note;
use crate::pipedrive::CrmService;

/// Whether an attendee email belongs to the organization itself.
///
/// Deliberately a case-sensitive substring test, not a domain-suffix match,
/// to preserve the historical behavior; see the test below for the surprising
/// consequence.
pub fn is_excluded(email: &str, excluded_domain: &str) -> bool {
    email.contains(excluded_domain)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventSummary {
    /// Attendees that went through lookup and got an audit record.
    pub processed: usize,
    /// Attendees skipped by the exclusion filter.
    pub skipped: usize,
}

/// Process one meeting event: for each non-excluded attendee, look the person
/// up in the CRM, attach the shared note on a match, and append exactly one
/// audit record.
///
/// Failures are isolated per attendee. A lookup transport error is recorded
/// as not-found, a note failure as found-but-failed, and an audit-write
/// failure is logged without aborting the remaining attendees.
#[instrument(skip_all, fields(title = %event.title))]
pub async fn process_event(
    crm: &dyn CrmService,
    audit: &AuditLog,
    excluded_domain: &str,
    event: &MeetingEvent,
) -> EventSummary {
    // Same note body for every attendee of this meeting.
    let note_content = note::compose_note(event);
    let mut summary = EventSummary::default();

    info!(attendees = event.attendees.len(), "processing attendees");
    for attendee in &event.attendees {
        if is_excluded(&attendee.email, excluded_domain) {
            info!(email = %attendee.email, "skipping internal attendee");
            summary.skipped += 1;
            continue;
        }

        let (status, person_id) = match crm.find_person_by_email(&attendee.email).await {
            Ok(Some(person)) => match crm.add_note(person.id, &note_content).await {
                Ok(()) => (OutcomeStatus::FoundAndNoteAdded, Some(person.id)),
                Err(err) => {
                    warn!(?err, email = %attendee.email, person_id = person.id, "note creation failed");
                    (OutcomeStatus::FoundButNoteFailed, Some(person.id))
                }
            },
            Ok(None) => (OutcomeStatus::NotFoundInCrm, None),
            Err(err) => {
                // Transport failure routes to the same outcome as a genuine
                // zero-result search; the log line keeps them apart.
                warn!(?err, email = %attendee.email, "person search failed; treating as not found");
                (OutcomeStatus::NotFoundInCrm, None)
            }
        };

        let record = OutcomeRecord {
            timestamp: Utc::now(),
            attendee_name: attendee.name.clone(),
            attendee_email: attendee.email.clone(),
            meeting_title: event.title.clone(),
            status,
            person_id,
        };
        info!(email = %attendee.email, status = status.as_str(), "recording attendee outcome");
        if let Err(err) = audit.append(&record).await {
            error!(?err, email = %attendee.email, "could not write to audit log");
        }
        summary.processed += 1;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_is_substring_containment() {
        let excluded = "@whitelabeliq.com";
        assert!(is_excluded("bob@whitelabeliq.com", excluded));
        assert!(!is_excluded("alice@ext.com", excluded));
        // Substring semantics: not a true suffix match. This address is not
        // on the excluded domain but still contains the substring.
        assert!(is_excluded("user@whitelabeliq.com.evil.org", excluded));
        // Case-sensitive.
        assert!(!is_excluded("bob@WHITELABELIQ.com", excluded));
    }
}
