//! Meeting note composition.

use crate::model::MeetingEvent;

/// Build the HTML note body for one meeting.
///
/// Composed once per event and attached verbatim to every matched contact.
/// The roster lists every attendee of the meeting, including internal ones
/// the pipeline skips; the note describes the meeting, not the recipient.
pub fn compose_note(event: &MeetingEvent) -> String {
    let mut content = format!("<h2>{}</h2>", event.title);
    if let Some(url) = event.recording_url.as_deref() {
        content.push_str(&format!(
            "<p><strong>Recording Link:</strong> <a href=\"{url}\" target=\"_blank\">{url}</a></p>"
        ));
    }
    content.push_str("<h4>Attendees:</h4><ul>");
    for attendee in &event.attendees {
        let name = if attendee.name.is_empty() {
            "N/A"
        } else {
            attendee.name.as_str()
        };
        content.push_str(&format!("<li>{} ({})</li>", name, attendee.email));
    }
    content.push_str("</ul>");
    content
}
