//! Push-event payload model.
//!
//! Only the fields the processor consumes are modeled; the rest of the
//! platform's payload is ignored during deserialization.

use serde::Deserialize;

/// One push notification, constructed per webhook delivery and consumed
/// once.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    /// The pushed ref, e.g. `refs/heads/release-2.0`.
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// The repository the push landed in.
    pub repository: EventRepository,

    /// The App installation this delivery belongs to. Absent when the
    /// webhook is not delivered through an App installation.
    #[serde(default)]
    pub installation: Option<EventInstallation>,
}

/// Repository fields of a push payload.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRepository {
    /// Repository name without the owner prefix.
    pub name: String,

    /// Repository owner.
    pub owner: EventOwner,
}

/// Owner fields of a push payload. Push payloads carry the owner as a
/// committer-style object whose `name` holds the login.
#[derive(Debug, Clone, Deserialize)]
pub struct EventOwner {
    /// Owner login.
    #[serde(alias = "login")]
    pub name: String,
}

/// Installation reference attached to App webhook deliveries.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EventInstallation {
    /// Installation id.
    pub id: u64,
}

impl PushEvent {
    /// Installation id carried by the delivery, if any.
    #[must_use]
    pub fn installation_id(&self) -> Option<u64> {
        self.installation.map(|i| i.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_push_payload() {
        let payload = r##"{
            "ref": "refs/heads/release-2.0",
            "before": "0000000000000000000000000000000000000000",
            "repository": {
                "id": 1296269,
                "name": "repo1",
                "full_name": "snimmagadda1/repo1",
                "owner": { "name": "snimmagadda1", "email": "s@example.com" }
            },
            "installation": { "id": 12345678, "node_id": "MDIz" },
            "pusher": { "name": "snimmagadda1" }
        }"##;

        let event: PushEvent = serde_json::from_str(payload).unwrap();

        assert_eq!(event.git_ref, "refs/heads/release-2.0");
        assert_eq!(event.repository.name, "repo1");
        assert_eq!(event.repository.owner.name, "snimmagadda1");
        assert_eq!(event.installation_id(), Some(12_345_678));
    }

    #[test]
    fn installation_is_optional() {
        let payload = r##"{
            "ref": "refs/heads/main",
            "repository": { "name": "repo1", "owner": { "login": "someone" } }
        }"##;

        let event: PushEvent = serde_json::from_str(payload).unwrap();

        assert_eq!(event.installation_id(), None);
        assert_eq!(event.repository.owner.name, "someone");
    }

    #[test]
    fn missing_ref_is_an_error() {
        let payload = r##"{ "repository": { "name": "repo1", "owner": { "name": "x" } } }"##;

        assert!(serde_json::from_str::<PushEvent>(payload).is_err());
    }
}
