use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ticket identifier as the backend sends it. Kept in its wire shape so it
/// round-trips into JSON bodies unchanged.
///
/// Equality and hashing go through the textual form, so `42` and `"42"`
/// name the same ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TicketId {
    Number(i64),
    Text(String),
}

impl TicketId {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse::<i64>() {
            Ok(number) => TicketId::Number(number),
            Err(_) => TicketId::Text(trimmed.to_string()),
        }
    }
}

impl PartialEq for TicketId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TicketId::Number(a), TicketId::Number(b)) => a == b,
            (TicketId::Text(a), TicketId::Text(b)) => a == b,
            (TicketId::Number(number), TicketId::Text(text))
            | (TicketId::Text(text), TicketId::Number(number)) => number.to_string() == *text,
        }
    }
}

impl Eq for TicketId {}

impl Hash for TicketId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            TicketId::Number(number) => number.to_string().hash(state),
            TicketId::Text(text) => text.hash(state),
        }
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketId::Number(number) => write!(f, "{number}"),
            TicketId::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty and whitespace-only ids mean "unassigned".
    pub fn normalize(value: Option<UserId>) -> Option<UserId> {
        value.filter(|id| !id.0.trim().is_empty())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawUserId {
            Number(i64),
            Text(String),
        }

        Ok(match RawUserId::deserialize(deserializer)? {
            RawUserId::Number(number) => UserId(number.to_string()),
            RawUserId::Text(text) => UserId(text),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
    Other(u8),
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Closed => "Closed",
            TicketStatus::Other(_) => "Unknown",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "1" | "open" => Some(TicketStatus::Open),
            "2" | "in-progress" | "in progress" | "progress" => Some(TicketStatus::InProgress),
            "3" | "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

impl From<u8> for TicketStatus {
    fn from(code: u8) -> Self {
        match code {
            1 => TicketStatus::Open,
            2 => TicketStatus::InProgress,
            3 => TicketStatus::Closed,
            other => TicketStatus::Other(other),
        }
    }
}

impl From<TicketStatus> for u8 {
    fn from(status: TicketStatus) -> Self {
        match status {
            TicketStatus::Open => 1,
            TicketStatus::InProgress => 2,
            TicketStatus::Closed => 3,
            TicketStatus::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum TicketPriority {
    High,
    Medium,
    Low,
    Other(u8),
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::High => "High",
            TicketPriority::Medium => "Medium",
            TicketPriority::Low => "Low",
            TicketPriority::Other(_) => "Unknown",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "1" | "high" => Some(TicketPriority::High),
            "2" | "medium" => Some(TicketPriority::Medium),
            "3" | "low" => Some(TicketPriority::Low),
            _ => None,
        }
    }
}

impl From<u8> for TicketPriority {
    fn from(code: u8) -> Self {
        match code {
            1 => TicketPriority::High,
            2 => TicketPriority::Medium,
            3 => TicketPriority::Low,
            other => TicketPriority::Other(other),
        }
    }
}

impl From<TicketPriority> for u8 {
    fn from(priority: TicketPriority) -> Self {
        match priority {
            TicketPriority::High => 1,
            TicketPriority::Medium => 2,
            TicketPriority::Low => 3,
            TicketPriority::Other(code) => code,
        }
    }
}

/// Reads a status or priority code. Anything that is not a number in
/// `0..=255` (null, text, out of range) becomes code 0, which renders as
/// "Unknown" instead of failing the whole listing.
fn lenient_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let code = match &value {
        serde_json::Value::Number(number) => number.as_u64(),
        serde_json::Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(code.and_then(|code| u8::try_from(code).ok()).unwrap_or(0))
}

impl<'de> Deserialize<'de> for TicketStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_code(deserializer).map(TicketStatus::from)
    }
}

impl<'de> Deserialize<'de> for TicketPriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_code(deserializer).map(TicketPriority::from)
    }
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::Other(0)
    }
}

impl Default for TicketPriority {
    fn default() -> Self {
        TicketPriority::Other(0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default, deserialize_with = "assignee")]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The editable, server-confirmed part of a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFields {
    pub name: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub assigned_to: Option<UserId>,
}

impl TicketFields {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            name: ticket.name.clone(),
            description: ticket.description.clone(),
            status: ticket.status,
            priority: ticket.priority,
            assigned_to: UserId::normalize(ticket.assigned_to.clone()),
        }
    }
}

/// Assignee change carried by an update. `Unassigned` is sent as an empty
/// value, which the backend turns into "no assignee".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Unassigned,
    User(UserId),
}

impl Assignment {
    pub fn wire_value(&self) -> &str {
        match self {
            Assignment::Unassigned => "",
            Assignment::User(id) => id.as_str(),
        }
    }
}

impl From<Option<UserId>> for Assignment {
    fn from(value: Option<UserId>) -> Self {
        match UserId::normalize(value) {
            Some(id) => Assignment::User(id),
            None => Assignment::Unassigned,
        }
    }
}

impl Serialize for Assignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Assignment::Unassigned => serializer.serialize_none(),
            Assignment::User(id) => serializer.serialize_str(id.as_str()),
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn assignee<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<UserId>, D::Error> {
    Ok(UserId::normalize(Option::<UserId>::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn parses_ticket_from_backend_shape() {
        let ticket: Ticket = serde_json::from_str(
            r#"{"id": 7, "name": null, "description": "Leaking tap", "status": 2,
                "priority": 1, "assigned_to": "", "created_at": "2025-01-03T10:00:00Z"}"#,
        )
        .expect("ticket json");

        assert_eq!(ticket.id, TicketId::Number(7));
        assert_eq!(ticket.name, "");
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.priority, TicketPriority::High);
        assert_eq!(ticket.assigned_to, None);
    }

    #[test]
    fn keeps_unknown_codes() {
        let ticket: Ticket = serde_json::from_str(
            r#"{"id": "a1", "status": 9, "priority": 0, "assigned_to": 42}"#,
        )
        .expect("ticket json");

        assert_eq!(ticket.status, TicketStatus::Other(9));
        assert_eq!(ticket.status.as_str(), "Unknown");
        assert_eq!(ticket.priority.as_str(), "Unknown");
        assert_eq!(ticket.assigned_to, Some(UserId("42".to_string())));
    }

    #[test]
    fn malformed_codes_render_as_unknown() {
        let tickets: Vec<Ticket> = serde_json::from_str(
            r#"[{"id": 1, "status": null, "priority": 300},
                {"id": 2, "status": "3", "priority": "urgent"},
                {"id": 3}]"#,
        )
        .expect("ticket json");

        assert_eq!(tickets[0].status.as_str(), "Unknown");
        assert_eq!(tickets[0].priority.as_str(), "Unknown");
        assert_eq!(tickets[1].status, TicketStatus::Closed);
        assert_eq!(tickets[1].priority.as_str(), "Unknown");
        assert_eq!(tickets[2].status, TicketStatus::Other(0));
    }

    #[test]
    fn numeric_text_ids_match_cli_input() {
        let ticket: Ticket =
            serde_json::from_str(r#"{"id": "42", "status": 1, "priority": 2}"#).expect("ticket json");

        assert_eq!(ticket.id, TicketId::Text("42".to_string()));
        assert_eq!(ticket.id, TicketId::parse("42"));
        assert_eq!(TicketId::parse("42"), ticket.id);

        let ids: HashSet<TicketId> = [ticket.id.clone(), TicketId::Number(42)].into_iter().collect();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn parses_ticket_ids_from_cli_input() {
        assert_eq!(TicketId::parse(" 12 "), TicketId::Number(12));
        assert_eq!(
            TicketId::parse("c0ffee"),
            TicketId::Text("c0ffee".to_string())
        );
    }

    #[test]
    fn parses_status_and_priority_names() {
        assert_eq!(
            TicketStatus::from_str("In-Progress"),
            Some(TicketStatus::InProgress)
        );
        assert_eq!(TicketStatus::from_str("3"), Some(TicketStatus::Closed));
        assert_eq!(TicketPriority::from_str("LOW"), Some(TicketPriority::Low));
        assert_eq!(TicketPriority::from_str("urgent"), None);
    }

    #[test]
    fn assignment_wire_values() {
        assert_eq!(Assignment::from(None).wire_value(), "");
        assert_eq!(
            Assignment::from(Some(UserId(" ".to_string()))),
            Assignment::Unassigned
        );
        assert_eq!(
            Assignment::User(UserId("u-1".to_string())).wire_value(),
            "u-1"
        );
    }
}
