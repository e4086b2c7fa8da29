//! Participant identity and the presence table.

use std::collections::HashMap;

use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ClientConfig;

/// Unique identifier for participants, assigned once per session.
pub type ParticipantId = Uuid;

/// Colors handed out to participants without a configured color.
pub const PRESENCE_PALETTE: [&str; 5] = ["#e11d48", "#0ea5e9", "#22c55e", "#a855f7", "#f97316"];

/// A participant and, once it has moved, its last known pointer position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Presence color (cursor and roster).
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Participant {
    /// Create a participant with a fresh id and no position.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: color.into(),
            x: None,
            y: None,
        }
    }

    /// Create a participant with a generated name (`User-NNNN`) and a
    /// palette color.
    pub fn generate() -> Self {
        Self::new(random_name(), random_color())
    }

    /// Create the local participant, generating whatever the config leaves out.
    pub fn from_config(config: &ClientConfig) -> Self {
        let name = config.user_name.clone().unwrap_or_else(random_name);
        let color = config.user_color.clone().unwrap_or_else(random_color);
        Self::new(name, color)
    }

    /// A copy of this participant positioned at `(x, y)`.
    pub fn at(&self, x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..self.clone()
        }
    }

    /// A copy of this participant with the position stripped (join payload).
    pub fn without_position(&self) -> Self {
        Self {
            x: None,
            y: None,
            ..self.clone()
        }
    }

    /// Last known pointer position, if any.
    pub fn position(&self) -> Option<Point> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// Random bits for identity generation.
///
/// uuid v4 is already random on every platform we target (including wasm),
/// so it doubles as the entropy source.
fn random_bits() -> u128 {
    Uuid::new_v4().as_u128()
}

fn random_name() -> String {
    let number = 1000 + (random_bits() % 9000);
    format!("User-{number}")
}

fn random_color() -> String {
    let index = (random_bits() % PRESENCE_PALETTE.len() as u128) as usize;
    PRESENCE_PALETTE[index].to_string()
}

/// Last known state of every participant this client has heard from.
///
/// Entries are never removed: a peer that disconnects simply goes stale.
#[derive(Debug, Clone, Default)]
pub struct PresenceTable {
    participants: HashMap<ParticipantId, Participant>,
}

impl PresenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry. Repeated delivery is harmless.
    pub fn upsert(&mut self, participant: Participant) {
        self.participants.insert(participant.id, participant);
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Everyone except `self_id`, sorted by name for a stable roster.
    pub fn peers(&self, self_id: ParticipantId) -> Vec<&Participant> {
        let mut peers: Vec<&Participant> = self
            .participants
            .values()
            .filter(|p| p.id != self_id)
            .collect();
        peers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        peers
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_identity() {
        let participant = Participant::generate();
        let number: u32 = participant.name.strip_prefix("User-").unwrap().parse().unwrap();
        assert!((1000..=9999).contains(&number));
        assert!(PRESENCE_PALETTE.contains(&participant.color.as_str()));
        assert!(participant.position().is_none());
    }

    #[test]
    fn test_config_identity_fills_gaps() {
        let config = ClientConfig {
            user_name: Some("Ada".to_string()),
            ..ClientConfig::default()
        };
        let participant = Participant::from_config(&config);
        assert_eq!(participant.name, "Ada");
        assert!(PRESENCE_PALETTE.contains(&participant.color.as_str()));
    }

    #[test]
    fn test_position_omitted_on_wire_until_set() {
        let participant = Participant::new("Ada", "#000");
        let json = serde_json::to_value(&participant).unwrap();
        assert!(json.get("x").is_none());

        let moved = participant.at(3.0, 4.0);
        let json = serde_json::to_value(&moved).unwrap();
        assert_eq!(json["x"], 3.0);
        assert_eq!(moved.position(), Some(Point::new(3.0, 4.0)));
        assert!(moved.without_position().position().is_none());
    }

    #[test]
    fn test_upsert_overwrites() {
        let mut table = PresenceTable::new();
        let ada = Participant::new("Ada", "#000");
        table.upsert(ada.clone());
        table.upsert(ada.at(1.0, 2.0));
        table.upsert(ada.at(1.0, 2.0));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(ada.id).unwrap().position(), Some(Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_peers_excludes_self() {
        let mut table = PresenceTable::new();
        let me = Participant::new("Me", "#000");
        let bob = Participant::new("Bob", "#111");
        let ada = Participant::new("Ada", "#222");
        table.upsert(me.clone());
        table.upsert(bob.clone());
        table.upsert(ada.clone());

        let names: Vec<&str> = table.peers(me.id).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Bob"]);
    }
}
