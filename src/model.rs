//! Decoded domain model: players and their odds points for one payload.
//!
//! Serialized field names follow the wire shape the downstream odds service
//! consumes (`player_name`, `value`, `odds`, `type`).
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::odds::decimal_odds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Over,
    Under,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsPoint {
    /// Line the odds are offered against, e.g. `"10"` points.
    #[serde(rename = "value")]
    pub threshold: String,
    #[serde(rename = "odds")]
    pub fractional_odds: String,
    pub decimal_odds: Option<f64>,
    #[serde(rename = "type")]
    pub side: Side,
}

impl OddsPoint {
    pub fn new(threshold: &str, fractional_odds: &str, side: Side) -> Self {
        OddsPoint {
            threshold: threshold.to_string(),
            fractional_odds: fractional_odds.to_string(),
            decimal_odds: decimal_odds(fractional_odds),
            side,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerOddsEntry {
    pub player_name: String,
    /// Discovery order; a threshold seen twice is appended twice.
    pub odds: Vec<OddsPoint>,
}

/// One match group as announced by the feed, with the event it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub event_id: Option<String>,
    /// Leading `TB` segment of the event, e.g. `18#Basketball`.
    pub category: Option<String>,
    pub teams: String,
    /// `YYYY-MM-DD HH:MM:SS`, or the raw `BC` value if it did not parse.
    pub start_time: Option<String>,
    pub league: Option<String>,
}

/// Result of decoding one payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedPayload {
    pub stat: Option<String>,
    pub players: Vec<PlayerOddsEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<MatchInfo>,
}

impl ParsedPayload {
    /// True when the payload held no recognizable market; callers treat this
    /// as a no-op. Match metadata alone does not count.
    pub fn is_empty(&self) -> bool {
        self.stat.is_none() && self.players.is_empty()
    }

    pub fn player(&self, name: &str) -> Option<&PlayerOddsEntry> {
        self.players.iter().find(|p| p.player_name == name)
    }
}

/// Accumulates player entries while decoding, one entry per distinct name in
/// first-seen order.
#[derive(Debug, Default)]
pub struct PlayerBook {
    players: Vec<PlayerOddsEntry>,
    index: HashMap<String, usize>,
}

impl PlayerBook {
    pub fn push(&mut self, player_name: &str, point: OddsPoint) {
        let idx = match self.index.get(player_name) {
            Some(&idx) => idx,
            None => {
                self.players.push(PlayerOddsEntry { player_name: player_name.to_string(), odds: Vec::new() });
                self.index.insert(player_name.to_string(), self.players.len() - 1);
                self.players.len() - 1
            }
        };
        self.players[idx].odds.push(point);
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn into_payload(self, stat: Option<String>) -> ParsedPayload {
        ParsedPayload { stat, players: self.players, matches: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_keeps_first_seen_order_and_appends_duplicates() {
        let mut b = PlayerBook::default();
        b.push("Bob", OddsPoint::new("10", "1/2", Side::Over));
        b.push("Alice", OddsPoint::new("10", "1/4", Side::Over));
        b.push("Bob", OddsPoint::new("10", "1/2", Side::Over));
        assert_eq!(b.len(), 2);
        let p = b.into_payload(Some("Points".into()));
        assert_eq!(p.players[0].player_name, "Bob");
        assert_eq!(p.players[0].odds.len(), 2);
        assert_eq!(p.player("Alice").map(|e| e.odds.len()), Some(1));
    }

    #[test]
    fn serializes_to_wire_shape() {
        let point = OddsPoint::new("4.5", "bad", Side::Under);
        let v = serde_json::to_value(&point).unwrap();
        assert_eq!(v["value"], "4.5");
        assert_eq!(v["odds"], "bad");
        assert!(v["decimal_odds"].is_null());
        assert_eq!(v["type"], "under");
    }

    #[test]
    fn empty_payload_is_noop() {
        assert!(ParsedPayload::default().is_empty());
        let p = ParsedPayload { stat: Some("Steals".into()), ..Default::default() };
        assert!(!p.is_empty());
        let p = ParsedPayload { matches: vec![MatchInfo::default()], ..Default::default() };
        assert!(p.is_empty());
        let v = serde_json::to_value(ParsedPayload::default()).unwrap();
        assert!(v.get("matches").is_none());
    }
}
