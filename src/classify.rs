//! Stat-family classification.
//!
//! The selected statistic is advertised by the first record flagged `LS=1`
//! whose display name is not the `More` menu entry. Which decoder handles the
//! payload is a table lookup on that name so new families can be added from
//! configuration.
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::feed::FeedRecord;

/// Name of the overflow menu entry that is flagged like a real stat.
pub const MORE_SENTINEL: &str = "More";

/// Families decoded with the ladder topology unless configured otherwise.
pub const DEFAULT_LADDER_STATS: [&str; 4] = ["Threes Made", "Points", "Assists", "Rebounds"];

static DEFAULT_TABLE: Lazy<StatTable> = Lazy::new(|| StatTable::with_ladder(DEFAULT_LADDER_STATS));

/// How odds records are correlated with players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Threshold ladder; odds carry an explicit player id.
    Ladder,
    /// Over/under lines; odds are matched to the roster by position.
    Line,
}

/// Stat name to topology lookup. Names not in the table decode as [`Topology::Line`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatTable {
    entries: HashMap<String, Topology>,
}

impl StatTable {
    pub fn with_ladder<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = StatTable::default();
        for name in names {
            table.insert(name, Topology::Ladder);
        }
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, topology: Topology) {
        self.entries.insert(name.into(), topology);
    }

    pub fn topology(&self, stat: Option<&str>) -> Topology {
        stat.and_then(|s| self.entries.get(s).copied()).unwrap_or(Topology::Line)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared default table (`Threes Made`, `Points`, `Assists`, `Rebounds` → ladder).
pub fn default_table() -> &'static StatTable {
    &DEFAULT_TABLE
}

/// Find the selected stat name. Read-only pass over all records.
pub fn selected_stat<'a>(records: &[FeedRecord<'a>]) -> Option<&'a str> {
    records
        .iter()
        .filter(|r| r.get("LS") == Some("1"))
        .filter_map(|r| r.positional_name())
        .find(|name| *name != MORE_SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::tokenize;

    #[test]
    fn picks_first_flagged_non_more_record() {
        let recs = tokenize("MA;NA=More;LS=1;|MA;NA=Rebounds;LS=0;|MA;NA=Points;LS=1;|MA;NA=Assists;LS=1;");
        assert_eq!(selected_stat(&recs), Some("Points"));
    }

    #[test]
    fn more_is_never_selected() {
        let recs = tokenize("MA;NA=More;LS=1;|PA;NA=Alice;");
        assert_eq!(selected_stat(&recs), None);
    }

    #[test]
    fn name_is_positional_not_keyed() {
        let recs = tokenize("MA;ID=M42;NA=Points;LS=1;");
        assert_eq!(selected_stat(&recs), Some("M42"));
    }

    #[test]
    fn table_lookup_defaults_to_line() {
        let t = default_table();
        assert_eq!(t.len(), 4);
        assert_eq!(t.topology(Some("Points")), Topology::Ladder);
        assert_eq!(t.topology(Some("Threes Made")), Topology::Ladder);
        assert_eq!(t.topology(Some("Steals")), Topology::Line);
        assert_eq!(t.topology(None), Topology::Line);
    }

    #[test]
    fn table_is_extensible() {
        let mut t = StatTable::with_ladder(["Blocks"]);
        assert_eq!(t.topology(Some("Points")), Topology::Line);
        assert_eq!(t.topology(Some("Blocks")), Topology::Ladder);
        t.insert("Blocks", Topology::Line);
        assert_eq!(t.topology(Some("Blocks")), Topology::Line);
    }
}
