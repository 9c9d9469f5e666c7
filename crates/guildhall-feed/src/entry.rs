//! Feed entry types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The broad category of a feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// Gold sales and gold donations.
    Gold,
    /// Item listings and item donations.
    Item,
    /// Loan lifecycle steps.
    Loan,
    /// Party joins and leaves.
    Party,
}

impl FeedKind {
    /// The wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Item => "item",
            Self::Loan => "loan",
            Self::Party => "party",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gold" => Ok(Self::Gold),
            "item" => Ok(Self::Item),
            "loan" => Ok(Self::Loan),
            "party" => Ok(Self::Party),
            other => Err(format!("unknown feed kind: {other}")),
        }
    }
}

/// One rendered line of guild activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    /// The originating event's id.
    pub id: Uuid,
    /// Category.
    #[serde(rename = "type")]
    pub kind: FeedKind,
    /// What happened within the category, e.g. `approve` or `joined`.
    pub sub_type: String,
    /// Human-readable text.
    pub text: String,
    /// When the originating event was committed.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_kind_parses_wire_names() {
        assert_eq!("loan".parse::<FeedKind>(), Ok(FeedKind::Loan));
        assert!("quest".parse::<FeedKind>().is_err());
    }

    #[test]
    fn test_feed_entry_serializes_kind_as_type() {
        let entry = FeedEntry {
            id: Uuid::nil(),
            kind: FeedKind::Party,
            sub_type: "joined".into(),
            text: "Aster joined a party for Sea Dragon Nest".into(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        };

        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["type"], "party");
        assert_eq!(json["sub_type"], "joined");
    }
}
