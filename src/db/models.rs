use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Monuments
// ============================================================================

/// Historical variants of a monument's 3D model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoricalModels {
    /// Roughly a century ago.
    pub past: String,
    /// As originally constructed.
    pub ancient: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Monument {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    /// `[longitude, latitude]`
    pub coordinates: (f64, f64),
    pub description: String,
    pub year_built: String,
    pub dynasty: String,
    pub primary_model: String,
    pub historical_models: HistoricalModels,
    pub facts: Vec<String>,
    pub visiting_hours: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_fee: Option<String>,
    #[serde(rename = "UNESCO", default, skip_serializing_if = "Option::is_none")]
    pub unesco: Option<bool>,
}

impl Monument {
    /// Model asset shown for the given period.
    pub fn model_for(&self, period: Period) -> &str {
        match period {
            Period::Present => &self.primary_model,
            Period::Past => &self.historical_models.past,
            Period::Ancient => &self.historical_models.ancient,
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.0
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.1
    }
}

// ============================================================================
// Periods
// ============================================================================

/// The historical snapshot selected for a monument's visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Period {
    Ancient,
    Past,
    Present,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Ancient, Period::Past, Period::Present];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Ancient => "ancient",
            Period::Past => "past",
            Period::Present => "present",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ancient" => Ok(Period::Ancient),
            "past" => Ok(Period::Past),
            "present" => Ok(Period::Present),
            other => Err(crate::error::AppError::Validation(format!(
                "unknown period '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Visits
// ============================================================================

/// Server-side visit log entry returned by `POST /api/monuments/{id}/visit`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MonumentVisit {
    pub id: i64,
    pub monument_id: String,
    pub visit_date: String,
    pub last_action: String,
}

/// One row of the client-side visit counter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VisitedMonument {
    pub id: String,
    pub visit_count: u64,
    pub last_visited: String,
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: String,
}

impl ChatMessage {
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            sender,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monument_wire_format() {
        let json = r#"{
            "id": "x", "name": "X", "city": "C", "state": "S",
            "coordinates": [77.1, 28.5],
            "description": "d", "yearBuilt": "1900", "dynasty": "D",
            "primaryModel": "/m/x.glb",
            "historicalModels": { "past": "/m/x_past.glb", "ancient": "/m/x_old.glb" },
            "facts": ["f"], "visitingHours": "always", "UNESCO": true
        }"#;
        let m: Monument = serde_json::from_str(json).unwrap();
        assert_eq!(m.longitude(), 77.1);
        assert_eq!(m.latitude(), 28.5);
        assert_eq!(m.unesco, Some(true));
        assert!(m.entry_fee.is_none());
        assert_eq!(m.model_for(Period::Present), "/m/x.glb");
        assert_eq!(m.model_for(Period::Past), "/m/x_past.glb");
        assert_eq!(m.model_for(Period::Ancient), "/m/x_old.glb");

        let back = serde_json::to_value(&m).unwrap();
        assert_eq!(back["yearBuilt"], "1900");
        assert_eq!(back["UNESCO"], true);
        assert!(back.get("entryFee").is_none());
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("past".parse::<Period>().unwrap(), Period::Past);
        assert!("future".parse::<Period>().is_err());
        assert_eq!(serde_json::to_string(&Period::Ancient).unwrap(), "\"ancient\"");
    }
}
