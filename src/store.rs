use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::locale::Language;

/// One open work item, normalized to display strings for the requested
/// language. `classification`/`tier_queue` may be absent and render as
/// empty strings, never as null markup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub id: String,
    pub title: String,
    pub created_date: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub tier_queue: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind { RelatesTo, AffectedUser, AssignedTo }

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub kind: RelationshipKind,
    pub target_display_name: String,
}

/// Query surface of the ticketing store. State filtering and enumeration
/// display-name resolution happen behind this boundary; the pipeline only
/// ever sees Active incidents carrying display strings.
pub trait IncidentStore {
    fn fetch_active_incidents(&self, lang: Language) -> Result<Vec<IncidentRecord>>;
    fn fetch_relationship_edges(&self, incident_id: &str) -> Result<Vec<RelationshipEdge>>;
}

/// Enumeration display text as exported by the ticketing system.
#[derive(Clone, Debug, Deserialize)]
struct LocalizedText {
    sv: String,
    en: String,
}

impl LocalizedText {
    fn get(&self, lang: Language) -> &str {
        match lang { Language::Sv => &self.sv, Language::En => &self.en }
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotIncident {
    id: String,
    title: String,
    created_date: DateTime<Utc>,
    state: String,
    status: LocalizedText,
    #[serde(default)]
    classification: Option<LocalizedText>,
    #[serde(default)]
    tier_queue: Option<LocalizedText>,
}

#[derive(Debug, Deserialize)]
struct SnapshotRelationship {
    source_id: String,
    kind: RelationshipKind,
    target_display_name: String,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    incidents: Vec<SnapshotIncident>,
    #[serde(default)]
    relationships: Vec<SnapshotRelationship>,
}

/// File-backed store reading a JSON snapshot exported from the ticketing
/// system.
pub struct SnapshotStore {
    snapshot: Snapshot,
}

impl SnapshotStore {
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
        Ok(Self { snapshot })
    }

    #[cfg(test)]
    fn from_json(data: &str) -> Result<Self> {
        Ok(Self { snapshot: serde_json::from_str(data)? })
    }
}

impl IncidentStore for SnapshotStore {
    fn fetch_active_incidents(&self, lang: Language) -> Result<Vec<IncidentRecord>> {
        let records = self
            .snapshot
            .incidents
            .iter()
            .filter(|i| i.state == "Active")
            .map(|i| IncidentRecord {
                id: i.id.clone(),
                title: i.title.clone(),
                created_date: i.created_date,
                status: i.status.get(lang).to_string(),
                classification: i.classification.as_ref().map(|c| c.get(lang).to_string()),
                tier_queue: i.tier_queue.as_ref().map(|t| t.get(lang).to_string()),
            })
            .collect();
        Ok(records)
    }

    fn fetch_relationship_edges(&self, incident_id: &str) -> Result<Vec<RelationshipEdge>> {
        // Snapshot order is the collaborator-returned order; it is
        // authoritative and must not be re-sorted.
        let edges = self
            .snapshot
            .relationships
            .iter()
            .filter(|r| r.source_id == incident_id)
            .map(|r| RelationshipEdge { kind: r.kind, target_display_name: r.target_display_name.clone() })
            .collect();
        Ok(edges)
    }
}
