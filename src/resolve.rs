use indicatif::ProgressBar;
use serde::Serialize;

use crate::store::{IncidentRecord, IncidentStore, RelationshipEdge, RelationshipKind};

/// Relationship facts joined onto one incident. Derived, never persisted.
#[derive(Clone, Debug, Serialize)]
pub struct RelationshipSummary {
    pub affected_user: String,
    pub assigned_to: String,
    pub related_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportRow {
    pub incident: IncidentRecord,
    pub summary: RelationshipSummary,
}

/// First matching edge wins for affected-user and assigned-to; the
/// collaborator-returned order is authoritative and not re-sorted.
pub fn summarize_edges(edges: &[RelationshipEdge]) -> RelationshipSummary {
    let first = |kind: RelationshipKind| {
        edges
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.target_display_name.clone())
            .unwrap_or_default()
    };
    RelationshipSummary {
        affected_user: first(RelationshipKind::AffectedUser),
        assigned_to: first(RelationshipKind::AssignedTo),
        related_count: edges.iter().filter(|e| e.kind == RelationshipKind::RelatesTo).count(),
    }
}

/// Joins each incident against its relationship edges. A failed edge fetch
/// drops that incident with a warning; the rest of the report proceeds.
pub fn resolve_rows(
    store: &dyn IncidentStore,
    incidents: Vec<IncidentRecord>,
    progress: Option<&ProgressBar>,
) -> Vec<ReportRow> {
    let mut rows = Vec::with_capacity(incidents.len());
    for incident in incidents {
        if let Some(pb) = progress { pb.inc(1); }
        match store.fetch_relationship_edges(&incident.id) {
            Ok(edges) => rows.push(ReportRow { summary: summarize_edges(&edges), incident }),
            Err(e) => log::warn!("Relationship lookup failed for {}: {}; incident omitted", incident.id, e),
        }
    }
    rows
}
