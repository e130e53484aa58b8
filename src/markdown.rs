use crate::locale::{Label, Language};
use crate::resolve::ReportRow;

pub fn render_markdown(rows: &[ReportRow], lang: Language, title: &str, generated: &str) -> String {
    let mut s = String::new();
    s.push_str(&format!("# {}\n\n", title));
    s.push_str(&format!("{} {} · {} {}\n\n", rows.len(), Label::OpenIncidents.text(lang), Label::Generated.text(lang), generated));
    for row in rows {
        let inc = &row.incident;
        let sum = &row.summary;
        s.push_str(&format!("## {} · {}\n", inc.id, inc.title.replace('\n', " ")));
        s.push_str(&format!("- {}: {}\n", Label::Created.text(lang), inc.created_date.format("%Y-%m-%d %H:%M")));
        s.push_str(&format!("- {}: {}\n", Label::Status.text(lang), inc.status));
        s.push_str(&format!("- {}: {}\n", Label::AffectedUser.text(lang), sum.affected_user));
        s.push_str(&format!("- {}: {}\n", Label::AssignedTo.text(lang), sum.assigned_to));
        s.push_str(&format!("- {}: {}\n", Label::Classification.text(lang), inc.classification.as_deref().unwrap_or("")));
        s.push_str(&format!("- {}: {}\n", Label::TierQueue.text(lang), inc.tier_queue.as_deref().unwrap_or("")));
        s.push_str(&format!("- {}: {}\n\n", Label::RelatedItems.text(lang), sum.related_count));
    }
    s
}
