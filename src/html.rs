use crate::locale::{Label, Language};
use crate::resolve::ReportRow;
use crate::Theme;

const MASTER_COLUMNS: &[Label] = &[
    Label::Id,
    Label::Title,
    Label::AffectedUser,
    Label::AssignedTo,
    Label::Created,
    Label::Status,
    Label::Classification,
    Label::TierQueue,
    Label::RelatedItems,
];

// Filter controls, in toolbar order. The id suffix doubles as the data
// attribute suffix the embedded script scans for.
const FILTER_FIELDS: &[(&str, Label)] = &[
    ("classification", Label::Classification),
    ("affected-user", Label::AffectedUser),
    ("assigned-to", Label::AssignedTo),
    ("tier-queue", Label::TierQueue),
];

pub fn render_html(rows: &[ReportRow], lang: Language, title: &str, theme: Theme, generated: &str) -> String {
    let mut s = String::new();
    s.push_str(&format!("<html lang=\"{}\"><head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"><title>{} ({})</title><style>", lang.tag(), html_escape(title), rows.len()));
    match theme {
        Theme::Dark => s.push_str(":root{--bg:#0a0e13;--fg:#ffffff;--muted:#c0c4cc;--card:#0d131a;--border:#243041;--accent:#3b82f6;--chip:#0f172a} body{margin:0;background:var(--bg);color:var(--fg);font-family:Segoe UI,system-ui,-apple-system,Arial,sans-serif} .container{max-width:1200px;margin:0 auto;padding:24px} .header{display:flex;align-items:center;justify-content:space-between;gap:12px;margin-bottom:16px} .title{font-size:20px;font-weight:600;letter-spacing:.2px} .sub{color:var(--muted);font-size:13px} .toolbar{display:flex;flex-wrap:wrap;align-items:center;gap:8px;margin-bottom:14px} .toolbar select{background:var(--card);color:var(--fg);border:1px solid var(--border);border-radius:8px;padding:6px 10px;font-size:13px} .table{width:100%;border-collapse:separate;border-spacing:0;background:var(--card);border:1px solid var(--border);border-radius:10px;overflow:hidden} .table th{position:sticky;top:0;background:#0c1118;color:#ffffff;text-align:left;font-weight:600;padding:10px;border-bottom:1px solid var(--border)} .table td{padding:10px;border-bottom:1px solid var(--border);vertical-align:top} .chip{display:inline-flex;align-items:center;gap:6px;border:1px solid var(--border);border-radius:999px;padding:4px 10px;font-size:12px} .st-amber{background:#3a2b0d;color:#fcd34d;border-color:#854d0e} .st-green{background:#0d2b16;color:#86efac;border-color:#166534} .st-gray{background:#1f2430;color:#c0c4cc;border-color:#374151} .pill{display:inline-block;background:#0c1118;color:#ffffff;padding:4px 10px;border-radius:999px;border:1px solid var(--border);font-size:12px} .pill.zero{background:transparent;color:var(--muted)} button.pill{cursor:pointer} .toggle{background:var(--chip);color:var(--fg);border:1px solid var(--border);border-radius:6px;width:24px;height:24px;cursor:pointer;font-size:14px;line-height:1} .detail-card{background:#091017;border:1px solid var(--border);border-radius:8px;padding:10px} .detail-card h4{margin:0 0 8px 0;font-size:13px} .kv{display:grid;grid-template-columns:max-content 1fr;gap:4px 16px;margin:0} .kv dt{color:var(--muted);font-size:12px} .kv dd{margin:0;font-size:13px} .footer{margin-top:22px;color:var(--muted);font-size:12px}"),
        Theme::Light => s.push_str(":root{--bg:#f7fafc;--fg:#111827;--muted:#6b7280;--card:#ffffff;--border:#e5e7eb;--accent:#2563eb;--chip:#eef2f7} body{margin:0;background:var(--bg);color:var(--fg);font-family:Segoe UI,system-ui,-apple-system,Arial,sans-serif} .container{max-width:1200px;margin:0 auto;padding:24px} .header{display:flex;align-items:center;justify-content:space-between;gap:12px;margin-bottom:16px} .title{font-size:20px;font-weight:600;letter-spacing:.2px} .sub{color:var(--muted);font-size:13px} .toolbar{display:flex;flex-wrap:wrap;align-items:center;gap:8px;margin-bottom:14px} .toolbar select{background:var(--card);color:var(--fg);border:1px solid var(--border);border-radius:8px;padding:6px 10px;font-size:13px} .table{width:100%;border-collapse:separate;border-spacing:0;background:var(--card);border:1px solid var(--border);border-radius:10px;overflow:hidden} .table th{position:sticky;top:0;background:#f3f4f6;color:var(--fg);text-align:left;font-weight:600;padding:10px;border-bottom:1px solid var(--border)} .table td{padding:10px;border-bottom:1px solid var(--border);vertical-align:top} .chip{display:inline-flex;align-items:center;gap:6px;border:1px solid var(--border);border-radius:999px;padding:4px 10px;font-size:12px} .st-amber{background:#fde68a;color:#854d0e;border-color:#fef3c7} .st-green{background:#dcfce7;color:#166534;border-color:#bbf7d0} .st-gray{background:#e5e7eb;color:#374151;border-color:#d1d5db} .pill{display:inline-block;background:#eef2f7;color:var(--fg);padding:4px 10px;border-radius:999px;border:1px solid var(--border);font-size:12px} .pill.zero{background:transparent;color:var(--muted)} button.pill{cursor:pointer} .toggle{background:var(--chip);color:var(--fg);border:1px solid var(--border);border-radius:6px;width:24px;height:24px;cursor:pointer;font-size:14px;line-height:1} .detail-card{background:#f3f4f6;border:1px solid var(--border);border-radius:8px;padding:10px} .detail-card h4{margin:0 0 8px 0;font-size:13px} .kv{display:grid;grid-template-columns:max-content 1fr;gap:4px 16px;margin:0} .kv dt{color:var(--muted);font-size:12px} .kv dd{margin:0;font-size:13px} .footer{margin-top:22px;color:var(--muted);font-size:12px}"),
    }
    s.push_str("</style></head><body><div class=\"container\">");
    s.push_str(&format!("<div class=\"header\"><div><div class=\"title\">{}</div><div class=\"sub\">{} {} · {} {}</div></div></div>",
        html_escape(title), rows.len(), Label::OpenIncidents.text(lang), Label::Generated.text(lang), generated));
    s.push_str("<div class=\"toolbar\">");
    for (field, label) in FILTER_FIELDS {
        s.push_str(&format!("<select id=\"flt-{}\" aria-label=\"{}\"></select>", field, label.text(lang)));
    }
    s.push_str(&format!("<button id=\"expand-all\" class=\"pill\" type=\"button\">{}</button><button id=\"collapse-all\" class=\"pill\" type=\"button\">{}</button>",
        Label::ExpandAll.text(lang), Label::CollapseAll.text(lang)));
    s.push_str("</div>");
    s.push_str("<table class=\"table\"><thead><tr><th></th>");
    for col in MASTER_COLUMNS {
        s.push_str(&format!("<th>{}</th>", col.text(lang)));
    }
    s.push_str("</tr></thead><tbody>");
    for row in rows {
        s.push_str(&render_row(row, lang));
    }
    s.push_str("</tbody></table>");
    s.push_str("<div class=\"footer\">IncidentBoard</div></div>");
    s.push_str(&render_script(lang));
    s.push_str("</body></html>");
    s
}

/// One master row plus its paired detail row. The detail row is the
/// immediate next sibling of the master row; the embedded script relies on
/// that adjacency and on the four data attributes, nothing else.
pub fn render_row(row: &ReportRow, lang: Language) -> String {
    let inc = &row.incident;
    let sum = &row.summary;
    let classification = inc.classification.as_deref().unwrap_or("");
    let tier = inc.tier_queue.as_deref().unwrap_or("");
    let created = inc.created_date.format("%Y-%m-%d %H:%M").to_string();
    let pill_cls = if sum.related_count == 0 { "pill zero" } else { "pill" };
    let mut s = String::new();
    s.push_str(&format!("<tr class=\"inc\" data-classification=\"{}\" data-affected-user=\"{}\" data-assigned-to=\"{}\" data-tier-queue=\"{}\">",
        html_escape(classification), html_escape(&sum.affected_user), html_escape(&sum.assigned_to), html_escape(tier)));
    s.push_str("<td><button class=\"toggle\" type=\"button\" aria-expanded=\"false\">+</button></td>");
    s.push_str(&format!("<td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"sub\">{}</td>",
        html_escape(&inc.id), html_escape(&inc.title), html_escape(&sum.affected_user), html_escape(&sum.assigned_to), created));
    s.push_str(&format!("<td><span class=\"chip {}\">{}</span></td>", status_class(&inc.status), html_escape(&inc.status)));
    s.push_str(&format!("<td>{}</td><td>{}</td>", html_escape(classification), html_escape(tier)));
    s.push_str(&format!("<td><span class=\"{}\">{}</span></td>", pill_cls, sum.related_count));
    s.push_str("</tr>");
    s.push_str(&format!("<tr class=\"detail\" style=\"display:none\"><td colspan=\"10\"><div class=\"detail-card\"><h4>{}</h4><dl class=\"kv\">", Label::Details.text(lang)));
    let pairs: [(Label, String); 9] = [
        (Label::Id, html_escape(&inc.id)),
        (Label::Title, html_escape(&inc.title)),
        (Label::AffectedUser, html_escape(&sum.affected_user)),
        (Label::AssignedTo, html_escape(&sum.assigned_to)),
        (Label::Created, created),
        (Label::Status, html_escape(&inc.status)),
        (Label::Classification, html_escape(classification)),
        (Label::TierQueue, html_escape(tier)),
        (Label::RelatedItems, sum.related_count.to_string()),
    ];
    for (label, value) in pairs {
        s.push_str(&format!("<dt>{}</dt><dd>{}</dd>", label.text(lang), value));
    }
    s.push_str("</dl></div></td></tr>");
    s
}

/// Total over all status strings; anything unrecognized keeps the amber
/// default used for Active.
pub fn status_class(status: &str) -> &'static str {
    match status {
        "Resolved" | "Löst" => "st-green",
        "Closed" | "Stängd" => "st-gray",
        _ => "st-amber",
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

// Self-contained module scoped to the document: listeners only, no window
// globals, and all row state is read back from DOM attributes so rows stay
// independent of each other.
fn render_script(lang: Language) -> String {
    let mut s = String::new();
    s.push_str("<script>(function(){var LANG='");
    s.push_str(lang.tag());
    s.push_str("';var ALL='");
    s.push_str(Label::ShowAll.text(lang));
    s.push_str("';");
    s.push_str("function rows(){return Array.prototype.slice.call(document.querySelectorAll('tr.inc'));}");
    s.push_str("function detail(r){return r.nextElementSibling;}");
    s.push_str("function toggleBtn(r){return r.querySelector('button.toggle');}");
    s.push_str("function setExpanded(r,on){var d=detail(r),b=toggleBtn(r);if(!d||!b)return;d.style.display=on?'':'none';b.setAttribute('aria-expanded',on?'true':'false');b.textContent=on?'\\u2013':'+';}");
    s.push_str("function norm(v){return(v||'').trim().toLowerCase();}");
    s.push_str("var FIELDS=['classification','affected-user','assigned-to','tier-queue'];");
    s.push_str("function attr(r,f){return r.getAttribute('data-'+f)||'';}");
    s.push_str("function applyFilters(){var sel={};FIELDS.forEach(function(f){var c=document.getElementById('flt-'+f);sel[f]=c?c.value:'';});rows().forEach(function(r){var show=FIELDS.every(function(f){return sel[f]===''||norm(attr(r,f))===norm(sel[f]);});if(!show)setExpanded(r,false);r.style.display=show?'':'none';});}");
    s.push_str("function populate(){FIELDS.forEach(function(f){var c=document.getElementById('flt-'+f);if(!c)return;var seen={},values=[];rows().forEach(function(r){var v=attr(r,f).trim();if(v&&!Object.prototype.hasOwnProperty.call(seen,v)){seen[v]=true;values.push(v);}});values.sort(function(a,b){return a.localeCompare(b,LANG);});var all=document.createElement('option');all.value='';all.textContent=ALL;c.appendChild(all);values.forEach(function(v){var o=document.createElement('option');o.value=v;o.textContent=v;c.appendChild(o);});c.addEventListener('change',applyFilters);});}");
    s.push_str("function init(){rows().forEach(function(r){var b=toggleBtn(r);if(b)b.addEventListener('click',function(){setExpanded(r,b.getAttribute('aria-expanded')!=='true');});});var ex=document.getElementById('expand-all');if(ex)ex.addEventListener('click',function(){rows().forEach(function(r){if(r.style.display!=='none')setExpanded(r,true);});});var co=document.getElementById('collapse-all');if(co)co.addEventListener('click',function(){rows().forEach(function(r){setExpanded(r,false);});});populate();}");
    s.push_str("if(document.readyState==='loading'){document.addEventListener('DOMContentLoaded',init);}else{init();}");
    s.push_str("})();</script>");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::resolve::RelationshipSummary;
    use crate::store::IncidentRecord;

    fn row(id: &str, title: &str, classification: Option<&str>, related: usize) -> ReportRow {
        ReportRow {
            incident: IncidentRecord {
                id: id.to_string(),
                title: title.to_string(),
                created_date: Utc.with_ymd_and_hms(2026, 8, 6, 9, 13, 0).unwrap(),
                status: "Aktiv".to_string(),
                classification: classification.map(|s| s.to_string()),
                tier_queue: Some("Första linjen".to_string()),
            },
            summary: RelationshipSummary {
                affected_user: "Anna Larsson".to_string(),
                assigned_to: "Carl Ahl".to_string(),
                related_count: related,
            },
        }
    }

    #[test]
    fn escape_covers_markup_and_attribute_characters() {
        assert_eq!(html_escape("a<b>&\"c"), "a&lt;b&gt;&amp;&quot;c");
        assert_eq!(html_escape("plain"), "plain");
    }

    #[test]
    fn master_and_detail_rows_pair_up() {
        let rows = vec![row("IR1", "a", None, 0), row("IR2", "b", None, 1), row("IR3", "c", None, 2)];
        let html = render_html(&rows, Language::Sv, "Öppna incidenter", Theme::Dark, "2026-08-07 12:00");
        assert_eq!(html.matches("<tr class=\"inc\"").count(), 3);
        assert_eq!(html.matches("<tr class=\"detail\"").count(), 3);
        // detail row must immediately follow its master row
        for frag in rows.iter().map(|r| render_row(r, Language::Sv)) {
            let master_end = frag.find("</tr>").unwrap();
            assert!(frag[master_end..].starts_with("</tr><tr class=\"detail\""));
        }
    }

    #[test]
    fn injected_markup_is_escaped_everywhere() {
        let rows = vec![row("IR1", "<script>alert(1)</script>", Some("A\"B&C"), 0)];
        let html = render_html(&rows, Language::Sv, "T", Theme::Dark, "2026-08-07 12:00");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("data-classification=\"A&quot;B&amp;C\""));
    }

    #[test]
    fn data_attributes_carry_all_four_filter_fields() {
        let html = render_row(&row("IR1", "t", Some("Hårdvara"), 1), Language::Sv);
        assert!(html.contains("data-classification=\"Hårdvara\""));
        assert!(html.contains("data-affected-user=\"Anna Larsson\""));
        assert!(html.contains("data-assigned-to=\"Carl Ahl\""));
        assert!(html.contains("data-tier-queue=\"Första linjen\""));
    }

    #[test]
    fn zero_related_count_uses_zero_pill() {
        let zero = render_row(&row("IR1", "t", None, 0), Language::Sv);
        assert!(zero.contains("<span class=\"pill zero\">0</span>"));
        let some = render_row(&row("IR2", "t", None, 3), Language::Sv);
        assert!(some.contains("<span class=\"pill\">3</span>"));
    }

    #[test]
    fn absent_classification_renders_empty_not_null() {
        let html = render_row(&row("IR1", "t", None, 0), Language::Sv);
        assert!(html.contains("data-classification=\"\""));
        assert!(!html.contains("null"));
        assert!(!html.contains("undefined"));
    }

    #[test]
    fn status_colors_are_total() {
        assert_eq!(status_class("Active"), "st-amber");
        assert_eq!(status_class("Aktiv"), "st-amber");
        assert_eq!(status_class("Resolved"), "st-green");
        assert_eq!(status_class("Löst"), "st-green");
        assert_eq!(status_class("Closed"), "st-gray");
        assert_eq!(status_class("Stängd"), "st-gray");
        assert_eq!(status_class("Pending"), "st-amber");
    }

    #[test]
    fn languages_differ_only_in_labels_and_lang_attribute() {
        let rows = vec![row("IR1", "Skrivaren svarar inte", Some("Hårdvara"), 1)];
        let sv = render_html(&rows, Language::Sv, "T", Theme::Dark, "2026-08-07 12:00");
        let en = render_html(&rows, Language::En, "T", Theme::Dark, "2026-08-07 12:00");
        assert!(sv.contains("<html lang=\"sv\">"));
        assert!(en.contains("<html lang=\"en\">"));
        assert!(sv.contains("<td>IR1</td>") && en.contains("<td>IR1</td>"));
        assert!(sv.contains("2026-08-06 09:13") && en.contains("2026-08-06 09:13"));
        assert!(sv.contains("chip st-amber") && en.contains("chip st-amber"));
        assert!(sv.contains("<th>Rubrik</th>"));
        assert!(en.contains("<th>Title</th>"));
        assert!(sv.contains("var ALL='Visa alla'"));
        assert!(en.contains("var ALL='Show all'"));
    }

    #[test]
    fn empty_report_still_renders_complete_document() {
        let html = render_html(&[], Language::En, "Open incidents", Theme::Light, "2026-08-07 12:00");
        assert!(html.contains("<title>Open incidents (0)</title>"));
        assert!(html.contains("0 open incidents"));
        assert!(html.contains("<tbody></tbody>"));
        assert!(html.contains("</body></html>"));
    }

    #[test]
    fn title_element_combines_title_and_count() {
        let rows = vec![row("IR1", "t", None, 0), row("IR2", "t", None, 0)];
        let html = render_html(&rows, Language::Sv, "Veckorapport", Theme::Dark, "2026-08-07 12:00");
        assert!(html.contains("<title>Veckorapport (2)</title>"));
    }

    #[test]
    fn toolbar_has_one_select_per_filter_field() {
        let html = render_html(&[], Language::Sv, "T", Theme::Dark, "2026-08-07 12:00");
        for field in ["classification", "affected-user", "assigned-to", "tier-queue"] {
            assert!(html.contains(&format!("<select id=\"flt-{}\"", field)));
        }
    }
}
