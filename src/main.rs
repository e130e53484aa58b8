use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use anyhow::{Context, Result};
use chrono::Local;
use clap::{ArgAction, ColorChoice, CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use comfy_table::{ContentArrangement, Table};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use indicatif::ProgressBar;
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
mod html;
mod locale;
mod markdown;
mod resolve;
mod store;

use locale::{Label, Language};
use resolve::{resolve_rows, ReportRow};
use store::{IncidentStore, SnapshotStore};

static ENABLE_COLOR: OnceLock<bool> = OnceLock::new();

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum SortKey { Id, Created, Title }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum SortOrder { Asc, Desc }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
pub enum Theme { Dark, Light }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum LogFormat { Text, Json }

#[derive(Parser, Debug)]
#[command(
    name = "IncidentBoard",
    about = "Open-incident HTML report generator",
    long_about = "Reads open incidents from a ticketing-store snapshot, joins their relationship edges, and emits a localized, client-side filterable HTML report.",
    after_long_help = "Examples:\n  IncidentBoard report.html\n  IncidentBoard report.html --language en --sort-by id\n  IncidentBoard report.html --classification 'Hårdvara*' --tier-queue '*linjen'\n  IncidentBoard report.html --snapshot export.json --json-path rows.json",
    color = ColorChoice::Auto
)]
struct Args {
    /// Output path for the HTML report
    #[arg(required_unless_present = "completions")]
    output: Option<String>,
    /// Report title (localized default when omitted)
    #[arg(long, short = 't')]
    title: Option<String>,
    #[arg(long, value_enum, default_value = "created")]
    sort_by: SortKey,
    #[arg(long, value_enum, default_value = "asc")]
    sort_order: SortOrder,
    /// Wildcard filter on the classification display name (case-insensitive)
    #[arg(long)]
    classification: Option<String>,
    /// Wildcard filter on the tier/queue display name (case-insensitive)
    #[arg(long)]
    tier_queue: Option<String>,
    #[arg(long, short = 'l', value_enum, default_value = "sv")]
    language: Language,
    /// Ticketing-store snapshot to read incidents from
    #[arg(long, short = 's', default_value = "incidents.json")]
    snapshot: String,
    #[arg(long, value_enum, default_value = "dark")]
    theme: Theme,
    #[arg(long, short = 'j')]
    json_path: Option<String>,
    #[arg(long)]
    csv_path: Option<String>,
    #[arg(long)]
    md_path: Option<String>,
    #[arg(long, default_value_t = false)]
    no_open: bool,
    #[arg(long, default_value_t = false)]
    progress: bool,
    #[arg(long, short = 'C', default_value_t = false)]
    no_color: bool,
    #[arg(long, default_value_t = false)]
    force_color: bool,
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
    #[arg(long)]
    log_path: Option<String>,
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,
    #[arg(long, value_enum)]
    completions: Option<Shell>,
    #[arg(long)]
    completions_out: Option<String>,
    #[arg(long)]
    config: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            output: None,
            title: None,
            sort_by: SortKey::Created,
            sort_order: SortOrder::Asc,
            classification: None,
            tier_queue: None,
            language: Language::Sv,
            snapshot: "incidents.json".to_string(),
            theme: Theme::Dark,
            json_path: None,
            csv_path: None,
            md_path: None,
            no_open: false,
            progress: false,
            no_color: false,
            force_color: false,
            log_level: None,
            log_format: None,
            log_path: None,
            verbose: 0,
            quiet: false,
            completions: None,
            completions_out: None,
            config: None,
        }
    }
}

#[derive(Deserialize)]
struct AppConfig {
    title: Option<String>,
    sort_by: Option<SortKey>,
    sort_order: Option<SortOrder>,
    classification: Option<String>,
    tier_queue: Option<String>,
    language: Option<Language>,
    snapshot: Option<String>,
    theme: Option<Theme>,
    json_path: Option<String>,
    csv_path: Option<String>,
    md_path: Option<String>,
    log_format: Option<LogFormat>,
    log_path: Option<String>,
}

fn main() {
    let mut args = Args::parse();
    if let Some(sh) = args.completions {
        let mut cmd = Args::command();
        if let Some(path) = args.completions_out.as_ref() {
            if let Ok(mut f) = std::fs::File::create(path) { clap_complete::generate(sh, &mut cmd, "IncidentBoard", &mut f); } else { clap_complete::generate(sh, &mut cmd, "IncidentBoard", &mut std::io::stdout()); }
        } else {
            clap_complete::generate(sh, &mut cmd, "IncidentBoard", &mut std::io::stdout());
        }
        return;
    }
    if let Some(p) = args.config.as_ref()
        && let Ok(s) = std::fs::read_to_string(p)
        && let Ok(cfg) = toml::from_str::<AppConfig>(&s) { apply_config(&mut args, cfg); }
    else {
        let def = "IncidentBoard.toml";
        if let Ok(s) = std::fs::read_to_string(def)
            && let Ok(cfg) = toml::from_str::<AppConfig>(&s) { apply_config(&mut args, cfg); }
    }
    {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if args.quiet {
            builder.filter_level(log::LevelFilter::Error);
        } else if let Some(lvl) = args.log_level {
            let f = match lvl { LogLevel::Error => log::LevelFilter::Error, LogLevel::Warn => log::LevelFilter::Warn, LogLevel::Info => log::LevelFilter::Info, LogLevel::Debug => log::LevelFilter::Debug, LogLevel::Trace => log::LevelFilter::Trace };
            builder.filter_level(f);
        } else if args.verbose > 0 {
            let f = if args.verbose >= 3 { log::LevelFilter::Trace } else if args.verbose == 2 { log::LevelFilter::Debug } else { log::LevelFilter::Info };
            builder.filter_level(f);
        }
        if let Some(fmt) = args.log_format {
            match fmt {
                LogFormat::Json => {
                    builder.format(|buf, record| {
                        use std::io::Write;
                        let ts = chrono::Local::now().to_rfc3339();
                        let obj = serde_json::json!({
                            "ts": ts,
                            "level": record.level().to_string(),
                            "target": record.target(),
                            "msg": record.args().to_string(),
                        });
                        writeln!(buf, "{}", obj)
                    });
                }
                LogFormat::Text => {
                    builder.format(|buf, record| {
                        use std::io::Write;
                        let ts = chrono::Local::now().format("%H:%M:%S");
                        writeln!(buf, "[{:<5} {}] {}", record.level(), ts, record.args())
                    });
                }
            }
        }
        if let Some(path) = args.log_path.as_ref() {
            match std::fs::File::create(path) {
                Ok(f) => {
                    builder.target(env_logger::Target::Pipe(Box::new(f)));
                }
                Err(e) => {
                    eprintln!("Failed to open log file {}: {}", path, e);
                }
            }
        }
        builder.init();
    }
    let term = std::env::var("TERM").unwrap_or_default();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let color_default = std::io::stdout().is_terminal() && !no_color_env && term != "dumb";
    let enable_color = if args.force_color { true } else { color_default && !args.no_color };
    let _ = ENABLE_COLOR.set(enable_color);
    if let Err(e) = run(&args) {
        log::error!("Report generation failed: {:#}", e);
        std::process::exit(1);
    }
}

fn apply_config(args: &mut Args, cfg: AppConfig) {
    if args.title.is_none() && let Some(v) = cfg.title { args.title = Some(v); }
    if let Some(v) = cfg.sort_by { args.sort_by = v; }
    if let Some(v) = cfg.sort_order { args.sort_order = v; }
    if args.classification.is_none() && let Some(v) = cfg.classification { args.classification = Some(v); }
    if args.tier_queue.is_none() && let Some(v) = cfg.tier_queue { args.tier_queue = Some(v); }
    if let Some(v) = cfg.language { args.language = v; }
    if args.snapshot == "incidents.json" && let Some(v) = cfg.snapshot { args.snapshot = v; }
    if let Some(v) = cfg.theme { args.theme = v; }
    if args.json_path.is_none() && let Some(v) = cfg.json_path { args.json_path = Some(v); }
    if args.csv_path.is_none() && let Some(v) = cfg.csv_path { args.csv_path = Some(v); }
    if args.md_path.is_none() && let Some(v) = cfg.md_path { args.md_path = Some(v); }
    if args.log_format.is_none() && let Some(v) = cfg.log_format { args.log_format = Some(v); }
    if args.log_path.is_none() && let Some(v) = cfg.log_path { args.log_path = Some(v); }
}

fn run(args: &Args) -> Result<()> {
    let Some(output) = args.output.as_deref() else { anyhow::bail!("Output path is required") };
    let store = SnapshotStore::open(Path::new(&args.snapshot))?;
    let incidents = store.fetch_active_incidents(args.language).context("Incident fetch failed")?;
    log::info!("Fetched {} active incidents from {}", incidents.len(), args.snapshot);
    let pb = if args.progress { Some(ProgressBar::new(incidents.len() as u64)) } else { None };
    let rows = resolve_rows(&store, incidents, pb.as_ref());
    if let Some(pb) = pb { pb.finish_and_clear(); }
    let class_filter = compile_filter(args.classification.as_deref())?;
    let tier_filter = compile_filter(args.tier_queue.as_deref())?;
    let mut rows: Vec<ReportRow> = rows
        .into_iter()
        .filter(|r| pass_filter(r.incident.classification.as_deref(), class_filter.as_ref())
            && pass_filter(r.incident.tier_queue.as_deref(), tier_filter.as_ref()))
        .collect();
    sort_rows(&mut rows, args.sort_by, args.sort_order);
    let title = args.title.clone().unwrap_or_else(|| Label::DefaultTitle.text(args.language).to_string());
    let generated = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let html = html::render_html(&rows, args.language, &title, args.theme, &generated);
    if let Some(dir) = Path::new(output).parent()
        && !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    std::fs::write(output, &html).with_context(|| format!("HTML write failed for {}", output))?;
    if !args.no_open { open_file_default(PathBuf::from(output)); }
    if !args.quiet { println!("{}", paint(&format!("HTML generated: {}", output), "1;36")); }
    if let Some(p) = args.json_path.as_ref() {
        match serde_json::to_vec_pretty(&rows) {
            Ok(data) => match std::fs::write(p, data) {
                Ok(_) => { if !args.quiet { println!("{}", paint(&format!("JSON written: {}", p), "1;36")); } }
                Err(e) => log::error!("JSON write failed for {}: {}", p, e),
            },
            Err(e) => log::error!("JSON serialization failed: {}", e),
        }
    }
    if let Some(p) = args.csv_path.as_ref() {
        if let Err(e) = write_csv(p, &rows) { log::error!("CSV write failed for {}: {}", p, e); } else if !args.quiet { println!("{}", paint(&format!("CSV written: {}", p), "1;36")); }
    }
    if let Some(p) = args.md_path.as_ref() {
        let md = markdown::render_markdown(&rows, args.language, &title, &generated);
        match std::fs::write(p, md) {
            Ok(_) => { if !args.quiet { println!("{}", paint(&format!("Markdown written: {}", p), "1;36")); } }
            Err(e) => log::error!("Markdown write failed for {}: {}", p, e),
        }
    }
    if !args.quiet {
        print_summary_table(&rows, args.language);
        println!("{} {} · {} {}", rows.len(), Label::OpenIncidents.text(args.language), Label::Generated.text(args.language), generated);
    }
    Ok(())
}

fn compile_filter(pattern: Option<&str>) -> Result<Option<GlobSet>> {
    let Some(p) = pattern else { return Ok(None) };
    let glob = GlobBuilder::new(p)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Invalid filter pattern {}", p))?;
    let mut gb = GlobSetBuilder::new();
    gb.add(glob);
    Ok(Some(gb.build()?))
}

// An absent display name never matches an active pattern.
fn pass_filter(value: Option<&str>, filter: Option<&GlobSet>) -> bool {
    match filter {
        None => true,
        Some(gs) => value.is_some_and(|v| gs.is_match(v)),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum IdKey { Num(u64), Text(String) }

// Natural id order: numeric ids compare numerically and sort before
// non-numeric ids, which compare lexically.
fn id_key(id: &str) -> IdKey {
    id.parse::<u64>().map(IdKey::Num).unwrap_or_else(|_| IdKey::Text(id.to_string()))
}

fn sort_rows(rows: &mut [ReportRow], key: SortKey, order: SortOrder) {
    match (key, order) {
        (SortKey::Id, SortOrder::Asc) => rows.sort_by(|a, b| id_key(&a.incident.id).cmp(&id_key(&b.incident.id))),
        (SortKey::Id, SortOrder::Desc) => rows.sort_by(|a, b| id_key(&b.incident.id).cmp(&id_key(&a.incident.id))),
        (SortKey::Created, SortOrder::Asc) => rows.sort_by(|a, b| a.incident.created_date.cmp(&b.incident.created_date)),
        (SortKey::Created, SortOrder::Desc) => rows.sort_by(|a, b| b.incident.created_date.cmp(&a.incident.created_date)),
        (SortKey::Title, SortOrder::Asc) => rows.sort_by(|a, b| a.incident.title.cmp(&b.incident.title)),
        (SortKey::Title, SortOrder::Desc) => rows.sort_by(|a, b| b.incident.title.cmp(&a.incident.title)),
    }
}

fn write_csv(path: &str, rows: &[ReportRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["id", "title", "affected_user", "assigned_to", "created", "status", "classification", "tier_queue", "related_count"])?;
    for r in rows {
        wtr.write_record([
            r.incident.id.clone(),
            r.incident.title.clone(),
            r.summary.affected_user.clone(),
            r.summary.assigned_to.clone(),
            r.incident.created_date.format("%Y-%m-%d %H:%M").to_string(),
            r.incident.status.clone(),
            r.incident.classification.clone().unwrap_or_default(),
            r.incident.tier_queue.clone().unwrap_or_default(),
            r.summary.related_count.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_summary_table(rows: &[ReportRow], lang: Language) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let headers = [
        Label::Id, Label::Title, Label::AffectedUser, Label::AssignedTo,
        Label::Created, Label::Status, Label::Classification, Label::TierQueue, Label::RelatedItems,
    ];
    table.set_header(headers.iter().map(|h| paint(h.text(lang), "1")).collect::<Vec<_>>());
    for r in rows {
        table.add_row(vec![
            r.incident.id.clone(),
            truncate(&r.incident.title, 48),
            r.summary.affected_user.clone(),
            r.summary.assigned_to.clone(),
            r.incident.created_date.format("%Y-%m-%d %H:%M").to_string(),
            r.incident.status.clone(),
            r.incident.classification.clone().unwrap_or_default(),
            r.incident.tier_queue.clone().unwrap_or_default(),
            r.summary.related_count.to_string(),
        ]);
    }
    println!("{}", table);
}

fn truncate(s: &str, n: usize) -> String {
    let mut out: String = s.chars().take(n).collect();
    if s.chars().count() > n { out.push_str("..."); }
    out
}

fn paint(s: &str, code: &str) -> String {
    if *ENABLE_COLOR.get().unwrap_or(&true) { format!("\x1b[{}m{}\x1b[0m", code, s) } else { s.to_string() }
}

#[cfg(target_os = "windows")]
fn open_file_default(p: PathBuf) {
    let mut s = p.to_string_lossy().into_owned();
    if s.starts_with("\\\\?\\") { s = s.trim_start_matches("\\\\?\\").to_string(); }
    if s.ends_with('\\') || s.ends_with('/') { s = s.trim_end_matches(['\\', '/']).to_string(); }
    let _ = std::process::Command::new("explorer").arg(&s).spawn()
        .or_else(|_| std::process::Command::new("cmd").args(["/C", "start", "", &s]).spawn())
        .map_err(|e| log::error!("Failed to open file {}: {}", s, e));
}

#[cfg(not(target_os = "windows"))]
fn open_file_default(p: PathBuf) {
    let s = p.to_string_lossy().into_owned();
    let _ = std::process::Command::new("xdg-open").arg(&s).spawn().map_err(|e| log::error!("Failed to open file {}: {}", s, e));
}

#[cfg(test)]
fn test_row(id: &str, title: &str, created: chrono::DateTime<chrono::Utc>, classification: Option<&str>, tier: Option<&str>) -> ReportRow {
    use resolve::RelationshipSummary;
    use store::IncidentRecord;
    ReportRow {
        incident: IncidentRecord {
            id: id.to_string(),
            title: title.to_string(),
            created_date: created,
            status: "Aktiv".to_string(),
            classification: classification.map(|s| s.to_string()),
            tier_queue: tier.map(|s| s.to_string()),
        },
        summary: RelationshipSummary {
            affected_user: String::new(),
            assigned_to: String::new(),
            related_count: 0,
        },
    }
}


#[cfg(test)]
mod tests_sort {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn base() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap()
    }

    #[test]
    fn id_sorts_numerically_before_lexically() {
        let mut rows = vec![
            test_row("10", "a", base(), None, None),
            test_row("9", "b", base(), None, None),
            test_row("A2", "c", base(), None, None),
        ];
        sort_rows(&mut rows, SortKey::Id, SortOrder::Asc);
        let ids: Vec<&str> = rows.iter().map(|r| r.incident.id.as_str()).collect();
        assert_eq!(ids, ["9", "10", "A2"]);
    }

    #[test]
    fn created_descending_reverses_ascending() {
        let mut rows = vec![
            test_row("IR1", "a", base(), None, None),
            test_row("IR2", "b", base() + Duration::minutes(5), None, None),
            test_row("IR3", "c", base() + Duration::minutes(2), None, None),
        ];
        sort_rows(&mut rows, SortKey::Created, SortOrder::Asc);
        let asc: Vec<&str> = rows.iter().map(|r| r.incident.id.as_str()).collect();
        assert_eq!(asc, ["IR1", "IR3", "IR2"]);
        sort_rows(&mut rows, SortKey::Created, SortOrder::Desc);
        let desc: Vec<&str> = rows.iter().map(|r| r.incident.id.as_str()).collect();
        assert_eq!(desc, ["IR2", "IR3", "IR1"]);
    }

    #[test]
    fn equal_keys_preserve_input_order() {
        let mut rows = vec![
            test_row("IR1", "same", base(), None, None),
            test_row("IR2", "same", base(), None, None),
            test_row("IR3", "same", base(), None, None),
        ];
        sort_rows(&mut rows, SortKey::Title, SortOrder::Asc);
        let ids: Vec<&str> = rows.iter().map(|r| r.incident.id.as_str()).collect();
        assert_eq!(ids, ["IR1", "IR2", "IR3"]);
        sort_rows(&mut rows, SortKey::Title, SortOrder::Desc);
        let ids: Vec<&str> = rows.iter().map(|r| r.incident.id.as_str()).collect();
        assert_eq!(ids, ["IR1", "IR2", "IR3"]);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let mut rows = vec![
            test_row("IR3", "c", base() + Duration::minutes(3), None, None),
            test_row("IR1", "a", base(), None, None),
            test_row("IR2", "b", base() + Duration::minutes(1), None, None),
        ];
        sort_rows(&mut rows, SortKey::Id, SortOrder::Asc);
        let once: Vec<String> = rows.iter().map(|r| r.incident.id.clone()).collect();
        sort_rows(&mut rows, SortKey::Id, SortOrder::Asc);
        let twice: Vec<String> = rows.iter().map(|r| r.incident.id.clone()).collect();
        assert_eq!(once, twice);
    }
}

#[cfg(test)]
mod tests_pipeline {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn base() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap()
    }

    // Three active incidents, no filters, id ascending: rows come out in
    // ascending id order.
    #[test]
    fn unfiltered_report_sorts_by_id() {
        let rows = vec![
            test_row("IR3", "c", base(), Some("Hardware"), None),
            test_row("IR1", "a", base() + Duration::minutes(1), Some("Software"), None),
            test_row("IR2", "b", base() + Duration::minutes(2), None, None),
        ];
        let class_filter = compile_filter(None).unwrap();
        let tier_filter = compile_filter(None).unwrap();
        let mut rows: Vec<ReportRow> = rows
            .into_iter()
            .filter(|r| pass_filter(r.incident.classification.as_deref(), class_filter.as_ref())
                && pass_filter(r.incident.tier_queue.as_deref(), tier_filter.as_ref()))
            .collect();
        sort_rows(&mut rows, SortKey::Id, SortOrder::Asc);
        let ids: Vec<&str> = rows.iter().map(|r| r.incident.id.as_str()).collect();
        assert_eq!(ids, ["IR1", "IR2", "IR3"]);
    }

    #[test]
    fn classification_filter_drops_unclassified_rows() {
        let rows = vec![
            test_row("IR1", "a", base(), Some("Hardware"), None),
            test_row("IR2", "b", base(), None, None),
            test_row("IR3", "c", base(), Some("Software"), None),
        ];
        let class_filter = compile_filter(Some("*ware")).unwrap();
        let kept: Vec<ReportRow> = rows
            .into_iter()
            .filter(|r| pass_filter(r.incident.classification.as_deref(), class_filter.as_ref()))
            .collect();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.incident.id != "IR2"));
    }

    #[test]
    fn everything_filtered_away_still_renders() {
        let rows: Vec<ReportRow> = vec![];
        let html = html::render_html(&rows, Language::En, "Open incidents", Theme::Dark, "2026-08-07 12:00");
        assert!(html.contains("0 open incidents"));
    }
}
