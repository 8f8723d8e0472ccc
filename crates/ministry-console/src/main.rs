use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ministry_browser::{
    export_file_name, BrowserError, ColumnSpec, FilterSpec, Predicate, RecordBrowser, ScrollLock,
    SortKey, Stats, TransitionError,
};
use ministry_records::{
    format_minor, FormError, GalleryUpload, NewRecord, PartnershipForm, PartnershipKind,
    PledgeFrequency, Record, RecordId, RecordKind, Status,
};
use ministry_store::{default_config_path, ConfigError, RestStore, StoreConfig, StoreError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn kind_arg() -> Arg {
    Arg::new("kind")
        .required(true)
        .value_parser(["donations", "partnerships", "gallery"])
        .help("Record collection")
}

fn filter_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("query").long("query").short('q').help("Free-text search"))
        .arg(Arg::new("category").long("category").help("Exact category, or \"all\""))
        .arg(Arg::new("status").long("status").help("Exact status, or \"all\""))
        .arg(
            Arg::new("sort")
                .long("sort")
                .value_parser(["newest", "oldest", "title"])
                .help("Explicit ordering"),
        )
}

fn cli() -> Command {
    Command::new("ministry-console")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Review donations, partnership requests and gallery uploads")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default ~/.ministry-console/config.yml)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(filter_args(
            Command::new("list").about("List records matching the filters").arg(kind_arg()),
        ))
        .subcommand(
            Command::new("show")
                .about("Show one record in full")
                .arg(kind_arg())
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("stats")
                .about("Counts and totals over the whole collection")
                .arg(kind_arg()),
        )
        .subcommand(
            Command::new("transition")
                .about("Move a partnership request to a new review status")
                .arg(Arg::new("id").required(true))
                .arg(
                    Arg::new("status")
                        .required(true)
                        .help("pending, under_review, approved or rejected"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a record")
                .arg(kind_arg())
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(filter_args(
            Command::new("export")
                .about("Export matching records as CSV")
                .arg(kind_arg())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file (default <kind>-YYYY-MM-DD.csv)"),
                ),
        ))
        .subcommand(
            Command::new("submit-partnership")
                .about("Submit a partnership request")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("email").long("email").required(true))
                .arg(Arg::new("phone").long("phone"))
                .arg(Arg::new("church").long("church"))
                .arg(Arg::new("city").long("city"))
                .arg(
                    Arg::new("as")
                        .long("as")
                        .action(ArgAction::Append)
                        .help("prayer, financial, volunteer or media (repeatable)"),
                )
                .arg(Arg::new("pledge").long("pledge").help("Pledge amount, e.g. 25,000.00"))
                .arg(Arg::new("currency").long("currency").default_value("NGN"))
                .arg(
                    Arg::new("frequency")
                        .long("frequency")
                        .help("one_time, monthly, quarterly or yearly"),
                )
                .arg(Arg::new("skill").long("skill").action(ArgAction::Append))
                .arg(Arg::new("availability").long("availability"))
                .arg(Arg::new("message").long("message")),
        )
        .subcommand(
            Command::new("upload-image")
                .about("Register an uploaded gallery image")
                .arg(Arg::new("title").long("title").required(true))
                .arg(Arg::new("url").long("url").required(true))
                .arg(Arg::new("category").long("category").default_value("general"))
                .arg(Arg::new("description").long("description"))
                .arg(Arg::new("alt").long("alt")),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn text(args: &ArgMatches, name: &str) -> String {
    args.get_one::<String>(name).cloned().unwrap_or_default()
}

fn texts(args: &ArgMatches, name: &str) -> Vec<String> {
    args.get_many::<String>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn record_kind(args: &ArgMatches) -> Result<RecordKind> {
    text(args, "kind").parse().map_err(|e: String| anyhow!(e))
}

fn filter_spec(args: &ArgMatches) -> Result<FilterSpec> {
    let mut spec = FilterSpec::default()
        .with_query(text(args, "query"))
        .with_category(Predicate::parse(&text(args, "category")))
        .with_status(Predicate::parse(&text(args, "status")));
    if let Some(sort) = args.get_one::<String>("sort") {
        spec = spec.sorted_by(sort.parse::<SortKey>().map_err(|e| anyhow!(e))?);
    }
    Ok(spec)
}

fn load_config(args: &ArgMatches) -> Result<StoreConfig> {
    let (path, allow_missing) = match args.get_one::<PathBuf>("config") {
        Some(path) => (path.clone(), false),
        None => (
            default_config_path().ok_or_else(|| anyhow!("cannot locate home directory"))?,
            true,
        ),
    };
    debug!(path = %path.display(), "loading config");
    Ok(StoreConfig::load(&path, allow_missing)?)
}

async fn open_browser(config: &StoreConfig, kind: RecordKind) -> Result<RecordBrowser<RestStore>> {
    let store = RestStore::new(config, kind)?;
    let browser = RecordBrowser::new(Arc::new(store), ScrollLock::new());
    browser.refresh().await?;
    Ok(browser)
}

fn print_row(record: &Record) {
    println!(
        "{:<38} {:<10} {:<13} {}",
        record.id,
        record.created_at.format("%Y-%m-%d"),
        record.status().map(|s| s.as_str()).unwrap_or("-"),
        record.title()
    );
}

fn print_record(record: &Record) {
    let mut fields: Vec<&str> = vec!["id", "kind"];
    fields.extend(record.kind().default_columns().iter().map(|(_, field)| *field));
    fields.extend(record.kind().search_fields());
    fields.push("alt_text");
    let mut seen = Vec::new();
    for field in fields {
        if seen.contains(&field) {
            continue;
        }
        seen.push(field);
        if let Some(value) = record.field(field) {
            println!("{field:>18}: {value}");
        }
    }
}

fn print_stats(kind: RecordKind, stats: &Stats) {
    println!("{kind}: {} records", stats.total);
    for (status, count) in &stats.by_status {
        println!("  status   {status:<14} {count}");
    }
    for (category, count) in &stats.by_category {
        println!("  category {category:<14} {count}");
    }
    for (currency, total) in &stats.total_amount {
        println!("  total    {currency:<14} {}", format_minor(*total));
    }
    for (currency, received) in &stats.received_amount {
        println!("  received {currency:<14} {}", format_minor(*received));
    }
}

fn partnership_form(args: &ArgMatches) -> Result<PartnershipForm> {
    let mut form = PartnershipForm {
        full_name: text(args, "name"),
        email: text(args, "email"),
        phone: text(args, "phone"),
        church: text(args, "church"),
        city: text(args, "city"),
        pledge_amount: text(args, "pledge"),
        pledge_currency: text(args, "currency"),
        skills: texts(args, "skill"),
        availability: text(args, "availability"),
        message: text(args, "message"),
        ..PartnershipForm::default()
    };
    for value in texts(args, "as") {
        let kind = PartnershipKind::parse(&value)
            .ok_or_else(|| anyhow!("unknown partnership kind: {value}"))?;
        if !form.has_kind(kind) {
            form.toggle_kind(kind);
        }
    }
    if let Some(value) = args.get_one::<String>("frequency") {
        form.pledge_frequency = Some(
            PledgeFrequency::parse(value).ok_or_else(|| anyhow!("unknown frequency: {value}"))?,
        );
    }
    form.validate()?;
    Ok(form)
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let Some((command, args)) = matches.subcommand() else {
        return Err(anyhow!("no command given"));
    };

    match command {
        "list" => {
            let browser = open_browser(&config, record_kind(args)?).await?;
            browser.set_filter(filter_spec(args)?);
            let view = browser.view();
            for record in &view.visible {
                print_row(record);
            }
            println!("{} of {} records", view.visible.len(), view.total);
        }
        "show" => {
            let browser = open_browser(&config, record_kind(args)?).await?;
            let id = RecordId::new(text(args, "id"));
            if !browser.open(&id) {
                return Err(anyhow!("no record with id {id}"));
            }
            if let Some(record) = browser.focused() {
                print_record(&record);
            }
            browser.close();
        }
        "stats" => {
            let kind = record_kind(args)?;
            let browser = open_browser(&config, kind).await?;
            print_stats(kind, &browser.stats());
        }
        "transition" => {
            let browser = open_browser(&config, RecordKind::Partnership).await?;
            let raw = text(args, "status");
            let status = Status::parse_for(RecordKind::Partnership, &raw)
                .ok_or_else(|| anyhow!("unknown status: {raw}"))?;
            let record = browser
                .transition(&RecordId::new(text(args, "id")), status)
                .await?;
            println!("{} is now {status}", record.title());
        }
        "delete" => {
            let browser = open_browser(&config, record_kind(args)?).await?;
            let id = RecordId::new(text(args, "id"));
            browser.delete(&id).await?;
            println!("deleted {id}");
        }
        "export" => {
            let kind = record_kind(args)?;
            let browser = open_browser(&config, kind).await?;
            browser.set_filter(filter_spec(args)?);
            let csv = browser.export_visible(&ColumnSpec::defaults_for(kind));
            let out = args
                .get_one::<PathBuf>("out")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(export_file_name(kind, Utc::now().date_naive())));
            std::fs::write(&out, csv).with_context(|| format!("writing {}", out.display()))?;
            println!("wrote {} rows to {}", browser.view().visible.len(), out.display());
        }
        "submit-partnership" => {
            let form = partnership_form(args)?;
            let store = RestStore::new(&config, RecordKind::Partnership)?;
            let browser = RecordBrowser::new(Arc::new(store), ScrollLock::new());
            let record = browser.create(NewRecord::Partnership(form)).await?;
            println!("submitted {}", record.id);
        }
        "upload-image" => {
            let upload = GalleryUpload {
                title: text(args, "title"),
                description: text(args, "description"),
                category: text(args, "category"),
                image_url: text(args, "url"),
                alt_text: text(args, "alt"),
            };
            let store = RestStore::new(&config, RecordKind::Gallery)?;
            let browser = RecordBrowser::new(Arc::new(store), ScrollLock::new());
            let record = browser.create(NewRecord::Gallery(upload)).await?;
            println!("added {}", record.id);
        }
        other => return Err(anyhow!("unknown command: {other}")),
    }
    Ok(())
}

/// Short message for the terminal; full chain goes to the log
fn user_message(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<TransitionError>() {
        e.user_message()
    } else if let Some(e) = err.downcast_ref::<BrowserError>() {
        e.user_message()
    } else if let Some(e) = err.downcast_ref::<StoreError>() {
        e.user_message().to_string()
    } else if let Some(e) = err.downcast_ref::<FormError>() {
        e.to_string()
    } else if let Some(e) = err.downcast_ref::<ConfigError>() {
        format!("configuration problem: {e}")
    } else {
        err.to_string()
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    if let Err(err) = run(&matches).await {
        error!(error = ?err, "command failed");
        eprintln!("error: {}", user_message(&err));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn filters_parse_from_flags() {
        let matches = cli()
            .try_get_matches_from([
                "ministry-console",
                "list",
                "gallery",
                "--category",
                "worship",
                "--sort",
                "title",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let spec = filter_spec(args).unwrap();
        assert_eq!(spec.category, Predicate::Equals("worship".to_string()));
        assert!(spec.status.is_all());
        assert_eq!(spec.sort, Some(SortKey::Title));
        assert_eq!(record_kind(args).unwrap(), RecordKind::Gallery);
    }

    #[test]
    fn partnership_flags_build_a_valid_form() {
        let matches = cli()
            .try_get_matches_from([
                "ministry-console",
                "submit-partnership",
                "--name",
                "Ada Obi",
                "--email",
                "ada@example.org",
                "--as",
                "financial",
                "--pledge",
                "10,000",
                "--frequency",
                "monthly",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let form = partnership_form(args).unwrap();
        assert!(form.has_kind(PartnershipKind::Financial));
        assert!(NewRecord::Partnership(form).validate().is_ok());
    }

    #[test]
    fn financial_partner_without_pledge_is_rejected() {
        let matches = cli()
            .try_get_matches_from([
                "ministry-console",
                "submit-partnership",
                "--name",
                "Ada Obi",
                "--email",
                "ada@example.org",
                "--as",
                "financial",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let err = partnership_form(args).unwrap_err();
        assert!(err.downcast_ref::<FormError>().is_some());
    }
}
