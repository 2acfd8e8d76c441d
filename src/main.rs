use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::thread;
use tabled::{settings::Style, Table, Tabled};

use ims_report::config::{config_dir, load_config, Config, CONFIG_TEMPLATE};
use ims_report::error::{ReportError, Result};
use ims_report::pdf::{get_cookie, ClickOutcome, DocumentKind, PdfButton, CSRF_COOKIE};
use ims_report::report::{
    parse_date, render_summary_cards, render_table, transaction_page, BindOutcome, Catalog,
    Filter, FilterState, HttpTransport, MaterialPicker, QueryParams, Region, ReportFetcher,
    ReportKind, ReportSource, ReportTable, Resolution, Selection, TransactionType, ViewBinder,
    SUMMARY_COLUMNS, TRANSACTION_COLUMNS,
};

#[derive(Parser)]
#[command(name = "ims-report")]
#[command(version, about = "Command-line client for inventory reports", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.ims-report or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log every request and how its response was applied
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Filter options shared by the report commands
#[derive(Args)]
struct FilterArgs {
    /// First day of the report (default: first day of this month)
    #[arg(long, value_name = "YYYY-MM-DD")]
    from: Option<String>,

    /// Last day of the report (default: last day of this month)
    #[arg(long, value_name = "YYYY-MM-DD")]
    to: Option<String>,

    /// Material group id ("all" for every group)
    #[arg(short, long, value_name = "ID")]
    group: Option<String>,

    /// Material id; its group is selected along with it
    #[arg(short, long, value_name = "ID")]
    material: Option<String>,

    /// Print the request URL instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Show the configuration in effect
    Status,

    /// Load the dashboard plots (stock levels and financials)
    Dashboard {
        /// Also load weekly financials
        #[arg(long)]
        weekly: bool,

        /// Also load summary financials
        #[arg(long)]
        summary_financials: bool,

        /// Also load user statuses
        #[arg(long)]
        user_statuses: bool,
    },

    /// List material groups
    Groups,

    /// List materials
    Materials {
        /// Only materials of this group
        #[arg(short, long, value_name = "ID")]
        group: Option<String>,
    },

    /// Stock summary per day, week or month
    Summary {
        /// day, week or month
        #[arg(short, long, default_value = "week")]
        resolution: String,

        #[command(flatten)]
        filter: FilterArgs,

        /// Show one card per period instead of a table
        #[arg(long)]
        cards: bool,
    },

    /// List inventory transactions
    Transactions {
        /// Include incoming transactions
        #[arg(long = "in")]
        type_in: bool,

        /// Include outgoing transactions
        #[arg(long = "out")]
        type_out: bool,

        #[command(flatten)]
        filter: FilterArgs,

        /// Add a link to each transaction's page
        #[arg(long)]
        links: bool,
    },

    /// Create or open the PDF of a goods receipt or dispatch note
    Pdf {
        /// receipt or dispatch
        kind: String,

        /// Document id
        uuid: String,

        /// The document already has a PDF
        #[arg(long)]
        exists: bool,

        /// Do not open the PDF in a browser
        #[arg(long)]
        no_open: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::Dashboard {
            weekly,
            summary_financials,
            user_statuses,
        } => cmd_dashboard(&cfg_dir, weekly, summary_financials, user_statuses),
        Commands::Groups => cmd_groups(&cfg_dir),
        Commands::Materials { group } => cmd_materials(&cfg_dir, group),
        Commands::Summary {
            resolution,
            filter,
            cards,
        } => cmd_summary(&cfg_dir, &resolution, &filter, cards),
        Commands::Transactions {
            type_in,
            type_out,
            filter,
            links,
        } => cmd_transactions(&cfg_dir, type_in, type_out, &filter, links),
        Commands::Pdf {
            kind,
            uuid,
            exists,
            no_open,
        } => cmd_pdf(&cfg_dir, &kind, &uuid, exists, !no_open),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(ReportError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized ims-report config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point it at your server:   $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Paste a session cookie into [session] to create PDFs");
    println!();
    println!("Then load a report:");
    println!("  ims-report summary --resolution week");

    Ok(())
}

fn fetcher_for(config: &Config) -> ReportFetcher<HttpTransport> {
    ReportFetcher::http(&config.server.base_url, config.server.timeout_secs)
        .with_cookie(config.session.cookie.clone())
}

/// Show the configuration in effect
fn cmd_status(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let offset = config.filter.offset()?;
    let filter = Filter::current_month();

    let session = match config.session.cookie.as_deref() {
        None => "not set",
        Some(c) if get_cookie(c, CSRF_COOKIE).is_some() => "set (with CSRF token)",
        Some(_) => "set (no CSRF token)",
    };
    let timeout = match config.server.timeout_secs {
        0 => "none".to_string(),
        secs => format!("{secs}s"),
    };

    println!("Report Client Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Server:           {}", config.server.base_url);
    println!("Timeout:          {}", timeout);
    println!("Session cookie:   {}", session);
    println!(
        "UTC offset:       {}",
        offset.map_or("none".to_string(), |o| o.to_string())
    );
    println!(
        "Empty types:      {:?}",
        config.filter.empty_transaction_types
    );
    println!("Documents:        {}", config.documents.base_path);
    println!(
        "Default range:    {} .. {}",
        filter.date_from(),
        filter.date_to()
    );

    Ok(())
}

/// Fetch every dashboard region at once; each lands independently
fn cmd_dashboard(
    cfg_dir: &Path,
    weekly: bool,
    summary_financials: bool,
    user_statuses: bool,
) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let fetcher = fetcher_for(&config);

    let mut regions = vec![Region::StockLevels, Region::Financials];
    if weekly {
        regions.push(Region::WeeklyFinancials);
    }
    if summary_financials {
        regions.push(Region::SummaryFinancials);
    }
    if user_statuses {
        regions.push(Region::UserStatuses);
    }

    let binder: ViewBinder = ViewBinder::new();
    thread::scope(|s| {
        let fetches = regions
            .iter()
            .filter_map(|region| region.endpoint().map(|endpoint| (*region, endpoint)));
        for (region, endpoint) in fetches {
            let (binder, fetcher) = (&binder, &fetcher);
            s.spawn(move || {
                binder.refresh(region, || fetcher.fetch(&endpoint, &QueryParams::new()))
            });
        }
    });

    for region in &regions {
        println!("== {} ==", region.id());
        match binder.content(*region) {
            Some(html) => println!("{}", html.trim_end()),
            None => println!("(not loaded)"),
        }
        println!();
    }

    Ok(())
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
}

#[derive(Tabled)]
struct MaterialRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "GROUP")]
    group: String,
}

/// List material groups
fn cmd_groups(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let fetcher = fetcher_for(&config);
    let picker = MaterialPicker::load(&fetcher);

    let rows: Vec<GroupRow> = picker
        .group_options()
        .into_iter()
        .map(|g| GroupRow {
            id: g.id,
            name: g.name,
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// List materials, optionally of one group
fn cmd_materials(cfg_dir: &Path, group: Option<String>) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let fetcher = fetcher_for(&config);
    let mut picker = MaterialPicker::load(&fetcher);

    if let Some(group) = group {
        picker.select_group(&fetcher, Selection::parse(&group));
    }

    let rows: Vec<MaterialRow> = picker
        .material_options()
        .into_iter()
        .map(|m| MaterialRow {
            id: m.id,
            name: m.name,
            group: m.material_group_id,
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// Build the filter from config defaults and command-line flags
fn build_filter_state(config: &Config, args: &FilterArgs) -> Result<FilterState> {
    let mut filter = Filter::current_month();

    let from = args.from.as_deref().map(parse_date).transpose()?;
    let to = args.to.as_deref().map(parse_date).transpose()?;
    filter.set_dates(
        from.unwrap_or(filter.date_from()),
        to.unwrap_or(filter.date_to()),
    )?;

    Ok(FilterState::new(filter)
        .with_offset(config.filter.offset()?)
        .with_empty_types(config.filter.empty_transaction_types))
}

/// Apply group/material flags.
///
/// A specific material is looked up in the material list (scoped to `--group`
/// when given) and pulls its parent group along. "all" keeps the group as
/// given. A dry run sends nothing, so the flags go out unchanged.
fn apply_selection<C: Catalog>(catalog: &C, filter: &mut Filter, args: &FilterArgs) -> Result<()> {
    let group = args.group.as_deref().map(Selection::parse).unwrap_or_default();
    let material = args.material.as_deref().map(Selection::parse).unwrap_or_default();

    if material.is_all() || args.dry_run {
        if !material.is_all() && group.is_all() {
            eprintln!("Note: material_group is resolved from material '{material}' when sent");
        }
        filter.material_group = group;
        filter.material = material;
        return Ok(());
    }

    let mut picker = MaterialPicker::load(catalog);
    if !group.is_all() {
        picker.select_group(catalog, group);
    }
    picker.select_material(&material)?;
    picker.apply_to(filter);

    Ok(())
}

/// Stock summary report
fn cmd_summary(cfg_dir: &Path, resolution: &str, args: &FilterArgs, cards: bool) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let fetcher = fetcher_for(&config);

    let mut state = build_filter_state(&config, args)?;
    state.filter.resolution = resolution.parse::<Resolution>()?;
    apply_selection(&fetcher, &mut state.filter, args)?;

    let source = ReportSource::new(&fetcher, ReportKind::Summary);
    if args.dry_run {
        println!("{}", source.url(&state));
        return Ok(());
    }

    let table = ReportTable::new(source);
    if table.refresh(&state) != BindOutcome::Applied {
        println!("No summary loaded.");
        return Ok(());
    }
    let rows = table.rows().unwrap_or_default();
    if rows.is_empty() {
        println!("No periods in range.");
        return Ok(());
    }

    if cards {
        println!("{}", render_summary_cards(&rows));
    } else {
        println!("{}", render_table(&rows, SUMMARY_COLUMNS));
    }
    println!();
    println!(
        "{} period(s), {} from {} to {}",
        rows.len(),
        state.filter.resolution,
        state.filter.date_from(),
        state.filter.date_to()
    );

    Ok(())
}

/// Transactions report
fn cmd_transactions(
    cfg_dir: &Path,
    type_in: bool,
    type_out: bool,
    args: &FilterArgs,
    links: bool,
) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let fetcher = fetcher_for(&config);

    let mut state = build_filter_state(&config, args)?;
    state.filter.set_transaction_type(TransactionType::In, type_in);
    state.filter.set_transaction_type(TransactionType::Out, type_out);
    apply_selection(&fetcher, &mut state.filter, args)?;

    let source = ReportSource::new(&fetcher, ReportKind::Transactions);
    if args.dry_run {
        println!("{}", source.url(&state));
        return Ok(());
    }

    let table = ReportTable::new(source);
    if table.refresh(&state) != BindOutcome::Applied {
        println!("No transactions loaded.");
        return Ok(());
    }
    let mut rows = table.rows().unwrap_or_default();
    if rows.is_empty() {
        println!("No transactions match the filter.");
        return Ok(());
    }

    let mut columns = TRANSACTION_COLUMNS.to_vec();
    if links {
        for row in rows.iter_mut() {
            let link = row
                .get("id")
                .and_then(|id| id.as_str())
                .map(|id| transaction_page(fetcher.base_url(), id));
            if let (Some(link), Some(map)) = (link, row.as_object_mut()) {
                map.insert("link".to_string(), link.into());
            }
        }
        columns.push("link");
    }

    println!("{}", render_table(&rows, &columns));
    println!();
    println!("Total: {} transactions", rows.len());

    Ok(())
}

/// Press the PDF button of a document
fn cmd_pdf(cfg_dir: &Path, kind: &str, uuid: &str, exists: bool, open: bool) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let fetcher = fetcher_for(&config);

    let kind: DocumentKind = kind.parse()?;
    let mut button = PdfButton::from_data(kind, uuid, if exists { "1" } else { "0" })?;
    println!("[{}]", button.label());

    let outcome = button.click(&fetcher, &config.documents.base_path)?;
    if let ClickOutcome::Generated { .. } = outcome {
        println!("Generated PDF, button is now [{}]", button.label());
    }

    if open {
        open_url(outcome.url())?;
        println!("Opened {}", outcome.url());
    } else {
        println!("{}", outcome.url());
    }

    Ok(())
}

fn open_url(url: &str) -> Result<()> {
    // Open with system default browser
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()?;
    }
    Ok(())
}
