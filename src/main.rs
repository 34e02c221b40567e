use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use clap::{Args, Parser, Subcommand, ValueEnum};
use scholar_query::compiler::{decode_date_partial, group_terms, QueryCompiler};
use scholar_query::config::{default_config_path, get_config, load_config, Config};
use scholar_query::models::{
    AdvancedQuery, Classification, DateRange, DateType, Field, FieldedSearchTerm, Query,
    SimpleQuery,
};
use scholar_query::utils::parse_arxiv_id;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scholar Query - Compile scholarly-paper search queries into search plans
#[derive(Parser, Debug)]
#[command(name = "scholar-query")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile scholarly-paper search queries into backend search plans", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Date field for range filters
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DateField {
    /// Submission date of any version
    Submitted,
    /// Submission date of the first version
    SubmittedFirst,
    /// Announcement date of the first version
    Announced,
}

impl From<DateField> for DateType {
    fn from(field: DateField) -> Self {
        match field {
            DateField::Submitted => DateType::SubmittedDate,
            DateField::SubmittedFirst => DateType::SubmittedDateFirst,
            DateField::Announced => DateType::AnnouncedDateFirst,
        }
    }
}

/// Ordering and pagination shared by query commands
#[derive(Args, Debug)]
struct PageArgs {
    /// Sort order, e.g. "-submitted_date" or "relevance"
    #[arg(long)]
    order: Option<String>,

    /// Results per page (default from config)
    #[arg(long)]
    page_size: Option<usize>,

    /// Offset of the first result
    #[arg(long, default_value_t = 0)]
    page_start: usize,

    /// Also search superseded versions
    #[arg(long)]
    include_older_versions: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a single-field query and print the search plan
    #[command(alias = "c")]
    Compile {
        /// Search text
        value: String,

        /// Field to search
        #[arg(long, short, default_value_t = Field::All)]
        field: Field,

        /// Restrict to an archive (repeatable)
        #[arg(long, short)]
        archive: Vec<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Compile a fielded boolean query and print the search plan
    #[command(alias = "a")]
    Advanced {
        /// Terms as "field=text", later ones prefixed by AND, OR or NOT ("OR title=gluon")
        #[arg(required = true)]
        terms: Vec<FieldedSearchTerm>,

        /// Primary classification as "group:archive:category" (repeatable)
        #[arg(long)]
        classification: Vec<Classification>,

        /// Also match papers cross-listed into the classifications
        #[arg(long)]
        cross_list: bool,

        /// Range start, inclusive (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_date)]
        from: Option<DateTime<FixedOffset>>,

        /// Range end, exclusive (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_date)]
        to: Option<DateTime<FixedOffset>>,

        /// Date field the range applies to
        #[arg(long, value_enum, default_value_t = DateField::Submitted)]
        date_field: DateField,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show how fielded terms group by operator precedence
    #[command(alias = "g")]
    Group {
        /// Terms as "field=text", later ones prefixed by AND, OR or NOT
        #[arg(required = true)]
        terms: Vec<FieldedSearchTerm>,
    },

    /// Find a four-digit identifier date partial (YYMM) in a term
    DatePartial {
        /// Search text
        term: String,
    },

    /// Check and normalize an arXiv identifier
    CheckId {
        /// Identifier, arXiv: prefixed ID or /abs/ URL
        id: String,
    },

    /// Write a default configuration file
    InitConfig {
        /// Where to write (default: user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

fn parse_date(value: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date);
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {}", value, e))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date '{}'", value))?;
    let utc = FixedOffset::east_opt(0).ok_or_else(|| "invalid offset".to_string())?;
    utc.from_local_datetime(&midnight)
        .single()
        .ok_or_else(|| format!("ambiguous date '{}'", value))
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => config.logging.level.as_str(),
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let json = config.logging.is_json();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("scholar_query={}", level)),
        ))
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => get_config(),
    };
    init_tracing(&cli, &config);

    let compiler = QueryCompiler::new(config.compiler.settings());
    let default_page_size = config.compiler.default_page_size;

    match cli.command {
        Commands::Compile {
            value,
            field,
            archive,
            page,
        } => {
            let mut query = SimpleQuery::new(field, value)
                .page_size(page.page_size.unwrap_or(default_page_size))
                .page_start(page.page_start)
                .include_older_versions(page.include_older_versions);
            if let Some(order) = page.order {
                query = query.order(order);
            }
            for archive in archive {
                query = query.archive(archive);
            }
            if query.classic_author_syntax && !cli.quiet {
                eprintln!("Rewrote classic author syntax as: {}", query.value);
            }

            let plan = compiler.compile(&Query::Simple(query))?;
            print_json(&plan.to_json())?;
        }

        Commands::Advanced {
            terms,
            classification,
            cross_list,
            from,
            to,
            date_field,
            page,
        } => {
            let mut query = AdvancedQuery::new(terms)
                .include_cross_list(cross_list)
                .page_size(page.page_size.unwrap_or(default_page_size))
                .page_start(page.page_start);
            query.include_older_versions = page.include_older_versions;
            for classification in classification {
                query = query.classification(classification);
            }
            if from.is_some() || to.is_some() {
                query = query.date_range(DateRange::new(from, to).date_type(date_field.into()));
            }
            if let Some(order) = page.order {
                query = query.order(order);
            }

            let plan = compiler.compile(&Query::Advanced(query))?;
            print_json(&plan.to_json())?;
        }

        Commands::Group { terms } => {
            let grouped = group_terms(&terms)?;
            println!("{}", grouped);
        }

        Commands::DatePartial { term } => match decode_date_partial(&term) {
            Ok((year_month, remainder)) => {
                println!("date:      {}", year_month);
                println!("remainder: {}", remainder);
            }
            Err(e) => {
                if !cli.quiet {
                    eprintln!("{}", e);
                }
                std::process::exit(1);
            }
        },

        Commands::CheckId { id } => {
            let id = parse_arxiv_id(&id)?;
            print_json(&id)?;
        }

        Commands::InitConfig { path, force } => {
            let path = path
                .or_else(default_config_path)
                .context("could not determine a config directory; pass a path")?;
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            if !cli.quiet {
                println!("Wrote default configuration to {}", path.display());
            }
        }
    }

    Ok(())
}
