use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use scihub_fetch::config::ConfigLoader;
use scihub_fetch::domain::{DateField, DateFilter, DateInput, Keywords, Platform, parse_keyword};
use scihub_fetch::error::HubError;
use scihub_fetch::export::parse_export_target;
use scihub_fetch::filter::DEFAULT_MIN_OVERLAP;
use scihub_fetch::hub::HubHttpClient;
use scihub_fetch::output::{
    JsonOutput, OutputMode, TerminalProgress, print_download_summary, print_search_summary,
};
use scihub_fetch::query::parse_base_url;
use scihub_fetch::session::{ProgressSink, SearchRequest, Session};
use scihub_fetch::store::Store;

#[derive(Parser)]
#[command(name = "scihub-fetch")]
#[command(about = "Search the Copernicus SciHub for Sentinel scenes and download verified archives")]
#[command(version, author)]
struct Cli {
    /// JSON config file with credentials and directories.
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Search scenes for the given areas of interest")]
    Search(SearchArgs),
    #[command(about = "Search, then download and verify every scene found")]
    Download(SearchArgs),
}

#[derive(Args, Clone)]
struct SearchArgs {
    /// Area of interest as WKT (EPSG:4326). Repeatable.
    #[arg(long = "geometry", value_name = "WKT")]
    geometries: Vec<String>,

    /// File with one WKT per line, or a GeoJSON file.
    #[arg(long, value_name = "FILE")]
    sites: Option<PathBuf>,

    #[arg(long, default_value = "S1A*")]
    platform: Platform,

    #[arg(long, default_value_t = DEFAULT_MIN_OVERLAP)]
    min_overlap: f64,

    /// YYYY-MM-DD or RFC 3339 timestamp.
    #[arg(long)]
    start: Option<DateInput>,

    /// Defaults to now when only --start is given.
    #[arg(long)]
    end: Option<DateInput>,

    #[arg(long, default_value = "beginPosition")]
    date_field: DateField,

    /// Extra search filter, e.g. `producttype=GRD`. Repeatable.
    #[arg(short = 'k', long = "keyword", value_name = "KEY=VALUE")]
    keywords: Vec<String>,

    #[arg(long)]
    download_dir: Option<Utf8PathBuf>,

    /// Extra directory checked for existing archives. Repeatable.
    #[arg(long = "data-dir")]
    data_dirs: Vec<Utf8PathBuf>,

    #[arg(long)]
    api_url: Option<String>,

    /// Write results as `wget|url|json|asf=PATH`. Repeatable.
    #[arg(long = "export", value_name = "FORMAT=PATH")]
    exports: Vec<String>,

    /// Echo exported files to stdout.
    #[arg(long)]
    print: bool,

    /// Print scene titles sorted by acquisition time.
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(hub) = report.downcast_ref::<HubError>() {
            return ExitCode::from(map_exit_code(hub));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HubError) -> u8 {
    match error {
        HubError::InvalidPlatform(_)
        | HubError::InvalidDateField(_)
        | HubError::InvalidDate(_)
        | HubError::MissingStartDate
        | HubError::InvalidOverlap(_)
        | HubError::InvalidGeometry(_)
        | HubError::NoGeometries
        | HubError::InputNotFound(_)
        | HubError::InvalidKeyword(_)
        | HubError::InvalidExportTarget(_)
        | HubError::InvalidBaseUrl(_)
        | HubError::ConfigRead(_)
        | HubError::ConfigParse(_)
        | HubError::MissingCredentials => 2,
        HubError::SearchHttp(_)
        | HubError::SearchStatus { .. }
        | HubError::SearchDecode(_)
        | HubError::DownloadHttp(_) => 3,
        HubError::Interrupted(_) => 130,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Search(args) => run_search(cli.config.as_deref(), args, false, output_mode),
        Commands::Download(args) => run_search(cli.config.as_deref(), args, true, output_mode),
    }
}

fn run_search(
    config: Option<&str>,
    args: SearchArgs,
    download: bool,
    output_mode: OutputMode,
) -> miette::Result<()> {
    // Validate everything before touching the network.
    let exports = args
        .exports
        .iter()
        .map(|target| parse_export_target(target))
        .collect::<Result<Vec<_>, _>>()?;
    let keywords = args
        .keywords
        .iter()
        .map(|keyword| parse_keyword(keyword))
        .collect::<Result<Keywords, _>>()?;
    let dates = DateFilter::resolve(args.start, args.end, args.date_field)?;
    let request = SearchRequest::new(args.platform)
        .with_min_overlap(args.min_overlap)?
        .with_dates(dates)
        .with_keywords(keywords);

    let resolved = ConfigLoader::resolve(config)?;
    let api_url = match &args.api_url {
        Some(url) => parse_base_url(url)?,
        None => resolved.api_url.clone(),
    };

    let client = HubHttpClient::new(resolved.credentials.clone())?;
    let store = Store::new(resolved.download_dir.clone());
    let mut session = Session::new(client, resolved.credentials, api_url, store);
    session.set_download_dir(args.download_dir.clone().unwrap_or(resolved.download_dir))?;
    for dir in resolved.data_dirs.into_iter().chain(args.data_dirs) {
        session.add_data_dir(dir);
    }
    if let Some(sites) = &args.sites {
        session.load_sites(sites)?;
    }
    if !args.geometries.is_empty() {
        let mut wkts = session
            .geometries()
            .iter()
            .map(|aoi| aoi.as_wkt().to_string())
            .collect::<Vec<_>>();
        wkts.extend(args.geometries.iter().cloned());
        session.set_geometries(&wkts)?;
    }
    session.interrupt().install()?;

    let report = session.search(&request)?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_search(&report).into_diagnostic()?,
        OutputMode::Interactive => print_search_summary(&report),
    }

    for (format, path) in &exports {
        let content = session.write_results(*format, path)?;
        if args.print {
            print!("{content}");
        }
    }

    if args.list {
        let titles = session.scene_titles();
        match output_mode {
            OutputMode::NonInteractive => JsonOutput::print_titles(&titles).into_diagnostic()?,
            OutputMode::Interactive => titles.iter().for_each(|title| println!("{title}")),
        }
    }

    if download {
        let sink: Box<dyn ProgressSink> = match output_mode {
            OutputMode::NonInteractive => Box::new(JsonOutput),
            OutputMode::Interactive => Box::new(TerminalProgress::new()),
        };
        let summary = session.download_all(sink.as_ref())?;
        match output_mode {
            OutputMode::NonInteractive => JsonOutput::print_download(&summary).into_diagnostic()?,
            OutputMode::Interactive => print_download_summary(&summary),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interruption_exit_code() {
        assert_eq!(map_exit_code(&HubError::Interrupted(PathBuf::from("x.zip"))), 130);
        assert_eq!(map_exit_code(&HubError::NoGeometries), 2);
        assert_eq!(map_exit_code(&HubError::DownloadHttp("reset".into())), 3);
    }
}
