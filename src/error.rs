use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HubError {
    #[error("invalid platform: {0} (expected one of S1A*, S1B*, S2A*, S2B*, S3A*, S3B*)")]
    InvalidPlatform(String),

    #[error("invalid date field: {0} (expected beginPosition, endPosition or ingestionDate)")]
    InvalidDateField(String),

    #[error("invalid date: {0} (expected YYYY-MM-DD or an RFC 3339 timestamp)")]
    InvalidDate(String),

    #[error("an end date was given without a start date")]
    #[diagnostic(help("pass --start as well; --end defaults to now when omitted"))]
    MissingStartDate,

    #[error("minimum overlap must be within 0..=1, got {0}")]
    InvalidOverlap(f64),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("no area of interest set")]
    #[diagnostic(help("pass --geometry or --sites"))]
    NoGeometries,

    #[error("input file does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("invalid keyword filter: {0} (expected key=value)")]
    InvalidKeyword(String),

    #[error("invalid export target: {0} (expected format=path)")]
    InvalidExportTarget(String),

    #[error("invalid API url: {0}")]
    InvalidBaseUrl(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing hub credentials")]
    #[diagnostic(help("set username/password in scihub-fetch.json or SCIHUB_USERNAME/SCIHUB_PASSWORD"))]
    MissingCredentials,

    #[error("search request failed: {0}")]
    SearchHttp(String),

    #[error("search returned status {status}: {message}")]
    SearchStatus { status: u16, message: String },

    #[error("malformed search response: {0}")]
    SearchDecode(String),

    #[error("download request failed: {0}")]
    DownloadHttp(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("archive check failed: {0}")]
    Archive(String),

    #[error("unsafe scene title: {0}")]
    UnsafeTitle(String),

    #[error("[ASF writer] unknown product: {0}")]
    UnknownProduct(String),

    #[error("interrupted, removed partial download {0}")]
    Interrupted(PathBuf),
}
