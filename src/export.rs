use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use camino::Utf8Path;
use regex::Regex;
use tracing::info;

use crate::domain::Credentials;
use crate::error::HubError;
use crate::fs_util::write_atomic;
use crate::scene::Scene;

const ASF_TEMPLATE: &str = include_str!("templates/asf_download.sh");
const ASF_DATAPOOL: &str = "https://datapool.asf.alaska.edu";
const ASF_TITLE_PATTERN: &str = r"^(?P<sensor>S1[AB])_(?P<beam>S1|S2|S3|S4|S5|S6|IW|EW|WV|EN|N1|N2|N3|N4|N5|N6|IM)_(?P<product>SLC|GRD|OCN)(?P<subproduct>[FHM_])";

const ASF_PRODUCT_PATHS: &[(&str, Option<&str>, &str)] = &[
    ("SLC", None, "SLC"),
    ("GRD", Some("F"), "GRD_FD"),
    ("GRD", Some("H"), "GRD_HD"),
    ("GRD", Some("M"), "GRD_MD"),
];

const ASF_SENSOR_PATHS: &[(&str, &str)] = &[("S1A", "SA"), ("S1B", "SB")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Wget,
    Json,
    Url,
    Asf,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Wget => write!(f, "wget"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Url => write!(f, "url"),
            ExportFormat::Asf => write!(f, "asf"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = HubError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wget" => Ok(ExportFormat::Wget),
            "json" => Ok(ExportFormat::Json),
            "url" | "urls" => Ok(ExportFormat::Url),
            "asf" => Ok(ExportFormat::Asf),
            _ => Err(HubError::InvalidExportTarget(value.to_string())),
        }
    }
}

pub fn parse_export_target(value: &str) -> Result<(ExportFormat, PathBuf), HubError> {
    let (format, path) = value
        .split_once('=')
        .ok_or_else(|| HubError::InvalidExportTarget(value.to_string()))?;
    if path.trim().is_empty() {
        return Err(HubError::InvalidExportTarget(value.to_string()));
    }
    Ok((format.parse()?, PathBuf::from(path.trim())))
}

pub struct ExportContext<'a> {
    pub credentials: &'a Credentials,
    pub download_dir: &'a Utf8Path,
}

pub fn render(
    format: ExportFormat,
    scenes: &[Scene],
    context: &ExportContext<'_>,
) -> Result<String, HubError> {
    match format {
        ExportFormat::Wget => Ok(render_wget(scenes, context)),
        ExportFormat::Json => render_json(scenes),
        ExportFormat::Url => Ok(render_urls(scenes)),
        ExportFormat::Asf => render_asf(scenes, context.download_dir),
    }
}

pub fn write_results(
    format: ExportFormat,
    path: &Path,
    scenes: &[Scene],
    context: &ExportContext<'_>,
) -> Result<String, HubError> {
    let content = render(format, scenes, context)?;
    write_atomic(path, content.as_bytes())?;
    info!("wrote {} scenes as {format} to {}", scenes.len(), path.display());
    Ok(content)
}

fn render_wget(scenes: &[Scene], context: &ExportContext<'_>) -> String {
    scenes
        .iter()
        .map(|scene| {
            format!(
                "wget -c -T120 --no-check-certificate --user=\"{}\" --password=\"{}\" -O {}.zip \"{}\"\n",
                context.credentials.username,
                context.credentials.password,
                context.download_dir.join(&scene.title),
                scene.url.replace('$', "\\$")
            )
        })
        .collect()
}

fn render_urls(scenes: &[Scene]) -> String {
    scenes.iter().map(|scene| format!("{}\n", scene.url)).collect()
}

fn render_json(scenes: &[Scene]) -> Result<String, HubError> {
    serde_json::to_string_pretty(scenes).map_err(|err| HubError::Filesystem(err.to_string()))
}

fn render_asf(scenes: &[Scene], download_dir: &Utf8Path) -> Result<String, HubError> {
    let pattern = asf_title_pattern()?;
    let targets = scenes
        .iter()
        .map(|scene| asf_url(&pattern, &scene.title))
        .collect::<Result<Vec<_>, _>>()?;
    let files = targets
        .iter()
        .map(|url| format!("    \"{url}\""))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ASF_TEMPLATE
        .replace("{{target_dir}}", download_dir.as_str())
        .replace("{{files}}", &files))
}

pub fn asf_url(pattern: &Regex, title: &str) -> Result<String, HubError> {
    let unknown = || HubError::UnknownProduct(title.to_string());
    let captures = pattern.captures(title).ok_or_else(unknown)?;
    let sensor = &captures["sensor"];
    let product = &captures["product"];
    let subproduct = &captures["subproduct"];

    let product_dir = ASF_PRODUCT_PATHS
        .iter()
        .find(|(p, sub, _)| *p == product && sub.is_none_or(|sub| sub == subproduct))
        .map(|(_, _, dir)| *dir)
        .ok_or_else(unknown)?;
    let sensor_dir = ASF_SENSOR_PATHS
        .iter()
        .find(|(s, _)| *s == sensor)
        .map(|(_, dir)| *dir)
        .ok_or_else(unknown)?;

    Ok(format!("{ASF_DATAPOOL}/{product_dir}/{sensor_dir}/{title}.zip"))
}

pub fn asf_title_pattern() -> Result<Regex, HubError> {
    Regex::new(ASF_TITLE_PATTERN).map_err(|err| HubError::UnknownProduct(err.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn asf_lookup_table() {
        let pattern = asf_title_pattern().unwrap();
        assert_eq!(
            asf_url(&pattern, "S1A_IW_GRDH_1SDV_20170101T051700_X").unwrap(),
            "https://datapool.asf.alaska.edu/GRD_HD/SA/S1A_IW_GRDH_1SDV_20170101T051700_X.zip"
        );
        assert_eq!(
            asf_url(&pattern, "S1B_EW_SLC__1SDH_20180101T000000_Y").unwrap(),
            "https://datapool.asf.alaska.edu/SLC/SB/S1B_EW_SLC__1SDH_20180101T000000_Y.zip"
        );
    }

    #[test]
    fn asf_rejects_unmapped_products() {
        let pattern = asf_title_pattern().unwrap();
        assert_matches!(
            asf_url(&pattern, "S1A_IW_OCN__2SDV_20170101T000000").unwrap_err(),
            HubError::UnknownProduct(_)
        );
        assert_matches!(
            asf_url(&pattern, "S1A_IW_GRD__1SDV_20170101T000000").unwrap_err(),
            HubError::UnknownProduct(_)
        );
        assert_matches!(
            asf_url(&pattern, "S2A_MSIL1C_20170101T000000").unwrap_err(),
            HubError::UnknownProduct(_)
        );
    }

    #[test]
    fn export_format_names() {
        assert_eq!("WGET".parse::<ExportFormat>().unwrap(), ExportFormat::Wget);
        assert_eq!("urls".parse::<ExportFormat>().unwrap(), ExportFormat::Url);
        assert!("csv".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn export_targets() {
        let (format, path) = parse_export_target("wget=out/get.sh").unwrap();
        assert_eq!(format, ExportFormat::Wget);
        assert_eq!(path, PathBuf::from("out/get.sh"));
        assert_matches!(
            parse_export_target("wget").unwrap_err(),
            HubError::InvalidExportTarget(_)
        );
        assert!(parse_export_target("csv=x").is_err());
        assert!(parse_export_target("url= ").is_err());
    }
}
