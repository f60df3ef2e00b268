use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use geo::{Area, BooleanOps, BoundingRect, Geometry, MultiPolygon, Polygon};
use tracing::{info, warn};
use wkt::{ToWkt, TryFromWkt};

use crate::error::HubError;

#[derive(Debug, Clone)]
pub struct Aoi {
    wkt: String,
    shape: MultiPolygon<f64>,
}

impl Aoi {
    pub fn from_wkt(value: &str) -> Result<Self, HubError> {
        let geometry = parse_geometry(value)?;
        let shape = polygonal(geometry).ok_or_else(|| {
            HubError::InvalidGeometry(format!("not a polygonal geometry: {}", value.trim()))
        })?;
        if shape.0.is_empty() {
            return Err(HubError::InvalidGeometry(format!("empty geometry: {}", value.trim())));
        }
        Ok(Self {
            wkt: value.trim().to_string(),
            shape,
        })
    }

    pub fn as_wkt(&self) -> &str {
        &self.wkt
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }

    pub fn bbox_wkt(&self) -> Result<String, HubError> {
        let rect = self
            .shape
            .bounding_rect()
            .ok_or_else(|| HubError::InvalidGeometry(format!("no envelope for {}", self.wkt)))?;
        Ok(rect.to_polygon().wkt_string())
    }
}

impl FromStr for Aoi {
    type Err = HubError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_wkt(value)
    }
}

impl fmt::Display for Aoi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wkt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub aoi_area: f64,
    pub footprint_area: f64,
    pub intersection_area: f64,
}

pub fn coverage(aoi: &Aoi, footprint: &Polygon<f64>) -> Coverage {
    let footprint = MultiPolygon::new(vec![footprint.clone()]);
    let intersection = aoi.shape().intersection(&footprint);
    Coverage {
        aoi_area: aoi.area(),
        footprint_area: footprint.unsigned_area(),
        intersection_area: intersection.unsigned_area(),
    }
}

pub fn parse_geometry(value: &str) -> Result<Geometry<f64>, HubError> {
    Geometry::<f64>::try_from_wkt_str(value.trim())
        .map_err(|err| HubError::InvalidGeometry(format!("{err}: {}", value.trim())))
}

pub fn footprint_from_wkt(value: &str) -> Result<Polygon<f64>, HubError> {
    match parse_geometry(value)? {
        Geometry::Polygon(polygon) => Ok(polygon),
        Geometry::MultiPolygon(multi) => multi
            .0
            .into_iter()
            .next()
            .ok_or_else(|| HubError::InvalidGeometry("empty multipolygon footprint".to_string())),
        other => Err(HubError::InvalidGeometry(format!(
            "footprint is not polygonal: {}",
            other.wkt_string()
        ))),
    }
}

fn polygonal(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi) => Some(multi),
        Geometry::Rect(rect) => Some(MultiPolygon::new(vec![rect.to_polygon()])),
        Geometry::Triangle(triangle) => Some(MultiPolygon::new(vec![triangle.to_polygon()])),
        _ => None,
    }
}

pub fn load_sites(path: &Path) -> Result<Vec<Aoi>, HubError> {
    if !path.exists() {
        return Err(HubError::InputNotFound(path.to_path_buf()));
    }
    info!("loading sites from {}", path.display());
    let content = fs::read_to_string(path)
        .map_err(|err| HubError::Filesystem(format!("read {}: {err}", path.display())))?;

    let is_geojson = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("geojson") || ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let sites = if is_geojson {
        sites_from_geojson(&content)?
    } else {
        sites_from_wkt_lines(&content)?
    };
    info!("found {} features", sites.len());
    Ok(sites)
}

fn sites_from_wkt_lines(content: &str) -> Result<Vec<Aoi>, HubError> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Aoi::from_wkt)
        .collect()
}

fn sites_from_geojson(content: &str) -> Result<Vec<Aoi>, HubError> {
    let parsed: geojson::GeoJson = content
        .parse()
        .map_err(|err| HubError::InvalidGeometry(format!("GeoJSON: {err}")))?;
    let collection = geo::GeometryCollection::<f64>::try_from(&parsed)
        .map_err(|err| HubError::InvalidGeometry(format!("GeoJSON: {err}")))?;

    let mut sites = Vec::new();
    for geometry in collection {
        let wkt = geometry.wkt_string();
        match polygonal(geometry) {
            Some(shape) if !shape.0.is_empty() => sites.push(Aoi { wkt, shape }),
            _ => warn!("skipping non-polygonal site geometry: {wkt}"),
        }
    }
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn multipolygon_footprint_keeps_first_part() {
        let footprint = footprint_from_wkt(
            "MULTIPOLYGON (((0 0, 2 0, 2 2, 0 2, 0 0)), ((10 10, 11 10, 11 11, 10 11, 10 10)))",
        )
        .unwrap();
        assert!((footprint.unsigned_area() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn point_is_not_an_area_of_interest() {
        let err = Aoi::from_wkt("POINT (1 2)").unwrap_err();
        assert_matches!(err, HubError::InvalidGeometry(_));
    }

    #[test]
    fn garbage_wkt_is_rejected() {
        assert_matches!(
            Aoi::from_wkt("POLYGON ((0 0, 1").unwrap_err(),
            HubError::InvalidGeometry(_)
        );
    }

    #[test]
    fn coverage_of_half_overlap() {
        let aoi = Aoi::from_wkt("POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))").unwrap();
        let footprint = footprint_from_wkt("POLYGON ((1 0, 3 0, 3 2, 1 2, 1 0))").unwrap();
        let cov = coverage(&aoi, &footprint);
        assert!((cov.aoi_area - 4.0).abs() < 1e-9);
        assert!((cov.footprint_area - 4.0).abs() < 1e-9);
        assert!((cov.intersection_area - 2.0).abs() < 1e-9);
    }

    #[test]
    fn bbox_covers_envelope() {
        let aoi = Aoi::from_wkt("POLYGON ((0 0, 4 1, 2 3, 0 0))").unwrap();
        let bbox = Aoi::from_wkt(&aoi.bbox_wkt().unwrap()).unwrap();
        assert!((bbox.area() - 12.0).abs() < 1e-9);
    }
}
