use std::fs;

use assert_matches::assert_matches;

use scihub_fetch::error::HubError;
use scihub_fetch::geometry::load_sites;

#[test]
fn wkt_lines_skip_blanks_and_comments() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("sites.txt");
    fs::write(
        &path,
        "# lake sites\nPOLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))\n\n  MULTIPOLYGON (((5 5, 6 5, 6 6, 5 6, 5 5)))  \n",
    )
    .unwrap();

    let sites = load_sites(&path).unwrap();
    assert_eq!(sites.len(), 2);
    assert!(sites[1].as_wkt().starts_with("MULTIPOLYGON"));
}

#[test]
fn geojson_features_become_sites() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("sites.geojson");
    fs::write(
        &path,
        r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"name": "north"},
                    "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]]]}
                },
                {
                    "type": "Feature",
                    "properties": {"name": "station"},
                    "geometry": {"type": "Point", "coordinates": [1, 1]}
                }
            ]
        }"#,
    )
    .unwrap();

    let sites = load_sites(&path).unwrap();
    assert_eq!(sites.len(), 1);
    assert!((sites[0].area() - 4.0).abs() < 1e-9);
}

#[test]
fn missing_site_file() {
    let temp = tempfile::tempdir().unwrap();
    let err = load_sites(&temp.path().join("nope.txt")).unwrap_err();
    assert_matches!(err, HubError::InputNotFound(_));
}

#[test]
fn invalid_wkt_line_fails_the_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("sites.wkt");
    fs::write(&path, "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))\nPOINT (3 4)\n").unwrap();
    assert_matches!(load_sites(&path).unwrap_err(), HubError::InvalidGeometry(_));
}
