use scihub_fetch::filter::{DEFAULT_MIN_OVERLAP, filter_overlap};
use scihub_fetch::geometry::Aoi;
use scihub_fetch::scene::Scene;

fn scene(id: &str, footprint: &str) -> Scene {
    Scene::new(id, format!("S1A_{id}"), format!("https://hub.example/{id}"), footprint).unwrap()
}

fn kept_ids(scenes: Vec<Scene>, aoi: &Aoi, min_overlap: f64) -> Vec<String> {
    filter_overlap(scenes, aoi, min_overlap)
        .into_iter()
        .map(|scene| scene.id)
        .collect()
}

#[test]
fn overlap_with_area_of_interest() {
    // 10 x 10 area; the footprint covers a quarter of it.
    let aoi = Aoi::from_wkt("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap();
    let scenes = vec![scene("quarter", "POLYGON ((5 5, 15 5, 15 15, 5 15, 5 5))")];

    let kept = filter_overlap(scenes.clone(), &aoi, 0.2);
    assert_eq!(kept.len(), 1);
    assert!((kept[0].overlap_percentage.unwrap() - 25.0).abs() < 1e-9);
    assert!(kept_ids(scenes, &aoi, 0.3).is_empty());
}

#[test]
fn small_scene_inside_large_area_is_rescued() {
    // 1 x 1 footprint fully inside a 100 x 100 area: 0.01% of the area,
    // 100% of the footprint.
    let aoi = Aoi::from_wkt("POLYGON ((0 0, 100 0, 100 100, 0 100, 0 0))").unwrap();
    let scenes = vec![scene("tiny", "POLYGON ((10 10, 11 10, 11 11, 10 11, 10 10))")];

    let kept = filter_overlap(scenes, &aoi, 0.5);
    assert_eq!(kept.len(), 1);
    assert!((kept[0].overlap_percentage.unwrap() - 0.01).abs() < 1e-9);
}

#[test]
fn rescue_does_not_apply_to_large_footprints() {
    // The footprint is the larger shape, so only the primary clause counts.
    let aoi = Aoi::from_wkt("POLYGON ((10 10, 11 10, 11 11, 10 11, 10 10))").unwrap();
    let scenes = vec![scene(
        "huge",
        "POLYGON ((10.5 10.5, 110 10.5, 110 110, 10.5 110, 10.5 10.5))",
    )];
    assert!(kept_ids(scenes.clone(), &aoi, 0.5).is_empty());
    assert_eq!(kept_ids(scenes, &aoi, 0.2), ["huge"]);
}

#[test]
fn disjoint_and_touching_footprints_are_dropped() {
    let aoi = Aoi::from_wkt("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap();
    let scenes = vec![
        scene("far", "POLYGON ((50 50, 60 50, 60 60, 50 60, 50 50))"),
        scene("edge", "POLYGON ((10 0, 20 0, 20 10, 10 10, 10 0))"),
    ];
    assert!(kept_ids(scenes, &aoi, DEFAULT_MIN_OVERLAP).is_empty());
}

#[test]
fn multipolygon_area_of_interest() {
    let aoi = Aoi::from_wkt(
        "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 1, 0 0)), ((5 5, 6 5, 6 6, 5 6, 5 5)))",
    )
    .unwrap();
    let scenes = vec![scene("second-part", "POLYGON ((5 5, 6 5, 6 6, 5 6, 5 5))")];
    let kept = filter_overlap(scenes, &aoi, DEFAULT_MIN_OVERLAP);
    assert!((kept[0].overlap_percentage.unwrap() - 50.0).abs() < 1e-9);
}
