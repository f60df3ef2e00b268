use std::collections::{BTreeMap, HashSet};

use geo::Polygon;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use wkt::ToWkt;

use crate::error::HubError;
use crate::geometry::footprint_from_wkt;

#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub id: String,
    pub title: String,
    pub url: String,
    pub footprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap_percentage: Option<f64>,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(skip)]
    pub(crate) shape: Polygon<f64>,
}

impl Scene {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        footprint_wkt: &str,
    ) -> Result<Self, HubError> {
        let title: String = title.into();
        if !is_plain_title(&title) {
            return Err(HubError::UnsafeTitle(title));
        }
        let shape = footprint_from_wkt(footprint_wkt)?;
        Ok(Self {
            id: id.into(),
            title,
            url: url.into(),
            footprint: shape.wkt_string(),
            overlap_percentage: None,
            metadata: BTreeMap::new(),
            shape,
        })
    }

    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.title)
    }

    pub fn shape(&self) -> &Polygon<f64> {
        &self.shape
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneCollection {
    scenes: Vec<Scene>,
    ids: HashSet<String>,
}

impl SceneCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, scenes: Vec<Scene>) -> usize {
        let before = self.scenes.len();
        for scene in scenes {
            if self.ids.insert(scene.id.clone()) {
                self.scenes.push(scene);
            }
        }
        self.scenes.len() - before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scene> {
        self.scenes.iter()
    }

    pub fn as_slice(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn titles_by_acquisition(&self) -> Vec<String> {
        let stamp = acquisition_regex();
        let mut titles = self
            .scenes
            .iter()
            .map(|scene| {
                let key = stamp
                    .as_ref()
                    .and_then(|re| re.find(&scene.title))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                (key, scene.title.clone())
            })
            .collect::<Vec<_>>();
        titles.sort();
        titles.into_iter().map(|(_, title)| title).collect()
    }
}

impl<'a> IntoIterator for &'a SceneCollection {
    type Item = &'a Scene;
    type IntoIter = std::slice::Iter<'a, Scene>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenes.iter()
    }
}

/// Titles become file names inside the store directories, so they must be a
/// single relative path component.
pub fn is_plain_title(title: &str) -> bool {
    !title.is_empty()
        && title != "."
        && title != ".."
        && !title.contains(['/', '\\', ':', '\0'])
}

fn acquisition_regex() -> Option<Regex> {
    Regex::new(r"[0-9T]{15}").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str, title: &str) -> Scene {
        Scene::new(
            id,
            title,
            format!("https://hub.example/odata/v1/Products('{id}')/$value"),
            "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))",
        )
        .unwrap()
    }

    #[test]
    fn titles_must_stay_inside_the_store() {
        for title in ["../escaped", "/tmp/abs", "a/b", "..\\up", "C:evil", "..", ""] {
            let err = Scene::new("x", title, "https://hub.example/x", "POLYGON ((0 0, 1 0, 1 1, 0 0))")
                .unwrap_err();
            assert!(matches!(err, HubError::UnsafeTitle(_)), "{title}");
        }
        assert!(is_plain_title("S1A_IW_GRDH_1SDV_20170101T051700_20170101T051725_014614_017C1A_BBBB"));
    }

    #[test]
    fn merge_keeps_first_seen() {
        let mut collection = SceneCollection::new();
        assert_eq!(collection.merge(vec![scene("a", "first"), scene("b", "b")]), 2);
        assert_eq!(collection.merge(vec![scene("a", "second"), scene("c", "c")]), 1);
        let titles = collection.iter().map(|s| s.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["first", "b", "c"]);
    }

    #[test]
    fn titles_sorted_by_acquisition_stamp() {
        let mut collection = SceneCollection::new();
        collection.merge(vec![
            scene("1", "S1A_IW_GRDH_1SDV_20170302T051700_20170302T051725_015489_019787_AAAA"),
            scene("2", "S1A_IW_GRDH_1SDV_20170101T051700_20170101T051725_014614_017C1A_BBBB"),
        ]);
        let titles = collection.titles_by_acquisition();
        assert!(titles[0].contains("20170101T051700"));
        assert!(titles[1].contains("20170302T051700"));
    }
}
