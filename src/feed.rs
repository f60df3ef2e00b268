use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::scene::Scene;

const METADATA_GROUPS: [&str; 3] = ["str", "date", "int"];
const RESERVED_KEYS: [&str; 4] = ["id", "title", "url", "footprint"];

#[derive(Debug, Default)]
pub struct FeedPage {
    /// Raw number of entries in the page, including ones that were skipped.
    pub entries: usize,
    pub scenes: Vec<Scene>,
}

pub fn parse_feed(page: &Value) -> FeedPage {
    let Some(entry) = page.get("feed").and_then(|feed| feed.get("entry")) else {
        debug!("no results for this feed");
        return FeedPage::default();
    };

    let entries = as_list(entry);
    let scenes = entries
        .iter()
        .filter_map(|raw| match parse_entry(raw) {
            Ok(scene) => Some(scene),
            Err(reason) => {
                warn!("skipping feed entry: {reason}");
                None
            }
        })
        .collect();

    FeedPage {
        entries: entries.len(),
        scenes,
    }
}

fn parse_entry(raw: &Value) -> Result<Scene, String> {
    let id = string_field(raw, "id").ok_or("entry without id")?;
    let title = string_field(raw, "title").ok_or_else(|| format!("entry {id} without title"))?;
    let url = raw
        .get("link")
        .map(as_list)
        .and_then(|links| links.first().copied())
        .and_then(|link| link.get("href"))
        .and_then(|href| href.as_str())
        .ok_or_else(|| format!("entry {title} without download link"))?;

    let mut metadata = BTreeMap::new();
    for group in METADATA_GROUPS {
        let Some(items) = raw.get(group) else {
            continue;
        };
        for item in as_list(items) {
            let name = item.get("name").and_then(|value| value.as_str());
            let content = item.get("content");
            if let (Some(name), Some(content)) = (name, content) {
                metadata.insert(name.to_string(), content.clone());
            }
        }
    }

    let footprint = metadata
        .get("footprint")
        .and_then(|value| value.as_str())
        .ok_or_else(|| format!("entry {title} without footprint"))?;
    let mut scene = Scene::new(id, title.clone(), url, footprint)
        .map_err(|err| format!("entry {title}: {err}"))?;

    for key in RESERVED_KEYS {
        metadata.remove(key);
    }
    scene.metadata = metadata;
    Ok(scene)
}

fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
}
