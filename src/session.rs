use std::path::Path;

use camino::Utf8PathBuf;
use reqwest::Url;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{Credentials, DateFilter, Keywords, Platform};
use crate::download::{DownloadSummary, download_scene};
use crate::error::HubError;
use crate::export::{self, ExportContext, ExportFormat};
use crate::feed::parse_feed;
use crate::filter::{DEFAULT_MIN_OVERLAP, filter_existing, filter_overlap};
use crate::geometry::{self, Aoi};
use crate::hub::HubClient;
use crate::interrupt::Interrupt;
use crate::query::{PAGE_SIZE, SearchQuery};
use crate::scene::{Scene, SceneCollection};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Message(String),
    Transfer {
        name: String,
        written: u64,
        total: u64,
    },
    TransferDone {
        name: String,
    },
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    platform: Platform,
    min_overlap: f64,
    dates: Option<DateFilter>,
    keywords: Keywords,
}

impl SearchRequest {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            min_overlap: DEFAULT_MIN_OVERLAP,
            dates: None,
            keywords: Keywords::new(),
        }
    }

    pub fn with_min_overlap(mut self, min_overlap: f64) -> Result<Self, HubError> {
        if !(0.0..=1.0).contains(&min_overlap) {
            return Err(HubError::InvalidOverlap(min_overlap));
        }
        self.min_overlap = min_overlap;
        Ok(self)
    }

    pub fn with_dates(mut self, dates: Option<DateFilter>) -> Self {
        self.dates = dates;
        self
    }

    pub fn with_keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn min_overlap(&self) -> f64 {
        self.min_overlap
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::new(Platform::S1A)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeometrySearch {
    pub index: usize,
    pub requests: usize,
    pub fetched: usize,
    pub after_filter: usize,
    pub added: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub geometries: Vec<GeometrySearch>,
    pub total_scenes: usize,
}

impl SearchReport {
    pub fn requests(&self) -> usize {
        self.geometries.iter().map(|geometry| geometry.requests).sum()
    }

    pub fn fetched(&self) -> usize {
        self.geometries.iter().map(|geometry| geometry.fetched).sum()
    }
}

pub struct Session<C: HubClient> {
    client: C,
    credentials: Credentials,
    base_url: Url,
    store: Store,
    geometries: Vec<Aoi>,
    scenes: SceneCollection,
    interrupt: Interrupt,
}

impl<C: HubClient> Session<C> {
    pub fn new(client: C, credentials: Credentials, base_url: Url, store: Store) -> Self {
        Self {
            client,
            credentials,
            base_url,
            store,
            geometries: Vec::new(),
            scenes: SceneCollection::new(),
            interrupt: Interrupt::new(),
        }
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn set_download_dir(&mut self, dir: Utf8PathBuf) -> Result<(), HubError> {
        self.store.set_download_dir(dir)
    }

    pub fn add_data_dir(&mut self, dir: Utf8PathBuf) {
        self.store.add_data_dir(dir);
    }

    pub fn set_geometries<S: AsRef<str>>(&mut self, wkts: &[S]) -> Result<(), HubError> {
        let geometries = wkts
            .iter()
            .map(|wkt| Aoi::from_wkt(wkt.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.geometries = geometries;
        Ok(())
    }

    pub fn load_sites(&mut self, path: &Path) -> Result<usize, HubError> {
        let geometries = geometry::load_sites(path)?;
        info!("loaded {} sites from {}", geometries.len(), path.display());
        self.geometries = geometries;
        Ok(self.geometries.len())
    }

    pub fn geometries(&self) -> &[Aoi] {
        &self.geometries
    }

    pub fn scenes(&self) -> &SceneCollection {
        &self.scenes
    }

    pub fn search(&mut self, request: &SearchRequest) -> Result<SearchReport, HubError> {
        if self.geometries.is_empty() {
            return Err(HubError::NoGeometries);
        }

        let mut report = Vec::with_capacity(self.geometries.len());
        for (index, aoi) in self.geometries.iter().enumerate() {
            let query = SearchQuery::build(
                request.platform,
                aoi,
                request.dates.as_ref(),
                &request.keywords,
            )?;
            let (scenes, requests, fetched) = self.paginate(&query);
            info!("{} scenes after initial search", scenes.len());

            let scenes = filter_existing(scenes, &self.store);
            let scenes = filter_overlap(scenes, aoi, request.min_overlap);
            info!("{} scenes after filtering", scenes.len());
            let after_filter = scenes.len();

            let added = self.scenes.merge(scenes);
            info!("{} total scenes after merging", self.scenes.len());
            report.push(GeometrySearch {
                index,
                requests,
                fetched,
                after_filter,
                added,
            });
        }

        Ok(SearchReport {
            geometries: report,
            total_scenes: self.scenes.len(),
        })
    }

    /// Returns the parsed scenes, the number of requests and the raw entry
    /// count. A failed page counts as empty and ends the loop.
    fn paginate(&self, query: &SearchQuery) -> (Vec<Scene>, usize, usize) {
        let mut scenes = Vec::new();
        let mut offset = 0;
        let mut requests = 0;
        let mut fetched = 0;
        loop {
            let url = query.page_url(&self.base_url, offset);
            info!("search url: {url}");
            requests += 1;
            let page = match self.client.fetch_page(&url) {
                Ok(value) => parse_feed(&value),
                Err(err) => {
                    warn!("search page at offset {offset} failed: {err}");
                    break;
                }
            };
            info!("found {} results", page.entries);
            fetched += page.entries;
            scenes.extend(page.scenes);
            if page.entries < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }
        (scenes, requests, fetched)
    }

    pub fn scene_titles(&self) -> Vec<String> {
        self.scenes.titles_by_acquisition()
    }

    pub fn write_results(&self, format: ExportFormat, path: &Path) -> Result<String, HubError> {
        let context = ExportContext {
            credentials: &self.credentials,
            download_dir: self.store.download_dir(),
        };
        export::write_results(format, path, self.scenes.as_slice(), &context)
    }

    pub fn download_all(&self, sink: &dyn ProgressSink) -> Result<DownloadSummary, HubError> {
        self.store.ensure_download_dir()?;
        let mut summary = DownloadSummary::default();
        let total = self.scenes.len();
        for (position, scene) in self.scenes.iter().enumerate() {
            sink.event(ProgressEvent::Message(format!(
                "[{}/{total}] {}",
                position + 1,
                scene.title
            )));
            let outcome = download_scene(&self.client, scene, &self.store, &self.interrupt, sink)?;
            summary.record(scene, outcome);
        }
        info!(
            "downloads finished: {} succeeded, {} failed, {} skipped",
            summary.success.len(),
            summary.failed.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }
}
