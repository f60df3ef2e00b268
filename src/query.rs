use reqwest::Url;

use crate::domain::{DateFilter, Keywords, Platform};
use crate::error::HubError;
use crate::geometry::Aoi;

pub const PAGE_SIZE: usize = 100;

pub const DEFAULT_API_URL: &str = "https://scihub.copernicus.eu/apihub/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    q: String,
}

impl SearchQuery {
    pub fn build(
        platform: Platform,
        aoi: &Aoi,
        dates: Option<&DateFilter>,
        keywords: &Keywords,
    ) -> Result<Self, HubError> {
        let mut q = platform.as_token().to_string();
        if let Some(dates) = dates {
            q.push_str(&dates.clause());
        }
        q.push_str(&format!(
            " AND (footprint:\"Intersects({})\")",
            aoi.bbox_wkt()?
        ));
        for (key, value) in keywords {
            q.push_str(&format!(" AND ({key}:{value})"));
        }
        Ok(Self { q })
    }

    pub fn as_str(&self) -> &str {
        &self.q
    }

    pub fn page_url(&self, base: &Url, offset: usize) -> Url {
        let mut url = base.clone();
        url.set_path(&format!("{}search", url.path()));
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("rows", &PAGE_SIZE.to_string())
            .append_pair("start", &offset.to_string())
            .append_pair("q", &self.q);
        url
    }
}

/// Parses the hub base URL, making sure it ends with a slash so that
/// `search` is appended rather than substituted for the last segment.
pub fn parse_base_url(value: &str) -> Result<Url, HubError> {
    let trimmed = value.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&normalized).map_err(|err| HubError::InvalidBaseUrl(format!("{value}: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(HubError::InvalidBaseUrl(value.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DateField;

    fn square() -> Aoi {
        Aoi::from_wkt("POLYGON ((13.3 58.2, 13.7 58.2, 13.7 58.4, 13.3 58.4, 13.3 58.2))").unwrap()
    }

    #[test]
    fn keywords_are_sorted_by_key() {
        let mut keywords = Keywords::new();
        keywords.insert("sensoroperationalmode".to_string(), "IW".to_string());
        keywords.insert("productType".to_string(), "GRD".to_string());
        let query = SearchQuery::build(Platform::S1A, &square(), None, &keywords).unwrap();
        let q = query.as_str();
        assert!(q.starts_with("S1A* AND (footprint:\"Intersects(POLYGON"));
        assert!(q.ends_with(" AND (productType:GRD) AND (sensoroperationalmode:IW)"));
    }

    #[test]
    fn date_clause_precedes_footprint() {
        let dates = DateFilter::resolve(
            Some("2017-01-01".parse().unwrap()),
            Some("2017-01-02".parse().unwrap()),
            DateField::EndPosition,
        )
        .unwrap();
        let query =
            SearchQuery::build(Platform::S2B, &square(), dates.as_ref(), &Keywords::new()).unwrap();
        assert!(query.as_str().starts_with(
            "S2B* AND endPosition:[2017-01-01T00:00:00.000000Z TO 2017-01-02T23:59:59.999000Z] AND (footprint:"
        ));
    }

    #[test]
    fn page_url_carries_paging_parameters() {
        let base = parse_base_url("https://scihub.copernicus.eu/apihub").unwrap();
        let query = SearchQuery::build(Platform::S1B, &square(), None, &Keywords::new()).unwrap();
        let url = query.page_url(&base, 200);
        assert_eq!(url.path(), "/apihub/search");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("format".to_string(), "json".to_string()));
        assert_eq!(pairs[1], ("rows".to_string(), "100".to_string()));
        assert_eq!(pairs[2], ("start".to_string(), "200".to_string()));
        assert_eq!(pairs[3].1, query.as_str());
    }

    #[test]
    fn base_url_must_be_absolute() {
        assert!(parse_base_url("not a url").is_err());
    }
}
