use crate::chart::OrgChart;
use crate::error::{OrgChartError, OrgChartResult};
use crate::model::ChartDocument;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Id of the stored chart document.
pub const CHART_DOCUMENT_ID: &str = "chart";

#[async_trait]
pub trait ChartSource: Send + Sync {
    async fn fetch(&self) -> OrgChartResult<ChartDocument>;
}

/// Reads the chart document from a CouchDB database.
pub struct CouchDbChartSource {
    client: Client,
    database_url: Url
}

impl CouchDbChartSource {
    pub fn new(database_url: Url) -> OrgChartResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(OrgChartError::HttpError)?;

        Ok(Self {
            client,
            database_url
        })
    }

    fn document_url(&self) -> String {
        format!(
            "{}/{}",
            self.database_url.as_str().trim_end_matches('/'),
            CHART_DOCUMENT_ID
        )
    }
}

#[async_trait]
impl ChartSource for CouchDbChartSource {
    async fn fetch(&self) -> OrgChartResult<ChartDocument> {
        let url = self.document_url();
        debug!(url = %url, "Fetching chart document");

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if !self.database_url.username().is_empty() {
            request = request.basic_auth(
                self.database_url.username(),
                self.database_url.password()
            );
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<ChartDocument>().await?),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(OrgChartError::StoreError {
                    status: status.as_u16(),
                    message: body
                })
            }
        }
    }
}

/// Reads the chart document from a local JSON file.
pub struct FileChartSource {
    path: PathBuf
}

impl FileChartSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ChartSource for FileChartSource {
    async fn fetch(&self) -> OrgChartResult<ChartDocument> {
        debug!(path = %self.path.display(), "Reading chart document");
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Picks a source for `location`: `http(s)://` is a CouchDB database,
/// `file://` or anything without a scheme is a local file.
pub fn chart_source(location: &str) -> OrgChartResult<Arc<dyn ChartSource>> {
    match Url::parse(location) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(Arc::new(CouchDbChartSource::new(url)?))
        }
        Ok(url) if url.scheme() == "file" => {
            let path = url
                .to_file_path()
                .map_err(|()| OrgChartError::InvalidLocation(location.to_string()))?;
            Ok(Arc::new(FileChartSource::new(path)))
        }
        Ok(url) if url.scheme().len() > 1 => Err(OrgChartError::InvalidLocation(format!(
            "unsupported scheme {} in {}",
            url.scheme(),
            location
        ))),
        // bare paths, including windows drive letters
        _ => Ok(Arc::new(FileChartSource::new(location)))
    }
}

/// Fetches and indexes the chart at `location`.
pub async fn load_chart(location: &str) -> OrgChartResult<OrgChart> {
    let document = chart_source(location)?.fetch().await?;
    info!(
        teams = document.teams.len(),
        employees = document.employees.len(),
        "Loaded chart document"
    );
    OrgChart::from_document(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_url_strips_trailing_slash() {
        let source =
            CouchDbChartSource::new(Url::parse("http://localhost:5984/orgchart/").unwrap()).unwrap();
        assert_eq!(source.document_url(), "http://localhost:5984/orgchart/chart");
    }

    #[test]
    fn test_unsupported_scheme_is_rejected() {
        let err = chart_source("ftp://example.com/chart").err().unwrap();
        assert!(matches!(err, OrgChartError::InvalidLocation(_)));
    }
}
