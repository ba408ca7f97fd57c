use crate::error::{CommitmapError, Result};
use crate::model::CommitWindow;
use log::debug;
use reqwest::blocking::{Client, ClientBuilder};
use serde::Deserialize;
use std::time::Duration;

/// Hard cap on pages fetched per run: 10 pages x 100 items = 1000 commits.
pub const MAX_PAGES: u32 = 10;
pub const PER_PAGE: u32 = 100;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// One item of `GET /repos/{org}/{repo}/commits`.
///
/// Every nested field is optional at the serde layer; absence is surfaced
/// as a malformed-record failure during shaping, not as a decode error.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCommit {
    pub commit: Option<CommitData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitData {
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
}

/// A paginated source of raw commits. The ingestion pipeline only depends
/// on this seam, so tests can drive it with scripted pages.
pub trait CommitSource {
    fn fetch_page(&self, page: u32, window: &CommitWindow) -> Result<Vec<RawCommit>>;
}

pub struct GithubClient {
    client: Client,
    api_base: String,
    organization: String,
    repository: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(organization: &str, repository: &str, token: Option<String>) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("commitmap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            organization: organization.to_string(),
            repository: repository.to_string(),
            token,
        })
    }
}

impl CommitSource for GithubClient {
    fn fetch_page(&self, page: u32, window: &CommitWindow) -> Result<Vec<RawCommit>> {
        let url = format!(
            "{}/repos/{}/{}/commits",
            self.api_base, self.organization, self.repository
        );
        debug!("GET {url} page={page}");

        let mut request = self.client.get(&url).query(&[
            ("since", window.since_param()),
            ("until", window.until_param()),
            ("per_page", PER_PAGE.to_string()),
            ("page", page.to_string()),
        ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CommitmapError::UnexpectedStatus { status, body });
        }

        Ok(response.json()?)
    }
}
