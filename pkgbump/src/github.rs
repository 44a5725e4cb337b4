use crate::{error::SyncError, release::Release};
use anyhow::{anyhow, Result};
use lazy_regex::Lazy;
use log::debug;
use reqwest::{
    header::{HeaderValue, ACCEPT, AUTHORIZATION},
    Client, RequestBuilder,
};
use std::env;
use url::Url;

pub(crate) static DEFAULT_API_BASE_URL: Lazy<Url> =
    Lazy::new(|| Url::parse("https://api.github.com").unwrap());

pub(crate) const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

#[derive(Debug)]
pub(crate) struct GitHub {
    owner: String,
    repo: String,
    api_base_url: Url,
    token: Option<String>,
}

impl GitHub {
    pub(crate) fn new(project: &str, api_base_url: Url, mut token: Option<String>) -> Result<Self> {
        let (owner, repo) = parse_project_name(project)?;
        if api_base_url.cannot_be_a_base() {
            return Err(anyhow!(
                "the API base URL `{api_base_url}` cannot have a path appended to it"
            ));
        }

        if token.is_none() {
            token = env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty());
            if token.is_some() {
                debug!("Using GitHub token from the {TOKEN_ENV_VAR} environment variable.");
            }
        }

        Ok(GitHub {
            owner,
            repo,
            api_base_url,
            token,
        })
    }

    /// Fetches the latest release. Any transport failure, error status, or undecodable body is
    /// reported as [`SyncError::Network`].
    pub(crate) async fn fetch_latest_release(&self, client: &Client) -> Result<Release> {
        let url = self.release_info_url()?;
        debug!("Getting release info from `{url}`");

        let mut req_builder = client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_str("application/json")?);
        req_builder = self.maybe_add_token_header(req_builder)?;
        let req = req_builder
            .build()
            .map_err(|e| SyncError::network(url.as_str(), &e))?;

        let resp = client
            .execute(req)
            .await
            .map_err(|e| SyncError::network(url.as_str(), &e))?;
        if let Err(e) = resp.error_for_status_ref() {
            return Err(SyncError::network(url.as_str(), &e).into());
        }

        let release = resp
            .json::<Release>()
            .await
            .map_err(|e| SyncError::network(url.as_str(), &e))?;
        debug!(
            "release {} has {} asset(s)",
            release.tag_name,
            release.assets.len()
        );
        Ok(release)
    }

    pub(crate) fn release_info_url(&self) -> Result<Url> {
        let mut url = self.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("could not get path segments for `{}`", self.api_base_url))?
            .pop_if_empty()
            .push("repos")
            .push(&self.owner)
            .push(&self.repo)
            .push("releases")
            .push("latest");
        Ok(url)
    }

    fn maybe_add_token_header(&self, mut req_builder: RequestBuilder) -> Result<RequestBuilder> {
        if let Some(token) = self.token.as_deref() {
            debug!("Adding token to GitHub request.");
            let bearer = format!("Bearer {token}");
            let mut auth_val = HeaderValue::from_str(&bearer)?;
            auth_val.set_sensitive(true);
            req_builder = req_builder.header(AUTHORIZATION, auth_val);
        } else {
            debug!("No token given.");
        }
        Ok(req_builder)
    }
}

pub(crate) fn parse_project_name(project: &str) -> Result<(String, String)> {
    let mut parts = project.trim_matches('/').split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(anyhow!(
            "the project must be given as `owner/repo`, got `{project}`"
        )),
    }
}
