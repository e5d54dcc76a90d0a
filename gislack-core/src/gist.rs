//! Gist client: the single-service Gist calls behind [`GistApi`].

use std::path::Path;

use async_trait::async_trait;
use reqwest::Method;
use tracing::{error, info};

use crate::contract::{GistApi, Transport};
use crate::error::ClientError;
use crate::models::{Gist, ANONYMOUS_OWNER, GistOwner};
use crate::request::{
    gist_create_request, gist_update_request, GistDraft, RequestDescriptor, GIST_API_URL,
};

pub struct GistClient<T> {
    transport: T,
    token: String,
}

impl<T: Transport> GistClient<T> {
    /// An empty token makes every request anonymous.
    pub fn new(transport: T, token: impl Into<String>) -> Self {
        GistClient {
            transport,
            token: token.into(),
        }
    }

    async fn fetch(&self, request: RequestDescriptor) -> Result<Vec<u8>, ClientError> {
        let reply = self.transport.execute(&request).await?;
        Ok(reply.body)
    }

    async fn fetch_gist(&self, request: RequestDescriptor) -> Result<Gist, ClientError> {
        let body = self.fetch(request).await?;
        serde_json::from_slice(&body).map_err(ClientError::decode("gist"))
    }
}

/// Extracts the gist path from a version URL such as
/// `https://api.github.com/gists/{id}/{sha}`; anything else is returned unchanged.
pub fn version_id(version_url: &str) -> &str {
    version_url
        .strip_prefix(GIST_API_URL)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(version_url)
}

#[async_trait]
impl<T: Transport> GistApi for GistClient<T> {
    async fn list(&self) -> Result<Vec<Gist>, ClientError> {
        let request = RequestDescriptor::new(Method::GET, GIST_API_URL).with_bearer(&self.token);
        let body = self.fetch(request).await?;
        let gists: Vec<Gist> =
            serde_json::from_slice(&body).map_err(ClientError::decode("gist list"))?;
        info!(count = gists.len(), "Fetched gist list");
        Ok(gists)
    }

    async fn get(&self, id: &str) -> Result<Gist, ClientError> {
        info!(gist_id = id, "Fetching gist");
        let request = RequestDescriptor::new(Method::GET, format!("{GIST_API_URL}/{id}"))
            .with_bearer(&self.token);
        self.fetch_gist(request).await.map_err(|e| {
            error!(error = %e, gist_id = id, "Failed to fetch gist");
            e
        })
    }

    async fn create(&self, draft: &GistDraft, workdir: &Path) -> Result<Gist, ClientError> {
        let request = gist_create_request(draft, &self.token, workdir)?;
        let mut gist = self.fetch_gist(request).await?;
        let anonymous = gist.owner.as_ref().map_or(true, |o| o.login.is_empty());
        if anonymous {
            gist.owner = Some(GistOwner {
                login: ANONYMOUS_OWNER.to_string(),
            });
        }
        info!(gist_id = %gist.id, files = draft.files.len(), "Created gist");
        Ok(gist)
    }

    async fn update(
        &self,
        id: &str,
        draft: &GistDraft,
        overwrite: bool,
        workdir: &Path,
    ) -> Result<Gist, ClientError> {
        // Overwriting with no files only changes the description.
        let remove = if overwrite && !draft.files.is_empty() {
            self.get(id).await?.file_names()
        } else {
            Vec::new()
        };
        let request = gist_update_request(id, draft, &remove, &self.token, workdir)?;
        let gist = self.fetch_gist(request).await?;
        info!(gist_id = id, overwrite, "Updated gist");
        Ok(gist)
    }

    async fn delete(&self, id: &str) -> Result<String, ClientError> {
        let request = RequestDescriptor::new(Method::DELETE, format!("{GIST_API_URL}/{id}"))
            .with_bearer(&self.token);
        let body = self.fetch(request).await?;
        info!(gist_id = id, "Deleted gist");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_urls_are_reduced_to_their_path() {
        assert_eq!(
            version_id("https://api.github.com/gists/abc/def0"),
            "abc/def0"
        );
        assert_eq!(version_id("abc"), "abc");
    }
}
