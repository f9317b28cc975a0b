use std::sync::Arc;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::{fetch_json, join_url, CredentialProvider, UserDirectory};
use crate::{error::AppResult, models::UserId};

/// Entry of `GET /users/internal`; every other field is ignored
#[derive(Debug, Deserialize)]
struct DirectoryUser {
    id: UserId,
}

/// HTTP client for the user service's internal listing
#[derive(Clone)]
pub struct HttpUserDirectory {
    http_client: HttpClient,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpUserDirectory {
    pub fn new(
        http_client: HttpClient,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            credentials,
        }
    }
}

#[async_trait::async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn list_user_ids(&self) -> AppResult<Vec<UserId>> {
        let url = join_url(&self.base_url, "users/internal");
        let request = self
            .credentials
            .service_credential(None)
            .apply(self.http_client.get(url));

        let users: Vec<DirectoryUser> = fetch_json(request, "Failed to list users.").await?;
        Ok(users.into_iter().map(|u| u.id).collect())
    }
}
