pub mod error;
pub mod types;

pub use error::{Result, VkError};
pub use types::{Group, User, WallPage, WallPost};

use serde::de::DeserializeOwned;
use types::ApiEnvelope;

const BASE_URL: &str = "https://api.vk.com/method";

/// API version whose `groups.getById` still returns a plain array.
const API_VERSION: &str = "5.131";

/// `wall.get` refuses counts above this.
const MAX_WALL_COUNT: u32 = 100;

#[derive(Clone)]
pub struct VkClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl VkClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at another endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("access_token", self.token.as_str()), ("v", API_VERSION)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VkError::Http {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        if let Some(err) = envelope.error {
            tracing::debug!(method, code = err.error_code, message = %err.error_msg, "VK API error");
            return Err(VkError::Api {
                code: err.error_code,
                message: err.error_msg,
            });
        }

        envelope
            .response
            .ok_or_else(|| VkError::Parse(format!("{method}: neither response nor error in body")))
    }

    /// `groups.getById` for a numeric id or a screen name.
    pub async fn groups_get_by_id(&self, group_id: &str) -> Result<Vec<Group>> {
        self.call("groups.getById", &[("group_id", group_id.to_string())])
            .await
    }

    /// `users.get` for a numeric id or a domain, with the `domain` field requested.
    pub async fn users_get(&self, user_ids: &str) -> Result<Vec<User>> {
        self.call(
            "users.get",
            &[
                ("user_ids", user_ids.to_string()),
                ("fields", "domain".to_string()),
            ],
        )
        .await
    }

    /// `wall.get` for the newest `count` posts of a wall.
    /// `owner_id` is negative for communities and positive for users.
    pub async fn wall_get(&self, owner_id: i64, count: u32) -> Result<WallPage> {
        let count = count.clamp(1, MAX_WALL_COUNT);
        let page: WallPage = self
            .call(
                "wall.get",
                &[
                    ("owner_id", owner_id.to_string()),
                    ("count", count.to_string()),
                ],
            )
            .await?;
        tracing::debug!(owner_id, fetched = page.items.len(), total = page.count, "Fetched wall posts");
        Ok(page)
    }
}
