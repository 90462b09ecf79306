use async_trait::async_trait;
use tracing::{debug, warn};
use vk_client::{Group, User, VkClient, VkError};

use keywatch_common::{EntityDescriptor, EntityKind, Item, Platform, SourceError};

use super::reference::normalize_vk_reference;
use crate::traits::SourceFetcher;

const VK_URL: &str = "https://vk.com";

/// Walls of VK communities and user pages.
pub struct VkFetcher {
    client: VkClient,
}

impl VkFetcher {
    pub fn new(client: VkClient) -> Self {
        Self { client }
    }
}

fn group_descriptor(group: &Group) -> EntityDescriptor {
    let id = group.id.abs();
    let handle = group.screen_name.clone().filter(|s| !s.is_empty());
    let path = handle.clone().unwrap_or_else(|| format!("club{id}"));
    EntityDescriptor {
        id,
        owner_id: -id,
        kind: EntityKind::Group,
        display_name: group
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown group".to_string()),
        canonical_url: format!("{VK_URL}/{path}"),
        handle,
    }
}

fn user_descriptor(user: &User) -> EntityDescriptor {
    let handle = user.domain.clone().filter(|s| !s.is_empty());
    let path = handle.clone().unwrap_or_else(|| format!("id{}", user.id));
    EntityDescriptor {
        id: user.id,
        owner_id: user.id,
        kind: EntityKind::User,
        display_name: user.full_name().unwrap_or_else(|| format!("id{}", user.id)),
        canonical_url: format!("{VK_URL}/{path}"),
        handle,
    }
}

fn into_source_error(err: VkError) -> SourceError {
    match err {
        VkError::Network(msg) => SourceError::Transport(msg),
        VkError::Http { status, message } => {
            SourceError::Transport(format!("HTTP {status}: {message}"))
        }
        e @ VkError::Api { .. } if e.is_access_denied() => SourceError::AccessDenied(e.to_string()),
        e @ VkError::Api { .. } => SourceError::Transport(e.to_string()),
        VkError::Parse(msg) => SourceError::Parse(msg),
    }
}

/// Why neither lookup produced an entity. A network failure on either one
/// means the reference may well exist.
fn unresolved(name: String, group_err: Option<VkError>, user_err: Option<VkError>) -> SourceError {
    match (group_err, user_err) {
        (Some(VkError::Network(e)), _) | (_, Some(VkError::Network(e))) => SourceError::Transport(e),
        _ => SourceError::NotFound(name),
    }
}

#[async_trait]
impl SourceFetcher for VkFetcher {
    fn platform(&self) -> Platform {
        Platform::Vk
    }

    /// Communities first, then users. A transport failure on either lookup
    /// is reported as such; otherwise the reference is "not found".
    async fn resolve_entity(&self, reference: &str) -> Result<EntityDescriptor, SourceError> {
        let name = normalize_vk_reference(reference);
        if name.is_empty() {
            return Err(SourceError::NotFound(reference.to_string()));
        }
        // Community ids may be written with the wall-owner minus sign.
        let group_query = match name.strip_prefix('-') {
            Some(digits) if digits.chars().all(|c| c.is_ascii_digit()) => digits,
            _ => name.as_str(),
        };

        let group_err = match self.client.groups_get_by_id(group_query).await {
            Ok(groups) => match groups.first() {
                Some(group) => return Ok(group_descriptor(group)),
                None => None,
            },
            Err(e) => {
                debug!(reference = %name, error = %e, "Not a VK community");
                Some(e)
            }
        };

        let user_err = match self.client.users_get(&name).await {
            Ok(users) => match users.first() {
                Some(user) => return Ok(user_descriptor(user)),
                None => None,
            },
            Err(e) => {
                debug!(reference = %name, error = %e, "Not a VK user");
                Some(e)
            }
        };

        Err(unresolved(name, group_err, user_err))
    }

    async fn fetch_recent_items(
        &self,
        entity: &EntityDescriptor,
        count: u32,
    ) -> Result<Vec<Item>, SourceError> {
        match self.client.wall_get(entity.owner_id, count).await {
            Ok(page) => Ok(page
                .items
                .into_iter()
                .map(|post| Item {
                    id: post.id,
                    timestamp: post.posted_at(),
                    text: post.text,
                })
                .collect()),
            Err(e) if e.is_access_denied() => {
                warn!(
                    entity = %entity.display_name,
                    owner_id = entity.owner_id,
                    error = %e,
                    "VK wall is closed, skipping"
                );
                Ok(Vec::new())
            }
            Err(e) => Err(into_source_error(e)),
        }
    }

    fn item_url(&self, entity: &EntityDescriptor, item_id: i64) -> String {
        format!("{VK_URL}/wall{}_{item_id}", entity.owner_id)
    }
}
