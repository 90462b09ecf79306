use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Envelope of every VK method call: either `response` or `error`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub response: Option<T>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
}

/// A community as returned by `groups.getById`.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: Option<String>,
    pub screen_name: Option<String>,
    pub is_closed: Option<i64>,
}

/// A user profile as returned by `users.get` with `fields=domain`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub domain: Option<String>,
    pub deactivated: Option<String>,
}

impl User {
    pub fn full_name(&self) -> Option<String> {
        let name = format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string();
        (!name.is_empty()).then_some(name)
    }
}

/// Response body of `wall.get`.
#[derive(Debug, Clone, Deserialize)]
pub struct WallPage {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub items: Vec<WallPost>,
}

/// A single wall post.
#[derive(Debug, Clone, Deserialize)]
pub struct WallPost {
    pub id: i64,
    #[serde(default)]
    pub owner_id: i64,
    #[serde(default)]
    pub text: String,
    /// Unix seconds.
    #[serde(default)]
    pub date: i64,
}

impl WallPost {
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_response_parses() {
        let body = r#"{"response":{"count":2,"items":[
            {"id":42,"owner_id":-1,"date":1700000000,"text":"Завтра встреча"},
            {"id":41,"owner_id":-1,"date":1699990000}
        ]}}"#;
        let env: ApiEnvelope<WallPage> = serde_json::from_str(body).unwrap();
        let page = env.response.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].text, "Завтра встреча");
        assert_eq!(page.items[1].text, "");
        assert!(page.items[0].posted_at().is_some());
    }

    #[test]
    fn error_envelope_parses() {
        let body = r#"{"error":{"error_code":30,"error_msg":"This profile is private"}}"#;
        let env: ApiEnvelope<WallPage> = serde_json::from_str(body).unwrap();
        assert!(env.response.is_none());
        assert_eq!(env.error.unwrap().error_code, 30);
    }

    #[test]
    fn user_full_name_falls_back_to_none() {
        let user = User {
            id: 1,
            first_name: String::new(),
            last_name: " ".into(),
            domain: None,
            deactivated: None,
        };
        assert_eq!(user.full_name(), None);
    }
}
