//! Permission model definitions and request payloads.
//!
//! # Purpose
//! Defines permission records and the create/patch payloads used by the store
//! and HTTP API.
use super::IdSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Permission {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Roles currently granting this permission, joined by the store on read.
    #[schema(value_type = Vec<String>)]
    pub role_ids: IdSet,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PermissionCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct PermissionPatchRequest {
    pub name: Option<String>,
    /// Absent keeps the description, `null` clears it.
    #[serde(default, deserialize_with = "present_field")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
}

impl PermissionPatchRequest {
    /// Description after applying this patch to `current`.
    pub fn merged_description(&self, current: Option<String>) -> Option<String> {
        match &self.description {
            Some(replacement) => replacement.clone(),
            None => current,
        }
    }
}

/// Marks a field as present, so an explicit `null` is told apart from absence.
fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_tells_null_description_from_absent() {
        let absent: PermissionPatchRequest =
            serde_json::from_str(r#"{"name":"read"}"#).expect("absent");
        assert_eq!(absent.description, None);
        assert_eq!(
            absent.merged_description(Some("old".to_string())).as_deref(),
            Some("old")
        );

        let cleared: PermissionPatchRequest =
            serde_json::from_str(r#"{"description":null}"#).expect("null");
        assert_eq!(cleared.description, Some(None));
        assert_eq!(cleared.merged_description(Some("old".to_string())), None);

        let replaced: PermissionPatchRequest =
            serde_json::from_str(r#"{"description":"new"}"#).expect("value");
        assert_eq!(
            replaced.merged_description(Some("old".to_string())).as_deref(),
            Some("new")
        );
    }
}
