//! Tag differencing
//!
//! Computes which tags to create or delete on a resource and turns those sets
//! into at most one batched create call and one batched delete call.

use crate::instance::Tags;
use serde::{Deserialize, Serialize};

/// A single batched tag call against one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TagAction {
    /// Create or overwrite every listed tag
    Create { resource_id: String, tags: Tags },
    /// Remove every listed tag
    Delete { resource_id: String, tags: Tags },
}

impl TagAction {
    pub fn resource_id(&self) -> &str {
        match self {
            TagAction::Create { resource_id, .. } | TagAction::Delete { resource_id, .. } => {
                resource_id
            }
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            TagAction::Create { tags, .. } | TagAction::Delete { tags, .. } => tags,
        }
    }
}

impl std::fmt::Display for TagAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.tags().keys().map(String::as_str).collect();
        match self {
            TagAction::Create { resource_id, .. } => {
                write!(f, "create tags [{}] on {}", keys.join(", "), resource_id)
            }
            TagAction::Delete { resource_id, .. } => {
                write!(f, "delete tags [{}] on {}", keys.join(", "), resource_id)
            }
        }
    }
}

/// Plan the provider calls needed to apply `to_create` and `to_delete`.
///
/// Empty maps produce no call. A key present in both maps stays in the create
/// call and is dropped from the delete call, so create wins.
pub fn plan_update(resource_id: &str, to_create: &Tags, to_delete: &Tags) -> Vec<TagAction> {
    let mut actions = Vec::new();

    if !to_create.is_empty() {
        actions.push(TagAction::Create {
            resource_id: resource_id.to_string(),
            tags: to_create.clone(),
        });
    }

    let delete: Tags = to_delete
        .iter()
        .filter(|(key, _)| {
            let overlaps = to_create.contains_key(*key);
            if overlaps {
                tracing::debug!(
                    resource_id = %resource_id,
                    key = %key,
                    "Tag is in both create and delete sets, keeping create"
                );
            }
            !overlaps
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if !delete.is_empty() {
        actions.push(TagAction::Delete {
            resource_id: resource_id.to_string(),
            tags: delete,
        });
    }

    actions
}

/// Create/delete sets between a desired and an observed tag map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub to_create: Tags,
    pub to_delete: Tags,
}

impl TagDiff {
    /// Diff `observed` against `desired`.
    ///
    /// Keys missing from `observed`, or with a different value, are created.
    /// Keys in `observed` that `desired` does not mention are deleted, so
    /// callers pass only the keys they own.
    pub fn between(desired: &Tags, observed: &Tags) -> Self {
        let to_create = desired
            .iter()
            .filter(|(k, v)| observed.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let to_delete = observed
            .iter()
            .filter(|(k, _)| !desired.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            to_create,
            to_delete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }

    pub fn plan(&self, resource_id: &str) -> Vec<TagAction> {
        plan_update(resource_id, &self.to_create, &self.to_delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plan_create_and_delete() {
        let actions = plan_update(
            "i-123",
            &tags(&[("a", "1"), ("b", "2")]),
            &tags(&[("c", "3")]),
        );

        assert_eq!(
            actions,
            vec![
                TagAction::Create {
                    resource_id: "i-123".to_string(),
                    tags: tags(&[("a", "1"), ("b", "2")]),
                },
                TagAction::Delete {
                    resource_id: "i-123".to_string(),
                    tags: tags(&[("c", "3")]),
                },
            ]
        );
    }

    #[test]
    fn test_plan_empty_is_noop() {
        assert!(plan_update("i-123", &Tags::new(), &Tags::new()).is_empty());

        let only_delete = plan_update("i-123", &Tags::new(), &tags(&[("x", "1")]));
        assert_eq!(only_delete.len(), 1);
        assert!(matches!(only_delete[0], TagAction::Delete { .. }));
    }

    #[test]
    fn test_plan_overlap_create_wins() {
        let actions = plan_update(
            "i-123",
            &tags(&[("owner", "new")]),
            &tags(&[("owner", "old"), ("stale", "1")]),
        );

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].tags(), &tags(&[("owner", "new")]));
        assert_eq!(actions[1].tags(), &tags(&[("stale", "1")]));

        // Full overlap leaves nothing to delete
        let actions = plan_update("i-123", &tags(&[("k", "v")]), &tags(&[("k", "v")]));
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_diff_between() {
        let desired = tags(&[("Name", "cp-0"), ("role", "controlplane")]);
        let observed = tags(&[("Name", "cp-0"), ("role", "node"), ("old", "x")]);

        let diff = TagDiff::between(&desired, &observed);
        assert_eq!(diff.to_create, tags(&[("role", "controlplane")]));
        assert_eq!(diff.to_delete, tags(&[("old", "x")]));
        assert_eq!(diff.plan("i-1").len(), 2);

        assert!(TagDiff::between(&desired, &desired).is_empty());
    }

    #[test]
    fn test_display() {
        let action = TagAction::Delete {
            resource_id: "i-9".to_string(),
            tags: tags(&[("a", "1"), ("b", "2")]),
        };
        assert_eq!(action.to_string(), "delete tags [a, b] on i-9");
        assert_eq!(action.resource_id(), "i-9");
    }
}
