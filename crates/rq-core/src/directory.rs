//! Resource directory: create, read, update, delete, list, find

use chrono::{DateTime, Utc};
use rq_config::FieldLimits;
use rq_store::{JsonRecords, KvStore, RESOURCE_LIST_KEY, resource_key, resource_scoped_keys};
use rq_util::{ResourceId, Result, RqError, UserId};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{CoreEngine, Resource, ResourceDraft, ResourcePatch};

/// Attempts at drawing an unused id before giving up
const ID_ATTEMPTS: usize = 16;

impl CoreEngine {
    /// All resource ids in directory order
    pub fn resource_ids(&self) -> Result<Vec<ResourceId>> {
        Ok(self
            .store
            .get_json::<Vec<ResourceId>>(RESOURCE_LIST_KEY)?
            .unwrap_or_default())
    }

    /// Create a resource. Only admins may do this.
    pub fn create_resource(
        &self,
        actor: &UserId,
        draft: ResourceDraft,
        now: DateTime<Utc>,
    ) -> Result<Resource> {
        self.require_admin(actor, "create resources")?;
        let settings = self.settings();
        let draft = sanitize_draft(draft, &settings.fields)?;

        self.locks.with_directory(|| {
            let mut ids = self.resource_ids()?;
            if ids.len() >= settings.limits.max_resources {
                return Err(RqError::CapacityExceeded(settings.limits.max_resources));
            }

            let id = allocate_id(&ids, ResourceId::generate)
                .ok_or(RqError::CapacityExceeded(settings.limits.max_resources))?;

            let resource = Resource {
                id: id.clone(),
                name: draft.name,
                location: draft.location,
                icon: draft.icon,
                description: draft.description,
                metadata: draft.metadata,
                created_at: now,
                created_by: actor.clone(),
            };

            self.store.put_json(&resource_key(&id), &resource)?;
            ids.push(id.clone());
            self.store.put_json(RESOURCE_LIST_KEY, &ids)?;

            info!(resource_id = %id, name = %resource.name, created_by = %actor, "Resource created");
            Ok(resource)
        })
    }

    /// Read one resource
    pub fn get_resource(&self, id: &ResourceId) -> Result<Resource> {
        self.store
            .get_json(&resource_key(id))?
            .ok_or_else(|| RqError::not_found(format!("resource {}", id)))
    }

    /// Apply a partial update. Id, creator and creation time never change.
    pub fn update_resource(
        &self,
        actor: &UserId,
        id: &ResourceId,
        patch: ResourcePatch,
    ) -> Result<Resource> {
        self.require_admin(actor, "update resources")?;
        let settings = self.settings();

        self.locks.with_resource(id, || {
            let current = self.get_resource(id)?;
            let draft = ResourceDraft {
                name: patch.name.unwrap_or(current.name),
                location: patch.location.or(current.location),
                icon: patch.icon.or(current.icon),
                description: patch.description.or(current.description),
                metadata: patch.metadata.unwrap_or(current.metadata),
            };
            let draft = sanitize_draft(draft, &settings.fields)?;

            let updated = Resource {
                name: draft.name,
                location: draft.location,
                icon: draft.icon,
                description: draft.description,
                metadata: draft.metadata,
                ..current
            };
            self.store.put_json(&resource_key(id), &updated)?;

            info!(resource_id = %id, updated_by = %actor, "Resource updated");
            Ok(updated)
        })
    }

    /// Delete a resource together with its booking, queue, subscribers and
    /// history.
    pub fn delete_resource(&self, actor: &UserId, id: &ResourceId) -> Result<()> {
        self.require_admin(actor, "delete resources")?;

        self.locks.with_directory(|| {
            self.locks.with_resource(id, || -> Result<()> {
                let mut ids = self.resource_ids()?;
                let known = ids.contains(id);
                if !known && self.store.get(&resource_key(id))?.is_none() {
                    return Err(RqError::not_found(format!("resource {}", id)));
                }

                for key in resource_scoped_keys(id) {
                    self.store.delete(&key)?;
                }

                if known {
                    ids.retain(|r| r != id);
                    self.store.put_json(RESOURCE_LIST_KEY, &ids)?;
                }
                Ok(())
            })?;

            info!(resource_id = %id, deleted_by = %actor, "Resource deleted");
            Ok(())
        })
    }

    /// All resources in directory order
    pub fn list_resources(&self) -> Result<Vec<Resource>> {
        let mut resources = Vec::new();
        for id in self.resource_ids()? {
            match self.store.get_json::<Resource>(&resource_key(&id))? {
                Some(resource) => resources.push(resource),
                None => debug!(resource_id = %id, "Listed id has no record"),
            }
        }
        Ok(resources)
    }

    /// Look a resource up by id or name.
    ///
    /// An exact (case-insensitive) id or name match wins. Otherwise a single
    /// resource whose name contains the query, or whose id starts with it,
    /// is returned.
    pub fn find_resource(&self, query: &str) -> Result<Resource> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(RqError::not_found("empty resource name"));
        }

        let resources = self.list_resources()?;
        if let Some(exact) = resources
            .iter()
            .find(|r| r.id.as_str().to_lowercase() == needle || r.name.to_lowercase() == needle)
        {
            return Ok(exact.clone());
        }

        let mut candidates: Vec<Resource> = resources
            .into_iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.id.as_str().to_lowercase().starts_with(&needle)
            })
            .collect();

        match candidates.len() {
            0 => Err(RqError::not_found(format!("resource '{}'", query.trim()))),
            1 => Ok(candidates.remove(0)),
            _ => Err(RqError::Ambiguous(
                candidates.into_iter().map(|r| r.name).collect(),
            )),
        }
    }

    fn require_admin(&self, actor: &UserId, action: &str) -> Result<()> {
        if self.is_admin(actor) {
            Ok(())
        } else {
            debug!(user_id = %actor, action, "Admin check failed");
            Err(RqError::forbidden(format!("only admins can {}", action)))
        }
    }
}

/// Draw ids until one is unused, giving up after `ID_ATTEMPTS`
fn allocate_id(
    existing: &[ResourceId],
    mut generate: impl FnMut() -> ResourceId,
) -> Option<ResourceId> {
    (0..ID_ATTEMPTS)
        .map(|_| generate())
        .find(|id| !existing.contains(id))
}

/// Trim every field, drop empty optionals and blank metadata keys, and
/// reject anything over its length cap.
pub(crate) fn sanitize_draft(draft: ResourceDraft, limits: &FieldLimits) -> Result<ResourceDraft> {
    let name = draft.name.trim().to_string();
    if name.is_empty() {
        return Err(RqError::invalid("name", "cannot be empty"));
    }
    check_len("name", &name, limits.name)?;

    let location = clean_optional("location", draft.location, limits.location)?;
    let icon = clean_optional("icon", draft.icon, limits.icon)?;
    let description = clean_optional("description", draft.description, limits.description)?;

    let mut metadata = BTreeMap::new();
    for (key, value) in draft.metadata {
        let key = key.trim().to_string();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().to_string();
        check_len("metadata key", &key, limits.metadata_key)?;
        check_len("metadata value", &value, limits.metadata_value)?;
        metadata.insert(key, value);
    }
    if metadata.len() > limits.metadata_entries {
        return Err(RqError::invalid(
            "metadata",
            format!("at most {} entries allowed", limits.metadata_entries),
        ));
    }

    Ok(ResourceDraft {
        name,
        location,
        icon,
        description,
        metadata,
    })
}

/// Trim and truncate free text. Blank becomes absent.
pub(crate) fn clean_purpose(purpose: Option<&str>, max_len: usize) -> Option<String> {
    let trimmed = purpose?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_len).collect())
}

fn clean_optional(
    field: &'static str,
    value: Option<String>,
    max_len: usize,
) -> Result<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => {
            check_len(field, &v, max_len)?;
            Ok(Some(v))
        }
        _ => Ok(None),
    }
}

fn check_len(field: &'static str, value: &str, max_len: usize) -> Result<()> {
    if value.chars().count() > max_len {
        return Err(RqError::invalid(
            field,
            format!("longer than {} characters", max_len),
        ));
    }
    Ok(())
}
