//! Key scheme
//!
//! The directory list is a single key; every per-resource record lives
//! under its own key so deleting a resource is a fixed number of calls.

use rq_util::ResourceId;

/// Ordered list of all resource ids
pub const RESOURCE_LIST_KEY: &str = "res_list";

pub fn resource_key(id: &ResourceId) -> String {
    format!("res:{}", id)
}

pub fn booking_key(id: &ResourceId) -> String {
    format!("bk:{}", id)
}

pub fn queue_key(id: &ResourceId) -> String {
    format!("q:{}", id)
}

pub fn subscribers_key(id: &ResourceId) -> String {
    format!("sub:{}", id)
}

pub fn history_key(id: &ResourceId) -> String {
    format!("hist:{}", id)
}

/// Every per-resource key, in cascade-delete order
pub fn resource_scoped_keys(id: &ResourceId) -> [String; 5] {
    [
        booking_key(id),
        queue_key(id),
        subscribers_key(id),
        history_key(id),
        resource_key(id),
    ]
}
