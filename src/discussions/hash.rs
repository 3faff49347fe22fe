//! Fingerprint of derived discussion contexts
//!
//! Used to tell a no-op configuration refresh from one that changed the set
//! or order of contexts.

use sha2::{Digest, Sha256};

use super::types::*;

/// Generate a deterministic hash over an ordered list of contexts.
///
/// Every field is hashed with a presence tag and a length prefix, so moving
/// text between adjacent fields changes the result.
///
/// # Returns
/// Hex-encoded SHA-256 hash string
pub fn contexts_fingerprint(contexts: &[DiscussionTopicContext]) -> String {
    let mut hasher = Sha256::new();

    hasher.update((contexts.len() as u64).to_le_bytes());
    for context in contexts {
        update_str(&mut hasher, &context.title);
        update_opt_str(&mut hasher, context.usage_key.as_deref());
        match context.group_id {
            Some(group_id) => {
                hasher.update([1u8]);
                hasher.update(group_id.to_le_bytes());
            }
            None => hasher.update([0u8]),
        }
        update_opt_str(&mut hasher, context.external_id.as_deref());
        hasher.update(context.ordering.to_le_bytes());
        match &context.context {
            Some(ancestry) => {
                hasher.update([1u8]);
                update_str(&mut hasher, &ancestry.section);
                update_str(&mut hasher, &ancestry.subsection);
                update_str(&mut hasher, &ancestry.unit);
            }
            None => hasher.update([0u8]),
        }
    }

    hex::encode(hasher.finalize())
}

fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn update_opt_str(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update([1u8]);
            update_str(hasher, v);
        }
        None => hasher.update([0u8]),
    }
}
