/// Row id generation for un-keyed puts.

use uuid::Uuid;

/// Random v4 UUID, hyphenated. Used only for rows staged through `put`;
/// keyed inserts reuse the entity's natural id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
