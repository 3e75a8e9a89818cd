use nanoid::nanoid;
use uuid::Uuid;

/// Alphabet for locally minted identifiers (no ambiguous glyphs).
const LOCAL_ID_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const LOCAL_ID_LENGTH: usize = 20;

/// Record identifier, used by the in-memory backend for users and comments.
pub fn generate_id() -> String {
    nanoid!(LOCAL_ID_LENGTH, LOCAL_ID_ALPHABET)
}

/// Identifier for a realtime subscription, e.g. `sub_Xk3...`.
pub fn subscription_id() -> String {
    format!("sub_{}", nanoid!(12, LOCAL_ID_ALPHABET))
}

/// Event ids are UUIDs, matching the events table primary key.
pub fn generate_event_id() -> String {
    Uuid::new_v4().to_string()
}
