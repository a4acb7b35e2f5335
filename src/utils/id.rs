//! Opaque identifier generation

use uuid::Uuid;

/// Generate a fresh opaque identifier for messages, sessions, and code files.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
