//! Record identifiers.

use chrono::Utc;

/// Opaque id: millisecond timestamp plus a random suffix.
pub fn generate_id() -> String {
    let suffix: u32 = rand::random();
    format!("{}{:08x}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_differ() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert!(a.len() > 8);
    }

    #[test]
    fn test_id_starts_with_current_millis() {
        let before = Utc::now().timestamp_millis();
        let id = generate_id();
        let after = Utc::now().timestamp_millis();

        let millis: i64 = id[..id.len() - 8].parse().unwrap();
        assert!((before..=after).contains(&millis));
        assert!(u32::from_str_radix(&id[id.len() - 8..], 16).is_ok());
    }
}
