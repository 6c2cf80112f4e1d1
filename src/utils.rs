use mongodb::bson::oid::ObjectId;

const MAX_SEAT_LABEL_LEN: usize = 8;

/// Fresh document id, rendered as the hex form of an `ObjectId`.
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

/// Seat labels end up as document keys, so only short alphanumeric labels pass.
pub fn is_valid_seat_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_SEAT_LABEL_LEN
        && label.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique_hex() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 24);
        assert!(ObjectId::parse_str(&a).is_ok());
    }

    #[test]
    fn seat_labels() {
        assert!(is_valid_seat_label("A1"));
        assert!(is_valid_seat_label("J12"));
        assert!(!is_valid_seat_label(""));
        assert!(!is_valid_seat_label("A.1"));
        assert!(!is_valid_seat_label("$where"));
        assert!(!is_valid_seat_label("ABCDEFGHI"));
    }
}
