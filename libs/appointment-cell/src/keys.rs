use chrono::NaiveDate;

use shared_database::{FieldKind, IndexSchema};

use crate::schedule::date_slug;

pub const BOOKING_KEY_PREFIX: &str = "booked:slots:";
pub const LEASE_KEY_PREFIX: &str = "lock:";

/// `booked:slots:<email>:<YYYYMMDD>`
pub fn booking_key(email: &str, day: NaiveDate) -> String {
    format!("{}{}:{}", BOOKING_KEY_PREFIX, email, date_slug(day))
}

pub fn lease_key(record_key: &str) -> String {
    format!("{}{}", LEASE_KEY_PREFIX, record_key)
}

pub fn booking_index_schema(index_name: &str) -> IndexSchema {
    IndexSchema::new(index_name, BOOKING_KEY_PREFIX)
        .field("$.date", "date", FieldKind::Tag)
        .field("$.name", "name", FieldKind::Tag)
        .field("$.email", "email", FieldKind::Tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            booking_key("alice@user.com", day),
            "booked:slots:alice@user.com:20240501"
        );
        assert_eq!(
            lease_key("booked:slots:alice@user.com:20240501"),
            "lock:booked:slots:alice@user.com:20240501"
        );
    }

    #[test]
    fn test_index_schema_fields() {
        let schema = booking_index_schema("idx:slots");
        assert_eq!(schema.prefix, BOOKING_KEY_PREFIX);
        assert_eq!(schema.field_by_alias("date").unwrap().kind, FieldKind::Tag);
        assert_eq!(schema.field_by_alias("name").unwrap().kind, FieldKind::Tag);
        assert_eq!(schema.field_by_alias("email").unwrap().path, "$.email");
    }
}
