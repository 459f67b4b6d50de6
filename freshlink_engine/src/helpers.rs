use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::OrderId;

/// Generate a fresh human-readable order number: `FL-<date>-<6 alphanumerics>`.
///
/// Uniqueness is not guaranteed here; the store's unique constraint is the arbiter, and a collision surfaces to the
/// caller as a retryable conflict.
pub fn new_order_number() -> OrderId {
    let date = Utc::now().format("%Y%m%d");
    let suffix: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(6).map(char::from).collect::<String>().to_ascii_uppercase();
    OrderId(format!("FL-{date}-{suffix}"))
}

#[cfg(test)]
mod test {
    use super::new_order_number;

    #[test]
    fn order_numbers_have_the_expected_shape() {
        let id = new_order_number();
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "FL");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_lowercase()));
    }
}
