//! social-autopilot domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Application use cases / business logic
//! - `validation`: Required-field checks for incoming requests

pub mod model;
pub mod ports;
pub mod usecases;
pub mod validation;

pub use model::*;
pub use ports::*;
pub use usecases::ServiceError;

use std::sync::atomic::{AtomicI64, Ordering};
use time::OffsetDateTime;

/// Mints `<prefix>_<unix-millis>` identifiers.
///
/// Identifiers are strictly increasing per generator: two calls within the
/// same millisecond get consecutive values instead of colliding.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identifier for the given prefix at `now`
    pub fn next(&self, prefix: &str, now: OffsetDateTime) -> String {
        let now_ms = unix_millis(now);
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now_ms.max(last + 1))
            })
            .unwrap_or(now_ms);
        format!("{}_{}", prefix, now_ms.max(previous + 1))
    }
}

/// Milliseconds since the unix epoch
pub fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_ids_use_prefix_and_millis() {
        let ids = IdGenerator::new();
        let at = datetime!(2024-05-01 12:00:00 UTC);
        let id = ids.next("client", at);
        assert_eq!(id, format!("client_{}", unix_millis(at)));
    }

    #[test]
    fn test_ids_never_collide_within_same_millisecond() {
        let ids = IdGenerator::new();
        let at = datetime!(2024-05-01 12:00:00 UTC);
        let first = ids.next("post", at);
        let second = ids.next("post", at);
        let third = ids.next("post", at);

        let ms = unix_millis(at);
        assert_eq!(first, format!("post_{}", ms));
        assert_eq!(second, format!("post_{}", ms + 1));
        assert_eq!(third, format!("post_{}", ms + 2));
    }

    #[test]
    fn test_ids_follow_clock_when_it_moves_forward() {
        let ids = IdGenerator::new();
        let early = datetime!(2024-05-01 12:00:00 UTC);
        let late = datetime!(2024-05-01 12:00:05 UTC);
        ids.next("reply", early);
        assert_eq!(ids.next("reply", late), format!("reply_{}", unix_millis(late)));
    }
}
