use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maps a short opaque code to a stored asset's filename.
///
/// A code is unique among all persisted records, expired ones included; codes
/// are never reused while the row exists. Expiry is checked logically at
/// access time; the background reaper only reclaims storage.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShortLink {
    pub id: i64,
    pub code: String,
    pub target_file: String,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expire_at: Option<DateTime<Utc>>,
    pub access_count: i64,
}

impl ShortLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expire_at {
            Some(expire_at) => now > expire_at,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link(expire_at: Option<DateTime<Utc>>) -> ShortLink {
        ShortLink {
            id: 1,
            code: "abc123".to_string(),
            target_file: "deadbeef.jpg".to_string(),
            owner: None,
            created_at: Utc::now(),
            expire_at,
            access_count: 0,
        }
    }

    #[test]
    fn link_without_expiry_never_expires() {
        let now = Utc::now();
        assert!(!link(None).is_expired(now + Duration::days(365 * 10)));
    }

    #[test]
    fn link_expires_strictly_after_deadline() {
        let now = Utc::now();
        let l = link(Some(now + Duration::minutes(1)));
        assert!(!l.is_expired(now));
        assert!(!l.is_expired(now + Duration::minutes(1)));
        assert!(l.is_expired(now + Duration::seconds(61)));
    }
}
