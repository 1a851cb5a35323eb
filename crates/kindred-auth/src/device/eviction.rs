//! Decoding a stored device set and choosing which entries to evict.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::session::SessionValue;

/// One field of a user's device hash.
#[derive(Debug, Clone)]
pub struct Member {
    /// Hash field.
    pub device_id: String,
    /// Decoded value, or `None` if the stored value could not be parsed.
    pub value: Option<SessionValue>,
}

impl Member {
    /// Eviction sort key: undecodable entries first, then oldest access,
    /// then smallest device ID.
    fn eviction_key(&self) -> (Option<DateTime<Utc>>, &str) {
        (
            self.value.as_ref().map(|v| v.last_access),
            self.device_id.as_str(),
        )
    }
}

/// Decode every field of a device hash.
pub fn decode_members(user_id: &str, raw: HashMap<String, String>) -> Vec<Member> {
    raw.into_iter()
        .map(|(device_id, stored)| {
            let value = match SessionValue::decode(&stored) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(
                        user_id = %user_id,
                        device_id = %device_id,
                        error = %e,
                        "Undecodable device session value"
                    );
                    None
                }
            };
            Member { device_id, value }
        })
        .collect()
}

/// Devices to remove so that one more entry fits under `capacity`.
///
/// Empty when the set already has room. The victims are returned in
/// eviction order. Normally this is exactly one device; more are chosen
/// only when the set was left over capacity by an earlier writer.
pub fn select_evictions(members: &[Member], capacity: usize) -> Vec<String> {
    if members.len() < capacity {
        return Vec::new();
    }

    let excess = members.len() + 1 - capacity;
    let mut ordered: Vec<&Member> = members.iter().collect();
    ordered.sort_by(|a, b| a.eviction_key().cmp(&b.eviction_key()));

    ordered
        .into_iter()
        .take(excess)
        .map(|m| m.device_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn member(device_id: &str, minutes: i64) -> Member {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Member {
            device_id: device_id.to_string(),
            value: Some(SessionValue::new("rt", base + Duration::minutes(minutes))),
        }
    }

    #[test]
    fn test_room_left_means_no_eviction() {
        let members = vec![member("a", 0), member("b", 1)];
        assert!(select_evictions(&members, 5).is_empty());
    }

    #[test]
    fn test_oldest_is_chosen() {
        let members = vec![
            member("a", 5),
            member("b", 1),
            member("c", 3),
            member("d", 4),
            member("e", 2),
        ];
        assert_eq!(select_evictions(&members, 5), vec!["b".to_string()]);
    }

    #[test]
    fn test_ties_break_on_device_id() {
        let members = vec![
            member("phone", 0),
            member("laptop", 0),
            member("tablet", 0),
        ];
        assert_eq!(select_evictions(&members, 3), vec!["laptop".to_string()]);
    }

    #[test]
    fn test_undecodable_entries_go_first() {
        let mut members = vec![member("a", 0), member("b", 1)];
        members.push(Member {
            device_id: "zz".to_string(),
            value: None,
        });
        assert_eq!(select_evictions(&members, 3), vec!["zz".to_string()]);
    }

    #[test]
    fn test_over_capacity_set_is_trimmed() {
        let members = vec![
            member("a", 0),
            member("b", 1),
            member("c", 2),
            member("d", 3),
        ];
        assert_eq!(
            select_evictions(&members, 2),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_decode_members_marks_garbage() {
        let mut raw = HashMap::new();
        raw.insert(
            "ok".to_string(),
            r#"{"refreshToken":"rt","lastAccess":"2026-01-01T00:00:00Z"}"#.to_string(),
        );
        raw.insert("bad".to_string(), "{oops".to_string());

        let members = decode_members("u", raw);
        assert_eq!(members.len(), 2);
        let bad = members.iter().find(|m| m.device_id == "bad").unwrap();
        assert!(bad.value.is_none());
    }
}
