//! Projection from registry state to what the UI draws.
//!
//! Pure functions only — the presenter holds no state, so rendering the same
//! registry twice yields identical output.

use crate::protocol::TrackRecord;
use crate::registry::Registry;

/// Registry contents split into the two rendered buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackView {
    /// Everything that is not an error: uploaded, found, processing,
    /// success, and any status the client doesn't recognize.
    pub valid: Vec<TrackRecord>,
    /// Records with status `error`.  Rendered from filename and message
    /// only, since error records may never have been assigned a number.
    pub invalid: Vec<TrackRecord>,
}

impl TrackView {
    pub fn valid_count(&self) -> usize {
        self.valid.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }
}

/// Partition the registry: a record is invalid iff its status is `error`.
pub fn partition(registry: &Registry) -> TrackView {
    let mut view = TrackView::default();
    for record in registry.records() {
        if record.status.is_error() {
            view.invalid.push(record.clone());
        } else {
            view.valid.push(record.clone());
        }
    }
    view
}

/// Human-readable file size, 1024-based: "0 B", "743 B", "1.5 KB", "12.8 MB".
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let exp = ((63 - bytes.leading_zeros() as usize) / 10).min(UNITS.len() - 1);
    let value = bytes as f64 / (1u64 << (10 * exp)) as f64;
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TrackStatus;

    fn registry_with(statuses: &[(Option<u32>, TrackStatus)]) -> Registry {
        let mut reg = Registry::new();
        reg.replace_all(
            statuses
                .iter()
                .map(|&(n, status)| TrackRecord {
                    track_number: n,
                    filename: format!("{:?}.mp3", n),
                    size: 42,
                    status,
                    message: String::new(),
                })
                .collect(),
        );
        reg
    }

    #[test]
    fn test_partition_invariant() {
        let reg = registry_with(&[
            (Some(1), TrackStatus::Uploaded),
            (Some(2), TrackStatus::Error),
            (Some(3), TrackStatus::Success),
            (None, TrackStatus::Error),
        ]);
        let view = partition(&reg);
        assert_eq!(view.valid_count() + view.invalid_count(), reg.len());
        assert!(view.invalid.iter().all(|r| r.status.is_error()));
        assert!(view.valid.iter().all(|r| !r.status.is_error()));
        assert_eq!(view.invalid_count(), 2);
    }

    #[test]
    fn test_unknown_status_buckets_as_valid() {
        let reg = registry_with(&[(Some(1), TrackStatus::Unknown)]);
        let view = partition(&reg);
        assert_eq!(view.valid_count(), 1);
        assert_eq!(view.invalid_count(), 0);
    }

    #[test]
    fn test_empty_registry_yields_empty_buckets() {
        let view = partition(&Registry::new());
        assert_eq!(view.valid_count(), 0);
        assert_eq!(view.invalid_count(), 0);
    }

    #[test]
    fn test_partition_is_idempotent() {
        let reg = registry_with(&[(Some(1), TrackStatus::Found), (Some(2), TrackStatus::Error)]);
        assert_eq!(partition(&reg), partition(&reg));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(743), "743 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1 MB");
        assert_eq!(format_size(5_300_000), "5.05 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3 GB");
    }
}
