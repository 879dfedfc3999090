//! Cache statistics

use serde::{Deserialize, Serialize};

/// Snapshot of a [`SimpleCache`](super::SimpleCache)'s usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached entries
    pub entries: usize,

    /// Total bytes used by cached files
    pub total_bytes: u64,

    /// Configured size limit
    pub max_bytes: u64,

    /// Reads served from disk
    pub hits: u64,

    /// Reads for URIs not in the cache
    pub misses: u64,

    /// Entries dropped to make room
    pub evictions: u64,
}

impl CacheStats {
    /// Cache usage as a percentage of the size limit.
    pub fn usage_percentage(&self) -> f64 {
        if self.max_bytes == 0 {
            return 0.0;
        }

        (self.total_bytes as f64 / self.max_bytes as f64) * 100.0
    }

    /// Returns true if the cache is near capacity (>90%).
    pub fn is_near_capacity(&self) -> bool {
        self.usage_percentage() > 90.0
    }

    /// Share of reads served from the cache, in percent.
    pub fn hit_rate(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            return 0.0;
        }

        (self.hits as f64 / reads as f64) * 100.0
    }

    /// Returns average bytes per entry.
    pub fn average_entry_size(&self) -> u64 {
        if self.entries == 0 {
            0
        } else {
            self.total_bytes / self.entries as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_percentages() {
        let stats = CacheStats {
            entries: 4,
            total_bytes: 950,
            max_bytes: 1000,
            hits: 3,
            misses: 1,
            evictions: 0,
        };

        assert!((stats.usage_percentage() - 95.0).abs() < f64::EPSILON);
        assert!(stats.is_near_capacity());
        assert!((stats.hit_rate() - 75.0).abs() < f64::EPSILON);
        assert_eq!(stats.average_entry_size(), 237);
    }

    #[test]
    fn test_empty_stats() {
        let stats = CacheStats::default();
        assert_eq!(stats.usage_percentage(), 0.0);
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.average_entry_size(), 0);
        assert!(!stats.is_near_capacity());
    }
}
