//! Scan configuration.

/// Configuration for parallel scans.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Number of concurrent scan partitions (minimum 1)
    pub parallel_reads: usize,
    /// Bounded wait for partition results in milliseconds
    pub scan_timeout_ms: u64,
}

impl ScanConfig {
    /// Creates a config with the given split factor and default timeout.
    pub fn with_parallel_reads(parallel_reads: usize) -> Self {
        Self {
            parallel_reads: parallel_reads.max(1),
            ..Default::default()
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            parallel_reads: 1,
            scan_timeout_ms: 30_000, // 30 seconds default
        }
    }
}
