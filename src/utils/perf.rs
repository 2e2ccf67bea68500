//! Performance measurement helpers.
//!
//! The bandwidth-sweep experiment compares the peak memory footprint of
//! evaluations at different window widths. Each measurement runs in its own
//! process, and the worker reports its peak resident set size at exit.

/// Reads the peak resident set size (`VmPeak`) from `/proc/self/status`.
///
/// # Returns
/// The peak memory usage of the current process in kilobytes, or 0 if the
/// value cannot be read.
#[cfg(target_os = "linux")]
pub fn peak_rss_kb() -> u64 {
    let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
        return 0;
    };
    status
        .lines()
        .find_map(|line| {
            let rest = line.strip_prefix("VmPeak:")?;
            rest.split_whitespace().next()?.parse().ok()
        })
        .unwrap_or(0)
}

/// Fallback for non-Linux platforms, where `/proc` is unavailable.
#[cfg(not(target_os = "linux"))]
pub fn peak_rss_kb() -> u64 {
    use std::sync::Once;
    static WARN_ONCE: Once = Once::new();
    WARN_ONCE.call_once(|| {
        log::warn!("Peak RSS measurement is only supported on Linux; returning 0.");
    });
    0
}
