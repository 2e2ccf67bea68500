//! Support utilities for the diagnostic binaries.
//!
//! - **`perf`**: platform-specific helpers for performance analysis, currently
//!   a peak resident set size probe used by the bandwidth-sweep experiment to
//!   compare the memory footprint of narrow and wide windows.

pub mod perf;
