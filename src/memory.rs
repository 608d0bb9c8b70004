/// Free-memory floor: searches abort once less than this is available.
pub const LOW_MEMORY_BYTES: u64 = 15 * 1024 * 1024;

/// Bytes of memory currently available to the process, where the platform
/// exposes that figure.
#[cfg(target_os = "linux")]
pub fn available_bytes() -> Option<u64> {
    let contents = std::fs::read_to_string("/proc/meminfo").ok()?;
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            let kib: u64 = rest.split_whitespace().next()?.parse().ok()?;
            return Some(kib * 1024);
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
pub fn available_bytes() -> Option<u64> {
    None
}

/// True when available memory is known to be below the floor. Unknown
/// availability never aborts a search.
pub fn is_low() -> bool {
    available_bytes().is_some_and(|bytes| bytes < LOW_MEMORY_BYTES)
}
