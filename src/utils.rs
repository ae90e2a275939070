/// Configures a custom Rayon thread pool with specified size.
///
/// Useful when the level of parallelism must be controlled explicitly, separate
/// from the global Rayon pool.
///
/// # Arguments
/// * `num_threads` - Desired number of threads for the pool.
///
/// # Returns
/// * `Result<ThreadPool>` - Created thread pool or an error if creation fails.
pub fn configure_thread_pool(num_threads: usize) -> anyhow::Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build thread pool: {}", e))
}

/// Formats seconds since midnight as `HH:MM:SS`.
pub fn format_secs(secs: u32) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

/// Formats an optional value, leaving undefined values visibly blank.
pub fn format_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}

/// Checks that the input path exists and is a directory.
pub fn check_input_dir<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("Input path does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Input path is not a directory: {}", path.display());
    }
    Ok(())
}

/// Creates the output directory (and parents) when missing.
pub fn ensure_dir_exists<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<()> {
    std::fs::create_dir_all(path.as_ref())
        .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", path.as_ref().display(), e))
}
