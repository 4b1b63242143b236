use rayon::ThreadPoolBuilder;
use std::sync::Once;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct ThreadConfig {
    count: usize,
    source: String,
}

fn parse_env_threads(keys: &[&str]) -> Option<ThreadConfig> {
    for &key in keys {
        if let Ok(v) = std::env::var(key) {
            if let Ok(val) = v.trim().parse::<usize>() {
                if val > 0 {
                    return Some(ThreadConfig {
                        count: val,
                        source: key.to_string(),
                    });
                }
            }
        }
    }
    None
}

fn detect_thread_config() -> ThreadConfig {
    const ENV_HINTS: [&str; 2] = ["GIFTING_THREADS", "RAYON_NUM_THREADS"];

    if let Some(cfg) = parse_env_threads(&ENV_HINTS) {
        return cfg;
    }

    let fallback = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1);

    ThreadConfig {
        count: fallback,
        source: "available_parallelism".to_string(),
    }
}

/// Size the global rayon pool once; later calls are no-ops.
pub fn configure_thread_pool() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let cfg = detect_thread_config();
        match ThreadPoolBuilder::new()
            .num_threads(cfg.count)
            .thread_name(|i| format!("gifting-worker-{i}"))
            .build_global()
        {
            Ok(_) => info!(threads = cfg.count, hint = %cfg.source, "rayon pool configured"),
            Err(err) => warn!(%err, "failed to configure rayon pool; continuing with default"),
        }
    });
}

/// Logs go to stderr so reports on stdout stay clean. `RUST_LOG` overrides
/// the default `gifting=info`; `verbose` lowers it to debug.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "gifting=debug" } else { "gifting=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
