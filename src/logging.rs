use tracing_subscriber::EnvFilter;

use crate::config;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over the default filter. Calling this more than once is
/// harmless; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
