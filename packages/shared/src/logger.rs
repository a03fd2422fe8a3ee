//! Logging setup utilities for the signaling relay and client.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// `crate_names` lists the library crates whose events should pass the default
/// filter in addition to the binary itself. The filter can be overridden with
/// the `RUST_LOG` environment variable.
///
/// # Examples
///
/// ```no_run
/// use teleconsult_shared::logger::setup_logger;
///
/// setup_logger("teleconsult-server", &["teleconsult-server"], "debug");
/// ```
pub fn setup_logger(binary_name: &str, crate_names: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, crate_names, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the `EnvFilter` directive used when `RUST_LOG` is not set.
fn default_filter(binary_name: &str, crate_names: &[&str], level: &str) -> String {
    let mut directives: Vec<String> = crate_names
        .iter()
        .map(|name| format!("{}={}", name.replace('-', "_"), level))
        .collect();
    directives.push(format!("{}={}", binary_name.replace('-', "_"), level));
    directives.push(format!("tower_http={}", level));
    directives.join(",")
}
