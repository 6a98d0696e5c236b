use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` overrides the flag-derived level.
pub fn init(debug: bool, quiet: bool) {
    let directives = if quiet {
        "error".to_string()
    } else {
        // Dependencies stay at warn so HTTP internals do not drown the output
        format!("warn,cyaudit={}", if debug { "debug" } else { "info" })
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(debug)
            .without_time()
            .with_writer(std::io::stderr),
    );

    // Library code logs through the `log` facade
    let _ = tracing_log::LogTracer::init();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
