//! Log output.

/// Install the global tracing subscriber.
///
/// `RUST_LOG` directives apply on top of a default level of `INFO`, or
/// `DEBUG` when `debug` is set. Calling this again is a no-op.
pub fn init(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init(true);
        init(false);
    }
}
