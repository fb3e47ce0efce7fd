//! Logging setup for Tandem binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter used when `RUST_LOG` is not set.
///
/// Both the library crate and the binary target log at `default_log_level`;
/// crate names are normalised to their underscore form as tracing expects.
pub fn default_filter(crate_name: &str, binary_name: &str, default_log_level: &str) -> String {
    format!(
        "{}={},{}={},tower_http=info",
        crate_name.replace('-', "_"),
        default_log_level,
        binary_name.replace('-', "_"),
        default_log_level
    )
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The level can be overridden with the `RUST_LOG` environment variable.
///
/// # Examples
///
/// ```no_run
/// use tandem_shared::logger::setup_logger;
///
/// setup_logger("tandem-server", "tandem-server", "debug");
/// ```
pub fn setup_logger(crate_name: &str, binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            default_filter(crate_name, binary_name, default_log_level).into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_normalises_crate_names() {
        // テスト項目: ハイフンを含むクレート名がアンダースコアに変換される
        // given (前提条件):
        let crate_name = "tandem-server";

        // when (操作):
        let filter = default_filter(crate_name, "tandem-server", "debug");

        // then (期待する結果):
        assert_eq!(
            filter,
            "tandem_server=debug,tandem_server=debug,tower_http=info"
        );
        assert!(filter.parse::<EnvFilter>().is_ok());
    }
}
