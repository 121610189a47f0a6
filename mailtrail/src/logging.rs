use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Install the global subscriber.
///
/// The level comes from `LOG_LEVEL`, falling back to `WARN` (or `TRACE` in
/// debug builds). Events go to stderr so reports on stdout stay clean.
pub fn init() {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::WARN
    };

    let level = level_from(std::env::var("LOG_LEVEL").ok().as_deref(), default);

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("mailtrail")
                })),
        )
        .init();
}

fn level_from(value: Option<&str>, default: LevelFilter) -> LevelFilter {
    value.map_or(default, |level| {
        LevelFilter::from_str(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {level}, defaulting to {default}");
            default
        })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing() {
        assert_eq!(level_from(None, LevelFilter::WARN), LevelFilter::WARN);
        assert_eq!(level_from(Some("debug"), LevelFilter::WARN), LevelFilter::DEBUG);
        assert_eq!(level_from(Some("off"), LevelFilter::WARN), LevelFilter::OFF);
        assert_eq!(level_from(Some("loud"), LevelFilter::INFO), LevelFilter::INFO);
    }
}
