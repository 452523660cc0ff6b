use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_tree::HierarchicalLayer;

/// Environment variable holding the filter directives, e.g.
/// `CONTREE_LOG=contree::layout_engine=trace`.
pub const LOG_ENV: &str = "CONTREE_LOG";

/// Installs the global subscriber: an env filter in front of an indented tree
/// layer, so spans of nested tree operations read as nested output.
///
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_logging() {
    let directives = std::env::var(LOG_ENV).unwrap_or_else(|_| "info".to_owned());
    let filter = EnvFilter::builder().parse_lossy(directives);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_targets(true),
        )
        .try_init();
}
