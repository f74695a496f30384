use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INIT: OnceCell<()> = OnceCell::new();

/// Install the tracing subscriber once. `SURVEYSYNC_LOG` overrides the
/// default filter.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = std::env::var("SURVEYSYNC_LOG")
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("surveysync=info,sqlx=warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}
