use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,r2d2=warn";

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_ansi(false);
    // a second init (e.g. from tests) keeps the first subscriber
    let _ = fmt.try_init();
}
