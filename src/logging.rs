use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SELFCARE_LOG";

/// Chatty HTTP internals are capped at `warn` unless a filter asks for them.
fn default_directives(component: &str) -> String {
    format!("info,selfcare_companion=debug,{component}=debug,hyper=warn,reqwest=warn")
}

/// Picks the first usable filter: `SELFCARE_LOG`, then `RUST_LOG`, then the
/// built-in directives. Unparseable values are skipped.
fn resolve_directives<F>(component: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    [LOG_ENV, EnvFilter::DEFAULT_ENV]
        .into_iter()
        .filter_map(|key| lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty() && EnvFilter::try_new(value).is_ok())
        .unwrap_or_else(|| default_directives(component))
}

pub fn init_tracing(component: &str) {
    let directives = resolve_directives(component, |key| std::env::var(key).ok());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_filter_wins_over_rust_log() {
        let directives = resolve_directives("selfcare_companion", |key| match key {
            "SELFCARE_LOG" => Some("warn".to_string()),
            "RUST_LOG" => Some("trace".to_string()),
            _ => None,
        });
        assert_eq!(directives, "warn");
    }

    #[test]
    fn falls_back_past_blank_values() {
        let directives = resolve_directives("selfcare_companion", |key| match key {
            "SELFCARE_LOG" => Some("   ".to_string()),
            "RUST_LOG" => Some("debug".to_string()),
            _ => None,
        });
        assert_eq!(directives, "debug");

        let directives = resolve_directives("worker", |_| None);
        assert_eq!(directives, default_directives("worker"));
        assert!(directives.contains("worker=debug"));
    }
}
