//! Subscriber setup for the binary. Library code only emits events.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// `RUST_LOG` wins when set. Otherwise `HOSTLINK_LOG` picks the level for
/// this crate. `LOG_FORMAT=json` switches to JSON lines. Always stderr:
/// stdout carries results.
pub fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(format!("hostlink={}", level(std::env::var("HOSTLINK_LOG").ok().as_deref())))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    }
}

fn level(value: Option<&str>) -> &'static str {
    match value {
        Some("debug") => "debug",
        Some("warn") | Some("warning") => "warn",
        Some("error") => "error",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_levels_fall_back_to_info() {
        assert_eq!(level(Some("warning")), "warn");
        assert_eq!(level(Some("trace")), "info");
        assert_eq!(level(None), "info");
    }
}
