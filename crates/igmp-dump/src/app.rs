use crate::config::{DumpConfig, LogFormat, LogSpanEvents};
use crate::{dump, hexdump};
use anyhow::Context;
use std::path::Path;
use tracing_subscriber::fmt::format::FmtSpan;

/// Run the igmp-dump application.
pub fn run(cfg: &DumpConfig) -> anyhow::Result<()> {
    configure_logging(cfg);
    let mut failed = 0;
    for (i, path) in cfg.files.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}:", path.display());
        match dump_file(cfg, path) {
            Ok(out) => println!("{out}"),
            Err(err) => {
                tracing::debug!(path = %path.display(), ?err);
                println!("  error: {err:#}");
                failed += 1;
            }
        }
    }
    if failed == 0 {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "failed to decode {failed} of {} files",
            cfg.files.len()
        ))
    }
}

fn dump_file(cfg: &DumpConfig, path: &Path) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let frame = hexdump::parse(&text)?;
    tracing::debug!(path = %path.display(), frame_len = frame.len());
    dump::dump_frame(cfg, &frame)
}

fn configure_logging(cfg: &DumpConfig) {
    if cfg.verbose {
        let fmt_span = match cfg.log_span_events {
            LogSpanEvents::Off => FmtSpan::NONE,
            LogSpanEvents::Active => FmtSpan::ACTIVE,
            LogSpanEvents::Full => FmtSpan::FULL,
        };
        match cfg.log_format {
            LogFormat::Compact => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .compact()
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .pretty()
                    .init();
            }
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .json()
                    .init();
            }
        }
    }
}
