#![allow(clippy::struct_excessive_bools)]
#![forbid(unsafe_code)]

use crate::config::{Args, DumpConfig};
use clap::Parser;

mod app;
mod config;
mod dump;
mod hexdump;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = DumpConfig::try_from(args)?;
    app::run(&cfg)
}
