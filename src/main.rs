mod config;
mod transcode;

use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    process,
};

use anyhow::{Context, Result};
use isolatin1::Latin1;
use log::{debug, info, LevelFilter};

use crate::{config::Config, transcode::transcode};

fn main() {
    let args = config::app().get_matches();
    let config = match Config::from_matches(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    };

    init_logging(config.verbosity);

    if let Err(e) = run(&config) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

fn run(config: &Config) -> Result<()> {
    let reader: Box<dyn Read> = match config.input {
        Some(ref path) => Box::new(
            File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?,
        ),
        None => Box::new(io::stdin()),
    };

    let mut writer: Box<dyn Write> = match config.output {
        Some(ref path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let latin1 = Latin1::new(config.policy);
    info!(
        "encoding with {:?} policy, normalization {}",
        latin1.policy(),
        if config.normalize { "on" } else { "off" }
    );

    let stats = if config.normalize {
        transcode(&mut latin1.new_encoder(), reader, &mut writer, config.chunk_size)?
    } else {
        transcode(&mut latin1.encoder(), reader, &mut writer, config.chunk_size)?
    };
    writer.flush().context("failed to write output")?;

    debug!(
        "read {} bytes, wrote {} bytes",
        stats.bytes_read, stats.bytes_written
    );

    Ok(())
}
