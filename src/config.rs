use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{App, Arg, ArgMatches};
use isolatin1::InvalidPolicy;

pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Settings for a single run, gathered from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: Option<PathBuf>,  // `None` for stdin.
    pub output: Option<PathBuf>, // `None` for stdout.
    pub policy: InvalidPolicy,
    pub normalize: bool,
    pub chunk_size: usize,
    pub verbosity: u64,
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Result<Config> {
        let chunk_size = match matches.value_of("chunk_size") {
            Some(s) => s
                .parse::<usize>()
                .with_context(|| format!("invalid chunk size '{}'", s))?,
            None => DEFAULT_CHUNK_SIZE,
        };
        if chunk_size == 0 {
            anyhow::bail!("chunk size must be at least 1");
        }

        Ok(Config {
            input: matches
                .value_of_os("INPUT")
                .filter(|path| *path != "-")
                .map(PathBuf::from),
            output: matches.value_of_os("output").map(PathBuf::from),
            policy: if matches.is_present("skip_invalid") {
                InvalidPolicy::Skip
            } else {
                InvalidPolicy::Error
            },
            normalize: !matches.is_present("no_normalize"),
            chunk_size,
            verbosity: matches.occurrences_of("verbose"),
        })
    }
}

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("latin1enc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Encodes utf8 text as printable latin1 (ISO/IEC 8859-1 without control characters)")
        .arg(
            Arg::with_name("INPUT")
                .help("Input file to encode.  Reads stdin if absent or '-'")
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("FILE")
                .help("Writes to FILE instead of stdout")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("skip_invalid")
                .short("s")
                .long("skip-invalid")
                .help("Drops characters that can't be encoded instead of failing"),
        )
        .arg(
            Arg::with_name("no_normalize")
                .long("no-normalize")
                .help("Encodes the input as-is, without composing it to NFC first"),
        )
        .arg(
            Arg::with_name("chunk_size")
                .long("chunk-size")
                .value_name("BYTES")
                .help("Size of the read and write buffers [default: 4096]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Logs more (repeat for even more)"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        let matches = app().get_matches_from_safe(args.iter().cloned())?;
        Config::from_matches(&matches)
    }

    #[test]
    fn defaults() {
        let config = parse(&["latin1enc"]).unwrap();
        assert_eq!(
            config,
            Config {
                input: None,
                output: None,
                policy: InvalidPolicy::Error,
                normalize: true,
                chunk_size: DEFAULT_CHUNK_SIZE,
                verbosity: 0,
            }
        );
    }

    #[test]
    fn all_options() {
        let config = parse(&[
            "latin1enc",
            "-s",
            "--no-normalize",
            "--chunk-size",
            "16",
            "-o",
            "out.txt",
            "-vv",
            "in.txt",
        ])
        .unwrap();
        assert_eq!(
            config,
            Config {
                input: Some(PathBuf::from("in.txt")),
                output: Some(PathBuf::from("out.txt")),
                policy: InvalidPolicy::Skip,
                normalize: false,
                chunk_size: 16,
                verbosity: 2,
            }
        );
    }

    #[test]
    fn dash_is_stdin() {
        let config = parse(&["latin1enc", "-"]).unwrap();
        assert_eq!(config.input, None);
    }

    #[test]
    fn bad_chunk_size() {
        assert!(parse(&["latin1enc", "--chunk-size", "0"]).is_err());
        assert!(parse(&["latin1enc", "--chunk-size", "lots"]).is_err());
    }
}
