//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

use remote_file::DEFAULT_WORKERS;
use remote_file::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

/// Download remote files to disk, one blocking transfer per worker thread.
///
/// Each URL is fetched with a single HTTP GET and streamed to its destination
/// as bytes arrive. URLs are read from the arguments, or from stdin (one per
/// line) when no arguments are given.
#[derive(Parser, Debug, Clone)]
#[command(name = "remote-file")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to download
    pub urls: Vec<String>,

    /// Destination file (only valid with exactly one URL)
    #[arg(short = 'o', long, conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Destination directory; filenames are derived from the URLs [default: .]
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,

    /// Number of worker threads (1-64)
    #[arg(short = 'j', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub jobs: u8,

    /// Append to existing destination files instead of truncating them
    #[arg(long)]
    pub append: bool,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// Read timeout between body chunks in seconds (1-3600)
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,

    /// Print one JSON report per download on stdout
    #[arg(long)]
    pub json: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Which arguments were given explicitly on the command line.
///
/// Explicit values win over the config file; defaults do not.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliValueSources {
    pub output_dir: bool,
    pub jobs: bool,
    pub append: bool,
    pub connect_timeout: bool,
    pub read_timeout: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl CliValueSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            output_dir: is_commandline_value(matches, "output_dir"),
            jobs: is_commandline_value(matches, "jobs"),
            append: is_commandline_value(matches, "append"),
            connect_timeout: is_commandline_value(matches, "connect_timeout"),
            read_timeout: is_commandline_value(matches, "read_timeout"),
            verbose: is_commandline_value(matches, "verbose"),
            quiet: is_commandline_value(matches, "quiet"),
        }
    }
}

/// Parses process arguments, exiting with clap's message on error.
pub fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    (args, CliValueSources::from_matches(&matches))
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources_for(argv: &[&str]) -> CliValueSources {
        let matches = Args::command().try_get_matches_from(argv).unwrap();
        CliValueSources::from_matches(&matches)
    }

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["remote-file"]).unwrap();
        assert!(args.urls.is_empty());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.append);
        assert_eq!(args.jobs, 4); // DEFAULT_WORKERS
        assert_eq!(args.connect_timeout, 30);
        assert_eq!(args.read_timeout, 300);
    }

    #[test]
    fn test_cli_positional_urls_collected() {
        let args =
            Args::try_parse_from(["remote-file", "https://a.test/x", "https://b.test/y"]).unwrap();
        assert_eq!(args.urls, vec!["https://a.test/x", "https://b.test/y"]);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["remote-file", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["remote-file", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Args::try_parse_from(["remote-file", "-q", "-v"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ArgumentConflict
        );
    }

    #[test]
    fn test_cli_output_conflicts_with_output_dir() {
        let result = Args::try_parse_from(["remote-file", "-o", "a.bin", "-d", "out"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ArgumentConflict
        );
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["remote-file", "--help"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["remote-file", "--version"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayVersion
        );
    }

    #[test]
    fn test_cli_jobs_bounds() {
        assert_eq!(Args::try_parse_from(["remote-file", "-j", "1"]).unwrap().jobs, 1);
        assert_eq!(Args::try_parse_from(["remote-file", "-j", "64"]).unwrap().jobs, 64);

        for rejected in ["0", "65"] {
            let result = Args::try_parse_from(["remote-file", "-j", rejected]);
            assert_eq!(
                result.unwrap_err().kind(),
                clap::error::ErrorKind::ValueValidation,
                "jobs={rejected} should be rejected"
            );
        }
    }

    #[test]
    fn test_cli_timeout_zero_rejected() {
        let result = Args::try_parse_from(["remote-file", "--connect-timeout", "0"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
        let result = Args::try_parse_from(["remote-file", "--read-timeout", "3601"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_sources_default_values_are_not_commandline() {
        let sources = sources_for(&["remote-file"]);
        assert!(!sources.jobs);
        assert!(!sources.output_dir);
        assert!(!sources.append);
        assert!(!sources.verbose);
    }

    #[test]
    fn test_cli_sources_explicit_values_are_commandline() {
        let sources = sources_for(&["remote-file", "-j", "4", "--append", "-d", "out", "-v"]);
        assert!(sources.jobs, "explicit -j equal to default still counts");
        assert!(sources.append);
        assert!(sources.output_dir);
        assert!(sources.verbose);
        assert!(!sources.quiet);
    }
}
