//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Compare how two load-balancer backends serve the same site.
#[derive(Parser, Debug)]
#[command(name = "routediff", version)]
pub struct Args {
    /// Print both response bodies in full for body mismatches.
    #[arg(long)]
    pub show_bodies: bool,

    /// Scenario file to run (defaults to `scenario_file` from the settings).
    #[arg(value_name = "SCENARIO_FILE")]
    pub scenario_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["routediff"]).unwrap();
        assert!(!args.show_bodies);
        assert!(args.scenario_file.is_none());
    }

    #[test]
    fn test_flag_and_file() {
        let args =
            Args::try_parse_from(["routediff", "--show-bodies", "demos/scenarios.yaml"]).unwrap();
        assert!(args.show_bodies);
        assert_eq!(args.scenario_file, Some(PathBuf::from("demos/scenarios.yaml")));
    }

    #[test]
    fn test_misspelled_flag_is_rejected() {
        let err = Args::try_parse_from(["routediff", "--show-bodes"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_extra_positional_is_rejected() {
        assert!(Args::try_parse_from(["routediff", "a.yaml", "b.yaml"]).is_err());
    }
}
