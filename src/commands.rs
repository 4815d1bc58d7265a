use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    /// increase the verbosity
    ///
    /// This flag can be used multiple times to increase the amount of information
    /// produced by timesheetd
    #[arg(global = true, short, long, action = clap::ArgAction::Count, help_heading = "Logging")]
    pub verbose: u8,

    /// output no logging
    ///
    /// Setting quiet disables all logging to stderr.
    #[arg(global = true, long, action = clap::ArgAction::SetTrue, help_heading = "Logging")]
    pub quiet: bool,

    /// path to the configuration file
    ///
    /// Defaults to timesheetd/config.toml inside the OS config directory.  A missing
    /// file is not an error, all settings have defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SQLite database file, overrides the configuration file
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// address to listen on, overrides the configuration file
    ///
    /// Defaults to 0.0.0.0:8000.
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_are_optional() {
        let args = Arguments::try_parse_from(["timesheetd"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.database, None);
        assert_eq!(args.bind, None);
    }

    #[test]
    fn parses_overrides() {
        let args = Arguments::try_parse_from([
            "timesheetd",
            "-vv",
            "--database",
            "/tmp/t.db",
            "--bind",
            "127.0.0.1:9000",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.database, Some(PathBuf::from("/tmp/t.db")));
        assert_eq!(args.bind, Some("127.0.0.1:9000".parse().unwrap()));
    }

    #[test]
    fn rejects_bad_bind_address() {
        assert!(Arguments::try_parse_from(["timesheetd", "--bind", "nowhere"]).is_err());
    }
}
