// SPDX-License-Identifier: MPL-2.0

use std::{
    fs::read_to_string,
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

const APP_NAME: &str = "timesheetd";
const DATABASE_FILE: &str = "time_tracker.db";

pub fn load_config(config_path: Option<PathBuf>) -> Config {
    let config_toml: PartialConfig = config_path
        .or_else(|| dirs::config_local_dir().map(|dir| dir.join(APP_NAME).join("config.toml")))
        .and_then(|path| read_config(&path))
        .unwrap_or_default();

    Config::from_partial(config_toml)
}

fn read_config(path: &Path) -> Option<PartialConfig> {
    log::debug!("Reading configuration at path {:?}", path);
    match read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("Could not parse config at path {:?} {err}", path);
                None
            }
        },
        Err(err) => {
            log::trace!("Could not read path {path:?} (assuming no config file set yet) {err}");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind: SocketAddr,
    pub busy_timeout: Duration,
}

impl Config {
    fn from_partial(config_toml: PartialConfig) -> Self {
        let database_path = config_toml
            .database_path
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(APP_NAME).join(DATABASE_FILE)))
            .unwrap_or_else(|| {
                log::warn!("OS data directory could not be determined, using the working directory");
                PathBuf::from(DATABASE_FILE)
            });
        log::trace!("Config: database_path is {:?}", &database_path);

        let bind = config_toml
            .bind
            .unwrap_or(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000)));
        log::trace!("Config: bind is {bind}");

        let busy_timeout = Duration::from_millis(config_toml.busy_timeout_ms.unwrap_or(5000));
        Config {
            database_path,
            bind,
            busy_timeout,
        }
    }
}

#[derive(Default, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    database_path: Option<PathBuf>,
    bind: Option<SocketAddr>,
    busy_timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn defaults_listen_on_port_8000() {
        let config = Config::from_partial(PartialConfig::default());
        assert_eq!(config.bind, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert!(config.database_path.ends_with(DATABASE_FILE));
    }

    #[test]
    fn reads_values_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
database_path = "/var/lib/timesheetd/db.sqlite"
bind = "127.0.0.1:8080"
busy_timeout_ms = 250
"#
        )
        .unwrap();

        let config = load_config(Some(file.path().to_owned()));
        assert_eq!(
            config,
            Config {
                database_path: "/var/lib/timesheetd/db.sqlite".into(),
                bind: "127.0.0.1:8080".parse().unwrap(),
                busy_timeout: Duration::from_millis(250),
            }
        );
    }

    #[test]
    fn unparseable_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind = 8000").unwrap();

        let config = load_config(Some(file.path().to_owned()));
        assert_eq!(config, Config::from_partial(PartialConfig::default()));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(dir.path().join("nope.toml")));
        assert_eq!(config, Config::from_partial(PartialConfig::default()));
    }
}
