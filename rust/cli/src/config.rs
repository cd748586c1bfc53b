use blackjack_engine::engine::DEFAULT_PLAYER_NAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const CONFIG_ENV: &str = "BLACKJACK_CONFIG";
pub const SEED_ENV: &str = "BLACKJACK_SEED";
pub const PROFILE_ENV: &str = "BLACKJACK_PROFILE";
pub const PLAYER_ENV: &str = "BLACKJACK_PLAYER";

const PROFILE_FILE: &str = "profile.json";
const MAX_PLAYER_NAME: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub profile_path: PathBuf,
    pub seed: Option<u64>,
    pub player_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigSources {
    pub profile_path: ValueSource,
    pub seed: ValueSource,
    pub player_name: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            profile_path: ValueSource::Default,
            seed: ValueSource::Default,
            player_name: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile_path: default_profile_path(),
            seed: None,
            player_name: DEFAULT_PLAYER_NAME.into(),
        }
    }
}

/// `$HOME/.blackjack/profile.json`, or `.blackjack/profile.json` relative to
/// the working directory when no home is set.
pub fn default_profile_path() -> PathBuf {
    let base = std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .unwrap_or_default();
    base.join(".blackjack").join(PROFILE_FILE)
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "cannot parse config file: {}", e),
            ConfigError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

pub fn load() -> Result<Config, ConfigError> {
    load_with_sources().map(|resolved| resolved.config)
}

/// Defaults, then the TOML file named by `BLACKJACK_CONFIG`, then the
/// `BLACKJACK_*` variables. Later layers win.
pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();

    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.is_empty()
    {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.profile_path {
            cfg.profile_path = v;
            sources.profile_path = ValueSource::File;
        }
        if let Some(v) = f.seed {
            cfg.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = f.player_name {
            cfg.player_name = v;
            sources.player_name = ValueSource::File;
        }
    }

    if let Ok(seed) = std::env::var(SEED_ENV)
        && !seed.is_empty()
    {
        cfg.seed = Some(
            seed.parse()
                .map_err(|_| ConfigError::Invalid(format!("Invalid seed: {}", seed)))?,
        );
        sources.seed = ValueSource::Env;
    }
    if let Ok(profile) = std::env::var(PROFILE_ENV)
        && !profile.is_empty()
    {
        cfg.profile_path = PathBuf::from(profile);
        sources.profile_path = ValueSource::Env;
    }
    if let Ok(name) = std::env::var(PLAYER_ENV)
        && !name.is_empty()
    {
        cfg.player_name = name;
        sources.player_name = ValueSource::Env;
    }

    cfg.player_name = cfg.player_name.trim().to_string();
    validate(&cfg)?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    profile_path: Option<PathBuf>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    player_name: Option<String>,
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.player_name.is_empty() {
        return Err(ConfigError::Invalid(
            "Invalid configuration: player_name must not be empty".into(),
        ));
    }
    if cfg.player_name.chars().count() > MAX_PLAYER_NAME {
        return Err(ConfigError::Invalid(format!(
            "Invalid configuration: player_name must be at most {} characters",
            MAX_PLAYER_NAME
        )));
    }
    if cfg.profile_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(
            "Invalid configuration: profile_path must not be empty".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for key in [CONFIG_ENV, SEED_ENV, PROFILE_ENV, PLAYER_ENV] {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn defaults_when_nothing_is_set() {
        clear_env();
        let resolved = load_with_sources().unwrap();
        assert_eq!(resolved.config.seed, None);
        assert_eq!(resolved.config.player_name, "Player");
        assert!(resolved.config.profile_path.ends_with(".blackjack/profile.json"));
        assert_eq!(resolved.sources.seed, ValueSource::Default);
    }

    #[test]
    #[serial]
    fn env_overrides_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seed = 11\nplayer_name = \"Remy\"\nprofile_path = \"/tmp/x.json\"").unwrap();

        unsafe {
            std::env::set_var(CONFIG_ENV, file.path());
            std::env::set_var(SEED_ENV, "99");
        }
        let resolved = load_with_sources().unwrap();
        clear_env();

        assert_eq!(resolved.config.seed, Some(99));
        assert_eq!(resolved.sources.seed, ValueSource::Env);
        assert_eq!(resolved.config.player_name, "Remy");
        assert_eq!(resolved.sources.player_name, ValueSource::File);
        assert_eq!(resolved.config.profile_path, PathBuf::from("/tmp/x.json"));
        assert_eq!(resolved.sources.profile_path, ValueSource::File);
    }

    #[test]
    #[serial]
    fn bad_seed_is_rejected() {
        clear_env();
        unsafe { std::env::set_var(SEED_ENV, "lucky") };
        let result = load();
        clear_env();
        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("lucky")));
    }

    #[test]
    #[serial]
    fn blank_player_name_is_rejected() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "player_name = \"   \"").unwrap();
        unsafe { std::env::set_var(CONFIG_ENV, file.path()) };
        let result = load();
        clear_env();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    #[serial]
    fn unknown_file_keys_fail_to_parse() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "level = 3").unwrap();
        unsafe { std::env::set_var(CONFIG_ENV, file.path()) };
        let result = load();
        clear_env();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
