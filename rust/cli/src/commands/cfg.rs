//! Configuration command handler.
//!
//! Prints the resolved configuration as JSON, each field with the layer it
//! came from:
//!
//! ```json
//! {
//!   "player_name": {
//!     "value": "Player",
//!     "source": "default"
//!   },
//!   ...
//! }
//! ```

use crate::config;
use crate::error::CliError;
use std::io::Write;

pub fn handle_cfg_command(out: &mut dyn Write, _err: &mut dyn Write) -> Result<(), CliError> {
    let config::ConfigResolved { config, sources } = config::load_with_sources()
        .map_err(|e| CliError::Config(format!("Invalid configuration: {}", e)))?;

    let display = serde_json::json!({
        "profile_path": {
            "value": config.profile_path,
            "source": sources.profile_path,
        },
        "seed": {
            "value": config.seed,
            "source": sources.seed,
        },
        "player_name": {
            "value": config.player_name,
            "source": sources.player_name,
        }
    });
    let json_str = serde_json::to_string_pretty(&display).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            config::CONFIG_ENV,
            config::SEED_ENV,
            config::PROFILE_ENV,
            config::PLAYER_ENV,
        ] {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_cfg_displays_json_with_sources() {
        clear_env();
        unsafe { std::env::set_var(config::PLAYER_ENV, "Ada") };
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = handle_cfg_command(&mut out, &mut err);
        clear_env();

        assert!(result.is_ok());
        let json: serde_json::Value = serde_json::from_slice(&out).expect("valid JSON");
        assert_eq!(json["player_name"]["value"], "Ada");
        assert_eq!(json["player_name"]["source"], "env");
        assert_eq!(json["seed"]["value"], serde_json::Value::Null);
        assert_eq!(json["seed"]["source"], "default");
        assert!(err.is_empty(), "should not write to stderr on success");
    }

    #[test]
    #[serial]
    fn test_cfg_reports_invalid_configuration() {
        clear_env();
        unsafe { std::env::set_var(config::SEED_ENV, "not-a-number") };
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = handle_cfg_command(&mut out, &mut err);
        clear_env();

        match result {
            Err(CliError::Config(msg)) => assert!(msg.starts_with("Invalid configuration")),
            other => panic!("expected config error, got {:?}", other),
        }
        assert!(out.is_empty());
    }
}
