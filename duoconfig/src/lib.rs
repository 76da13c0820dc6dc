#![allow(clippy::multiple_crate_versions)]

use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::Command;

pub const APP_NAME: &str = "duolingo";

/// Polling faster than this hammers the remote for no benefit.
pub const MIN_POLL_INTERVAL_MINUTES: u64 = 1;

const fn default_poll_interval() -> u64 {
    30
}

/// Where the login token comes from: written literally into the config,
/// read from an environment variable, or produced by a shell command
/// (e.g. a secrets manager).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    Literal(String),
    Env { env: String },
    Cmd { cmd: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuoConfig {
    /// Account to log in and poll.
    pub username: String,
    /// The `jwt_token` of a logged-in session.
    pub token: Token,
    /// Account password, as a fallback when no token is configured.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,
}

impl Default for DuoConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            token: Token::Literal(String::new()),
            password: None,
            poll_interval_minutes: default_poll_interval(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DuoConfigError {
    #[error("config error: {0}")]
    Confy(#[from] confy::ConfyError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("missing username in config; set `username` in the duolingo config file")]
    MissingUsername,
    #[error("missing token in config; set `token` in the duolingo config file")]
    MissingToken,
    #[error("environment variable '{env}' not found")]
    MissingEnv { env: String },
    #[error("token command failed: {cmd}: {message}")]
    CommandFailed { cmd: String, message: String },
    #[error("failed to execute token command '{cmd}': {source}")]
    CommandExec { cmd: String, source: io::Error },
    #[error("token command returned empty output: {cmd}")]
    CommandEmpty { cmd: String },
    #[error(
        "token required but stdin is not interactive; set `token` in {path} (example: token = \"YOUR_JWT\" or token = {{ cmd = \"...\" }})",
        path = .path.display()
    )]
    NonInteractive { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, DuoConfigError>;

impl DuoConfig {
    /// Loads the config file from the standard OS location.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or deserialized.
    pub fn load() -> Result<Self> {
        Ok(confy::load(APP_NAME, None)?)
    }

    /// Loads config or walks the user through onboarding username and token.
    ///
    /// # Errors
    /// Returns an error if the config cannot be loaded, the token cannot be
    /// resolved, or onboarding fails (including non-interactive stdin).
    pub fn load_or_onboard() -> Result<Self> {
        let mut config = Self::load()?;
        if config.username.trim().is_empty() {
            config = config.onboard()?;
            return Ok(config);
        }
        match &config.token {
            Token::Literal(value) if value.trim().is_empty() => {
                // A configured password makes the empty token fine.
                if config.password.is_some() {
                    return Ok(config);
                }
                config = config.onboard()?;
            }
            token => {
                token.resolve()?;
            }
        }
        Ok(config)
    }

    /// Stores the config to the standard OS location.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn store(&self) -> Result<()> {
        confy::store(APP_NAME, None, self)?;
        Ok(())
    }

    /// Resolves the login token from the configured source.
    ///
    /// # Errors
    /// Returns an error if the token cannot be resolved or is empty.
    pub fn token(&self) -> Result<String> {
        self.token.resolve()
    }

    /// Poll interval with the lower bound applied.
    #[must_use]
    pub fn poll_interval_minutes(&self) -> u64 {
        self.poll_interval_minutes.max(MIN_POLL_INTERVAL_MINUTES)
    }

    fn onboard(mut self) -> Result<Self> {
        let config_path = confy::get_configuration_file_path(APP_NAME, None)?;
        if !io::stdin().is_terminal() {
            return Err(DuoConfigError::NonInteractive { path: config_path });
        }

        if !config_path.as_os_str().is_empty() {
            eprintln!(
                "Duolingo config not found or incomplete. It will be stored at: {}",
                config_path.display()
            );
        }

        if self.username.trim().is_empty() {
            self.username = prompt("Enter your Duolingo username: ")?;
            if self.username.is_empty() {
                return Err(DuoConfigError::MissingUsername);
            }
        }

        let token = prompt("Enter your Duolingo jwt_token: ")?;
        if token.is_empty() {
            return Err(DuoConfigError::MissingToken);
        }
        self.token = Token::Literal(token);
        self.store()?;
        Ok(self)
    }
}

fn prompt(message: &str) -> Result<String> {
    eprint!("{message}");
    io::stderr().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

impl Token {
    fn resolve(&self) -> Result<String> {
        match self {
            Self::Literal(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(DuoConfigError::MissingToken);
                }
                Ok(trimmed.to_string())
            }
            Self::Env { env } => {
                let value = std::env::var(env)
                    .map_err(|_| DuoConfigError::MissingEnv { env: env.clone() })?;
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(DuoConfigError::MissingToken);
                }
                Ok(trimmed.to_string())
            }
            Self::Cmd { cmd } => {
                let output = Command::new("sh")
                    .arg("-c")
                    .arg(cmd)
                    .output()
                    .map_err(|e| DuoConfigError::CommandExec {
                        cmd: cmd.clone(),
                        source: e,
                    })?;

                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(DuoConfigError::CommandFailed {
                        cmd: cmd.clone(),
                        message: stderr.trim().to_string(),
                    });
                }

                let stdout = String::from_utf8_lossy(&output.stdout);
                let trimmed = stdout.trim();
                if trimmed.is_empty() {
                    return Err(DuoConfigError::CommandEmpty { cmd: cmd.clone() });
                }
                Ok(trimmed.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DuoConfig, DuoConfigError, Token};

    #[test]
    fn resolves_literal_token() {
        let token = Token::Literal(" literal ".to_string());
        assert_eq!(token.resolve().unwrap(), "literal");
    }

    #[test]
    fn resolves_env_token() {
        let var = format!("DUOCONFIG_TEST_TOKEN_{}", std::process::id());
        std::env::set_var(&var, "envvalue");
        let token = Token::Env { env: var.clone() };
        assert_eq!(token.resolve().unwrap(), "envvalue");
        std::env::remove_var(&var);
    }

    #[test]
    fn resolves_cmd_token() {
        let token = Token::Cmd {
            cmd: "printf 'cmdvalue'".to_string(),
        };
        assert_eq!(token.resolve().unwrap(), "cmdvalue");
    }

    #[test]
    fn cmd_empty_output_is_error() {
        let token = Token::Cmd {
            cmd: "printf ''".to_string(),
        };
        let err = token.resolve().unwrap_err();
        assert!(matches!(err, DuoConfigError::CommandEmpty { .. }));
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let config = DuoConfig {
            poll_interval_minutes: 0,
            ..DuoConfig::default()
        };
        assert_eq!(config.poll_interval_minutes(), 1);
        assert_eq!(DuoConfig::default().poll_interval_minutes(), 30);
    }
}
