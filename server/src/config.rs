use std::{
    env,
    error::Error,
    fmt,
    path::{Path, PathBuf},
};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MODEL_PATH: &str = "static/model/weights.json";

/// An environment variable held a value that couldn't be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErr {
    pub var: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.var, self.value)
    }
}

impl Error for ConfigErr {}

/// Start-up settings of the prediction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    host: String,
    port: u16,
    model_path: PathBuf,
    eager_load: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            eager_load: false,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from `HOST`, `PORT`, `MODEL_PATH` and `EAGER_LOAD`.
    ///
    /// # Returns
    /// The configuration, with defaults for unset variables, or the first invalid variable.
    pub fn from_env() -> Result<Self, ConfigErr> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as `from_env` but reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigErr>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigErr {
                var: "PORT",
                value: port,
            })?;
        }

        if let Some(path) = lookup("MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }

        if let Some(eager) = lookup("EAGER_LOAD") {
            config.eager_load = match eager.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigErr {
                        var: "EAGER_LOAD",
                        value: eager,
                    });
                }
            };
        }

        Ok(config)
    }

    /// The `host:port` address to listen at.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Whether the weights are loaded before accepting connections.
    pub fn eager_load(&self) -> bool {
        self.eager_load
    }
}
