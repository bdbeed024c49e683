//! TOML-based configuration for rqmeta.
//!
//! Supports a config file (rqmeta.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [endpoint]
//! default = "https://dbpedia.org/sparql"
//! user = "none"
//! password = "none"
//! access_token = "${RQMETA_ACCESS_TOKEN}"
//! timeout_secs = 30
//!
//! [enumeration]
//! cache_enabled = true
//! cache_ttl_seconds = 600
//!
//! [vocabulary]
//! xsd_datatypes = ["integer", "date", "dateTime"]
//!
//! [mimetypes]
//! json = "application/sparql-results+json"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::endpoint::Credentials;

/// Sentinel value meaning "no credentials" for the default user and password.
pub const NO_AUTH_SENTINEL: &str = "none";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
///
/// Built once at startup and shared read-only (usually behind an `Arc`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Default SPARQL endpoint and its credentials.
    pub endpoint: EndpointSettings,

    /// Enumeration lookup behaviour.
    pub enumeration: EnumerationSettings,

    /// Recognised datatype names for the variable naming grammar.
    pub vocabulary: VocabularySettings,

    /// Format name to MIME type.
    pub mimetypes: MimeTypes,
}

/// Default endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Endpoint used when nothing else names one.
    pub default: String,

    /// Default user (supports ${ENV_VAR} expansion).
    pub user: String,

    /// Default password (supports ${ENV_VAR} expansion).
    pub password: String,

    /// Token sent as `Authorization: token <value>` when set.
    pub access_token: Option<String>,

    /// Timeout for each outbound endpoint request.
    pub timeout_secs: u64,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            default: "https://dbpedia.org/sparql".to_string(),
            user: NO_AUTH_SENTINEL.to_string(),
            password: NO_AUTH_SENTINEL.to_string(),
            access_token: None,
            timeout_secs: 30,
        }
    }
}

impl EndpointSettings {
    /// Default credentials, or `None` when both values are the "none" sentinel.
    pub fn default_credentials(&self) -> Result<Option<Credentials>, SettingsError> {
        if self.user == NO_AUTH_SENTINEL && self.password == NO_AUTH_SENTINEL {
            return Ok(None);
        }
        Ok(Some(Credentials::new(
            expand_env_vars(&self.user)?,
            expand_env_vars(&self.password)?,
        )))
    }

    /// Access token with environment variables expanded; blank tokens count as unset.
    pub fn resolved_access_token(&self) -> Result<Option<String>, SettingsError> {
        match &self.access_token {
            Some(token) => {
                let token = expand_env_vars(token)?;
                Ok((!token.trim().is_empty()).then_some(token))
            }
            None => Ok(None),
        }
    }
}

/// Enumeration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnumerationSettings {
    /// Memoize live enumeration results in-process.
    pub cache_enabled: bool,

    /// Cache TTL in seconds.
    pub cache_ttl_seconds: u64,
}

impl Default for EnumerationSettings {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            cache_ttl_seconds: 600,
        }
    }
}

/// Vocabulary used by the variable naming grammar.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VocabularySettings {
    /// XSD datatype local names recognised as type tags.
    pub xsd_datatypes: Vec<String>,
}

impl Default for VocabularySettings {
    fn default() -> Self {
        Self {
            xsd_datatypes: XSD_DATATYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl VocabularySettings {
    /// Whether `name` is a recognised XSD datatype local name.
    pub fn is_xsd_datatype(&self, name: &str) -> bool {
        self.xsd_datatypes.iter().any(|d| d == name)
    }
}

/// Built-in XSD datatype local names.
pub const XSD_DATATYPES: &[&str] = &[
    "decimal",
    "float",
    "double",
    "integer",
    "positiveInteger",
    "negativeInteger",
    "nonPositiveInteger",
    "nonNegativeInteger",
    "long",
    "int",
    "short",
    "byte",
    "unsignedLong",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
    "dateTime",
    "date",
    "gYearMonth",
    "gYear",
    "duration",
    "gMonthDay",
    "gDay",
    "gMonth",
    "string",
    "normalizedString",
    "token",
    "language",
    "NMTOKEN",
    "NMTOKENS",
    "Name",
    "NCName",
    "ID",
    "IDREFS",
    "ENTITY",
    "ENTITIES",
    "QName",
    "boolean",
    "hexBinary",
    "base64Binary",
    "anyURI",
    "notation",
];

/// Format name to MIME type mapping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MimeTypes(pub HashMap<String, String>);

impl Default for MimeTypes {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert(
            "json".to_string(),
            "application/sparql-results+json".to_string(),
        );
        map.insert("csv".to_string(), "text/csv".to_string());
        map.insert("html".to_string(), "text/html".to_string());
        map.insert("ttl".to_string(), "text/turtle".to_string());
        Self(map)
    }
}

impl MimeTypes {
    /// MIME type for a format name.
    pub fn get(&self, format: &str) -> Option<&str> {
        self.0.get(format).map(String::as_str)
    }

    /// MIME type requested for SPARQL JSON results.
    pub fn json(&self) -> &str {
        self.get("json").unwrap_or("application/sparql-results+json")
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `RQMETA_CONFIG`
    /// 2. `./rqmeta.toml`
    /// 3. `~/.config/rqmeta/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("RQMETA_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("rqmeta.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("rqmeta").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.endpoint.default.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "endpoint.default must not be empty".to_string(),
            ));
        }
        if self.endpoint.timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "endpoint.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // Lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
