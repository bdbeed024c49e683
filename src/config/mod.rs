//! Configuration module for rqmeta.
//!
//! Holds the process-wide, read-only settings: default endpoint and
//! credentials, access token, datatype vocabulary and MIME types.

mod settings;

pub use settings::{
    expand_env_vars, EndpointSettings, EnumerationSettings, MimeTypes, Settings, SettingsError,
    VocabularySettings, NO_AUTH_SENTINEL, XSD_DATATYPES,
};
