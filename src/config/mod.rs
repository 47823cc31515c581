//! Configuration module for plasmaq.
//!
//! Handles the settings file, environment variable expansion and the
//! conversion of settings into compiler options and cache policy.

mod settings;

pub use settings::{
    expand_env_vars, CacheSettings, CompilerSettings, DelegateSettings, Settings, SettingsError,
    CONFIG_ENV_VAR,
};
