/// Submodule imported for every installed app during the model-binding phase.
pub const MODELS_MODULE_NAME: &str = "models";

/// Environment variable naming the settings file.
pub const SETTINGS_ENV_VAR: &str = "TRELLIS_SETTINGS";

/// Prefix of environment variables overriding individual settings.
pub const SETTINGS_ENV_PREFIX: &str = "TRELLIS";

/// Settings file looked up in the working directory when nothing else is given.
pub const DEFAULT_SETTINGS_FILE: &str = "settings";

/// Setting name under which the user model can be swapped.
pub const AUTH_USER_MODEL: &str = "AUTH_USER_MODEL";

/// Default value of [`AUTH_USER_MODEL`].
pub const DEFAULT_AUTH_USER_MODEL: &str = "auth.User";
