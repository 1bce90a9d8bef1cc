/// Application name, used for the settings directory.
pub const APP_NAME: &str = "cog";

/// Configuration script looked up when no path is given.
pub const DEFAULT_CONFIG: &str = "cogfile.lua";

/// Output directory used when neither `-o` nor the settings file names one.
pub const DEFAULT_OUTPUT_DIR: &str = "tmp";

/// Global the user script assigns its workspace to.
pub const WORKSPACE_GLOBAL: &str = "wsp";

/// Settings file name inside the config directory.
pub const SETTINGS_FILE: &str = "config.toml";

/// Environment variable pointing at an explicit settings file.
pub const SETTINGS_ENV: &str = "COG_CONFIG";

/// Apple deployment target used when a project does not set one.
pub const DEFAULT_DEPLOYMENT: &str = "13.0";

/// Unity translation units generated per project.
pub const DEFAULT_UNITY_UNITS: usize = 4;

/// Directory (inside the output directory) holding intermediate objects.
pub const INTERMEDIATE_DIR: &str = ".intermediate";

/// Directory (inside the output directory) holding build products.
pub const PRODUCT_DIR: &str = ".output";
