use super::ServerConfig;
use super::merge::merge_config;

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Also loads from a `.env` file if present using dotenvy.
    ///
    /// # Errors
    /// Returns an error if:
    /// - A provider API key is missing
    /// - Numeric variables are malformed
    /// - The language pair is unknown or identical
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let _ = dotenvy::dotenv();
        merge_config(None)
    }
}
