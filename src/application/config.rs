//! # Application configuration
//!
//! This module contains the configuration for the application

use cryptonotes::blockchain::DEFAULT_CHAIN_DIR;

use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize)]
/// Application config
pub struct Config {
    #[serde(default = "Config::default_blockchain_dir")]
    blockchain_dir: PathBuf,
    #[serde(default = "Config::default_content_dir")]
    content_dir: PathBuf,
    #[serde(default = "Config::default_difficulty")]
    difficulty: u32,
    #[serde(default)]
    batch_limit: Option<usize>,
    #[serde(default = "Config::default_verify_on_load")]
    verify_on_load: bool,
    #[serde(default = "Config::default_mining_schedule")]
    mining_schedule: String,
}

impl Config {
    /// Try to create config from env
    pub fn try_from_env() -> anyhow::Result<Self> {
        envy::from_env()
            .map_err(|e| anyhow::anyhow!("could not load config from environment: {}", e))
    }

    /// Try to create config from key-value pairs, named as the environment variables
    #[cfg(test)]
    pub fn try_from_iter<I>(iter: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(iter).map_err(|e| anyhow::anyhow!("could not load config: {}", e))
    }

    /// Get blockchain directory path
    pub fn blockchain_dir(&self) -> &Path {
        self.blockchain_dir.as_path()
    }

    /// Get content store directory path
    pub fn content_dir(&self) -> &Path {
        self.content_dir.as_path()
    }

    /// Get mining difficulty (leading zero bits)
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Get max amount of transactions per block
    pub fn batch_limit(&self) -> Option<usize> {
        self.batch_limit
    }

    /// Whether to verify the chain on startup
    pub fn verify_on_load(&self) -> bool {
        self.verify_on_load
    }

    /// Get cron expression for the mining job
    pub fn mining_schedule(&self) -> &str {
        &self.mining_schedule
    }

    fn default_blockchain_dir() -> PathBuf {
        PathBuf::from(DEFAULT_CHAIN_DIR)
    }

    fn default_content_dir() -> PathBuf {
        PathBuf::from("./content")
    }

    fn default_difficulty() -> u32 {
        8
    }

    fn default_verify_on_load() -> bool {
        true
    }

    fn default_mining_schedule() -> String {
        String::from("0/30 * * * * *")
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn should_load_default_config() {
        let config = Config::try_from_iter(Vec::new()).unwrap();
        assert_eq!(config.blockchain_dir(), Path::new("./blockchain"));
        assert_eq!(config.content_dir(), Path::new("./content"));
        assert_eq!(config.difficulty(), 8);
        assert_eq!(config.batch_limit(), None);
        assert_eq!(config.verify_on_load(), true);
        assert_eq!(config.mining_schedule(), "0/30 * * * * *");
    }

    #[test]
    fn should_load_config_from_vars() {
        let config = Config::try_from_iter(vec![
            (String::from("BLOCKCHAIN_DIR"), String::from("/tmp/chain")),
            (String::from("DIFFICULTY"), String::from("12")),
            (String::from("BATCH_LIMIT"), String::from("16")),
            (String::from("VERIFY_ON_LOAD"), String::from("false")),
        ])
        .unwrap();
        assert_eq!(config.blockchain_dir(), Path::new("/tmp/chain"));
        assert_eq!(config.difficulty(), 12);
        assert_eq!(config.batch_limit(), Some(16));
        assert_eq!(config.verify_on_load(), false);
    }

    #[test]
    fn should_fail_on_bad_value() {
        assert!(Config::try_from_iter(vec![(
            String::from("DIFFICULTY"),
            String::from("hard")
        )])
        .is_err());
    }

    #[test]
    fn should_load_config_from_env_devel() {
        dotenv::from_filename(Path::new(".env.devel")).ok();
        let config = Config::try_from_env().unwrap();
        assert_eq!(config.blockchain_dir(), Path::new("./blockchain"));
        assert_eq!(config.content_dir(), Path::new("./content"));
    }
}
