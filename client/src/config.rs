use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_DATA_DIR: &str = ".campus-buzz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Reads `CAMPUS_BUZZ_API_URL` and `CAMPUS_BUZZ_DATA_DIR`, after loading
    /// a `.env` file if one exists.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            api_url: non_empty("CAMPUS_BUZZ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            data_dir: non_empty("CAMPUS_BUZZ_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let env = HashMap::from([("CAMPUS_BUZZ_API_URL", "  ")]);
        let config = ClientConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn environment_overrides_defaults() {
        let env = HashMap::from([
            ("CAMPUS_BUZZ_API_URL", "https://buzz.college.edu/api"),
            ("CAMPUS_BUZZ_DATA_DIR", "/var/lib/buzz"),
        ]);
        let config = ClientConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_url, "https://buzz.college.edu/api");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/buzz"));
    }
}
