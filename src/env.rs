use std::path::Path;

use tracing::{info, warn};

fn env_files(profile: &str) -> Vec<&'static str> {
    if profile == "production" {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFile {
    Loaded(&'static str),
    Missing(&'static str),
}

impl EnvFile {
    /// Environment files are read before the subscriber exists, so their
    /// outcome is reported afterwards.
    pub fn log(&self) {
        match self {
            EnvFile::Loaded(path) => info!("Loaded environment from: {}", path),
            EnvFile::Missing(path) => {
                warn!("Warning: Environment file {} not found, skipping", path)
            }
        }
    }
}

/// Loads the environment files for the current `ROCKET_PROFILE`; later files
/// override earlier ones.
pub fn load_environment() -> Result<Vec<EnvFile>, dotenvy::Error> {
    let profile = dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string());

    env_files(&profile)
        .into_iter()
        .map(load_env_file)
        .collect()
}

fn load_env_file(path: &'static str) -> Result<EnvFile, dotenvy::Error> {
    if !Path::new(path).exists() {
        return Ok(EnvFile::Missing(path));
    }

    dotenvy::from_filename_override(path)?;
    Ok(EnvFile::Loaded(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn production_profile_uses_prod_file() {
        assert_eq!(
            env_files("production"),
            vec!["config/common.env", "config/prod.env", ".secrets.env"]
        );
        assert_eq!(
            env_files("debug"),
            vec!["config/common.env", "config/dev.env", ".secrets.env"]
        );
    }

    #[test]
    fn missing_file_is_skipped() {
        assert_eq!(
            load_env_file("config/does-not-exist.env").expect("missing file is not an error"),
            EnvFile::Missing("config/does-not-exist.env")
        );
    }

    #[test]
    #[serial]
    fn every_profile_file_is_reported() {
        temp_env::with_vars_unset(
            [
                "ROCKET_PROFILE",
                "DATABASE_URL",
                "SESSION_TTL_HOURS",
                "RUST_LOG",
                "ADMIN_USERNAME",
                "ADMIN_PASSWORD",
            ],
            || {
                let outcomes = load_environment().expect("environment loads");
                assert_eq!(
                    &outcomes[..2],
                    &[
                        EnvFile::Loaded("config/common.env"),
                        EnvFile::Loaded("config/dev.env"),
                    ]
                );
                assert_eq!(outcomes.len(), 3);
            },
        );
    }
}
