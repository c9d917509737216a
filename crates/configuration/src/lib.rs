use crate::error::ConfigError;
use crate::settings::Settings;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Paths, QualitySettings, Settings as PipelineSettings};

/// Loads the pipeline configuration, by default from `config.toml`.
///
/// This function is the primary entry point for this crate. It reads the
/// configuration file, deserializes it into our strongly-typed `Settings`
/// struct, validates the quality thresholds, and returns it.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let source = match path {
        Some(path) => config::File::from(path),
        None => config::File::with_name("config.toml"),
    };

    let builder = config::Config::builder().add_source(source).build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    validate(&settings)?;

    Ok(settings)
}

/// The extreme-value bounds must describe non-empty plausibility bands.
fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let quality = &settings.quality;
    if quality.rpe_upper <= quality.rpe_lower {
        return Err(ConfigError::ValidationError(format!(
            "rpe_upper ({}) must be greater than rpe_lower ({})",
            quality.rpe_upper, quality.rpe_lower
        )));
    }
    if quality.yoy_upper <= quality.yoy_lower {
        return Err(ConfigError::ValidationError(format!(
            "yoy_upper ({}) must be greater than yoy_lower ({})",
            quality.yoy_upper, quality.yoy_lower
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualitySettings;

    #[test]
    fn default_quality_settings_match_documented_policy() {
        let quality = QualitySettings::default();
        assert_eq!(quality.rpe_upper, 1000.0);
        assert_eq!(quality.yoy_lower, -0.5);
        assert_eq!(quality.yoy_upper, 2.0);
        assert_eq!(quality.penalty_missing_revenue, 40);
        assert_eq!(quality.penalty_missing_employees, 20);
        assert_eq!(quality.penalty_negative_revenue, 40);
        assert_eq!(quality.penalty_negative_employees, 40);
        assert_eq!(quality.penalty_rpe_extreme, 10);
        assert_eq!(quality.penalty_yoy_extreme, 10);
    }

    #[test]
    fn inverted_bounds_fail_validation() {
        let mut settings = Settings {
            paths: crate::settings::Paths {
                observations: "obs.csv".into(),
                facts: "facts.csv".into(),
                kpis: "kpis.csv".into(),
                flagged_kpis: "flagged.csv".into(),
                final_kpis: "final.csv".into(),
                reports: "reports".into(),
            },
            quality: QualitySettings::default(),
        };
        settings.quality.rpe_upper = -1.0;
        assert!(matches!(
            validate(&settings),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
