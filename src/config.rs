//! Unified configuration for the weft core.
//!
//! All tunables live here as explicit inputs — scoring weights, the
//! experience saturation ceiling, the SLA duration table, and the SLA
//! display thresholds. Nothing in the scoring or queue logic reaches for a
//! hidden constant.
//!
//! # Configuration File Format
//!
//! ```toml
//! [scoring]
//! experience_ceiling = 50
//! verified_bonus = 10.0
//!
//! [scoring.weights]
//! price = 35
//! timeline = 25
//! experience = 20
//! quality = 20
//!
//! [sla]
//! # Seconds until breach, per priority.
//! high = 3600
//! medium = 14400
//! low = 28800
//!
//! [sla_display]
//! # Display banding is independent of the escalation table above.
//! critical_within = 3600
//! warning_within = 10800
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::{Priority, duration_serde};

/// Relative weights of the four match sub-scores.
///
/// Expected to sum to 100; [`WeftConfig::validate`] enforces this for
/// configs loaded from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub price: u32,
    pub timeline: u32,
    pub experience: u32,
    pub quality: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            price: 35,
            timeline: 25,
            experience: 20,
            quality: 20,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> u32 {
        self.price + self.timeline + self.experience + self.quality
    }
}

/// Configuration for the bid scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    /// Completed-project count at which the experience sub-score saturates.
    pub experience_ceiling: u32,
    /// Flat bonus added to the quality sub-score for verified vendors.
    pub verified_bonus: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            experience_ceiling: 50,
            verified_bonus: 10.0,
        }
    }
}

impl ScoringConfig {
    /// Set the experience saturation ceiling.
    pub fn with_experience_ceiling(mut self, ceiling: u32) -> Self {
        self.experience_ceiling = ceiling;
        self
    }

    /// Set the verified-vendor quality bonus.
    pub fn with_verified_bonus(mut self, bonus: f64) -> Self {
        self.verified_bonus = bonus;
        self
    }

    /// Set the sub-score weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }
}

/// SLA duration table: how long a moderation item of each priority may sit
/// unresolved before it breaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaConfig {
    #[serde(with = "duration_serde")]
    pub high: Duration,
    #[serde(with = "duration_serde")]
    pub medium: Duration,
    #[serde(with = "duration_serde")]
    pub low: Duration,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            high: Duration::hours(1),
            medium: Duration::hours(4),
            low: Duration::hours(8),
        }
    }
}

impl SlaConfig {
    /// Resolution window for the given priority.
    pub fn duration_for(&self, priority: Priority) -> Duration {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

/// Thresholds for SLA health banding on read.
///
/// These drive display urgency only. Escalation is governed by the
/// [`SlaConfig`] deadline table; the two are deliberately independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaDisplayConfig {
    /// Remaining time below which an item reads as critical.
    #[serde(with = "duration_serde")]
    pub critical_within: Duration,
    /// Remaining time below which an item reads as warning.
    #[serde(with = "duration_serde")]
    pub warning_within: Duration,
}

impl Default for SlaDisplayConfig {
    fn default() -> Self {
        Self {
            critical_within: Duration::minutes(60),
            warning_within: Duration::minutes(180),
        }
    }
}

/// Top-level configuration for the weft core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeftConfig {
    pub scoring: ScoringConfig,
    pub sla: SlaConfig,
    pub sla_display: SlaDisplayConfig,
}

impl WeftConfig {
    /// Parse a configuration from TOML text. Missing sections fall back to
    /// defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse weft config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        let total = self.scoring.weights.total();
        if total != 100 {
            anyhow::bail!("scoring weights must sum to 100, got {}", total);
        }
        if self.scoring.experience_ceiling == 0 {
            anyhow::bail!("experience_ceiling must be at least 1");
        }
        for (name, d) in [
            ("sla.high", self.sla.high),
            ("sla.medium", self.sla.medium),
            ("sla.low", self.sla.low),
        ] {
            if d <= Duration::zero() {
                anyhow::bail!("{} must be a positive duration", name);
            }
        }
        Ok(())
    }
}
