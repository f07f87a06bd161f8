//! Application settings loaded from a JSON file.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    Error, duration::DurationConfig, pagination::PaginationConfig, report::Palette,
    timezone::get_local_offset,
};

/// Settings for the monthly expenses chart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// The value axis is rounded up to a multiple of this amount.
    pub axis_step: f64,
    /// The colours given to books or categories, in order.
    pub palette: Vec<String>,
    /// The ISO 4217 code used to format amounts, e.g. "INR".
    pub currency_code: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            axis_step: 5000.0,
            palette: [
                "#5470c6", "#91cc75", "#fac858", "#ee6666", "#73c0de", "#3ba272", "#fc8452",
                "#9a60b4", "#ea7ccc", "#8d6e63",
            ]
            .map(String::from)
            .to_vec(),
            currency_code: "INR".to_owned(),
        }
    }
}

impl ChartConfig {
    /// The configured colours as a [Palette].
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyPalette] if no colours are configured.
    pub fn palette(&self) -> Result<Palette, Error> {
        Palette::new(self.palette.clone())
    }
}

/// All of the application's settings. Missing sections use their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CashbookConfig {
    /// Defaults for paging the expense list.
    pub pagination: PaginationConfig,
    /// How reporting durations are resolved.
    pub duration: DurationConfig,
    /// Chart appearance.
    pub chart: ChartConfig,
}

impl CashbookConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidConfig] if the JSON is malformed, or the error
    /// from [CashbookConfig::validate].
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self =
            serde_json::from_str(json).map_err(|error| Error::InvalidConfig(error.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidConfig] if the file cannot be read, otherwise
    /// the errors of [CashbookConfig::from_json].
    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = fs::read_to_string(path).map_err(|error| {
            Error::InvalidConfig(format!("could not read {}: {error}", path.display()))
        })?;

        let config = Self::from_json(&json)?;
        tracing::info!("Loaded config from {}", path.display());

        Ok(config)
    }

    /// Check the settings that cannot be expressed by their types.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::InvalidPageSize] or [Error::InvalidPage] if a pagination default is zero,
    /// - [Error::InvalidAxisStep] if the axis step is not a positive number,
    /// - [Error::EmptyPalette] if there are no chart colours,
    /// - [Error::InvalidTimezone] if the time zone is not a known IANA name.
    pub fn validate(&self) -> Result<(), Error> {
        self.pagination.page_request(None, None)?;

        if !(self.chart.axis_step.is_finite() && self.chart.axis_step > 0.0) {
            return Err(Error::InvalidAxisStep(self.chart.axis_step));
        }

        self.chart.palette()?;

        if let Some(timezone) = &self.duration.timezone {
            if get_local_offset(timezone).is_none() {
                return Err(Error::InvalidTimezone(timezone.to_owned()));
            }
        }

        Ok(())
    }
}
