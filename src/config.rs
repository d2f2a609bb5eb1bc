//! Field configuration module.
//!
//! A field's options are resolved once, when the field is initialized, into
//! immutable [`Constraints`]. Options come either from string-keyed
//! attributes on the host element or from a `field.toml` file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! maxWidth = 1024         # Output width bound, in pixels
//! maxHeight = 1024        # Output height bound, in pixels
//! # ratio = "4:3"         # Fixed aspect ratio, "W:H" or "W/H"; "0:0" = none
//!                         # Decimal terms are fine: "1.85:1"
//! quality = 1.0           # 0-1, or a percentage above 1 (85 → 0.85)
//! disableResize = false   # Attach files exactly as selected
//! hideClear = false       # Hide the clear control (UI only)
//! ```
//!
//! ## Attributes
//!
//! [`FieldConfig::from_attributes`] accepts the same keys as element
//! attributes, in `maxWidth`, `max-width` or `data-max-width` spelling.
//! Flags are on when present with any value except `""`, `"false"` or `"0"`.
//! Attributes the field does not know are ignored, since host elements carry
//! plenty of unrelated ones. The TOML form rejects unknown keys to catch
//! typos early.

use crate::imaging::{AspectRatio, Constraints, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Options for one file field, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct FieldConfig {
    /// Output width bound in pixels.
    pub max_width: u32,
    /// Output height bound in pixels.
    pub max_height: u32,
    /// Fixed aspect ratio as `"W:H"` or `"W/H"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<String>,
    /// Encoding quality, a fraction or a percentage.
    pub quality: f64,
    /// Skip all transforms and attach files unchanged.
    pub disable_resize: bool,
    /// Hide the clear control. Carried for the UI layer only.
    pub hide_clear: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            max_width: Constraints::DEFAULT_MAX_WIDTH,
            max_height: Constraints::DEFAULT_MAX_HEIGHT,
            ratio: None,
            quality: 1.0,
            disable_resize: false,
            hide_clear: false,
        }
    }
}

impl FieldConfig {
    /// Build from string-keyed element attributes.
    pub fn from_attributes<'a, I>(attributes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();
        for (key, value) in attributes {
            let value = value.trim();
            match attribute_key(key).as_str() {
                "maxWidth" => config.max_width = parse_number(key, value)?,
                "maxHeight" => config.max_height = parse_number(key, value)?,
                "ratio" => config.ratio = (!value.is_empty()).then(|| value.to_string()),
                "quality" => config.quality = parse_number(key, value)?,
                "disableResize" => config.disable_resize = is_truthy(value),
                "hideClear" => config.hide_clear = is_truthy(value),
                _ => {}
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a `field.toml` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate and resolve into the immutable constraints a field runs with.
    pub fn constraints(&self) -> Result<Constraints, ConfigError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ConfigError::Validation(
                "maxWidth and maxHeight must be positive".into(),
            ));
        }
        let quality = Quality::from_setting(self.quality).ok_or_else(|| {
            ConfigError::Validation(format!(
                "quality must be in (0, 1] or a percentage up to 100, got {}",
                self.quality
            ))
        })?;
        let ratio = match &self.ratio {
            Some(raw) => parse_ratio(raw)?,
            None => None,
        };

        Ok(Constraints {
            max_width: self.max_width,
            max_height: self.max_height,
            ratio,
            quality,
            disable_resize: self.disable_resize,
        })
    }
}

/// Parse `"W:H"` or `"W/H"`.
///
/// Terms may be decimals (`"1.85:1"`, `"2.39/1"`); both are scaled to
/// integers and reduced, so `"1.5:1"` is `3:2`. A zero term (or an empty
/// string) means "no ratio constraint".
pub fn parse_ratio(raw: &str) -> Result<Option<AspectRatio>, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = || ConfigError::Validation(format!("ratio must look like \"W:H\" or \"W/H\", got {raw:?}"));
    let (w, h) = raw.split_once([':', '/']).ok_or_else(invalid)?;
    let (w_digits, w_scale) = parse_decimal(w.trim()).ok_or_else(invalid)?;
    let (h_digits, h_scale) = parse_decimal(h.trim()).ok_or_else(invalid)?;
    if w_digits == 0 || h_digits == 0 {
        return Ok(None);
    }

    // Bring both terms to the same number of decimal places
    let scale = w_scale.max(h_scale);
    let w = w_digits.checked_mul(10u64.pow(scale - w_scale)).ok_or_else(invalid)?;
    let h = h_digits.checked_mul(10u64.pow(scale - h_scale)).ok_or_else(invalid)?;
    let divisor = gcd(w, h);
    let (w, h) = (w / divisor, h / divisor);

    match (u32::try_from(w), u32::try_from(h)) {
        (Ok(w), Ok(h)) => Ok(AspectRatio::new(w, h)),
        _ => Err(invalid()),
    }
}

/// Most decimal places accepted in a ratio term.
const MAX_RATIO_DECIMALS: u32 = 6;

/// `"1.85"` → `(185, 2)`: the digits as an integer and the decimal places.
fn parse_decimal(term: &str) -> Option<(u64, u32)> {
    let (int, frac) = term.split_once('.').unwrap_or((term, ""));
    if int.is_empty() && frac.is_empty() {
        return None;
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int) || !all_digits(frac) || frac.len() > MAX_RATIO_DECIMALS as usize {
        return None;
    }
    let digits: u64 = format!("{int}{frac}").parse().ok()?;
    Some((digits, frac.len() as u32))
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// `data-max-width` / `max-width` / `maxWidth` → `maxWidth`.
fn attribute_key(key: &str) -> String {
    let key = key.trim();
    let key = key.strip_prefix("data-").unwrap_or(key);
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} must be a number, got {value:?}")))
}

fn is_truthy(value: &str) -> bool {
    !matches!(value, "" | "0") && !value.eq_ignore_ascii_case("false")
}

/// Returns a fully-commented stock `field.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Superfile Field Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Output bounds in pixels. Images are only ever scaled down, never up.
maxWidth = 1024
maxHeight = 1024

# Fixed aspect ratio as "W:H" or "W/H", e.g. "4:3" or "1.85:1". Images with
# a different ratio are center-cropped before scaling. Omit (or use "0:0")
# for no ratio.
# ratio = "4:3"

# Encoding quality for lossy formats (JPEG, AVIF). Either a fraction in
# (0, 1] or a percentage: 85 means 0.85.
quality = 1.0

# Attach files exactly as selected, without cropping or scaling.
disableResize = false

# Hide the clear control next to the field.
hideClear = false
"##
}
