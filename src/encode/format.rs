use std::collections::BTreeMap;

use crate::foundation::error::{VidsumError, VidsumResult};

/// Target container of one encoded output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ContainerFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    /// Whether the container can hold more than one timed frame (APNG for PNG).
    pub fn can_animate(self) -> bool {
        !matches!(self, Self::Jpeg)
    }
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// One requested output encoding.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OutputFormatSpec {
    pub container: ContainerFormat,
    #[serde(default)]
    pub supports_animation: bool,
    /// Codec options, e.g. `quality`, `lossless`, `method`, `optimize`, `speed`.
    #[serde(default)]
    pub encode_params: BTreeMap<String, serde_json::Value>,
    /// Uniform per-frame duration for animated output, overriding the assembled durations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_duration_ms: Option<u32>,
}

impl OutputFormatSpec {
    pub fn still(container: ContainerFormat) -> Self {
        Self {
            container,
            supports_animation: false,
            encode_params: BTreeMap::new(),
            frame_duration_ms: None,
        }
    }

    pub fn animated(container: ContainerFormat) -> Self {
        Self {
            supports_animation: true,
            ..Self::still(container)
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.encode_params.insert(key.to_string(), value.into());
        self
    }

    pub fn content_type(&self) -> &'static str {
        self.container.content_type()
    }

    pub fn validate(&self) -> VidsumResult<()> {
        if self.supports_animation && !self.container.can_animate() {
            return Err(VidsumError::invalid_input(format!(
                "{} output cannot be animated",
                self.container
            )));
        }
        if self.frame_duration_ms == Some(0) {
            return Err(VidsumError::invalid_input(
                "frame_duration_ms must be non-zero",
            ));
        }
        for (key, value) in &self.encode_params {
            match key.as_str() {
                "quality" => {
                    self.param_f32(key, 0.0)?;
                }
                "method" | "speed" => {
                    self.param_u8(key, 0)?;
                }
                "lossless" | "optimize" => {
                    self.param_bool(key, false)?;
                }
                _ => tracing::warn!(
                    format = %self.container,
                    key = %key,
                    %value,
                    "ignoring unknown encode param"
                ),
            }
        }
        Ok(())
    }

    pub fn param_bool(&self, key: &str, default: bool) -> VidsumResult<bool> {
        match self.encode_params.get(key) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| self.bad_param(key, "a boolean")),
        }
    }

    pub fn param_u8(&self, key: &str, default: u8) -> VidsumResult<u8> {
        match self.encode_params.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| self.bad_param(key, "an integer in 0..=255")),
        }
    }

    pub fn param_f32(&self, key: &str, default: f32) -> VidsumResult<f32> {
        match self.encode_params.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_f64()
                .filter(|q| (0.0..=100.0).contains(q))
                .map(|q| q as f32)
                .ok_or_else(|| self.bad_param(key, "a number in 0..=100")),
        }
    }

    fn bad_param(&self, key: &str, expected: &str) -> VidsumError {
        VidsumError::invalid_input(format!(
            "{} encode param '{key}' must be {expected}",
            self.container
        ))
    }
}

/// JPEG, PNG (optimized), WebP (lossy q80, method 1).
pub fn default_still_formats() -> Vec<OutputFormatSpec> {
    vec![
        OutputFormatSpec::still(ContainerFormat::Jpeg),
        OutputFormatSpec::still(ContainerFormat::Png).with_param("optimize", true),
        webp_defaults(OutputFormatSpec::still(ContainerFormat::Webp)),
    ]
}

/// GIF, APNG, animated WebP.
pub fn default_animated_formats() -> Vec<OutputFormatSpec> {
    vec![
        OutputFormatSpec::animated(ContainerFormat::Gif),
        OutputFormatSpec::animated(ContainerFormat::Png).with_param("optimize", true),
        webp_defaults(OutputFormatSpec::animated(ContainerFormat::Webp)),
    ]
}

fn webp_defaults(spec: OutputFormatSpec) -> OutputFormatSpec {
    spec.with_param("lossless", false)
        .with_param("quality", 80)
        .with_param("method", 1)
}
