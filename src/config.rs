//! Limits for body reading and buffer pooling.
//!
//! All sections deserialize with serde and fall back to the defaults for
//! missing fields, so an empty table is a valid configuration.

use serde::Deserialize;

/// JSON body decoding limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonConfig {
    /// Maximum number of body bytes handed to the decoder; the rest is
    /// never read.
    #[serde(default = "default_json_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_json_max_body_bytes(),
        }
    }
}

/// Scratch buffer pool sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Number of idle buffers kept for reuse.
    #[serde(default = "default_max_pooled_buffers")]
    pub max_pooled_buffers: usize,
    /// Buffers that grew beyond this capacity are dropped instead of pooled.
    #[serde(default = "default_max_retained_capacity")]
    pub max_retained_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pooled_buffers: default_max_pooled_buffers(),
            max_retained_capacity: default_max_retained_capacity(),
        }
    }
}

/// Url-encoded form body limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormConfig {
    #[serde(default = "default_form_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_form_max_body_bytes(),
        }
    }
}

const fn default_json_max_body_bytes() -> u64 {
    8 << 20
}

const fn default_max_pooled_buffers() -> usize {
    64
}

const fn default_max_retained_capacity() -> usize {
    1 << 20
}

const fn default_form_max_body_bytes() -> u64 {
    10 << 20
}
