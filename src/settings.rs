//! Functions for loading render settings.

use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::render::MAX_PROGRAM;

/// The largest batch whose vertices could still be addressed with `u16` indices.
pub const MAX_COMBINE_LIMIT: usize = 16384;

/// A structure containing configuration data for the render state and the video
/// device underneath it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub render: RenderParams,
    pub device: DeviceParams,
}

impl Settings {
    /// Parses settings from a json document. Missing fields fall back to defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.render.validate()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RenderParams {
    /// The maximum number of quads that would be combined into one draw call.
    pub max_combine: usize,
    /// The program slot used to draw pre-batched render buffers.
    pub buffer_program: usize,
}

impl Default for RenderParams {
    fn default() -> Self {
        RenderParams {
            max_combine: 1024,
            buffer_program: 1,
        }
    }
}

impl RenderParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_combine == 0 || self.max_combine > MAX_COMBINE_LIMIT {
            return Err(Error::InvalidParams(format!(
                "max_combine must be in [1, {}], got {}",
                MAX_COMBINE_LIMIT, self.max_combine
            )));
        }

        if self.buffer_program >= MAX_PROGRAM {
            return Err(Error::InvalidParams(format!(
                "buffer_program must be less than {}, got {}",
                MAX_PROGRAM, self.buffer_program
            )));
        }

        Ok(())
    }
}

/// Capacity limits of the video device.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DeviceParams {
    pub max_buffer: usize,
    pub max_layout: usize,
    pub max_shader: usize,
}

impl Default for DeviceParams {
    fn default() -> Self {
        DeviceParams {
            max_buffer: 128,
            max_layout: 4,
            max_shader: MAX_PROGRAM,
        }
    }
}
