pub use crate::device::headless::HeadlessDevice;
pub use crate::device::{BlendFactor, Device, TextureHandle, UniformFormat, DEFAULT_BLEND};
pub use crate::errors::{Error, Result};
pub use crate::render::{Material, RenderBuffer, RenderState, VertexPack};
pub use crate::screen::{Screen, ScreenTransform};
pub use crate::settings::{DeviceParams, RenderParams, Settings};
pub use crate::texture::{TextureId, TextureLookup, TextureTable};

#[cfg(not(target_arch = "wasm32"))]
pub use crate::device::gl::GLDevice;
