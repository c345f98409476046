//! # What is This?
//!
//! `crayon-batch` is the render front-end of a 2d sprite renderer. It sits between the
//! sprite/label layers that pack vertices and a low-level video device, and its only job
//! is to keep the number of draw calls down.
//!
//! Quads and polygon fans submitted through a [`RenderState`](render/struct.RenderState.html)
//! are appended into a shared batch buffer. As long as the shader program, the textures
//! bound to every channel and the blend mode stay the same, nothing is sent to the device.
//! Any setter that would change one of those states flushes the pending batch first, so
//! a flushed batch is always homogeneous and could be drawn with one indexed draw call
//! against a shared, pre-filled index buffer.
//!
//! Programs carry a small typed uniform table. `Material`s hold per-draw uniform values
//! and texture bindings laid out against that table, and applying the same material twice
//! in a row is deduplicated.
//!
//! The video device itself is abstracted behind the [`Device`](device/trait.Device.html)
//! trait, with an OpenGL implementation and a headless one that records commands.

extern crate byteorder;
extern crate cgmath;
extern crate failure;
#[cfg(not(target_arch = "wasm32"))]
extern crate gl;
#[macro_use]
extern crate log;
extern crate serde;
extern crate serde_json;
extern crate smallvec;

#[macro_use]
pub mod utils;
pub mod errors;
pub mod settings;

pub mod device;
pub mod render;
pub mod screen;
pub mod texture;

pub mod prelude;
