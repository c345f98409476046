//! The batching render front-end.
//!
//! A [`RenderState`](struct.RenderState.html) owns the video device, a fixed table of
//! shader programs and one shared batch buffer. Quads are appended into the batch until
//! the program, a texture channel or the blend mode changes, or until the batch is full.
//! Only then the batch is uploaded and drawn with one indexed draw call.
//!
//! ```rust
//! use crayon_batch::prelude::*;
//!
//! let device = HeadlessDevice::new(DeviceParams::default());
//! let mut state = RenderState::new(device, Settings::default()).unwrap();
//!
//! let vs = "attribute vec2 position; uniform vec4 color;";
//! let fs = "void main() {}";
//! state.load_program(0, vs, fs, 1).unwrap();
//! state.set_program(0).unwrap();
//!
//! let quad = [
//!     VertexPack::new(0.0, 0.0, 0, 0),
//!     VertexPack::new(1.0, 0.0, 1, 0),
//!     VertexPack::new(1.0, 1.0, 1, 1),
//!     VertexPack::new(0.0, 1.0, 0, 1),
//! ];
//!
//! state.draw(&quad, 0xFFFF_FFFF, 0).unwrap();
//! state.draw(&quad, 0xFFFF_FFFF, 0).unwrap();
//! state.flush().unwrap();
//!
//! // Both quads went out in one draw call.
//! assert_eq!(state.drawcall_count(), 1);
//! ```

pub mod buffer;
pub mod material;
pub mod polygon;
pub mod program;
pub mod vertex;

mod state;

pub use self::buffer::RenderBuffer;
pub use self::material::{Material, MaterialId};
pub use self::polygon::QuadFan;
pub use self::program::{Uniform, UniformLayout};
pub use self::state::RenderState;
pub use self::vertex::{Vertex, VertexPack};

/// Number of program slots.
pub const MAX_PROGRAM: usize = 16;
/// Maximum number of uniform variables per program.
pub const MAX_UNIFORM: usize = 16;
/// Number of texture channels.
pub const MAX_TEXTURE_CHANNEL: usize = 8;
