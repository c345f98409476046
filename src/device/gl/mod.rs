//! OpenGL (ES 2 subset) backend. It assumes a current context, and expects the host
//! to hand over a function loader for the entry points.

mod types;
mod visitor;

pub use self::visitor::GLDevice;
