//! Commonly used utilities.

#[macro_use]
pub mod handle;

pub use self::handle::HandleIndex;
