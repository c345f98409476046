use failure::Fail;

use crate::device::UniformFormat;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Backend: {}", _0)]
    Backend(String),
    #[fail(display = "Failed to create shader, errors: \n{}.", _0)]
    ShaderCreationFailure(String),
    #[fail(display = "Invalid settings: {}.", _0)]
    InvalidParams(String),
    #[fail(display = "Program {} is out of range.", _0)]
    ProgramOutOfRange(usize),
    #[fail(display = "Program {} is not loaded.", _0)]
    ProgramNotLoaded(usize),
    #[fail(display = "There is no program bound.")]
    NoProgramBound,
    #[fail(display = "Texture channel {} is out of range.", _0)]
    ChannelOutOfRange(usize),
    #[fail(display = "Too many uniform variables (>= {}).", _0)]
    TooManyUniforms(usize),
    #[fail(display = "Uniform {} is out of range.", _0)]
    UniformOutOfRange(usize),
    #[fail(display = "The uniform needs a {:?} instead of {:?}.", expected, actual)]
    UniformFormatMismatch {
        expected: UniformFormat,
        actual: UniformFormat,
    },
    #[fail(
        display = "The uniform needs {} floats instead of {}.",
        expected, actual
    )]
    UniformShapeMismatch { expected: usize, actual: usize },
    #[fail(
        display = "Material storage holds {} floats, {} required.",
        actual, required
    )]
    MaterialStorageTooSmall { required: usize, actual: usize },
    #[fail(display = "A polygon needs at least 3 vertices, got {}.", _0)]
    PolygonTooSmall(usize),
    #[fail(display = "Unknown blend factor 0x{:x}.", _0)]
    InvalidBlendFactor(u32),
    #[fail(display = "Render buffer holds {} quads, capacity is {}.", _0, _1)]
    BufferOverflow(usize, usize),
    #[fail(display = "Json: {}", _0)]
    Json(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Json(format!("{}", err))
    }
}
