//! Plain data shared between the render front-end and device backends.

use crate::errors::*;

impl_handle!(BufferHandle);
impl_handle!(LayoutHandle);
impl_handle!(ShaderHandle);
impl_handle!(TextureHandle);

/// The location of a uniform variable inside the currently bound shader. Unlike the
/// other handles, zero is a perfectly valid location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float,
    UShort,
    UByte,
}

impl VertexFormat {
    /// Size of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            VertexFormat::Float => 4,
            VertexFormat::UShort => 2,
            VertexFormat::UByte => 1,
        }
    }
}

/// Describes where a named attribute lives inside one vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub size: u8,
    pub format: VertexFormat,
    pub normalized: bool,
    pub offset: usize,
}

/// The primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
}

/// Uniform variable type, every variant is a contiguous run of floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformFormat {
    F32,
    Vector2f,
    Vector3f,
    Vector4f,
    Matrix3f,
    Matrix4f,
}

impl UniformFormat {
    /// Number of floats a value of this type occupies.
    pub fn size(self) -> usize {
        match self {
            UniformFormat::F32 => 1,
            UniformFormat::Vector2f => 2,
            UniformFormat::Vector3f => 3,
            UniformFormat::Vector4f => 4,
            UniformFormat::Matrix3f => 9,
            UniformFormat::Matrix4f => 16,
        }
    }
}

/// Blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
}

/// Premultiplied alpha, the blend mode every batch starts with.
pub const DEFAULT_BLEND: (BlendFactor, BlendFactor) =
    (BlendFactor::One, BlendFactor::OneMinusSrcAlpha);

impl BlendFactor {
    /// Converts a raw OpenGL blend factor enum.
    pub fn from_gl(v: u32) -> Option<BlendFactor> {
        match v {
            0 => Some(BlendFactor::Zero),
            1 => Some(BlendFactor::One),
            0x0300 => Some(BlendFactor::SrcColor),
            0x0301 => Some(BlendFactor::OneMinusSrcColor),
            0x0302 => Some(BlendFactor::SrcAlpha),
            0x0303 => Some(BlendFactor::OneMinusSrcAlpha),
            0x0304 => Some(BlendFactor::DstAlpha),
            0x0305 => Some(BlendFactor::OneMinusDstAlpha),
            0x0306 => Some(BlendFactor::DstColor),
            0x0307 => Some(BlendFactor::OneMinusDstColor),
            0x0308 => Some(BlendFactor::SrcAlphaSaturate),
            _ => None,
        }
    }

    /// Like `from_gl`, but reports unknown values as an error.
    pub fn try_from_gl(v: u32) -> Result<BlendFactor> {
        BlendFactor::from_gl(v).ok_or(Error::InvalidBlendFactor(v))
    }
}
