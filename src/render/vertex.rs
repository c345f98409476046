//! The packed vertex record shared by the batch buffer and the device vertex layout.

use byteorder::{ByteOrder, LittleEndian};

use crate::device::{VertexAttribute, VertexFormat};

/// Position and texture coordinate of one corner, as produced by sprite packs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VertexPack {
    pub vx: f32,
    pub vy: f32,
    pub tx: u16,
    pub ty: u16,
}

impl VertexPack {
    #[inline]
    pub fn new(vx: f32, vy: f32, tx: u16, ty: u16) -> Self {
        VertexPack { vx, vy, tx, ty }
    }
}

/// One vertex in the batch buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub vp: VertexPack,
    pub rgba: [u8; 4],
    pub add: [u8; 4],
}

impl Vertex {
    /// Size of one encoded vertex in bytes.
    pub const STRIDE: usize = 20;

    /// Attribute layout of the encoded vertex.
    pub const ATTRIBUTES: [VertexAttribute; 4] = [
        VertexAttribute {
            name: "position",
            size: 2,
            format: VertexFormat::Float,
            normalized: false,
            offset: 0,
        },
        VertexAttribute {
            name: "texcoord",
            size: 2,
            format: VertexFormat::UShort,
            normalized: true,
            offset: 8,
        },
        VertexAttribute {
            name: "color",
            size: 4,
            format: VertexFormat::UByte,
            normalized: true,
            offset: 12,
        },
        VertexAttribute {
            name: "additive",
            size: 4,
            format: VertexFormat::UByte,
            normalized: true,
            offset: 16,
        },
    ];

    /// Creates a vertex, `color` and `additive` are `0xAARRGGBB` colors.
    #[inline]
    pub fn new(vp: VertexPack, color: u32, additive: u32) -> Self {
        Vertex {
            vp,
            rgba: unpack_argb(color),
            add: unpack_argb(additive),
        }
    }

    /// Writes the little-endian encoding of this vertex into the first `STRIDE` bytes
    /// of `bytes`.
    pub fn encode(&self, bytes: &mut [u8]) {
        LittleEndian::write_f32(&mut bytes[0..4], self.vp.vx);
        LittleEndian::write_f32(&mut bytes[4..8], self.vp.vy);
        LittleEndian::write_u16(&mut bytes[8..10], self.vp.tx);
        LittleEndian::write_u16(&mut bytes[10..12], self.vp.ty);
        bytes[12..16].copy_from_slice(&self.rgba);
        bytes[16..20].copy_from_slice(&self.add);
    }
}

/// Splits a `0xAARRGGBB` color into `[r, g, b, a]` bytes.
#[inline]
pub fn unpack_argb(c: u32) -> [u8; 4] {
    [
        ((c >> 16) & 0xff) as u8,
        ((c >> 8) & 0xff) as u8,
        (c & 0xff) as u8,
        ((c >> 24) & 0xff) as u8,
    ]
}

/// Encodes a run of vertices into `bytes`, replacing its content.
pub fn encode_vertices(vertices: &[Vertex], bytes: &mut Vec<u8>) {
    bytes.clear();
    bytes.resize(vertices.len() * Vertex::STRIDE, 0);
    for (v, dst) in vertices.iter().zip(bytes.chunks_mut(Vertex::STRIDE)) {
        v.encode(dst);
    }
}
