//! Uniform values and CPU-side staging for uniform blocks.

use std::fmt;

use glam::{Mat3, Mat4, Vec3, Vec4};

use super::shader_compiler::{UniformBlockLayout, UniformKind};

/// A value for a named uniform write.
///
/// The tagged-union form of the classic overloaded `set_uniform` family:
/// one variant per settable kind, with an explicit transpose flag on the
/// matrix variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// 32-bit float.
    F32(f32),
    /// 32-bit signed integer.
    I32(i32),
    /// 32-bit unsigned integer.
    U32(u32),
    /// Three-component float vector.
    Vec3(Vec3),
    /// Four-component float vector.
    Vec4(Vec4),
    /// 3×3 float matrix.
    Mat3 {
        /// The matrix, column-major.
        value: Mat3,
        /// Transpose before writing.
        transpose: bool,
    },
    /// 4×4 float matrix.
    Mat4 {
        /// The matrix, column-major.
        value: Mat4,
        /// Transpose before writing.
        transpose: bool,
    },
}

impl UniformValue {
    /// The kind tag of this value.
    #[must_use]
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::F32(_) => UniformKind::F32,
            Self::I32(_) => UniformKind::I32,
            Self::U32(_) => UniformKind::U32,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::Mat3 { .. } => UniformKind::Mat3,
            Self::Mat4 { .. } => UniformKind::Mat4,
        }
    }
}

/// Errors surfaced by strict-mode uniform writes.
///
/// With strict mode off (the default) these conditions are silent no-ops,
/// mirroring the underlying graphics APIs' behavior for unknown uniform
/// names.
#[derive(Debug)]
pub enum UniformError {
    /// The name does not exist in the linked program.
    UnknownName(String),
    /// The name exists but holds a different kind.
    KindMismatch {
        /// The uniform name.
        name: String,
        /// The kind the program declares.
        expected: UniformKind,
        /// The kind that was written.
        got: UniformKind,
    },
}

impl fmt::Display for UniformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownName(name) => {
                write!(f, "uniform '{name}' does not exist in the program")
            }
            Self::KindMismatch { name, expected, got } => write!(
                f,
                "uniform '{name}' is {expected:?} but was written as {got:?}"
            ),
        }
    }
}

impl std::error::Error for UniformError {}

/// CPU staging for one uniform block, flushed to its GPU buffer on
/// program activation.
pub(crate) struct UniformBlock {
    pub(crate) layout: UniformBlockLayout,
    pub(crate) data: Vec<u8>,
    pub(crate) dirty: bool,
}

impl UniformBlock {
    pub(crate) fn new(layout: UniformBlockLayout) -> Self {
        let data = vec![0; layout.size as usize];
        Self {
            layout,
            data,
            // Written once at startup so zero-initialized blocks reach
            // the GPU even if no uniform is ever set.
            dirty: true,
        }
    }

    /// Write `value` at `offset`, honoring buffer layout: mat3 columns
    /// are padded to a 16-byte stride, everything else is contiguous.
    pub(crate) fn write(&mut self, offset: u32, value: &UniformValue) {
        let at = offset as usize;
        match value {
            UniformValue::F32(v) => self.put(at, &v.to_le_bytes()),
            UniformValue::I32(v) => self.put(at, &v.to_le_bytes()),
            UniformValue::U32(v) => self.put(at, &v.to_le_bytes()),
            UniformValue::Vec3(v) => self.put(at, bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec4(v) => self.put(at, bytemuck::cast_slice(&v.to_array())),
            UniformValue::Mat3 { value, transpose } => {
                let m = if *transpose { value.transpose() } else { *value };
                for (i, col) in [m.x_axis, m.y_axis, m.z_axis].iter().enumerate() {
                    self.put(at + i * 16, bytemuck::cast_slice(&col.to_array()));
                }
            }
            UniformValue::Mat4 { value, transpose } => {
                let m = if *transpose { value.transpose() } else { *value };
                self.put(at, bytemuck::cast_slice(&m.to_cols_array()));
            }
        }
        self.dirty = true;
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        debug_assert!(end <= self.data.len(), "uniform write past block end");
        if end <= self.data.len() {
            self.data[offset..end].copy_from_slice(bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(size: u64) -> UniformBlock {
        UniformBlock::new(UniformBlockLayout {
            name: "test".into(),
            binding: 0,
            size,
        })
    }

    /// Read back the f32 at float index `i`, independent of the staging
    /// buffer's allocation alignment.
    fn f32_at(b: &UniformBlock, i: usize) -> f32 {
        let at = i * 4;
        f32::from_le_bytes([b.data[at], b.data[at + 1], b.data[at + 2], b.data[at + 3]])
    }

    fn floats(b: &UniformBlock, range: std::ops::Range<usize>) -> Vec<f32> {
        range.map(|i| f32_at(b, i)).collect()
    }

    #[test]
    fn scalar_and_vector_writes_land_at_offsets() {
        let mut b = block(48);
        b.dirty = false;

        b.write(0, &UniformValue::F32(1.0));
        b.write(16, &UniformValue::Vec3(Vec3::new(2.0, 3.0, 4.0)));
        b.write(32, &UniformValue::Vec4(Vec4::new(5.0, 6.0, 7.0, 8.0)));

        assert!(b.dirty);
        assert_eq!(f32_at(&b, 0), 1.0);
        assert_eq!(floats(&b, 4..7), vec![2.0, 3.0, 4.0]);
        assert_eq!(floats(&b, 8..12), vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn integer_writes_preserve_bit_patterns() {
        let mut b = block(16);
        b.write(0, &UniformValue::I32(-7));
        b.write(4, &UniformValue::U32(0xDEAD_BEEF));

        assert_eq!(i32::from_le_bytes([b.data[0], b.data[1], b.data[2], b.data[3]]), -7);
        assert_eq!(
            u32::from_le_bytes([b.data[4], b.data[5], b.data[6], b.data[7]]),
            0xDEAD_BEEF
        );
    }

    #[test]
    fn mat3_columns_use_sixteen_byte_stride() {
        let mut b = block(48);
        let m = Mat3::from_cols(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        b.write(0, &UniformValue::Mat3 { value: m, transpose: false });

        assert_eq!(floats(&b, 0..3), vec![1.0, 2.0, 3.0]);
        assert_eq!(floats(&b, 4..7), vec![4.0, 5.0, 6.0]);
        assert_eq!(floats(&b, 8..11), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn mat4_is_contiguous_and_transpose_flag_applies() {
        let mut b = block(64);
        let m = Mat4::from_cols(
            Vec4::new(1.0, 2.0, 3.0, 4.0),
            Vec4::new(5.0, 6.0, 7.0, 8.0),
            Vec4::new(9.0, 10.0, 11.0, 12.0),
            Vec4::new(13.0, 14.0, 15.0, 16.0),
        );
        b.write(0, &UniformValue::Mat4 { value: m, transpose: false });
        assert_eq!(floats(&b, 0..16), m.to_cols_array().to_vec());

        b.write(0, &UniformValue::Mat4 { value: m, transpose: true });
        assert_eq!(floats(&b, 0..16), m.transpose().to_cols_array().to_vec());
    }

    #[test]
    fn value_kinds_match_variants() {
        assert_eq!(UniformValue::F32(0.0).kind(), UniformKind::F32);
        assert_eq!(
            UniformValue::Mat3 { value: Mat3::IDENTITY, transpose: false }.kind(),
            UniformKind::Mat3
        );
    }
}
