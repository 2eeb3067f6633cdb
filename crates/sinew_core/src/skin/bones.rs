use bytemuck::{Pod, Zeroable};
use glam::{Affine3A, Mat4};

/// Bone matrix as uploaded to the skinning shader: the top three rows of
/// the column-major transform, 48 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BoneTransform {
    pub rows: [[f32; 4]; 3],
}

impl BoneTransform {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };
}

impl From<Mat4> for BoneTransform {
    fn from(matrix: Mat4) -> Self {
        let rows = matrix.transpose();
        Self {
            rows: [
                rows.x_axis.to_array(),
                rows.y_axis.to_array(),
                rows.z_axis.to_array(),
            ],
        }
    }
}

impl From<Affine3A> for BoneTransform {
    fn from(affine: Affine3A) -> Self {
        Mat4::from(affine).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn identity_matches_glam() {
        assert_eq!(BoneTransform::from(Mat4::IDENTITY), BoneTransform::IDENTITY);
        assert_eq!(BoneTransform::SIZE, 48);
    }

    #[test]
    fn translation_lands_in_fourth_column() {
        let bone = BoneTransform::from(Affine3A::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(bone.rows[0][3], 1.0);
        assert_eq!(bone.rows[1][3], 2.0);
        assert_eq!(bone.rows[2][3], 3.0);
    }
}
