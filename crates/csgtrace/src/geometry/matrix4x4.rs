use bytemuck::{Pod, Zeroable};

use super::Vec3;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Matrix4x4 {
    // row-major
    pub data: [[f32; 4]; 4],
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Matrix4x4::identity()
    }
}

impl Matrix4x4 {
    pub fn identity() -> Self {
        Matrix4x4 {
            data: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[allow(clippy::too_many_arguments)]
    #[rustfmt::skip]
    pub fn create(a11: f32, a12: f32, a13: f32, a14: f32,
                  a21: f32, a22: f32, a23: f32, a24: f32,
                  a31: f32, a32: f32, a33: f32, a34: f32,
                  a41: f32, a42: f32, a43: f32, a44: f32) -> Self {
        Matrix4x4 {
            data: [[a11, a12, a13, a14],
                   [a21, a22, a23, a24],
                   [a31, a32, a33, a34],
                   [a41, a42, a43, a44]]
        }
    }

    pub fn matmul(a: Matrix4x4, b: Matrix4x4) -> Self {
        let mut m = Matrix4x4::identity();
        for i in 0..4 {
            for j in 0..4 {
                let mut dot = 0.0;
                for k in 0..4 {
                    dot += a.data[i][k] * b.data[k][j]
                }
                m.data[i][j] = dot;
            }
        }
        m
    }

    pub fn translation(direction: Vec3) -> Matrix4x4 {
        let mut me = Self::identity();
        me.data[0][3] = direction.0;
        me.data[1][3] = direction.1;
        me.data[2][3] = direction.2;

        me
    }

    pub fn scale(scale: Vec3) -> Matrix4x4 {
        let mut me = Self::identity();
        me.data[0][0] = scale.0;
        me.data[1][1] = scale.1;
        me.data[2][2] = scale.2;

        me
    }

    // right-handed, counter-clockwise looking down the axis towards the origin
    #[rustfmt::skip]
    pub fn rotation_x(theta: f32) -> Matrix4x4 {
        let (s, c) = theta.sin_cos();
        Matrix4x4::create(
            1.0, 0.0, 0.0, 0.0,
            0.0, c,   -s,  0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    #[rustfmt::skip]
    pub fn rotation_y(theta: f32) -> Matrix4x4 {
        let (s, c) = theta.sin_cos();
        Matrix4x4::create(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
            -s,  0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    #[rustfmt::skip]
    pub fn rotation_z(theta: f32) -> Matrix4x4 {
        let (s, c) = theta.sin_cos();
        Matrix4x4::create(
            c,   -s,  0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn approx_eq(&self, other: &Matrix4x4, eps: f32) -> bool {
        self.data
            .iter()
            .flatten()
            .zip(other.data.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Matrix4x4 {
    fn row(&self, i: usize) -> Vec3 {
        Vec3(self.data[i][0], self.data[i][1], self.data[i][2])
    }

    fn column(&self, j: usize) -> Vec3 {
        Vec3(self.data[0][j], self.data[1][j], self.data[2][j])
    }

    /// Homogeneous point transform, divided through by w
    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        let [a, b, c, w] = [0, 1, 2, 3].map(|i| Vec3::dot(self.row(i), p) + self.data[i][3]);
        Vec3(a / w, b / w, c / w)
    }

    /// Linear part only; translation does not affect directions
    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        Vec3(Vec3::dot(self.row(0), v), Vec3::dot(self.row(1), v), Vec3::dot(self.row(2), v))
    }

    // with the inverse matrix, maps local normals to world space
    pub fn apply_vector_transposed(&self, v: Vec3) -> Vec3 {
        Vec3(Vec3::dot(self.column(0), v), Vec3::dot(self.column(1), v), Vec3::dot(self.column(2), v))
    }
}
