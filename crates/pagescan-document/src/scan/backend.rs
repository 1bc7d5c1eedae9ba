// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective backends — homography solving and raster warping.
//
// `PerspectiveBackend` solves the homography taking four points onto four
// points and warps a raster through it.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use pagescan_core::error::{Result, ScanError};
use pagescan_core::Point2D;
use tracing::{debug, instrument};

/// Background colour for destination pixels that map outside the source.
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// A planar perspective transform, stored as a row-major 3x3 matrix mapping
/// source coordinates to destination coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    matrix: Matrix3<f64>,
}

impl Homography {
    /// Wrap a row-major 3x3 matrix.
    pub fn from_row_major(m: [f64; 9]) -> Self {
        Self {
            matrix: Matrix3::from_row_slice(&m),
        }
    }

    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Row-major matrix entries, scaled so that the bottom-right entry is 1
    /// whenever it is not (close to) zero.
    pub fn to_row_major(&self) -> [f64; 9] {
        let m = self.normalized().matrix;
        [
            m[(0, 0)], m[(0, 1)], m[(0, 2)],
            m[(1, 0)], m[(1, 1)], m[(1, 2)],
            m[(2, 0)], m[(2, 1)], m[(2, 2)],
        ]
    }

    fn normalized(&self) -> Self {
        let h22 = self.matrix[(2, 2)];
        if h22.abs() > f64::EPSILON {
            Self {
                matrix: self.matrix / h22,
            }
        } else {
            *self
        }
    }

    /// Map a point; `None` when it lands on the line at infinity.
    pub fn apply(&self, p: Point2D) -> Option<Point2D> {
        let v = self.matrix * Vector3::new(p.x, p.y, 1.0);
        if v.z.abs() < 1e-12 {
            return None;
        }
        Some(Point2D::new(v.x / v.z, v.y / v.z))
    }

    /// The transform mapping destination coordinates back to the source.
    pub fn inverse(&self) -> Result<Self> {
        self.matrix
            .try_inverse()
            .map(|matrix| Self { matrix })
            .ok_or_else(|| ScanError::DegenerateGeometry("homography is not invertible".into()))
    }

    fn ensure_finite(self) -> Result<Self> {
        if self.matrix.iter().all(|v| v.is_finite()) {
            Ok(self)
        } else {
            Err(ScanError::DegenerateGeometry(
                "homography solve produced non-finite entries".into(),
            ))
        }
    }
}

/// Solve and apply perspective transforms.
pub trait PerspectiveBackend {
    /// Solve the homography mapping each `from[i]` onto `to[i]`.
    fn solve(&self, from: &[Point2D; 4], to: &[Point2D; 4]) -> Result<Homography>;

    /// Warp `image` through `homography` (source to destination) into a new
    /// `width` x `height` raster with bilinear sampling. Destination pixels
    /// that fall outside the source are [`BACKGROUND`].
    fn warp(
        &self,
        image: &RgbImage,
        homography: &Homography,
        width: u32,
        height: u32,
    ) -> Result<RgbImage>;
}

// -- imageproc backend --------------------------------------------------------

/// Default backend: direct 8x8 linear solve (`nalgebra` LU) and
/// `imageproc::geometric_transformations::warp_into` for resampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocBackend;

impl PerspectiveBackend for ImageprocBackend {
    fn solve(&self, from: &[Point2D; 4], to: &[Point2D; 4]) -> Result<Homography> {
        // Fix h22 = 1 and solve the remaining 8 unknowns:
        //   u = (h0 x + h1 y + h2) / (h6 x + h7 y + 1)
        //   v = (h3 x + h4 y + h5) / (h6 x + h7 y + 1)
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for i in 0..4 {
            let (x, y) = (from[i].x, from[i].y);
            let (u, v) = (to[i].x, to[i].y);

            a[(i, 0)] = x;
            a[(i, 1)] = y;
            a[(i, 2)] = 1.0;
            a[(i, 6)] = -u * x;
            a[(i, 7)] = -u * y;
            b[i] = u;

            a[(i + 4, 3)] = x;
            a[(i + 4, 4)] = y;
            a[(i + 4, 5)] = 1.0;
            a[(i + 4, 6)] = -v * x;
            a[(i + 4, 7)] = -v * y;
            b[i + 4] = v;
        }

        let h = a.lu().solve(&b).ok_or_else(|| {
            ScanError::DegenerateGeometry("point correspondences admit no unique homography".into())
        })?;

        Homography::from_row_major([h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0])
            .ensure_finite()
    }

    #[instrument(skip(self, image, homography), fields(src_w = image.width(), src_h = image.height()))]
    fn warp(
        &self,
        image: &RgbImage,
        homography: &Homography,
        width: u32,
        height: u32,
    ) -> Result<RgbImage> {
        let m = homography.to_row_major().map(|v| v as f32);
        let projection = Projection::from_matrix(m).ok_or_else(|| {
            ScanError::DegenerateGeometry("homography is not invertible in single precision".into())
        })?;

        let mut output = RgbImage::new(width, height);
        warp_into(image, &projection, Interpolation::Bilinear, BACKGROUND, &mut output);
        debug!(width, height, "Warp complete");
        Ok(output)
    }
}

// -- Reference backend --------------------------------------------------------

/// Reference numeric backend: normalised DLT solved through the null space of
/// `AᵀA`, and a straightforward inverse-mapping bilinear warp.
///
/// Shares no code with [`ImageprocBackend`]; tests compare the two.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceBackend;

impl ReferenceBackend {
    /// Similarity transform moving the centroid to the origin and the mean
    /// distance from it to sqrt(2).
    fn normalizing_transform(points: &[Point2D; 4]) -> Matrix3<f64> {
        let cx = points.iter().map(|p| p.x).sum::<f64>() / 4.0;
        let cy = points.iter().map(|p| p.y).sum::<f64>() / 4.0;
        let mean_dist = points
            .iter()
            .map(|p| (p.x - cx).hypot(p.y - cy))
            .sum::<f64>()
            / 4.0;
        let s = if mean_dist > f64::EPSILON {
            std::f64::consts::SQRT_2 / mean_dist
        } else {
            1.0
        };
        Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
    }

    fn transform(t: &Matrix3<f64>, p: &Point2D) -> (f64, f64) {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        (v.x / v.z, v.y / v.z)
    }
}

impl PerspectiveBackend for ReferenceBackend {
    fn solve(&self, from: &[Point2D; 4], to: &[Point2D; 4]) -> Result<Homography> {
        let t_from = Self::normalizing_transform(from);
        let t_to = Self::normalizing_transform(to);

        let mut a = SMatrix::<f64, 8, 9>::zeros();
        for i in 0..4 {
            let (x, y) = Self::transform(&t_from, &from[i]);
            let (u, v) = Self::transform(&t_to, &to[i]);

            a[(2 * i, 0)] = x;
            a[(2 * i, 1)] = y;
            a[(2 * i, 2)] = 1.0;
            a[(2 * i, 6)] = -u * x;
            a[(2 * i, 7)] = -u * y;
            a[(2 * i, 8)] = -u;

            a[(2 * i + 1, 3)] = x;
            a[(2 * i + 1, 4)] = y;
            a[(2 * i + 1, 5)] = 1.0;
            a[(2 * i + 1, 6)] = -v * x;
            a[(2 * i + 1, 7)] = -v * y;
            a[(2 * i + 1, 8)] = -v;
        }

        // h spans the null space of A: the eigenvector of AᵀA with the
        // smallest eigenvalue.
        let ata = a.transpose() * a;
        let eigen = ata.symmetric_eigen();
        let (min_idx, _) = eigen
            .eigenvalues
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, &v)| if v < best.1 { (i, v) } else { best });

        // A second (near-)zero eigenvalue means the solution is not unique.
        let mut sorted: Vec<f64> = eigen.eigenvalues.iter().map(|v| v.abs()).collect();
        sorted.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
        if sorted[1] <= sorted[8] * 1e-12 {
            return Err(ScanError::DegenerateGeometry(
                "point correspondences admit no unique homography".into(),
            ));
        }

        let h = eigen.eigenvectors.column(min_idx);
        let normalized = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

        let t_to_inv = t_to.try_inverse().ok_or_else(|| {
            ScanError::DegenerateGeometry("destination points are degenerate".into())
        })?;
        let matrix = t_to_inv * normalized * t_from;

        Homography { matrix }.normalized().ensure_finite()
    }

    fn warp(
        &self,
        image: &RgbImage,
        homography: &Homography,
        width: u32,
        height: u32,
    ) -> Result<RgbImage> {
        let inverse = homography.inverse()?.matrix;
        let (src_w, src_h) = image.dimensions();
        let max_x = src_w as f64 - 1.0;
        let max_y = src_h as f64 - 1.0;

        let output = RgbImage::from_fn(width, height, |x, y| {
            let v = inverse * Vector3::new(x as f64, y as f64, 1.0);
            if v.z.abs() < 1e-12 {
                return BACKGROUND;
            }
            let sx = v.x / v.z;
            let sy = v.y / v.z;
            if !(sx >= 0.0 && sy >= 0.0 && sx <= max_x && sy <= max_y) {
                return BACKGROUND;
            }

            let x0 = sx.floor() as u32;
            let y0 = sy.floor() as u32;
            let x1 = (x0 + 1).min(src_w - 1);
            let y1 = (y0 + 1).min(src_h - 1);
            let fx = sx - x0 as f64;
            let fy = sy - y0 as f64;

            let p00 = image.get_pixel(x0, y0);
            let p10 = image.get_pixel(x1, y0);
            let p01 = image.get_pixel(x0, y1);
            let p11 = image.get_pixel(x1, y1);

            let channel = |c: usize| -> u8 {
                let value = (1.0 - fx) * (1.0 - fy) * p00[c] as f64
                    + fx * (1.0 - fy) * p10[c] as f64
                    + (1.0 - fx) * fy * p01[c] as f64
                    + fx * fy * p11[c] as f64;
                value.round().clamp(0.0, 255.0) as u8
            };
            Rgb([channel(0), channel(1), channel(2)])
        });

        Ok(output)
    }
}
