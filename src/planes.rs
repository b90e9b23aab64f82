//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane starting at an arbitrary
//! origin and stepping by a fixed scale per pixel on each axis.
use num::Complex;

use crate::error::{Error, Result};

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the x, y of a pixel on the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels of the integral plane onto the complex plane.  Every
/// rank holds its own copy; nothing here is ever mutated after
/// construction, so the mapping of a pixel is the same on every rank.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneMapper {
    /// The right-upper hand corner of the integral cartesian plane.
    /// The left-lower is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The complex number pixel 0,0 maps onto.
    pub origin: Complex<f64>,
    /// How far one pixel steps along the real and the imaginary axis.
    pub scale: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane, the complex
    /// point pixel 0,0 maps onto, and the per-pixel step on each axis.
    pub fn new(
        width: usize,
        height: usize,
        origin: Complex<f64>,
        scale: (f64, f64),
    ) -> Result<PlaneMapper> {
        if width == 0 || height == 0 {
            return Err(Error::Config(format!(
                "the integral plane {}x{} has no pixels",
                width, height
            )));
        }
        let finite = |v: f64| v.is_finite() && v != 0.0;
        if !(finite(scale.0) && finite(scale.1)) {
            return Err(Error::Config(format!(
                "the scale {:?} must be finite and non-zero",
                scale
            )));
        }
        if !(origin.re.is_finite() && origin.im.is_finite()) {
            return Err(Error::Config(format!("the origin {} is not finite", origin)));
        }
        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            origin,
            scale,
        })
    }

    /// Builds the mapping from the two corners of a rectangle on the
    /// complex plane.  The left-lower corner becomes the origin.
    pub fn from_corners(
        width: usize,
        height: usize,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
    ) -> Result<PlaneMapper> {
        if rightupper.re <= leftlower.re {
            return Err(Error::Config(
                "The left lower corner is not to the left of the right upper corner.".to_string(),
            ));
        }

        if rightupper.im <= leftlower.im {
            return Err(Error::Config(
                "The left lower corner is not lower than the right upper corner".to_string(),
            ));
        }

        let scale = (
            (rightupper.re - leftlower.re) / (width as f64),
            (rightupper.im - leftlower.im) / (height as f64),
        );
        PlaneMapper::new(width, height, leftlower, scale)
    }

    /// Pixels per row.
    pub fn width(&self) -> usize {
        self.integral_plane.0
    }

    /// Rows in the plane.
    pub fn height(&self) -> usize {
        self.integral_plane.1
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Given a pixel on the integral cartesian plane, map it onto the
    /// complex cartesian plane.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.origin.re + (pixel.0 as f64) * self.scale.0,
            self.origin.im + (pixel.1 as f64) * self.scale.1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planemapper_fails_on_bad_shape() {
        let pm = PlaneMapper::from_corners(4, 4, Complex::new(-1.0, 1.0), Complex::new(1.0, -1.0));
        assert!(pm.is_err());
    }

    #[test]
    fn planemapper_passes_on_good_shape() {
        let pm = PlaneMapper::from_corners(4, 4, Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0));
        assert!(pm.is_ok());
    }

    #[test]
    fn planemapper_fails_on_empty_plane() {
        let pm = PlaneMapper::new(0, 4, Complex::new(0.0, 0.0), (1.0, 1.0));
        assert!(pm.is_err());
    }

    #[test]
    fn planemapper_fails_on_zero_scale() {
        let pm = PlaneMapper::new(4, 4, Complex::new(0.0, 0.0), (0.0, 1.0));
        assert!(pm.is_err());
    }

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let pm = PlaneMapper::from_corners(5, 5, Complex::new(0.0, 0.0), Complex::new(5.0, 5.0))
            .unwrap();
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(2.0, 2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(4.0, 4.0));
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let pm = PlaneMapper::from_corners(4, 4, Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0))
            .unwrap();
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(2.0, 2.0));
    }

    #[test]
    fn origin_and_scale_match_the_classic_view() {
        let pm = PlaneMapper::new(1024, 1024, Complex::new(-2.0, -1.125), (3.0 / 1024.0, 2.25 / 1024.0))
            .unwrap();
        assert_eq!(pm.len(), 1024 * 1024);
        assert_eq!(pm.pixel_to_point(&Pixel(512, 512)), Complex::new(-0.5, 0.0));
    }
}
