//! Threshold color scale shared by the legend and the map fill.

use crate::error::ChoroplethError;

/// Number of equal-width intervals the observed range is split into.
pub const BUCKETS: usize = 8;

/// Sequential "Blues" palette, light to dark (ColorBrewer, 9 classes).
pub const BLUES: [&str; BUCKETS + 1] = [
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
    boundaries: Vec<f64>,
}

impl ColorScale {
    /// Builds the scale from every observed attribute value. Non-finite values
    /// are ignored.
    pub fn from_values<I>(values: I) -> Result<Self, ChoroplethError>
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })
            .ok_or(ChoroplethError::EmptyDataset)?;

        let step = (max - min) / BUCKETS as f64;
        let boundaries = (0..BUCKETS).map(|i| min + i as f64 * step).collect();

        Ok(Self { min, max, boundaries })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Ascending bucket edges, starting at `min`.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Palette slot for `value`: the number of boundaries `<= value`, so a
    /// value sitting on an edge lands in the bucket that starts there.
    pub fn bucket(&self, value: f64) -> usize {
        self.boundaries.partition_point(|b| *b <= value)
    }

    pub fn color(&self, value: f64) -> &'static str {
        BLUES[self.bucket(value)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_10_74() -> ColorScale {
        ColorScale::from_values([42.0, 10.0, 74.0, 33.3]).unwrap()
    }

    #[test]
    fn boundaries_are_equal_width() {
        let scale = scale_10_74();
        assert_eq!(scale.min(), 10.0);
        assert_eq!(scale.max(), 74.0);
        assert_eq!(
            scale.boundaries(),
            &[10.0, 18.0, 26.0, 34.0, 42.0, 50.0, 58.0, 66.0]
        );
    }

    #[test]
    fn value_on_boundary_takes_higher_bucket() {
        let scale = scale_10_74();
        assert_eq!(scale.bucket(18.0), 2);
        assert_eq!(scale.color(18.0), BLUES[2]);
        assert_eq!(scale.bucket(17.999), 1);
        assert_eq!(scale.bucket(10.0), 1);
    }

    #[test]
    fn extremes() {
        let scale = scale_10_74();
        assert_eq!(scale.bucket(9.0), 0);
        assert_eq!(scale.bucket(66.0), 8);
        assert_eq!(scale.bucket(74.0), 8);
        assert_eq!(scale.bucket(1000.0), 8);
    }

    #[test]
    fn monotonic_over_range() {
        let scale = scale_10_74();
        let mut previous = 0;
        let mut v = scale.min();
        while v < scale.max() {
            let bucket = scale.bucket(v);
            assert!(bucket >= previous, "bucket dropped at {}", v);
            assert!(BLUES.contains(&scale.color(v)));
            previous = bucket;
            v += 0.25;
        }
    }

    #[test]
    fn rebuild_is_idempotent() {
        let values = vec![2.6, 13.1, 75.1, 19.4, 40.0];
        let a = ColorScale::from_values(values.clone()).unwrap();
        let b = ColorScale::from_values(values.clone()).unwrap();
        assert_eq!(a, b);
        for v in values {
            assert_eq!(a.color(v), b.color(v));
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            ColorScale::from_values(Vec::new()),
            Err(ChoroplethError::EmptyDataset)
        ));
        assert!(matches!(
            ColorScale::from_values([f64::NAN]),
            Err(ChoroplethError::EmptyDataset)
        ));
    }

    #[test]
    fn single_value_collapses_buckets() {
        let scale = ColorScale::from_values([5.0, 5.0]).unwrap();
        assert!(scale.boundaries().iter().all(|b| *b == 5.0));
        assert_eq!(scale.color(5.0), BLUES[8]);
        assert_eq!(scale.color(4.9), BLUES[0]);
    }
}
