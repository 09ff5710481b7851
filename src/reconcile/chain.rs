//! Zero floor and percentage-change chain shared by every reconciliation pass.

use crate::domain::TimeSeries;

/// Read a raw value of exactly zero as one, so every ratio in the chain is
/// defined.
pub fn zero_floor(value: f64) -> f64 {
    if value == 0.0 { 1.0 } else { value }
}

/// Multiplicative links between consecutive zero-floored raw values.
///
/// `ratio(i) = floored[i] / floored[i - 1]`, undefined at `i = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct PctChain {
    floored: Vec<f64>,
}

impl PctChain {
    pub fn from_series(series: &TimeSeries) -> Self {
        Self::from_values(series.samples.iter().map(|s| s.raw_value))
    }

    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            floored: values.into_iter().map(zero_floor).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.floored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.floored.is_empty()
    }

    pub fn floored(&self, i: usize) -> Option<f64> {
        self.floored.get(i).copied()
    }

    pub fn ratio(&self, i: usize) -> Option<f64> {
        if i == 0 || i >= self.floored.len() {
            return None;
        }
        Some(self.floored[i] / self.floored[i - 1])
    }

    /// Carry the value at `i - 1` forward to `i`.
    pub fn forward(&self, prev: f64, i: usize) -> Option<f64> {
        self.ratio(i).map(|r| prev * r)
    }

    /// Carry the value at `i` back to `i - 1`.
    pub fn backward(&self, known: f64, i: usize) -> Option<f64> {
        self.ratio(i).map(|r| known / r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_in_daily_values_never_divides_by_zero() {
        let raw = [40.0, 42.0, 41.0, 39.0, 44.0, 0.0, 37.0, 35.0];
        let chain = PctChain::from_values(raw);

        assert_eq!(chain.floored(5), Some(1.0));
        assert_eq!(chain.ratio(5), Some(1.0 / 44.0));
        assert_eq!(chain.ratio(6), Some(37.0 / 1.0));
        for i in 1..chain.len() {
            let r = chain.ratio(i).unwrap();
            assert!(r.is_finite() && r > 0.0, "ratio {i} = {r}");
        }
    }

    #[test]
    fn ratio_undefined_at_start_and_past_end() {
        let chain = PctChain::from_values([10.0, 20.0]);
        assert_eq!(chain.ratio(0), None);
        assert_eq!(chain.ratio(1), Some(2.0));
        assert_eq!(chain.ratio(2), None);
    }

    #[test]
    fn forward_and_backward_are_inverse() {
        let chain = PctChain::from_values([25.0, 75.0, 0.0, 60.0]);
        let forward = chain.forward(12.0, 1).unwrap();
        assert!((forward - 36.0).abs() < 1e-12);
        let back = chain.backward(forward, 1).unwrap();
        assert!((back - 12.0).abs() < 1e-12);
        assert_eq!(chain.forward(5.0, 3), Some(300.0));
    }
}
