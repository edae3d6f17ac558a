// Fixed-width histogram: bin = floor(value / width) * width, ascending by bin start.

use std::collections::BTreeMap;

use crate::models::HistogramBin;

/// Non-finite values are skipped. `width` must be > 0 (validated in config).
pub fn histogram(values: impl IntoIterator<Item = f64>, width: f64) -> Vec<HistogramBin> {
    let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
    for v in values {
        if !v.is_finite() {
            continue;
        }
        let index = (v / width).floor() as i64;
        *counts.entry(index).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(index, count)| {
            let bin_start = index as f64 * width;
            HistogramBin {
                bin_start,
                bin_end: bin_start + width,
                count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_are_sorted_and_floor_negative_values() {
        let bins = histogram([12.0, -0.5, 3.0, 14.9, 0.0, f64::NAN], 5.0);
        let starts: Vec<f64> = bins.iter().map(|b| b.bin_start).collect();
        assert_eq!(starts, vec![-5.0, 0.0, 10.0]);
        let counts: Vec<u64> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 2, 2]);
        assert_eq!(bins[2].bin_end, 15.0);
    }

    #[test]
    fn empty_input_yields_no_bins() {
        assert!(histogram(std::iter::empty(), 1.0).is_empty());
    }

    #[test]
    fn value_on_boundary_opens_next_bin() {
        let bins = histogram([5.0], 5.0);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].bin_start, 5.0);
        assert_eq!(bins[0].bin_end, 10.0);
    }
}
