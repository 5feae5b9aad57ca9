/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies general-purpose slice helpers: argsort, argmin, argmax, and median.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

/// Returns the indices that would sort the input slice.
///
/// # Examples
///
/// ```
/// use sphertex_utils::argsort;
///
/// let data = [30, 10, 20];
///
/// let sorted_indices = argsort(&data);
///
/// assert_eq!(sorted_indices, vec![1, 2, 0]);
/// ```
#[inline(always)]
pub fn argsort<T: PartialOrd>(data: &[T]) -> Vec<usize> {
    let mut indices = (0..data.len()).collect::<Vec<_>>();
    indices.sort_by(|&i, &j| {
        data[i]
            .partial_cmp(&data[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Returns the index of the minimum value.
#[inline(always)]
pub fn argmin<T: PartialOrd + Copy>(data: &[T]) -> usize {
    assert!(!data.is_empty(), "Data slice cannot be empty");

    let mut min_index = 0;
    let mut min_value = data[0];

    for (idx, &value) in data.iter().enumerate().skip(1) {
        if value < min_value {
            min_value = value;
            min_index = idx;
        }
    }

    min_index
}

/// Returns the index of the maximum value.
#[inline(always)]
pub fn argmax<T: PartialOrd + Copy>(data: &[T]) -> usize {
    assert!(!data.is_empty(), "Data slice cannot be empty");

    let mut max_index = 0;
    let mut max_value = data[0];

    for (idx, &value) in data.iter().enumerate().skip(1) {
        if value > max_value {
            max_value = value;
            max_index = idx;
        }
    }

    max_index
}

/// Returns the median of a slice of floats.
///
/// The input is copied and sorted; for an even count the mean of the two
/// middle elements is returned.
#[inline(always)]
pub fn median(data: &[f64]) -> f64 {
    assert!(!data.is_empty(), "Data slice cannot be empty");

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    match n % 2 {
        1 => sorted[n / 2],
        _ => 0.5 * (sorted[n / 2 - 1] + sorted[n / 2]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argsort_handles_duplicates() {
        let data = [2.0, 1.0, 2.0, 0.5];
        let idx = argsort(&data);
        assert_eq!(idx[0], 3);
        assert_eq!(idx[1], 1);
    }

    #[test]
    fn argmin_argmax_basic() {
        let data = [3.0, -1.0, 7.0, 2.0];
        assert_eq!(argmin(&data), 1);
        assert_eq!(argmax(&data), 2);
    }

    #[test]
    fn argmax_handles_all_negative_values() {
        let data = [-3.0, -1.0, -7.0];
        assert_eq!(argmax(&data), 1);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
    }
}
