//! Cross-sectional percentile ranks.
//!
//! rank(x) = average 1-based position of x among sorted values / n.
//! Ties share the average position, so results lie in (0, 1] and higher
//! values always rank higher.

pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }
        // positions i+1..=j share their mean
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for item in &indexed[i..j] {
            ranks[item.0] = avg_rank / n as f64;
        }
        i = j;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_values() {
        let ranks = percentile_ranks(&[0.3, 0.1, 0.2, 0.4]);
        assert_eq!(ranks, vec![0.75, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn ties_share_average() {
        let ranks = percentile_ranks(&[1.0, 2.0, 2.0, 3.0]);
        assert_eq!(ranks, vec![0.25, 0.625, 0.625, 1.0]);
    }

    #[test]
    fn single_value_is_top() {
        assert_eq!(percentile_ranks(&[-5.0]), vec![1.0]);
    }

    #[test]
    fn empty() {
        assert!(percentile_ranks(&[]).is_empty());
    }
}
