use simcore::{MarkerEvaluator, OutputTable};

use crate::takeoff::CONTACT_THRESHOLD;

/// First sample at which any marker is below the contact threshold.
pub fn find_contact<M: MarkerEvaluator>(table: &OutputTable, markers: &M) -> Option<usize> {
    (0..table.len()).find(|&k| {
        let q: Vec<f64> = table.sample(k).iter().copied().collect();
        markers.evaluate(&q).min_height() < CONTACT_THRESHOLD
    })
}

/// Number of samples kept when contact happens at `contact`: everything up
/// to and including the contact sample.
pub fn kept_samples(total: usize, contact: Option<usize>) -> usize {
    contact.map_or(total, |k| (k + 1).min(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use simcore::MarkerPositions;

    /// One marker at the height of DOF 0.
    fn point(q: &[f64]) -> MarkerPositions {
        MarkerPositions {
            x: vec![0.0],
            y: vec![0.0],
            z: vec![q[0]],
        }
    }

    fn falling_table() -> OutputTable {
        let samples: Vec<Vec<f64>> = (0..10).map(|k| vec![0.3 - 0.06 * k as f64]).collect();
        OutputTable::from_samples(1, &samples, 0.1)
    }

    #[test]
    fn test_contact_sample_is_kept() {
        let table = falling_table();
        // z = 0.3, 0.24, ..., -0.06 at k = 6 is the first below -0.05
        let contact = find_contact(&table, &point);
        assert_eq!(contact, Some(6));

        let kept = kept_samples(table.len(), contact);
        assert_eq!(kept, 7);
        assert_eq!(table.truncated(kept).len(), 7);
    }

    #[test]
    fn test_threshold_is_strict() {
        let samples = vec![vec![0.0], vec![-0.05], vec![0.0]];
        let table = OutputTable::from_samples(1, &samples, 0.1);
        assert_eq!(find_contact(&table, &point), None);
        assert_eq!(kept_samples(table.len(), None), 3);
    }
}
