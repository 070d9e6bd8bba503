//! Mean action.

use common_error::{SiftError, SiftResult};
use sift_core::{FromValue, Value};

use super::ActionHelper;

/// Arithmetic mean of one column's accepted values.
///
/// Slot state is a (sum, count) pair, merged component-wise; publishes
/// *empty-input* when the chain accepted zero rows.
pub(crate) struct MeanHelper {
    column: String,
}

impl MeanHelper {
    pub(crate) fn new(column: String) -> Self {
        Self { column }
    }
}

impl ActionHelper for MeanHelper {
    type Acc = (f64, u64);
    type Out = f64;

    fn init(&self) -> (f64, u64) {
        (0.0, 0)
    }

    fn exec(
        &self,
        _slot: usize,
        acc: &mut (f64, u64),
        values: &[Value],
        columns: &[String],
    ) -> SiftResult<()> {
        acc.0 += f64::from_value(&values[0], &columns[0])?;
        acc.1 += 1;
        Ok(())
    }

    fn merge(&self, accs: Vec<(f64, u64)>) -> SiftResult<f64> {
        let (sum, count) = accs
            .into_iter()
            .fold((0.0, 0), |(s, c), (slot_sum, slot_count)| {
                (s + slot_sum, c + slot_count)
            });
        if count > 0 {
            Ok(sum / count as f64)
        } else {
            Err(SiftError::empty_input(format!(
                "Mean of \"{}\": no rows accepted",
                self.column
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_merges_components() {
        let helper = MeanHelper::new("a".into());
        let mean = helper.merge(vec![(6.0, 2), (4.0, 2)]).unwrap();
        assert!((mean - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mean_widens_ints() {
        let helper = MeanHelper::new("a".into());
        let mut acc = helper.init();
        let cols = vec!["a".to_string()];
        helper.exec(0, &mut acc, &[Value::Int64(3)], &cols).unwrap();
        assert_eq!(acc, (3.0, 1));
    }

    #[test]
    fn test_mean_empty_input() {
        let helper = MeanHelper::new("a".into());
        let err = helper.merge(vec![(0.0, 0)]).unwrap_err();
        assert!(matches!(err, SiftError::EmptyInput(_)));
    }
}
