//! Histogram-style fill action.

use common_error::SiftResult;
use sift_core::{FromValue, Value};

use super::ActionHelper;
use crate::hist::FillSink;

/// Fills copies of a model accumulator with one column's accepted values.
///
/// Each slot starts from a clone of the model; partials are merged pairwise
/// in slot-index order.
pub(crate) struct FillHelper<H> {
    model: H,
}

impl<H> FillHelper<H> {
    pub(crate) fn new(model: H) -> Self {
        Self { model }
    }
}

impl<H> ActionHelper for FillHelper<H>
where
    H: FillSink + Clone + Send + Sync + 'static,
{
    type Acc = H;
    type Out = H;

    fn init(&self) -> H {
        self.model.clone()
    }

    fn exec(
        &self,
        _slot: usize,
        acc: &mut H,
        values: &[Value],
        columns: &[String],
    ) -> SiftResult<()> {
        acc.fill(f64::from_value(&values[0], &columns[0])?);
        Ok(())
    }

    fn merge(&self, accs: Vec<H>) -> SiftResult<H> {
        let mut iter = accs.into_iter();
        let mut merged = match iter.next() {
            Some(first) => first,
            None => self.model.clone(),
        };
        for partial in iter {
            merged.add(&partial);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hist::Hist1D;

    #[test]
    fn test_fill_and_merge() {
        let helper = FillHelper::new(Hist1D::new(4, 0.0, 4.0));
        let cols = vec!["a".to_string()];

        let mut a = helper.init();
        helper.exec(0, &mut a, &[Value::Float64(0.5)], &cols).unwrap();
        helper.exec(0, &mut a, &[Value::Float64(1.5)], &cols).unwrap();

        let mut b = helper.init();
        helper.exec(1, &mut b, &[Value::Int64(1)], &cols).unwrap();

        let merged = helper.merge(vec![a, b]).unwrap();
        assert_eq!(merged.entries(), 3);
        assert_eq!(merged.bin(0), 1);
        assert_eq!(merged.bin(1), 2);
    }
}
