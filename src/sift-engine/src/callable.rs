//! Typed adapters between user closures and the engine.
//!
//! Callables declare their input types through their signatures: a closure
//! `|a: i64, b: f64| ...` booked on columns `["x", "y"]` reads `x` as
//! `Int64` and `y` as `Float64`, and the first mismatching access during a
//! pass fails with *type-mismatch*. Arity is taken from the signature and
//! checked against the input list at booking time.

use common_error::{SiftError, SiftResult};
use sift_core::{FromValue, Value};

/// Conversion of a callable's return value into a column value.
///
/// Implemented for the plain value types and for `SiftResult` thereof, so
/// fallible user callables can propagate failures that abort the pass.
pub trait IntoColumnValue {
    /// Convert into a column value or a pass-aborting error.
    fn into_column_value(self) -> SiftResult<Value>;
}

macro_rules! impl_into_column_value {
    ($($t:ty),+) => {
        $(
            impl IntoColumnValue for $t {
                fn into_column_value(self) -> SiftResult<Value> {
                    Ok(Value::from(self))
                }
            }
        )+
    };
}

impl_into_column_value!(bool, i32, i64, f64, String);

impl IntoColumnValue for Value {
    fn into_column_value(self) -> SiftResult<Value> {
        Ok(self)
    }
}

impl<T: IntoColumnValue> IntoColumnValue for SiftResult<T> {
    fn into_column_value(self) -> SiftResult<Value> {
        self.and_then(IntoColumnValue::into_column_value)
    }
}

/// Conversion of a predicate's return value into a pass/fail decision.
pub trait IntoFilterResult {
    /// Convert into a decision or a pass-aborting error.
    fn into_filter_result(self) -> SiftResult<bool>;
}

impl IntoFilterResult for bool {
    fn into_filter_result(self) -> SiftResult<bool> {
        Ok(self)
    }
}

impl IntoFilterResult for SiftResult<bool> {
    fn into_filter_result(self) -> SiftResult<bool> {
        self
    }
}

/// Conversion of a per-row callback's return value.
pub trait IntoUnitResult {
    /// Convert into unit or a pass-aborting error.
    fn into_unit_result(self) -> SiftResult<()>;
}

impl IntoUnitResult for () {
    fn into_unit_result(self) -> SiftResult<()> {
        Ok(())
    }
}

impl IntoUnitResult for SiftResult<()> {
    fn into_unit_result(self) -> SiftResult<()> {
        self
    }
}

/// A user callable over typed column inputs.
///
/// Implemented for closures of one to four arguments whose parameter types
/// implement [`FromValue`]. `Args` is the tuple of parameter types; it is
/// inferred from the closure signature at the booking call.
pub trait RowFn<Args>: Send + Sync + 'static {
    /// The callable's return type.
    type Output;

    /// Number of column inputs the callable expects.
    fn arity() -> usize;

    /// Extract typed views of `values` (read from `columns`) and invoke.
    fn invoke(&self, values: &[Value], columns: &[String]) -> SiftResult<Self::Output>;
}

macro_rules! impl_row_fn {
    ($n:expr; $($t:ident => $idx:tt),+) => {
        impl<F, O, $($t),+> RowFn<($($t,)+)> for F
        where
            F: Fn($($t),+) -> O + Send + Sync + 'static,
            $($t: FromValue,)+
        {
            type Output = O;

            fn arity() -> usize {
                $n
            }

            fn invoke(&self, values: &[Value], columns: &[String]) -> SiftResult<O> {
                debug_assert_eq!(values.len(), $n);
                Ok((self)($($t::from_value(&values[$idx], &columns[$idx])?),+))
            }
        }
    };
}

impl_row_fn!(1; A => 0);
impl_row_fn!(2; A => 0, B => 1);
impl_row_fn!(3; A => 0, B => 1, C => 2);
impl_row_fn!(4; A => 0, B => 1, C => 2, D => 3);

/// A slot-aware user callable: the worker slot index is passed as the first
/// argument, ahead of the typed column inputs.
pub trait SlotRowFn<Args>: Send + Sync + 'static {
    /// The callable's return type.
    type Output;

    /// Number of column inputs the callable expects (the slot argument is
    /// not counted).
    fn arity() -> usize;

    /// Extract typed views of `values` and invoke with `slot` prepended.
    fn invoke(&self, slot: usize, values: &[Value], columns: &[String])
        -> SiftResult<Self::Output>;
}

macro_rules! impl_slot_row_fn {
    ($n:expr; $($t:ident => $idx:tt),+) => {
        impl<F, O, $($t),+> SlotRowFn<($($t,)+)> for F
        where
            F: Fn(usize, $($t),+) -> O + Send + Sync + 'static,
            $($t: FromValue,)+
        {
            type Output = O;

            fn arity() -> usize {
                $n
            }

            fn invoke(
                &self,
                slot: usize,
                values: &[Value],
                columns: &[String],
            ) -> SiftResult<O> {
                debug_assert_eq!(values.len(), $n);
                Ok((self)(slot, $($t::from_value(&values[$idx], &columns[$idx])?),+))
            }
        }
    };
}

impl_slot_row_fn!(1; A => 0);
impl_slot_row_fn!(2; A => 0, B => 1);
impl_slot_row_fn!(3; A => 0, B => 1, C => 2);
impl_slot_row_fn!(4; A => 0, B => 1, C => 2, D => 3);

/// Type-erased derived-column callable.
pub(crate) struct ColumnCallable {
    arity: usize,
    f: Box<dyn Fn(&[Value], &[String]) -> SiftResult<Value> + Send + Sync>,
}

impl ColumnCallable {
    pub(crate) fn from_fn<Args, F>(f: F) -> Self
    where
        F: RowFn<Args>,
        F::Output: IntoColumnValue,
    {
        Self {
            arity: F::arity(),
            f: Box::new(move |values, columns| f.invoke(values, columns)?.into_column_value()),
        }
    }

    pub(crate) fn arity(&self) -> usize {
        self.arity
    }

    pub(crate) fn call(&self, values: &[Value], columns: &[String]) -> SiftResult<Value> {
        (self.f)(values, columns)
    }
}

/// Type-erased filter predicate.
pub(crate) struct FilterCallable {
    arity: usize,
    f: Box<dyn Fn(&[Value], &[String]) -> SiftResult<bool> + Send + Sync>,
}

impl FilterCallable {
    pub(crate) fn from_fn<Args, F>(f: F) -> Self
    where
        F: RowFn<Args>,
        F::Output: IntoFilterResult,
    {
        Self {
            arity: F::arity(),
            f: Box::new(move |values, columns| f.invoke(values, columns)?.into_filter_result()),
        }
    }

    pub(crate) fn arity(&self) -> usize {
        self.arity
    }

    pub(crate) fn call(&self, values: &[Value], columns: &[String]) -> SiftResult<bool> {
        (self.f)(values, columns)
    }
}

/// Type-erased per-row callback, slot-aware or not.
pub(crate) struct SlotCallable {
    arity: usize,
    f: Box<dyn Fn(usize, &[Value], &[String]) -> SiftResult<()> + Send + Sync>,
}

impl SlotCallable {
    pub(crate) fn from_fn<Args, F>(f: F) -> Self
    where
        F: RowFn<Args>,
        F::Output: IntoUnitResult,
    {
        Self {
            arity: F::arity(),
            f: Box::new(move |_slot, values, columns| {
                f.invoke(values, columns)?.into_unit_result()
            }),
        }
    }

    pub(crate) fn from_slot_fn<Args, F>(f: F) -> Self
    where
        F: SlotRowFn<Args>,
        F::Output: IntoUnitResult,
    {
        Self {
            arity: F::arity(),
            f: Box::new(move |slot, values, columns| {
                f.invoke(slot, values, columns)?.into_unit_result()
            }),
        }
    }

    pub(crate) fn arity(&self) -> usize {
        self.arity
    }

    pub(crate) fn call(&self, slot: usize, values: &[Value], columns: &[String]) -> SiftResult<()> {
        (self.f)(slot, values, columns)
    }
}

// Keep the user-failure kind uniform regardless of what a callable returns.
pub(crate) fn as_user_failure(err: SiftError) -> SiftError {
    match err {
        e @ (SiftError::TypeMismatch(_) | SiftError::UserCallable(_)) => e,
        e => SiftError::user_callable(e.to_string()),
    }
}
