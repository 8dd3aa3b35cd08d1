//! Dynamically typed fields.
//!
//! [`Dynamic`] holds any [`Value`] its [`Constraint`] admits. Loading replaces
//! whatever was there before; a value the constraint rejects is a field
//! mismatch and leaves the slot unchanged.

use std::fmt;
use std::marker::PhantomData;

use propmap_core::{Error, Value};

use crate::schema::{FieldType, Shape};
use crate::slot::{LoadContext, Slot};

/// Restricts which values a [`Dynamic`] field accepts.
pub trait Constraint: 'static {
    /// Name shown in mismatch reasons.
    const NAME: &'static str;

    fn admits(value: &Value) -> bool;
}

/// Admits every value.
pub struct AnyValue;

impl Constraint for AnyValue {
    const NAME: &'static str = "any";

    fn admits(_value: &Value) -> bool {
        true
    }
}

/// A field holding an arbitrary (constrained) value.
pub struct Dynamic<C: Constraint = AnyValue> {
    value: Value,
    _constraint: PhantomData<fn() -> C>,
}

impl<C: Constraint> Dynamic<C> {
    /// Wrap `value` if the constraint admits it. Null is always admitted.
    pub fn new(value: Value) -> Option<Self> {
        if value.is_null() || C::admits(&value) {
            Some(Self {
                value,
                _constraint: PhantomData,
            })
        } else {
            None
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl<C: Constraint> Default for Dynamic<C> {
    fn default() -> Self {
        Self {
            value: Value::Null,
            _constraint: PhantomData,
        }
    }
}

impl<C: Constraint> Clone for Dynamic<C> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _constraint: PhantomData,
        }
    }
}

impl<C: Constraint> PartialEq for Dynamic<C> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<C: Constraint> fmt::Debug for Dynamic<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dynamic").field(&self.value).finish()
    }
}

impl<C: Constraint> Slot for Dynamic<C> {
    fn load_value(&mut self, value: Value, cx: &mut LoadContext<'_>) -> Result<(), Error> {
        if value.is_null() || C::admits(&value) {
            self.value = value;
        } else {
            cx.mismatch(format!(
                "{:?} is not assignable to {:?}",
                value.kind().name(),
                C::NAME
            ));
        }
        Ok(())
    }

    fn save_value(&self) -> Result<Value, Error> {
        Ok(self.value.clone())
    }

    fn is_zero(&self) -> bool {
        self.value.is_null()
    }
}

impl<C: Constraint> FieldType for Dynamic<C> {
    fn shape() -> Shape {
        Shape::Dynamic(C::NAME)
    }
}
