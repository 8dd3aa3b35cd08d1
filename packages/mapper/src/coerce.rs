//! Value coercion into native field types.
//!
//! Each supported field type gets a [`Slot`] and a [`FieldType`] impl. The
//! rules: null resets a scalar to its zero value, integers are range-checked
//! against narrower targets, timestamps convert to the civil types in UTC,
//! `Option` allocates on demand, and `Vec` accepts both arrays and single
//! values.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use propmap_core::{Error, GeoPoint, Key, Value};

use crate::load;
use crate::save;
use crate::schema::{FieldType, Record, RecordType, Shape};
use crate::slot::{DynRecord, LoadContext, Slot};

pub(crate) fn type_mismatch(value: &Value, target: &str) -> String {
    format!("type mismatch: {} versus {}", value.kind(), target)
}

macro_rules! integer_slot {
    ($($ty:ty),*) => {$(
        impl Slot for $ty {
            fn load_value(&mut self, value: Value, cx: &mut LoadContext<'_>) -> Result<(), Error> {
                match value {
                    Value::Null => *self = 0,
                    Value::Integer(i) => match <$ty>::try_from(i) {
                        Ok(v) => *self = v,
                        Err(_) => cx.mismatch(format!(
                            "value {} overflows field type {}",
                            i,
                            stringify!($ty)
                        )),
                    },
                    other => cx.mismatch(type_mismatch(&other, stringify!($ty))),
                }
                Ok(())
            }

            fn save_value(&self) -> Result<Value, Error> {
                Ok(Value::Integer(i64::from(*self)))
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }
        }

        impl FieldType for $ty {
            fn shape() -> Shape {
                Shape::Scalar(stringify!($ty))
            }
        }
    )*};
}

integer_slot!(i8, i16, i32, i64);

macro_rules! simple_slot {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl Slot for $ty {
            fn load_value(&mut self, value: Value, cx: &mut LoadContext<'_>) -> Result<(), Error> {
                match value {
                    Value::Null => *self = <$ty>::default(),
                    Value::$variant(v) => *self = v,
                    other => cx.mismatch(type_mismatch(&other, $name)),
                }
                Ok(())
            }

            fn save_value(&self) -> Result<Value, Error> {
                Ok(Value::$variant(self.clone()))
            }

            fn is_zero(&self) -> bool {
                *self == <$ty>::default()
            }
        }

        impl FieldType for $ty {
            fn shape() -> Shape {
                Shape::Scalar($name)
            }
        }
    };
}

simple_slot!(bool, Bool, "bool");
simple_slot!(f64, Float, "f64");
simple_slot!(String, String, "String");
simple_slot!(Bytes, Bytes, "Bytes");
simple_slot!(GeoPoint, GeoPoint, "GeoPoint");
simple_slot!(DateTime<Utc>, Timestamp, "DateTime<Utc>");

impl Slot for f32 {
    fn load_value(&mut self, value: Value, cx: &mut LoadContext<'_>) -> Result<(), Error> {
        match value {
            Value::Null => *self = 0.0,
            Value::Float(f) if f.is_finite() && f.abs() > f64::from(f32::MAX) => {
                cx.mismatch(format!("value {} overflows field type f32", f))
            }
            Value::Float(f) => *self = f as f32,
            other => cx.mismatch(type_mismatch(&other, "f32")),
        }
        Ok(())
    }

    fn save_value(&self) -> Result<Value, Error> {
        Ok(Value::Float(f64::from(*self)))
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl FieldType for f32 {
    fn shape() -> Shape {
        Shape::Scalar("f32")
    }
}

impl Slot for Key {
    fn load_value(&mut self, value: Value, cx: &mut LoadContext<'_>) -> Result<(), Error> {
        match value {
            Value::Null => *self = Key::default(),
            Value::Key(key) => *self = key,
            other => cx.mismatch(type_mismatch(&other, "Key")),
        }
        Ok(())
    }

    fn save_value(&self) -> Result<Value, Error> {
        Ok(Value::Key(self.clone()))
    }

    fn is_zero(&self) -> bool {
        *self == Key::default()
    }
}

impl FieldType for Key {
    fn shape() -> Shape {
        Shape::Key
    }
}

/// Timestamp-backed types: loaded from the UTC instant, saved as one.
macro_rules! timestamp_slot {
    ($ty:ty, $name:expr, |$t:ident| $from:expr, |$v:ident| $to:expr) => {
        impl Slot for $ty {
            fn load_value(&mut self, value: Value, cx: &mut LoadContext<'_>) -> Result<(), Error> {
                match value {
                    Value::Null => *self = <$ty>::default(),
                    Value::Timestamp($t) => *self = $from,
                    other => cx.mismatch(type_mismatch(&other, $name)),
                }
                Ok(())
            }

            fn save_value(&self) -> Result<Value, Error> {
                let $v = *self;
                Ok(Value::Timestamp($to))
            }

            fn is_zero(&self) -> bool {
                *self == <$ty>::default()
            }
        }

        impl FieldType for $ty {
            fn shape() -> Shape {
                Shape::Scalar($name)
            }
        }
    };
}

timestamp_slot!(DateTime<FixedOffset>, "DateTime<FixedOffset>",
    |t| t.fixed_offset(),
    |v| v.with_timezone(&Utc));
timestamp_slot!(NaiveDate, "NaiveDate",
    |t| t.date_naive(),
    |v| v.and_time(NaiveTime::default()).and_utc());
timestamp_slot!(NaiveTime, "NaiveTime",
    |t| t.time(),
    |v| NaiveDate::default().and_time(v).and_utc());
timestamp_slot!(NaiveDateTime, "NaiveDateTime",
    |t| t.naive_utc(),
    |v| v.and_utc());

impl<T: FieldType + Default> Slot for Option<T> {
    fn load_value(&mut self, value: Value, cx: &mut LoadContext<'_>) -> Result<(), Error> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }
        self.get_or_insert_with(T::default).load_value(value, cx)
    }

    fn save_value(&self) -> Result<Value, Error> {
        match self {
            Some(inner) => inner.save_value(),
            None => Ok(Value::Null),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn record(&self) -> Option<&dyn DynRecord> {
        self.as_ref().and_then(|inner| inner.record())
    }

    fn record_mut(&mut self) -> Option<&mut dyn DynRecord> {
        self.get_or_insert_with(T::default).record_mut()
    }

    fn elements(&self) -> Option<Vec<&dyn Slot>> {
        self.as_ref().and_then(|inner| inner.elements())
    }

    fn set_len(&mut self, len: usize) -> bool {
        self.get_or_insert_with(T::default).set_len(len)
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Slot> {
        self.as_mut().and_then(|inner| inner.element_mut(index))
    }
}

impl<T: FieldType + Default> FieldType for Option<T> {
    fn shape() -> Shape {
        Shape::Optional(Box::new(T::shape()))
    }
}

impl<T: FieldType + Default> Slot for Vec<T> {
    fn load_value(&mut self, value: Value, cx: &mut LoadContext<'_>) -> Result<(), Error> {
        match value {
            Value::Array(values) => {
                if values.is_empty() {
                    return Ok(());
                }
                self.resize_with(values.len(), T::default);
                for (element, value) in self.iter_mut().zip(values) {
                    element.load_value(value, cx)?;
                }
                Ok(())
            }
            single => {
                self.resize_with(1, T::default);
                match self.first_mut() {
                    Some(element) => element.load_value(single, cx),
                    None => Ok(()),
                }
            }
        }
    }

    fn save_value(&self) -> Result<Value, Error> {
        let values = self
            .iter()
            .map(|element| element.save_value())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(values))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn elements(&self) -> Option<Vec<&dyn Slot>> {
        Some(self.iter().map(|element| element as &dyn Slot).collect())
    }

    fn set_len(&mut self, len: usize) -> bool {
        self.resize_with(len, T::default);
        true
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Slot> {
        self.get_mut(index).map(|element| element as &mut dyn Slot)
    }
}

impl<T: FieldType + Default> FieldType for Vec<T> {
    fn shape() -> Shape {
        Shape::Slice(Box::new(T::shape()))
    }
}

impl<T: Record> Slot for T {
    fn load_value(&mut self, value: Value, cx: &mut LoadContext<'_>) -> Result<(), Error> {
        match value {
            Value::Entity(entity) => load::load_nested(self, *entity, cx),
            Value::Null => {
                cx.mismatch("cannot load null into a non-optional struct field");
                Ok(())
            }
            other => {
                cx.mismatch(type_mismatch(&other, "struct"));
                Ok(())
            }
        }
    }

    fn save_value(&self) -> Result<Value, Error> {
        Ok(Value::Entity(Box::new(save::save_entity(self)?)))
    }

    fn record(&self) -> Option<&dyn DynRecord> {
        Some(self)
    }

    fn record_mut(&mut self) -> Option<&mut dyn DynRecord> {
        Some(self)
    }
}

impl<T: Record> FieldType for T {
    fn shape() -> Shape {
        Shape::Record(RecordType::of::<T>())
    }
}
