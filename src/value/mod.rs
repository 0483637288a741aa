//! In-memory representation of Avro data
//!
//! Compiled plans produce and consume [`Value`]s. What shape a plan produces
//! (or expects to consume) is described ahead of time by a [`ValueType`], so
//! that resolution can pick the appropriate conversions once instead of
//! inspecting values at run time.

mod value_type;

pub use value_type::{RecordType, ValueType};

use std::collections::BTreeMap;

/// A decoded Avro datum
///
/// Logical types have their own variants: a `timestamp-millis` read into
/// [`ValueType::TimestampMillis`] gives [`Value::TimestampMillis`], whereas
/// the same data read into [`ValueType::Long`] gives [`Value::Long`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	/// Also what a [`ValueType::Nullable`] holds when the value is absent
	Null,
	#[allow(missing_docs)]
	Boolean(bool),
	#[allow(missing_docs)]
	Int(i32),
	#[allow(missing_docs)]
	Long(i64),
	#[allow(missing_docs)]
	Float(f32),
	#[allow(missing_docs)]
	Double(f64),
	#[allow(missing_docs)]
	Bytes(Vec<u8>),
	#[allow(missing_docs)]
	String(String),
	/// The bytes of a `fixed`
	Fixed(Vec<u8>),
	/// The symbol of an `enum`
	Enum(String),
	#[allow(missing_docs)]
	Array(Vec<Value>),
	#[allow(missing_docs)]
	Map(BTreeMap<String, Value>),
	#[allow(missing_docs)]
	Record(Record),
	/// A value of a [`ValueType::Union`]: the index of the variant in the
	/// union (of the schema the plan targets), and the value itself
	Union(u32, Box<Value>),
	#[allow(missing_docs)]
	Decimal(rust_decimal::Decimal),
	#[allow(missing_docs)]
	Uuid(uuid::Uuid),
	/// Number of days since the unix epoch
	Date(i32),
	/// Milliseconds after midnight
	TimeMillis(i32),
	/// Microseconds after midnight
	TimeMicros(i64),
	/// Nanoseconds after midnight
	TimeNanos(i64),
	/// Milliseconds since the unix epoch
	TimestampMillis(i64),
	/// Microseconds since the unix epoch
	TimestampMicros(i64),
	/// Nanoseconds since the unix epoch
	TimestampNanos(i64),
	#[allow(missing_docs)]
	Duration(Duration),
}

impl Value {
	/// Name of the variant, for error messages
	pub(crate) fn kind(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Boolean(_) => "boolean",
			Value::Int(_) => "int",
			Value::Long(_) => "long",
			Value::Float(_) => "float",
			Value::Double(_) => "double",
			Value::Bytes(_) => "bytes",
			Value::String(_) => "string",
			Value::Fixed(_) => "fixed",
			Value::Enum(_) => "enum",
			Value::Array(_) => "array",
			Value::Map(_) => "map",
			Value::Record(_) => "record",
			Value::Union(..) => "union",
			Value::Decimal(_) => "decimal",
			Value::Uuid(_) => "uuid",
			Value::Date(_) => "date",
			Value::TimeMillis(_) => "time-millis",
			Value::TimeMicros(_) => "time-micros",
			Value::TimeNanos(_) => "time-nanos",
			Value::TimestampMillis(_) => "timestamp-millis",
			Value::TimestampMicros(_) => "timestamp-micros",
			Value::TimestampNanos(_) => "timestamp-nanos",
			Value::Duration(_) => "duration",
		}
	}
}

/// An Avro record (or error) value
///
/// Fields are stored in the order of the [`RecordType`] the value was
/// produced for (or will be written from), and can be accessed either by
/// index or by name.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Record {
	/// Field names and values
	pub fields: Vec<(String, Value)>,
}

impl Record {
	/// Build a record from its fields, in [`RecordType`] order
	pub fn new(fields: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
		Self {
			fields: fields
				.into_iter()
				.map(|(name, value)| (name.into(), value))
				.collect(),
		}
	}

	/// A record with the given fields, all set to [`Value::Null`]
	pub(crate) fn with_field_names<'a>(names: impl ExactSizeIterator<Item = &'a str>) -> Self {
		let mut fields = Vec::with_capacity(names.len());
		fields.extend(names.map(|name| (name.to_owned(), Value::Null)));
		Self { fields }
	}

	/// Value of the field at position `idx`
	pub fn get(&self, idx: usize) -> Option<&Value> {
		self.fields.get(idx).map(|(_, value)| value)
	}

	/// Set the value of the field at position `idx`
	///
	/// Returns `false` (and does nothing) if there is no such field.
	pub fn put(&mut self, idx: usize, value: Value) -> bool {
		match self.fields.get_mut(idx) {
			Some((_, slot)) => {
				*slot = value;
				true
			}
			None => false,
		}
	}

	/// Value of the field called `name`
	pub fn field(&self, name: &str) -> Option<&Value> {
		self.fields
			.iter()
			.find(|(field_name, _)| field_name == name)
			.map(|(_, value)| value)
	}
}

impl From<Record> for Value {
	fn from(record: Record) -> Self {
		Value::Record(record)
	}
}

/// An Avro `duration`: a number of months, days and milliseconds
///
/// These are independent of each other: one month is not a fixed number of
/// days, and one day is not a fixed number of milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Duration {
	#[allow(missing_docs)]
	pub months: u32,
	#[allow(missing_docs)]
	pub days: u32,
	#[allow(missing_docs)]
	pub milliseconds: u32,
}

impl Duration {
	/// Parse from the 12-byte fixed representation (three little-endian
	/// `u32`s)
	pub fn from_le_bytes(bytes: [u8; 12]) -> Self {
		let u32_at = |start: usize| {
			u32::from_le_bytes([
				bytes[start],
				bytes[start + 1],
				bytes[start + 2],
				bytes[start + 3],
			])
		};
		Self {
			months: u32_at(0),
			days: u32_at(4),
			milliseconds: u32_at(8),
		}
	}

	/// The 12-byte fixed representation (three little-endian `u32`s)
	pub fn to_le_bytes(self) -> [u8; 12] {
		let mut buf = [0u8; 12];
		buf[0..4].copy_from_slice(&self.months.to_le_bytes());
		buf[4..8].copy_from_slice(&self.days.to_le_bytes());
		buf[8..12].copy_from_slice(&self.milliseconds.to_le_bytes());
		buf
	}
}

macro_rules! impl_from_for_value {
	($($type_: ty => $variant: ident,)*) => {
		$(
			impl From<$type_> for Value {
				fn from(v: $type_) -> Self {
					Value::$variant(v.into())
				}
			}
		)*
	};
}
impl_from_for_value! {
	bool => Boolean,
	i32 => Int,
	i64 => Long,
	f32 => Float,
	f64 => Double,
	Vec<u8> => Bytes,
	String => String,
	&str => String,
	rust_decimal::Decimal => Decimal,
	uuid::Uuid => Uuid,
	Duration => Duration,
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		match v {
			None => Value::Null,
			Some(v) => v.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq};

	#[test]
	fn duration_bytes() {
		let duration = Duration {
			months: 1,
			days: 2,
			milliseconds: 0x01020304,
		};
		let bytes = duration.to_le_bytes();
		assert_eq!(bytes, [1, 0, 0, 0, 2, 0, 0, 0, 4, 3, 2, 1]);
		assert_eq!(Duration::from_le_bytes(bytes), duration);
	}

	#[test]
	fn record_access() {
		let mut record = Record::new([("a", Value::Int(1)), ("b", Value::Null)]);
		assert!(record.put(1, "x".into()));
		assert!(!record.put(2, Value::Null));
		assert_eq!(record.get(0), Some(&Value::Int(1)));
		assert_eq!(record.field("b"), Some(&Value::String("x".to_owned())));
		assert_eq!(record.field("c"), None);
	}
}
