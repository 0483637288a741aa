//! Schemas that are read or written in one go (primitives, `fixed` and
//! logical types), and the conversions between their values

use crate::{
	codec::{
		decimal_from_be_bytes, decimal_to_be_bytes, DeError, Decoder, Encoder, SerError,
		SerErrorKind,
	},
	schema::{LogicalType, RegularType, SchemaRef},
	value::{Duration, Value, ValueType},
};

use serde::{de::Error as _, ser::Error as _};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Leaf {
	Null,
	Boolean,
	Int,
	Long,
	Float,
	Double,
	Bytes,
	String,
	Fixed(usize),
	/// `size` is `None` when the decimal is represented as `bytes`
	Decimal {
		scale: u32,
		size: Option<usize>,
	},
	Uuid {
		fixed: bool,
	},
	Date,
	TimeMillis,
	TimeMicros,
	TimeNanos,
	TimestampMillis,
	TimestampMicros,
	TimestampNanos,
	Duration,
}

impl Leaf {
	/// How this schema appears on the wire, logical type included
	///
	/// `None` for complex types (array, map, union, record, enum).
	pub(crate) fn natural(schema: SchemaRef<'_>) -> Option<Self> {
		let regular = schema.regular();
		if let Some(logical_type) = schema.logical_type() {
			let logical = match logical_type {
				LogicalType::Decimal(decimal) => Some(Leaf::Decimal {
					scale: decimal.scale,
					size: match regular {
						RegularType::Fixed(fixed) => Some(fixed.size),
						_ => None,
					},
				}),
				LogicalType::Uuid => Some(Leaf::Uuid {
					fixed: matches!(regular, RegularType::Fixed(_)),
				}),
				LogicalType::Date => Some(Leaf::Date),
				LogicalType::TimeMillis => Some(Leaf::TimeMillis),
				LogicalType::TimeMicros => Some(Leaf::TimeMicros),
				LogicalType::TimeNanos => Some(Leaf::TimeNanos),
				LogicalType::TimestampMillis => Some(Leaf::TimestampMillis),
				LogicalType::TimestampMicros => Some(Leaf::TimestampMicros),
				LogicalType::TimestampNanos => Some(Leaf::TimestampNanos),
				LogicalType::Duration => Some(Leaf::Duration),
				LogicalType::Unknown(_) => None,
			};
			if logical.is_some() {
				return logical;
			}
		}
		Self::of_regular(regular)
	}

	/// Ignores logical types
	pub(crate) fn of_regular(regular: &RegularType) -> Option<Self> {
		Some(match regular {
			RegularType::Null => Leaf::Null,
			RegularType::Boolean => Leaf::Boolean,
			RegularType::Int => Leaf::Int,
			RegularType::Long => Leaf::Long,
			RegularType::Float => Leaf::Float,
			RegularType::Double => Leaf::Double,
			RegularType::Bytes => Leaf::Bytes,
			RegularType::String => Leaf::String,
			RegularType::Fixed(fixed) => Leaf::Fixed(fixed.size),
			RegularType::Array(_)
			| RegularType::Map(_)
			| RegularType::Union(_)
			| RegularType::Record(_)
			| RegularType::Enum(_) => return None,
		})
	}

	/// The leaf of `schema` whose values are of type `value_type`: either the
	/// natural one, or the underlying type of its logical type
	pub(crate) fn representing(schema: SchemaRef<'_>, value_type: &ValueType) -> Option<Self> {
		let natural = Self::natural(schema)?;
		[natural, natural.physical()]
			.into_iter()
			.find(|leaf| leaf.value_type() == *value_type)
	}

	/// The type behind the logical type
	pub(crate) fn physical(self) -> Self {
		match self {
			Leaf::Decimal { size: None, .. } => Leaf::Bytes,
			Leaf::Decimal { size: Some(size), .. } => Leaf::Fixed(size),
			Leaf::Uuid { fixed: false } => Leaf::String,
			Leaf::Uuid { fixed: true } => Leaf::Fixed(16),
			Leaf::Date | Leaf::TimeMillis => Leaf::Int,
			Leaf::TimeMicros
			| Leaf::TimeNanos
			| Leaf::TimestampMillis
			| Leaf::TimestampMicros
			| Leaf::TimestampNanos => Leaf::Long,
			Leaf::Duration => Leaf::Fixed(12),
			Leaf::Null
			| Leaf::Boolean
			| Leaf::Int
			| Leaf::Long
			| Leaf::Float
			| Leaf::Double
			| Leaf::Bytes
			| Leaf::String
			| Leaf::Fixed(_) => self,
		}
	}

	pub(crate) fn is_logical(self) -> bool {
		self.physical() != self
	}

	pub(crate) fn value_type(self) -> ValueType {
		match self {
			Leaf::Null => ValueType::Null,
			Leaf::Boolean => ValueType::Boolean,
			Leaf::Int => ValueType::Int,
			Leaf::Long => ValueType::Long,
			Leaf::Float => ValueType::Float,
			Leaf::Double => ValueType::Double,
			Leaf::Bytes => ValueType::Bytes,
			Leaf::String => ValueType::String,
			Leaf::Fixed(_) => ValueType::Fixed,
			Leaf::Decimal { .. } => ValueType::Decimal,
			Leaf::Uuid { .. } => ValueType::Uuid,
			Leaf::Date => ValueType::Date,
			Leaf::TimeMillis => ValueType::TimeMillis,
			Leaf::TimeMicros => ValueType::TimeMicros,
			Leaf::TimeNanos => ValueType::TimeNanos,
			Leaf::TimestampMillis => ValueType::TimestampMillis,
			Leaf::TimestampMicros => ValueType::TimestampMicros,
			Leaf::TimestampNanos => ValueType::TimestampNanos,
			Leaf::Duration => ValueType::Duration,
		}
	}

	fn name(self) -> &'static str {
		match self {
			Leaf::Null => "null",
			Leaf::Boolean => "boolean",
			Leaf::Int => "int",
			Leaf::Long => "long",
			Leaf::Float => "float",
			Leaf::Double => "double",
			Leaf::Bytes => "bytes",
			Leaf::String => "string",
			Leaf::Fixed(_) => "fixed",
			Leaf::Decimal { .. } => "decimal",
			Leaf::Uuid { .. } => "uuid",
			Leaf::Date => "date",
			Leaf::TimeMillis => "time-millis",
			Leaf::TimeMicros => "time-micros",
			Leaf::TimeNanos => "time-nanos",
			Leaf::TimestampMillis => "timestamp-millis",
			Leaf::TimestampMicros => "timestamp-micros",
			Leaf::TimestampNanos => "timestamp-nanos",
			Leaf::Duration => "duration",
		}
	}

	pub(crate) fn read<D: Decoder>(self, decoder: &mut D) -> Result<Value, DeError> {
		Ok(match self {
			Leaf::Null => {
				decoder.read_null()?;
				Value::Null
			}
			Leaf::Boolean => Value::Boolean(decoder.read_boolean()?),
			Leaf::Int => Value::Int(decoder.read_int()?),
			Leaf::Long => Value::Long(decoder.read_long()?),
			Leaf::Float => Value::Float(decoder.read_float()?),
			Leaf::Double => Value::Double(decoder.read_double()?),
			Leaf::Bytes => Value::Bytes(decoder.read_bytes()?),
			Leaf::String => Value::String(decoder.read_string()?),
			Leaf::Fixed(size) => Value::Fixed(decoder.read_fixed(size)?),
			Leaf::Decimal { scale, size } => Value::Decimal(decoder.read_decimal(scale, size)?),
			Leaf::Uuid { fixed } => Value::Uuid(decoder.read_uuid(fixed)?),
			Leaf::Date => Value::Date(decoder.read_date()?),
			Leaf::TimeMillis => Value::TimeMillis(decoder.read_time_millis()?),
			Leaf::TimeMicros => Value::TimeMicros(decoder.read_time_micros()?),
			Leaf::TimeNanos => Value::TimeNanos(decoder.read_time_nanos()?),
			Leaf::TimestampMillis => Value::TimestampMillis(decoder.read_timestamp_millis()?),
			Leaf::TimestampMicros => Value::TimestampMicros(decoder.read_timestamp_micros()?),
			Leaf::TimestampNanos => Value::TimestampNanos(decoder.read_timestamp_nanos()?),
			Leaf::Duration => Value::Duration(decoder.read_duration()?),
		})
	}

	pub(crate) fn skip<D: Decoder>(self, decoder: &mut D) -> Result<(), DeError> {
		match self.physical() {
			Leaf::Null => decoder.skip_null(),
			Leaf::Boolean => decoder.skip_boolean(),
			Leaf::Int => decoder.skip_int(),
			Leaf::Long => decoder.skip_long(),
			Leaf::Float => decoder.skip_float(),
			Leaf::Double => decoder.skip_double(),
			Leaf::Bytes => decoder.skip_bytes(),
			Leaf::String => decoder.skip_string(),
			Leaf::Fixed(size) => decoder.skip_fixed(size),
			logical => Err(DeError::custom(format_args!(
				"{} should have been turned into its physical type",
				logical.name()
			))),
		}
	}

	pub(crate) fn write<E: Encoder>(self, encoder: &mut E, value: &Value) -> Result<(), SerError> {
		match (self, value) {
			(Leaf::Null, Value::Null) => encoder.write_null(),
			(Leaf::Boolean, &Value::Boolean(v)) => encoder.write_boolean(v),
			(Leaf::Int, &Value::Int(v)) => encoder.write_int(v),
			(Leaf::Long, &Value::Long(v)) => encoder.write_long(v),
			(Leaf::Float, &Value::Float(v)) => encoder.write_float(v),
			(Leaf::Double, &Value::Double(v)) => encoder.write_double(v),
			(Leaf::Bytes, Value::Bytes(v)) => encoder.write_bytes(v),
			(Leaf::String, Value::String(v)) => encoder.write_string(v),
			(Leaf::Fixed(size), Value::Fixed(v)) => match v.len() == size {
				true => encoder.write_fixed(v),
				false => Err(SerError::custom(format_args!(
					"Fixed value has {} bytes but the schema requires {size}",
					v.len()
				))),
			},
			(Leaf::Decimal { scale, size }, &Value::Decimal(v)) => {
				encoder.write_decimal(v, scale, size)
			}
			(Leaf::Uuid { fixed }, Value::Uuid(v)) => encoder.write_uuid(v, fixed),
			(Leaf::Date, &Value::Date(v)) => encoder.write_date(v),
			(Leaf::TimeMillis, &Value::TimeMillis(v)) => encoder.write_time_millis(v),
			(Leaf::TimeMicros, &Value::TimeMicros(v)) => encoder.write_time_micros(v),
			(Leaf::TimeNanos, &Value::TimeNanos(v)) => encoder.write_time_nanos(v),
			(Leaf::TimestampMillis, &Value::TimestampMillis(v)) => {
				encoder.write_timestamp_millis(v)
			}
			(Leaf::TimestampMicros, &Value::TimestampMicros(v)) => {
				encoder.write_timestamp_micros(v)
			}
			(Leaf::TimestampNanos, &Value::TimestampNanos(v)) => encoder.write_timestamp_nanos(v),
			(Leaf::Duration, &Value::Duration(v)) => encoder.write_duration(v),
			(leaf, value) => Err(SerError::unexpected_value(leaf.name(), value.kind())),
		}
	}
}

/// Turn a value of one leaf into a value of another
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Conversion {
	from: Leaf,
	to: Leaf,
}

/// The conversions that turn values of `from` into values of `to`, if that
/// is allowed
///
/// Logical types may always be turned into their underlying type and back,
/// numbers may be promoted, `bytes` and `string` may stand for each other,
/// and `time-*` or `timestamp-*` may be widened to a more precise unit.
pub(crate) fn conversion_path(from: Leaf, to: Leaf) -> Option<Vec<Conversion>> {
	if from == to {
		return Some(Vec::new());
	}
	if from.is_logical() && to.is_logical() {
		return match (from, to) {
			// Only the underlying representation differs (e.g. `decimal` as
			// `bytes` or as `fixed`), the value is the same
			(Leaf::Decimal { scale: a, .. }, Leaf::Decimal { scale: b, .. }) if a == b => {
				Some(Vec::new())
			}
			(Leaf::Uuid { .. }, Leaf::Uuid { .. }) => Some(Vec::new()),
			(from, to) if is_widening(from, to) => Some(vec![Conversion { from, to }]),
			_ => None,
		};
	}
	let mut path = Vec::new();
	let mut current = from;
	if from.is_logical() {
		path.push(Conversion {
			from,
			to: from.physical(),
		});
		current = from.physical();
	}
	let physical_target = to.physical();
	if current != physical_target {
		if !is_promotion(current, physical_target) {
			return None;
		}
		path.push(Conversion {
			from: current,
			to: physical_target,
		});
		current = physical_target;
	}
	if to.is_logical() {
		path.push(Conversion { from: current, to });
	}
	Some(path)
}

fn is_promotion(from: Leaf, to: Leaf) -> bool {
	matches!(
		(from, to),
		(Leaf::Int, Leaf::Long | Leaf::Float | Leaf::Double)
			| (Leaf::Long, Leaf::Float | Leaf::Double)
			| (Leaf::Float, Leaf::Double)
			| (Leaf::Bytes, Leaf::String)
			| (Leaf::String, Leaf::Bytes)
	)
}

fn is_widening(from: Leaf, to: Leaf) -> bool {
	matches!(
		(from, to),
		(Leaf::TimeMillis, Leaf::TimeMicros | Leaf::TimeNanos)
			| (Leaf::TimeMicros, Leaf::TimeNanos)
			| (
				Leaf::TimestampMillis,
				Leaf::TimestampMicros | Leaf::TimestampNanos
			) | (Leaf::TimestampMicros, Leaf::TimestampNanos)
	)
}

impl Conversion {
	/// Going from one logical type to another, e.g. to a more precise time
	/// unit
	pub(crate) fn changes_logical_value(self) -> bool {
		self.from.is_logical() && self.to.is_logical()
	}

	pub(crate) fn apply(self, value: Value) -> Result<Value, ConversionError> {
		Ok(match (value, self.to) {
			// Promotions
			(Value::Int(v), Leaf::Long) => Value::Long(v.into()),
			(Value::Int(v), Leaf::Float) => Value::Float(v as f32),
			(Value::Int(v), Leaf::Double) => Value::Double(v.into()),
			(Value::Long(v), Leaf::Float) => Value::Float(v as f32),
			(Value::Long(v), Leaf::Double) => Value::Double(v as f64),
			(Value::Float(v), Leaf::Double) => Value::Double(v.into()),
			(Value::Bytes(v), Leaf::String) => Value::String(String::from_utf8(v).map_err(|e| {
				ConversionError::new(format_args!("Bytes are not valid utf-8: {e}"))
			})?),
			(Value::String(v), Leaf::Bytes) => Value::Bytes(v.into_bytes()),

			// Logical types to their underlying type
			(Value::Decimal(v), Leaf::Bytes | Leaf::Fixed(_)) => {
				let Leaf::Decimal { scale, size } = self.from else {
					return Err(self.mismatch("decimal"));
				};
				let bytes = decimal_to_be_bytes(v, scale, size)?;
				match self.to {
					Leaf::Bytes => Value::Bytes(bytes),
					_ => Value::Fixed(bytes),
				}
			}
			(Value::Uuid(v), Leaf::String) => Value::String(
				v.hyphenated()
					.encode_lower(&mut uuid::Uuid::encode_buffer())
					.to_owned(),
			),
			(Value::Uuid(v), Leaf::Fixed(_)) => Value::Fixed(v.as_bytes().to_vec()),
			(Value::Date(v) | Value::TimeMillis(v), Leaf::Int) => Value::Int(v),
			(
				Value::TimeMicros(v)
				| Value::TimeNanos(v)
				| Value::TimestampMillis(v)
				| Value::TimestampMicros(v)
				| Value::TimestampNanos(v),
				Leaf::Long,
			) => Value::Long(v),
			(Value::Duration(v), Leaf::Fixed(_)) => Value::Fixed(v.to_le_bytes().to_vec()),

			// Underlying types to their logical type
			(Value::Bytes(v) | Value::Fixed(v), Leaf::Decimal { scale, .. }) => {
				Value::Decimal(decimal_from_be_bytes(&v, scale)?)
			}
			(Value::String(v), Leaf::Uuid { .. }) => Value::Uuid(
				uuid::Uuid::parse_str(&v)
					.map_err(|e| ConversionError::new(format_args!("Invalid uuid: {e}")))?,
			),
			(Value::Fixed(v), Leaf::Uuid { .. }) => Value::Uuid(
				uuid::Uuid::from_slice(&v)
					.map_err(|e| ConversionError::new(format_args!("Invalid uuid: {e}")))?,
			),
			(Value::Int(v), Leaf::Date) => Value::Date(v),
			(Value::Int(v), Leaf::TimeMillis) => Value::TimeMillis(v),
			(Value::Long(v), Leaf::TimeMicros) => Value::TimeMicros(v),
			(Value::Long(v), Leaf::TimeNanos) => Value::TimeNanos(v),
			(Value::Long(v), Leaf::TimestampMillis) => Value::TimestampMillis(v),
			(Value::Long(v), Leaf::TimestampMicros) => Value::TimestampMicros(v),
			(Value::Long(v), Leaf::TimestampNanos) => Value::TimestampNanos(v),
			(Value::Fixed(v), Leaf::Duration) => {
				let bytes: [u8; 12] = v.try_into().map_err(|v: Vec<u8>| {
					ConversionError::new(format_args!(
						"Duration should be 12 bytes, got {}",
						v.len()
					))
				})?;
				Value::Duration(Duration::from_le_bytes(bytes))
			}

			// More precise time units
			(Value::TimeMillis(v), Leaf::TimeMicros) => Value::TimeMicros(i64::from(v) * 1_000),
			(Value::TimeMillis(v), Leaf::TimeNanos) => Value::TimeNanos(i64::from(v) * 1_000_000),
			(Value::TimeMicros(v), Leaf::TimeNanos) => Value::TimeNanos(scale_up(v, 1_000)?),
			(Value::TimestampMillis(v), Leaf::TimestampMicros) => {
				Value::TimestampMicros(scale_up(v, 1_000)?)
			}
			(Value::TimestampMillis(v), Leaf::TimestampNanos) => {
				Value::TimestampNanos(scale_up(v, 1_000_000)?)
			}
			(Value::TimestampMicros(v), Leaf::TimestampNanos) => {
				Value::TimestampNanos(scale_up(v, 1_000)?)
			}

			(value, _) => return Err(self.mismatch(value.kind())),
		})
	}

	fn mismatch(self, got: &str) -> ConversionError {
		ConversionError::new(format_args!(
			"Expected {} value to convert to {}, got {got}",
			self.from.name(),
			self.to.name()
		))
	}
}

fn scale_up(value: i64, factor: i64) -> Result<i64, ConversionError> {
	value.checked_mul(factor).ok_or_else(|| {
		ConversionError::new(format_args!(
			"{value} overflows when converted to a more precise time unit"
		))
	})
}

/// A value could not be converted
///
/// This turns into a [`DeError`] or a [`SerError`] depending on which plan
/// it happened in.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ConversionError {
	message: String,
	decimal_out_of_range: bool,
}

impl ConversionError {
	fn new(message: std::fmt::Arguments<'_>) -> Self {
		Self {
			message: message.to_string(),
			decimal_out_of_range: false,
		}
	}
}

impl From<SerError> for ConversionError {
	fn from(error: SerError) -> Self {
		Self {
			decimal_out_of_range: error.kind() == SerErrorKind::DecimalOutOfRange,
			message: error.to_string(),
		}
	}
}

impl From<DeError> for ConversionError {
	fn from(error: DeError) -> Self {
		Self {
			message: error.to_string(),
			decimal_out_of_range: false,
		}
	}
}

impl From<ConversionError> for DeError {
	fn from(error: ConversionError) -> Self {
		DeError::custom(error.message)
	}
}

impl From<ConversionError> for SerError {
	fn from(error: ConversionError) -> Self {
		match error.decimal_out_of_range {
			true => SerError::decimal_out_of_range(error.message),
			false => SerError::custom(error.message),
		}
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq};

	fn convert(value: Value, from: Leaf, to: Leaf) -> Result<Value, ConversionError> {
		conversion_path(from, to)
			.unwrap()
			.into_iter()
			.try_fold(value, |value, conversion| conversion.apply(value))
	}

	#[test]
	fn paths() {
		assert_eq!(conversion_path(Leaf::Int, Leaf::Int), Some(vec![]));
		assert_eq!(conversion_path(Leaf::Long, Leaf::Int), None);
		assert_eq!(conversion_path(Leaf::Fixed(4), Leaf::Fixed(5)), None);
		assert_eq!(conversion_path(Leaf::Fixed(4), Leaf::Bytes), None);
		assert_eq!(
			conversion_path(Leaf::TimestampMillis, Leaf::TimestampNanos).map(|p| p.len()),
			Some(1)
		);
		assert_eq!(conversion_path(Leaf::TimestampNanos, Leaf::TimestampMillis), None);
		assert_eq!(conversion_path(Leaf::TimeMillis, Leaf::TimestampMillis), None);
		// int -> long -> timestamp-millis
		assert_eq!(
			conversion_path(Leaf::Int, Leaf::TimestampMillis).map(|p| p.len()),
			Some(2)
		);
		assert_eq!(
			conversion_path(
				Leaf::Decimal {
					scale: 2,
					size: None
				},
				Leaf::Decimal {
					scale: 2,
					size: Some(8)
				}
			),
			Some(vec![])
		);
		assert_eq!(
			conversion_path(
				Leaf::Decimal {
					scale: 2,
					size: None
				},
				Leaf::Decimal {
					scale: 3,
					size: None
				}
			),
			None
		);
	}

	#[test]
	fn conversions() {
		assert_eq!(
			convert(Value::Int(3), Leaf::Int, Leaf::Double).unwrap(),
			Value::Double(3.0)
		);
		assert_eq!(
			convert(Value::Int(3), Leaf::Int, Leaf::TimestampMillis).unwrap(),
			Value::TimestampMillis(3)
		);
		assert_eq!(
			convert(Value::TimeMillis(3), Leaf::TimeMillis, Leaf::TimeNanos).unwrap(),
			Value::TimeNanos(3_000_000)
		);
		assert!(convert(
			Value::TimestampMillis(i64::MAX / 10),
			Leaf::TimestampMillis,
			Leaf::TimestampMicros
		)
		.is_err());
		assert_eq!(
			convert(Value::Bytes(vec![0x04, 0xD2]), Leaf::Bytes, Leaf::Decimal {
				scale: 2,
				size: None
			})
			.unwrap(),
			Value::Decimal("12.34".parse().unwrap())
		);
		assert_eq!(
			convert(
				Value::Decimal("12.34".parse().unwrap()),
				Leaf::Decimal {
					scale: 2,
					size: Some(3)
				},
				Leaf::Fixed(3)
			)
			.unwrap(),
			Value::Fixed(vec![0, 0x04, 0xD2])
		);
		let uuid_str = "67e55044-10b1-426f-9247-bb680e5fe0c8";
		let uuid = convert(
			Value::String(uuid_str.to_owned()),
			Leaf::String,
			Leaf::Uuid { fixed: false },
		)
		.unwrap();
		assert_eq!(
			convert(uuid, Leaf::Uuid { fixed: false }, Leaf::Bytes).unwrap(),
			Value::Bytes(uuid_str.as_bytes().to_vec())
		);
		assert!(convert(Value::Bytes(vec![0xFF]), Leaf::Bytes, Leaf::String).is_err());
	}

	#[test]
	fn decimal_overflow_keeps_its_kind() {
		let error: SerError = convert(
			Value::Decimal("1000".parse().unwrap()),
			Leaf::Decimal {
				scale: 0,
				size: Some(1),
			},
			Leaf::Fixed(1),
		)
		.unwrap_err()
		.into();
		assert_eq!(error.kind(), SerErrorKind::DecimalOutOfRange);
	}
}
