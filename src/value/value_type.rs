use crate::schema::{LogicalType, RegularType, SchemaKey, SchemaRef};

use std::collections::{HashMap, HashSet};

/// The shape of the [`Value`](super::Value)s a plan produces or consumes
///
/// This is the statically-declared counterpart of a schema on the
/// application side: resolution checks that the reader (or source) schema can
/// be represented as this type, and picks conversions accordingly.
///
/// Recursive records are described by nesting a [`ValueType::RecordRef`] to
/// the name of a [`RecordType`] that is defined elsewhere in the same
/// `ValueType` (typically one of its ancestors).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
	#[allow(missing_docs)]
	Null,
	#[allow(missing_docs)]
	Boolean,
	#[allow(missing_docs)]
	Int,
	#[allow(missing_docs)]
	Long,
	#[allow(missing_docs)]
	Float,
	#[allow(missing_docs)]
	Double,
	#[allow(missing_docs)]
	Bytes,
	#[allow(missing_docs)]
	String,
	/// Bytes of a `fixed` (the size is given by the schema)
	Fixed,
	/// Symbol of an `enum`
	Enum,
	#[allow(missing_docs)]
	Array(Box<ValueType>),
	#[allow(missing_docs)]
	Map(Box<ValueType>),
	#[allow(missing_docs)]
	Record(RecordType),
	/// A record whose [`RecordType`] is defined elsewhere in the same
	/// `ValueType`, by name
	RecordRef(String),
	/// Either [`Value::Null`](super::Value::Null) or a value of the inner
	/// type
	///
	/// This is how two-variant unions where one of the variants is `null`
	/// are represented.
	Nullable(Box<ValueType>),
	/// [`Value::Union`](super::Value::Union), with the type of each variant
	Union(Vec<ValueType>),
	#[allow(missing_docs)]
	Decimal,
	#[allow(missing_docs)]
	Uuid,
	#[allow(missing_docs)]
	Date,
	#[allow(missing_docs)]
	TimeMillis,
	#[allow(missing_docs)]
	TimeMicros,
	#[allow(missing_docs)]
	TimeNanos,
	#[allow(missing_docs)]
	TimestampMillis,
	#[allow(missing_docs)]
	TimestampMicros,
	#[allow(missing_docs)]
	TimestampNanos,
	#[allow(missing_docs)]
	Duration,
}

/// Shape of a [`Record`](super::Record) value
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordType {
	/// Full name of the record
	///
	/// This is what [`ValueType::RecordRef`]s refer to.
	pub name: String,
	/// Field names and types, in the order they will be stored in the
	/// [`Record`](super::Record)
	pub fields: Vec<(String, ValueType)>,
}

impl RecordType {
	#[allow(missing_docs)]
	pub fn new(
		name: impl Into<String>,
		fields: impl IntoIterator<Item = (impl Into<String>, ValueType)>,
	) -> Self {
		Self {
			name: name.into(),
			fields: fields
				.into_iter()
				.map(|(name, type_)| (name.into(), type_))
				.collect(),
		}
	}

	/// Position of the field called `name`
	pub fn field_position(&self, name: &str) -> Option<usize> {
		self.fields.iter().position(|(field_name, _)| field_name == name)
	}
}

impl ValueType {
	/// The natural representation of data of the given schema
	///
	/// Logical types are represented as such (a `date` gives
	/// [`ValueType::Date`]), two-variant unions with a `null` variant give a
	/// [`ValueType::Nullable`], and records are only described once, further
	/// occurrences being [`ValueType::RecordRef`]s.
	pub fn of(schema: SchemaRef<'_>) -> Self {
		of(schema, &mut HashSet::new())
	}

	/// Shorthand to build a [`ValueType::Record`]
	pub fn record(
		name: impl Into<String>,
		fields: impl IntoIterator<Item = (impl Into<String>, ValueType)>,
	) -> Self {
		ValueType::Record(RecordType::new(name, fields))
	}

	/// All the [`RecordType`]s defined in this type, by name
	///
	/// This is what [`ValueType::RecordRef`]s are looked up in.
	pub(crate) fn record_types(&self) -> HashMap<&str, &RecordType> {
		let mut record_types = HashMap::new();
		let mut stack = vec![self];
		while let Some(type_) = stack.pop() {
			match type_ {
				ValueType::Array(inner) | ValueType::Map(inner) | ValueType::Nullable(inner) => {
					stack.push(inner)
				}
				ValueType::Union(variants) => stack.extend(variants),
				ValueType::Record(record_type) => {
					if record_types
						.insert(record_type.name.as_str(), record_type)
						.is_none()
					{
						stack.extend(record_type.fields.iter().map(|(_, type_)| type_));
					}
				}
				_ => {}
			}
		}
		record_types
	}
}

/// Compact rendering, used in error messages: `record Name`, `array<int>`,
/// `nullable<string>`, `union<int, string>`...
impl std::fmt::Display for ValueType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let simple = match self {
			ValueType::Null => "null",
			ValueType::Boolean => "boolean",
			ValueType::Int => "int",
			ValueType::Long => "long",
			ValueType::Float => "float",
			ValueType::Double => "double",
			ValueType::Bytes => "bytes",
			ValueType::String => "string",
			ValueType::Fixed => "fixed",
			ValueType::Enum => "enum",
			ValueType::Decimal => "decimal",
			ValueType::Uuid => "uuid",
			ValueType::Date => "date",
			ValueType::TimeMillis => "time-millis",
			ValueType::TimeMicros => "time-micros",
			ValueType::TimeNanos => "time-nanos",
			ValueType::TimestampMillis => "timestamp-millis",
			ValueType::TimestampMicros => "timestamp-micros",
			ValueType::TimestampNanos => "timestamp-nanos",
			ValueType::Duration => "duration",
			ValueType::Array(items) => return write!(f, "array<{items}>"),
			ValueType::Map(values) => return write!(f, "map<{values}>"),
			ValueType::Nullable(inner) => return write!(f, "nullable<{inner}>"),
			ValueType::Record(record_type) => return write!(f, "record {}", record_type.name),
			ValueType::RecordRef(name) => return write!(f, "record {name}"),
			ValueType::Union(variants) => {
				f.write_str("union<")?;
				for (i, variant) in variants.iter().enumerate() {
					if i != 0 {
						f.write_str(", ")?;
					}
					write!(f, "{variant}")?;
				}
				return f.write_str(">");
			}
		};
		f.write_str(simple)
	}
}

fn of(schema: SchemaRef<'_>, records_described: &mut HashSet<SchemaKey>) -> ValueType {
	if let Some(logical_type) = schema.logical_type() {
		match logical_type {
			LogicalType::Decimal(_) => return ValueType::Decimal,
			LogicalType::Uuid => return ValueType::Uuid,
			LogicalType::Date => return ValueType::Date,
			LogicalType::TimeMillis => return ValueType::TimeMillis,
			LogicalType::TimeMicros => return ValueType::TimeMicros,
			LogicalType::TimeNanos => return ValueType::TimeNanos,
			LogicalType::TimestampMillis => return ValueType::TimestampMillis,
			LogicalType::TimestampMicros => return ValueType::TimestampMicros,
			LogicalType::TimestampNanos => return ValueType::TimestampNanos,
			LogicalType::Duration => return ValueType::Duration,
			// Not reachable, `logical_type` only gives known logical types
			LogicalType::Unknown(_) => {}
		}
	}
	match schema.regular() {
		RegularType::Null => ValueType::Null,
		RegularType::Boolean => ValueType::Boolean,
		RegularType::Int => ValueType::Int,
		RegularType::Long => ValueType::Long,
		RegularType::Float => ValueType::Float,
		RegularType::Double => ValueType::Double,
		RegularType::Bytes => ValueType::Bytes,
		RegularType::String => ValueType::String,
		RegularType::Fixed(_) => ValueType::Fixed,
		RegularType::Enum(_) => ValueType::Enum,
		RegularType::Array(array) => {
			ValueType::Array(Box::new(of(schema.at(array.items), records_described)))
		}
		RegularType::Map(map) => {
			ValueType::Map(Box::new(of(schema.at(map.values), records_described)))
		}
		RegularType::Union(union) => match schema.as_nullable() {
			Some((_, inner)) => ValueType::Nullable(Box::new(of(inner, records_described))),
			None => ValueType::Union(
				union
					.variants
					.iter()
					.map(|&variant| of(schema.at(variant), records_described))
					.collect(),
			),
		},
		RegularType::Record(record) => {
			let name = record.name.fully_qualified_name().to_owned();
			if !records_described.insert(schema.regular_key()) {
				return ValueType::RecordRef(name);
			}
			ValueType::Record(RecordType {
				name,
				fields: record
					.fields
					.iter()
					.map(|field| {
						(
							field.name.clone(),
							of(schema.at(field.type_), records_described),
						)
					})
					.collect(),
			})
		}
	}
}
