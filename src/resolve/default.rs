//! Turn the JSON default value of a record field into a [`Value`]
//!
//! Defaults follow the JSON encoding of the
//! [Avro specification](https://avro.apache.org/docs/current/specification/#schema-record):
//! `bytes` and `fixed` are strings whose code points are the byte values,
//! unions take the type of their first variant, and records are objects
//! whose missing fields fall back to the default of that field.

use super::leaf::{conversion_path, Leaf};

use crate::{
	schema::{JsonValue, RegularType, SchemaRef},
	value::{Record, RecordType, Value, ValueType},
};

use std::collections::{BTreeMap, HashMap};

/// The value of type `target` that `json` stands for in `schema`
///
/// `record_types` is where [`ValueType::RecordRef`]s are looked up. The
/// error is a description of why the default is invalid.
pub(super) fn default_value(
	schema: SchemaRef<'_>,
	json: &JsonValue,
	target: &ValueType,
	record_types: &HashMap<&str, &RecordType>,
) -> Result<Value, String> {
	DefaultValue {
		record_types,
		depth: 0,
	}
	.value(schema, json, target)
}

struct DefaultValue<'r, 't> {
	record_types: &'r HashMap<&'t str, &'t RecordType>,
	/// Defaults are finite JSON, but a recursive record without a value for
	/// its recursive field would fall back to the field default forever
	depth: usize,
}

const MAX_DEPTH: usize = 64;

impl DefaultValue<'_, '_> {
	fn value(
		&mut self,
		schema: SchemaRef<'_>,
		json: &JsonValue,
		target: &ValueType,
	) -> Result<Value, String> {
		self.depth += 1;
		if self.depth > MAX_DEPTH {
			return Err("Default value is nested too deep".to_owned());
		}
		let result = self.value_inner(schema, json, target);
		self.depth -= 1;
		result
	}

	fn value_inner(
		&mut self,
		schema: SchemaRef<'_>,
		json: &JsonValue,
		target: &ValueType,
	) -> Result<Value, String> {
		let mismatch = || format!("{json} is not a valid default for {schema}");
		match (schema.regular(), target) {
			(RegularType::Union(_), ValueType::Nullable(inner)) => {
				if json.is_null() {
					return Ok(Value::Null);
				}
				let mut variants = schema.union_variants().into_iter().flatten();
				match variants.next() {
					Some(first) if !first.is_null() => self.value(first, json, inner),
					_ => Err(mismatch()),
				}
			}
			(RegularType::Union(_), ValueType::Union(target_variants)) => {
				let first = schema
					.union_variants()
					.into_iter()
					.flatten()
					.next()
					.ok_or_else(mismatch)?;
				let first_target = target_variants.first().ok_or_else(mismatch)?;
				Ok(Value::Union(0, Box::new(self.value(first, json, first_target)?)))
			}
			(RegularType::Record(record), ValueType::Record(_) | ValueType::RecordRef(_)) => {
				let record_type = match target {
					ValueType::Record(record_type) => record_type,
					ValueType::RecordRef(name) => *self
						.record_types
						.get(name.as_str())
						.ok_or_else(|| format!("Unknown record type {name}"))?,
					_ => return Err(mismatch()),
				};
				let object = json.as_object().ok_or_else(mismatch)?;
				let mut fields = Vec::with_capacity(record_type.fields.len());
				for (field_name, field_type) in &record_type.fields {
					let field = record
						.fields
						.iter()
						.find(|f| f.name == *field_name)
						.ok_or_else(mismatch)?;
					let field_json = object
						.get(field_name)
						.or(field.default.as_ref())
						.ok_or_else(|| format!("Missing value for field {field_name} in {json}"))?;
					fields.push((
						field_name.clone(),
						self.value(schema.at(field.type_), field_json, field_type)?,
					));
				}
				Ok(Value::Record(Record { fields }))
			}
			(RegularType::Array(array), ValueType::Array(items)) => json
				.as_array()
				.ok_or_else(mismatch)?
				.iter()
				.map(|item| self.value(schema.at(array.items), item, items))
				.collect::<Result<_, _>>()
				.map(Value::Array),
			(RegularType::Map(map), ValueType::Map(values)) => json
				.as_object()
				.ok_or_else(mismatch)?
				.iter()
				.map(|(key, value)| {
					let value = self.value(schema.at(map.values), value, values)?;
					Ok::<_, String>((key.clone(), value))
				})
				.collect::<Result<BTreeMap<_, _>, String>>()
				.map(Value::Map),
			(RegularType::Enum(enum_), ValueType::Enum) => match json.as_str() {
				Some(symbol) if enum_.symbols.iter().any(|s| s == symbol) => {
					Ok(Value::Enum(symbol.to_owned()))
				}
				_ => Err(mismatch()),
			},
			(regular, _) => {
				let physical = Leaf::of_regular(regular).ok_or_else(mismatch)?;
				let target_leaf = Leaf::representing(schema, target).ok_or_else(mismatch)?;
				let physical_value = physical_value(physical, json).ok_or_else(mismatch)?;
				conversion_path(physical, target_leaf)
					.ok_or_else(mismatch)?
					.into_iter()
					.try_fold(physical_value, |value, conversion| conversion.apply(value))
					.map_err(|e| format!("{json} is not a valid default for {schema}: {e}"))
			}
		}
	}
}

/// The value of a non-logical leaf as it appears in JSON
fn physical_value(leaf: Leaf, json: &JsonValue) -> Option<Value> {
	Some(match leaf {
		Leaf::Null => match json {
			JsonValue::Null => Value::Null,
			_ => return None,
		},
		Leaf::Boolean => Value::Boolean(json.as_bool()?),
		Leaf::Int => Value::Int(json.as_i64()?.try_into().ok()?),
		Leaf::Long => Value::Long(json.as_i64()?),
		Leaf::Float => Value::Float(json.as_f64()? as f32),
		Leaf::Double => Value::Double(json.as_f64()?),
		Leaf::Bytes => Value::Bytes(iso_8859_1(json.as_str()?)?),
		Leaf::String => Value::String(json.as_str()?.to_owned()),
		Leaf::Fixed(size) => {
			let bytes = iso_8859_1(json.as_str()?)?;
			if bytes.len() != size {
				return None;
			}
			Value::Fixed(bytes)
		}
		_ => return None,
	})
}

/// Each code point of the string is one byte
fn iso_8859_1(s: &str) -> Option<Vec<u8>> {
	s.chars().map(|c| u8::try_from(c).ok()).collect()
}

#[cfg(test)]
mod tests {
	use {super::*, crate::schema::Schema, pretty_assertions::assert_eq};

	fn default_of(schema: &str, json: &str, target: ValueType) -> Result<Value, String> {
		let schema: Schema = schema.parse().unwrap();
		let json: JsonValue = serde_json::from_str(json).unwrap();
		default_value(schema.root(), &json, &target, &target.record_types())
	}

	#[test]
	fn primitives() {
		assert_eq!(default_of(r#""int""#, "3", ValueType::Int), Ok(Value::Int(3)));
		assert_eq!(default_of(r#""float""#, "1.5", ValueType::Float), Ok(Value::Float(1.5)));
		// The type must be one the schema can be represented as
		assert!(default_of(r#""long""#, "3", ValueType::Double).is_err());
		assert_eq!(default_of(r#""double""#, "1", ValueType::Double), Ok(Value::Double(1.0)));
		assert!(default_of(r#""int""#, "3000000000", ValueType::Int).is_err());
		assert!(default_of(r#""int""#, r#""3""#, ValueType::Int).is_err());
		assert_eq!(
			default_of(r#""bytes""#, r#""ÿ\u0001""#, ValueType::Bytes),
			Ok(Value::Bytes(vec![0xFF, 1]))
		);
		assert!(default_of(r#""bytes""#, r#""Ā""#, ValueType::Bytes).is_err());
		assert!(default_of(
			r#"{"type": "fixed", "name": "F", "size": 2}"#,
			r#""a""#,
			ValueType::Fixed
		)
		.is_err());
	}

	#[test]
	fn logical_types() {
		assert_eq!(
			default_of(
				r#"{"type": "long", "logicalType": "timestamp-millis"}"#,
				"1000",
				ValueType::TimestampMillis
			),
			Ok(Value::TimestampMillis(1000))
		);
		assert_eq!(
			default_of(
				r#"{"type": "string", "logicalType": "uuid"}"#,
				r#""67e55044-10b1-426f-9247-bb680e5fe0c8""#,
				ValueType::Uuid
			),
			Ok(Value::Uuid("67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap()))
		);
	}

	#[test]
	fn unions() {
		let nullable = r#"["null", "string"]"#;
		let nullable_type = || ValueType::Nullable(Box::new(ValueType::String));
		assert_eq!(default_of(nullable, "null", nullable_type()), Ok(Value::Null));
		// The first variant is null, so a string default is invalid
		assert!(default_of(nullable, r#""a""#, nullable_type()).is_err());
		assert_eq!(
			default_of(r#"["string", "null"]"#, r#""a""#, nullable_type()),
			Ok(Value::String("a".to_owned()))
		);
		assert_eq!(
			default_of(
				r#"["int", "string", "boolean"]"#,
				"4",
				ValueType::Union(vec![ValueType::Long, ValueType::String, ValueType::Boolean])
			),
			Err("4 is not a valid default for int".to_owned())
		);
		assert_eq!(
			default_of(
				r#"["int", "string", "boolean"]"#,
				"4",
				ValueType::Union(vec![ValueType::Int, ValueType::String, ValueType::Boolean])
			),
			Ok(Value::Union(0, Box::new(Value::Int(4))))
		);
	}

	#[test]
	fn records() {
		let schema = r#"{
			"type": "record",
			"name": "R",
			"fields": [
				{"name": "a", "type": "int"},
				{"name": "b", "type": {"type": "array", "items": "string"}, "default": ["x"]},
				{"name": "c", "type": {"type": "map", "values": "boolean"}}
			]
		}"#;
		let target = ValueType::record(
			"R",
			[
				("a", ValueType::Int),
				("b", ValueType::Array(Box::new(ValueType::String))),
				("c", ValueType::Map(Box::new(ValueType::Boolean))),
			],
		);
		assert_eq!(
			default_of(schema, r#"{"a": 1, "c": {"k": true}}"#, target.clone()),
			Ok(Value::Record(Record::new([
				("a", Value::Int(1)),
				("b", Value::Array(vec![Value::String("x".to_owned())])),
				(
					"c",
					Value::Map([("k".to_owned(), Value::Boolean(true))].into_iter().collect())
				),
			])))
		);
		assert_eq!(
			default_of(schema, r#"{"a": 1}"#, target),
			Err(r#"Missing value for field c in {"a":1}"#.to_owned())
		);
	}
}
