//! Writing values of a source schema as data of another schema

use {
	avro_resolve::{
		codec::SerErrorKind,
		value::{Record, RecordType},
		ResolveError, Schema, Value, ValueType,
	},
	pretty_assertions::assert_eq,
};

fn schema(raw: &str) -> Schema {
	raw.parse().unwrap()
}

fn plan(source: &str, target: &str, source_type: &ValueType) -> avro_resolve::WritePlan {
	avro_resolve::resolve_writer(&schema(source), &schema(target), source_type).unwrap()
}

fn write(plan: &avro_resolve::WritePlan, value: Value) -> Vec<u8> {
	avro_resolve::to_datum_vec(&value, plan).unwrap()
}

fn write_error(plan: &avro_resolve::WritePlan, value: Value) -> SerErrorKind {
	avro_resolve::to_datum_vec(&value, plan).unwrap_err().kind()
}

fn resolve_error(source: &str, target: &str, source_type: &ValueType) -> ResolveError {
	avro_resolve::resolve_writer(&schema(source), &schema(target), source_type).unwrap_err()
}

#[test]
fn union_into_union() {
	let plan = plan(
		r#"["int", "string"]"#,
		r#"["string", "int", "null"]"#,
		&ValueType::Union(vec![ValueType::Int, ValueType::String]),
	);
	assert_eq!(write(&plan, Value::Union(0, Box::new(Value::Int(3)))), [2, 6]);
	assert_eq!(
		write(&plan, Value::Union(1, Box::new(Value::String("a".to_owned())))),
		[0, 2, b'a']
	);
	assert_eq!(
		write_error(&plan, Value::Union(2, Box::new(Value::Null))),
		SerErrorKind::IndexOutOfRange
	);
	assert_eq!(write_error(&plan, Value::Int(3)), SerErrorKind::InvalidValue);

	// Every variant must fit in the target
	assert!(matches!(
		resolve_error(
			r#"["int", "boolean"]"#,
			r#"["string", "int"]"#,
			&ValueType::Union(vec![ValueType::Int, ValueType::Boolean]),
		),
		ResolveError::Incompatible { .. }
	));
}

#[test]
fn union_into_non_union() {
	let plan = plan(
		r#"["int", "string"]"#,
		r#""string""#,
		&ValueType::Union(vec![ValueType::Int, ValueType::String]),
	);
	assert_eq!(
		write(&plan, Value::Union(1, Box::new(Value::String("a".to_owned())))),
		[2, b'a']
	);
	assert_eq!(
		write_error(&plan, Value::Union(0, Box::new(Value::Int(3)))),
		SerErrorKind::IndexOutOfRange
	);
}

#[test]
fn nullable_into_larger_union() {
	let plan = plan(
		r#"["null", "int"]"#,
		r#"["string", "null", "int"]"#,
		&ValueType::Nullable(Box::new(ValueType::Int)),
	);
	assert_eq!(write(&plan, Value::Null), [2]);
	assert_eq!(write(&plan, Value::Int(3)), [4, 6]);

	// The target has to have a null variant
	assert!(matches!(
		resolve_error(
			r#"["null", "int"]"#,
			r#"["string", "int", "long"]"#,
			&ValueType::Nullable(Box::new(ValueType::Int)),
		),
		ResolveError::Incompatible { .. }
	));
}

#[test]
fn nullable_into_nullable() {
	let plan = plan(
		r#"["null", "int"]"#,
		r#"["long", "null"]"#,
		&ValueType::Nullable(Box::new(ValueType::Int)),
	);
	assert_eq!(write(&plan, Value::Null), [2]);
	assert_eq!(write(&plan, Value::Int(3)), [0, 6]);
}

#[test]
fn nullable_into_non_union() {
	let plan = plan(
		r#"["null", "int"]"#,
		r#""long""#,
		&ValueType::Nullable(Box::new(ValueType::Int)),
	);
	assert_eq!(write(&plan, Value::Int(3)), [6]);
	assert_eq!(write_error(&plan, Value::Null), SerErrorKind::InvalidValue);
}

#[test]
fn non_union_into_union() {
	let plan = plan(r#""int""#, r#"["null", "long"]"#, &ValueType::Int);
	assert_eq!(write(&plan, Value::Int(3)), [2, 6]);
	assert_eq!(write_error(&plan, Value::Long(3)), SerErrorKind::InvalidValue);

	assert!(matches!(
		resolve_error(r#""string""#, r#"["null", "long"]"#, &ValueType::String),
		ResolveError::Incompatible { .. }
	));
}

#[test]
fn enums() {
	let source = r#"{"type": "enum", "name": "E", "symbols": ["A", "B"]}"#;
	let plan = plan(source, source, &ValueType::Enum);
	assert_eq!(write(&plan, Value::Enum("B".to_owned())), [2]);
	assert_eq!(
		write_error(&plan, Value::Enum("Z".to_owned())),
		SerErrorKind::IndexOutOfRange
	);

	assert!(matches!(
		resolve_error(
			source,
			r#"{"type": "enum", "name": "E", "symbols": ["A", "B", "C"]}"#,
			&ValueType::Enum
		),
		ResolveError::Incompatible { .. }
	));
}

#[test]
fn records_are_written_in_target_order() {
	let source = r#"{
		"type": "record",
		"name": "R",
		"fields": [
			{"name": "a", "type": "int"},
			{"name": "b", "type": "string"}
		]
	}"#;
	let target = r#"{
		"type": "record",
		"name": "R",
		"fields": [
			{"name": "b", "type": "bytes"},
			{"name": "a", "type": "long"}
		]
	}"#;
	let source_type = ValueType::Record(RecordType::new(
		"R",
		[("a", ValueType::Int), ("b", ValueType::String)],
	));
	let plan = plan(source, target, &source_type);
	assert_eq!(
		write(
			&plan,
			Value::Record(Record::new([
				("a", Value::Int(1)),
				("b", Value::String("x".to_owned())),
			]))
		),
		[2, b'x', 2]
	);

	// Records must have the same fields
	let fewer_fields = r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#;
	assert!(matches!(
		resolve_error(source, fewer_fields, &source_type),
		ResolveError::Incompatible { .. }
	));
	let other_name = r#"{
		"type": "record",
		"name": "S",
		"fields": [
			{"name": "a", "type": "int"},
			{"name": "b", "type": "string"}
		]
	}"#;
	assert!(matches!(
		resolve_error(source, other_name, &source_type),
		ResolveError::Incompatible { .. }
	));
}

#[test]
fn decimals() {
	let small = r#"{"type": {"type": "fixed", "name": "D", "size": 1}, "logicalType": "decimal", "precision": 2, "scale": 0}"#;
	let plan = plan(small, small, &ValueType::Decimal);
	assert_eq!(
		write(&plan, Value::Decimal(rust_decimal::Decimal::new(-2, 0))),
		[0xFE]
	);
	assert_eq!(
		write_error(&plan, Value::Decimal(rust_decimal::Decimal::new(1000, 0))),
		SerErrorKind::DecimalOutOfRange
	);

	// Decimals are only written as exactly the same decimals
	let other_scale = r#"{"type": {"type": "fixed", "name": "D", "size": 1}, "logicalType": "decimal", "precision": 2, "scale": 1}"#;
	assert!(matches!(
		resolve_error(small, other_scale, &ValueType::Decimal),
		ResolveError::Incompatible { .. }
	));
}

#[test]
fn logical_types_from_physical_values() {
	let p = plan(
		r#""long""#,
		r#"{"type": "long", "logicalType": "timestamp-micros"}"#,
		&ValueType::Long,
	);
	assert_eq!(write(&p, Value::Long(-1)), [1]);

	let p = plan(
		r#"{"type": "int", "logicalType": "date"}"#,
		r#""long""#,
		&ValueType::Date,
	);
	assert_eq!(write(&p, Value::Date(3)), [6]);
}

#[test]
fn depth_limit() {
	let source = schema(r#"{"type": "array", "items": {"type": "array", "items": "int"}}"#);
	let resolver = avro_resolve::resolve::Resolver::new({
		let mut config = avro_resolve::resolve::ResolverConfig::new();
		config.allowed_depth = 1;
		config
	});
	let plan = resolver
		.resolve_writer(&source, &source, &ValueType::of(source.root()))
		.unwrap();
	assert_eq!(
		avro_resolve::to_datum_vec(&Value::Array(vec![]), &plan).unwrap(),
		[0]
	);
	assert_eq!(
		avro_resolve::to_datum_vec(&Value::Array(vec![Value::Array(vec![])]), &plan)
			.unwrap_err()
			.kind(),
		SerErrorKind::DepthExceeded
	);
}
