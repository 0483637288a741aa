//! Writing then reading values with the same schema on both sides

use {
	avro_resolve::{
		codec::BinaryDecoder,
		value::{Duration, Record},
		Schema, Value, ValueType,
	},
	lazy_static::lazy_static,
	pretty_assertions::assert_eq,
};

lazy_static! {
	static ref SCHEMAS_TO_VALIDATE: Vec<(&'static str, Value)> = vec![
		(r#""null""#, Value::Null),
		(r#""boolean""#, Value::Boolean(true)),
		(
			r#""string""#,
			Value::String("adsfasdf09809dsf-=adsf".to_string())
		),
		(
			r#""bytes""#,
			Value::Bytes("12345abcd".to_string().into_bytes())
		),
		(r#""int""#, Value::Int(1234)),
		(r#""long""#, Value::Long(1234)),
		(r#""float""#, Value::Float(1234.0)),
		(r#""double""#, Value::Double(1234.0)),
		(
			r#"{"type": "fixed", "name": "Test", "size": 1}"#,
			Value::Fixed(vec![b'B'])
		),
		(
			r#"{"type": "enum", "name": "Test", "symbols": ["A", "B"]}"#,
			Value::Enum("B".to_string())
		),
		(
			r#"{"type": "array", "items": "long"}"#,
			Value::Array(vec![Value::Long(1), Value::Long(3), Value::Long(2)])
		),
		(
			r#"{"type": "map", "values": "long"}"#,
			Value::Map(
				[
					("a".to_string(), Value::Long(1i64)),
					("b".to_string(), Value::Long(3i64)),
					("c".to_string(), Value::Long(2i64))
				]
				.into_iter()
				.collect()
			)
		),
		(
			r#"["string", "null", "long"]"#,
			Value::Union(1, Box::new(Value::Null))
		),
		(
			r#"{"type": "record", "name": "Test", "fields": [{"name": "f", "type": "long"}]}"#,
			Value::Record(Record::new([("f", Value::Long(1))]))
		),
		(
			r#"{"type": "record", "name": "LongerRecord", "fields": [{"name": "f", "type": "long"}, {"name": "g", "type": "long"}, {"name": "h", "type": "string"}]}"#,
			Value::Record(Record::new([
				("f", Value::Long(1)),
				("g", Value::Long(2)),
				("h", Value::String("Abc".to_owned())),
			]))
		),
		(
			r#"{"name": "null_or_string","type": ["null", "string"], "default": null}"#,
			Value::String("value".to_string())
		),
		(
			r#"["long", "null"]"#,
			Value::Null
		),
		(
			r#"{"type": "bytes", "logicalType": "decimal", "precision": 4, "scale": 2}"#,
			Value::Decimal(rust_decimal::Decimal::new(-1234, 2))
		),
		(
			r#"{"type": {"type": "fixed", "name": "Amount", "size": 6}, "logicalType": "decimal", "precision": 12, "scale": 3}"#,
			Value::Decimal(rust_decimal::Decimal::new(987654321, 3))
		),
		(
			r#"{"type": "string", "logicalType": "uuid"}"#,
			Value::Uuid("67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap())
		),
		(
			r#"{"type": "int", "logicalType": "date"}"#,
			Value::Date(19000)
		),
		(
			r#"{"type": "long", "logicalType": "timestamp-nanos"}"#,
			Value::TimestampNanos(1_700_000_000_123_456_789)
		),
		(
			r#"{"type": {"type": "fixed", "name": "Duration", "size": 12}, "logicalType": "duration"}"#,
			Value::Duration(Duration {
				months: 1,
				days: 2,
				milliseconds: 3,
			})
		),
		(
			r#"{
				"type": "record",
				"name": "Node",
				"fields": [
					{"name": "label", "type": "string"},
					{"name": "children", "type": {"type": "array", "items": "Node"}}
				]
			}"#,
			Value::Record(Record::new([
				("label", Value::String("root".to_owned())),
				(
					"children",
					Value::Array(vec![
						Value::Record(Record::new([
							("label", Value::String("left".to_owned())),
							("children", Value::Array(vec![])),
						])),
						Value::Record(Record::new([
							("label", Value::String("right".to_owned())),
							("children", Value::Array(vec![])),
						])),
					])
				),
			]))
		),
	];
}

fn round_trip(raw_schema: &str, value: &Value) {
	println!("{raw_schema}");
	let schema: Schema = raw_schema.parse().unwrap();
	let value_type = ValueType::of(schema.root());

	let write_plan = avro_resolve::resolve_writer(&schema, &schema, &value_type).unwrap();
	let encoded = avro_resolve::to_datum_vec(value, &write_plan).unwrap();

	let (read_plan, skip_plan) =
		avro_resolve::resolve_reader(&schema, &schema, &value_type).unwrap();
	let mut decoder = BinaryDecoder::from_slice(&encoded);
	let decoded = read_plan.read(&mut decoder).unwrap();
	assert_eq!(*value, decoded);
	assert!(decoder.into_inner().is_empty(), "Should have read everything");

	let mut decoder = BinaryDecoder::from_slice(&encoded);
	skip_plan.skip(&mut decoder).unwrap();
	assert!(decoder.into_inner().is_empty(), "Should have skipped everything");
}

macro_rules! tests {
	($($idx: literal)*) => {
		paste::paste! {
			$(
				#[test]
				fn [<test_round_trip_ $idx>]() {
					let (raw_schema, value) = &SCHEMAS_TO_VALIDATE[$idx];
					round_trip(raw_schema, value);
				}
			)*
		}
	};
}
tests! { 00 01 02 03 04 05 06 07 08 09 10 11 12 13 14 15 16 17 18 19 20 21 22 23 }

#[test]
fn record_with_same_schema_on_both_sides() {
	let raw_schema = r#"{"type":"record","name":"foo","fields":[{"name":"f1","type":"boolean"},{"name":"f2","type":"int"}]}"#;
	let schema: Schema = raw_schema.parse().unwrap();
	assert_eq!(schema.fingerprint().unwrap(), -4860222112080293046);

	let value_type = ValueType::of(schema.root());
	let value = Value::Record(Record::new([
		("f1", Value::Boolean(true)),
		("f2", Value::Int(7)),
	]));
	let write_plan = avro_resolve::resolve_writer(&schema, &schema, &value_type).unwrap();
	let encoded = avro_resolve::to_datum_vec(&value, &write_plan).unwrap();
	assert_eq!(encoded, [1, 14]);

	let (read_plan, _) = avro_resolve::resolve_reader(&schema, &schema, &value_type).unwrap();
	assert_eq!(
		avro_resolve::from_datum_slice(&encoded, &read_plan).unwrap(),
		value
	);
}

#[test]
fn known_encodings() {
	let encode = |raw_schema: &str, value: Value| {
		let schema: Schema = raw_schema.parse().unwrap();
		let plan =
			avro_resolve::resolve_writer(&schema, &schema, &ValueType::of(schema.root())).unwrap();
		avro_resolve::to_datum_vec(&value, &plan).unwrap()
	};
	assert_eq!(encode(r#""int""#, Value::Int(1234)), [0xA4, 0x13]);
	assert_eq!(encode(r#""long""#, Value::Long(-1)), [1]);
	assert_eq!(encode(r#""string""#, Value::String("foo".to_owned())), [6, b'f', b'o', b'o']);
	assert_eq!(
		encode(
			r#"{"type": "enum", "name": "E", "symbols": ["A", "B", "C"]}"#,
			Value::Enum("C".to_owned())
		),
		[4]
	);
	assert_eq!(
		encode(r#"["null", "int"]"#, Value::Int(3)),
		[2, 6]
	);
	assert_eq!(encode(r#"["null", "int"]"#, Value::Null), [0]);
	assert_eq!(
		encode(
			r#"{"type": "array", "items": "int"}"#,
			Value::Array(vec![Value::Int(1), Value::Int(2)])
		),
		[4, 2, 4, 0]
	);
}
