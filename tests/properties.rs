//! Properties that hold for any value

use {
	avro_resolve::{codec::BinaryDecoder, Schema, Value, ValueType},
	proptest::prelude::*,
};

fn schema(raw: &str) -> Schema {
	raw.parse().unwrap()
}

fn write_with_own_schema(schema: &Schema, value: &Value) -> Vec<u8> {
	let plan = avro_resolve::resolve_writer(schema, schema, &ValueType::of(schema.root())).unwrap();
	avro_resolve::to_datum_vec(value, &plan).unwrap()
}

/// Avro names: a letter or underscore, then letters, digits or underscores
fn arb_name() -> impl Strategy<Value = String> {
	"[A-Za-z_][A-Za-z0-9_]{0,15}"
}

proptest! {
	#[test]
	fn int_read_as_long_keeps_its_value(v in any::<i32>()) {
		let (writer, reader) = (schema(r#""int""#), schema(r#""long""#));
		let data = write_with_own_schema(&writer, &Value::Int(v));
		let (plan, _) = avro_resolve::resolve_reader(&reader, &writer, &ValueType::Long).unwrap();
		prop_assert_eq!(
			avro_resolve::from_datum_slice(&data, &plan).unwrap(),
			Value::Long(v.into())
		);
	}

	#[test]
	fn longs_round_trip(v in any::<i64>()) {
		let long = schema(r#""long""#);
		let data = write_with_own_schema(&long, &Value::Long(v));
		prop_assert!(data.len() <= 10);
		let (plan, _) = avro_resolve::resolve_reader(&long, &long, &ValueType::Long).unwrap();
		prop_assert_eq!(avro_resolve::from_datum_slice(&data, &plan).unwrap(), Value::Long(v));
	}

	#[test]
	fn strings_round_trip_and_skip(s in ".*") {
		let string = schema(r#"{"type": "array", "items": "string"}"#);
		let value = Value::Array(vec![Value::String(s.clone()), Value::String(s)]);
		let data = write_with_own_schema(&string, &value);
		let (plan, skip_plan) =
			avro_resolve::resolve_reader(&string, &string, &ValueType::of(string.root())).unwrap();
		prop_assert_eq!(avro_resolve::from_datum_slice(&data, &plan).unwrap(), value);
		let mut decoder = BinaryDecoder::from_slice(&data);
		skip_plan.skip(&mut decoder).unwrap();
		prop_assert!(decoder.into_inner().is_empty());
	}

	#[test]
	fn canonical_form_is_a_fixed_point(
		name in arb_name(),
		namespace in prop::option::of(arb_name()),
		symbols in prop::collection::btree_set(arb_name(), 1..6),
	) {
		let symbols: Vec<String> = symbols.into_iter().collect();
		let raw = serde_json::json!({
			"type": "enum",
			"name": name,
			"namespace": namespace,
			"symbols": symbols,
			"doc": "ignored",
		})
		.to_string();
		let parsed = schema(&raw);
		let canonical_form = parsed.canonical_form().unwrap();
		let reparsed = schema(&canonical_form);
		prop_assert_eq!(reparsed.canonical_form().unwrap(), canonical_form);
		prop_assert_eq!(reparsed.fingerprint().unwrap(), parsed.fingerprint().unwrap());
	}
}
