//! Parsing canonical forms and Rabin fingerprints of reference schemas

use {avro_resolve::Schema, lazy_static::lazy_static, pretty_assertions::assert_eq};

lazy_static! {
	/// (schema, canonical form, fingerprint)
	static ref REFERENCE_SCHEMAS: Vec<(&'static str, &'static str, i64)> = vec![
		(r#""null""#, r#""null""#, 7195948357588979594),
		(r#"{"type": "null"}"#, r#""null""#, 7195948357588979594),
		(r#""boolean""#, r#""boolean""#, -6970731678124411036),
		(r#""int""#, r#""int""#, 8247732601305521295),
		(r#""long""#, r#""long""#, -3434872931120570953),
		(r#""float""#, r#""float""#, 5583340709985441680),
		(r#""double""#, r#""double""#, -8181574048448539266),
		(r#""bytes""#, r#""bytes""#, 5746618253357095269),
		(r#""string""#, r#""string""#, -8142146995180207161),
		(r#"["int"]"#, r#"["int"]"#, -5232228896498058493),
		(
			r#"[ "int" , {"type":"boolean"} ]"#,
			r#"["int","boolean"]"#,
			5392556393470105090
		),
		(
			r#"{"fields":[], "type":"record", "name":"foo"}"#,
			r#"{"name":"foo","type":"record","fields":[]}"#,
			-4824392279771201922
		),
		(
			r#"{"type":"record","name":"foo","fields":[{"name":"f1","type":"boolean"},{"name":"f2","type":"int"}]}"#,
			r#"{"name":"foo","type":"record","fields":[{"name":"f1","type":"boolean"},{"name":"f2","type":"int"}]}"#,
			-4860222112080293046
		),
		(
			r#"{"type":"record","name":"foo","doc":"Useful info","fields":[{"name":"f1","type":"boolean","default":true,"doc":"bla"}]}"#,
			r#"{"name":"foo","type":"record","fields":[{"name":"f1","type":"boolean","default":true}]}"#,
			-8063419761568716705
		),
		(
			r#"{"type":"array", "items":"int"}"#,
			r#"{"type":"array","items":"int"}"#,
			5920968314789803198
		),
		(
			r#"{"values":"long", "type":"map", "custom":"metadata"}"#,
			r#"{"type":"map","values":"long"}"#,
			5635042214824670319
		),
		(
			r#"{"name":"foo","type":"fixed","size":15}"#,
			r#"{"name":"foo","type":"fixed","size":15}"#,
			1756455273707447556
		),
		(
			r#"{"namespace":"x", "type":"enum", "name":"y", "symbols":["A","B","C"], "aliases": ["z"]}"#,
			r#"{"name":"x.y","type":"enum","symbols":["A","B","C"]}"#,
			-5085949584475430954
		),
		(
			r#"{"type":"record","name":"Node","fields":[
				{"name":"label","type":"string"},
				{"name":"children","type":{"type":"array","items":"Node"}}
			]}"#,
			r#"{"name":"Node","type":"record","fields":[{"name":"label","type":"string"},{"name":"children","type":{"type":"array","items":"Node"}}]}"#,
			-5235742690915267758
		),
	];
}

macro_rules! tests {
	($($idx: literal)*) => {
		paste::paste! {
			$(
				#[test]
				fn [<canonical_form_ $idx>]() {
					let (raw_schema, canonical_form, _) = REFERENCE_SCHEMAS[$idx];
					let schema: Schema = raw_schema.parse().unwrap();
					assert_eq!(schema.canonical_form().unwrap(), canonical_form);
				}

				#[test]
				fn [<fingerprint_ $idx>]() {
					let (raw_schema, canonical_form, fingerprint) = REFERENCE_SCHEMAS[$idx];
					let schema: Schema = raw_schema.parse().unwrap();
					assert_eq!(schema.fingerprint().unwrap(), fingerprint);
					assert_eq!(
						schema.root().fingerprint_bytes().unwrap(),
						fingerprint.to_le_bytes()
					);

					// The canonical form parses back to a schema with the same fingerprint
					let reparsed: Schema = canonical_form.parse().unwrap();
					assert_eq!(reparsed.fingerprint().unwrap(), fingerprint);
				}
			)*
		}
	};
}
tests! { 00 01 02 03 04 05 06 07 08 09 10 11 12 13 14 15 16 17 18 }

#[test]
fn logical_types_do_not_change_the_fingerprint() {
	let plain: Schema = r#""long""#.parse().unwrap();
	let timestamp: Schema = r#"{"type": "long", "logicalType": "timestamp-nanos"}"#
		.parse()
		.unwrap();
	assert_eq!(timestamp.canonical_form().unwrap(), r#""long""#);
	assert_eq!(
		timestamp.fingerprint().unwrap(),
		plain.fingerprint().unwrap()
	);
}

#[test]
fn named_types_are_written_once() {
	let schema: Schema = r#"{
		"type": "record",
		"name": "Pair",
		"namespace": "geo",
		"fields": [
			{"name": "a", "type": {"type": "fixed", "name": "Point", "size": 8}},
			{"name": "b", "type": "Point"},
			{"name": "c", "type": {"type": "map", "values": ["null", "geo.Point"]}}
		]
	}"#
	.parse()
	.unwrap();
	assert_eq!(
		schema.canonical_form().unwrap(),
		r#"{"name":"geo.Pair","type":"record","fields":[{"name":"a","type":{"name":"geo.Point","type":"fixed","size":8}},{"name":"b","type":"geo.Point"},{"name":"c","type":{"type":"map","values":["null","geo.Point"]}}]}"#
	);
}
