use {avro_resolve::schema::*, pretty_assertions::assert_eq};

#[test]
fn schema_construction() {
	// Let's simulate what would happen if a schema was built programmatically
	let nodes: Vec<SchemaNode> = vec![
		Union::new(vec![SchemaKey::from_idx(1), SchemaKey::from_idx(2)]).into(),
		RegularType::Null.into(),
		Record::new(
			Name::from_fully_qualified_name("a.b"),
			vec![RecordField::new("c", SchemaKey::from_idx(0)).with_default(JsonValue::Null)],
		)
		.into(),
	];
	let schema = Schema::from_nodes(nodes);
	schema.validate().unwrap();

	// The following schema should parse to exactly what's above
	let schema_str = prettify_json(
		r#"
			[
				"null",
				{
					"type": "record",
					"name": "a.b",
					"fields": [{
						"name": "c",
						"type": ["null", "b"],
						"default": null
					}]
				}
			]
		"#,
	);
	let parsed_schema: Schema = schema_str.parse().unwrap();

	// Exporting means allowing the union to cycle once: on the second run the
	// record is already written, so it's only referenced by name.
	assert_eq!(serde_json::to_string_pretty(&schema).unwrap(), schema_str);
	assert_eq!(
		serde_json::to_string_pretty(&parsed_schema).unwrap(),
		schema_str
	);
	assert!(schema.structurally_eq(&parsed_schema));
	assert_eq!(
		schema.fingerprint().unwrap(),
		parsed_schema.fingerprint().unwrap()
	);
}

fn prettify_json(s: &str) -> String {
	String::from_utf8({
		// Sanitize & minify json, preserving all keys.
		let mut serializer = serde_json::Serializer::pretty(Vec::new());
		serde_transcode::transcode(&mut serde_json::Deserializer::from_str(s), &mut serializer)
			.unwrap();
		serializer.into_inner()
	})
	.unwrap()
}

#[test]
fn impossible_schema_construction() {
	// Contains a cycle that would lead to infinite recursion when serializing
	let nodes: Vec<SchemaNode> = vec![
		Union::new(vec![SchemaKey::from_idx(1), SchemaKey::from_idx(2)]).into(),
		RegularType::Null.into(),
		Array::new(SchemaKey::from_idx(0)).into(),
	];
	let schema = Schema::from_nodes(nodes);
	assert_eq!(
		serde_json::to_string(&schema).unwrap_err().to_string(),
		"Schema contains a cycle that can't be avoided using named references"
	);
	// It is still a valid graph, and canonical form has the same limitation
	schema.validate().unwrap();
	assert!(schema.canonical_form().is_err());
}

#[test]
fn dangling_key() {
	let schema = Schema::from_nodes(vec![Array::new(SchemaKey::from_idx(3)).into()]);
	assert!(schema.validate().is_err());
	assert!(schema.at(SchemaKey::from_idx(3)).is_err());
}

#[test]
fn logical_type_cycle() {
	let schema = Schema::from_nodes(vec![
		SchemaNode::LogicalType {
			inner: SchemaKey::from_idx(1),
			logical_type: LogicalType::Date,
		},
		SchemaNode::LogicalType {
			inner: SchemaKey::root(),
			logical_type: LogicalType::Date,
		},
	]);
	assert!(schema.validate().is_err());
	assert!(matches!(
		avro_resolve::resolve_reader(&schema, &schema, &avro_resolve::ValueType::Date).unwrap_err(),
		avro_resolve::ResolveError::Schema(_)
	));
}

#[test]
fn dangling_key_is_not_resolved() {
	let schema = Schema::from_nodes(vec![Array::new(SchemaKey::from_idx(5)).into()]);
	let array_of_ints = avro_resolve::ValueType::Array(Box::new(avro_resolve::ValueType::Int));
	assert!(matches!(
		avro_resolve::resolve_reader(&schema, &schema, &array_of_ints).unwrap_err(),
		avro_resolve::ResolveError::Schema(_)
	));
	assert!(matches!(
		avro_resolve::resolve_writer(&schema, &schema, &array_of_ints).unwrap_err(),
		avro_resolve::ResolveError::Schema(_)
	));

	// Only one side being broken is enough
	let valid: Schema = r#"{"type": "array", "items": "int"}"#.parse().unwrap();
	assert!(matches!(
		avro_resolve::resolve_reader(&valid, &schema, &array_of_ints).unwrap_err(),
		avro_resolve::ResolveError::Schema(_)
	));
}

#[test]
fn push_and_render() {
	let mut schema = Schema::from_nodes(Vec::new());
	let root = schema.push(Map::new(SchemaKey::from_idx(1)));
	let decimal_bytes = schema.push(RegularType::Bytes);
	assert_eq!(root, SchemaKey::root());
	let inner = schema.push(RegularType::Bytes);
	schema[decimal_bytes] = SchemaNode::LogicalType {
		inner,
		logical_type: LogicalType::Decimal(Decimal::new(2, 9)),
	};
	schema.validate().unwrap();
	assert_eq!(
		schema.to_json(JsonForm::Default).unwrap(),
		r#"{"type": "map", "values": {"type": "bytes", "logicalType": "decimal", "precision": 9, "scale": 2}}"#
	);
	// Logical types are not part of the canonical form
	assert_eq!(
		schema.canonical_form().unwrap(),
		r#"{"type":"map","values":"bytes"}"#
	);
}

#[test]
fn full_form_keeps_documentation() {
	let raw = r#"{"type": "record", "name": "R", "namespace": "ns", "doc": "A record", "aliases": ["ns.Old"], "fields": [{"name": "f", "type": {"type": "enum", "name": "E", "symbols": ["X", "Y"], "default": "X"}, "doc": "A field", "default": "Y", "order": "descending", "aliases": ["g"]}], "owner": "team"}"#;
	let schema: Schema = raw.parse().unwrap();
	assert_eq!(
		schema.to_json(JsonForm::Full).unwrap(),
		r#"{"type": "record", "name": "ns.R", "doc": "A record", "aliases": ["ns.Old"], "fields": [{"name": "f", "type": {"type": "enum", "name": "E", "symbols": ["X", "Y"], "default": "X"}, "doc": "A field", "default": "Y", "order": "descending", "aliases": ["g"]}], "owner": "team"}"#
	);
	assert_eq!(
		schema.to_json(JsonForm::Default).unwrap(),
		r#"{"type": "record", "name": "ns.R", "fields": [{"name": "f", "type": {"type": "enum", "name": "E", "symbols": ["X", "Y"]}}]}"#
	);
	// The rendered schema parses back to the same thing
	let reparsed: Schema = schema.to_json(JsonForm::Full).unwrap().parse().unwrap();
	assert!(schema.structurally_eq(&reparsed));
}

#[test]
fn set_namespace() {
	let mut schema: Schema = r#"{
		"type": "record",
		"name": "a.Outer",
		"fields": [
			{"name": "inner", "type": {"type": "fixed", "name": "a.sub.Inner", "size": 1}},
			{"name": "other", "type": {"type": "fixed", "name": "z.Other", "size": 1}}
		]
	}"#
	.parse()
	.unwrap();
	schema.set_namespace(SchemaKey::root(), Some("b")).unwrap();
	assert_eq!(
		schema.canonical_form().unwrap(),
		r#"{"name":"b.Outer","type":"record","fields":[{"name":"inner","type":{"name":"b.sub.Inner","type":"fixed","size":1}},{"name":"other","type":{"name":"z.Other","type":"fixed","size":1}}]}"#
	);
}
