use {
	avro_resolve::{protocol::Protocol, schema::RegularType},
	pretty_assertions::assert_eq,
};

const GREETER: &str = r#"{
	"protocol": "Greeter",
	"namespace": "com.acme",
	"doc": "Greets people",
	"types": [
		{"type": "record", "name": "Greeting", "fields": [{"name": "message", "type": "string"}]},
		{"type": "error", "name": "Curse", "fields": [{"name": "message", "type": "string"}]},
		{"type": "enum", "name": "Mood", "namespace": "com.acme.moods", "symbols": ["HAPPY", "GRUMPY"]}
	],
	"messages": {
		"hello": {
			"doc": "Say hello",
			"request": [
				{"name": "greeting", "type": "Greeting"},
				{"name": "mood", "type": "com.acme.moods.Mood"}
			],
			"response": "Greeting",
			"errors": ["Curse"]
		},
		"ping": {
			"request": [],
			"response": "null",
			"one-way": true
		}
	}
}"#;

#[test]
fn parse_protocol() {
	let protocol: Protocol = GREETER.parse().unwrap();
	assert_eq!(protocol.full_name(), "com.acme.Greeter");
	assert_eq!(protocol.namespace(), Some("com.acme"));
	assert_eq!(protocol.doc.as_deref(), Some("Greets people"));
	assert_eq!(protocol.types.len(), 3);

	let greeting = protocol.type_named("com.acme.Greeting").unwrap();
	let curse = protocol.type_named("com.acme.Curse").unwrap();
	let mood = protocol.type_named("com.acme.moods.Mood").unwrap();
	assert!(protocol.type_named("Greeting").is_none());

	let hello = protocol.message("hello").unwrap();
	assert_eq!(hello.doc.as_deref(), Some("Say hello"));
	assert!(!hello.one_way);
	let request: Vec<_> = hello
		.request
		.iter()
		.map(|parameter| (parameter.name.as_str(), parameter.type_))
		.collect();
	assert_eq!(request, [("greeting", greeting), ("mood", mood)]);
	assert_eq!(hello.response, greeting);
	assert_eq!(hello.errors, [curse]);
	assert!(matches!(
		protocol.schema[curse],
		avro_resolve::schema::SchemaNode::RegularType(RegularType::Record(ref record))
			if record.is_error
	));

	let ping = protocol.message("ping").unwrap();
	assert!(ping.one_way);
	assert!(ping.request.is_empty());
	assert!(protocol.schema.at(ping.response).unwrap().is_null());
	assert!(protocol.message("bye").is_none());
}

#[test]
fn protocol_types_have_canonical_forms() {
	let protocol: Protocol = GREETER.parse().unwrap();
	let greeting = protocol.type_named("com.acme.Greeting").unwrap();
	assert_eq!(
		protocol.schema.at(greeting).unwrap().canonical_form().unwrap(),
		r#"{"name":"com.acme.Greeting","type":"record","fields":[{"name":"message","type":"string"}]}"#
	);
}

#[test]
fn set_namespace() {
	let mut protocol: Protocol = GREETER.parse().unwrap();
	protocol.set_namespace(Some("org.other")).unwrap();
	assert_eq!(protocol.full_name(), "org.other.Greeter");
	assert!(protocol.type_named("com.acme.Greeting").is_none());
	let greeting = protocol.type_named("org.other.Greeting").unwrap();
	assert_eq!(protocol.message("hello").unwrap().response, greeting);
	// Nested namespaces move along
	assert!(protocol.type_named("org.other.moods.Mood").is_some());
	protocol.validate().unwrap();
}

#[test]
fn invalid_protocols() {
	for (description, raw) in [
		(
			"one-way message with a response",
			r#"{
				"protocol": "P",
				"messages": {"m": {"request": [], "response": "string", "one-way": true}}
			}"#,
		),
		(
			"error that is not an error record",
			r#"{
				"protocol": "P",
				"types": [{"type": "record", "name": "R", "fields": []}],
				"messages": {"m": {"request": [], "response": "null", "errors": ["R"]}}
			}"#,
		),
		(
			"parameter with an undeclared named type",
			r#"{
				"protocol": "P",
				"messages": {"m": {
					"request": [{"name": "p", "type": {"type": "fixed", "name": "F", "size": 2}}],
					"response": "null"
				}}
			}"#,
		),
		(
			"reference to an unknown type",
			r#"{
				"protocol": "P",
				"messages": {"m": {"request": [], "response": "Unknown"}}
			}"#,
		),
		(
			"missing protocol name",
			r#"{"namespace": "a", "messages": {}}"#,
		),
	] {
		assert!(
			raw.parse::<Protocol>().is_err(),
			"Should have rejected a protocol with {description}"
		);
	}
}

#[test]
fn protocol_without_messages() {
	let protocol: Protocol = r#"{"protocol": "a.b.Empty"}"#.parse().unwrap();
	assert_eq!(protocol.full_name(), "a.b.Empty");
	assert!(protocol.types.is_empty());
	assert!(protocol.messages.is_empty());
}
