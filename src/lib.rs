//! # Getting started
//!
//! ```
//! use avro_resolve::{schema::Schema, value::*};
//!
//! // Data was written with this schema
//! let writer: Schema = r#"
//! {
//! 	"type": "record",
//! 	"name": "Test",
//! 	"fields": [
//! 		{ "name": "field", "type": "int" }
//! 	]
//! }
//! "#
//! .parse()
//! .expect("Failed to parse schema");
//!
//! // ...and we read it with this one
//! let reader: Schema = r#"
//! {
//! 	"type": "record",
//! 	"name": "Test",
//! 	"fields": [
//! 		{ "name": "field", "type": "long" },
//! 		{ "name": "other", "type": "string", "default": "hello" }
//! 	]
//! }
//! "#
//! .parse()
//! .expect("Failed to parse schema");
//!
//! // Compile once...
//! let target = ValueType::of(reader.root());
//! let (read_plan, _) =
//! 	avro_resolve::resolve_reader(&reader, &writer, &target).expect("Incompatible schemas");
//!
//! // ...read many times
//! let avro_datum = &[6];
//! assert_eq!(
//! 	avro_resolve::from_datum_slice(avro_datum, &read_plan).expect("Failed to deserialize"),
//! 	Value::Record(Record::new([
//! 		("field", Value::Long(3)),
//! 		("other", Value::String("hello".to_owned())),
//! 	]))
//! );
//!
//! // Writing works the same way
//! let write_plan = avro_resolve::resolve_writer(&writer, &writer, &ValueType::of(writer.root()))
//! 	.expect("Incompatible schemas");
//! assert_eq!(
//! 	avro_resolve::to_datum_vec(&Value::Record(Record::new([("field", Value::Int(3))])), &write_plan)
//! 		.expect("Failed to serialize"),
//! 	avro_datum
//! );
//! ```
//!
//! # Schemas
//!
//! The [`schema`] module holds the schema model, along with its
//! [parsing canonical form](schema::SchemaRef::canonical_form) and
//! [fingerprint](schema::SchemaRef::fingerprint).
//!
//! # Plans
//!
//! Resolving a reader schema against a writer schema (or a source schema
//! against a target schema) is done once and gives a plan, that is then
//! executed against a [`Decoder`](codec::Decoder) or
//! [`Encoder`](codec::Encoder) for every datum. See the [`resolve`] module
//! documentation.

#![warn(missing_docs)]

pub mod codec;
pub mod matcher;
pub mod protocol;
pub mod resolve;
pub mod schema;
pub mod value;

pub use {
	resolve::{ReadPlan, ResolveError, SkipPlan, WritePlan},
	schema::Schema,
	value::{Value, ValueType},
};

use codec::{BinaryDecoder, BinaryEncoder, DeError, SerError};

/// Compile the plans that read data written with `writer` as values of type
/// `target`, through the `reader` schema
///
/// This uses the default [`ResolverConfig`](resolve::ResolverConfig). See
/// [`Resolver::resolve_reader`](resolve::Resolver::resolve_reader).
pub fn resolve_reader(
	reader: &Schema,
	writer: &Schema,
	target: &ValueType,
) -> Result<(ReadPlan, SkipPlan), ResolveError> {
	resolve::Resolver::default().resolve_reader(reader, writer, target)
}

/// Compile the plan that writes values of type `source_type`, conforming to
/// the `source` schema, as data of the `target` schema
///
/// This uses the default [`ResolverConfig`](resolve::ResolverConfig). See
/// [`Resolver::resolve_writer`](resolve::Resolver::resolve_writer).
pub fn resolve_writer(
	source: &Schema,
	target: &Schema,
	source_type: &ValueType,
) -> Result<WritePlan, ResolveError> {
	resolve::Resolver::default().resolve_writer(source, target, source_type)
}

/// Read a single avro datum from a slice, using the standard binary encoding
pub fn from_datum_slice(slice: &[u8], plan: &ReadPlan) -> Result<Value, DeError> {
	plan.read(&mut BinaryDecoder::from_slice(slice))
}

/// Read a single avro datum from an `impl BufRead`, using the standard binary
/// encoding
///
/// If you only have an `impl Read`, wrap it in a
/// [`BufReader`](std::io::BufReader) first.
pub fn from_datum_reader<R: std::io::BufRead>(
	reader: R,
	plan: &ReadPlan,
) -> Result<Value, DeError> {
	plan.read(&mut BinaryDecoder::new(reader))
}

/// Write a single avro datum to the provided `Write`, using the standard
/// binary encoding
///
/// Returns the writer back.
pub fn to_datum<W: std::io::Write>(
	value: &Value,
	writer: W,
	plan: &WritePlan,
) -> Result<W, SerError> {
	let mut encoder = BinaryEncoder::new(writer);
	plan.write(&mut encoder, value)?;
	Ok(encoder.into_inner())
}

/// Write a single avro datum to a newly allocated `Vec`, using the standard
/// binary encoding
pub fn to_datum_vec(value: &Value, plan: &WritePlan) -> Result<Vec<u8>, SerError> {
	to_datum(value, Vec::new(), plan)
}
