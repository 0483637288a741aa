use super::*;

use {
	serde::ser::*,
	std::{borrow::Cow, cell::Cell, io},
};

/// Which human-readable JSON rendering of a schema to produce
///
/// Both renderings write each named type once and refer to it by name
/// afterwards, and use namespace-relative names where possible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JsonForm {
	/// Types, names, logical types and their parameters
	Default,
	/// Everything in [`Default`](Self::Default), plus documentation,
	/// aliases, field defaults, field order, enum defaults and metadata tags
	Full,
}

impl<'a> SchemaRef<'a> {
	/// Render this schema as JSON, with `", "` and `": "` separators
	pub fn to_json(self, form: JsonForm) -> Result<String, SchemaError> {
		let mut serializer = serde_json::Serializer::with_formatter(Vec::new(), SpacedFormatter);
		self.serializable(form)
			.serialize(&mut serializer)
			.map_err(SchemaError::serde_json)?;
		String::from_utf8(serializer.into_inner()).map_err(|e| {
			SchemaError::msg(format_args!(
				"serde_json should not emit invalid UTF-8 but got {e}"
			))
		})
	}

	/// Obtain an `impl Serialize` for this schema, to use with any serde
	/// serializer
	pub fn serializable(self, form: JsonForm) -> SchemaJson<'a> {
		SchemaJson {
			schema_ref: self,
			form,
		}
	}
}

impl Schema {
	/// Render the root of this schema as JSON
	///
	/// See [`SchemaRef::to_json`]
	pub fn to_json(&self, form: JsonForm) -> Result<String, SchemaError> {
		self.root().to_json(form)
	}
}

/// A schema along with the [`JsonForm`] it should be serialized as
pub struct SchemaJson<'a> {
	schema_ref: SchemaRef<'a>,
	form: JsonForm,
}

/// Serializes the root in [`JsonForm::Full`]
impl Serialize for Schema {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.root().serializable(JsonForm::Full).serialize(serializer)
	}
}

impl Serialize for SchemaJson<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let schema = self.schema_ref.schema();
		// This serves both to avoid infinite recursion and to avoid writing the
		// same node twice in an unnamed manner.
		let node_traversal_state = vec![Cell::new(0); schema.nodes.len()];

		let n_written_names = Cell::new(1);
		SerializeSchema {
			schema,
			form: self.form,
			key: self.schema_ref.key(),
			parent_namespace: None,
			n_written_names: &n_written_names,
			node_traversal_state: node_traversal_state.as_slice(),
		}
		.serialize(serializer)
	}
}

struct SerializeSchema<'a, K> {
	schema: &'a Schema,
	form: JsonForm,
	key: K,
	n_written_names: &'a Cell<u64>,
	node_traversal_state: &'a [Cell<u64>],
	parent_namespace: Option<&'a str>,
}

impl<'a, K> SerializeSchema<'a, K> {
	fn serializable<NK>(&self, key: NK) -> SerializeSchema<'a, NK> {
		self.serializable_with_namespace(key, self.parent_namespace)
	}
	/// Current node overrides the namespace, so we need to propagate that to
	/// children
	fn serializable_with_namespace<NK>(
		&self,
		key: NK,
		namespace: Option<&'a str>,
	) -> SerializeSchema<'a, NK> {
		SerializeSchema {
			key,
			schema: self.schema,
			form: self.form,
			n_written_names: self.n_written_names,
			node_traversal_state: self.node_traversal_state,
			parent_namespace: namespace,
		}
	}
}
impl<'a> SerializeSchema<'a, SchemaKey> {
	/// Make sure we aren't cycling
	fn no_cycle_guard<E: serde::ser::Error>(&self) -> Result<NoCycleGuard<'a>, E> {
		let cell = &self.node_traversal_state[self.key.idx];
		let n_written_names = self.n_written_names.get();
		let prev_n_written_names = cell.replace(n_written_names);
		// If we encounter the same node without having written a new name, this means
		// that we are in a cycle. If however we have written a new name, then next loop
		// we will likely just reference that name, so the schema serialization will not
		// loop indefinitely. -> Let's allow another round.
		if prev_n_written_names >= n_written_names {
			Err(E::custom(
				"Schema contains a cycle that can't be avoided using named references",
			))
		} else {
			Ok(NoCycleGuard {
				node_traversal_state: cell,
			})
		}
	}
	/// If this node was already written, return true (don't write it again).
	/// Otherwise, return false, assume we'll write it entirely and increment
	/// the counter of written names.
	fn should_write_as_ref(&self) -> bool {
		let key_generation = &self.node_traversal_state[self.key.idx];
		if key_generation.get() > 0 {
			true
		} else {
			let generation = self.n_written_names.get();
			key_generation.set(generation);
			// Resets the cycle checker for all parent nodes
			self.n_written_names.set(generation + 1);
			false
		}
	}
	fn str_for_ref(&self, name: &'a Name) -> Cow<'a, str> {
		if self.parent_namespace == name.namespace() {
			Cow::Borrowed(name.name())
		} else if name.namespace().is_none() {
			Cow::Owned(format!(".{}", name.fully_qualified_name()))
		} else {
			Cow::Borrowed(name.fully_qualified_name())
		}
	}
	fn serialize_name<M: SerializeMap>(&self, map: &mut M, name: &'a Name) -> Result<(), M::Error> {
		if self.parent_namespace == name.namespace() {
			map.serialize_entry("name", name.name())?;
		} else if name.namespace().is_none() {
			// To get the "null namespace" back, it's specified that one should write
			// "namespace": "" in the json.
			map.serialize_entry("name", name.name())?;
			map.serialize_entry("namespace", "")?;
		} else {
			map.serialize_entry("name", name.fully_qualified_name())?;
		}
		Ok(())
	}
	fn serialize_named_extras<M: SerializeMap>(
		&self,
		map: &mut M,
		doc: &Option<String>,
		aliases: &[Name],
	) -> Result<(), M::Error> {
		if self.form == JsonForm::Full {
			if let Some(doc) = doc {
				map.serialize_entry("doc", doc)?;
			}
			if !aliases.is_empty() {
				map.serialize_entry(
					"aliases",
					&aliases
						.iter()
						.map(Name::fully_qualified_name)
						.collect::<Vec<_>>(),
				)?;
			}
		}
		Ok(())
	}
	fn serialize_metadata<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
		if self.form == JsonForm::Full {
			for (tag, value) in self.schema.metadata(self.key) {
				map.serialize_entry(tag, value)?;
			}
		}
		Ok(())
	}
	fn has_metadata(&self) -> bool {
		self.form == JsonForm::Full && self.schema.metadata(self.key).next().is_some()
	}
}

#[must_use]
struct NoCycleGuard<'a> {
	node_traversal_state: &'a Cell<u64>,
}
impl NoCycleGuard<'_> {
	fn release(self) {
		self.node_traversal_state.set(0);
	}
}

impl Serialize for SerializeSchema<'_, SchemaKey> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let node = self
			.schema
			.nodes
			.get(self.key.idx)
			.ok_or_else(|| S::Error::custom("SchemaKey refers to non-existing node"))?;
		match node {
			SchemaNode::LogicalType {
				inner,
				logical_type,
			} => {
				let no_cycle_guard = self.no_cycle_guard()?;
				let mut map = serializer.serialize_map(None)?;
				map.serialize_entry("type", &self.serializable(*inner))?;
				map.serialize_entry("logicalType", logical_type.as_str())?;
				if let LogicalType::Decimal(decimal) = logical_type {
					map.serialize_entry("precision", &decimal.precision)?;
					map.serialize_entry("scale", &decimal.scale)?;
				}
				self.serialize_metadata(&mut map)?;
				let res = map.end();
				no_cycle_guard.release();
				res
			}
			SchemaNode::RegularType(schema_type) => match *schema_type {
				RegularType::Null
				| RegularType::Boolean
				| RegularType::Int
				| RegularType::Long
				| RegularType::Float
				| RegularType::Double
				| RegularType::Bytes
				| RegularType::String => match self.has_metadata() {
					false => serializer.serialize_str(schema_type.type_name()),
					true => {
						let mut map = serializer.serialize_map(None)?;
						map.serialize_entry("type", schema_type.type_name())?;
						self.serialize_metadata(&mut map)?;
						map.end()
					}
				},
				RegularType::Array(Array { items, _private }) => {
					let no_cycle_guard = self.no_cycle_guard()?;
					let mut map = serializer.serialize_map(None)?;
					map.serialize_entry("type", "array")?;
					map.serialize_entry("items", &self.serializable(items))?;
					self.serialize_metadata(&mut map)?;
					let res = map.end();
					no_cycle_guard.release();
					res
				}
				RegularType::Map(Map { values, _private }) => {
					let no_cycle_guard = self.no_cycle_guard()?;
					let mut map = serializer.serialize_map(None)?;
					map.serialize_entry("type", "map")?;
					map.serialize_entry("values", &self.serializable(values))?;
					self.serialize_metadata(&mut map)?;
					let res = map.end();
					no_cycle_guard.release();
					res
				}
				RegularType::Union(Union {
					ref variants,
					_private,
				}) => {
					let no_cycle_guard = self.no_cycle_guard()?;
					let mut seq = serializer.serialize_seq(Some(variants.len()))?;
					for &union_variant_key in variants {
						seq.serialize_element(&self.serializable(union_variant_key))?;
					}
					let res = seq.end();
					no_cycle_guard.release();
					res
				}
				RegularType::Record(ref record) => {
					if self.should_write_as_ref() {
						serializer.serialize_str(&self.str_for_ref(&record.name))
					} else {
						let mut map = serializer.serialize_map(None)?;
						map.serialize_entry("type", schema_type.type_name())?;
						self.serialize_name(&mut map, &record.name)?;
						self.serialize_named_extras(&mut map, &record.doc, &record.aliases)?;
						map.serialize_entry(
							"fields",
							&self.serializable_with_namespace(
								record.fields.as_slice(),
								record.name.namespace(),
							),
						)?;
						self.serialize_metadata(&mut map)?;
						map.end()
					}
				}
				RegularType::Enum(ref enum_) => {
					if self.should_write_as_ref() {
						serializer.serialize_str(&self.str_for_ref(&enum_.name))
					} else {
						let mut map = serializer.serialize_map(None)?;
						map.serialize_entry("type", "enum")?;
						self.serialize_name(&mut map, &enum_.name)?;
						self.serialize_named_extras(&mut map, &enum_.doc, &enum_.aliases)?;
						map.serialize_entry("symbols", &enum_.symbols)?;
						if let (JsonForm::Full, Some(default)) = (self.form, &enum_.default) {
							map.serialize_entry("default", default)?;
						}
						self.serialize_metadata(&mut map)?;
						map.end()
					}
				}
				RegularType::Fixed(ref fixed) => {
					if self.should_write_as_ref() {
						serializer.serialize_str(&self.str_for_ref(&fixed.name))
					} else {
						let mut map = serializer.serialize_map(None)?;
						map.serialize_entry("type", "fixed")?;
						self.serialize_name(&mut map, &fixed.name)?;
						self.serialize_named_extras(&mut map, &fixed.doc, &fixed.aliases)?;
						map.serialize_entry("size", &fixed.size)?;
						self.serialize_metadata(&mut map)?;
						map.end()
					}
				}
			},
		}
	}
}

impl Serialize for SerializeSchema<'_, &[RecordField]> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut seq = serializer.serialize_seq(Some(self.key.len()))?;
		for field in self.key {
			seq.serialize_element(&self.serializable(field))?;
		}
		seq.end()
	}
}

impl Serialize for SerializeSchema<'_, &RecordField> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let field = self.key;
		let mut map = serializer.serialize_map(None)?;
		map.serialize_entry("name", &field.name)?;
		map.serialize_entry("type", &self.serializable(field.type_))?;
		if self.form == JsonForm::Full {
			if let Some(ref doc) = field.doc {
				map.serialize_entry("doc", doc)?;
			}
			if let Some(ref default) = field.default {
				map.serialize_entry("default", default)?;
			}
			if field.order != FieldOrder::Ascending {
				map.serialize_entry("order", field.order.as_str())?;
			}
			if !field.aliases.is_empty() {
				map.serialize_entry("aliases", &field.aliases)?;
			}
		}
		map.end()
	}
}

/// `serde_json` formatter that writes `", "` between elements and `": "`
/// between keys and values, and no other whitespace
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
	fn begin_array_value<W: ?Sized + io::Write>(
		&mut self,
		writer: &mut W,
		first: bool,
	) -> io::Result<()> {
		match first {
			true => Ok(()),
			false => writer.write_all(b", "),
		}
	}

	fn begin_object_key<W: ?Sized + io::Write>(
		&mut self,
		writer: &mut W,
		first: bool,
	) -> io::Result<()> {
		match first {
			true => Ok(()),
			false => writer.write_all(b", "),
		}
	}

	fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
		writer.write_all(b": ")
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq};

	const SCHEMA: &str = r#"{
		"type": "record",
		"name": "a.R",
		"doc": "A record",
		"aliases": ["a.Old"],
		"fields": [
			{"name": "e", "type": {"type": "enum", "name": "E", "symbols": ["X", "Y"], "default": "X"}, "default": "Y"},
			{"name": "ts", "type": {"type": "long", "logicalType": "timestamp-micros", "tag": 1}},
			{"name": "again", "type": ["null", "E"], "order": "descending", "default": null}
		]
	}"#;

	#[test]
	fn default_form() {
		let schema: Schema = SCHEMA.parse().unwrap();
		assert_eq!(
			schema.to_json(JsonForm::Default).unwrap(),
			r#"{"type": "record", "name": "a.R", "fields": [{"name": "e", "type": {"type": "enum", "name": "E", "symbols": ["X", "Y"]}}, {"name": "ts", "type": {"type": "long", "logicalType": "timestamp-micros"}}, {"name": "again", "type": ["null", "E"]}]}"#
		);
	}

	#[test]
	fn full_form() {
		let schema: Schema = SCHEMA.parse().unwrap();
		assert_eq!(
			schema.to_json(JsonForm::Full).unwrap(),
			r#"{"type": "record", "name": "a.R", "doc": "A record", "aliases": ["a.Old"], "fields": [{"name": "e", "type": {"type": "enum", "name": "E", "symbols": ["X", "Y"], "default": "X"}, "default": "Y"}, {"name": "ts", "type": {"type": "long", "logicalType": "timestamp-micros", "tag": 1}}, {"name": "again", "type": ["null", "E"], "default": null, "order": "descending"}]}"#
		);
		// Reparsing the full form gives the same schema
		let reparsed: Schema = schema.to_json(JsonForm::Full).unwrap().parse().unwrap();
		assert!(reparsed.structurally_eq(&schema));
		assert_eq!(
			reparsed.to_json(JsonForm::Full).unwrap(),
			schema.to_json(JsonForm::Full).unwrap()
		);
	}

	#[test]
	fn unavoidable_cycle() {
		let schema = Schema::from_nodes(vec![
			Union::new(vec![SchemaKey::from_idx(1), SchemaKey::from_idx(2)]).into(),
			RegularType::Null.into(),
			Array::new(SchemaKey::from_idx(0)).into(),
		]);
		assert_eq!(
			schema.to_json(JsonForm::Default).unwrap_err().to_string(),
			"Schema contains a cycle that can't be avoided using named references"
		);
	}
}
