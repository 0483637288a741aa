pub(crate) mod raw;

use crate::schema::*;

use std::collections::{BTreeMap, HashMap};

const LATE_NAME_LOOKUP_REMAP_BIT: usize = 1usize << (usize::BITS - 1);

/// Builds the arena from the raw JSON representation
///
/// Several roots may be registered in the same arena (protocols do that), and
/// named types may be referred to before they are defined.
pub(crate) struct SchemaConstructionState {
	nodes: Vec<SchemaNode>,
	metadata: BTreeMap<SchemaKey, BTreeMap<String, JsonValue>>,
	names: HashMap<String, usize>,
	unresolved_names: Vec<Name>,
}

impl SchemaConstructionState {
	pub(crate) fn new() -> Self {
		Self {
			nodes: Vec::new(),
			metadata: BTreeMap::new(),
			names: HashMap::new(),
			unresolved_names: Vec::new(),
		}
	}

	/// Resolve references to names that were used before being defined
	pub(crate) fn finish(mut self) -> Result<Schema, SchemaError> {
		let resolved = self.resolve_late_keys()?;
		if !self.unresolved_names.is_empty() {
			let fix_key = |key: &mut SchemaKey| {
				if key.idx & LATE_NAME_LOOKUP_REMAP_BIT != 0 {
					*key = resolved[key.idx ^ LATE_NAME_LOOKUP_REMAP_BIT];
				}
			};
			for schema_node in &mut self.nodes {
				match schema_node {
					SchemaNode::RegularType(schema_type) => match schema_type {
						RegularType::Array(Array {
							items: key,
							_private,
						})
						| RegularType::Map(Map {
							values: key,
							_private,
						}) => fix_key(key),
						RegularType::Union(union) => union.variants.iter_mut().for_each(fix_key),
						RegularType::Record(record) => {
							record.fields.iter_mut().for_each(|f| fix_key(&mut f.type_))
						}
						RegularType::Null
						| RegularType::Boolean
						| RegularType::Int
						| RegularType::Long
						| RegularType::Float
						| RegularType::Double
						| RegularType::Bytes
						| RegularType::String
						| RegularType::Enum(_)
						| RegularType::Fixed(_) => {}
					},
					SchemaNode::LogicalType { inner, .. } => fix_key(inner),
				}
			}
		}
		Ok(Schema {
			nodes: self.nodes,
			metadata: self.metadata,
		})
	}

	fn resolve_late_keys(&self) -> Result<Vec<SchemaKey>, SchemaError> {
		self.unresolved_names
			.iter()
			.map(|name| {
				self.lookup(name)
					.ok_or_else(|| {
						SchemaError::msg(format_args!(
							"The Schema contains an unknown reference: {name}"
						))
					})
					.map(SchemaKey::from_idx)
			})
			.collect()
	}

	/// A reference that isn't found in the enclosing namespace may still refer
	/// to a type of the null namespace
	fn lookup(&self, name: &Name) -> Option<usize> {
		self.names
			.get(name.fully_qualified_name())
			.or_else(|| match name.namespace() {
				Some(_) => self.names.get(name.name()),
				None => None,
			})
			.copied()
	}

	/// Keys registered by the protocol front-end for its own references
	pub(crate) fn resolve_name(
		&mut self,
		reference: &str,
		enclosing_namespace: Option<&str>,
	) -> SchemaKey {
		let name = Name::resolve(reference, enclosing_namespace);
		match self.lookup(&name) {
			Some(idx) => SchemaKey { idx },
			None => {
				let idx = self.unresolved_names.len();
				self.unresolved_names.push(name);
				SchemaKey {
					idx: idx | LATE_NAME_LOOKUP_REMAP_BIT,
				}
			}
		}
	}

	/// Turn a key that may still be a late lookup into a real key
	///
	/// Only valid after all the types have been registered.
	pub(crate) fn resolved_key(&self, key: SchemaKey) -> Result<SchemaKey, SchemaError> {
		match key.idx & LATE_NAME_LOOKUP_REMAP_BIT {
			0 => Ok(key),
			_ => {
				let name = &self.unresolved_names[key.idx ^ LATE_NAME_LOOKUP_REMAP_BIT];
				self.lookup(name)
					.map(SchemaKey::from_idx)
					.ok_or_else(|| {
						SchemaError::msg(format_args!(
							"The Schema contains an unknown reference: {name}"
						))
					})
			}
		}
	}

	pub(crate) fn register_node(
		&mut self,
		raw_schema: &raw::SchemaNode,
		enclosing_namespace: Option<&str>,
	) -> Result<SchemaKey, SchemaError> {
		self.register_node_inner(raw_schema, enclosing_namespace, None)
	}

	fn push(&mut self, node: SchemaNode) -> SchemaKey {
		let idx = self.nodes.len();
		self.nodes.push(node);
		SchemaKey { idx }
	}

	fn register_node_inner(
		&mut self,
		raw_schema: &raw::SchemaNode,
		enclosing_namespace: Option<&str>,
		will_have_logical_type: Option<&str>,
	) -> Result<SchemaKey, SchemaError> {
		Ok(match *raw_schema {
			raw::SchemaNode::Type(type_) => self.push(SchemaNode::RegularType(match type_ {
				raw::Type::Null => RegularType::Null,
				raw::Type::Boolean => RegularType::Boolean,
				raw::Type::Int => RegularType::Int,
				raw::Type::Long => RegularType::Long,
				raw::Type::Float => RegularType::Float,
				raw::Type::Double => RegularType::Double,
				raw::Type::Bytes => RegularType::Bytes,
				raw::Type::String => RegularType::String,
				complex_type @ (raw::Type::Array
				| raw::Type::Map
				| raw::Type::Record
				| raw::Type::Error
				| raw::Type::Enum
				| raw::Type::Fixed) => {
					return Err(SchemaError::msg(format_args!(
						"Expected primitive type name, but got {:?} as type which is a complex \
							type, so should be in an object.",
						complex_type
					)))
				}
			})),
			raw::SchemaNode::Object(ref object) => {
				self.register_object(object, enclosing_namespace, will_have_logical_type)?
			}
			raw::SchemaNode::Union(ref union_schemas) => {
				// Reserve the spot for us
				let key = self.push(SchemaNode::RegularType(RegularType::Null));
				let variants = union_schemas
					.iter()
					.map(|schema| self.register_node_inner(schema, enclosing_namespace, None))
					.collect::<Result<_, _>>()?;
				self.nodes[key.idx] = SchemaNode::RegularType(RegularType::Union(Union {
					variants,
					_private: (),
				}));
				key
			}
			raw::SchemaNode::Ref(ref reference) => {
				// This is supposed to be the fullname of a previous named type, but
				// we also support references to types that are defined later.
				self.resolve_name(reference, enclosing_namespace)
			}
		})
	}

	fn register_object(
		&mut self,
		object: &raw::SchemaNodeObject,
		enclosing_namespace: Option<&str>,
		will_have_logical_type: Option<&str>,
	) -> Result<SchemaKey, SchemaError> {
		if let Some(ref logical_type) = object.logical_type {
			return self.register_logical_type(
				object,
				logical_type,
				enclosing_namespace,
				will_have_logical_type,
			);
		}

		let type_ = match object.type_ {
			raw::SchemaNode::Type(
				type_ @ (raw::Type::Array
				| raw::Type::Map
				| raw::Type::Record
				| raw::Type::Error
				| raw::Type::Enum
				| raw::Type::Fixed),
			) => type_,
			ref inner_type => {
				// We have to allow {"type": {"type": "string"}} and {"type": "string"}
				// (an object with an inner type and nothing else is a valid
				// representation). Keys that would only make sense for a complex type
				// would be ignored, so we reject them.
				if object.fields.is_some()
					|| object.symbols.is_some()
					|| object.items.is_some()
					|| object.values.is_some()
					|| object.size.is_some()
				{
					return Err(SchemaError::new(
						"Got unnecessarily-nested type, but local object properties are set \
							- those would be ignored",
					));
				}
				let namespace = match object.namespace {
					Some(ref namespace) => Some(namespace.as_str()),
					None => enclosing_namespace,
				};
				let key = self.register_node_inner(inner_type, namespace, will_have_logical_type)?;
				if !matches!(inner_type, raw::SchemaNode::Ref(_)) {
					self.add_metadata(key, &object.metadata);
				}
				return Ok(key);
			}
		};

		// Register name->node idx to the name HashMap
		let name = match object.name {
			None => None,
			Some(ref name) => {
				let namespace = match (name.contains('.'), &object.namespace) {
					(true, _) => None,
					(false, Some(namespace)) => Some(namespace.as_str()),
					(false, None) => enclosing_namespace,
				};
				Some(Name::resolve(name, namespace))
			}
		};
		let key = self.push(SchemaNode::RegularType(RegularType::Null)); // Reserve the spot for us
		if let Some(ref name) = name {
			if self
				.names
				.insert(name.fully_qualified_name().to_owned(), key.idx)
				.is_some()
			{
				return Err(SchemaError::msg(format_args!(
					"The Schema contains duplicate definitions for {name}"
				)));
			}
		}
		let name = |type_: raw::Type| match name {
			None => Err(SchemaError::msg(format_args!(
				"Missing name for type {:?}",
				type_
			))),
			Some(ref name) => Ok(name.clone()),
		};
		let aliases = |name: &Name| -> Vec<Name> {
			object
				.aliases
				.iter()
				.flatten()
				.map(|alias| Name::resolve(alias, name.namespace()))
				.collect()
		};

		macro_rules! field {
			($type_: ident $name: ident) => {
				match object.$name {
					Some(ref v) => v,
					None => {
						return Err(SchemaError::msg(format_args!(
							concat!("Missing field `", stringify!($name), "` on type {:?}",),
							$type_
						)));
					}
				}
			};
		}
		let regular_type = match type_ {
			t @ raw::Type::Array => RegularType::Array(Array {
				items: self.register_node_inner(field!(t items), enclosing_namespace, None)?,
				_private: (),
			}),
			t @ raw::Type::Map => RegularType::Map(Map {
				values: self.register_node_inner(field!(t values), enclosing_namespace, None)?,
				_private: (),
			}),
			t @ raw::Type::Enum => {
				let name = name(t)?;
				RegularType::Enum(Enum {
					symbols: field!(t symbols).clone(),
					default: match object.default {
						None => None,
						Some(JsonValue::String(ref default)) => Some(default.clone()),
						Some(ref other) => {
							return Err(SchemaError::msg(format_args!(
								"Enum default should be a symbol, got {other}"
							)))
						}
					},
					aliases: aliases(&name),
					doc: object.doc.clone(),
					name,
					_private: (),
				})
			}
			t @ raw::Type::Fixed => {
				let name = name(t)?;
				RegularType::Fixed(Fixed {
					size: *field!(t size),
					aliases: aliases(&name),
					doc: object.doc.clone(),
					name,
					_private: (),
				})
			}
			t @ (raw::Type::Record | raw::Type::Error) => {
				let name = name(t)?;
				let fields = field!(t fields)
					.iter()
					.map(|field| {
						Ok(RecordField {
							name: field.name.clone(),
							type_: self.register_node_inner(&field.type_, name.namespace(), None)?,
							aliases: field.aliases.clone(),
							doc: field.doc.clone(),
							default: field.default.clone(),
							order: field.order,
							_private: (),
						})
					})
					.collect::<Result<_, SchemaError>>()?;
				RegularType::Record(Record {
					fields,
					aliases: aliases(&name),
					doc: object.doc.clone(),
					is_error: matches!(t, raw::Type::Error),
					name,
					_private: (),
				})
			}
			raw::Type::Null
			| raw::Type::Boolean
			| raw::Type::Int
			| raw::Type::Long
			| raw::Type::Float
			| raw::Type::Double
			| raw::Type::Bytes
			| raw::Type::String => {
				return Err(SchemaError::new("Primitive types are handled as nested types"))
			}
		};
		self.nodes[key.idx] = SchemaNode::RegularType(regular_type);
		self.add_metadata(key, &object.metadata);
		Ok(key)
	}

	fn register_logical_type(
		&mut self,
		object: &raw::SchemaNodeObject,
		logical_type: &str,
		enclosing_namespace: Option<&str>,
		will_have_logical_type: Option<&str>,
	) -> Result<SchemaKey, SchemaError> {
		if let Some(will_have_logical_type) = will_have_logical_type {
			return Err(SchemaError::msg(format_args!(
				"Immediately-nested logical types: {:?} in {:?}",
				logical_type, will_have_logical_type
			)));
		}
		let logical_type = match logical_type {
			"decimal" => LogicalType::Decimal(Decimal {
				precision: object.precision.ok_or_else(|| {
					SchemaError::new("Missing field `precision` on logical type \"decimal\"")
				})?,
				scale: object.scale.unwrap_or(0),
				_private: (),
			}),
			"uuid" => LogicalType::Uuid,
			"date" => LogicalType::Date,
			"time-millis" => LogicalType::TimeMillis,
			"time-micros" => LogicalType::TimeMicros,
			"time-nanos" => LogicalType::TimeNanos,
			"timestamp-millis" => LogicalType::TimestampMillis,
			"timestamp-micros" => LogicalType::TimestampMicros,
			"timestamp-nanos" => LogicalType::TimestampNanos,
			"duration" => LogicalType::Duration,
			unknown => LogicalType::Unknown(UnknownLogicalType::new(unknown)),
		};
		let key = self.push(SchemaNode::RegularType(RegularType::Null)); // Reserve the spot for us

		// The logical type annotates the object itself with the logicalType key removed
		// (e.g. {"type": "fixed", "name": "x", "size": 16, "logicalType": "uuid"})
		let inner = match object.type_ {
			raw::SchemaNode::Type(
				raw::Type::Array
				| raw::Type::Map
				| raw::Type::Record
				| raw::Type::Error
				| raw::Type::Enum
				| raw::Type::Fixed,
			) => self.register_object_without_logical_type(
				object,
				enclosing_namespace,
				logical_type.as_str(),
			)?,
			ref inner_type => self.register_node_inner(
				inner_type,
				enclosing_namespace,
				Some(logical_type.as_str()),
			)?,
		};
		self.nodes[key.idx] = SchemaNode::LogicalType {
			inner,
			logical_type,
		};
		self.add_metadata(key, &object.metadata);
		Ok(key)
	}

	fn register_object_without_logical_type(
		&mut self,
		object: &raw::SchemaNodeObject,
		enclosing_namespace: Option<&str>,
		logical_type: &str,
	) -> Result<SchemaKey, SchemaError> {
		let key = self.register_object(
			&raw::SchemaNodeObject {
				type_: match object.type_ {
					raw::SchemaNode::Type(type_) => raw::SchemaNode::Type(type_),
					_ => return Err(SchemaError::new("Expected complex type")),
				},
				logical_type: None,
				name: object.name.clone(),
				namespace: object.namespace.clone(),
				doc: object.doc.clone(),
				aliases: object.aliases.clone(),
				fields: None,
				symbols: object.symbols.clone(),
				default: object.default.clone(),
				items: None,
				values: None,
				size: object.size,
				precision: None,
				scale: None,
				metadata: BTreeMap::new(),
			},
			enclosing_namespace,
			Some(logical_type),
		)?;
		match self.nodes[key.idx] {
			SchemaNode::RegularType(RegularType::Fixed(_) | RegularType::Enum(_)) => Ok(key),
			_ => Err(SchemaError::msg(format_args!(
				"Logical type {logical_type:?} may only annotate primitive types, fixed or enum \
					when declared in the same object"
			))),
		}
	}

	fn add_metadata(&mut self, key: SchemaKey, metadata: &BTreeMap<String, JsonValue>) {
		if !metadata.is_empty() {
			self.metadata
				.entry(key)
				.or_default()
				.extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
		}
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq};

	#[test]
	fn unordered_name_definitions() {
		let schema: Schema = r#"{
			"type": "record",
			"name": "a.R",
			"fields": [
				{"name": "first", "type": "Later"},
				{"name": "later", "type": {"type": "fixed", "name": "Later", "size": 2}}
			]
		}"#
		.parse()
		.unwrap();
		let RegularType::Record(ref record) = *schema.root().regular() else {
			panic!("Expected record")
		};
		assert_eq!(record.fields[0].type_, record.fields[1].type_);
		assert_eq!(
			schema.root().at(record.fields[0].type_).name().unwrap().fully_qualified_name(),
			"a.Later"
		);
	}

	#[test]
	fn field_attributes() {
		let schema: Schema = r#"{
			"type": "error",
			"name": "E",
			"namespace": "ns",
			"aliases": ["Old", "other.Older"],
			"fields": [
				{"name": "a", "type": "int", "default": 1, "aliases": ["b"], "order": "ignore"},
				{"name": "n", "type": ["null", "int"], "default": null},
				{"name": "none", "type": "int"}
			]
		}"#
		.parse()
		.unwrap();
		let RegularType::Record(ref record) = *schema.root().regular() else {
			panic!("Expected record")
		};
		assert!(record.is_error);
		assert_eq!(
			record
				.aliases
				.iter()
				.map(Name::fully_qualified_name)
				.collect::<Vec<_>>(),
			["ns.Old", "other.Older"]
		);
		assert_eq!(record.fields[0].default, Some(JsonValue::from(1)));
		assert_eq!(record.fields[0].aliases, ["b"]);
		assert_eq!(record.fields[0].order, FieldOrder::Ignore);
		assert_eq!(record.fields[1].default, Some(JsonValue::Null));
		assert_eq!(record.fields[2].default, None);
	}

	#[test]
	fn logical_types_and_metadata() {
		let schema: Schema = r#"[
			{"type": "string", "logicalType": "uuid"},
			{"type": "fixed", "name": "D", "size": 12, "logicalType": "duration", "owner": "me"},
			{"type": "bytes", "logicalType": "decimal", "precision": 5},
			{"type": "long", "logicalType": "something-else"},
			{"type": "int", "java-class": "java.lang.Short"}
		]"#
		.parse()
		.unwrap();
		let variants: Vec<SchemaRef> = schema.root().union_variants().unwrap().collect();
		assert_eq!(variants[0].logical_type(), Some(&LogicalType::Uuid));
		assert_eq!(variants[1].logical_type(), Some(&LogicalType::Duration));
		assert_eq!(
			schema.metadata_tag(variants[1].key(), "owner"),
			Some(&JsonValue::from("me"))
		);
		assert_eq!(
			variants[2].logical_type(),
			Some(&LogicalType::Decimal(Decimal::new(0, 5)))
		);
		// Unknown logical types are handled as their underlying type
		assert_eq!(variants[3].logical_type(), None);
		assert!(matches!(variants[3].regular(), RegularType::Long));
		assert!(matches!(variants[4].node(), SchemaNode::RegularType(RegularType::Int)));
		assert_eq!(
			schema.metadata_tag(variants[4].key(), "java-class"),
			Some(&JsonValue::from("java.lang.Short"))
		);
	}

	#[test]
	fn unknown_reference() {
		assert_eq!(
			r#"{"type":"array","items":"Nope"}"#
				.parse::<Schema>()
				.unwrap_err()
				.to_string(),
			"The Schema contains an unknown reference: Nope"
		);
	}
}
