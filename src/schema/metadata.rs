use super::*;

/// Keys that have a meaning in the Avro schema JSON, and consequently can't be
/// used as metadata tags
pub const RESERVED_PROPERTIES: &[&str] = &[
	"type",
	"name",
	"namespace",
	"logicalType",
	"doc",
	"aliases",
	"fields",
	"symbols",
	"items",
	"values",
	"size",
	"precision",
	"scale",
	"default",
	"order",
];

impl Schema {
	/// Metadata tags attached to the node at `key`
	///
	/// Those are the properties of the schema JSON that have no meaning for
	/// Avro itself but that other systems using this schema might need.
	pub fn metadata(&self, key: SchemaKey) -> impl Iterator<Item = (&str, &JsonValue)> {
		self.metadata
			.get(&key)
			.into_iter()
			.flat_map(|tags| tags.iter().map(|(k, v)| (k.as_str(), v)))
	}

	/// Get the value of a single metadata tag
	pub fn metadata_tag(&self, key: SchemaKey, tag: &str) -> Option<&JsonValue> {
		self.metadata.get(&key).and_then(|tags| tags.get(tag))
	}

	/// Attach a metadata tag to the node at `key`
	///
	/// This fails if `tag` is one of the [`RESERVED_PROPERTIES`], or if `key`
	/// doesn't point to a node of this schema. Setting an existing tag again
	/// replaces its value.
	pub fn add_metadata(
		&mut self,
		key: SchemaKey,
		tag: impl Into<String>,
		value: impl Into<JsonValue>,
	) -> Result<(), SchemaError> {
		let tag = tag.into();
		if RESERVED_PROPERTIES.contains(&tag.as_str()) {
			return Err(SchemaError::reserved_property(&tag));
		}
		if self.nodes.get(key.idx).is_none() {
			return Err(SchemaError::invalid_key());
		}
		self.metadata
			.entry(key)
			.or_default()
			.insert(tag, value.into());
		Ok(())
	}
}
