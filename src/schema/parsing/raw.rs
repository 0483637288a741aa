use {
	crate::schema::{FieldOrder, JsonValue},
	serde::de::*,
	std::collections::BTreeMap,
};

pub(crate) enum SchemaNode {
	Type(Type),
	Ref(String),
	Object(Box<SchemaNodeObject>),
	Union(Vec<SchemaNode>),
}

#[derive(serde_derive::Deserialize, Clone, Copy, Debug)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Type {
	// Primitive types
	Null,
	Boolean,
	Int,
	Long,
	Float,
	Double,
	Bytes,
	String,
	// Complex types
	Array,
	Map,
	Record,
	Error,
	Enum,
	Fixed,
}

#[derive(serde_derive::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaNodeObject {
	/// If there is a logical type, this can be a primitive type or type object
	/// but not a ComplexType, but if there is none it must be a ComplexType.
	#[serde(rename = "type")]
	pub(crate) type_: SchemaNode,
	pub(crate) logical_type: Option<String>,
	/// For named types
	pub(crate) name: Option<String>,
	/// For named types
	pub(crate) namespace: Option<String>,
	/// For named types
	pub(crate) doc: Option<String>,
	/// For named types
	pub(crate) aliases: Option<Vec<String>>,
	/// For record type
	pub(crate) fields: Option<Vec<Field>>,
	/// For enum type
	pub(crate) symbols: Option<Vec<String>>,
	/// For enum type
	pub(crate) default: Option<JsonValue>,
	/// For array type
	pub(crate) items: Option<SchemaNode>,
	/// For map type
	pub(crate) values: Option<SchemaNode>,
	/// For fixed type
	pub(crate) size: Option<usize>,
	/// For decimal logical type
	pub(crate) precision: Option<usize>,
	/// For decimal logical type
	pub(crate) scale: Option<u32>,
	/// Anything else is a metadata tag
	#[serde(flatten)]
	pub(crate) metadata: BTreeMap<String, JsonValue>,
}

#[derive(serde_derive::Deserialize)]
pub(crate) struct Field {
	pub(crate) name: String,
	#[serde(rename = "type")]
	pub(crate) type_: SchemaNode,
	pub(crate) doc: Option<String>,
	#[serde(default)]
	pub(crate) aliases: Vec<String>,
	/// `"default": null` is a default, which is different from no default
	#[serde(default, deserialize_with = "deserialize_some")]
	pub(crate) default: Option<JsonValue>,
	#[serde(default)]
	pub(crate) order: FieldOrder,
}

fn deserialize_some<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
	D: Deserializer<'de>,
{
	JsonValue::deserialize(deserializer).map(Some)
}

impl<'de> Deserialize<'de> for SchemaNode {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct SchemaNodeVisitor;
		impl<'de> Visitor<'de> for SchemaNodeVisitor {
			type Value = SchemaNode;

			fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
				write!(
					formatter,
					"A string (type) or an object with a `type` field or an array (union)"
				)
			}

			fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				// That's an object.
				Ok(SchemaNode::Object(Deserialize::deserialize(
					serde::de::value::MapAccessDeserializer::new(map),
				)?))
			}

			fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
			where
				A: SeqAccess<'de>,
			{
				// That's a union.
				Ok(SchemaNode::Union(Deserialize::deserialize(
					serde::de::value::SeqAccessDeserializer::new(seq),
				)?))
			}

			fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
			where
				E: Error,
			{
				// That's a type right away, or a ref.
				Ok(
					match Type::deserialize(value::StrDeserializer::<FailedDeserialization>::new(v))
					{
						Ok(Type::Error) => SchemaNode::Ref(v.to_owned()),
						Ok(type_) => SchemaNode::Type(type_),
						Err(FailedDeserialization) => SchemaNode::Ref(v.to_owned()),
					},
				)
			}
		}
		deserializer.deserialize_any(SchemaNodeVisitor)
	}
}

#[derive(thiserror::Error, Debug)]
#[error("Failed to deserialize")]
struct FailedDeserialization;
impl Error for FailedDeserialization {
	fn custom<T: std::fmt::Display>(_msg: T) -> Self {
		FailedDeserialization
	}
}
