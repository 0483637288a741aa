//! Navigate, build, edit and render Avro schemas
//!
//! A [`Schema`] is stored as an arena of [`SchemaNode`]s, where references to
//! other nodes are represented as [`SchemaKey`]s. This is because, due to how
//! referencing via [Names](https://avro.apache.org/docs/current/specification/#names)
//! works in Avro, a schema is not a tree but a possibly-cyclic directed graph.

mod canonical_form;
mod check_for_cycles;
mod equality;
mod error;
mod metadata;
mod name;
mod namespace;
pub(crate) mod parsing;
mod rabin;
mod schema_ref;
mod serialize;
mod validate;

pub use {
	check_for_cycles::UnconditionalCycle,
	error::{SchemaError, SchemaErrorKind},
	metadata::RESERVED_PROPERTIES,
	name::Name,
	rabin::Rabin,
	schema_ref::SchemaRef,
	serialize::JsonForm,
};

pub use serde_json::Value as JsonValue;

use std::collections::BTreeMap;

/// An Avro schema
///
/// In there, references to other nodes are represented as [`SchemaKey`], which
/// allow to index into the [`Schema`].
///
/// The first node (index `0`) is considered to be the root. Parsing may
/// however register several roots in the same arena (see
/// [`Protocol`](crate::protocol::Protocol)), in which case each of them is
/// reachable through its own [`SchemaKey`].
#[derive(Clone, Debug)]
pub struct Schema {
	pub(crate) nodes: Vec<SchemaNode>,
	pub(crate) metadata: BTreeMap<SchemaKey, BTreeMap<String, JsonValue>>,
}

impl Schema {
	/// Initialize a [`Schema`] from a set of nodes
	///
	/// The first node (index `0`) is the root of the schema.
	///
	/// This does not check anything: use [`validate`](Self::validate) if the
	/// nodes don't come from a trusted source.
	pub fn from_nodes(nodes: Vec<SchemaNode>) -> Self {
		Self {
			nodes,
			metadata: BTreeMap::new(),
		}
	}

	/// Obtain the underlying graph storage
	///
	/// [`SchemaKey`]s can be converted to indexes of this slice.
	pub fn nodes(&self) -> &[SchemaNode] {
		&self.nodes
	}

	/// Obtain the underlying graph storage mutably
	///
	/// Metadata tags stay attached to their [`SchemaKey`], so removing nodes
	/// may attach them to different nodes.
	pub fn nodes_mut(&mut self) -> &mut Vec<SchemaNode> {
		&mut self.nodes
	}

	/// Obtain the root of the schema
	///
	/// It is the first node of the `nodes` `Vec`.
	pub fn root(&self) -> SchemaRef<'_> {
		SchemaRef::new_unchecked(self, SchemaKey::root())
	}

	/// Try to get the node at the given [`SchemaKey`]
	///
	/// (or return `None` if the key is invalid)
	pub fn get(&self, key: SchemaKey) -> Option<&SchemaNode> {
		self.nodes.get(key.idx)
	}

	/// Obtain a navigable reference to the node at the given [`SchemaKey`]
	pub fn at(&self, key: SchemaKey) -> Result<SchemaRef<'_>, SchemaError> {
		SchemaRef::new(self, key)
	}

	/// Push a new node at the end of the arena and return its key
	pub fn push(&mut self, node: impl Into<SchemaNode>) -> SchemaKey {
		let key = SchemaKey::from_idx(self.nodes.len());
		self.nodes.push(node.into());
		key
	}
}

/// The location of a node in a [`Schema`]
///
/// This can be used to [`Index`](std::ops::Index) into the [`Schema`].
///
/// (Note that `Index`ing into a `Schema` with an invalid index would cause a
/// panic.)
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaKey {
	pub(crate) idx: usize,
}

impl SchemaKey {
	/// Construct a new SchemaKey
	///
	/// This is expected to be an index in the [`nodes`](Schema::nodes) of a
	/// [`Schema`].
	pub const fn from_idx(idx: usize) -> Self {
		Self { idx }
	}
	/// Obtain the index in the [`nodes`](Schema::nodes) of a [`Schema`] that
	/// this [`SchemaKey`] points to.
	pub const fn idx(self) -> usize {
		self.idx
	}
	/// Construct a new SchemaKey representing the root of the schema
	///
	/// This is equivalent to `SchemaKey::from_idx(0)`.
	pub const fn root() -> Self {
		Self { idx: 0 }
	}
}
impl std::ops::Index<SchemaKey> for Schema {
	type Output = SchemaNode;
	fn index(&self, key: SchemaKey) -> &Self::Output {
		&self.nodes[key.idx]
	}
}
impl std::ops::IndexMut<SchemaKey> for Schema {
	fn index_mut(&mut self, key: SchemaKey) -> &mut Self::Output {
		&mut self.nodes[key.idx]
	}
}
impl std::fmt::Debug for SchemaKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&self.idx, f)
	}
}

/// A node of an avro schema, stored in a [`Schema`].
///
/// More information about Avro schemas can be found in the
/// [Avro Specification](https://avro.apache.org/docs/current/specification/).
#[derive(Clone, Debug)]
pub enum SchemaNode {
	/// An Avro type that's not annotated with a logical type
	RegularType(RegularType),
	/// An Avro type that is annotated with a logical type
	LogicalType {
		/// The key of the [`RegularType`] (in the [`Schema`]) that is
		/// annotated with this logical type
		inner: SchemaKey,
		/// The LogicalType this node is annotated with
		logical_type: LogicalType,
	},
}

/// A primitive or complex type of an avro schema, stored in a [`SchemaNode`].
#[derive(Clone, Debug)]
pub enum RegularType {
	/// A `null` Avro schema.
	Null,
	/// A `boolean` Avro schema.
	Boolean,
	/// An `int` Avro schema.
	Int,
	/// A `long` Avro schema.
	Long,
	/// A `float` Avro schema.
	Float,
	/// A `double` Avro schema.
	Double,
	/// A `bytes` Avro schema.
	/// `Bytes` represents a sequence of 8-bit unsigned bytes.
	Bytes,
	/// A `string` Avro schema.
	/// `String` represents a unicode character sequence.
	String,
	/// An `array` Avro schema. All the items share the same schema.
	Array(Array),
	/// A `map` Avro schema. Keys are always strings.
	Map(Map),
	/// A `union` Avro schema.
	Union(Union),
	/// A `record` (or `error`) Avro schema.
	Record(Record),
	/// An `enum` Avro schema.
	Enum(Enum),
	/// A `fixed` Avro schema.
	Fixed(Fixed),
}

impl RegularType {
	/// The Avro type name of this node, as it appears in the `type` key of the
	/// schema JSON
	pub fn type_name(&self) -> &'static str {
		match self {
			RegularType::Null => "null",
			RegularType::Boolean => "boolean",
			RegularType::Int => "int",
			RegularType::Long => "long",
			RegularType::Float => "float",
			RegularType::Double => "double",
			RegularType::Bytes => "bytes",
			RegularType::String => "string",
			RegularType::Array(_) => "array",
			RegularType::Map(_) => "map",
			RegularType::Union(_) => "union",
			RegularType::Record(record) => match record.is_error {
				false => "record",
				true => "error",
			},
			RegularType::Enum(_) => "enum",
			RegularType::Fixed(_) => "fixed",
		}
	}

	/// The name of this node, if it is a named type (`record`, `error`,
	/// `enum` or `fixed`)
	pub fn name(&self) -> Option<&Name> {
		match self {
			RegularType::Record(record) => Some(&record.name),
			RegularType::Enum(enum_) => Some(&enum_.name),
			RegularType::Fixed(fixed) => Some(&fixed.name),
			_ => None,
		}
	}

	pub(crate) fn name_mut(&mut self) -> Option<&mut Name> {
		match self {
			RegularType::Record(record) => Some(&mut record.name),
			RegularType::Enum(enum_) => Some(&mut enum_.name),
			RegularType::Fixed(fixed) => Some(&mut fixed.name),
			_ => None,
		}
	}

	/// The aliases of this node, if it is a named type
	pub fn aliases(&self) -> &[Name] {
		match self {
			RegularType::Record(record) => &record.aliases,
			RegularType::Enum(enum_) => &enum_.aliases,
			RegularType::Fixed(fixed) => &fixed.aliases,
			_ => &[],
		}
	}

	/// The keys of the nodes this node directly refers to
	pub(crate) fn children(&self) -> impl Iterator<Item = SchemaKey> + '_ {
		let (single, many): (Option<SchemaKey>, &[SchemaKey]) = match self {
			RegularType::Array(array) => (Some(array.items), &[]),
			RegularType::Map(map) => (Some(map.values), &[]),
			RegularType::Union(union) => (None, &union.variants),
			_ => (None, &[]),
		};
		let fields = match self {
			RegularType::Record(record) => record.fields.as_slice(),
			_ => &[],
		};
		single
			.into_iter()
			.chain(many.iter().copied())
			.chain(fields.iter().map(|f| f.type_))
	}
}

/// Component of a [`Schema`]
#[derive(Clone, Debug)]
pub struct Array {
	/// The key (in the [`Schema`]) of the schema of each item that will be
	/// in the array
	pub items: SchemaKey,
	pub(crate) _private: (),
}
impl Array {
	/// `items` is the key (in the [`Schema`]) of the schema of each item
	/// that will be in the array
	pub fn new(items: SchemaKey) -> Self {
		Self {
			items,
			_private: (),
		}
	}
}

/// Component of a [`Schema`]
///
/// An Avro map is a collection of key-value pairs, where the keys are assumed
/// to be strings.
#[derive(Clone, Debug)]
pub struct Map {
	/// The key (in the [`Schema`]) of the schema of each value that will be
	/// in the map
	pub values: SchemaKey,
	pub(crate) _private: (),
}
impl Map {
	/// `values` is the key (in the [`Schema`]) of the schema of each value
	/// that will be in the map
	pub fn new(values: SchemaKey) -> Self {
		Self {
			values,
			_private: (),
		}
	}
}

/// Component of a [`Schema`]
#[derive(Clone, Debug)]
pub struct Union {
	/// The keys (in the [`Schema`]) of the schemas of each variant that
	/// this Avro *union* supports.
	pub variants: Vec<SchemaKey>,
	pub(crate) _private: (),
}
impl Union {
	/// `variants` is the keys (in the [`Schema`]) of the schemas of each
	/// variant that this Avro *union* supports.
	pub fn new(variants: Vec<SchemaKey>) -> Self {
		Self {
			variants,
			_private: (),
		}
	}
}

/// Component of a [`Schema`]
///
/// An avro `record` is ~equivalent to a Rust struct. An avro `error` has the
/// exact same shape, but represents the payload of a protocol error.
#[derive(Clone, Debug)]
pub struct Record {
	/// The list of fields in this *record* (~= `struct`)
	pub fields: Vec<RecordField>,
	/// The name of the record (including namespace)
	pub name: Name,
	/// Alternate full names this record used to be known as
	pub aliases: Vec<Name>,
	/// Documentation
	pub doc: Option<String>,
	/// Whether this was declared as an `error` rather than a `record`
	pub is_error: bool,
	pub(crate) _private: (),
}
impl Record {
	/// `name` is the name of the record (including namespace), and `fields` is
	/// the list of fields in this record.
	pub fn new(name: Name, fields: Vec<RecordField>) -> Self {
		Self {
			fields,
			name,
			aliases: Vec::new(),
			doc: None,
			is_error: false,
			_private: (),
		}
	}

	/// Same as [`Record::new`], but declared as an `error`
	pub fn new_error(name: Name, fields: Vec<RecordField>) -> Self {
		Self {
			is_error: true,
			..Self::new(name, fields)
		}
	}
}

/// Component of a [`Schema`]
#[derive(Clone, Debug)]
pub struct RecordField {
	/// Name of the field
	pub name: String,
	/// The key (in the [`Schema`]) of the schema of the type of this field
	pub type_: SchemaKey,
	/// Alternate names this field used to be known as
	pub aliases: Vec<String>,
	/// Documentation
	pub doc: Option<String>,
	/// Value to use when reading data written without this field
	///
	/// `Some(JsonValue::Null)` is an explicit `null` default, which is
	/// different from no default at all.
	pub default: Option<JsonValue>,
	/// Sort order of this field
	pub order: FieldOrder,
	pub(crate) _private: (),
}
impl RecordField {
	/// `schema` is the key (in the [`Schema`]) of the schema of the type of
	/// this field.
	pub fn new(name: impl Into<String>, schema: SchemaKey) -> Self {
		Self {
			name: name.into(),
			type_: schema,
			aliases: Vec::new(),
			doc: None,
			default: None,
			order: FieldOrder::Ascending,
			_private: (),
		}
	}

	/// Set the default value of this field
	pub fn with_default(mut self, default: impl Into<JsonValue>) -> Self {
		self.default = Some(default.into());
		self
	}
}

/// Sort order of a record field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde_derive::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOrder {
	/// The default
	#[default]
	Ascending,
	#[allow(missing_docs)]
	Descending,
	/// Field is ignored when sorting
	Ignore,
}

impl FieldOrder {
	/// How this appears in the schema JSON
	pub fn as_str(self) -> &'static str {
		match self {
			FieldOrder::Ascending => "ascending",
			FieldOrder::Descending => "descending",
			FieldOrder::Ignore => "ignore",
		}
	}
}

/// Component of a [`Schema`]
///
/// This is the ~equivalent of a Rust `enum` where none of the variants would
/// hold any inner value. (e.g. `enum Foo { Bar, Baz }`)
#[derive(Clone, Debug)]
pub struct Enum {
	/// All the variants of the enum (e.g. `["Bar", "Baz"]`)
	pub symbols: Vec<String>,
	/// The name of the enum (including namespace)
	pub name: Name,
	/// Symbol to use when reading a symbol this enum doesn't know about
	pub default: Option<String>,
	/// Alternate full names this enum used to be known as
	pub aliases: Vec<Name>,
	/// Documentation
	pub doc: Option<String>,
	pub(crate) _private: (),
}
impl Enum {
	/// `name` is the name of the enum (including namespace), and `symbols` is
	/// the list of variants of the enum.
	pub fn new(name: Name, symbols: Vec<String>) -> Self {
		Self {
			symbols,
			name,
			default: None,
			aliases: Vec::new(),
			doc: None,
			_private: (),
		}
	}
}

/// Component of a [`Schema`]
#[derive(Clone, Debug)]
pub struct Fixed {
	/// The size in bytes of the *fixed* type
	pub size: usize,
	/// The name of the *fixed* type, including the namespace
	pub name: Name,
	/// Alternate full names this type used to be known as
	pub aliases: Vec<Name>,
	/// Documentation
	pub doc: Option<String>,
	pub(crate) _private: (),
}
impl Fixed {
	/// `name` is name of the *fixed* type, including the namespace, `size` is
	/// the size in bytes of the fixed type
	pub fn new(name: Name, size: usize) -> Self {
		Self {
			size,
			name,
			aliases: Vec::new(),
			doc: None,
			_private: (),
		}
	}
}

/// Logical type
///
/// <https://avro.apache.org/docs/current/specification/#logical-types>
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LogicalType {
	/// Logical type which represents `Decimal` values. The underlying type is
	/// serialized and deserialized as `Schema::Bytes` or `Schema::Fixed`.
	///
	/// `scale` defaults to 0 and is an integer greater than or equal to 0 and
	/// `precision` is an integer greater than 0.
	///
	/// <https://avro.apache.org/docs/current/specification/#decimal>
	Decimal(Decimal),
	/// A universally unique identifier, annotating a string or a 16-byte
	/// fixed.
	Uuid,
	/// Logical type which represents the number of days since the unix epoch.
	/// Serialization format is `Schema::Int`.
	Date,
	/// The time of day in number of milliseconds after midnight.
	///
	/// Annotates an [`Int`](RegularType::Int).
	TimeMillis,
	/// The time of day in number of microseconds after midnight.
	///
	/// Annotates a [`Long`](RegularType::Long).
	TimeMicros,
	/// The time of day in number of nanoseconds after midnight.
	///
	/// Annotates a [`Long`](RegularType::Long).
	TimeNanos,
	/// An instant in time represented as the number of milliseconds after the
	/// UNIX epoch.
	///
	/// Annotates a [`Long`](RegularType::Long).
	TimestampMillis,
	/// An instant in time represented as the number of microseconds after the
	/// UNIX epoch.
	///
	/// Annotates a [`Long`](RegularType::Long).
	TimestampMicros,
	/// An instant in time represented as the number of nanoseconds after the
	/// UNIX epoch.
	///
	/// Annotates a [`Long`](RegularType::Long).
	TimestampNanos,
	/// An amount of time defined by a number of months, days and milliseconds.
	///
	/// Annotates a 12-byte [`Fixed`](RegularType::Fixed).
	Duration,
	/// A logical type that is not known by this library.
	///
	/// Values of such types are handled as their underlying type.
	Unknown(UnknownLogicalType),
}

/// Component of a [`Schema`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decimal {
	/// The scale of the decimal number, which is the number of digits to the
	/// right of the decimal point.
	pub scale: u32,
	/// The precision of the decimal number, which is the number of significant
	/// digits in the number.
	pub precision: usize,
	pub(crate) _private: (),
}
impl Decimal {
	/// `scale` is the number of digits to the right of the decimal point, and
	/// `precision` is the number of significant digits in the number.
	pub fn new(scale: u32, precision: usize) -> Self {
		Self {
			precision,
			scale,
			_private: (),
		}
	}
}

/// Component of a [`Schema`]
///
/// Represents a logical type that is not known or not handled in any particular
/// way by this library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownLogicalType {
	/// The name of the logical type, as it appears in the schema JSON
	pub logical_type_name: String,
	_private: (),
}
impl UnknownLogicalType {
	/// `logical_type_name` is the name of the logical type, as it appears in
	/// the schema JSON
	pub fn new(logical_type_name: impl Into<String>) -> Self {
		Self {
			logical_type_name: logical_type_name.into(),
			_private: (),
		}
	}

	/// Gives the name of the logical type, as it appears in the schema JSON
	pub fn as_str(&self) -> &str {
		&self.logical_type_name
	}
}

impl LogicalType {
	/// The name of the logical type
	///
	/// This is the string that is used in the schema JSON to refer to this
	/// logical type.
	pub fn as_str(&self) -> &str {
		match self {
			LogicalType::Decimal(_) => "decimal",
			LogicalType::Uuid => "uuid",
			LogicalType::Date => "date",
			LogicalType::TimeMillis => "time-millis",
			LogicalType::TimeMicros => "time-micros",
			LogicalType::TimeNanos => "time-nanos",
			LogicalType::TimestampMillis => "timestamp-millis",
			LogicalType::TimestampMicros => "timestamp-micros",
			LogicalType::TimestampNanos => "timestamp-nanos",
			LogicalType::Duration => "duration",
			LogicalType::Unknown(unknown_logical_type) => &unknown_logical_type.logical_type_name,
		}
	}

	/// Whether this logical type may annotate the given type
	///
	/// Logical types that annotate a type they can't apply to are ignored
	/// (the value is handled as its underlying type).
	pub fn is_valid_on(&self, regular_type: &RegularType) -> bool {
		match (self, regular_type) {
			(LogicalType::Decimal(decimal), RegularType::Bytes | RegularType::Fixed(_)) => {
				decimal.precision > 0 && decimal.scale as usize <= decimal.precision
			}
			(LogicalType::Uuid, RegularType::String) => true,
			(LogicalType::Uuid, RegularType::Fixed(fixed)) => fixed.size == 16,
			(LogicalType::Date | LogicalType::TimeMillis, RegularType::Int) => true,
			(
				LogicalType::TimeMicros
				| LogicalType::TimeNanos
				| LogicalType::TimestampMillis
				| LogicalType::TimestampMicros
				| LogicalType::TimestampNanos,
				RegularType::Long,
			) => true,
			(LogicalType::Duration, RegularType::Fixed(fixed)) => fixed.size == 12,
			_ => false,
		}
	}
}

impl From<RegularType> for SchemaNode {
	fn from(regular_type: RegularType) -> Self {
		Self::RegularType(regular_type)
	}
}

macro_rules! impl_froms_for_regular_type {
	($($variant: ident)*) => {
		$(
			impl From<$variant> for RegularType {
				fn from(variant: $variant) -> Self {
					Self::$variant(variant)
				}
			}
			impl From<$variant> for SchemaNode {
				fn from(variant: $variant) -> Self {
					SchemaNode::RegularType(RegularType::$variant(variant))
				}
			}
		)*
	};
}
impl_froms_for_regular_type! { Array Map Union Record Enum Fixed }

impl std::str::FromStr for Schema {
	type Err = SchemaError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let raw_schema: parsing::raw::SchemaNode =
			serde_json::from_str(s).map_err(SchemaError::serde_json)?;
		let mut state = parsing::SchemaConstructionState::new();
		state.register_node(&raw_schema, None)?;
		let schema = state.finish()?;
		schema.validate()?;
		Ok(schema)
	}
}
