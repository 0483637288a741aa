use super::*;

/// A node of a [`Schema`], along with the schema it lives in
///
/// This is what resolution and rendering navigate: following a [`SchemaKey`]
/// from a `SchemaRef` gives another `SchemaRef` into the same arena.
#[derive(Clone, Copy)]
pub struct SchemaRef<'a> {
	schema: &'a Schema,
	key: SchemaKey,
}

impl<'a> SchemaRef<'a> {
	/// Fails if `key` does not point to a node of `schema`
	pub fn new(schema: &'a Schema, key: SchemaKey) -> Result<Self, SchemaError> {
		match schema.nodes.get(key.idx) {
			Some(_) => Ok(Self { schema, key }),
			None => Err(SchemaError::invalid_key()),
		}
	}

	pub(crate) fn new_unchecked(schema: &'a Schema, key: SchemaKey) -> Self {
		Self { schema, key }
	}

	/// The schema this node lives in
	pub fn schema(self) -> &'a Schema {
		self.schema
	}

	/// The location of this node in its schema
	pub fn key(self) -> SchemaKey {
		self.key
	}

	/// The node itself
	///
	/// # Panics
	/// If this was built from an invalid key through [`Schema::root`] on an
	/// empty schema.
	pub fn node(self) -> &'a SchemaNode {
		&self.schema[self.key]
	}

	/// Another node of the same schema
	pub fn at(self, key: SchemaKey) -> SchemaRef<'a> {
		Self {
			schema: self.schema,
			key,
		}
	}

	/// The key of the [`RegularType`] behind any logical type annotation
	pub fn regular_key(self) -> SchemaKey {
		let mut key = self.key;
		// Nested logical types are rejected by validation, which plans
		// compilation runs first. This only bounds the walk on unvalidated
		// hand-built schemas.
		for _ in 0..self.schema.nodes.len() {
			match self.schema[key] {
				SchemaNode::RegularType(_) => break,
				SchemaNode::LogicalType { inner, .. } => key = inner,
			}
		}
		key
	}

	/// The [`RegularType`] behind any logical type annotation
	pub fn regular(self) -> &'a RegularType {
		match self.schema[self.regular_key()] {
			SchemaNode::RegularType(ref regular_type) => regular_type,
			// Unreachable on validated schemas, since those have no logical
			// type directly annotating another one (let alone a cycle of them)
			SchemaNode::LogicalType { .. } => &RegularType::Null,
		}
	}

	/// The logical type annotating this node, if it applies to the
	/// underlying type
	///
	/// Unknown logical types, and logical types that don't apply to the type
	/// they annotate, are ignored.
	pub fn logical_type(self) -> Option<&'a LogicalType> {
		match self.node() {
			SchemaNode::LogicalType { logical_type, .. }
				if logical_type.is_valid_on(self.regular()) =>
			{
				Some(logical_type)
			}
			_ => None,
		}
	}

	/// The name of this node if it is a named type
	pub fn name(self) -> Option<&'a Name> {
		self.regular().name()
	}

	/// The aliases of this node if it is a named type
	pub fn aliases(self) -> &'a [Name] {
		self.regular().aliases()
	}

	/// Whether `self` may stand for `other` by name: either their full names
	/// are equal, or one of `self`'s aliases is `other`'s full name
	///
	/// Returns `false` if either of them is not a named type.
	pub fn matches_name(self, other: SchemaRef<'_>) -> bool {
		match (self.name(), other.name()) {
			(Some(name), Some(other_name)) => {
				name == other_name || self.aliases().iter().any(|alias| alias == other_name)
			}
			_ => false,
		}
	}

	/// The union variants, if this node is a union
	pub fn union_variants(self) -> Option<impl ExactSizeIterator<Item = SchemaRef<'a>> + 'a> {
		match self.regular() {
			RegularType::Union(union) => {
				let schema = self.schema;
				Some(
					union
						.variants
						.iter()
						.map(move |&key| SchemaRef { schema, key }),
				)
			}
			_ => None,
		}
	}

	/// Whether this is the `null` type
	pub fn is_null(self) -> bool {
		matches!(self.regular(), RegularType::Null)
	}

	/// If this is a two-variant union where one of the variants is `null`,
	/// returns the index of the `null` variant and the other variant
	pub fn as_nullable(self) -> Option<(usize, SchemaRef<'a>)> {
		let variants: Vec<SchemaRef<'a>> = self.union_variants()?.collect();
		match variants.as_slice() {
			&[a, b] => match (a.is_null(), b.is_null()) {
				(true, false) => Some((0, b)),
				(false, true) => Some((1, a)),
				_ => None,
			},
			_ => None,
		}
	}

	/// A short description of this node, for error messages
	///
	/// Named types give their kind and full name, others their type name
	/// (or logical type name).
	pub fn describe(self) -> String {
		let regular = self.regular();
		match (self.logical_type(), regular.name()) {
			(Some(logical_type), _) => match regular.name() {
				Some(name) => format!("{} ({})", logical_type.as_str(), name),
				None => logical_type.as_str().to_owned(),
			},
			(None, Some(name)) => format!("{} {}", regular.type_name(), name),
			(None, None) => match regular {
				RegularType::Array(array) => {
					format!("array<{}>", self.at(array.items).describe_short())
				}
				RegularType::Map(map) => format!("map<{}>", self.at(map.values).describe_short()),
				RegularType::Union(union) => {
					let variants: Vec<String> = union
						.variants
						.iter()
						.map(|&key| self.at(key).describe_short())
						.collect();
					format!("[{}]", variants.join(", "))
				}
				_ => regular.type_name().to_owned(),
			},
		}
	}

	/// Like [`describe`](Self::describe) but does not recurse
	fn describe_short(self) -> String {
		let regular = self.regular();
		match (self.logical_type(), regular.name()) {
			(Some(logical_type), _) => logical_type.as_str().to_owned(),
			(None, Some(name)) => name.fully_qualified_name().to_owned(),
			(None, None) => regular.type_name().to_owned(),
		}
	}
}

impl std::fmt::Debug for SchemaRef<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.describe())
	}
}

impl std::fmt::Display for SchemaRef<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.describe())
	}
}

/// Structural equality (see [`SchemaRef::structurally_eq`])
impl PartialEq for SchemaRef<'_> {
	fn eq(&self, other: &Self) -> bool {
		self.structurally_eq(*other)
	}
}
