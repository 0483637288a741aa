use super::{rabin::Rabin, *};

use std::{collections::HashSet, fmt::Write};

impl SchemaRef<'_> {
	/// The [Parsing Canonical Form](https://avro.apache.org/docs/current/specification/#parsing-canonical-form-for-schemas)
	/// of this schema
	///
	/// Logical types are rendered as their underlying type, documentation,
	/// aliases and metadata are dropped, names are fully qualified, and any
	/// named type that was already written is referred to by its full name.
	///
	/// Field defaults are kept when set.
	pub fn canonical_form(self) -> Result<String, SchemaError> {
		let mut state = WriteCanonicalFormState {
			w: ErrorConversionWriter(String::new()),
			named_types_written: HashSet::new(),
			unnamed_in_progress: HashSet::new(),
		};
		state.write_canonical_form(self.schema(), self.key())?;
		Ok(state.w.0)
	}

	/// The Rabin fingerprint of the [canonical form](Self::canonical_form)
	/// of this schema
	pub fn fingerprint(self) -> Result<i64, SchemaError> {
		Ok(self.rabin()?.finish())
	}

	/// The 8-byte little-endian Rabin fingerprint of the
	/// [canonical form](Self::canonical_form) of this schema
	///
	/// This is what is used for avro [single object encoding](https://avro.apache.org/docs/current/specification/#single-object-encoding)
	pub fn fingerprint_bytes(self) -> Result<[u8; 8], SchemaError> {
		Ok(self.rabin()?.finish_bytes())
	}

	fn rabin(self) -> Result<Rabin, SchemaError> {
		let mut state = WriteCanonicalFormState {
			w: ErrorConversionWriter(Rabin::default()),
			named_types_written: HashSet::new(),
			unnamed_in_progress: HashSet::new(),
		};
		state.write_canonical_form(self.schema(), self.key())?;
		Ok(state.w.0)
	}
}

impl Schema {
	/// The canonical form of the root of this schema
	///
	/// See [`SchemaRef::canonical_form`]
	pub fn canonical_form(&self) -> Result<String, SchemaError> {
		self.root().canonical_form()
	}

	/// The Rabin fingerprint of the root of this schema
	///
	/// See [`SchemaRef::fingerprint`]
	pub fn fingerprint(&self) -> Result<i64, SchemaError> {
		self.root().fingerprint()
	}
}

struct WriteCanonicalFormState<'s, W> {
	w: ErrorConversionWriter<W>,
	named_types_written: HashSet<&'s Name>,
	/// Unnamed nodes we are currently inside of
	unnamed_in_progress: HashSet<SchemaKey>,
}

impl<'s, W: Write> WriteCanonicalFormState<'s, W> {
	fn write_canonical_form(
		&mut self,
		schema: &'s Schema,
		key: SchemaKey,
	) -> Result<(), SchemaError> {
		let node = schema.nodes.get(key.idx).ok_or_else(SchemaError::invalid_key)?;
		let is_named = matches!(node, SchemaNode::RegularType(type_) if type_.name().is_some());
		if is_named {
			return self.write_node(schema, node);
		}
		// Only named types may be referred to, so going through the same
		// unnamed node twice would never end
		if !self.unnamed_in_progress.insert(key) {
			return Err(SchemaError::new(
				"Schema contains a cycle that can't be avoided using named references",
			));
		}
		let res = self.write_node(schema, node);
		self.unnamed_in_progress.remove(&key);
		res
	}

	fn write_node(&mut self, schema: &'s Schema, node: &'s SchemaNode) -> Result<(), SchemaError> {

		match *node {
			SchemaNode::LogicalType {
				inner,
				logical_type: _,
			} => {
				// In PCF, logical types are completely ignored
				// https://issues.apache.org/jira/browse/AVRO-1721
				self.write_canonical_form(schema, inner)
			}
			SchemaNode::RegularType(ref type_) => {
				if let Some(name) = type_.name() {
					if !self.named_types_written.insert(name) {
						self.w.write_char('"')?;
						self.w.write_str(name.fully_qualified_name())?;
						return self.w.write_char('"');
					}
				}
				match *type_ {
					RegularType::Null
					| RegularType::Boolean
					| RegularType::Int
					| RegularType::Long
					| RegularType::Float
					| RegularType::Double
					| RegularType::Bytes
					| RegularType::String => {
						self.w.write_char('"')?;
						self.w.write_str(type_.type_name())?;
						self.w.write_char('"')?;
					}
					RegularType::Union(ref union) => {
						self.w.write_char('[')?;
						for (i, &variant) in union.variants.iter().enumerate() {
							if i != 0 {
								self.w.write_char(',')?;
							}
							self.write_canonical_form(schema, variant)?;
						}
						self.w.write_char(']')?;
					}
					RegularType::Array(ref array) => {
						self.w.write_str("{\"type\":\"array\",\"items\":")?;
						self.write_canonical_form(schema, array.items)?;
						self.w.write_char('}')?;
					}
					RegularType::Map(ref map) => {
						self.w.write_str("{\"type\":\"map\",\"values\":")?;
						self.write_canonical_form(schema, map.values)?;
						self.w.write_char('}')?;
					}
					RegularType::Enum(ref enum_) => {
						self.write_name(&enum_.name)?;
						self.w.write_str(",\"type\":\"enum\",\"symbols\":[")?;
						for (i, enum_symbol) in enum_.symbols.iter().enumerate() {
							if i != 0 {
								self.w.write_char(',')?;
							}
							self.w.write_char('"')?;
							self.w.write_str(enum_symbol)?;
							self.w.write_char('"')?;
						}
						self.w.write_str("]}")?;
					}
					RegularType::Fixed(ref fixed) => {
						self.write_name(&fixed.name)?;
						self.w.write_str(",\"type\":\"fixed\",\"size\":")?;
						write!(self.w.0, "{}", fixed.size).map_err(convert_error)?;
						self.w.write_char('}')?;
					}
					RegularType::Record(ref record) => {
						self.write_name(&record.name)?;
						self.w.write_str(",\"type\":\"")?;
						self.w.write_str(type_.type_name())?;
						self.w.write_str("\",\"fields\":[")?;
						for (i, field) in record.fields.iter().enumerate() {
							if i != 0 {
								self.w.write_char(',')?;
							}
							self.w.write_str("{\"name\":\"")?;
							self.w.write_str(&field.name)?;
							self.w.write_str("\",\"type\":")?;
							self.write_canonical_form(schema, field.type_)?;
							if let Some(ref default) = field.default {
								self.w.write_str(",\"default\":")?;
								let default = serde_json::to_string(default)
									.map_err(SchemaError::serde_json)?;
								self.w.write_str(&default)?;
							}
							self.w.write_char('}')?;
						}
						self.w.write_str("]}")?;
					}
				}
				Ok(())
			}
		}
	}

	fn write_name(&mut self, name: &Name) -> Result<(), SchemaError> {
		self.w.write_str("{\"name\":\"")?;
		self.w.write_str(name.fully_qualified_name())?;
		self.w.write_char('"')
	}
}

/// Convert errors from `std::fmt::Write` to `SchemaError`
/// in order to be able to use `?` in `WriteCanonicalFormState`
struct ErrorConversionWriter<W>(W);
impl<W: Write> ErrorConversionWriter<W> {
	#[inline]
	fn write_char(&mut self, c: char) -> Result<(), SchemaError> {
		self.0.write_char(c).map_err(convert_error)
	}
	#[inline]
	fn write_str(&mut self, s: &str) -> Result<(), SchemaError> {
		self.0.write_str(s).map_err(convert_error)
	}
}
fn convert_error(e: std::fmt::Error) -> SchemaError {
	SchemaError::msg(format_args!(
		"Error writing schema parsing canonical form: {}",
		e,
	))
}
