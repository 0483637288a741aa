use super::{name::validate_identifier, *};

use std::collections::HashSet;

impl Schema {
	/// Check that the schema is valid
	///
	/// - All [`SchemaKey`]s point to existing nodes
	/// - Names, namespaces, aliases, field names and enum symbols are valid
	///   identifiers
	/// - Named types are defined only once
	/// - Record field names and enum symbols are unique, enum defaults are
	///   symbols of their enum
	/// - Unions don't directly contain unions, contain at most one variant of
	///   each unnamed type and at most one variant of each named type
	/// - Logical types don't directly annotate other logical types
	/// - No record always contains itself
	///
	/// This is called by the parsing functions already, so this may only be
	/// useful if you've built or edited the schema graph by hand.
	pub fn validate(&self) -> Result<(), SchemaError> {
		if self.nodes.is_empty() {
			return Err(SchemaError::new("Schema has no nodes"));
		}
		let check_key = |key: SchemaKey| match self.nodes.get(key.idx) {
			Some(_) => Ok(()),
			None => Err(SchemaError::invalid_key()),
		};
		let mut defined_names = HashSet::new();
		for node in &self.nodes {
			match node {
				SchemaNode::LogicalType { inner, logical_type } => {
					check_key(*inner)?;
					if let SchemaNode::LogicalType { .. } = self[*inner] {
						return Err(SchemaError::msg(format_args!(
							"Immediately-nested logical types in {:?}",
							logical_type.as_str()
						)));
					}
				}
				SchemaNode::RegularType(regular_type) => {
					regular_type.children().try_for_each(check_key)?;
					if let Some(name) = regular_type.name() {
						name.validate()?;
						regular_type.aliases().iter().try_for_each(Name::validate)?;
						if !defined_names.insert(name) {
							return Err(SchemaError::msg(format_args!(
								"The Schema contains duplicate definitions for {name}"
							)));
						}
					}
					match regular_type {
						RegularType::Record(record) => self.validate_record(record)?,
						RegularType::Enum(enum_) => validate_enum(enum_)?,
						RegularType::Union(union) => self.validate_union(union)?,
						_ => {}
					}
				}
			}
		}
		self.check_for_cycles().map_err(SchemaError::display)
	}

	fn validate_record(&self, record: &Record) -> Result<(), SchemaError> {
		let mut field_names = HashSet::new();
		for field in &record.fields {
			validate_identifier(&field.name)?;
			field.aliases.iter().try_for_each(|a| validate_identifier(a))?;
			if !field_names.insert(field.name.as_str()) {
				return Err(SchemaError::msg(format_args!(
					"Record {} has duplicate field {:?}",
					record.name, field.name
				)));
			}
		}
		Ok(())
	}

	fn validate_union(&self, union: &Union) -> Result<(), SchemaError> {
		let mut unnamed_kinds = HashSet::new();
		let mut names = HashSet::new();
		for &variant in &union.variants {
			let variant = SchemaRef::new_unchecked(self, variant);
			let regular_type = variant.regular();
			let unique = match regular_type {
				RegularType::Union(_) => {
					return Err(SchemaError::new("Unions may not immediately contain other unions"))
				}
				RegularType::Record(_) | RegularType::Enum(_) | RegularType::Fixed(_) => {
					match regular_type.name() {
						Some(name) => names.insert(name),
						None => true,
					}
				}
				_ => unnamed_kinds.insert(regular_type.type_name()),
			};
			if !unique {
				return Err(SchemaError::msg(format_args!(
					"Union contains more than one variant of type {}",
					variant.describe()
				)));
			}
		}
		Ok(())
	}
}

fn validate_enum(enum_: &Enum) -> Result<(), SchemaError> {
	let mut symbols = HashSet::new();
	for symbol in &enum_.symbols {
		validate_identifier(symbol)?;
		if !symbols.insert(symbol.as_str()) {
			return Err(SchemaError::msg(format_args!(
				"Enum {} has duplicate symbol {symbol:?}",
				enum_.name
			)));
		}
	}
	match enum_.default {
		Some(ref default) if !symbols.contains(default.as_str()) => {
			Err(SchemaError::msg(format_args!(
				"Default {default:?} of enum {} is not one of its symbols",
				enum_.name
			)))
		}
		_ => Ok(()),
	}
}
