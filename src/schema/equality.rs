use super::*;

use std::collections::HashSet;

impl SchemaRef<'_> {
	/// Whether two nodes (possibly of different schemas) describe the same
	/// type
	///
	/// Only the kind-specific shape is compared: names, sizes, symbols, field
	/// names, field types and defaults, logical types. Documentation, aliases,
	/// field order and metadata tags are ignored.
	///
	/// Recursive named types are handled: a pair of named nodes that is
	/// already being compared is assumed equal.
	pub fn structurally_eq(self, other: SchemaRef<'_>) -> bool {
		StructuralEq {
			assumed_equal: HashSet::new(),
		}
		.eq(self, other)
	}
}

impl Schema {
	/// Whether the roots of two schemas describe the same type
	///
	/// See [`SchemaRef::structurally_eq`].
	pub fn structurally_eq(&self, other: &Schema) -> bool {
		self.root().structurally_eq(other.root())
	}
}

struct StructuralEq {
	assumed_equal: HashSet<(usize, usize)>,
}

impl StructuralEq {
	fn eq(&mut self, a: SchemaRef<'_>, b: SchemaRef<'_>) -> bool {
		match (a.node(), b.node()) {
			(
				SchemaNode::LogicalType {
					logical_type: a_logical,
					inner: a_inner,
				},
				SchemaNode::LogicalType {
					logical_type: b_logical,
					inner: b_inner,
				},
			) => a_logical == b_logical && self.eq(a.at(*a_inner), b.at(*b_inner)),
			(SchemaNode::LogicalType { .. }, SchemaNode::RegularType(_))
			| (SchemaNode::RegularType(_), SchemaNode::LogicalType { .. }) => false,
			(SchemaNode::RegularType(a_type), SchemaNode::RegularType(b_type)) => {
				self.eq_regular(a, a_type, b, b_type)
			}
		}
	}

	fn eq_regular(
		&mut self,
		a: SchemaRef<'_>,
		a_type: &RegularType,
		b: SchemaRef<'_>,
		b_type: &RegularType,
	) -> bool {
		match (a_type, b_type) {
			(RegularType::Null, RegularType::Null)
			| (RegularType::Boolean, RegularType::Boolean)
			| (RegularType::Int, RegularType::Int)
			| (RegularType::Long, RegularType::Long)
			| (RegularType::Float, RegularType::Float)
			| (RegularType::Double, RegularType::Double)
			| (RegularType::Bytes, RegularType::Bytes)
			| (RegularType::String, RegularType::String) => true,
			(RegularType::Array(a_array), RegularType::Array(b_array)) => {
				self.eq(a.at(a_array.items), b.at(b_array.items))
			}
			(RegularType::Map(a_map), RegularType::Map(b_map)) => {
				self.eq(a.at(a_map.values), b.at(b_map.values))
			}
			(RegularType::Union(a_union), RegularType::Union(b_union)) => {
				a_union.variants.len() == b_union.variants.len()
					&& a_union
						.variants
						.iter()
						.zip(&b_union.variants)
						.all(|(&a_variant, &b_variant)| self.eq(a.at(a_variant), b.at(b_variant)))
			}
			(RegularType::Fixed(a_fixed), RegularType::Fixed(b_fixed)) => {
				a_fixed.name == b_fixed.name && a_fixed.size == b_fixed.size
			}
			(RegularType::Enum(a_enum), RegularType::Enum(b_enum)) => {
				a_enum.name == b_enum.name
					&& a_enum.symbols == b_enum.symbols
					&& a_enum.default == b_enum.default
			}
			(RegularType::Record(a_record), RegularType::Record(b_record)) => {
				if a_record.name != b_record.name
					|| a_record.is_error != b_record.is_error
					|| a_record.fields.len() != b_record.fields.len()
				{
					return false;
				}
				if !self.assumed_equal.insert((a.key().idx, b.key().idx)) {
					// Already comparing these two: if they differ, that will be
					// found by the comparison that is in progress
					return true;
				}
				let equal = a_record
					.fields
					.iter()
					.zip(&b_record.fields)
					.all(|(a_field, b_field)| {
						a_field.name == b_field.name
							&& a_field.default == b_field.default
							&& self.eq(a.at(a_field.type_), b.at(b_field.type_))
					});
				if !equal {
					self.assumed_equal.remove(&(a.key().idx, b.key().idx));
				}
				equal
			}
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(s: &str) -> Schema {
		s.parse().unwrap()
	}

	#[test]
	fn ignores_doc_aliases_and_metadata() {
		let a = parse(
			r#"{"type":"record","name":"a.R","doc":"hi","aliases":["Old"],"foo":"bar",
				"fields":[{"name":"x","type":"int","doc":"x doc"}]}"#,
		);
		let b = parse(r#"{"type":"record","name":"R","namespace":"a","fields":[{"name":"x","type":"int"}]}"#);
		assert!(a.structurally_eq(&b));
	}

	#[test]
	fn compares_shape() {
		let int = parse(r#""int""#);
		let date = parse(r#"{"type":"int","logicalType":"date"}"#);
		assert!(!int.structurally_eq(&date));
		assert!(date.structurally_eq(&date.clone()));

		let a = parse(r#"{"type":"fixed","name":"F","size":4}"#);
		let b = parse(r#"{"type":"fixed","name":"F","size":5}"#);
		assert!(!a.structurally_eq(&b));
	}

	#[test]
	fn recursive_records() {
		let a = parse(
			r#"{"type":"record","name":"L","fields":[{"name":"next","type":["null","L"]}]}"#,
		);
		let b = parse(
			r#"{"type":"record","name":"L","fields":[{"name":"next","type":["null","L"]}]}"#,
		);
		let c = parse(
			r#"{"type":"record","name":"L","fields":[{"name":"next","type":["L","null"]}]}"#,
		);
		assert!(a.structurally_eq(&b));
		assert!(!a.structurally_eq(&c));
	}
}
