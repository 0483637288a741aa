use super::{RegularType, Schema, SchemaNode};

impl Schema {
	/// Check that the schema does not contain zero-sized unconditional cycles.
	///
	/// This is called by [`validate`](Schema::validate) already.
	///
	/// Note that plans otherwise already prevent stack overflows by limiting
	/// the recursion depth.
	pub(crate) fn check_for_cycles(&self) -> Result<(), UnconditionalCycle> {
		// Zero-size cycles (that would trigger infinite recursion when decoding,
		// without consuming any input) can only happen with records that end up
		// containing themselves only through record fields.
		// Any other path would consume at least one byte (union discriminant,
		// block length...)
		let mut visited_nodes = vec![false; self.nodes.len()];
		let mut checked_nodes = vec![false; self.nodes.len()];
		for (idx, node) in self.nodes.iter().enumerate() {
			let is_record = matches!(node, SchemaNode::RegularType(RegularType::Record(_)));
			if is_record && !checked_nodes[idx] {
				check_no_zero_sized_cycle_inner(self, idx, &mut visited_nodes, &mut checked_nodes)?;
			}
		}
		Ok(())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("The schema contains record {record_name} that ends up always containing itself")]
/// Error: Detected unconditional cycle in provided schema
///
/// It was detected that the schema contains a record that ends up always
/// containing itself
pub struct UnconditionalCycle {
	record_name: String,
}

fn check_no_zero_sized_cycle_inner(
	schema: &Schema,
	node_idx: usize,
	visited_nodes: &mut Vec<bool>,
	checked_nodes: &mut Vec<bool>,
) -> Result<(), UnconditionalCycle> {
	let SchemaNode::RegularType(RegularType::Record(record)) = &schema.nodes[node_idx] else {
		return Ok(());
	};
	visited_nodes[node_idx] = true;
	for field in &record.fields {
		let field_idx = field.type_.idx;
		if let Some(SchemaNode::RegularType(RegularType::Record(field_record))) =
			schema.nodes.get(field_idx)
		{
			if visited_nodes[field_idx] {
				return Err(UnconditionalCycle {
					record_name: field_record.name.fully_qualified_name().to_owned(),
				});
			} else if !checked_nodes[field_idx] {
				check_no_zero_sized_cycle_inner(schema, field_idx, visited_nodes, checked_nodes)?;
			}
		}
	}
	visited_nodes[node_idx] = false;
	// If we have visited a node and it was ok as part of another record, no need to
	// re-visit it individually.
	checked_nodes[node_idx] = true;
	Ok(())
}
