use super::*;

impl Schema {
	/// Move the named type at `key` to a different namespace
	///
	/// Every named type reachable from `key` whose namespace was the old
	/// namespace of that type (or nested under it) is moved as well, so
	/// that e.g. moving `a.Outer` to `b` turns `a.Inner` into `b.Inner`
	/// and `a.sub.Leaf` into `b.sub.Leaf`.
	///
	/// An empty or `None` namespace is the null namespace.
	///
	/// This must not be called while plans are being resolved against this
	/// schema (it requires `&mut self` so that is guaranteed).
	pub fn set_namespace(
		&mut self,
		key: SchemaKey,
		new_namespace: Option<&str>,
	) -> Result<(), SchemaError> {
		let old_namespace = self
			.at(key)?
			.name()
			.ok_or_else(|| {
				SchemaError::msg(format_args!(
					"Can only set the namespace of a named type, but node {key:?} is not one"
				))
			})?
			.namespace()
			.map(str::to_owned);
		self.rewrite_namespace(key, old_namespace.as_deref(), new_namespace)
	}

	/// Replace `old_namespace` by `new_namespace` in every named type
	/// reachable from `from` whose namespace is, or is nested under,
	/// `old_namespace`
	///
	/// When `old_namespace` is the null namespace, only the types in the
	/// null namespace are moved.
	pub fn rewrite_namespace(
		&mut self,
		from: SchemaKey,
		old_namespace: Option<&str>,
		new_namespace: Option<&str>,
	) -> Result<(), SchemaError> {
		self.rewrite_namespace_from(&[from], old_namespace, new_namespace)
	}

	/// Same as [`rewrite_namespace`](Self::rewrite_namespace), for every named
	/// type reachable from any of `roots`
	///
	/// Each type is renamed at most once, even if reachable from several
	/// roots.
	pub(crate) fn rewrite_namespace_from(
		&mut self,
		roots: &[SchemaKey],
		old_namespace: Option<&str>,
		new_namespace: Option<&str>,
	) -> Result<(), SchemaError> {
		let new_namespace = new_namespace.filter(|ns| !ns.is_empty());
		let old_namespace = old_namespace.filter(|ns| !ns.is_empty());
		if let Some(new_namespace) = new_namespace {
			name::validate_namespace(new_namespace)?;
		}
		if roots.iter().any(|root| self.nodes.get(root.idx).is_none()) {
			return Err(SchemaError::invalid_key());
		}

		// Explicit pass over the arena: collect what is reachable first, then
		// rename, so back-edges don't matter
		let mut reachable = vec![false; self.nodes.len()];
		let mut stack = roots.to_vec();
		while let Some(key) = stack.pop() {
			match reachable.get_mut(key.idx) {
				Some(seen @ false) => *seen = true,
				Some(true) => continue,
				None => return Err(SchemaError::invalid_key()),
			}
			match &self.nodes[key.idx] {
				SchemaNode::LogicalType { inner, .. } => stack.push(*inner),
				SchemaNode::RegularType(regular_type) => stack.extend(regular_type.children()),
			}
		}

		for (node, _) in self
			.nodes
			.iter_mut()
			.zip(reachable)
			.filter(|&(_, reachable)| reachable)
		{
			let SchemaNode::RegularType(regular_type) = node else {
				continue;
			};
			let Some(name) = regular_type.name_mut() else {
				continue;
			};
			if let Some(renamed) = rename(name, old_namespace, new_namespace) {
				*name = renamed;
			}
		}
		Ok(())
	}
}

fn rename(name: &Name, old_namespace: Option<&str>, new_namespace: Option<&str>) -> Option<Name> {
	let namespace = name.namespace();
	let moved_namespace: Option<String> = match (old_namespace, namespace) {
		(None, None) => new_namespace.map(str::to_owned),
		(None, Some(_)) => return None,
		(Some(_), None) => return None,
		(Some(old), Some(current)) if current == old => new_namespace.map(str::to_owned),
		(Some(old), Some(current)) => {
			let nested = current.strip_prefix(old)?.strip_prefix('.')?;
			Some(match new_namespace {
				Some(new) => format!("{new}.{nested}"),
				None => nested.to_owned(),
			})
		}
	};
	Some(name.with_namespace(moved_namespace.as_deref()))
}
