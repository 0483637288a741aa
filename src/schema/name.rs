use super::SchemaError;

/// Schema component for named nodes of a [`Schema`](super::Schema)
///
/// This holds both the "name" and the "namespace".
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
	fully_qualified_name: String,
	namespace_delimiter_idx: Option<usize>,
}

impl std::fmt::Debug for Name {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&self.fully_qualified_name, f)
	}
}

impl std::fmt::Display for Name {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.fully_qualified_name)
	}
}

impl Name {
	/// Build a [`Name`] from its name and namespace components, checking that
	/// they are valid Avro identifiers
	///
	/// An empty namespace is the null namespace.
	pub fn new(name: &str, namespace: Option<&str>) -> Result<Self, SchemaError> {
		validate_identifier(name)?;
		match namespace.filter(|ns| !ns.is_empty()) {
			None => Ok(Self {
				fully_qualified_name: name.to_owned(),
				namespace_delimiter_idx: None,
			}),
			Some(namespace) => {
				validate_namespace(namespace)?;
				Ok(Self {
					fully_qualified_name: format!("{namespace}.{name}"),
					namespace_delimiter_idx: Some(namespace.len()),
				})
			}
		}
	}

	/// The rightmost component of the fully qualified name
	///
	/// e.g. in `a.b.c` it's `c`
	pub fn name(&self) -> &str {
		match self.namespace_delimiter_idx {
			None => &self.fully_qualified_name,
			Some(delimiter_idx) => &self.fully_qualified_name[delimiter_idx + 1..],
		}
	}

	/// The namespace component of the fully qualified name
	///
	/// e.g. in `a.b.c` it's `a.b`
	pub fn namespace(&self) -> Option<&str> {
		self.namespace_delimiter_idx
			.map(|idx| &self.fully_qualified_name[..idx])
	}

	/// The fully qualified name
	///
	/// e.g. in `a.b.c` it's `a.b.c`
	pub fn fully_qualified_name(&self) -> &str {
		&self.fully_qualified_name
	}

	/// Build a [`Name`] from a fully qualified name
	///
	/// This does not validate the identifiers (see [`Name::new`] or
	/// [`Schema::validate`](super::Schema::validate) for that).
	///
	/// If the only `.` in the fully qualified name is at the beginning of the
	/// string, it will be stripped, that is, we will parse `namespace: None,
	/// name: "anything_behind_the_dot"`.
	pub fn from_fully_qualified_name(fully_qualified_name: impl Into<String>) -> Self {
		fn non_generic_inner(mut fully_qualified_name: String) -> Name {
			Name {
				namespace_delimiter_idx: match fully_qualified_name.rfind('.') {
					Some(0) => {
						fully_qualified_name.remove(0);
						None
					}
					other => other,
				},
				fully_qualified_name,
			}
		}
		non_generic_inner(fully_qualified_name.into())
	}

	/// Resolve a name as it may appear in a schema (either fully qualified or
	/// relative to the enclosing namespace)
	pub(crate) fn resolve(name: &str, enclosing_namespace: Option<&str>) -> Self {
		match (name.contains('.'), enclosing_namespace) {
			(false, Some(namespace)) if !namespace.is_empty() => Self {
				fully_qualified_name: format!("{namespace}.{name}"),
				namespace_delimiter_idx: Some(namespace.len()),
			},
			_ => Self::from_fully_qualified_name(name),
		}
	}

	/// The same name in a different namespace
	pub fn with_namespace(&self, namespace: Option<&str>) -> Self {
		Self::resolve(self.name(), namespace)
	}

	/// Check that both the name and namespace components are valid Avro
	/// identifiers
	pub fn validate(&self) -> Result<(), SchemaError> {
		validate_identifier(self.name())?;
		if let Some(namespace) = self.namespace() {
			validate_namespace(namespace)?;
		}
		Ok(())
	}
}

/// Names, enum symbols and field names must match `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn validate_identifier(identifier: &str) -> Result<(), SchemaError> {
	let mut chars = identifier.chars();
	let valid = match chars.next() {
		Some(first) => {
			(first.is_ascii_alphabetic() || first == '_')
				&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
		}
		None => false,
	};
	match valid {
		true => Ok(()),
		false => Err(SchemaError::invalid_name(format_args!(
			"Invalid name {identifier:?}: names must match [A-Za-z_][A-Za-z0-9_]*"
		))),
	}
}

/// A namespace is a dot-separated sequence of identifiers
pub(crate) fn validate_namespace(namespace: &str) -> Result<(), SchemaError> {
	namespace.split('.').try_for_each(|component| {
		validate_identifier(component).map_err(|_| {
			SchemaError::invalid_name(format_args!(
				"Invalid namespace {namespace:?}: each dot-separated component \
					must match [A-Za-z_][A-Za-z0-9_]*"
			))
		})
	})
}
