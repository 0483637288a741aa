use std::borrow::Cow;

/// Any error that may happen when building, parsing, editing or rendering a
/// [`Schema`](crate::schema::Schema)
#[derive(thiserror::Error)]
#[error("{}", inner.value)]
pub struct SchemaError {
	inner: Box<ErrorInner>,
}

/// What went wrong, for callers that need to tell [`SchemaError`]s apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaErrorKind {
	/// A name or namespace does not match `[A-Za-z_][A-Za-z0-9_]*`
	/// (dot-separated for namespaces)
	InvalidName,
	/// A metadata tag collides with a reserved Avro keyword
	ReservedProperty,
	/// A [`SchemaKey`](crate::schema::SchemaKey) points outside of the schema
	InvalidKey,
	/// The schema JSON could not be parsed or generated
	Json,
	/// The schema is structurally invalid (duplicate names, ambiguous
	/// unions...)
	Invalid,
}

struct ErrorInner {
	kind: SchemaErrorKind,
	value: Value,
}

enum Value {
	SerdeJson(serde_json::Error),
	Other(Cow<'static, str>),
}

impl SchemaError {
	/// If you need a dynamic string use `SchemaError::msg(format_args!(...))`
	pub(crate) fn new(s: &'static str) -> Self {
		Self::with_kind(SchemaErrorKind::Invalid, Cow::Borrowed(s))
	}

	pub(crate) fn msg(s: std::fmt::Arguments<'_>) -> Self {
		Self::display(s)
	}

	pub(crate) fn display(s: impl std::fmt::Display) -> Self {
		Self::with_kind(SchemaErrorKind::Invalid, Cow::Owned(s.to_string()))
	}

	pub(crate) fn invalid_name(s: std::fmt::Arguments<'_>) -> Self {
		Self::with_kind(SchemaErrorKind::InvalidName, Cow::Owned(s.to_string()))
	}

	pub(crate) fn reserved_property(property: &str) -> Self {
		Self::with_kind(
			SchemaErrorKind::ReservedProperty,
			Cow::Owned(format!(
				"`{property}` is a reserved Avro keyword and cannot be used as a metadata tag"
			)),
		)
	}

	pub(crate) fn invalid_key() -> Self {
		Self::with_kind(
			SchemaErrorKind::InvalidKey,
			Cow::Borrowed("SchemaKey refers to non-existing node"),
		)
	}

	pub(crate) fn serde_json(serde_json_error: serde_json::Error) -> Self {
		Self {
			inner: Box::new(ErrorInner {
				kind: SchemaErrorKind::Json,
				value: Value::SerdeJson(serde_json_error),
			}),
		}
	}

	fn with_kind(kind: SchemaErrorKind, value: Cow<'static, str>) -> Self {
		Self {
			inner: Box::new(ErrorInner {
				kind,
				value: Value::Other(value),
			}),
		}
	}

	/// The category this error falls into
	pub fn kind(&self) -> SchemaErrorKind {
		self.inner.kind
	}
}

impl std::fmt::Debug for SchemaError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.inner.value {
			Value::SerdeJson(ref e) => std::fmt::Debug::fmt(e, f),
			Value::Other(ref s) => std::fmt::Debug::fmt(&**s, f),
		}
	}
}

impl std::fmt::Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::SerdeJson(e) => std::fmt::Display::fmt(e, f),
			Value::Other(s) => std::fmt::Display::fmt(&**s, f),
		}
	}
}
