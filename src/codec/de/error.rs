use {serde::de::Error, std::borrow::Cow};

/// Any error that may happen while executing a read or skip plan
#[derive(thiserror::Error)]
#[error("{}", inner.value)]
pub struct DeError {
	inner: Box<ErrorInner>,
}

/// What went wrong, for callers that need to tell [`DeError`]s apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeErrorKind {
	/// A union or enum ordinal read from the data is outside of the writer
	/// schema's variants or symbols
	IndexOutOfRange,
	/// The union variant (or enum symbol) selected by the data has no
	/// counterpart the reader can represent
	InvalidCast,
	/// The underlying reader failed (including unexpected EOF)
	Io,
	/// The data does not match the writer schema
	Malformed,
	/// The data is nested deeper than the configured limit
	DepthExceeded,
}

impl std::fmt::Debug for DeError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&*self.inner.value, f)
	}
}

struct ErrorInner {
	kind: DeErrorKind,
	value: Cow<'static, str>,
}

impl DeError {
	/// If you need a dynamic string use `DeError::custom(format_args!(...))`
	pub(crate) fn new(s: &'static str) -> Self {
		Self::with_kind(DeErrorKind::Malformed, Cow::Borrowed(s))
	}
	pub(crate) fn unexpected_eof() -> Self {
		Self::with_kind(
			DeErrorKind::Io,
			Cow::Borrowed("Unexpected end of input while deserializing"),
		)
	}
	pub(crate) fn io(io_error: std::io::Error) -> Self {
		Self::with_kind(
			DeErrorKind::Io,
			Cow::Owned(format!(
				"Encountered IO error when attempting to read for deserialization: {io_error}"
			)),
		)
	}
	pub(crate) fn index_out_of_range(what: &str, index: i64, len: usize) -> Self {
		Self::with_kind(
			DeErrorKind::IndexOutOfRange,
			Cow::Owned(format!(
				"{what} index {index} read from the data is out of range \
					(the writer schema only has {len})"
			)),
		)
	}
	pub(crate) fn invalid_cast(msg: impl std::fmt::Display) -> Self {
		Self::with_kind(DeErrorKind::InvalidCast, Cow::Owned(msg.to_string()))
	}
	pub(crate) fn depth_exceeded() -> Self {
		Self::with_kind(
			DeErrorKind::DepthExceeded,
			Cow::Borrowed("Deserialization recursivity limit reached (stack overflow prevention)"),
		)
	}

	fn with_kind(kind: DeErrorKind, value: Cow<'static, str>) -> Self {
		Self {
			inner: Box::new(ErrorInner { kind, value }),
		}
	}

	/// The category this error falls into
	pub fn kind(&self) -> DeErrorKind {
		self.inner.kind
	}
}

impl serde::de::Error for DeError {
	fn custom<T>(msg: T) -> Self
	where
		T: std::fmt::Display,
	{
		Self::with_kind(DeErrorKind::Malformed, Cow::Owned(msg.to_string()))
	}
}
