use {serde::ser::Error, std::borrow::Cow};

/// Any error that may happen while executing a write plan
#[derive(thiserror::Error)]
#[error("{}", inner.value)]
pub struct SerError {
	inner: Box<ErrorInner>,
}

/// What went wrong, for callers that need to tell [`SerError`]s apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SerErrorKind {
	/// The underlying writer failed
	Io,
	/// The value does not have the shape the plan was compiled for
	InvalidValue,
	/// An enum symbol or union variant of the value has no counterpart in
	/// the target schema
	IndexOutOfRange,
	/// A decimal does not fit the scale or size of the target schema
	DecimalOutOfRange,
	/// The value is nested deeper than the configured limit
	DepthExceeded,
}

impl std::fmt::Debug for SerError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&*self.inner.value, f)
	}
}

struct ErrorInner {
	kind: SerErrorKind,
	value: Cow<'static, str>,
}

impl SerError {
	/// If you need a dynamic string use `SerError::custom(format_args!(...))`
	pub(crate) fn new(s: &'static str) -> Self {
		Self::with_kind(SerErrorKind::InvalidValue, Cow::Borrowed(s))
	}
	pub(crate) fn io(io_error: std::io::Error) -> Self {
		Self::with_kind(
			SerErrorKind::Io,
			Cow::Owned(format!(
				"Encountered IO error when attempting to write for serialization: {io_error}"
			)),
		)
	}
	pub(crate) fn unexpected_value(expected: impl std::fmt::Display, got: &str) -> Self {
		Self::custom(format_args!("Expected {expected} value, got {got}"))
	}
	pub(crate) fn index_out_of_range(msg: impl std::fmt::Display) -> Self {
		Self::with_kind(SerErrorKind::IndexOutOfRange, Cow::Owned(msg.to_string()))
	}
	pub(crate) fn decimal_out_of_range(msg: impl std::fmt::Display) -> Self {
		Self::with_kind(SerErrorKind::DecimalOutOfRange, Cow::Owned(msg.to_string()))
	}
	pub(crate) fn depth_exceeded() -> Self {
		Self::with_kind(
			SerErrorKind::DepthExceeded,
			Cow::Borrowed("Serialization recursivity limit reached (stack overflow prevention)"),
		)
	}

	fn with_kind(kind: SerErrorKind, value: Cow<'static, str>) -> Self {
		Self {
			inner: Box::new(ErrorInner { kind, value }),
		}
	}

	/// The category this error falls into
	pub fn kind(&self) -> SerErrorKind {
		self.inner.kind
	}
}

impl serde::ser::Error for SerError {
	fn custom<T>(msg: T) -> Self
	where
		T: std::fmt::Display,
	{
		Self::with_kind(SerErrorKind::InvalidValue, Cow::Owned(msg.to_string()))
	}
}
