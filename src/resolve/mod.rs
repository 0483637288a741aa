//! Reconcile a writer schema with a reader schema (or a source schema with a
//! target schema), and compile the result into reusable plans
//!
//! Resolution follows the
//! [schema resolution rules](https://avro.apache.org/docs/current/specification/#schema-resolution)
//! of the Avro specification: numeric promotion, `bytes`/`string`
//! interchangeability, record fields matched by name (or alias) with
//! defaults for the ones the writer doesn't provide, enum defaults, and
//! union variants picked by [`find_match`](crate::matcher::find_match).
//!
//! All decisions are taken once, when compiling. Compilation either fails
//! with a [`ResolveError`], or gives a plan that may then be executed any
//! number of times. The only errors that remain for run time are those that
//! depend on the data: a union variant or enum symbol that the reader can't
//! represent, malformed input, or a value that doesn't match the plan.

mod cache;
mod decode;
mod default;
mod encode;
mod leaf;
mod plan;

pub use {
	cache::PlanCache,
	plan::{ReadPlan, SkipPlan, WritePlan},
};

use crate::{
	schema::{Schema, SchemaError, SchemaRef},
	value::ValueType,
};

/// Errors that may happen when compiling a plan
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ResolveError {
	/// There is no way to go from one schema to the other that gives values
	/// of the requested type
	#[error("Values of type {value_type} can not be resolved from schema {from} to schema {to}")]
	Incompatible {
		/// The schema the data comes from (the writer schema when reading,
		/// the source schema when writing)
		from: String,
		/// The schema the data goes to (the reader schema when reading, the
		/// target schema when writing)
		to: String,
		#[allow(missing_docs)]
		value_type: String,
	},
	/// A reader field has no writer counterpart and no default
	#[error("Field {field} of record {record} is not written and has no default value")]
	UnmappedField {
		#[allow(missing_docs)]
		record: String,
		#[allow(missing_docs)]
		field: String,
	},
	/// The default value of a reader field is not valid for its schema
	#[error("Invalid default value for field {field}: {reason}")]
	InvalidDefault {
		/// `record.field`
		field: String,
		#[allow(missing_docs)]
		reason: String,
	},
	/// One of the schemas does not [validate](crate::schema::Schema::validate) (e.g. it has a
	/// dangling key)
	#[error(transparent)]
	Schema(#[from] SchemaError),
}

impl ResolveError {
	pub(crate) fn incompatible(
		from: SchemaRef<'_>,
		to: SchemaRef<'_>,
		value_type: &ValueType,
	) -> Self {
		ResolveError::Incompatible {
			from: from.describe(),
			to: to.describe(),
			value_type: value_type.to_string(),
		}
	}
}

/// Configuration of the plans compiled by a [`Resolver`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct ResolverConfig {
	/// Maximum nesting depth (arrays, maps, records, unions) a plan will go
	/// through when it runs
	///
	/// This prevents stack overflows on recursive schemas with malicious or
	/// malformed data.
	///
	/// Default is 64.
	pub allowed_depth: usize,
}

impl ResolverConfig {
	#[allow(missing_docs)]
	pub fn new() -> Self {
		Self { allowed_depth: 64 }
	}
}

impl Default for ResolverConfig {
	fn default() -> Self {
		Self::new()
	}
}

/// Compiles plans with a given [`ResolverConfig`]
///
/// [`resolve_reader`](crate::resolve_reader) and
/// [`resolve_writer`](crate::resolve_writer) use the default configuration.
/// To compile each plan only once, see [`PlanCache`].
#[derive(Clone, Debug, Default)]
pub struct Resolver {
	/// The configuration of the compiled plans
	pub config: ResolverConfig,
}

impl Resolver {
	#[allow(missing_docs)]
	pub fn new(config: ResolverConfig) -> Self {
		Self { config }
	}

	/// Compile the plans that read data written with `writer` as values of
	/// type `target`, through the `reader` schema
	///
	/// `target` must be a type the reader schema can be represented as (see
	/// [`ValueType::of`] for its natural representation). The [`SkipPlan`]
	/// skips over a datum of the writer schema.
	pub fn resolve_reader(
		&self,
		reader: &Schema,
		writer: &Schema,
		target: &ValueType,
	) -> Result<(ReadPlan, SkipPlan), ResolveError> {
		decode::resolve_reader(reader, writer, target, &self.config).map_err(|error| {
			tracing::debug!(%error, "Could not compile read plan");
			error
		})
	}

	/// Compile the plan that writes values of type `source_type`, which
	/// conform to the `source` schema, as data of the `target` schema
	pub fn resolve_writer(
		&self,
		source: &Schema,
		target: &Schema,
		source_type: &ValueType,
	) -> Result<WritePlan, ResolveError> {
		encode::resolve_writer(source, target, source_type, &self.config).map_err(|error| {
			tracing::debug!(%error, "Could not compile write plan");
			error
		})
	}
}
