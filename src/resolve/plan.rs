//! Compiled plans, and how they are run against a [`Decoder`] or an
//! [`Encoder`]
//!
//! A plan is a tree of nodes that mirrors the schema it was compiled from,
//! except that every decision that only depends on the schemas (which
//! conversion to apply, which reader field a writer field goes into, which
//! union variant a value is written as...) has already been taken.
//!
//! Records are stored separately and referred to by index, so that
//! recursive schemas give finite plans.

use super::leaf::{Conversion, Leaf};

use crate::{
	codec::{DeError, Decoder, Encoder, SerError},
	value::{Record, Value},
};

use {
	serde::ser::Error as _,
	std::{collections::BTreeMap, sync::Arc},
};

/// Reads a datum written with the writer schema into a [`Value`] of the
/// target [`ValueType`](crate::ValueType)
///
/// Obtained through [`resolve_reader`](crate::resolve_reader) or a
/// [`Resolver`](super::Resolver). This holds no mutable state, so it may be
/// shared between threads and used any number of times.
#[derive(Clone, Debug)]
pub struct ReadPlan {
	pub(super) root: ReadNode,
	pub(super) records: Arc<[RecordReader]>,
	pub(super) skip_records: Arc<[Vec<SkipNode>]>,
	pub(super) allowed_depth: usize,
}

/// Skips over a datum written with the writer schema
///
/// This is what lets a reader move past a datum it has no use for without
/// decoding it.
#[derive(Clone, Debug)]
pub struct SkipPlan {
	pub(super) root: SkipNode,
	pub(super) records: Arc<[Vec<SkipNode>]>,
	pub(super) allowed_depth: usize,
}

/// Writes a [`Value`] of the source [`ValueType`](crate::ValueType) as a
/// datum of the target schema
///
/// Obtained through [`resolve_writer`](crate::resolve_writer) or a
/// [`Resolver`](super::Resolver).
#[derive(Clone, Debug)]
pub struct WritePlan {
	pub(super) root: WriteNode,
	pub(super) records: Arc<[RecordWriter]>,
	pub(super) allowed_depth: usize,
}

#[derive(Clone, Debug)]
pub(super) enum ReadNode {
	/// Read `wire`, then convert it to the target representation
	Leaf {
		wire: Leaf,
		conversions: Vec<Conversion>,
	},
	/// For each writer symbol, its name and the reader symbol it is read as
	Enum {
		symbols: Vec<(String, Option<String>)>,
	},
	Array(Box<ReadNode>),
	Map(Box<ReadNode>),
	Record(usize),
	/// Writer union with a `null` variant at `null_index`, read as a
	/// nullable value
	Nullable {
		null_index: usize,
		inner: Box<ReadNode>,
	},
	/// Wraps the value in [`Value::Union`], `index` being the variant of the
	/// reader union
	Tagged {
		index: u32,
		inner: Box<ReadNode>,
	},
	/// Writer union: one branch per writer variant
	Union(Vec<Branch>),
}

#[derive(Clone, Debug)]
pub(super) enum Branch {
	Read(ReadNode),
	/// The variant can't be read as the target: selecting it is an error
	Invalid(String),
}

#[derive(Clone, Debug)]
pub(super) struct RecordReader {
	/// Target field names, in target order
	pub(super) field_names: Vec<String>,
	/// One step per writer field, in writer order
	pub(super) steps: Vec<FieldStep>,
	/// Target fields that the writer doesn't provide
	pub(super) defaults: Vec<(usize, Value)>,
}

impl RecordReader {
	/// Stands in for a record that is still being compiled
	pub(super) fn placeholder() -> Self {
		Self {
			field_names: Vec::new(),
			steps: Vec::new(),
			defaults: Vec::new(),
		}
	}
}

#[derive(Clone, Debug)]
pub(super) enum FieldStep {
	Read { target: usize, node: ReadNode },
	Skip(SkipNode),
}

#[derive(Clone, Debug)]
pub(super) enum SkipNode {
	Leaf(Leaf),
	Array(Box<SkipNode>),
	Map(Box<SkipNode>),
	/// Index in the skip records, where each record is the list of its
	/// fields
	Record(usize),
	Union(Vec<SkipNode>),
}

#[derive(Clone, Debug)]
pub(super) enum WriteNode {
	/// Convert the value then write it as `leaf`
	Leaf {
		conversions: Vec<Conversion>,
		leaf: Leaf,
	},
	/// Symbols of the target enum
	Enum {
		symbols: Vec<String>,
	},
	Array(Box<WriteNode>),
	Map(Box<WriteNode>),
	Record(usize),
	/// Nullable value into a nullable union
	Nullable {
		null_index: usize,
		inner: Box<WriteNode>,
	},
	/// Nullable value into a larger union: `null` goes to `null_index`,
	/// anything else to `branch`
	NullOr {
		null_index: usize,
		branch: usize,
		inner: Box<WriteNode>,
	},
	/// Non-union value into a union, always as the same variant
	Branch {
		index: usize,
		inner: Box<WriteNode>,
	},
	/// Union value into a union: for each variant of the value, the target
	/// variant it is written as
	Switch(Vec<(usize, WriteNode)>),
	/// Nullable value into a non-union type
	NonNull(Box<WriteNode>),
	/// Union value into a non-union type: only one variant may be written
	Flatten {
		source_index: u32,
		inner: Box<WriteNode>,
	},
}

#[derive(Clone, Debug)]
pub(super) struct RecordWriter {
	/// For each target field in order, the position of the field in the
	/// value, and how to write it
	pub(super) fields: Vec<(usize, WriteNode)>,
}

impl RecordWriter {
	pub(super) fn placeholder() -> Self {
		Self { fields: Vec::new() }
	}
}

/// Allowed additional depth of the plan execution
///
/// This is decremented as we advance in depth to prevent stack overflow
#[derive(Clone, Copy)]
struct AllowedDepth {
	allowed_additional_depth: usize,
}

impl AllowedDepth {
	fn new(allowed_depth: usize) -> Self {
		Self {
			allowed_additional_depth: allowed_depth,
		}
	}

	fn dec<E>(self, depth_exceeded: fn() -> E) -> Result<Self, E> {
		match self.allowed_additional_depth.checked_sub(1) {
			Some(allowed_additional_depth) => Ok(Self {
				allowed_additional_depth,
			}),
			None => Err(depth_exceeded()),
		}
	}
}

impl ReadPlan {
	/// Read one datum
	pub fn read<D: Decoder>(&self, decoder: &mut D) -> Result<Value, DeError> {
		self.root
			.read(self, decoder, AllowedDepth::new(self.allowed_depth))
	}
}

impl ReadNode {
	fn read<D: Decoder>(
		&self,
		plan: &ReadPlan,
		decoder: &mut D,
		allowed_depth: AllowedDepth,
	) -> Result<Value, DeError> {
		Ok(match self {
			ReadNode::Leaf { wire, conversions } => {
				let mut value = wire.read(decoder)?;
				for conversion in conversions {
					value = conversion.apply(value)?;
				}
				value
			}
			ReadNode::Enum { symbols } => {
				let index = decoder.read_int()?;
				let (writer_symbol, reader_symbol) = usize::try_from(index)
					.ok()
					.and_then(|idx| symbols.get(idx))
					.ok_or_else(|| {
						DeError::index_out_of_range("Enum", index.into(), symbols.len())
					})?;
				match reader_symbol {
					Some(symbol) => Value::Enum(symbol.clone()),
					None => {
						return Err(DeError::invalid_cast(format_args!(
							"Enum symbol {writer_symbol:?} is not known to the reader \
								enum, which has no default"
						)))
					}
				}
			}
			ReadNode::Array(item) => {
				let allowed_depth = allowed_depth.dec(DeError::depth_exceeded)?;
				let mut items = Vec::new();
				decoder.read_array(|decoder| {
					items.push(item.read(plan, decoder, allowed_depth)?);
					Ok(())
				})?;
				Value::Array(items)
			}
			ReadNode::Map(value_node) => {
				let allowed_depth = allowed_depth.dec(DeError::depth_exceeded)?;
				let mut map = BTreeMap::new();
				decoder.read_map(|decoder, key| {
					let value = value_node.read(plan, decoder, allowed_depth)?;
					map.insert(key, value);
					Ok(())
				})?;
				Value::Map(map)
			}
			&ReadNode::Record(idx) => {
				let allowed_depth = allowed_depth.dec(DeError::depth_exceeded)?;
				let reader = &plan.records[idx];
				let mut record =
					Record::with_field_names(reader.field_names.iter().map(String::as_str));
				for (target, default) in &reader.defaults {
					record.put(*target, default.clone());
				}
				for step in &reader.steps {
					match step {
						FieldStep::Read { target, node } => {
							let value = node.read(plan, decoder, allowed_depth)?;
							record.put(*target, value);
						}
						FieldStep::Skip(node) => {
							node.skip(&plan.skip_records, decoder, allowed_depth)?
						}
					}
				}
				Value::Record(record)
			}
			ReadNode::Nullable { null_index, inner } => {
				let allowed_depth = allowed_depth.dec(DeError::depth_exceeded)?;
				decoder
					.read_nullable(*null_index, |decoder| {
						inner.read(plan, decoder, allowed_depth)
					})?
					.unwrap_or(Value::Null)
			}
			ReadNode::Tagged { index, inner } => {
				Value::Union(*index, Box::new(inner.read(plan, decoder, allowed_depth)?))
			}
			ReadNode::Union(branches) => {
				let allowed_depth = allowed_depth.dec(DeError::depth_exceeded)?;
				let index = decoder.read_union_index(branches.len())?;
				match &branches[index] {
					Branch::Read(node) => node.read(plan, decoder, allowed_depth)?,
					Branch::Invalid(reason) => return Err(DeError::invalid_cast(reason)),
				}
			}
		})
	}
}

impl SkipPlan {
	/// Skip one datum
	pub fn skip<D: Decoder>(&self, decoder: &mut D) -> Result<(), DeError> {
		self.root.skip(
			&self.records,
			decoder,
			AllowedDepth::new(self.allowed_depth),
		)
	}
}

impl SkipNode {
	fn skip<D: Decoder>(
		&self,
		records: &[Vec<SkipNode>],
		decoder: &mut D,
		allowed_depth: AllowedDepth,
	) -> Result<(), DeError> {
		match self {
			SkipNode::Leaf(leaf) => leaf.skip(decoder),
			SkipNode::Array(item) => {
				let allowed_depth = allowed_depth.dec(DeError::depth_exceeded)?;
				decoder.skip_array(|decoder| item.skip(records, decoder, allowed_depth))
			}
			SkipNode::Map(value) => {
				let allowed_depth = allowed_depth.dec(DeError::depth_exceeded)?;
				decoder.skip_map(|decoder| value.skip(records, decoder, allowed_depth))
			}
			&SkipNode::Record(idx) => {
				let allowed_depth = allowed_depth.dec(DeError::depth_exceeded)?;
				records[idx]
					.iter()
					.try_for_each(|field| field.skip(records, decoder, allowed_depth))
			}
			SkipNode::Union(variants) => {
				let allowed_depth = allowed_depth.dec(DeError::depth_exceeded)?;
				let index = decoder.read_union_index(variants.len())?;
				variants[index].skip(records, decoder, allowed_depth)
			}
		}
	}
}

impl WritePlan {
	/// Write one datum
	pub fn write<E: Encoder>(&self, encoder: &mut E, value: &Value) -> Result<(), SerError> {
		self.root.write(self, encoder, value, AllowedDepth::new(self.allowed_depth))
	}
}

impl WriteNode {
	fn write<E: Encoder>(
		&self,
		plan: &WritePlan,
		encoder: &mut E,
		value: &Value,
		allowed_depth: AllowedDepth,
	) -> Result<(), SerError> {
		match (self, value) {
			(WriteNode::Leaf { conversions, leaf }, value) => match conversions.is_empty() {
				true => leaf.write(encoder, value),
				false => {
					let converted = conversions
						.iter()
						.try_fold(value.clone(), |value, conversion| conversion.apply(value))?;
					leaf.write(encoder, &converted)
				}
			},
			(WriteNode::Enum { symbols }, Value::Enum(symbol)) => {
				match symbols.iter().position(|s| s == symbol) {
					Some(idx) => {
						let idx: i32 = idx
							.try_into()
							.map_err(|_| SerError::new("Enum symbol index overflows i32"))?;
						encoder.write_int(idx)
					}
					None => Err(SerError::index_out_of_range(format_args!(
						"Enum symbol {symbol:?} is not one of {symbols:?}"
					))),
				}
			}
			(WriteNode::Array(item), Value::Array(items)) => {
				let allowed_depth = allowed_depth.dec(SerError::depth_exceeded)?;
				encoder.write_array(items, |encoder, value| {
					item.write(plan, encoder, value, allowed_depth)
				})
			}
			(WriteNode::Map(value_node), Value::Map(entries)) => {
				let allowed_depth = allowed_depth.dec(SerError::depth_exceeded)?;
				encoder.write_map(entries, |encoder, value| {
					value_node.write(plan, encoder, value, allowed_depth)
				})
			}
			(&WriteNode::Record(idx), Value::Record(record)) => {
				let allowed_depth = allowed_depth.dec(SerError::depth_exceeded)?;
				for (position, node) in &plan.records[idx].fields {
					let field_value = record.get(*position).ok_or_else(|| {
						SerError::custom(format_args!(
							"Record value has {} fields, expected at least {}",
							record.fields.len(),
							position + 1
						))
					})?;
					node.write(plan, encoder, field_value, allowed_depth)?;
				}
				Ok(())
			}
			(WriteNode::Nullable { null_index, inner }, value) => {
				let value = match value {
					Value::Null => None,
					value => Some(value),
				};
				encoder.write_nullable(*null_index, value, |encoder, value| {
					inner.write(plan, encoder, value, allowed_depth)
				})
			}
			(WriteNode::NullOr { null_index, .. }, Value::Null) => {
				encoder.write_union_index(*null_index)
			}
			(WriteNode::NullOr { branch, inner, .. }, value)
			| (
				WriteNode::Branch {
					index: branch,
					inner,
				},
				value,
			) => {
				encoder.write_union_index(*branch)?;
				inner.write(plan, encoder, value, allowed_depth)
			}
			(WriteNode::Switch(cases), Value::Union(variant, inner_value)) => {
				let allowed_depth = allowed_depth.dec(SerError::depth_exceeded)?;
				let (index, node) = usize::try_from(*variant)
					.ok()
					.and_then(|variant| cases.get(variant))
					.ok_or_else(|| {
						SerError::index_out_of_range(format_args!(
							"Union variant {variant} is out of range (the union has {})",
							cases.len()
						))
					})?;
				encoder.write_union_index(*index)?;
				node.write(plan, encoder, inner_value, allowed_depth)
			}
			(WriteNode::NonNull(_), Value::Null) => Err(SerError::new(
				"Null value can not be written: the target schema is not nullable",
			)),
			(WriteNode::NonNull(inner), value) => inner.write(plan, encoder, value, allowed_depth),
			(
				WriteNode::Flatten {
					source_index,
					inner,
				},
				Value::Union(variant, inner_value),
			) => match variant == source_index {
				true => inner.write(plan, encoder, inner_value, allowed_depth),
				false => Err(SerError::index_out_of_range(format_args!(
					"Union variant {variant} has no counterpart in the target schema \
						(only variant {source_index} does)"
				))),
			},
			(node, value) => Err(SerError::unexpected_value(node.expected(), value.kind())),
		}
	}

	fn expected(&self) -> &'static str {
		match self {
			WriteNode::Enum { .. } => "enum",
			WriteNode::Array(_) => "array",
			WriteNode::Map(_) => "map",
			WriteNode::Record(_) => "record",
			WriteNode::Switch(_) | WriteNode::Flatten { .. } => "union",
			WriteNode::Leaf { .. }
			| WriteNode::Nullable { .. }
			| WriteNode::NullOr { .. }
			| WriteNode::Branch { .. }
			| WriteNode::NonNull(_) => "any",
		}
	}
}
