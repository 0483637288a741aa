//! Compile the [`ReadPlan`] that reads data written with a writer schema as
//! values of a target type, through a reader schema

use super::{
	default::default_value,
	leaf::{conversion_path, Leaf},
	plan::*,
	ResolveError, ResolverConfig,
};

use crate::{
	matcher::find_match,
	schema::{LogicalType, RegularType, Schema, SchemaKey, SchemaRef},
	value::{RecordType, ValueType},
};

use std::{collections::HashMap, sync::Arc};

pub(super) fn resolve_reader(
	reader: &Schema,
	writer: &Schema,
	target: &ValueType,
	config: &ResolverConfig,
) -> Result<(ReadPlan, SkipPlan), ResolveError> {
	reader.validate()?;
	writer.validate()?;
	let reader_root = reader.at(SchemaKey::root())?;
	let writer_root = writer.at(SchemaKey::root())?;
	let mut compiler = ReadCompiler {
		target_records: target.record_types(),
		records: Vec::new(),
		memo: HashMap::new(),
		skips: SkipCompiler::default(),
	};
	let root = compiler.resolve(reader_root, writer_root, target)?;
	let skip_root = compiler.skips.compile(writer_root);
	let skip_records: Arc<[Vec<SkipNode>]> = compiler.skips.records.into();
	tracing::debug!(
		reader = %reader_root,
		writer = %writer_root,
		n_records = compiler.records.len(),
		"Compiled read plan"
	);
	Ok((
		ReadPlan {
			root,
			records: compiler.records.into(),
			skip_records: skip_records.clone(),
			allowed_depth: config.allowed_depth,
		},
		SkipPlan {
			root: skip_root,
			records: skip_records,
			allowed_depth: config.allowed_depth,
		},
	))
}

struct ReadCompiler<'t> {
	target_records: HashMap<&'t str, &'t RecordType>,
	records: Vec<RecordReader>,
	/// Records that are compiled (or being compiled), by reader record,
	/// writer record and target record name
	memo: HashMap<(SchemaKey, SchemaKey, &'t str), usize>,
	skips: SkipCompiler,
}

impl<'t> ReadCompiler<'t> {
	fn resolve(
		&mut self,
		reader: SchemaRef<'_>,
		writer: SchemaRef<'_>,
		target: &'t ValueType,
	) -> Result<ReadNode, ResolveError> {
		let incompatible = || ResolveError::incompatible(writer, reader, target);
		match target {
			ValueType::Nullable(inner_target) => {
				let (_, reader_inner) = reader.as_nullable().ok_or_else(incompatible)?;
				if let Some((null_index, writer_inner)) = writer.as_nullable() {
					return Ok(ReadNode::Nullable {
						null_index,
						inner: Box::new(self.resolve(reader_inner, writer_inner, inner_target)?),
					});
				}
				if writer.is_null() {
					return Ok(ReadNode::Leaf {
						wire: Leaf::Null,
						conversions: Vec::new(),
					});
				}
				match writer.union_variants() {
					Some(writer_variants) => {
						let branches = writer_variants
							.map(|writer_variant| match writer_variant.is_null() {
								true => Branch::Read(ReadNode::Leaf {
									wire: Leaf::Null,
									conversions: Vec::new(),
								}),
								false => self.branch(|this| {
									this.resolve(reader_inner, writer_variant, inner_target)
								}),
							})
							.collect();
						Ok(ReadNode::Union(branches))
					}
					None => self.resolve(reader_inner, writer, inner_target),
				}
			}
			ValueType::Union(target_variants) => {
				let reader_variants: Vec<SchemaRef<'_>> = reader
					.union_variants()
					.ok_or_else(incompatible)?
					.collect();
				if reader_variants.len() != target_variants.len() {
					return Err(incompatible());
				}
				match writer.union_variants() {
					Some(writer_variants) => {
						let branches = writer_variants
							.map(|writer_variant| {
								match find_match(writer_variant, reader_variants.iter().copied()) {
									Some((index, reader_variant)) => self.branch(|this| {
										this.tagged(
											index,
											reader_variant,
											writer_variant,
											&target_variants[index],
										)
									}),
									None => Branch::Invalid(format!(
										"Writer union variant {writer_variant} matches no variant \
											of the reader union {reader}"
									)),
								}
							})
							.collect();
						Ok(ReadNode::Union(branches))
					}
					None => {
						let (index, reader_variant) =
							find_match(writer, reader_variants.iter().copied())
								.ok_or_else(incompatible)?;
						self.tagged(index, reader_variant, writer, &target_variants[index])
					}
				}
			}
			_ => {
				if let Some(writer_variants) = writer.union_variants() {
					if reader.union_variants().is_some() {
						return Err(incompatible());
					}
					let branches: Vec<Branch> = writer_variants
						.map(|writer_variant| {
							self.branch(|this| this.resolve(reader, writer_variant, target))
						})
						.collect();
					if branches
						.iter()
						.all(|branch| matches!(branch, Branch::Invalid(_)))
					{
						return Err(incompatible());
					}
					return Ok(ReadNode::Union(branches));
				}
				self.resolve_non_union(reader, writer, target)
					.ok_or_else(incompatible)?
			}
		}
	}

	/// Neither the writer nor the target is a union
	///
	/// `None` means incompatible.
	fn resolve_non_union(
		&mut self,
		reader: SchemaRef<'_>,
		writer: SchemaRef<'_>,
		target: &'t ValueType,
	) -> Option<Result<ReadNode, ResolveError>> {
		Some(match (reader.regular(), writer.regular(), target) {
			(
				RegularType::Array(reader_array),
				RegularType::Array(writer_array),
				ValueType::Array(items),
			) => self
				.resolve(reader.at(reader_array.items), writer.at(writer_array.items), items)
				.map(|node| ReadNode::Array(Box::new(node))),
			(
				RegularType::Map(reader_map),
				RegularType::Map(writer_map),
				ValueType::Map(values),
			) => self
				.resolve(reader.at(reader_map.values), writer.at(writer_map.values), values)
				.map(|node| ReadNode::Map(Box::new(node))),
			(RegularType::Record(_), RegularType::Record(_), ValueType::Record(record_type)) => {
				if !reader.matches_name(writer) {
					return None;
				}
				self.record(reader, writer, record_type)
			}
			(RegularType::Record(_), RegularType::Record(_), ValueType::RecordRef(name)) => {
				if !reader.matches_name(writer) {
					return None;
				}
				let record_type = *self.target_records.get(name.as_str())?;
				self.record(reader, writer, record_type)
			}
			(RegularType::Enum(reader_enum), RegularType::Enum(writer_enum), ValueType::Enum) => {
				if !reader.matches_name(writer) {
					return None;
				}
				let reader_default = reader_enum
					.default
					.as_ref()
					.filter(|default| reader_enum.symbols.contains(default));
				Ok(ReadNode::Enum {
					symbols: writer_enum
						.symbols
						.iter()
						.map(|symbol| {
							let reader_symbol = match reader_enum.symbols.contains(symbol) {
								true => Some(symbol),
								false => reader_default,
							};
							(symbol.clone(), reader_symbol.cloned())
						})
						.collect(),
				})
			}
			(RegularType::Fixed(_), RegularType::Fixed(_), _) if !reader.matches_name(writer) => {
				return None
			}
			_ => {
				if !decimals_compatible(reader, writer) {
					return None;
				}
				let target_leaf = Leaf::representing(reader, target)?;
				let wire = Leaf::natural(writer)?;
				// The reader must be able to read what the writer wrote, even
				// if it represents it in yet another way
				let reader_leaf = Leaf::natural(reader)?;
				let to_reader = conversion_path(wire, reader_leaf)?;
				// Physical targets get the data as written, unless the logical
				// value changes on the way to the reader (more precise time unit)
				if !target_leaf.is_logical()
					&& !to_reader.iter().any(|conversion| conversion.changes_logical_value())
				{
					if let Some(conversions) = conversion_path(wire.physical(), target_leaf) {
						return Some(Ok(ReadNode::Leaf {
							wire: wire.physical(),
							conversions,
						}));
					}
				}
				let mut conversions = to_reader;
				conversions.extend(conversion_path(reader_leaf, target_leaf)?);
				Ok(ReadNode::Leaf { wire, conversions })
			}
		})
	}

	fn tagged(
		&mut self,
		index: usize,
		reader_variant: SchemaRef<'_>,
		writer: SchemaRef<'_>,
		target: &'t ValueType,
	) -> Result<ReadNode, ResolveError> {
		let index: u32 = index
			.try_into()
			.map_err(|_| ResolveError::incompatible(writer, reader_variant, target))?;
		Ok(ReadNode::Tagged {
			index,
			inner: Box::new(self.resolve(reader_variant, writer, target)?),
		})
	}

	/// Compile one branch of a writer union
	///
	/// If that fails, whatever was compiled in the attempt is dropped, and
	/// the branch errors at run time instead.
	fn branch(
		&mut self,
		compile: impl FnOnce(&mut Self) -> Result<ReadNode, ResolveError>,
	) -> Branch {
		let n_records = self.records.len();
		match compile(self) {
			Ok(node) => Branch::Read(node),
			Err(error) => {
				self.records.truncate(n_records);
				self.memo.retain(|_, &mut idx| idx < n_records);
				tracing::debug!(%error, "Writer union variant can not be read");
				Branch::Invalid(error.to_string())
			}
		}
	}

	fn record(
		&mut self,
		reader: SchemaRef<'_>,
		writer: SchemaRef<'_>,
		target: &'t RecordType,
	) -> Result<ReadNode, ResolveError> {
		let memo_key = (reader.regular_key(), writer.regular_key(), target.name.as_str());
		if let Some(&idx) = self.memo.get(&memo_key) {
			return Ok(ReadNode::Record(idx));
		}
		let idx = self.records.len();
		self.records.push(RecordReader::placeholder());
		self.memo.insert(memo_key, idx);

		let (RegularType::Record(reader_record), RegularType::Record(writer_record)) =
			(reader.regular(), writer.regular())
		else {
			return Err(ResolveError::incompatible(
				writer,
				reader,
				&ValueType::Record(target.clone()),
			));
		};
		let record_name = reader_record.name.fully_qualified_name();

		for (field_name, _) in &target.fields {
			if !reader_record.fields.iter().any(|f| f.name == *field_name) {
				return Err(ResolveError::incompatible(
					writer,
					reader,
					&ValueType::Record(target.clone()),
				));
			}
		}

		let mut read_from_writer = vec![false; reader_record.fields.len()];
		let mut steps = Vec::with_capacity(writer_record.fields.len());
		for writer_field in &writer_record.fields {
			let reader_field = reader_record
				.fields
				.iter()
				.enumerate()
				.find(|&(reader_idx, reader_field)| {
					!read_from_writer[reader_idx]
						&& (reader_field.name == writer_field.name
							|| reader_field.aliases.contains(&writer_field.name))
				});
			let step = match reader_field {
				Some((reader_idx, reader_field)) => {
					read_from_writer[reader_idx] = true;
					match target.field_position(&reader_field.name) {
						Some(position) => FieldStep::Read {
							target: position,
							node: self.resolve(
								reader.at(reader_field.type_),
								writer.at(writer_field.type_),
								&target.fields[position].1,
							)?,
						},
						None => FieldStep::Skip(self.skips.compile(writer.at(writer_field.type_))),
					}
				}
				None => FieldStep::Skip(self.skips.compile(writer.at(writer_field.type_))),
			};
			steps.push(step);
		}

		let mut defaults = Vec::new();
		for (reader_field, _) in reader_record
			.fields
			.iter()
			.zip(&read_from_writer)
			.filter(|&(_, &read)| !read)
		{
			let default = reader_field
				.default
				.as_ref()
				.ok_or_else(|| ResolveError::UnmappedField {
					record: record_name.to_owned(),
					field: reader_field.name.clone(),
				})?;
			let field_schema = reader.at(reader_field.type_);
			let invalid_default = |reason| ResolveError::InvalidDefault {
				field: format!("{record_name}.{}", reader_field.name),
				reason,
			};
			match target.field_position(&reader_field.name) {
				Some(position) => {
					let value = default_value(
						field_schema,
						default,
						&target.fields[position].1,
						&self.target_records,
					)
					.map_err(invalid_default)?;
					defaults.push((position, value));
				}
				None => {
					// Not part of the target, but the default must still be
					// valid
					let natural_type = ValueType::of(field_schema);
					let records = natural_type.record_types();
					default_value(field_schema, default, &natural_type, &records)
						.map_err(invalid_default)?;
				}
			}
		}

		self.records[idx] = RecordReader {
			field_names: target.fields.iter().map(|(name, _)| name.clone()).collect(),
			steps,
			defaults,
		};
		Ok(ReadNode::Record(idx))
	}
}

/// Two decimals must agree on precision and scale
fn decimals_compatible(a: SchemaRef<'_>, b: SchemaRef<'_>) -> bool {
	match (a.logical_type(), b.logical_type()) {
		(Some(LogicalType::Decimal(a)), Some(LogicalType::Decimal(b))) => {
			a.precision == b.precision && a.scale == b.scale
		}
		_ => true,
	}
}

#[derive(Default)]
pub(super) struct SkipCompiler {
	pub(super) records: Vec<Vec<SkipNode>>,
	memo: HashMap<SchemaKey, usize>,
}

impl SkipCompiler {
	pub(super) fn compile(&mut self, schema: SchemaRef<'_>) -> SkipNode {
		let regular = schema.regular();
		if let Some(leaf) = Leaf::of_regular(regular) {
			return SkipNode::Leaf(leaf);
		}
		match regular {
			RegularType::Array(array) => {
				SkipNode::Array(Box::new(self.compile(schema.at(array.items))))
			}
			RegularType::Map(map) => SkipNode::Map(Box::new(self.compile(schema.at(map.values)))),
			RegularType::Union(union) => SkipNode::Union(
				union
					.variants
					.iter()
					.map(|&variant| self.compile(schema.at(variant)))
					.collect(),
			),
			RegularType::Record(record) => {
				let key = schema.regular_key();
				if let Some(&idx) = self.memo.get(&key) {
					return SkipNode::Record(idx);
				}
				let idx = self.records.len();
				self.records.push(Vec::new());
				self.memo.insert(key, idx);
				let fields = record
					.fields
					.iter()
					.map(|field| self.compile(schema.at(field.type_)))
					.collect();
				self.records[idx] = fields;
				SkipNode::Record(idx)
			}
			// Enum symbols are written as their index
			_ => SkipNode::Leaf(Leaf::Int),
		}
	}
}
