//! Compile the [`WritePlan`] that writes values conforming to a source schema
//! as data of a target schema

use super::{
	leaf::{conversion_path, Leaf},
	plan::*,
	ResolveError, ResolverConfig,
};

use crate::{
	matcher::find_match,
	schema::{LogicalType, RegularType, Schema, SchemaKey, SchemaRef},
	value::{RecordType, ValueType},
};

use std::collections::HashMap;

pub(super) fn resolve_writer(
	source: &Schema,
	target: &Schema,
	source_type: &ValueType,
	config: &ResolverConfig,
) -> Result<WritePlan, ResolveError> {
	source.validate()?;
	target.validate()?;
	let source_root = source.at(SchemaKey::root())?;
	let target_root = target.at(SchemaKey::root())?;
	let mut compiler = WriteCompiler {
		value_records: source_type.record_types(),
		records: Vec::new(),
		memo: HashMap::new(),
	};
	let root = compiler.resolve(source_root, target_root, source_type)?;
	tracing::debug!(
		source = %source_root,
		target = %target_root,
		n_records = compiler.records.len(),
		"Compiled write plan"
	);
	Ok(WritePlan {
		root,
		records: compiler.records.into(),
		allowed_depth: config.allowed_depth,
	})
}

struct WriteCompiler<'t> {
	value_records: HashMap<&'t str, &'t RecordType>,
	records: Vec<RecordWriter>,
	memo: HashMap<(SchemaKey, SchemaKey, &'t str), usize>,
}

impl<'t> WriteCompiler<'t> {
	fn resolve(
		&mut self,
		source: SchemaRef<'_>,
		target: SchemaRef<'_>,
		value_type: &'t ValueType,
	) -> Result<WriteNode, ResolveError> {
		let incompatible = || ResolveError::incompatible(source, target, value_type);
		match value_type {
			ValueType::Nullable(inner_type) => {
				let (_, source_inner) = source.as_nullable().ok_or_else(incompatible)?;
				if let Some((null_index, target_inner)) = target.as_nullable() {
					return Ok(WriteNode::Nullable {
						null_index,
						inner: Box::new(self.resolve(source_inner, target_inner, inner_type)?),
					});
				}
				match target.union_variants() {
					Some(target_variants) => {
						let target_variants: Vec<SchemaRef<'_>> = target_variants.collect();
						let null_index = target_variants
							.iter()
							.position(|variant| variant.is_null())
							.ok_or_else(incompatible)?;
						let (branch, target_variant) =
							find_match(source_inner, target_variants.iter().copied())
								.ok_or_else(incompatible)?;
						Ok(WriteNode::NullOr {
							null_index,
							branch,
							inner: Box::new(self.resolve(
								source_inner,
								target_variant,
								inner_type,
							)?),
						})
					}
					None => Ok(WriteNode::NonNull(Box::new(self.resolve(
						source_inner,
						target,
						inner_type,
					)?))),
				}
			}
			ValueType::Union(variant_types) => {
				let source_variants: Vec<SchemaRef<'_>> = source
					.union_variants()
					.ok_or_else(incompatible)?
					.collect();
				if source_variants.len() != variant_types.len() {
					return Err(incompatible());
				}
				match target.union_variants() {
					Some(target_variants) => {
						let target_variants: Vec<SchemaRef<'_>> = target_variants.collect();
						let cases = source_variants
							.iter()
							.zip(variant_types)
							.map(|(&source_variant, variant_type)| {
								let (index, target_variant) =
									find_match(source_variant, target_variants.iter().copied())
										.ok_or_else(|| {
											ResolveError::incompatible(
												source_variant,
												target,
												variant_type,
											)
										})?;
								Ok::<_, ResolveError>((
									index,
									self.resolve(source_variant, target_variant, variant_type)?,
								))
							})
							.collect::<Result<_, ResolveError>>()?;
						Ok(WriteNode::Switch(cases))
					}
					None => {
						let (source_index, source_variant) =
							find_match(target, source_variants.iter().copied())
								.ok_or_else(incompatible)?;
						Ok(WriteNode::Flatten {
							source_index: source_index.try_into().map_err(|_| incompatible())?,
							inner: Box::new(self.resolve(
								source_variant,
								target,
								&variant_types[source_index],
							)?),
						})
					}
				}
			}
			_ => {
				if source.union_variants().is_some() {
					return Err(incompatible());
				}
				if let Some(target_variants) = target.union_variants() {
					let (index, target_variant) =
						find_match(source, target_variants).ok_or_else(incompatible)?;
					return Ok(WriteNode::Branch {
						index,
						inner: Box::new(self.resolve(source, target_variant, value_type)?),
					});
				}
				self.resolve_non_union(source, target, value_type)
					.ok_or_else(incompatible)?
			}
		}
	}

	/// `None` means incompatible
	fn resolve_non_union(
		&mut self,
		source: SchemaRef<'_>,
		target: SchemaRef<'_>,
		value_type: &'t ValueType,
	) -> Option<Result<WriteNode, ResolveError>> {
		Some(match (source.regular(), target.regular(), value_type) {
			(
				RegularType::Array(source_array),
				RegularType::Array(target_array),
				ValueType::Array(items),
			) => self
				.resolve(source.at(source_array.items), target.at(target_array.items), items)
				.map(|node| WriteNode::Array(Box::new(node))),
			(
				RegularType::Map(source_map),
				RegularType::Map(target_map),
				ValueType::Map(values),
			) => self
				.resolve(source.at(source_map.values), target.at(target_map.values), values)
				.map(|node| WriteNode::Map(Box::new(node))),
			(RegularType::Record(_), RegularType::Record(_), ValueType::Record(record_type)) => {
				self.record(source, target, record_type)?
			}
			(RegularType::Record(_), RegularType::Record(_), ValueType::RecordRef(name)) => {
				let record_type = *self.value_records.get(name.as_str())?;
				self.record(source, target, record_type)?
			}
			(RegularType::Enum(source_enum), RegularType::Enum(target_enum), ValueType::Enum) => {
				if source_enum.symbols != target_enum.symbols {
					return None;
				}
				Ok(WriteNode::Enum {
					symbols: target_enum.symbols.clone(),
				})
			}
			(RegularType::Fixed(_), RegularType::Fixed(_), _)
				if !source
					.at(source.regular_key())
					.structurally_eq(target.at(target.regular_key())) =>
			{
				return None
			}
			_ => {
				let is_decimal = |schema: SchemaRef<'_>| {
					matches!(schema.logical_type(), Some(LogicalType::Decimal(_)))
				};
				if (is_decimal(source) || is_decimal(target)) && !source.structurally_eq(target) {
					return None;
				}
				let value_leaf = Leaf::representing(source, value_type)?;
				let leaf = Leaf::natural(target)?;
				Ok(WriteNode::Leaf {
					conversions: conversion_path(value_leaf, leaf)?,
					leaf,
				})
			}
		})
	}

	/// Fields are written in target order, each from the source field of
	/// the same name
	///
	/// `None` if the records don't have the same name or fields.
	fn record(
		&mut self,
		source: SchemaRef<'_>,
		target: SchemaRef<'_>,
		value_type: &'t RecordType,
	) -> Option<Result<WriteNode, ResolveError>> {
		let (RegularType::Record(source_record), RegularType::Record(target_record)) =
			(source.regular(), target.regular())
		else {
			return None;
		};
		if !(target.matches_name(source) || source.matches_name(target))
			|| source_record.fields.len() != target_record.fields.len()
		{
			return None;
		}
		let memo_key = (source.regular_key(), target.regular_key(), value_type.name.as_str());
		if let Some(&idx) = self.memo.get(&memo_key) {
			return Some(Ok(WriteNode::Record(idx)));
		}

		// Check the shape before registering anything, so that there is
		// nothing to roll back
		let mut field_pairs = Vec::with_capacity(target_record.fields.len());
		for target_field in &target_record.fields {
			let source_field = source_record
				.fields
				.iter()
				.find(|f| f.name == target_field.name)?;
			let position = value_type.field_position(&source_field.name)?;
			field_pairs.push((source_field, target_field, position));
		}

		let idx = self.records.len();
		self.records.push(RecordWriter::placeholder());
		self.memo.insert(memo_key, idx);
		let fields = field_pairs
			.into_iter()
			.map(|(source_field, target_field, position)| {
				Ok::<_, ResolveError>((
					position,
					self.resolve(
						source.at(source_field.type_),
						target.at(target_field.type_),
						&value_type.fields[position].1,
					)?,
				))
			})
			.collect::<Result<Vec<_>, ResolveError>>();
		Some(fields.map(|fields| {
			self.records[idx] = RecordWriter { fields };
			WriteNode::Record(idx)
		}))
	}
}
