use super::{ReadPlan, ResolveError, Resolver, ResolverConfig, SkipPlan, WritePlan};

use crate::{
	schema::{JsonForm, Rabin, Schema, SchemaError},
	value::ValueType,
};

use {
	parking_lot::RwLock,
	std::{collections::HashMap, sync::Arc},
};

/// Compiles each plan once, and hands out the same plan for further requests
/// with the same schemas and value type
///
/// Schemas are identified by the Rabin fingerprint of their
/// [full JSON rendering](JsonForm::Full). (The canonical form can't be used
/// there: it drops logical types and aliases, which resolution depends on.)
///
/// This may be shared across threads.
#[derive(Default)]
pub struct PlanCache {
	resolver: Resolver,
	read_plans: RwLock<HashMap<(i64, i64, ValueType), Arc<(ReadPlan, SkipPlan)>>>,
	write_plans: RwLock<HashMap<(i64, i64, ValueType), Arc<WritePlan>>>,
}

impl PlanCache {
	/// Plans are compiled with the given configuration
	pub fn new(config: ResolverConfig) -> Self {
		Self {
			resolver: Resolver::new(config),
			read_plans: Default::default(),
			write_plans: Default::default(),
		}
	}

	/// See [`Resolver::resolve_reader`]
	///
	/// Compilation errors are not cached.
	pub fn read_plan(
		&self,
		reader: &Schema,
		writer: &Schema,
		target: &ValueType,
	) -> Result<Arc<(ReadPlan, SkipPlan)>, ResolveError> {
		let key = (full_fingerprint(reader)?, full_fingerprint(writer)?, target.clone());
		if let Some(plans) = self.read_plans.read().get(&key) {
			tracing::trace!(reader = key.0, writer = key.1, "Read plan cache hit");
			return Ok(plans.clone());
		}
		tracing::trace!(reader = key.0, writer = key.1, "Read plan cache miss");
		let plans = Arc::new(self.resolver.resolve_reader(reader, writer, target)?);
		// Another thread may have compiled the same plan in the meantime, in
		// which case we keep theirs
		Ok(self.read_plans.write().entry(key).or_insert(plans).clone())
	}

	/// See [`Resolver::resolve_writer`]
	///
	/// Compilation errors are not cached.
	pub fn write_plan(
		&self,
		source: &Schema,
		target: &Schema,
		source_type: &ValueType,
	) -> Result<Arc<WritePlan>, ResolveError> {
		let key = (full_fingerprint(source)?, full_fingerprint(target)?, source_type.clone());
		if let Some(plan) = self.write_plans.read().get(&key) {
			tracing::trace!(source = key.0, target = key.1, "Write plan cache hit");
			return Ok(plan.clone());
		}
		tracing::trace!(source = key.0, target = key.1, "Write plan cache miss");
		let plan = Arc::new(self.resolver.resolve_writer(source, target, source_type)?);
		Ok(self.write_plans.write().entry(key).or_insert(plan).clone())
	}

	/// Number of plans currently cached (read plans and write plans)
	pub fn len(&self) -> usize {
		self.read_plans.read().len() + self.write_plans.read().len()
	}

	#[allow(missing_docs)]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drop all the cached plans
	pub fn clear(&self) {
		self.read_plans.write().clear();
		self.write_plans.write().clear();
	}
}

impl std::fmt::Debug for PlanCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PlanCache")
			.field("config", &self.resolver.config)
			.field("read_plans", &self.read_plans.read().len())
			.field("write_plans", &self.write_plans.read().len())
			.finish()
	}
}

fn full_fingerprint(schema: &Schema) -> Result<i64, SchemaError> {
	let mut rabin = Rabin::default();
	rabin.write(schema.to_json(JsonForm::Full)?.as_bytes());
	Ok(rabin.finish())
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq};

	#[test]
	fn compiles_once() {
		let cache = PlanCache::default();
		let reader: Schema = r#"["null", "long"]"#.parse().unwrap();
		let writer: Schema = r#""int""#.parse().unwrap();
		let target = ValueType::Nullable(Box::new(ValueType::Long));
		let first = cache.read_plan(&reader, &writer, &target).unwrap();
		let second = cache.read_plan(&reader, &writer, &target).unwrap();
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(cache.len(), 1);

		// A different value type is a different plan
		assert!(cache
			.read_plan(&reader, &writer, &ValueType::Long)
			.is_err());
		assert_eq!(cache.len(), 1);

		let write = cache.write_plan(&writer, &reader, &ValueType::Int).unwrap();
		assert!(Arc::ptr_eq(
			&write,
			&cache.write_plan(&writer, &reader, &ValueType::Int).unwrap()
		));
		assert_eq!(cache.len(), 2);
		cache.clear();
		assert!(cache.is_empty());
	}

	#[test]
	fn logical_types_are_part_of_the_key() {
		let cache = PlanCache::default();
		let plain: Schema = r#""long""#.parse().unwrap();
		let timestamp: Schema = r#"{"type": "long", "logicalType": "timestamp-millis"}"#
			.parse()
			.unwrap();
		assert_eq!(plain.fingerprint().unwrap(), timestamp.fingerprint().unwrap());
		cache
			.read_plan(&plain, &plain, &ValueType::Long)
			.unwrap();
		// Would be a cache hit, giving a plan for the wrong reader, if keyed
		// by canonical form
		cache
			.read_plan(&timestamp, &plain, &ValueType::TimestampMillis)
			.unwrap();
		assert!(cache
			.read_plan(&timestamp, &plain, &ValueType::Long)
			.is_ok());
		assert_eq!(cache.len(), 3);
	}
}
