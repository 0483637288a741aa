//! Pick which variant of a union a given schema corresponds to
//!
//! This is used whenever resolution needs to map a single schema onto one of
//! the variants of a union: a writer variant onto the reader's union when
//! decoding, a value's schema onto the target union when encoding.

use crate::schema::{LogicalType, RegularType, SchemaRef};

/// Find the variant of `pool` that `candidate` is best represented as
///
/// Numeric types may be promoted (`int` to `long`, `float` or `double`,
/// `long` to `float` or `double`, `float` to `double`), `string` and `bytes`
/// may stand for each other, and `time-*`/`timestamp-*` logical types may be
/// widened to a more precise unit. Each of these has an order of preference
/// (e.g. an `int` candidate prefers `int`, then `long`, `float` and
/// `double`), and the most preferred variant wins. Ties go to the first one
/// in the pool.
///
/// Any other schema only matches a variant of the same kind: named types
/// match by full name (or alias, in either direction), everything else by
/// [structural equality](SchemaRef::structurally_eq).
///
/// Returns the index of the variant in the pool, along with the variant.
pub fn find_match<'a>(
	candidate: SchemaRef<'_>,
	pool: impl IntoIterator<Item = SchemaRef<'a>>,
) -> Option<(usize, SchemaRef<'a>)> {
	match PromotableKind::of(candidate) {
		Some(kind) => {
			let preferences = kind.preferences();
			pool.into_iter()
				.enumerate()
				.filter_map(|(idx, variant)| {
					let variant_kind = PromotableKind::of(variant)?;
					let priority = preferences.iter().position(|&k| k == variant_kind)?;
					Some((priority, idx, variant))
				})
				.min_by_key(|&(priority, idx, _)| (priority, idx))
				.map(|(_, idx, variant)| (idx, variant))
		}
		None => pool
			.into_iter()
			.enumerate()
			.find(|&(_, variant)| matches_exactly(candidate, variant)),
	}
}

fn matches_exactly(a: SchemaRef<'_>, b: SchemaRef<'_>) -> bool {
	if a.logical_type().is_some() || b.logical_type().is_some() {
		return a.structurally_eq(b);
	}
	match (a.regular(), b.regular()) {
		(RegularType::Record(_), RegularType::Record(_))
		| (RegularType::Enum(_), RegularType::Enum(_)) => a.matches_name(b) || b.matches_name(a),
		(RegularType::Fixed(fixed_a), RegularType::Fixed(fixed_b)) => {
			fixed_a.size == fixed_b.size && (a.matches_name(b) || b.matches_name(a))
		}
		_ => a.structurally_eq(b),
	}
}

/// Kinds that may be represented as another kind
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PromotableKind {
	Int,
	Long,
	Float,
	Double,
	Bytes,
	String,
	TimeMillis,
	TimeMicros,
	TimeNanos,
	TimestampMillis,
	TimestampMicros,
	TimestampNanos,
}

impl PromotableKind {
	fn of(schema: SchemaRef<'_>) -> Option<Self> {
		match schema.logical_type() {
			Some(LogicalType::TimeMillis) => Some(Self::TimeMillis),
			Some(LogicalType::TimeMicros) => Some(Self::TimeMicros),
			Some(LogicalType::TimeNanos) => Some(Self::TimeNanos),
			Some(LogicalType::TimestampMillis) => Some(Self::TimestampMillis),
			Some(LogicalType::TimestampMicros) => Some(Self::TimestampMicros),
			Some(LogicalType::TimestampNanos) => Some(Self::TimestampNanos),
			Some(_) => None,
			None => match schema.regular() {
				RegularType::Int => Some(Self::Int),
				RegularType::Long => Some(Self::Long),
				RegularType::Float => Some(Self::Float),
				RegularType::Double => Some(Self::Double),
				RegularType::Bytes => Some(Self::Bytes),
				RegularType::String => Some(Self::String),
				_ => None,
			},
		}
	}

	/// What this kind may be represented as, most preferred first
	fn preferences(self) -> &'static [Self] {
		use PromotableKind::*;
		match self {
			Int => &[Int, Long, Float, Double],
			Long => &[Long, Float, Double],
			Float => &[Double, Float],
			Double => &[Double],
			Bytes => &[Bytes, String],
			String => &[String, Bytes],
			TimeMillis => &[TimeMillis, TimeMicros, TimeNanos],
			TimeMicros => &[TimeMicros, TimeNanos],
			TimeNanos => &[TimeNanos],
			TimestampMillis => &[TimestampMillis, TimestampMicros, TimestampNanos],
			TimestampMicros => &[TimestampMicros, TimestampNanos],
			TimestampNanos => &[TimestampNanos],
		}
	}
}

#[cfg(test)]
mod tests {
	use {super::*, crate::schema::Schema, pretty_assertions::assert_eq};

	/// Index of the match of the first type among the others
	///
	/// (The types are laid out as the fields of a record so that they don't
	/// need to form a valid union)
	fn match_idx(types: &[&str]) -> Option<usize> {
		let fields: Vec<String> = types
			.iter()
			.enumerate()
			.map(|(i, type_)| format!(r#"{{"name": "f{i}", "type": {type_}}}"#))
			.collect();
		let schema: Schema = format!(
			r#"{{"type": "record", "name": "R", "fields": [{}]}}"#,
			fields.join(", ")
		)
		.parse()
		.unwrap();
		let RegularType::Record(ref record) = *schema.root().regular() else {
			panic!("Expected record")
		};
		let mut types = record.fields.iter().map(|f| schema.root().at(f.type_));
		let candidate = types.next().unwrap();
		find_match(candidate, types).map(|(idx, _)| idx)
	}

	#[test]
	fn numeric_promotions() {
		assert_eq!(match_idx(&[r#""int""#, r#""string""#, r#""double""#, r#""long""#]), Some(2));
		assert_eq!(match_idx(&[r#""int""#, r#""double""#, r#""float""#]), Some(1));
		assert_eq!(match_idx(&[r#""long""#, r#""int""#, r#""float""#]), Some(1));
		assert_eq!(match_idx(&[r#""long""#, r#""int""#]), None);
		// float prefers double over float
		assert_eq!(match_idx(&[r#""float""#, r#""float""#, r#""double""#]), Some(1));
		assert_eq!(match_idx(&[r#""double""#, r#""float""#]), None);
		// Ties go to the first one
		assert_eq!(match_idx(&[r#""int""#, r#""long""#, r#""long""#]), Some(0));
	}

	#[test]
	fn string_and_bytes() {
		assert_eq!(match_idx(&[r#""string""#, r#""bytes""#, r#""string""#]), Some(1));
		assert_eq!(match_idx(&[r#""bytes""#, r#""string""#]), Some(0));
		assert_eq!(match_idx(&[r#""bytes""#, r#""int""#]), None);
	}

	#[test]
	fn time_units() {
		assert_eq!(
			match_idx(&[
				r#"{"type": "int", "logicalType": "time-millis"}"#,
				r#""long""#,
				r#"{"type": "long", "logicalType": "time-nanos"}"#,
				r#"{"type": "long", "logicalType": "time-micros"}"#,
			]),
			Some(2)
		);
		assert_eq!(
			match_idx(&[
				r#"{"type": "long", "logicalType": "timestamp-micros"}"#,
				r#"{"type": "long", "logicalType": "timestamp-millis"}"#,
			]),
			None
		);
	}

	#[test]
	fn named_types() {
		assert_eq!(
			match_idx(&[
				r#"{"type": "fixed", "name": "a.F", "size": 4}"#,
				r#"{"type": "fixed", "name": "b.F", "size": 4}"#,
				r#"{"type": "fixed", "name": "c.F", "size": 4, "aliases": ["a.F"]}"#,
			]),
			Some(1)
		);
		assert_eq!(
			match_idx(&[
				r#"{"type": "array", "items": {"type": "enum", "name": "E", "symbols": ["A"]}}"#,
				r#""E""#,
				r#"{"type": "map", "values": "E"}"#,
				r#"{"type": "array", "items": "E"}"#,
			]),
			Some(2)
		);
		assert_eq!(
			match_idx(&[
				r#"{"type": "bytes", "logicalType": "decimal", "precision": 4, "scale": 2}"#,
				r#"{"type": "bytes", "logicalType": "decimal", "precision": 4}"#,
				r#""bytes""#,
			]),
			None
		);
	}
}
