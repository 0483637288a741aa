//! The byte-level writing capability that write plans run against
//!
//! This mirrors [`Decoder`](super::de::Decoder): plans only ever talk to the
//! [`Encoder`] trait, and [`BinaryEncoder`] implements the standard Avro
//! binary encoding.

mod binary;
mod decimal;
mod error;

pub use {
	binary::BinaryEncoder,
	error::{SerError, SerErrorKind},
};

pub(crate) use decimal::decimal_to_be_bytes;

use crate::value::Duration;

use {serde::ser::Error as _, std::collections::BTreeMap};

/// Writes one value of each Avro primitive or logical kind
pub trait Encoder {
	#[allow(missing_docs)]
	fn write_boolean(&mut self, value: bool) -> Result<(), SerError>;
	#[allow(missing_docs)]
	fn write_int(&mut self, value: i32) -> Result<(), SerError>;
	#[allow(missing_docs)]
	fn write_long(&mut self, value: i64) -> Result<(), SerError>;
	#[allow(missing_docs)]
	fn write_float(&mut self, value: f32) -> Result<(), SerError>;
	#[allow(missing_docs)]
	fn write_double(&mut self, value: f64) -> Result<(), SerError>;
	#[allow(missing_docs)]
	fn write_bytes(&mut self, value: &[u8]) -> Result<(), SerError>;
	#[allow(missing_docs)]
	fn write_string(&mut self, value: &str) -> Result<(), SerError>;
	/// Write the bytes as-is (the size is known from the schema)
	fn write_fixed(&mut self, value: &[u8]) -> Result<(), SerError>;
	/// Write an array, calling `write_item` once per item
	fn write_array<T, F>(&mut self, items: &[T], write_item: F) -> Result<(), SerError>
	where
		F: FnMut(&mut Self, &T) -> Result<(), SerError>,
		Self: Sized;
	/// Write a map, calling `write_value` once per entry (keys are written
	/// by the encoder)
	fn write_map<T, F>(
		&mut self,
		entries: &BTreeMap<String, T>,
		write_value: F,
	) -> Result<(), SerError>
	where
		F: FnMut(&mut Self, &T) -> Result<(), SerError>,
		Self: Sized;

	/// `null` is written as zero bytes
	fn write_null(&mut self) -> Result<(), SerError> {
		Ok(())
	}

	/// Write the index of the variant of a union
	fn write_union_index(&mut self, index: usize) -> Result<(), SerError> {
		let index: i64 = index
			.try_into()
			.map_err(|_| SerError::new("Union index overflows i64"))?;
		self.write_long(index)
	}

	/// Write a two-variant union where the variant at `null_index` is `null`
	fn write_nullable<T, F>(
		&mut self,
		null_index: usize,
		value: Option<&T>,
		write_value: F,
	) -> Result<(), SerError>
	where
		T: ?Sized,
		F: FnOnce(&mut Self, &T) -> Result<(), SerError>,
		Self: Sized,
	{
		match value {
			None => self.write_union_index(null_index),
			Some(value) => {
				self.write_union_index(usize::from(null_index == 0))?;
				write_value(self, value)
			}
		}
	}

	/// `uuid` annotates either a `string` or a 16-byte `fixed`
	fn write_uuid(&mut self, value: &uuid::Uuid, fixed: bool) -> Result<(), SerError> {
		match fixed {
			true => self.write_fixed(value.as_bytes()),
			false => {
				self.write_string(value.hyphenated().encode_lower(&mut uuid::Uuid::encode_buffer()))
			}
		}
	}
	#[allow(missing_docs)]
	fn write_date(&mut self, value: i32) -> Result<(), SerError> {
		self.write_int(value)
	}
	#[allow(missing_docs)]
	fn write_time_millis(&mut self, value: i32) -> Result<(), SerError> {
		self.write_int(value)
	}
	#[allow(missing_docs)]
	fn write_time_micros(&mut self, value: i64) -> Result<(), SerError> {
		self.write_long(value)
	}
	#[allow(missing_docs)]
	fn write_time_nanos(&mut self, value: i64) -> Result<(), SerError> {
		self.write_long(value)
	}
	#[allow(missing_docs)]
	fn write_timestamp_millis(&mut self, value: i64) -> Result<(), SerError> {
		self.write_long(value)
	}
	#[allow(missing_docs)]
	fn write_timestamp_micros(&mut self, value: i64) -> Result<(), SerError> {
		self.write_long(value)
	}
	#[allow(missing_docs)]
	fn write_timestamp_nanos(&mut self, value: i64) -> Result<(), SerError> {
		self.write_long(value)
	}
	/// `duration` annotates a 12-byte `fixed`
	fn write_duration(&mut self, value: Duration) -> Result<(), SerError> {
		self.write_fixed(&value.to_le_bytes())
	}
	/// `decimal` annotates either `bytes` (`size` is `None`) or a `fixed` of
	/// the given size
	///
	/// The value is rescaled to `scale` first, which fails if the rescaled
	/// mantissa does not fit in 96 bits.
	fn write_decimal(
		&mut self,
		value: rust_decimal::Decimal,
		scale: u32,
		size: Option<usize>,
	) -> Result<(), SerError> {
		let bytes = decimal_to_be_bytes(value, scale, size)?;
		match size {
			None => self.write_bytes(&bytes),
			Some(size) => match bytes.len() == size {
				true => self.write_fixed(&bytes),
				false => Err(SerError::custom(format_args!(
					"Decimal was encoded as {} bytes but fixed size is {size}",
					bytes.len()
				))),
			},
		}
	}
}
