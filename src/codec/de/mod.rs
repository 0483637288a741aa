//! The byte-level reading capability that read and skip plans run against
//!
//! Plans only ever talk to the [`Decoder`] trait, so any encoding that can
//! provide these operations may be plugged in. [`BinaryDecoder`] implements
//! the standard Avro binary encoding.

mod binary;
mod decimal;
mod error;

pub use {
	binary::BinaryDecoder,
	error::{DeError, DeErrorKind},
};

pub(crate) use decimal::decimal_from_be_bytes;

use crate::value::Duration;

use serde::de::Error as _;

/// Reads one value of each Avro primitive or logical kind
///
/// Operations that only depend on other operations (logical types, unions,
/// skipping fixed-size values...) are provided.
pub trait Decoder {
	#[allow(missing_docs)]
	fn read_boolean(&mut self) -> Result<bool, DeError>;
	#[allow(missing_docs)]
	fn read_int(&mut self) -> Result<i32, DeError>;
	#[allow(missing_docs)]
	fn read_long(&mut self) -> Result<i64, DeError>;
	#[allow(missing_docs)]
	fn read_float(&mut self) -> Result<f32, DeError>;
	#[allow(missing_docs)]
	fn read_double(&mut self) -> Result<f64, DeError>;
	#[allow(missing_docs)]
	fn read_bytes(&mut self) -> Result<Vec<u8>, DeError>;
	#[allow(missing_docs)]
	fn read_string(&mut self) -> Result<String, DeError>;
	/// Read exactly `size` bytes
	fn read_fixed(&mut self, size: usize) -> Result<Vec<u8>, DeError>;
	/// Read an array, calling `read_item` once per item
	fn read_array<F>(&mut self, read_item: F) -> Result<(), DeError>
	where
		F: FnMut(&mut Self) -> Result<(), DeError>,
		Self: Sized;
	/// Read a map, calling `read_value` once per entry with the entry's key
	/// (`read_value` is expected to read the value)
	fn read_map<F>(&mut self, read_value: F) -> Result<(), DeError>
	where
		F: FnMut(&mut Self, String) -> Result<(), DeError>,
		Self: Sized;

	#[allow(missing_docs)]
	fn skip_bytes(&mut self) -> Result<(), DeError>;
	#[allow(missing_docs)]
	fn skip_string(&mut self) -> Result<(), DeError> {
		self.skip_bytes()
	}
	#[allow(missing_docs)]
	fn skip_fixed(&mut self, size: usize) -> Result<(), DeError>;
	/// Skip an array, calling `skip_item` for items that can't be skipped
	/// in bulk
	fn skip_array<F>(&mut self, skip_item: F) -> Result<(), DeError>
	where
		F: FnMut(&mut Self) -> Result<(), DeError>,
		Self: Sized;
	/// Skip a map, calling `skip_value` for values that can't be skipped in
	/// bulk (keys are skipped by the decoder)
	fn skip_map<F>(&mut self, skip_value: F) -> Result<(), DeError>
	where
		F: FnMut(&mut Self) -> Result<(), DeError>,
		Self: Sized;

	/// `null` is written as zero bytes
	fn read_null(&mut self) -> Result<(), DeError> {
		Ok(())
	}
	#[allow(missing_docs)]
	fn skip_null(&mut self) -> Result<(), DeError> {
		Ok(())
	}
	#[allow(missing_docs)]
	fn skip_boolean(&mut self) -> Result<(), DeError> {
		self.read_boolean().map(drop)
	}
	#[allow(missing_docs)]
	fn skip_int(&mut self) -> Result<(), DeError> {
		self.read_int().map(drop)
	}
	#[allow(missing_docs)]
	fn skip_long(&mut self) -> Result<(), DeError> {
		self.read_long().map(drop)
	}
	#[allow(missing_docs)]
	fn skip_float(&mut self) -> Result<(), DeError> {
		self.skip_fixed(4)
	}
	#[allow(missing_docs)]
	fn skip_double(&mut self) -> Result<(), DeError> {
		self.skip_fixed(8)
	}

	/// Read the index of the variant of a union that has `n_variants`
	/// variants
	fn read_union_index(&mut self, n_variants: usize) -> Result<usize, DeError> {
		let index = self.read_long()?;
		match usize::try_from(index) {
			Ok(idx) if idx < n_variants => Ok(idx),
			_ => Err(DeError::index_out_of_range("Union", index, n_variants)),
		}
	}

	/// Read a two-variant union where the variant at `null_index` is `null`
	fn read_nullable<T, F>(
		&mut self,
		null_index: usize,
		read_value: F,
	) -> Result<Option<T>, DeError>
	where
		F: FnOnce(&mut Self) -> Result<T, DeError>,
		Self: Sized,
	{
		match self.read_union_index(2)? {
			idx if idx == null_index => Ok(None),
			_ => read_value(self).map(Some),
		}
	}

	/// `uuid` annotates either a `string` or a 16-byte `fixed`
	fn read_uuid(&mut self, fixed: bool) -> Result<uuid::Uuid, DeError> {
		match fixed {
			true => uuid::Uuid::from_slice(&self.read_fixed(16)?)
				.map_err(|e| DeError::custom(format_args!("Invalid uuid: {e}"))),
			false => uuid::Uuid::parse_str(&self.read_string()?)
				.map_err(|e| DeError::custom(format_args!("Invalid uuid: {e}"))),
		}
	}
	#[allow(missing_docs)]
	fn read_date(&mut self) -> Result<i32, DeError> {
		self.read_int()
	}
	#[allow(missing_docs)]
	fn read_time_millis(&mut self) -> Result<i32, DeError> {
		self.read_int()
	}
	#[allow(missing_docs)]
	fn read_time_micros(&mut self) -> Result<i64, DeError> {
		self.read_long()
	}
	#[allow(missing_docs)]
	fn read_time_nanos(&mut self) -> Result<i64, DeError> {
		self.read_long()
	}
	#[allow(missing_docs)]
	fn read_timestamp_millis(&mut self) -> Result<i64, DeError> {
		self.read_long()
	}
	#[allow(missing_docs)]
	fn read_timestamp_micros(&mut self) -> Result<i64, DeError> {
		self.read_long()
	}
	#[allow(missing_docs)]
	fn read_timestamp_nanos(&mut self) -> Result<i64, DeError> {
		self.read_long()
	}
	/// `duration` annotates a 12-byte `fixed`
	fn read_duration(&mut self) -> Result<Duration, DeError> {
		let bytes: [u8; 12] = self
			.read_fixed(12)?
			.try_into()
			.map_err(|_| DeError::new("Duration should be 12 bytes"))?;
		Ok(Duration::from_le_bytes(bytes))
	}
	/// `decimal` annotates either `bytes` (`size` is `None`) or a `fixed` of
	/// the given size
	fn read_decimal(
		&mut self,
		scale: u32,
		size: Option<usize>,
	) -> Result<rust_decimal::Decimal, DeError> {
		let bytes = match size {
			None => self.read_bytes()?,
			Some(size) => self.read_fixed(size)?,
		};
		decimal_from_be_bytes(&bytes, scale)
	}
}
