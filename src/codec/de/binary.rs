use super::*;

use {
	integer_encoding::{VarInt, VarIntReader},
	std::{io::BufRead, num::NonZeroUsize},
};

/// Implements [`Decoder`] for the Avro binary encoding, reading from any
/// `impl BufRead` (including `&[u8]`)
pub struct BinaryDecoder<R> {
	reader: R,
	/// Maximum number of elements per sequence
	///
	/// This is a safeguard for malformed data
	///
	/// Default is 1 000 000 000.
	pub max_seq_size: usize,
	/// Maximum allocation size for a single field (string, bytes...)
	///
	/// This is a safeguard for malformed data
	///
	/// Default is 512 MB.
	pub max_alloc_size: usize,
}

impl<R: BufRead> BinaryDecoder<R> {
	/// Construct a `BinaryDecoder` from an `impl BufRead`
	///
	/// If you only have an `impl Read`, wrap it in a
	/// [`BufReader`](std::io::BufReader) first.
	pub fn new(reader: R) -> Self {
		Self {
			reader,
			max_seq_size: 1_000_000_000,
			max_alloc_size: 512 * 1024 * 1024,
		}
	}
}

impl<'a> BinaryDecoder<&'a [u8]> {
	/// Construct a `BinaryDecoder` reading from a slice
	pub fn from_slice(slice: &'a [u8]) -> Self {
		Self::new(slice)
	}
}

impl<R> BinaryDecoder<R> {
	/// Consume the `BinaryDecoder` and return the inner reader
	pub fn into_inner(self) -> R {
		self.reader
	}
}

impl<R: BufRead> BinaryDecoder<R> {
	fn read_varint<I>(&mut self) -> Result<I, DeError>
	where
		I: VarInt,
	{
		// Try to decode in one go from the buffer slice.
		// On buffer refill boundaries, that may fail, so we fall back to the
		// more general `read_varint` method that reads byte by byte (that's slightly
		// sub-optimal but also will trigger extremely rarely).
		match I::decode_var(self.reader.fill_buf().map_err(DeError::io)?) {
			None => VarIntReader::read_varint(&mut self.reader).map_err(|e| {
				match e.kind() {
					std::io::ErrorKind::UnexpectedEof => DeError::unexpected_eof(),
					_ => DeError::io(e),
				}
			}),
			Some((val, read)) => {
				self.reader.consume(read);
				Ok(val)
			}
		}
	}

	fn read_const_size_buf<const N: usize>(&mut self) -> Result<[u8; N], DeError> {
		let mut buf = [0u8; N];
		self.read_exact(&mut buf)?;
		Ok(buf)
	}

	fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DeError> {
		std::io::Read::read_exact(&mut self.reader, buf).map_err(|e| match e.kind() {
			std::io::ErrorKind::UnexpectedEof => DeError::unexpected_eof(),
			_ => DeError::io(e),
		})
	}

	fn read_len(&mut self) -> Result<usize, DeError> {
		self.read_varint::<i64>()?
			.try_into()
			.map_err(|e| DeError::custom(format_args!("Invalid buffer length in stream: {e}")))
	}

	fn read_buf(&mut self, len: usize) -> Result<Vec<u8>, DeError> {
		if len > self.max_alloc_size {
			return Err(DeError::custom(format_args!(
				"Allocation size that would be required ({len}) is larger than \
					allowed for this decoder ({}) - \
					this is probably due to malformed data",
				self.max_alloc_size
			)));
		}
		let mut buf = vec![0; len];
		self.read_exact(&mut buf)?;
		Ok(buf)
	}

	/// Number of items in the next block, and its size in bytes if the
	/// writer provided it
	///
	/// `None` means this was the last block.
	fn read_block_header(&mut self) -> Result<Option<(NonZeroUsize, Option<usize>)>, DeError> {
		let len: i64 = self.read_varint()?;
		let (n_items, byte_size) = if len < 0 {
			// -len, properly handling i64::MIN
			let n_items = u64::from_ne_bytes(len.to_ne_bytes()).wrapping_neg();
			(n_items, Some(self.read_len()?))
		} else {
			(len as u64, None)
		};
		let n_items: usize = n_items
			.try_into()
			.map_err(|e| DeError::custom(format_args!("Invalid array length in stream: {e}")))?;
		Ok(NonZeroUsize::new(n_items).map(|n_items| (n_items, byte_size)))
	}

	fn blocks<F>(&mut self, skip: bool, mut on_item: F) -> Result<(), DeError>
	where
		F: FnMut(&mut Self) -> Result<(), DeError>,
	{
		let mut n_read: usize = 0;
		while let Some((n_items, byte_size)) = self.read_block_header()? {
			n_read = n_read.saturating_add(n_items.get());
			if n_read > self.max_seq_size {
				return Err(DeError::new("Exceeding max sequence size while deserializing"));
			}
			match byte_size {
				Some(byte_size) if skip => self.skip_fixed(byte_size)?,
				_ => {
					for _ in 0..n_items.get() {
						on_item(self)?;
					}
				}
			}
		}
		Ok(())
	}
}

impl<R: BufRead> Decoder for BinaryDecoder<R> {
	fn read_boolean(&mut self) -> Result<bool, DeError> {
		match self.read_const_size_buf::<1>()? {
			[0] => Ok(false),
			[1] => Ok(true),
			[other] => Err(DeError::custom(format_args!(
				"Invalid byte value when deserializing boolean: {other:?}"
			))),
		}
	}

	fn read_int(&mut self) -> Result<i32, DeError> {
		self.read_varint()
	}

	fn read_long(&mut self) -> Result<i64, DeError> {
		self.read_varint()
	}

	fn read_float(&mut self) -> Result<f32, DeError> {
		Ok(f32::from_le_bytes(self.read_const_size_buf()?))
	}

	fn read_double(&mut self) -> Result<f64, DeError> {
		Ok(f64::from_le_bytes(self.read_const_size_buf()?))
	}

	fn read_bytes(&mut self) -> Result<Vec<u8>, DeError> {
		let len = self.read_len()?;
		self.read_buf(len)
	}

	fn read_string(&mut self) -> Result<String, DeError> {
		String::from_utf8(self.read_bytes()?)
			.map_err(|e| DeError::custom(format_args!("String is not valid utf-8: {e}")))
	}

	fn read_fixed(&mut self, size: usize) -> Result<Vec<u8>, DeError> {
		self.read_buf(size)
	}

	fn read_array<F>(&mut self, read_item: F) -> Result<(), DeError>
	where
		F: FnMut(&mut Self) -> Result<(), DeError>,
	{
		self.blocks(false, read_item)
	}

	fn read_map<F>(&mut self, mut read_value: F) -> Result<(), DeError>
	where
		F: FnMut(&mut Self, String) -> Result<(), DeError>,
	{
		self.blocks(false, |decoder| {
			let key = decoder.read_string()?;
			read_value(decoder, key)
		})
	}

	fn skip_bytes(&mut self) -> Result<(), DeError> {
		let len = self.read_len()?;
		self.skip_fixed(len)
	}

	fn skip_fixed(&mut self, size: usize) -> Result<(), DeError> {
		let mut remaining = size;
		while remaining > 0 {
			let available = self.reader.fill_buf().map_err(DeError::io)?.len();
			if available == 0 {
				return Err(DeError::unexpected_eof());
			}
			let consumed = available.min(remaining);
			self.reader.consume(consumed);
			remaining -= consumed;
		}
		Ok(())
	}

	fn skip_array<F>(&mut self, skip_item: F) -> Result<(), DeError>
	where
		F: FnMut(&mut Self) -> Result<(), DeError>,
	{
		self.blocks(true, skip_item)
	}

	fn skip_map<F>(&mut self, mut skip_value: F) -> Result<(), DeError>
	where
		F: FnMut(&mut Self) -> Result<(), DeError>,
	{
		self.blocks(true, |decoder| {
			decoder.skip_string()?;
			skip_value(decoder)
		})
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq};

	#[test]
	fn primitives() {
		let mut decoder = BinaryDecoder::from_slice(&[
			1, // true
			0x96, 0x01, // 75 (zigzag)
			6, b'f', b'o', b'o', // "foo"
			0, 0, 0x80, 0x3f, // 1.0f32
		]);
		assert_eq!(decoder.read_boolean().unwrap(), true);
		assert_eq!(decoder.read_long().unwrap(), 75);
		assert_eq!(decoder.read_string().unwrap(), "foo");
		assert_eq!(decoder.read_float().unwrap(), 1.0);
		assert_eq!(decoder.read_int().unwrap_err().kind(), DeErrorKind::Io);
	}

	#[test]
	fn blocks_with_byte_size_are_skipped_in_bulk() {
		// Two blocks: one of -4 items (4 bytes), one of 1 item, then the end
		let data: &[u8] = &[7, 8, 2, 4, 6, 8, 2, 10, 0, 42];
		let mut decoder = BinaryDecoder::from_slice(data);
		let mut items = Vec::new();
		decoder
			.read_array(|decoder| {
				items.push(decoder.read_long()?);
				Ok(())
			})
			.unwrap();
		assert_eq!(items, [1, 2, 3, 4, 5]);
		assert_eq!(decoder.read_long().unwrap(), 21);

		let mut decoder = BinaryDecoder::from_slice(data);
		let mut n_skipped_individually = 0;
		decoder
			.skip_array(|decoder| {
				n_skipped_individually += 1;
				decoder.skip_long()
			})
			.unwrap();
		assert_eq!(n_skipped_individually, 1);
		assert_eq!(decoder.read_long().unwrap(), 21);
	}

	#[test]
	fn max_alloc_size() {
		let mut decoder = BinaryDecoder::from_slice(&[0x80, 0x01]);
		decoder.max_alloc_size = 10;
		assert_eq!(decoder.read_bytes().unwrap_err().kind(), DeErrorKind::Malformed);
	}
}
