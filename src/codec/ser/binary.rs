use super::*;

use {integer_encoding::VarIntWriter, std::io::Write};

/// Implements [`Encoder`] for the Avro binary encoding, writing to any
/// `impl Write` (typically a `Vec<u8>`)
pub struct BinaryEncoder<W> {
	writer: W,
}

impl<W: Write> BinaryEncoder<W> {
	#[allow(missing_docs)]
	pub fn new(writer: W) -> Self {
		Self { writer }
	}

	/// Consume the `BinaryEncoder` and return the inner writer
	pub fn into_inner(self) -> W {
		self.writer
	}

	fn write_block_len(&mut self, len: usize) -> Result<(), SerError> {
		let len: i64 = len
			.try_into()
			.map_err(|_| SerError::new("Array or map len overflows i64"))?;
		self.writer.write_varint(len).map_err(SerError::io)?;
		Ok(())
	}

	/// Write all the items in a single block, followed by the zero-sized
	/// block that ends the sequence
	fn write_block<I, F>(&mut self, items: I, mut write_item: F) -> Result<(), SerError>
	where
		I: ExactSizeIterator,
		F: FnMut(&mut Self, I::Item) -> Result<(), SerError>,
	{
		if items.len() > 0 {
			self.write_block_len(items.len())?;
			for item in items {
				write_item(self, item)?;
			}
		}
		self.write_block_len(0)
	}
}

impl<W: Write> Encoder for BinaryEncoder<W> {
	fn write_boolean(&mut self, value: bool) -> Result<(), SerError> {
		self.writer.write_all(&[value as u8]).map_err(SerError::io)
	}

	fn write_int(&mut self, value: i32) -> Result<(), SerError> {
		self.writer.write_varint(value).map_err(SerError::io)?;
		Ok(())
	}

	fn write_long(&mut self, value: i64) -> Result<(), SerError> {
		self.writer.write_varint(value).map_err(SerError::io)?;
		Ok(())
	}

	fn write_float(&mut self, value: f32) -> Result<(), SerError> {
		self.writer
			.write_all(&value.to_le_bytes())
			.map_err(SerError::io)
	}

	fn write_double(&mut self, value: f64) -> Result<(), SerError> {
		self.writer
			.write_all(&value.to_le_bytes())
			.map_err(SerError::io)
	}

	fn write_bytes(&mut self, value: &[u8]) -> Result<(), SerError> {
		self.write_block_len(value.len())?;
		self.writer.write_all(value).map_err(SerError::io)
	}

	fn write_string(&mut self, value: &str) -> Result<(), SerError> {
		self.write_bytes(value.as_bytes())
	}

	fn write_fixed(&mut self, value: &[u8]) -> Result<(), SerError> {
		self.writer.write_all(value).map_err(SerError::io)
	}

	fn write_array<T, F>(&mut self, items: &[T], write_item: F) -> Result<(), SerError>
	where
		F: FnMut(&mut Self, &T) -> Result<(), SerError>,
	{
		self.write_block(items.iter(), write_item)
	}

	fn write_map<T, F>(
		&mut self,
		entries: &BTreeMap<String, T>,
		mut write_value: F,
	) -> Result<(), SerError>
	where
		F: FnMut(&mut Self, &T) -> Result<(), SerError>,
	{
		self.write_block(entries.iter(), |encoder, (key, value)| {
			encoder.write_string(key)?;
			write_value(encoder, value)
		})
	}
}
