/// Implementation of the Rabin fingerprint algorithm (CRC-64-AVRO) as
/// described in [schema_fingerprints](https://avro.apache.org/docs/current/specification/#schema_fingerprints).
///
/// This is fed the bytes of a schema's parsing canonical form (it implements
/// [`std::fmt::Write`] so that the canonical form can be streamed into it
/// without ever being allocated).
#[derive(Clone)]
pub struct Rabin {
	result: u64,
}

impl Default for Rabin {
	fn default() -> Self {
		Rabin { result: EMPTY64 }
	}
}

impl Rabin {
	/// Feed more bytes to the fingerprint
	pub fn write(&mut self, data: &[u8]) {
		let table = fp_table();
		for &b in data {
			// Logical (unsigned) shift
			self.result = (self.result >> 8) ^ table[((self.result ^ b as u64) & 0xFF) as usize];
		}
	}

	/// The fingerprint as a signed 64-bit integer
	pub fn finish(&self) -> i64 {
		self.result as i64
	}

	/// The fingerprint as its 8-byte little-endian encoding
	///
	/// This is what is used for avro [single object encoding](https://avro.apache.org/docs/current/specification/#single-object-encoding)
	pub fn finish_bytes(&self) -> [u8; 8] {
		self.result.to_le_bytes()
	}
}

impl std::fmt::Write for Rabin {
	fn write_str(&mut self, s: &str) -> std::fmt::Result {
		self.write(s.as_bytes());
		Ok(())
	}
}

/// `-4513414715797952619` as a signed integer
const EMPTY64: u64 = 0xc15d213aa4d7a795;

fn fp_table() -> &'static [u64; 256] {
	static FP_TABLE: std::sync::OnceLock<[u64; 256]> = std::sync::OnceLock::new();
	FP_TABLE.get_or_init(|| {
		let mut fp_table: [u64; 256] = [0; 256];
		for (i, entry) in fp_table.iter_mut().enumerate() {
			let mut fp = i as u64;
			for _ in 0..8 {
				fp = (fp >> 1) ^ (EMPTY64 & (fp & 1).wrapping_neg());
			}
			*entry = fp;
		}
		fp_table
	})
}

#[cfg(test)]
mod tests {
	use {super::Rabin, pretty_assertions::assert_eq};

	#[test]
	fn known_fingerprints() {
		let data: &[(&str, i64)] = &[
			(r#""null""#, 7195948357588979594),
			(r#""boolean""#, -6970731678124411036),
			(
				r#"{"name":"foo","type":"fixed","size":15}"#,
				1756455273707447556,
			),
			(
				r#"{"name":"PigValue","type":"record","fields":[{"name":"value","type":["null","int","long","PigValue"]}]}"#,
				-1759257747318642341,
			),
			("hello world", 2906301498937520992),
		];

		for &(s, fp) in data {
			let mut hasher = Rabin::default();
			hasher.write(s.as_bytes());
			assert_eq!(hasher.finish(), fp, "{s}");
			assert_eq!(i64::from_le_bytes(hasher.finish_bytes()), fp);
		}
	}

	#[test]
	fn empty_constant() {
		assert_eq!(Rabin::default().finish(), -4513414715797952619);
	}
}
