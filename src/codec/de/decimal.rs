use super::*;

/// Interpret the big-endian two's-complement representation of the unscaled
/// value of a decimal
pub(crate) fn decimal_from_be_bytes(
	bytes: &[u8],
	scale: u32,
) -> Result<rust_decimal::Decimal, DeError> {
	let size = bytes.len();
	let mut buf = [0u8; 16];
	let start = buf.len().checked_sub(size).ok_or_else(|| {
		DeError::custom(format_args!(
			"Decimals of size larger than 16 are not supported (got size {size})"
		))
	})?;
	buf[start..].copy_from_slice(bytes);
	if buf.get(start).map_or(false, |&v| v & 0x80 != 0) {
		// This is a negative number in CA2 repr, we need to maintain that for the
		// larger number
		for v in &mut buf[0..start] {
			*v = 0xFF;
		}
	}
	let unscaled = i128::from_be_bytes(buf);
	rust_decimal::Decimal::try_from_i128_with_scale(unscaled, scale)
		.map_err(|e| DeError::custom(format_args!("Could not parse decimal from i128: {e}")))
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq};

	#[test]
	fn sign_extension() {
		assert_eq!(
			decimal_from_be_bytes(&[0xFF, 0x85], 2).unwrap(),
			rust_decimal::Decimal::new(-123, 2)
		);
		assert_eq!(
			decimal_from_be_bytes(&[0x00, 0x85], 2).unwrap(),
			rust_decimal::Decimal::new(133, 2)
		);
		assert_eq!(
			decimal_from_be_bytes(&[], 0).unwrap(),
			rust_decimal::Decimal::ZERO
		);
		assert!(decimal_from_be_bytes(&[0; 17], 0).is_err());
	}
}
