use super::*;

/// The big-endian two's-complement representation of the unscaled value of
/// `decimal` once rescaled to `scale`
///
/// If `size` is provided (decimal represented as `fixed`), the result is
/// padded or truncated to exactly that size. Otherwise it is as short as
/// possible (but never empty).
pub(crate) fn decimal_to_be_bytes(
	mut decimal: rust_decimal::Decimal,
	scale: u32,
	size: Option<usize>,
) -> Result<Vec<u8>, SerError> {
	// Try to scale it appropriately
	decimal.rescale(scale);
	if decimal.scale() != scale {
		return Err(SerError::decimal_out_of_range(
			"Decimal number cannot be scaled to fit in schema scale \
				with a 96 bit mantissa (number or scale too large)",
		));
	}
	let buf: [u8; 16] = decimal.mantissa().to_be_bytes();
	match size {
		None => {
			let start = can_truncate_without_altering_number(&buf);
			Ok(buf[start..].to_vec())
		}
		Some(size) => match buf.len().checked_sub(size) {
			Some(start) => {
				// We are going to truncate the number - make sure that doesn't alter it
				match buf.get(0..start + 1) {
					Some(relevant_buf_for_check) => {
						let can_truncate =
							can_truncate_without_altering_number(relevant_buf_for_check);
						if can_truncate < start {
							return Err(SerError::decimal_out_of_range(format_args!(
								"Decimal number does not fit in `fixed` field size \
									(fixed size: {size}, required: {})",
								size + (start - can_truncate)
							)));
						}
					}
					None => {
						// We only know how to represent 0 in this case (empty bytes)
						if !decimal.is_zero() {
							return Err(SerError::decimal_out_of_range(
								"Non-zero decimal number can not be serialized \
									as a fixed size decimal with size 0",
							));
						}
					}
				}
				Ok(buf[start..].to_vec())
			}
			None => {
				let byte: u8 = if buf[0] & 0x80 == 0 { 0x00 } else { 0xFF };
				let mut padded = vec![byte; size - buf.len()];
				padded.extend_from_slice(&buf);
				Ok(padded)
			}
		},
	}
}

fn can_truncate_without_altering_number(buf: &[u8]) -> usize {
	// If it's a negative number we can ignore all 0xff followed by MSB
	// at 1 If it's a positive number we can ignore all 0x00 followed by MSB at 0
	let mut can_truncate = 0;
	if buf[0] & 0x80 == 0 {
		while buf.get(can_truncate).map_or(false, |&v| v == 0x00) {
			can_truncate += 1;
		}
		// Zero is still written as a single byte
		if can_truncate != 0 && buf.get(can_truncate).map_or(true, |&v| v & 0x80 != 0) {
			can_truncate -= 1;
		}
	} else {
		while buf.get(can_truncate).map_or(false, |&v| v == 0xFF) {
			can_truncate += 1;
		}
		if can_truncate != 0 && buf.get(can_truncate).map_or(true, |&v| v & 0x80 == 0) {
			can_truncate -= 1;
		}
	}
	can_truncate
}
