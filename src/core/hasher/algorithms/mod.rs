//! Hash algorithm implementations.

mod average;
mod difference;
mod perceptual;

pub use average::AverageHasher;
pub use difference::DifferenceHasher;
pub use perceptual::PerceptualHasher;

/// Pack bits into bytes, first bit in the most significant position.
///
/// A trailing partial byte is zero-padded on the right.
fn pack_bits(bits: impl IntoIterator<Item = bool>) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut current_byte: u8 = 0;
    let mut bit_position = 0;

    for bit in bits {
        if bit {
            current_byte |= 1 << (7 - bit_position);
        }

        bit_position += 1;

        if bit_position == 8 {
            bytes.push(current_byte);
            current_byte = 0;
            bit_position = 0;
        }
    }

    if bit_position > 0 {
        bytes.push(current_byte);
    }

    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_bits_is_msb_first() {
        let bits = [true, false, false, false, false, false, false, true];
        assert_eq!(pack_bits(bits), vec![0b1000_0001]);
    }

    #[test]
    fn pack_bits_pads_partial_byte() {
        assert_eq!(pack_bits([true, true]), vec![0b1100_0000]);
    }
}
