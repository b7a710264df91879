//! Decodes arrays of `M` values packed at `b` bits each (`1 <= b <= 32`)
//! into a little-endian bitstream: byte 0's least-significant bit is the
//! first bit of value 0, and values straddle byte boundaries freely.

/// Unpacks `count` values of `bit_width` bits from `data`.
///
/// Byte-aligned widths (8, 16, 32) take a zero-copy-equivalent fast path
/// reading packed little-endian words directly; all other widths go through
/// a rolling bit-window over a `u64` accumulator.
pub fn unpack_bits(data: &[u8], bit_width: u32, count: usize) -> Vec<u32> {
    assert!(
        (1..=32).contains(&bit_width),
        "bit width must be in 1..=32, got {bit_width}"
    );

    match bit_width {
        8 => data[..count].iter().map(|&b| b as u32).collect(),
        16 => (0..count)
            .map(|i| u16::from_le_bytes([data[2 * i], data[2 * i + 1]]) as u32)
            .collect(),
        32 => (0..count)
            .map(|i| {
                u32::from_le_bytes([
                    data[4 * i],
                    data[4 * i + 1],
                    data[4 * i + 2],
                    data[4 * i + 3],
                ])
            })
            .collect(),
        _ => unpack_bits_generic(data, bit_width, count),
    }
}

fn unpack_bits_generic(data: &[u8], bit_width: u32, count: usize) -> Vec<u32> {
    let mut out = Vec::with_capacity(count);
    let mut acc: u64 = 0;
    let mut acc_bits: u32 = 0;
    let mut byte_pos = 0usize;
    let mask = (1u64 << bit_width) - 1;

    for _ in 0..count {
        while acc_bits < bit_width {
            let byte = *data.get(byte_pos).unwrap_or(&0);
            acc |= (byte as u64) << acc_bits;
            acc_bits += 8;
            byte_pos += 1;
        }
        out.push((acc & mask) as u32);
        acc >>= bit_width;
        acc_bits -= bit_width;
    }

    out
}

/// Converts a raw `bit_width`-bit unsigned value to a probability in [0,1].
pub fn value_to_probability(value: u32, bit_width: u32) -> f64 {
    let max = (1u64 << bit_width) - 1;
    value as f64 / max as f64
}
