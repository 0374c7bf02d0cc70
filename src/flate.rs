const ADLER_BASE: u32 = 65_521;
const STORED_BLOCK_MAX: usize = 65_535;

/// Wrap `data` in a zlib container of stored deflate blocks. No entropy
/// coding; any inflater accepts the output and the byte stream is a pure
/// function of the input.
pub(crate) fn zlib_store(data: &[u8]) -> Vec<u8> {
    let block_count = data.len().div_ceil(STORED_BLOCK_MAX).max(1);
    let mut out = Vec::with_capacity(data.len() + block_count * 5 + 6);
    // CMF/FLG: 32K window deflate, no preset dictionary, check bits valid.
    out.push(0x78);
    out.push(0x01);

    let mut chunks = data.chunks(STORED_BLOCK_MAX).peekable();
    if chunks.peek().is_none() {
        out.extend_from_slice(&[0x01, 0x00, 0x00, 0xFF, 0xFF]);
    }
    while let Some(chunk) = chunks.next() {
        let bfinal = if chunks.peek().is_none() { 1 } else { 0 };
        let len = chunk.len() as u16;
        out.push(bfinal);
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&(!len).to_le_bytes());
        out.extend_from_slice(chunk);
    }

    out.extend_from_slice(&adler32(data).to_be_bytes());
    out
}

fn adler32(data: &[u8]) -> u32 {
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    // 5552 is the largest run before the u32 sums can overflow.
    for chunk in data.chunks(5552) {
        for &byte in chunk {
            a += byte as u32;
            b += a;
        }
        a %= ADLER_BASE;
        b %= ADLER_BASE;
    }
    (b << 16) | a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_a_single_empty_final_block() {
        let out = zlib_store(&[]);
        assert_eq!(
            out,
            vec![0x78, 0x01, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x01]
        );
    }

    #[test]
    fn adler_matches_reference_values() {
        // RFC 1950 checksum of "Wikipedia".
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
        assert_eq!(adler32(b""), 1);
    }

    #[test]
    fn stored_block_carries_len_and_complement() {
        let out = zlib_store(b"abc");
        assert_eq!(&out[..2], &[0x78, 0x01]);
        assert_eq!(out[2], 0x01);
        assert_eq!(&out[3..5], &[0x03, 0x00]);
        assert_eq!(&out[5..7], &[0xFC, 0xFF]);
        assert_eq!(&out[7..10], b"abc");
    }

    #[test]
    fn large_input_splits_into_multiple_blocks() {
        let data = vec![0xABu8; STORED_BLOCK_MAX + 10];
        let out = zlib_store(&data);
        // First block is not final, second is.
        assert_eq!(out[2], 0x00);
        let second_header = 2 + 5 + STORED_BLOCK_MAX;
        assert_eq!(out[second_header], 0x01);
        assert_eq!(
            &out[second_header + 1..second_header + 3],
            &10u16.to_le_bytes()
        );
    }
}
