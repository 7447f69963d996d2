use std::sync::OnceLock;

/// Shortest match worth encoding as a back-reference
pub const MIN_MATCH: usize = 3;

/// Longest match a single length code can express
pub const MAX_MATCH: usize = 258;

/// Largest back-reference distance in the format (32 KiB)
pub const MAX_DISTANCE: usize = 32768;

/// Number of literal/length symbols in use (0-285)
pub const L_CODES: usize = 286;

/// Number of distance symbols in use (0-29)
pub const D_CODES: usize = 30;

/// Number of code length symbols (0-18)
pub const BL_CODES: usize = 19;

/// End-of-block symbol
pub const END_BLOCK: usize = 256;

/// Length codes 257-285: base length and extra bits
/// Index by (code - 257)
pub const LENGTH_TABLE: [(u16, u8); 29] = [
    // (base_length, extra_bits)
    (3, 0),   // 257
    (4, 0),   // 258
    (5, 0),   // 259
    (6, 0),   // 260
    (7, 0),   // 261
    (8, 0),   // 262
    (9, 0),   // 263
    (10, 0),  // 264
    (11, 1),  // 265
    (13, 1),  // 266
    (15, 1),  // 267
    (17, 1),  // 268
    (19, 2),  // 269
    (23, 2),  // 270
    (27, 2),  // 271
    (31, 2),  // 272
    (35, 3),  // 273
    (43, 3),  // 274
    (51, 3),  // 275
    (59, 3),  // 276
    (67, 4),  // 277
    (83, 4),  // 278
    (99, 4),  // 279
    (115, 4), // 280
    (131, 5), // 281
    (163, 5), // 282
    (195, 5), // 283
    (227, 5), // 284
    (258, 0), // 285 - special case
];

/// Distance codes 0-29: base distance and extra bits
pub const DISTANCE_TABLE: [(u16, u8); 30] = [
    // (base_distance, extra_bits)
    (1, 0),      // 0
    (2, 0),      // 1
    (3, 0),      // 2
    (4, 0),      // 3
    (5, 1),      // 4
    (7, 1),      // 5
    (9, 2),      // 6
    (13, 2),     // 7
    (17, 3),     // 8
    (25, 3),     // 9
    (33, 4),     // 10
    (49, 4),     // 11
    (65, 5),     // 12
    (97, 5),     // 13
    (129, 6),    // 14
    (193, 6),    // 15
    (257, 7),    // 16
    (385, 7),    // 17
    (513, 8),    // 18
    (769, 8),    // 19
    (1025, 9),   // 20
    (1537, 9),   // 21
    (2049, 10),  // 22
    (3073, 10),  // 23
    (4097, 11),  // 24
    (6145, 11),  // 25
    (8193, 12),  // 26
    (12289, 12), // 27
    (16385, 13), // 28
    (24577, 13), // 29
];

/// Extra bits carried by code length symbols 16, 17, 18 (index by symbol)
pub const CODE_LENGTH_EXTRA_BITS: [u8; BL_CODES] =
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 3, 7];

/// Order of code length alphabet for dynamic Huffman blocks
pub const CODE_LENGTH_ORDER: [usize; 19] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// Direct lookups from length/distance to symbol index
struct CodeLookup {
    /// (length - 3) -> index into LENGTH_TABLE
    length_code: [u8; 256],
    /// distance - 1 -> index into DISTANCE_TABLE, for distances up to 256;
    /// above that, 256 + ((distance - 1) >> 7)
    dist_code: [u8; 512],
}

fn code_lookup() -> &'static CodeLookup {
    static LOOKUP: OnceLock<CodeLookup> = OnceLock::new();
    LOOKUP.get_or_init(|| {
        let mut length_code = [0u8; 256];
        for (code, &(base, extra)) in LENGTH_TABLE.iter().enumerate().take(28) {
            let start = base as usize - 3;
            for slot in &mut length_code[start..start + (1 << extra)] {
                *slot = code as u8;
            }
        }
        // Length 258 has its own code even though 284 could also reach it
        length_code[255] = 28;

        let mut dist_code = [0u8; 512];
        for (code, &(base, extra)) in DISTANCE_TABLE.iter().enumerate() {
            let start = base as usize - 1;
            let end = start + (1usize << extra);
            for d in start..end {
                if d < 256 {
                    dist_code[d] = code as u8;
                } else {
                    dist_code[256 + (d >> 7)] = code as u8;
                }
            }
        }
        CodeLookup { length_code, dist_code }
    })
}

/// Index into LENGTH_TABLE for a match length (3-258)
#[inline]
pub fn length_symbol_index(length: usize) -> usize {
    debug_assert!((MIN_MATCH..=MAX_MATCH).contains(&length));
    code_lookup().length_code[length - MIN_MATCH] as usize
}

/// Distance code (0-29) for a distance (1-32768)
#[inline]
pub fn distance_symbol(distance: usize) -> usize {
    debug_assert!((1..=MAX_DISTANCE).contains(&distance));
    let d = distance - 1;
    let lookup = code_lookup();
    if d < 256 {
        lookup.dist_code[d] as usize
    } else {
        lookup.dist_code[256 + (d >> 7)] as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_symbols() {
        assert_eq!(length_symbol_index(3), 0);
        assert_eq!(length_symbol_index(10), 7);
        assert_eq!(length_symbol_index(11), 8);
        assert_eq!(length_symbol_index(12), 8);
        assert_eq!(length_symbol_index(257), 27);
        assert_eq!(length_symbol_index(258), 28);
    }

    #[test]
    fn test_distance_symbols() {
        assert_eq!(distance_symbol(1), 0);
        assert_eq!(distance_symbol(4), 3);
        assert_eq!(distance_symbol(5), 4);
        assert_eq!(distance_symbol(6), 4);
        assert_eq!(distance_symbol(257), 16);
        assert_eq!(distance_symbol(32768), 29);
    }

    #[test]
    fn test_every_length_lands_in_its_range() {
        for len in MIN_MATCH..=MAX_MATCH {
            let (base, extra) = LENGTH_TABLE[length_symbol_index(len)];
            let base = base as usize;
            // 258 has its own code with no extra bits
            assert!(len >= base && len - base < (1usize << extra).max(1), "length {}", len);
        }
    }

    #[test]
    fn test_every_distance_lands_in_its_range() {
        for dist in 1..=MAX_DISTANCE {
            let (base, extra) = DISTANCE_TABLE[distance_symbol(dist)];
            let base = base as usize;
            assert!(dist >= base && dist - base < (1usize << extra), "distance {}", dist);
        }
    }
}
