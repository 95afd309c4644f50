/* Constants shared by the DEFLATE encoder and decoder, per RFC 1951 §3.2. */

pub const DEFLATE_BLOCKTYPE_UNCOMPRESSED: u32 = 0;
pub const DEFLATE_BLOCKTYPE_STATIC_HUFFMAN: u32 = 1;
pub const DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN: u32 = 2;

pub const DEFLATE_MIN_MATCH_LEN: usize = 3;
pub const DEFLATE_MAX_MATCH_LEN: usize = 258;
pub const DEFLATE_MAX_MATCH_OFFSET: usize = 32768;

pub const DEFLATE_NUM_PRECODE_SYMS: usize = 19;
pub const DEFLATE_NUM_LITLEN_SYMS: usize = 288;
pub const DEFLATE_NUM_OFFSET_SYMS: usize = 32;

pub const DEFLATE_MAX_NUM_SYMS: usize = DEFLATE_NUM_LITLEN_SYMS;

pub const DEFLATE_MAX_PRE_CODEWORD_LEN: usize = 7;
pub const DEFLATE_MAX_LITLEN_CODEWORD_LEN: usize = 15;
pub const DEFLATE_MAX_OFFSET_CODEWORD_LEN: usize = 15;
pub const DEFLATE_MAX_CODEWORD_LEN: usize = DEFLATE_MAX_LITLEN_CODEWORD_LEN;

/*
 * Maximum number of extra lit/len/distance codeword lengths that can be
 * written by a single run-length-encoded repeat (presym 18, repeated zero run
 * of up to 138), minus the one slot the loop already accounts for. The
 * `lens` array is over-allocated by this much so that writing a repeat count
 * near the end of the array can never run past its bound.
 */
pub const DEFLATE_MAX_LENS_OVERRUN: usize = 137;

pub const DEFLATE_END_OF_BLOCK: u32 = 256;
