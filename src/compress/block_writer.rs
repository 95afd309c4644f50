//! Turns a filled [`TokenBuffer`] into DEFLATE block bits: picks between
//! stored/fixed/dynamic Huffman representations by estimated size (unless
//! pinned by `BlockMode`), builds the dynamic code-length sub-code per
//! RFC 1951 §3.2.7, and emits everything through a [`BitWriter`].

use crate::compress::bit_writer::BitWriter;
use crate::compress::huffman_encoder::HuffmanCode;
use crate::compress::tables::{
    distance_code_index, length_code_index, fixed_dist_lengths, fixed_litlen_lengths,
    CODE_LENGTH_ORDER, DIST_CODES, LENGTH_CODES,
};
use crate::compress::token::{Token, TokenBuffer};
use crate::deflate_constants::{
    DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN, DEFLATE_BLOCKTYPE_STATIC_HUFFMAN,
    DEFLATE_BLOCKTYPE_UNCOMPRESSED, DEFLATE_END_OF_BLOCK, DEFLATE_NUM_LITLEN_SYMS,
    DEFLATE_NUM_OFFSET_SYMS, DEFLATE_NUM_PRECODE_SYMS,
};
use crate::LibdeflateError;
use std::io::Write;

/// Forces the block writer to always use one particular block type,
/// overriding the size-estimate heuristic. Used by the `huffman_only`
/// and `store_only` façade entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockMode {
    Auto,
    HuffmanOnly,
    StoreOnly,
}

pub struct BlockWriter {
    pub mode: BlockMode,
}

impl BlockWriter {
    pub fn new(mode: BlockMode) -> Self {
        Self { mode }
    }

    pub fn write_block<W: Write>(
        &self,
        writer: &mut BitWriter<W>,
        tokens: &TokenBuffer,
        raw_data: &[u8],
        is_final: bool,
    ) -> Result<(), LibdeflateError> {
        match self.mode {
            BlockMode::StoreOnly => self.write_stored(writer, raw_data, is_final),
            BlockMode::HuffmanOnly => self.write_huffman(writer, tokens, raw_data, is_final, true),
            BlockMode::Auto => self.write_huffman(writer, tokens, raw_data, is_final, false),
        }
    }

    fn write_stored<W: Write>(
        &self,
        writer: &mut BitWriter<W>,
        raw_data: &[u8],
        is_final: bool,
    ) -> Result<(), LibdeflateError> {
        // Stored blocks start their data on a byte boundary and are
        // capped at 65535 bytes, so a larger span needs several stored
        // blocks back to back, each with its own BFINAL/BTYPE header.
        let chunks: Vec<&[u8]> = if raw_data.is_empty() {
            vec![&raw_data[..0]]
        } else {
            raw_data.chunks(u16::MAX as usize).collect()
        };

        let last = chunks.len() - 1;
        for (i, chunk) in chunks.into_iter().enumerate() {
            let chunk_final = is_final && i == last;
            writer.write_bits(chunk_final as u32, 1)?;
            writer.write_bits(DEFLATE_BLOCKTYPE_UNCOMPRESSED, 2)?;

            let len = chunk.len() as u16;
            writer.align_flush()?;
            writer.write_bytes(&len.to_le_bytes())?;
            writer.write_bytes(&(!len).to_le_bytes())?;
            writer.write_bytes(chunk)?;
        }
        Ok(())
    }

    // `force_dynamic` (set by the huffman_only façade entry point) skips
    // both the stored-block comparison and the fixed-vs-dynamic size
    // comparison, always emitting a dynamic block.
    fn write_huffman<W: Write>(
        &self,
        writer: &mut BitWriter<W>,
        tokens: &TokenBuffer,
        raw_data: &[u8],
        is_final: bool,
        force_dynamic: bool,
    ) -> Result<(), LibdeflateError> {
        let litlen_code = HuffmanCode::build(&tokens.litlen_freqs, 15);
        let offset_code = HuffmanCode::build(&tokens.offset_freqs, 15);

        let dynamic_header = DynamicHeader::build(&litlen_code.lens, &offset_code.lens);

        let dynamic_bits = 5 + 5 + 4 + dynamic_header.precode_bits() + dynamic_header.body_bits();
        let token_bits = estimate_token_bits(tokens, &litlen_code.lens, &offset_code.lens);
        let dynamic_total = dynamic_bits + token_bits;

        let fixed_litlen = fixed_litlen_lengths();
        let fixed_dist = fixed_dist_lengths();
        let fixed_total = estimate_token_bits(tokens, &fixed_litlen, &fixed_dist);

        let stored_total = if raw_data.is_empty() {
            40
        } else {
            raw_data.len() * 8 + 40 * raw_data.len().div_ceil(u16::MAX as usize)
        };

        if !force_dynamic && stored_total < dynamic_total.min(fixed_total) {
            return self.write_stored(writer, raw_data, is_final);
        }

        writer.write_bits(is_final as u32, 1)?;

        if !force_dynamic && fixed_total <= dynamic_total {
            writer.write_bits(DEFLATE_BLOCKTYPE_STATIC_HUFFMAN, 2)?;
            let fixed_litlen = HuffmanCode::from_lens(fixed_litlen.to_vec());
            let fixed_dist = HuffmanCode::from_lens(fixed_dist.to_vec());
            write_tokens(writer, tokens, &fixed_litlen, &fixed_dist)?;
        } else {
            writer.write_bits(DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN, 2)?;
            dynamic_header.write(writer)?;
            write_tokens(writer, tokens, &litlen_code, &offset_code)?;
        }

        Ok(())
    }
}

fn write_tokens<W: Write>(
    writer: &mut BitWriter<W>,
    tokens: &TokenBuffer,
    litlen_code: &HuffmanCode,
    offset_code: &HuffmanCode,
) -> Result<(), LibdeflateError> {
    for token in &tokens.tokens {
        match *token {
            Token::Literal(byte) => {
                write_symbol(writer, litlen_code, byte as usize)?;
            }
            Token::Match { length, distance } => {
                let li = length_code_index(length as usize);
                let lc = &LENGTH_CODES[li];
                write_symbol(writer, litlen_code, lc.code as usize)?;
                if lc.extra_bits > 0 {
                    writer.write_bits(
                        (length as u32) - lc.base as u32,
                        lc.extra_bits as u32,
                    )?;
                }

                let di = distance_code_index(distance as usize);
                let dc = &DIST_CODES[di];
                write_symbol(writer, offset_code, dc.code as usize)?;
                if dc.extra_bits > 0 {
                    writer.write_bits(
                        (distance as u32) - dc.base as u32,
                        dc.extra_bits as u32,
                    )?;
                }
            }
        }
    }
    write_symbol(writer, litlen_code, DEFLATE_END_OF_BLOCK as usize)
}

fn write_symbol<W: Write>(
    writer: &mut BitWriter<W>,
    code: &HuffmanCode,
    sym: usize,
) -> Result<(), LibdeflateError> {
    writer.write_bits(code.codes[sym] as u32, code.lens[sym] as u32)
}

fn estimate_token_bits(tokens: &TokenBuffer, litlen_lens: &[u8], dist_lens: &[u8]) -> usize {
    let mut bits = litlen_lens[DEFLATE_END_OF_BLOCK as usize] as usize;
    for token in &tokens.tokens {
        bits += match *token {
            Token::Literal(byte) => litlen_lens[byte as usize] as usize,
            Token::Match { length, distance } => {
                let li = length_code_index(length as usize);
                let lc = &LENGTH_CODES[li];
                let di = distance_code_index(distance as usize);
                let dc = &DIST_CODES[di];
                litlen_lens[lc.code as usize] as usize
                    + lc.extra_bits as usize
                    + dist_lens[dc.code as usize] as usize
                    + dc.extra_bits as usize
            }
        };
    }
    bits
}

/// The dynamic block header: litlen/offset code lengths run-length
/// encoded through the 19-symbol code-length alphabet.
struct DynamicHeader {
    hlit: usize,
    hdist: usize,
    precode_lens: Vec<u8>,
    precode_code: HuffmanCode,
    symbols: Vec<(u8, u8)>, // (code_length_symbol, extra_bits_value)
}

impl DynamicHeader {
    fn build(litlen_lens: &[u8], dist_lens: &[u8]) -> Self {
        let hlit = last_nonzero(litlen_lens).max(256) - 256;
        let hdist = last_nonzero(dist_lens).max(0) + 1;

        let mut combined: Vec<u8> = Vec::with_capacity(hlit + 257 + hdist + 1);
        combined.extend_from_slice(&litlen_lens[..257 + hlit]);
        combined.extend_from_slice(&dist_lens[..hdist.max(1)]);

        let symbols = run_length_encode(&combined);

        let mut precode_freqs = [0u32; DEFLATE_NUM_PRECODE_SYMS];
        for &(sym, _) in &symbols {
            precode_freqs[sym as usize] += 1;
        }
        let precode_code = HuffmanCode::build(&precode_freqs, 7);

        Self {
            hlit,
            hdist: hdist.max(1) - 1,
            precode_lens: precode_code.lens.clone(),
            precode_code,
            symbols,
        }
    }

    fn precode_bits(&self) -> usize {
        let mut n = 0;
        for &idx in CODE_LENGTH_ORDER.iter() {
            if idx < self.precode_lens.len() {
                n += 3;
            }
        }
        n
    }

    fn body_bits(&self) -> usize {
        self.symbols
            .iter()
            .map(|&(sym, _)| {
                let extra = match sym {
                    16 => 2,
                    17 => 3,
                    18 => 7,
                    _ => 0,
                };
                self.precode_code.lens[sym as usize] as usize + extra
            })
            .sum()
    }

    fn write<W: Write>(&self, writer: &mut BitWriter<W>) -> Result<(), LibdeflateError> {
        writer.write_bits(self.hlit as u32, 5)?;
        writer.write_bits(self.hdist as u32, 5)?;

        let hclen_last = last_used_order_index(&self.precode_lens);
        writer.write_bits(hclen_last as u32, 4)?;

        for &idx in CODE_LENGTH_ORDER.iter().take(hclen_last + 4) {
            let len = self.precode_lens.get(idx).copied().unwrap_or(0);
            writer.write_bits(len as u32, 3)?;
        }

        for &(sym, extra_value) in &self.symbols {
            write_symbol(writer, &self.precode_code, sym as usize)?;
            match sym {
                16 => writer.write_bits(extra_value as u32, 2)?,
                17 => writer.write_bits(extra_value as u32, 3)?,
                18 => writer.write_bits(extra_value as u32, 7)?,
                _ => {}
            }
        }
        Ok(())
    }
}

fn last_nonzero(lens: &[u8]) -> usize {
    lens.iter()
        .enumerate()
        .rev()
        .find(|&(_, &l)| l != 0)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn last_used_order_index(precode_lens: &[u8]) -> usize {
    let mut last = 3; // HCLEN minimum is 4 entries (index 3)
    for (i, &idx) in CODE_LENGTH_ORDER.iter().enumerate() {
        if precode_lens.get(idx).copied().unwrap_or(0) != 0 {
            last = i;
        }
    }
    last.max(3)
}

/// RFC 1951 §3.2.7 run-length encoding of a code-length sequence.
fn run_length_encode(lens: &[u8]) -> Vec<(u8, u8)> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < lens.len() {
        let cur = lens[i];
        let mut run = 1;
        while i + run < lens.len() && lens[i + run] == cur {
            run += 1;
        }

        if cur == 0 {
            let mut remaining = run;
            while remaining >= 11 {
                let take = remaining.min(138);
                out.push((18, (take - 11) as u8));
                remaining -= take;
            }
            if remaining >= 3 {
                out.push((17, (remaining - 3) as u8));
                remaining = 0;
            }
            for _ in 0..remaining {
                out.push((0, 0));
            }
        } else {
            out.push((cur, 0));
            let mut remaining = run - 1;
            while remaining >= 3 {
                let take = remaining.min(6);
                out.push((16, (take - 3) as u8));
                remaining -= take;
            }
            for _ in 0..remaining {
                out.push((cur, 0));
            }
        }
        i += run;
    }
    out
}

const _: () = assert!(DEFLATE_NUM_LITLEN_SYMS == 288 && DEFLATE_NUM_OFFSET_SYMS == 32);
