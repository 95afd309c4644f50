//! The tokenizer driver: walks the input with the match finder (lazy
//! matching when the level calls for it), fills one [`TokenBuffer`] per
//! block, and hands each block to the [`BlockWriter`].

use crate::compress::bit_writer::BitWriter;
use crate::compress::block_writer::{BlockMode, BlockWriter};
use crate::compress::level::Level;
use crate::compress::match_finder::{Match, MatchFinder};
use crate::compress::token::{TokenBuffer, TOKEN_BUFFER_CAPACITY};
use crate::deflate_constants::DEFLATE_MIN_MATCH_LEN;
use crate::LibdeflateError;
use std::io::Write;

pub fn compress_into<W: Write>(
    data: &[u8],
    level: Level,
    mode: BlockMode,
    writer: &mut BitWriter<W>,
) -> Result<(), LibdeflateError> {
    let block_writer = BlockWriter::new(mode);

    if level == Level::STORE || mode == BlockMode::StoreOnly {
        return block_writer.write_block(writer, &TokenBuffer::new(), data, true);
    }

    if mode == BlockMode::HuffmanOnly {
        return compress_literals_only(data, &block_writer, writer);
    }

    let params = level.params();
    let mut mf = MatchFinder::new(data);

    let mut pos = 0usize;
    loop {
        let start = pos;
        let (mut tokens, new_pos) = tokenize_block(data, &mut mf, &params, pos);
        pos = new_pos;
        let is_final = pos >= data.len();
        tokens.account_end_of_block();
        block_writer.write_block(writer, &tokens, &data[start..pos], is_final)?;

        if is_final {
            break;
        }
    }
    Ok(())
}

/// Huffman-only mode skips match search entirely: every byte becomes a
/// literal token and the block writer is told to always emit a dynamic
/// block, never stored or fixed.
fn compress_literals_only<W: Write>(
    data: &[u8],
    block_writer: &BlockWriter,
    writer: &mut BitWriter<W>,
) -> Result<(), LibdeflateError> {
    let mut pos = 0usize;
    loop {
        let start = pos;
        let end = (pos + TOKEN_BUFFER_CAPACITY).min(data.len());

        let mut tokens = TokenBuffer::new();
        for &byte in &data[start..end] {
            tokens.push_literal(byte);
        }
        pos = end;

        let is_final = pos >= data.len();
        tokens.account_end_of_block();
        block_writer.write_block(writer, &tokens, &data[start..pos], is_final)?;

        if is_final {
            break;
        }
    }
    Ok(())
}

fn tokenize_block(
    data: &[u8],
    mf: &mut MatchFinder,
    params: &crate::compress::level::LevelParams,
    start: usize,
) -> (TokenBuffer, usize) {
    let mut tokens = TokenBuffer::new();
    let mut pos = start;
    let mut carry: Option<Match> = None;

    if data.is_empty() {
        return (tokens, pos);
    }

    while pos < data.len() && tokens.tokens.len() < TOKEN_BUFFER_CAPACITY {
        let found = carry.take().or_else(|| mf.find_match(pos, params.nice, params.chain));
        mf.insert(pos);

        match found {
            Some(m) if m.length >= DEFLATE_MIN_MATCH_LEN => {
                if params.use_lazy_matching && m.length < params.lazy && pos + 1 < data.len() {
                    let lookahead = mf.find_match(pos + 1, params.nice, params.chain);
                    if let Some(ref better) = lookahead {
                        if better.length > m.length {
                            tokens.push_literal(data[pos]);
                            pos += 1;
                            carry = lookahead;
                            continue;
                        }
                    }
                }

                tokens.push_match(m.length as u16, m.distance as u16);
                for p in (pos + 1)..(pos + m.length) {
                    mf.insert(p);
                }
                pos += m.length;
            }
            _ => {
                tokens.push_literal(data[pos]);
                pos += 1;
            }
        }
    }

    (tokens, pos)
}
