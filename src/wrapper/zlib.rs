//! The ZLIB wrapper (RFC 1950): a 2-byte CMF/FLG header (mod-31 checked),
//! a raw DEFLATE stream, and a 4-byte big-endian Adler-32 footer.

use crate::checksum::{Adler32Checksum, Checksum};
use crate::compress::bit_writer::BitWriter;
use crate::compress::block_writer::BlockMode;
use crate::compress::{deflate, CompressOptions};
use crate::decompress_deflate::{libdeflate_deflate_decompress, OutStreamResult};
use crate::zlib_constants::*;
use crate::{DeflateInput, DeflateOutput, LibdeflateDecodeTables, LibdeflateError};

pub fn zlib_decompress<I: DeflateInput, O: DeflateOutput>(
    d: &mut LibdeflateDecodeTables,
    in_stream: &mut I,
    out_stream: &mut O,
) -> Result<OutStreamResult, LibdeflateError> {
    let cmf = in_stream.read_byte::<true>();
    let flg = in_stream.read_byte::<true>();

    if (cmf & 0x0F) != ZLIB_CM_DEFLATE {
        return Err(LibdeflateError::InvalidZlibHeader);
    }
    if ((cmf as u16) * 256 + flg as u16) % 31 != 0 {
        return Err(LibdeflateError::InvalidZlibHeader);
    }
    if (flg & ZLIB_FLG_FDICT) != 0 {
        // Preset dictionaries are an explicit non-goal.
        return Err(LibdeflateError::InvalidZlibHeader);
    }

    libdeflate_deflate_decompress(d, in_stream, out_stream)?;

    let result = out_stream
        .final_flush()
        .map_err(|_| LibdeflateError::InsufficientSpace)?;

    let adler = in_stream.read_le_u32::<true>().swap_bytes();
    if result.checksum != adler {
        return Err(LibdeflateError::ZlibFooterChecksum);
    }

    Ok(result)
}

pub fn zlib_compress(data: &[u8], options: CompressOptions) -> Result<Vec<u8>, LibdeflateError> {
    let mut out = Vec::with_capacity(data.len() / 2 + ZLIB_HEADER_SIZE + ZLIB_FOOTER_SIZE);

    out.push(ZLIB_CMF_DEFLATE);
    // FLG with FCHECK such that (CMF*256 + FLG) % 31 == 0, FLEVEL left at 0.
    let cmf = ZLIB_CMF_DEFLATE as u16;
    let mut flg: u16 = 0;
    let rem = (cmf * 256 + flg) % 31;
    if rem != 0 {
        flg += 31 - rem;
    }
    out.push(flg as u8);

    let mut writer = BitWriter::new(&mut out);
    deflate::compress_into(data, options.level, BlockMode::Auto, &mut writer)?;
    writer.finish()?;

    let mut adler = Adler32Checksum::default();
    adler.update(data);
    out.extend_from_slice(&adler.finalize().to_be_bytes());

    Ok(out)
}
