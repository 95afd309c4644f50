/* Constants for the GZIP wrapper format, per RFC 1952. */

pub const GZIP_ID1: u8 = 0x1F;
pub const GZIP_ID2: u8 = 0x8B;

pub const GZIP_CM_DEFLATE: u8 = 8;

pub const GZIP_FRESERVED: u8 = 0xE0;
pub const GZIP_FHCRC: u8 = 0x02;
pub const GZIP_FEXTRA: u8 = 0x04;
pub const GZIP_FNAME: u8 = 0x08;
pub const GZIP_FCOMMENT: u8 = 0x10;

pub const GZIP_HEADER_SIZE: usize = 10;
pub const GZIP_FOOTER_SIZE: usize = 8;

/* OS field emitted on encode: 3 = Unix. XFL is always 0 (no indication of
 * the compression effort used); both are purely informational on decode. */
pub const GZIP_OS_UNIX: u8 = 3;
pub const GZIP_XFL_DEFAULT: u8 = 0;
