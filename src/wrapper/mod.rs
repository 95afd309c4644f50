pub mod gzip;
pub mod raw;
pub mod zlib;

/// Which wrapper framing a stream uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapperKind {
    Raw,
    Gzip,
    Zlib,
}
