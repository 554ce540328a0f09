//! Reading save files and table files from disk.

use std::fs::read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use encoding_rs::{UTF_8, WINDOWS_1252};

use crate::block::Block;
use crate::parse::pdxfile::parse_pdx;
use crate::report::{fatal, warn, ErrorKey};
use crate::token::Loc;

#[derive(Clone, Copy, Debug)]
pub struct PdxFile;

impl PdxFile {
    /// Read and parse a whole document.
    ///
    /// Older saves are in Windows-1252 rather than UTF-8. Those are decoded with a warning.
    pub fn read(pathname: &Path) -> Result<Block> {
        let loc = Loc::for_file(Arc::new(pathname.to_path_buf()));
        let bytes = read(pathname)
            .inspect_err(|e| {
                fatal(ErrorKey::ReadError).msg(format!("could not read: {e}")).loc(&loc).push();
            })
            .with_context(|| format!("could not read file {}", pathname.display()))?;
        let contents = match decode_utf8(&bytes) {
            Some(contents) => contents,
            None => {
                let msg = "file is not UTF-8, reading it as Windows-1252";
                warn(ErrorKey::Encoding).msg(msg).loc(&loc).push();
                decode_bytes(&bytes)
            }
        };
        match parse_pdx(&loc, &contents) {
            Some(block) => Ok(block),
            None => bail!("could not parse file {}", pathname.display()),
        }
    }
}

fn decode_utf8(bytes: &[u8]) -> Option<String> {
    UTF_8.decode_without_bom_handling_and_without_replacement(strip_bom(bytes)).map(String::from)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes)
}

/// Decode file contents as UTF-8 if they are valid UTF-8, and as Windows-1252 otherwise.
/// Windows-1252 decoding cannot fail.
pub(crate) fn decode_bytes(bytes: &[u8]) -> String {
    decode_utf8(bytes).unwrap_or_else(|| WINDOWS_1252.decode_without_bom_handling(bytes).0.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        assert_eq!(decode_bytes(b"\xef\xbb\xbfname = \"Paris\""), "name = \"Paris\"");
        assert_eq!(decode_bytes(b"name = \"Bohm\xeans\""), "name = \"Bohmêns\"");
        assert_eq!(decode_bytes("Bohmêns".as_bytes()), "Bohmêns");
    }
}
