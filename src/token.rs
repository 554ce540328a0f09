//! Contains the core [`Token`] and [`Loc`] types, which represent pieces of a save file and
//! where they came from.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt::{Display, Error, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A location in a document, used for attributing reports.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Loc {
    pathname: Arc<PathBuf>,
    /// line 0 means the loc applies to the file as a whole.
    pub line: u32,
    pub column: u32,
}

impl Loc {
    pub fn for_file(pathname: Arc<PathBuf>) -> Self {
        Loc { pathname, line: 0, column: 0 }
    }

    /// A loc for tokens that were made up by the program rather than read from a file,
    /// such as the weights that get written back into the tree.
    pub fn internal(what: &str) -> Self {
        Loc::for_file(Arc::new(PathBuf::from(format!("<{what}>"))))
    }

    pub fn pathname(&self) -> &Path {
        &self.pathname
    }

    pub fn filename(&self) -> Cow<'_, str> {
        self.pathname.file_name().unwrap_or_else(|| OsStr::new("")).to_string_lossy()
    }

    pub fn marker(&self) -> String {
        if self.line == 0 {
            format!("{}: ", self.filename())
        } else {
            format!("{}:{}:{}: ", self.filename(), self.line, self.column)
        }
    }
}

/// A Token consists of a string and its location in the parsed document.
#[derive(Clone, Debug)]
pub struct Token {
    s: String,
    pub loc: Loc,
}

impl Token {
    pub fn new(s: &str, loc: Loc) -> Self {
        Token { s: s.to_string(), loc }
    }

    pub fn from_string(s: String, loc: Loc) -> Self {
        Token { s, loc }
    }

    pub fn as_str(&self) -> &str {
        &self.s
    }

    pub fn is(&self, s: &str) -> bool {
        self.s == s
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.s.starts_with(s)
    }

    pub fn get_number(&self) -> Option<f64> {
        self.s.parse::<f64>().ok()
    }

    pub fn get_integer(&self) -> Option<i64> {
        self.s.parse::<i64>().ok()
    }

    /// Save files write booleans as `yes`/`no` and sometimes as `1.000`/`0.000`.
    pub fn is_true(&self) -> bool {
        self.s == "yes" || self.get_number().is_some_and(|n| n > 0.0)
    }

    /// Return true iff the token can be written without surrounding quotes.
    pub fn is_bare(&self) -> bool {
        !self.s.is_empty() && self.s.chars().all(is_id_char)
    }
}

pub(crate) fn is_id_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | ':' | '_' | '-' | '\'' | '@' | '/' | '|' | '&')
}

/// Tokens are compared for equality regardless of their loc.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.s == other.s
    }
}

impl Eq for Token {}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        let loc = Loc::internal("test");
        assert!(Token::new("yes", loc.clone()).is_true());
        assert!(Token::new("1.000", loc.clone()).is_true());
        assert!(!Token::new("no", loc.clone()).is_true());
        assert!(!Token::new("0.000", loc).is_true());
    }

    #[test]
    fn test_bare() {
        let loc = Loc::internal("test");
        assert!(Token::new("c_paris", loc.clone()).is_bare());
        assert!(Token::new("1066.9.15", loc.clone()).is_bare());
        assert!(!Token::new("War of X", loc.clone()).is_bare());
        assert!(!Token::new("", loc).is_bare());
    }
}
