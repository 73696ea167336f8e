//! File access modes, spelled the way h5py spells them.

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// How a [`File`](crate::File) is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// `r`: read-only, the file must exist.
    Read,
    /// `r+`: read/write, the file must exist.
    ReadWrite,
    /// `w`: create, truncating any existing file.
    Truncate,
    /// `a`: read/write, created if absent.
    #[default]
    Append,
    /// `x` or `w-`: create, failing if the file exists.
    Exclusive,
}

impl Mode {
    pub fn is_writable(self) -> bool {
        self != Mode::Read
    }

    /// Whether opening starts from an empty tree rather than the file on disk.
    pub fn starts_empty(self) -> bool {
        matches!(self, Mode::Truncate | Mode::Exclusive)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Read => "r",
            Mode::ReadWrite => "r+",
            Mode::Truncate => "w",
            Mode::Append => "a",
            Mode::Exclusive => "x",
        }
    }
}

impl FromStr for Mode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(Mode::Read),
            "r+" => Ok(Mode::ReadWrite),
            "w" => Ok(Mode::Truncate),
            "a" => Ok(Mode::Append),
            "x" | "w-" => Ok(Mode::Exclusive),
            other => Err(StoreError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_spellings() {
        let cases = [
            ("r", Mode::Read),
            ("r+", Mode::ReadWrite),
            ("w", Mode::Truncate),
            ("a", Mode::Append),
            ("x", Mode::Exclusive),
            ("w-", Mode::Exclusive),
        ];
        for (s, mode) in cases {
            assert_eq!(s.parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn reject_unknown() {
        assert!(matches!("rw".parse::<Mode>(), Err(StoreError::InvalidMode(_))));
    }

    #[test]
    fn only_read_is_read_only() {
        assert!(!Mode::Read.is_writable());
        assert!(Mode::Append.is_writable());
        assert_eq!(Mode::default(), Mode::Append);
    }
}
