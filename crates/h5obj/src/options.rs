//! Encoding and decoding options.

use std::fmt;
use std::str::FromStr;

/// Which persistence line to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Every node carries a type tag and nested values become groups.
    #[default]
    Tagged,
    /// Store natively when the store can give the value back unchanged,
    /// pickle otherwise. No type tags.
    PickleFirst,
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tagged" => Ok(Profile::Tagged),
            "pickle-first" | "pickle_first" | "pickle" => Ok(Profile::PickleFirst),
            other => Err(format!("unknown profile {other:?} (expected tagged or pickle-first)")),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Profile::Tagged => "tagged",
            Profile::PickleFirst => "pickle-first",
        })
    }
}

/// Options shared by the encoder and decoder.
///
/// ```
/// use h5obj::{Options, Profile};
///
/// let opts = Options::new().with_profile(Profile::PickleFirst).with_overwrite(false);
/// assert!(opts.pickle);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub profile: Profile,
    /// Fall back to pickling values with no native form.
    pub pickle: bool,
    /// Unpickle serialized payloads on read.
    pub unpickle: bool,
    /// Replace an existing node of the same name.
    pub overwrite: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            profile: Profile::Tagged,
            pickle: true,
            unpickle: true,
            overwrite: true,
        }
    }
}

impl Options {
    pub fn new() -> Options {
        Options::default()
    }

    pub fn with_profile(mut self, profile: Profile) -> Options {
        self.profile = profile;
        self
    }

    pub fn with_pickle(mut self, pickle: bool) -> Options {
        self.pickle = pickle;
        self
    }

    pub fn with_unpickle(mut self, unpickle: bool) -> Options {
        self.unpickle = unpickle;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Options {
        self.overwrite = overwrite;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = Options::default();
        assert_eq!(o.profile, Profile::Tagged);
        assert!(o.pickle && o.unpickle && o.overwrite);
    }

    #[test]
    fn profile_names() {
        for p in [Profile::Tagged, Profile::PickleFirst] {
            assert_eq!(p.to_string().parse::<Profile>(), Ok(p));
        }
        assert!("json".parse::<Profile>().is_err());
    }
}
