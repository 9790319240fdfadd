//! Project tier scopes.

use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorKind, Result};

/// The mutually exclusive folders a project file can live under.
///
/// `Archive` mirrors the game-file namespace (this is the scope that
/// shadows the archive base during combined resolution); `Raw` holds loose
/// converted files; `Resources` holds auxiliary text resources shipped with
/// the mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectScope {
    Archive,
    Raw,
    Resources,
}

impl ProjectScope {
    pub const ALL: [ProjectScope; 3] = [Self::Archive, Self::Raw, Self::Resources];

    /// Directory name under the project root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Raw => "raw",
            Self::Resources => "resources",
        }
    }
}

impl fmt::Display for ProjectScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for ProjectScope {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "archive" => Ok(Self::Archive),
            "raw" => Ok(Self::Raw),
            "resources" => Ok(Self::Resources),
            other => exn::bail!(ErrorKind::UnknownScope(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for scope in ProjectScope::ALL {
            assert_eq!(scope.dir_name().parse::<ProjectScope>().unwrap(), scope);
        }
        assert!("depot".parse::<ProjectScope>().is_err());
    }
}
