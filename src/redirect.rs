//! Redirect boundary for `/r/{short_code}` aliases.

use log::{debug, warn};

use crate::error::PersistenceError;
use crate::store::{is_short_code, DynamicCodeStore};

/// Path prefix of alias URLs.
pub const ALIAS_PREFIX: &str = "/r/";

/// What the host should do with an alias request. Both outcomes are terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedirectOutcome {
    Navigate { target_url: String },
    NotFound,
}

/// Extracts the short code from an alias path such as `/r/aZ3kQ9`.
///
/// The whole remainder must match `[A-Za-z0-9]+`; a trailing slash or any
/// other character yields `None`.
pub fn parse_alias_path(path: &str) -> Option<&str> {
    let code = path.strip_prefix(ALIAS_PREFIX)?;
    is_short_code(code).then_some(code)
}

/// Resolves an alias request against `store`.
///
/// Looks the code up, records the scan, then navigates. A failed scan record
/// is logged and does not hold up the redirect.
///
/// # Errors
///
/// Only backend failures of the lookup itself are returned; unknown and
/// malformed codes resolve to [`RedirectOutcome::NotFound`].
pub fn resolve<S: DynamicCodeStore>(
    store: &S,
    path: &str,
    user_agent: &str,
) -> Result<RedirectOutcome, PersistenceError> {
    let Some(code) = parse_alias_path(path) else {
        debug!("malformed alias path {path:?}");
        return Ok(RedirectOutcome::NotFound);
    };
    let record = match store.get_by_short_code(code) {
        Ok(record) => record,
        Err(PersistenceError::NotFound(_)) => {
            debug!("no dynamic code {code}");
            return Ok(RedirectOutcome::NotFound);
        }
        Err(err) => return Err(err),
    };
    if let Err(err) = store.record_scan(code, user_agent) {
        warn!("failed to record scan of {code}: {err}");
    }
    Ok(RedirectOutcome::Navigate { target_url: record.target_url })
}
