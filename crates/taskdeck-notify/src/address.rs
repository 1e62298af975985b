//! Contact-address normalization.
//!
//! Raw addresses arrive from user records in whatever shape people typed
//! them: spaces, dashes, a leading `+` or `0`, with or without a country
//! prefix. The delivery agent wants digits only with the routing prefix
//! applied, so everything funnels through [`normalize`] before touching a
//! channel.

use taskdeck_common::types::NormalizedAddress;

use crate::error::{NotifyError, Result};

/// Length of a bare local subscriber number in the reference market.
const LOCAL_SUBSCRIBER_DIGITS: usize = 10;

/// Canonicalizes a raw contact address into a channel-routable identifier.
///
/// Rules, applied in order:
/// 1. Strip every non-digit character.
/// 2. Drop leading zeros (local dialing convention).
/// 3. If exactly 10 digits remain, prepend `default_prefix`.
///
/// Idempotent: normalizing an already-normalized address returns it
/// unchanged.
///
/// # Errors
///
/// [`NotifyError::InvalidAddress`] when nothing remains after stripping.
pub fn normalize(raw: &str, default_prefix: &str) -> Result<NormalizedAddress> {
    let stripped: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    // All leading zeros go, not just the first: an output that still began
    // with a zero would normalize differently on the second pass.
    let mut digits = stripped.trim_start_matches('0').to_string();

    if digits.is_empty() {
        return Err(NotifyError::InvalidAddress(format!(
            "no digits in {raw:?}"
        )));
    }

    if digits.len() == LOCAL_SUBSCRIBER_DIGITS {
        digits.insert_str(0, default_prefix);
    }

    Ok(NormalizedAddress::new_unchecked(digits))
}
