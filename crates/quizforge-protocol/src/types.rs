//! Identity types shared by every layer above the transport.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// The short code a room is known by, e.g. `K7X2`.
///
/// A newtype over `String` so a code can never be confused with a display
/// name. Construction goes through [`RoomCode::parse`] or
/// [`RoomCode::random`], both of which guarantee the canonical form:
/// exactly [`RoomCode::LENGTH`] characters from [`RoomCode::ALPHABET`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in a room code.
    pub const LENGTH: usize = 4;

    /// Characters a room code is drawn from.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Draws a random code. Uniqueness is the registry's job, not ours.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let code = (0..Self::LENGTH)
            .map(|_| {
                let i = rng.random_range(0..Self::ALPHABET.len());
                Self::ALPHABET[i] as char
            })
            .collect();
        Self(code)
    }

    /// Parses user input into a code. Surrounding whitespace is ignored and
    /// lowercase letters are accepted.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let code = input.trim().to_ascii_uppercase();
        let well_formed = code.len() == Self::LENGTH
            && code.bytes().all(|b| Self::ALPHABET.contains(&b));
        if !well_formed {
            return Err(ProtocolError::InvalidRoomCode(input.to_string()));
        }
        Ok(Self(code))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Display names
// ---------------------------------------------------------------------------

/// Characters that delimit fields in server lines and therefore cannot
/// appear inside a name.
const NAME_DELIMITERS: [char; 3] = [',', ':', '|'];

/// Longest display name accepted.
const MAX_NAME_LEN: usize = 32;

/// Trims and validates a display name, returning the canonical form.
pub fn validate_display_name(input: &str) -> Result<String, ProtocolError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(ProtocolError::InvalidName("name cannot be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ProtocolError::InvalidName(format!(
            "name cannot be longer than {MAX_NAME_LEN} characters"
        )));
    }
    if name.contains(NAME_DELIMITERS) {
        return Err(ProtocolError::InvalidName(
            "name cannot contain ',', ':' or '|'".into(),
        ));
    }
    Ok(name.to_string())
}
