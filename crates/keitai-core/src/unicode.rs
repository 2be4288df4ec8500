//! Character-level helpers for UCS-2 based character classification.

/// Number of code points covered by the per-character category tables.
pub const UCS2_SIZE: usize = 0x10000;

/// Returns the UCS-2 code unit for `c`, or `None` for characters outside the
/// Basic Multilingual Plane (those are written as surrogate pairs in UTF-16
/// and cannot be classified individually).
pub fn ucs2_code(c: char) -> Option<u16> {
    u16::try_from(c as u32).ok()
}

/// Check whether a character needs a surrogate pair in UTF-16.
pub fn is_supplementary(c: char) -> bool {
    ucs2_code(c).is_none()
}

/// Decode UTF-16 into a `String`, replacing unpaired surrogates with U+FFFD.
///
/// Returns the decoded text and whether any replacement happened.
pub fn decode_utf16_lossy(units: &[u16]) -> (String, bool) {
    let mut replaced = false;
    let text = char::decode_utf16(units.iter().copied())
        .map(|r| {
            r.unwrap_or_else(|_| {
                replaced = true;
                char::REPLACEMENT_CHARACTER
            })
        })
        .collect();
    (text, replaced)
}

/// Encode UTF-16 code units as UTF-8 bytes.
///
/// Returns `None` when the input contains an unpaired surrogate: such a
/// sequence has no UTF-8 encoding and therefore cannot match any key.
pub fn utf16_to_utf8(units: &[u16]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(units.len() * 3);
    let mut buf = [0u8; 4];
    for r in char::decode_utf16(units.iter().copied()) {
        let c = r.ok()?;
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
    Some(out)
}
