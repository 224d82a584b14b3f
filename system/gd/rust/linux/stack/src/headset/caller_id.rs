//! Caller id formatting for `+CLIP` and `+CCWA`.

use crate::headset::at::BTA_AG_AT_MAX_LEN;
use crate::headset::hfp::BTHF_CALL_ADDRTYPE_INTERNATIONAL;
use log::warn;

pub const BTA_AG_CLIP_TYPE_MIN: u16 = 128;
pub const BTA_AG_CLIP_TYPE_MAX: u16 = 175;
pub const BTA_AG_CLIP_TYPE_DEFAULT: u16 = 129;
pub const BTA_AG_CLIP_TYPE_VOIP: u16 = 255;

/// Characters of the line that are not number or name: quotes, the `+` prefix, separators, the
/// type and the terminator.
const CALLER_ID_OVERHEAD: usize = 13;

/// Shortens `s` by at least `by` bytes, keeping it on a character boundary.
fn shrink(s: &mut String, by: usize) {
    let mut len = s.len().saturating_sub(by);
    while !s.is_char_boundary(len) {
        len -= 1;
    }
    s.truncate(len);
}

/// Returns `call_type` if it is a valid `+CLIP` type, or the default type otherwise.
pub fn clip_type(call_type: u16) -> u16 {
    if (BTA_AG_CLIP_TYPE_MIN..=BTA_AG_CLIP_TYPE_MAX).contains(&call_type)
        || call_type == BTA_AG_CLIP_TYPE_VOIP
    {
        call_type
    } else {
        BTA_AG_CLIP_TYPE_DEFAULT
    }
}

/// Formats `"[+]number",type[,,,"name"]`.
///
/// The result fits an AT line: when it would not, the name is shortened first and the number only
/// once the name is gone. The name is never sent with a waiting call.
pub fn format(number: &str, call_type: u16, name: Option<&str>, call_waiting: bool) -> String {
    let mut number = number.to_string();
    let mut name = name.unwrap_or("").to_string();

    let overflow =
        (CALLER_ID_OVERHEAD + number.len() + name.len()).saturating_sub(BTA_AG_AT_MAX_LEN);
    if overflow > 0 {
        warn!("Caller id overflows the AT line by {} bytes, truncating", overflow);
        if overflow > name.len() {
            shrink(&mut number, overflow - name.len());
            name.clear();
        } else {
            shrink(&mut name, overflow);
        }
    }

    let mut caller_id = String::with_capacity(BTA_AG_AT_MAX_LEN);
    caller_id.push('"');
    if call_type == BTHF_CALL_ADDRTYPE_INTERNATIONAL && !number.starts_with('+') {
        caller_id.push('+');
    }
    caller_id.push_str(&number);
    caller_id.push_str(&format!("\",{}", clip_type(call_type)));

    if !call_waiting && !name.is_empty() {
        caller_id.push_str(&format!(",,,\"{}\"", name));
    }
    caller_id
}
