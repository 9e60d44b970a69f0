//! Key labels and on-screen key tips.

use crate::constants::TIP_GAP;

/// Short on-screen label for a key name as the stimulus runner reports it.
pub fn key_label(key_name: &str) -> &str {
    match key_name {
        "LeftArrow" => "←",
        "RightArrow" => "→",
        "ESCAPE" => "Esc",
        other => other,
    }
}

/// `"←   Same          Different   →"`: left key with its text, a gap, then
/// the right text with its key.
pub fn tip_pair(left_key: &str, left_text: &str, right_key: &str, right_text: &str) -> String {
    tip_pair_with_gap(left_key, left_text, right_key, right_text, TIP_GAP)
}

pub fn tip_pair_with_gap(
    left_key: &str,
    left_text: &str,
    right_key: &str,
    right_text: &str,
    gap: usize,
) -> String {
    format!(
        "{}   {}{}{}   {}",
        key_label(left_key),
        left_text,
        " ".repeat(gap),
        right_text,
        key_label(right_key),
    )
}
