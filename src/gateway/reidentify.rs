/// Stands in for the follow-up recipient. Distinct from the catalog's name
/// tag so that only the caller-supplied recipient is ever restored.
pub const IDENTITY_PLACEHOLDER: &str = "[PATIENT_NAME]";

/// Follow-up messages stay under 200 words.
pub const FOLLOW_UP_MAX_WORDS: usize = 199;

/// Put the caller's own value back wherever the provider echoed the
/// placeholder. Nothing the provider produced is treated as an identity.
pub fn restore_identity(text: &str, original: &str) -> String {
    text.replace(IDENTITY_PLACEHOLDER, original)
}

/// Restore the recipient in generated text. When the provider dropped the
/// placeholder, the message is opened with a greeting by name instead.
pub fn address_recipient(text: &str, original: &str) -> String {
    let name = original.trim();
    if text.contains(IDENTITY_PLACEHOLDER) || name.is_empty() {
        restore_identity(text, name)
    } else {
        format!("Dear {name},\n\n{}", text.trim_start())
    }
}

/// Cut `text` after `max_words` whitespace-separated words, keeping the
/// original spacing of what remains.
pub fn limit_words(text: &str, max_words: usize) -> String {
    let mut words = 0;
    let mut in_word = false;
    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
            if words > max_words {
                return text[..i].trim_end().to_string();
            }
        }
    }
    text.to_string()
}
