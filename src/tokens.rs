use crate::client::ChatMessage;

/// Rough token estimate for one message body: ~3 chars per token or one per
/// word, whichever is larger.
fn estimate_token_count(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    let approx_from_chars = text.chars().count().div_ceil(3);
    let approx_from_words = text.split_whitespace().count();

    approx_from_chars.max(approx_from_words) as u32
}

/// Estimated prompt size, with a small allowance per message for role framing.
pub fn estimate_prompt_tokens(messages: &[ChatMessage]) -> u32 {
    messages
        .iter()
        .map(|message| estimate_token_count(&message.content) + 4)
        .sum()
}

/// Completion tokens to request: what fits in the context window after the
/// prompt, capped at `max_completion`.
///
/// A full ProgramSpec for seven days is well over a thousand tokens, so the
/// budget never drops below [`MIN_PROGRAM_COMPLETION_TOKENS`] even when the
/// estimate says the window is tight; the provider reports the overflow.
pub fn completion_budget(context_window: u32, max_completion: u32, messages: &[ChatMessage]) -> u32 {
    let available = context_window.saturating_sub(estimate_prompt_tokens(messages));
    available
        .min(max_completion)
        .max(MIN_PROGRAM_COMPLETION_TOKENS.min(max_completion))
}

pub const MIN_PROGRAM_COMPLETION_TOKENS: u32 = 1024;
