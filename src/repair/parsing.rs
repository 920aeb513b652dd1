use serde_json::Value;

/// Read model text as a JSON value.
///
/// The whole text is tried first. Failing that, `<think>` blocks are dropped
/// and each balanced `{...}` object is tried in order, which covers code
/// fences and prose around the object, including prose that itself contains
/// braces. Scanning stops at the first `{` that is never closed.
pub(crate) fn parse_candidate(raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    let direct = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    let cleaned = strip_think_blocks(trimmed);
    let mut first_error = None;
    let mut from = 0;
    while let Some(offset) = cleaned[from..].find('{') {
        let start = from + offset;
        let Some(fragment) = balanced_object_at(&cleaned, start) else {
            break;
        };
        match serde_json::from_str::<Value>(fragment) {
            Ok(value) => return Ok(value),
            Err(err) => {
                first_error.get_or_insert_with(|| err.to_string());
            }
        }
        from = start + fragment.len();
    }

    Err(first_error.unwrap_or_else(|| format!("no JSON object found in response ({direct})")))
}

fn strip_think_blocks(input: &str) -> String {
    let mut cleaned = input.to_string();

    while let Some(think_start) = cleaned.find("<think>") {
        match cleaned[think_start..].find("</think>") {
            Some(think_end_pos) => {
                let absolute_end = think_start + think_end_pos + "</think>".len();
                cleaned.replace_range(think_start..absolute_end, "");
            }
            None => {
                cleaned.replace_range(think_start.., "");
                break;
            }
        }
    }

    cleaned
}

/// The balanced object opening at byte `start`, skipping braces in strings.
fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + idx]);
                }
            }
            _ => {}
        }
    }

    None
}
