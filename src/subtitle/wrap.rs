//! Line wrapping by script class.
//!
//! Logographic text has no spaces to break on and every glyph is roughly full-width, so it
//! is cut into fixed-size runs of characters. Space-delimited text is wrapped greedily at
//! word boundaries under a looser budget.

/// Per-class characters-per-line budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrapBudget {
    pub logographic: usize,
    pub spaced: usize,
}

impl WrapBudget {
    pub fn for_class(self, class: ScriptClass) -> usize {
        match class {
            ScriptClass::Logographic => self.logographic.max(1),
            ScriptClass::Spaced => self.spaced.max(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptClass {
    Logographic,
    Spaced,
}

/// Han, kana, CJK punctuation and full-width forms.
pub fn is_logographic_char(c: char) -> bool {
    matches!(c as u32,
        0x2E80..=0x2FDF      // CJK radicals, Kangxi radicals
        | 0x3000..=0x30FF    // CJK symbols and punctuation, Hiragana, Katakana
        | 0x3100..=0x312F    // Bopomofo
        | 0x31F0..=0x31FF    // Katakana phonetic extensions
        | 0x3400..=0x4DBF    // CJK extension A
        | 0x4E00..=0x9FFF    // CJK unified ideographs
        | 0xF900..=0xFAFF    // CJK compatibility ideographs
        | 0xFF00..=0xFFEF    // half-width and full-width forms
        | 0x20000..=0x2FA1F  // CJK extensions B..F, compatibility supplement
    )
}

/// Logographic when at least half of the visible characters are logographic.
pub fn classify(text: &str) -> ScriptClass {
    let mut visible = 0usize;
    let mut wide = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        visible += 1;
        if is_logographic_char(c) {
            wide += 1;
        }
    }
    if visible > 0 && wide * 2 >= visible {
        ScriptClass::Logographic
    } else {
        ScriptClass::Spaced
    }
}

/// Wrap `text` into lines no longer than the budget for its class. Explicit newlines are
/// kept as hard breaks; blank lines are dropped.
pub fn wrap_lines(text: &str, budget: WrapBudget) -> Vec<String> {
    let class = classify(text);
    let max = budget.for_class(class);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        match class {
            ScriptClass::Logographic => wrap_by_chars(paragraph, max, &mut lines),
            ScriptClass::Spaced => wrap_by_words(paragraph, max, &mut lines),
        }
    }
    lines
}

fn wrap_by_chars(paragraph: &str, max: usize, out: &mut Vec<String>) {
    let chars: Vec<char> = paragraph.trim().chars().collect();
    for chunk in chars.chunks(max) {
        let line: String = chunk.iter().collect();
        let line = line.trim();
        if !line.is_empty() {
            out.push(line.to_string());
        }
    }
}

fn wrap_by_words(paragraph: &str, max: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in paragraph.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max {
            if current_len > 0 {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(max).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    out.push(piece.iter().collect());
                } else {
                    current = piece.iter().collect();
                    current_len = piece.len();
                }
            }
            continue;
        }
        let needed = if current_len == 0 {
            word_len
        } else {
            current_len + 1 + word_len
        };
        if needed > max && current_len > 0 {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if current_len > 0 {
        out.push(current);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/subtitle/wrap.rs"]
mod tests;
