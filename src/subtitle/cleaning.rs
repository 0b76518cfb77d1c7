use once_cell::sync::Lazy;
use regex::Regex;

// @module: OCR text cleanup

// @const: Typographic double quotes
static DOUBLE_QUOTE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[«‹»›„“‟”❝❞❮❯〝〞〟＂]"#).unwrap());

// @const: Typographic single quotes, backtick and acute accent
static SINGLE_QUOTE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[‘‛’❛❜`´]").unwrap());

// @const: Anything outside letters, numbers, punctuation, math/currency symbols and spaces
static DISALLOWED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{Lu}\p{Ll}\p{Lt}\p{Nd}\p{Nl}\p{No}\p{Pc}\p{Pd}\p{Ps}\p{Pe}\p{Pi}\p{Pf}\p{Po}\p{Sm}\p{Sc}\p{Zs}]")
        .unwrap()
});

// @const: Same as above but also keeping modifier and other letters (CJK, kana, ...)
static DISALLOWED_KEEP_OTHER_LETTERS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{L}\p{Nd}\p{Nl}\p{No}\p{Pc}\p{Pd}\p{Ps}\p{Pe}\p{Pi}\p{Pf}\p{Po}\p{Sm}\p{Sc}\p{Zs}]")
        .unwrap()
});

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// @const: Line breaks as real newlines or as escaped \n / \N sequences
static LINE_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\r|\n|\\[nN]").unwrap());

static SPACE_BEFORE_MARK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([,.!?…])").unwrap());
static MISSING_SPACE_AFTER_MARK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([,.!?…])([^\s,.!?…])").unwrap());
static SPACE_BETWEEN_MARKS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([,.!?…])\s+([,.!?…])").unwrap());

/// Text cleaner applied to every recognized caption
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCleaner {
    /// Repair spacing around `, . ! ? …`
    pub fix_punctuation_spacing: bool,
    /// Keep letters outside the cased categories (CJK, kana, ...)
    pub keep_other_letters: bool,
}

impl TextCleaner {
    pub fn new(fix_punctuation_spacing: bool, keep_other_letters: bool) -> Self {
        Self {
            fix_punctuation_spacing,
            keep_other_letters,
        }
    }

    /// Clean each line separately, dropping lines left empty
    pub fn clean(&self, text: &str) -> String {
        LINE_BREAK_REGEX
            .split(text)
            .map(|line| self.clean_line(line))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn clean_line(&self, line: &str) -> String {
        let line = normalize_quotes(line);
        let line = WHITESPACE_REGEX.replace_all(&line, " ");

        let disallowed = if self.keep_other_letters {
            &*DISALLOWED_KEEP_OTHER_LETTERS_REGEX
        } else {
            &*DISALLOWED_REGEX
        };
        let line = disallowed.replace_all(&line, "");

        let mut line = collapse_whitespace(&line);
        if self.fix_punctuation_spacing {
            line = fix_punctuation_spacing(&line);
        }
        line
    }
}

/// Replace quotation-mark variants with ASCII `"` and `'`
pub fn normalize_quotes(text: &str) -> String {
    let text = DOUBLE_QUOTE_REGEX.replace_all(text, "\"");
    SINGLE_QUOTE_REGEX.replace_all(&text, "'").into_owned()
}

/// Trim and reduce any whitespace run to a single space
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}

/// No space before `, . ! ? …`, one space after, none between consecutive marks
pub fn fix_punctuation_spacing(text: &str) -> String {
    let text = SPACE_BEFORE_MARK_REGEX.replace_all(text, "$1");
    let text = MISSING_SPACE_AFTER_MARK_REGEX.replace_all(&text, "$1 $2");
    let text = SPACE_BETWEEN_MARKS_REGEX.replace_all(&text, "$1$2");
    text.trim().to_string()
}
