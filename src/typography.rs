//! Russian typographic normalization of cell text.
//!
//! Rules run in a fixed order and later rules rely on earlier substitutions.
//! The pipeline is pure and idempotent, and it never touches line breaks.

use regex::{Captures, Regex};
use std::sync::OnceLock;

pub const NBSP: char = '\u{00A0}';
pub const NB_HYPHEN: char = '\u{2011}';
pub const WORD_JOINER: char = '\u{2060}';
pub const EN_DASH: char = '\u{2013}';
pub const EM_DASH: char = '\u{2014}';

/// Prepositions, conjunctions and particles that must not end a line
const SHORT_WORDS: &[&str] = &[
    "а", "в", "и", "к", "о", "с", "у", "я", "во", "да", "до", "же", "за", "из", "ко", "ли", "на",
    "не", "ни", "но", "об", "от", "по", "со", "то", "уж", "без", "для", "как", "над", "обо",
    "или", "при", "про", "что",
];

/// Address abbreviations bound to the token after them
const ADDRESS_ABBREVIATIONS: &[&str] = &[
    "ул", "пр", "пр-т", "просп", "пер", "пл", "б-р", "наб", "ш", "д", "корп", "к", "стр", "кв",
    "оф", "пом", "эт", "г", "пос", "пгт", "п", "с", "дер", "мкр", "р-н", "обл", "им", "уч",
];

/// Unit abbreviations bound to the number before them
const UNIT_ABBREVIATIONS: &[&str] = &[
    "тыс", "млн", "млрд", "трлн", "руб", "коп", "шт", "чел", "ед", "экз", "кг", "г", "т", "км",
    "м", "см", "мм", "л", "га", "ч", "мин", "сек", "мес", "кв", "куб",
];

/// Unit symbols without a trailing dot
const UNIT_SYMBOLS: &[&str] = &["км²", "см²", "мм²", "дм²", "м²", "км³", "см³", "мм³", "дм³", "м³", "%"];

/// Single-letter prefixes forming км, см, мм, дм
const AREA_UNIT_PREFIXES: &[char] = &['к', 'с', 'м', 'д'];

/// Compiled rule set. Build once and reuse; [`normalize`] uses a shared instance.
#[derive(Debug)]
pub struct TypographyNormalizer {
    short_word: Regex,
    abbreviation: Regex,
    address_comma: Regex,
    unit_after_number: Regex,
    symbol_after_number: Regex,
    parenthetical: Regex,
    sentence_dash: Regex,
}

impl Default for TypographyNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TypographyNormalizer {
    pub fn new() -> Self {
        let short_words = alternation(SHORT_WORDS);
        let abbreviations = alternation(ADDRESS_ABBREVIATIONS);
        let units = alternation(UNIT_ABBREVIATIONS);
        let symbols = alternation(UNIT_SYMBOLS);

        Self {
            short_word: compile(&format!(r"(?i)(^|[\s(«\x{{2060}}№)])({})[ \t]+", short_words)),
            abbreviation: compile(&format!(r"(?i)(^|[^\p{{L}}\-])({})\.[ \t]+", abbreviations)),
            address_comma: compile(r",[ \t]+([0-9])"),
            unit_after_number: compile(&format!(r"(?i)([0-9])[ \t]*({})\.", units)),
            symbol_after_number: compile(&format!(r"([0-9])[ \t]+({})", symbols)),
            parenthetical: compile(r"[ \t]*\x{2060}?\(([^()\n]*)\)\x{2060}?"),
            sentence_dash: compile(r"[ \t\x{A0}]+-[ \t]+"),
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        if text.trim() == "-" {
            return EN_DASH.to_string();
        }

        let text = superscript_units(text);
        let text = guillemets(&text);
        let text = replace_until_stable(&self.short_word, text, |caps| {
            format!("{}{}{}", &caps[1], &caps[2], NBSP)
        });
        let text = replace_until_stable(&self.abbreviation, text, |caps| {
            format!("{}{}.{}", &caps[1], &caps[2], NBSP)
        });
        let text = self
            .address_comma
            .replace_all(&text, |caps: &Captures| format!(",{}{}", NBSP, &caps[1]))
            .into_owned();
        let text = self
            .unit_after_number
            .replace_all(&text, |caps: &Captures| format!("{}{}{}.", &caps[1], NBSP, &caps[2]))
            .into_owned();
        let text = self
            .symbol_after_number
            .replace_all(&text, |caps: &Captures| format!("{}{}{}", &caps[1], NBSP, &caps[2]))
            .into_owned();
        let text = bind_numero(&text);
        let text = self
            .parenthetical
            .replace_all(&text, protect_parenthetical)
            .into_owned();
        let text = numeric_ranges(&text);
        let text = replace_until_stable(&self.sentence_dash, text, |_| format!("{}{} ", NBSP, EM_DASH));
        group_thousands(&text)
    }
}

/// Normalize with the shared default rule set.
pub fn normalize(text: &str) -> String {
    static NORMALIZER: OnceLock<TypographyNormalizer> = OnceLock::new();
    NORMALIZER.get_or_init(TypographyNormalizer::new).normalize(text)
}

/// Text as drawn and measured: joiners removed, non-breaking marks replaced
/// by their plain glyphs. Break decisions must be made before this.
pub fn display_text(text: &str) -> String {
    text.chars()
        .filter(|c| *c != WORD_JOINER)
        .map(|c| match c {
            NBSP => ' ',
            NB_HYPHEN => '-',
            other => other,
        })
        .collect()
}

// ============================================================================
// Rule Helpers
// ============================================================================

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("typography pattern is valid")
}

/// Longest alternatives first so a prefix never shadows a longer word
fn alternation(words: &[&str]) -> String {
    let mut sorted: Vec<&str> = words.to_vec();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    sorted
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

/// Patterns that consume their left boundary miss adjacent matches on one
/// pass; rerun until nothing changes. Every pass removes at least one plain
/// space, so this terminates.
fn replace_until_stable<F>(re: &Regex, text: String, rep: F) -> String
where
    F: Fn(&Captures) -> String,
{
    let mut current = text;
    loop {
        let next = re.replace_all(&current, |caps: &Captures| rep(caps)).into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// м2 -> м², км3 -> км³
fn superscript_units(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for i in 1..chars.len() {
        let sup = match chars[i] {
            '2' => '²',
            '3' => '³',
            _ => continue,
        };
        if chars[i - 1] != 'м' {
            continue;
        }
        // grouping may later put a non-breaking space between the digits
        let next = chars[i + 1..].iter().find(|c| **c != NBSP);
        if next.is_some_and(|c| c.is_alphanumeric()) {
            continue;
        }
        let mut start = i - 1;
        if start >= 1 && AREA_UNIT_PREFIXES.contains(&chars[start - 1]) {
            start -= 1;
        }
        if start >= 1 && chars[start - 1].is_alphabetic() {
            continue;
        }
        chars[i] = sup;
    }
    chars.into_iter().collect()
}

fn guillemets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if c == '"' {
            let opening = match prev {
                None => true,
                Some(p) => p.is_whitespace() || p == '(' || p == NBSP,
            };
            out.push(if opening { '«' } else { '»' });
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// № is always followed by exactly one non-breaking space before its token
fn bind_numero(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c != '№' {
            continue;
        }
        let mut j = i;
        while j < chars.len() && matches!(chars[j], ' ' | '\t' | NBSP) {
            j += 1;
        }
        if j < chars.len() && !chars[j].is_whitespace() {
            out.push(NBSP);
            i = j;
        }
    }
    out
}

fn protect_parenthetical(caps: &Captures) -> String {
    let whole = &caps[0];
    let lead = if whole.starts_with([' ', '\t']) {
        NBSP.to_string()
    } else {
        String::new()
    };
    let inner: String = caps[1]
        .chars()
        .map(|c| match c {
            '-' => NB_HYPHEN,
            ' ' | '\t' => NBSP,
            other => other,
        })
        .collect();
    format!("{}{}({}){}", lead, WORD_JOINER, inner, WORD_JOINER)
}

/// A non-breaking space between digits separates thousand groups
fn is_group_separator(chars: &[char], i: usize) -> bool {
    chars.get(i) == Some(&NBSP)
        && i > 0
        && chars[i - 1].is_ascii_digit()
        && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

/// 2024-2030 -> 2024–2030 for 2-4 digit groups that stand on their own
fn numeric_ranges(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for h in 0..chars.len() {
        if chars[h] != '-' {
            continue;
        }

        let mut start = h;
        while start > 0 && chars[start - 1].is_ascii_digit() {
            start -= 1;
        }
        if !(2..=4).contains(&(h - start)) {
            continue;
        }
        if start > 0 && is_group_separator(&chars, start - 1) {
            continue;
        }

        let mut end = h + 1;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }
        if !(2..=4).contains(&(end - h - 1)) {
            continue;
        }
        if is_group_separator(&chars, end) {
            continue;
        }

        chars[h] = EN_DASH;
    }
    chars.into_iter().collect()
}

fn is_year(run: &[char]) -> bool {
    run.len() == 4 && matches!((run[0], run[1]), ('1', '9') | ('2', '0'))
}

/// Digits right after a decimal separator belong to a fraction
fn is_fraction(chars: &[char], start: usize) -> bool {
    start >= 2 && matches!(chars[start - 1], ',' | '.') && chars[start - 2].is_ascii_digit()
}

/// 1234567 -> 1 234 567 with non-breaking spaces; years stay intact
fn group_thousands(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let run = &chars[start..i];

        if run.len() < 4 || is_year(run) || is_fraction(&chars, start) {
            out.extend(run);
            continue;
        }

        let head = match run.len() % 3 {
            0 => 3,
            n => n,
        };
        out.extend(&run[..head]);
        for group in run[head..].chunks(3) {
            out.push(NBSP);
            out.extend(group);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Readable expectations: `_` stands for a non-breaking space, `~` for a word joiner.
    fn n(s: &str) -> String {
        s.replace('_', "\u{00A0}").replace('~', "\u{2060}")
    }

    #[test]
    fn hyphen_only_cell_becomes_en_dash() {
        assert_eq!(normalize("-"), "–");
        assert_eq!(normalize("   -   "), "–");
        assert_eq!(normalize("\t-\n"), "–");
        assert_eq!(normalize("–"), "–");
    }

    #[test]
    fn blank_values_are_untouched() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "   ");
        assert_eq!(normalize("\n\n"), "\n\n");
    }

    #[test]
    fn unit_superscripts() {
        assert_eq!(normalize("площадь 50 м2"), n("площадь 50_м²"));
        assert_eq!(normalize("объём 3 м3"), n("объём 3_м³"));
        assert_eq!(normalize("12 км2"), n("12_км²"));
        assert_eq!(normalize("кв.м2"), "кв.м²");
        // not a unit token
        assert_eq!(normalize("тм2"), "тм2");
        assert_eq!(normalize("м22"), "м22");
    }

    #[test]
    fn unit_followed_by_grouped_digits_stays_plain() {
        assert_eq!(normalize("км2219"), n("км2_219"));
        assert_eq!(normalize("м2202419"), n("м2_202_419"));
        assert_eq!(normalize("м2м."), n("м2_м."));
    }

    #[test]
    fn quotes_become_guillemets() {
        assert_eq!(normalize("\"Рога и копыта\""), n("«Рога и_копыта»"));
        assert_eq!(normalize("ООО \"Вектор\""), "ООО «Вектор»");
        assert_eq!(normalize("(\"Мир\")"), "~(«Мир»)~".replace('~', "\u{2060}"));
    }

    #[test]
    fn short_words_bind_to_next_word() {
        assert_eq!(normalize("дом в городе"), n("дом в_городе"));
        assert_eq!(normalize("В городе"), n("В_городе"));
        assert_eq!(normalize("и в на доме"), n("и_в_на_доме"));
        // only standalone words
        assert_eq!(normalize("вода течёт"), "вода течёт");
    }

    #[test]
    fn year_is_not_grouped() {
        assert_eq!(normalize("в 2024 году"), n("в_2024 году"));
        assert_eq!(normalize("1999"), "1999");
        assert_eq!(normalize("1234"), n("1_234"));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(normalize("12345"), n("12_345"));
        assert_eq!(normalize("1234567"), n("1_234_567"));
        assert_eq!(normalize("123"), "123");
        assert_eq!(normalize("20245"), n("20_245"));
    }

    #[test]
    fn decimal_fraction_is_not_grouped() {
        assert_eq!(normalize("1234,5678"), n("1_234,5678"));
        assert_eq!(normalize("0,12345"), "0,12345");
        assert_eq!(normalize("12345,5"), n("12_345,5"));
    }

    #[test]
    fn address_binding() {
        assert_eq!(normalize("ул. Ленина, 12"), n("ул._Ленина,_12"));
        assert_eq!(normalize("д. 5, кв. 7"), n("д._5, кв._7"));
        assert_eq!(normalize("г. Москва"), n("г._Москва"));
    }

    #[test]
    fn units_after_numbers() {
        assert_eq!(normalize("5 тыс. руб."), n("5_тыс. руб."));
        assert_eq!(normalize("10кг."), n("10_кг."));
        assert_eq!(normalize("100 %"), n("100_%"));
        assert_eq!(normalize("12000 руб."), n("12_000_руб."));
    }

    #[test]
    fn numero_binding() {
        assert_eq!(normalize("№ 5"), n("№_5"));
        assert_eq!(normalize("№5"), n("№_5"));
        assert_eq!(normalize("№   5"), n("№_5"));
        assert_eq!(normalize("номер №"), "номер №");
    }

    #[test]
    fn short_word_after_numero_or_parenthesis() {
        assert_eq!(normalize("№с\tруб"), n("№_с_руб"));
        assert_eq!(normalize("(а)в руб"), n("~(а)~в_руб"));
    }

    #[test]
    fn parenthetical_protection() {
        assert_eq!(normalize("смета (с НДС)"), n("смета_~(с_НДС)~"));
        assert_eq!(normalize("план (I-II кв.)"), n("план_~(I\u{2011}II_кв.)~"));
        assert_eq!(normalize("(a) (b)"), n("~(a)~_~(b)~"));
    }

    #[test]
    fn range_dash() {
        assert_eq!(normalize("2024-2030"), "2024–2030");
        assert_eq!(normalize("10-20"), "10–20");
        assert_eq!(normalize("1000-2000"), n("1_000–2000"));
        // single digits and long runs are not ranges
        assert_eq!(normalize("1-2"), "1-2");
        assert_eq!(normalize("12345-67"), n("12_345-67"));
    }

    #[test]
    fn sentence_dash() {
        assert_eq!(normalize("работы - завершены"), n("работы_— завершены"));
        assert_eq!(normalize("2024 - 2030"), n("2024_— 2030"));
        assert_eq!(normalize("a - - b"), n("a_—_— b"));
        // hyphenated words stay as they are
        assert_eq!(normalize("северо-запад"), "северо-запад");
    }

    #[test]
    fn line_breaks_are_preserved() {
        let out = normalize("Итого по\nразделу 1 - 2");
        assert_eq!(out.matches('\n').count(), 1);
        assert_eq!(out, n("Итого по\nразделу 1_— 2"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "-",
            "   ",
            "в 2024 году",
            "12345",
            "2024-2030",
            "№ 5",
            "№№5",
            "ул. Ленина, д. 12, кв. 3",
            "\"Рога и копыта\" (ООО \"Вектор\")",
            "площадь 50 м2 и объём 3 м3",
            "5 тыс. руб. за 1234,5678 кг.",
            "работы - и в на - завершены",
            "((a b) c-d)",
            "(a) (b) \u{2060}(c)",
            "12-34-56",
            "123-12345",
            "12345-12",
            "1234-5678",
            "10 - 20\nдо 30",
            "№ и 5",
            "a - - b",
            "1 2345 и 7 000 000",
            "текст,  123456",
            "км2219",
            "м2202419",
            "№с\tруб%",
            "с\tв  №в\t\"1",
            "(а)в руб",
        ];
        for s in samples {
            let once = normalize(s);
            let twice = normalize(&once);
            assert_eq!(twice, once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn display_text_strips_layout_marks() {
        let normalized = normalize("план (I-II кв.)");
        assert_eq!(display_text(&normalized), "план (I-II кв.)");
        assert_eq!(display_text(&n("№_5")), "№ 5");
    }
}
