//! Beta Code to polytonic Greek transliteration
//!
//! Output is NFC-normalised so that a base letter and its combining marks
//! collapse to precomposed code points where Unicode has them.

use crate::io::error::{Result, ToolError};
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

const GREEK_LETTERS: &[(&str, char)] = &[
    ("alpha", '\u{03b1}'),
    ("beta", '\u{03b2}'),
    ("gamma", '\u{03b3}'),
    ("delta", '\u{03b4}'),
    ("epsilon", '\u{03b5}'),
    ("zeta", '\u{03b6}'),
    ("eta", '\u{03b7}'),
    ("theta", '\u{03b8}'),
    ("iota", '\u{03b9}'),
    ("kappa", '\u{03ba}'),
    ("lambda", '\u{03bb}'),
    ("mu", '\u{03bc}'),
    ("nu", '\u{03bd}'),
    ("ksi", '\u{03be}'),
    ("omicron", '\u{03bf}'),
    ("pi", '\u{03c0}'),
    ("rho", '\u{03c1}'),
    ("sigma_end", '\u{03c2}'),
    ("sigma", '\u{03c3}'),
    ("tau", '\u{03c4}'),
    ("upsilon", '\u{03c5}'),
    ("phi", '\u{03c6}'),
    ("chi", '\u{03c7}'),
    ("psi", '\u{03c8}'),
    ("omega", '\u{03c9}'),
    ("digamma", '\u{03dd}'),
    ("Alpha", '\u{0391}'),
    ("Beta", '\u{0392}'),
    ("Gamma", '\u{0393}'),
    ("Delta", '\u{0394}'),
    ("Epsilon", '\u{0395}'),
    ("Zeta", '\u{0396}'),
    ("Eta", '\u{0397}'),
    ("Theta", '\u{0398}'),
    ("Iota", '\u{0399}'),
    ("Kappa", '\u{039a}'),
    ("Lambda", '\u{039b}'),
    ("Mu", '\u{039c}'),
    ("Nu", '\u{039d}'),
    ("Ksi", '\u{039e}'),
    ("Omicron", '\u{039f}'),
    ("Pi", '\u{03a0}'),
    ("Rho", '\u{03a1}'),
    ("Sigma", '\u{03a3}'),
    ("Tau", '\u{03a4}'),
    ("Upsilon", '\u{03a5}'),
    ("Phi", '\u{03a6}'),
    ("Chi", '\u{03a7}'),
    ("Psi", '\u{03a8}'),
    ("Omega", '\u{03a9}'),
    ("Digamma", '\u{03dc}'),
    ("rough_breathing", '\u{0314}'),
    ("smooth_breathing", '\u{0313}'),
    ("acute_accent", '\u{0301}'),
    ("grave_accent", '\u{0300}'),
    ("circumflex", '\u{0342}'),
    ("iota_subscript", '\u{0345}'),
    ("breve", '\u{0361}'),
    ("diaeresis", '\u{0308}'),
    ("colon", '\u{0387}'),
    ("macron", '\u{0304}'),
    ("combining_overline", '\u{0305}'),
];

// `~` is not standard Beta Code but appears in the source texts as an overline
const BETA_CODE: &[(char, &str)] = &[
    ('a', "alpha"),
    ('b', "beta"),
    ('g', "gamma"),
    ('d', "delta"),
    ('e', "epsilon"),
    ('z', "zeta"),
    ('h', "eta"),
    ('q', "theta"),
    ('i', "iota"),
    ('k', "kappa"),
    ('l', "lambda"),
    ('m', "mu"),
    ('n', "nu"),
    ('c', "ksi"),
    ('o', "omicron"),
    ('p', "pi"),
    ('r', "rho"),
    ('s', "sigma"),
    ('t', "tau"),
    ('u', "upsilon"),
    ('f', "phi"),
    ('x', "chi"),
    ('y', "psi"),
    ('w', "omega"),
    ('v', "digamma"),
    ('A', "Alpha"),
    ('B', "Beta"),
    ('G', "Gamma"),
    ('D', "Delta"),
    ('E', "Epsilon"),
    ('Z', "Zeta"),
    ('H', "Eta"),
    ('Q', "Theta"),
    ('I', "Iota"),
    ('K', "Kappa"),
    ('L', "Lambda"),
    ('M', "Mu"),
    ('N', "Nu"),
    ('C', "Ksi"),
    ('O', "Omicron"),
    ('P', "Pi"),
    ('R', "Rho"),
    ('S', "Sigma"),
    ('T', "Tau"),
    ('U', "Upsilon"),
    ('F', "Phi"),
    ('X', "Chi"),
    ('Y', "Psi"),
    ('W', "Omega"),
    ('V', "Digamma"),
    ('(', "rough_breathing"),
    (')', "smooth_breathing"),
    ('/', "acute_accent"),
    ('\\', "grave_accent"),
    ('=', "circumflex"),
    ('|', "iota_subscript"),
    ('+', "diaeresis"),
    (':', "colon"),
    ('_', "macron"),
    ('~', "combining_overline"),
];

static BETA_TO_GREEK: LazyLock<HashMap<char, char>> = LazyLock::new(|| {
    BETA_CODE
        .iter()
        .filter_map(|&(code, name)| greek_letter(name).map(|greek| (code, greek)))
        .collect()
});

const DROPPED: &str = "[]!?\"%#0123456789\t";
const PASSTHROUGH: &str = " ,.-\n;'";
const WORD_END: &str = " ,.:;\n";
const FINAL_SIGMA: char = '\u{03c2}';

/// Greek letter or combining mark with the given name, e.g. `"alpha"`,
/// `"Omega"` or `"acute_accent"`
pub fn greek_letter(name: &str) -> Option<char> {
    GREEK_LETTERS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|&(_, letter)| letter)
}

const fn is_diacritic(code: char) -> bool {
    matches!(
        code,
        '(' | ')' | '/' | '\\' | '=' | '|' | '+' | '_' | '~'
    )
}

// Replaces `&name;` and `&#digits;` entities with a single space
fn strip_entities(line: &str) -> Vec<char> {
    let chars: Vec<char> = line.chars().collect();
    let mut output = Vec::with_capacity(chars.len());
    let mut index = 0;
    while let Some(&current) = chars.get(index) {
        if current == '&' {
            let rest = chars.get(index + 1..).unwrap_or_default();
            let (numeric, body) = match rest.first() {
                Some('#') => (true, rest.get(1..).unwrap_or_default()),
                _ => (false, rest),
            };
            let length = body
                .iter()
                .take_while(|c| {
                    if numeric {
                        c.is_ascii_digit()
                    } else {
                        c.is_ascii_alphanumeric()
                    }
                })
                .count();
            if length > 0 && body.get(length) == Some(&';') {
                output.push(' ');
                index += 1 + usize::from(numeric) + length + 1;
                continue;
            }
        }
        output.push(current);
        index += 1;
    }
    output
}

fn lookup(code: char, position: usize) -> Result<char> {
    BETA_TO_GREEK
        .get(&code)
        .copied()
        .ok_or(ToolError::UnknownBetacode {
            character: code,
            position,
        })
}

/// Transliterate one line of Beta Code into NFC-normalised Greek
///
/// `*` capitalises the following letter; breathings and accents written
/// between the asterisk and the letter are attached after it. A lowercase
/// `s` at the end of a word becomes final sigma.
///
/// # Errors
///
/// Returns [`ToolError::UnknownBetacode`] for a character with no mapping;
/// `position` counts characters after entity stripping
pub fn convert_line(line: &str) -> Result<String> {
    let chars = strip_entities(line);
    let mut result = String::with_capacity(chars.len() * 2);
    let mut uppercase = false;
    let mut pending_marks: Vec<char> = Vec::new();

    for (position, &code) in chars.iter().enumerate() {
        if DROPPED.contains(code) {
            continue;
        }
        if code == '*' {
            uppercase = true;
            continue;
        }
        if uppercase && is_diacritic(code) {
            pending_marks.push(lookup(code, position)?);
            continue;
        }

        if PASSTHROUGH.contains(code) {
            result.push(code);
        } else if uppercase {
            result.push(lookup(code.to_ascii_uppercase(), position)?);
        } else if code == 's'
            && chars
                .get(position + 1)
                .is_none_or(|next| WORD_END.contains(*next))
        {
            result.push(FINAL_SIGMA);
        } else {
            result.push(lookup(code, position)?);
        }

        if uppercase {
            result.extend(pending_marks.drain(..));
            uppercase = false;
        }
    }
    result.extend(pending_marks);

    Ok(result.nfc().collect())
}

/// Convert every line read from `reader` and write it to `writer`
///
/// Returns the number of lines converted.
///
/// # Errors
///
/// Returns an error on I/O failure or an unmappable character
pub fn convert_reader<R: BufRead, W: Write>(reader: R, writer: &mut W) -> Result<usize> {
    let mut count = 0;
    for line in reader.lines() {
        let converted = convert_line(&line?)?;
        writeln!(writer, "{converted}")?;
        count += 1;
    }
    Ok(count)
}
