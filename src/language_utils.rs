use anyhow::{Result, anyhow};
use isolang::Language;
use once_cell::sync::Lazy;
use regex::Regex;

// Language utilities for language code handling.
//
// Whisper and the Helsinki models take ISO 639-1 codes ("en"), ISO 639-2
// codes are accepted wherever a plain code is, and NLLB takes
// script-qualified codes ("eng_Latn").

// @const: NLLB code shape: ISO 639-3 language, underscore, ISO 15924 script
static NLLB_CODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z]{3})_([A-Z][a-z]{3})$").expect("NLLB code regex is valid")
});

// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: [(&str, &str); 18] = [
    ("fre", "fra"), ("ger", "deu"), ("dut", "nld"), ("gre", "ell"),
    ("chi", "zho"), ("cze", "ces"), ("ice", "isl"), ("alb", "sqi"),
    ("arm", "hye"), ("baq", "eus"), ("bur", "mya"), ("per", "fas"),
    ("geo", "kat"), ("may", "msa"), ("mac", "mkd"), ("rum", "ron"),
    ("slo", "slk"), ("wel", "cym"),
];

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
    /// NLLB/FLORES code, e.g. "spa_Latn"
    ScriptQualified,
}

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T.iter()
        .find(|(part2b, _)| *part2b == code)
        .map(|(_, part2t)| *part2t)
}

/// Validate if a language code is a valid ISO 639-1, ISO 639-2 or NLLB code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    if is_nllb_code(code) {
        return Ok(LanguageCodeType::ScriptQualified);
    }

    let normalized_code = code.trim().to_lowercase();
    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if part2b_to_part2t(&normalized_code).is_some() => Ok(LanguageCodeType::Part2B),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// True for a well-formed NLLB code whose language part is a known ISO 639-3 code
pub fn is_nllb_code(code: &str) -> bool {
    NLLB_CODE_REGEX.captures(code.trim())
        .and_then(|caps| caps.get(1))
        .is_some_and(|lang| Language::from_639_3(lang.as_str()).is_some())
}

/// True for a plain ISO 639-1 code such as "en"
pub fn is_part1_code(code: &str) -> bool {
    matches!(validate_language_code(code), Ok(LanguageCodeType::Part1))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
///
/// NLLB codes are reduced to their language part.
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let trimmed = code.trim();
    if let Some(caps) = NLLB_CODE_REGEX.captures(trimmed) {
        let lang = &caps[1];
        if Language::from_639_3(lang).is_some() {
            return Ok(lang.to_string());
        }
    }

    let normalized_code = trimmed.to_lowercase();
    match normalized_code.len() {
        2 => {
            if let Some(lang) = Language::from_639_1(&normalized_code) {
                return Ok(lang.to_639_3().to_string());
            }
        }
        3 => {
            if Language::from_639_3(&normalized_code).is_some() {
                return Ok(normalized_code);
            }
            if let Some(part2t) = part2b_to_part2t(&normalized_code) {
                return Ok(part2t.to_string());
            }
        }
        _ => {}
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let part2t = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang.to_639_1().map(str::to_string).unwrap_or(part2t))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}
