//! Best-effort PII masking for free text sent to the assistant.
//!
//! Markup is stripped first, then each masking rule runs in declaration order
//! over the output of the previous one. This is not an HTML parser: nested or
//! malformed markup may survive.

use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement for every masked span.
///
/// Lowercase so the alphanumeric passport rule cannot match it again.
pub const REDACTION_TOKEN: &str = "[redacted]";

/// Text after markup stripping and masking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedText {
    /// Masked text.
    pub text: String,
    /// One warning per rule that matched, in rule order.
    pub warnings: Vec<String>,
}

struct MaskRule {
    category: &'static str,
    pattern: Regex,
}

#[allow(clippy::expect_used)]
fn compile(source: &str) -> Regex {
    Regex::new(source).expect("sanitizer patterns are literals")
}

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| compile(r"(?is)<script.*?>.*?</script\s*>"));
static TAG: Lazy<Regex> = Lazy::new(|| compile(r"<[^>]*>"));

static MASK_RULES: Lazy<Vec<MaskRule>> = Lazy::new(|| {
    vec![
        MaskRule {
            category: "SSN/SIN",
            pattern: compile(r"\b\d{3}-\d{2}-\d{4}\b"),
        },
        MaskRule {
            category: "SIN",
            pattern: compile(r"\b\d{9}\b"),
        },
        MaskRule {
            category: "credit card",
            pattern: compile(r"\b(?:\d[ -]?){12,18}\d\b"),
        },
        MaskRule {
            category: "passport",
            pattern: compile(r"\b[A-Z]{1,2}\d{6,8}\b"),
        },
        MaskRule {
            category: "passport",
            pattern: compile(r"\b[A-Z0-9]{8,9}\b"),
        },
    ]
});

/// Strips markup and masks sensitive identifiers.
#[must_use]
pub fn sanitize(input: &str) -> SanitizedText {
    let without_scripts = SCRIPT_BLOCK.replace_all(input, "");
    let mut text = TAG.replace_all(&without_scripts, "").into_owned();
    let mut warnings = Vec::new();

    for rule in MASK_RULES.iter() {
        if rule.pattern.is_match(&text) {
            text = rule
                .pattern
                .replace_all(&text, REDACTION_TOKEN)
                .into_owned();
            warnings.push(format!(
                "Possible {} detected and masked before processing.",
                rule.category
            ));
        }
    }

    SanitizedText { text, warnings }
}

#[cfg(test)]
mod tests {
    use super::{REDACTION_TOKEN, sanitize};

    #[test]
    fn masks_ssn_and_reports_category() {
        let result = sanitize("My SIN is 123-45-6789, thanks");

        assert_eq!(result.text, format!("My SIN is {REDACTION_TOKEN}, thanks"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("SSN/SIN"));
    }

    #[test]
    fn removes_script_bodies_across_lines() {
        let result = sanitize("before<SCRIPT type=\"x\">\nalert('secret')\n</script>after <b>bold</b>");

        assert!(!result.text.contains("secret"));
        assert!(!result.text.contains("alert"));
        assert_eq!(result.text, "beforeafter bold");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn masks_bare_nine_digit_sin() {
        let result = sanitize("number 046454286 here");

        assert_eq!(result.text, format!("number {REDACTION_TOKEN} here"));
        assert!(result.warnings[0].contains("SIN"));
    }

    #[test]
    fn ssn_masking_runs_before_sin_rule() {
        let result = sanitize("123-45-6789");

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("SSN/SIN"));
    }

    #[test]
    fn masks_card_numbers_with_separators() {
        let result = sanitize("card 4111 1111-1111 1111 ok");

        assert_eq!(result.text, format!("card {REDACTION_TOKEN} ok"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("credit card"));
    }

    #[test]
    fn masks_passport_codes() {
        let result = sanitize("passport AB1234567 issued");

        assert_eq!(result.text, format!("passport {REDACTION_TOKEN} issued"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("passport"));
    }

    #[test]
    fn overlapping_passport_rules_can_both_warn() {
        let result = sanitize("codes A1234567 and 9X8Y7Z6W5");

        assert_eq!(
            result.text,
            format!("codes {REDACTION_TOKEN} and {REDACTION_TOKEN}")
        );
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings.iter().all(|warning| warning.contains("passport")));
    }

    #[test]
    fn multiple_categories_accumulate_in_rule_order() {
        let result = sanitize("ssn 123-45-6789 card 4111111111111111 passport AB123456");

        assert_eq!(result.warnings.len(), 3);
        assert!(result.warnings[0].contains("SSN/SIN"));
        assert!(result.warnings[1].contains("credit card"));
        assert!(result.warnings[2].contains("passport"));
    }

    #[test]
    fn redaction_token_is_not_masked_again() {
        let result = sanitize("123-45-6789");

        assert_eq!(result.text, REDACTION_TOKEN);
    }

    #[test]
    fn plain_text_passes_through() {
        let result = sanitize("What should I write for my date of birth?");

        assert_eq!(result.text, "What should I write for my date of birth?");
        assert!(result.warnings.is_empty());
    }
}
