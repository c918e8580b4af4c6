/// One language offered on the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1 code.
    pub code: &'static str,
    /// Name shown in the language picker.
    pub label: &'static str,
    /// Flag emoji shown next to the label.
    pub flag: &'static str,
    /// Greeting rendered when the language is selected.
    pub text: &'static str,
}

/// Language selected before the user picks one.
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// Languages offered on the landing page, in display order.
pub const LANGUAGES: [Language; 5] = [
    Language {
        code: "en",
        label: "English",
        flag: "\u{1F1EC}\u{1F1E7}",
        text: "Hello! This is a simple multilingual page.",
    },
    Language {
        code: "es",
        label: "Espanol",
        flag: "\u{1F1EA}\u{1F1F8}",
        text: "Hola. Esta es una pagina sencilla en varios idiomas.",
    },
    Language {
        code: "fr",
        label: "Francais",
        flag: "\u{1F1EB}\u{1F1F7}",
        text: "Bonjour. Ceci est une page simple en plusieurs langues.",
    },
    Language {
        code: "de",
        label: "Deutsch",
        flag: "\u{1F1E9}\u{1F1EA}",
        text: "Hallo. Dies ist eine einfache mehrsprachige Seite.",
    },
    Language {
        code: "tr",
        label: "Turkce",
        flag: "\u{1F1F9}\u{1F1F7}",
        text: "Merhaba. Bu, cok dilli basit bir sayfadir.",
    },
];

#[cfg(test)]
mod tests {
    use super::{DEFAULT_LANGUAGE_CODE, LANGUAGES};

    #[test]
    fn default_language_is_in_catalog() {
        assert!(
            LANGUAGES
                .iter()
                .any(|language| language.code == DEFAULT_LANGUAGE_CODE)
        );
    }

    #[test]
    fn language_codes_are_unique() {
        for (index, language) in LANGUAGES.iter().enumerate() {
            assert!(
                LANGUAGES[index + 1..]
                    .iter()
                    .all(|other| other.code != language.code)
            );
        }
    }
}
