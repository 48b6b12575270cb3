//! # Message Tokenizer
//!
//! Statement-generation mode trains the model to produce the log message,
//! so the message has to be turned into a token sequence. Subword models
//! plug in through [`MessageTokenizer`]; [`SimpleTokenizer`] is the built-in
//! fallback.

/// Converts free-text log messages into token sequences.
///
/// Implementations must be pure: the same text always yields the same tokens.
pub trait MessageTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Splits on whitespace and emits every punctuation character as its own
/// token. String-literal quotes are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTokenizer;

impl MessageTokenizer for SimpleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();

        for ch in text.chars() {
            if ch.is_alphanumeric() || ch == '_' {
                current.push(ch);
                continue;
            }
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if !ch.is_whitespace() && ch != '"' {
                tokens.push(ch.to_string());
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        tokens
    }
}

impl<F> MessageTokenizer for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_and_punctuation() {
        let tokens = SimpleTokenizer.tokenize("\"Failed to load %s: \" + path");
        assert_eq!(tokens, vec!["Failed", "to", "load", "%", "s", ":", "+", "path"]);
    }

    #[test]
    fn empty_message_has_no_tokens() {
        assert!(SimpleTokenizer.tokenize("   ").is_empty());
    }

    #[test]
    fn closures_are_tokenizers() {
        let upper = |text: &str| vec![text.to_uppercase()];
        assert_eq!(upper.tokenize("hi"), vec!["HI"]);
    }
}
