use unicode_segmentation::UnicodeSegmentation;

use std::fmt;

use crate::reporter::ErrorReporter;
use crate::token::{Token, TokenKind};
use crate::types::Literal;

pub struct Scanner {
    source: String,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
}

impl Scanner {
    pub fn new(source: String) -> Self {
        Scanner {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Consumes the whole source in a single left-to-right pass. Lexical
    /// errors go to the reporter and scanning continues with the next
    /// character, so one pass surfaces every error the source contains.
    /// The returned sequence always ends with a single `Eof` token.
    pub fn scan_tokens(&mut self, reporter: &mut dyn ErrorReporter) -> &[Token] {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(reporter);
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, "".to_string(), None, self.line));

        self.tokens()
    }

    pub fn tokens(&self) -> &[Token] {
        self.tokens.as_slice()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.graphemes(true).count()
    }

    fn scan_token(&mut self, reporter: &mut dyn ErrorReporter) {
        match self.advance() {
            // Single character tokens
            "(" => self.add_token(TokenKind::LeftParen, None),
            ")" => self.add_token(TokenKind::RightParen, None),
            "{" => self.add_token(TokenKind::LeftBrace, None),
            "}" => self.add_token(TokenKind::RightBrace, None),
            "," => self.add_token(TokenKind::Comma, None),
            "." => self.add_token(TokenKind::Dot, None),
            "-" => self.add_token(TokenKind::Minus, None),
            "+" => self.add_token(TokenKind::Plus, None),
            ";" => self.add_token(TokenKind::Semicolon, None),
            "*" => self.add_token(TokenKind::Star, None),

            // One or two character tokens
            "!" => {
                if self.matches("=") {
                    self.add_token(TokenKind::BangEqual, None)
                } else {
                    self.add_token(TokenKind::Bang, None)
                }
            }
            "=" => {
                if self.matches("=") {
                    self.add_token(TokenKind::EqualEqual, None)
                } else {
                    self.add_token(TokenKind::Equal, None)
                }
            }
            ">" => {
                if self.matches("=") {
                    self.add_token(TokenKind::GreaterEqual, None)
                } else {
                    self.add_token(TokenKind::Greater, None)
                }
            }
            "<" => {
                if self.matches("=") {
                    self.add_token(TokenKind::LessEqual, None)
                } else {
                    self.add_token(TokenKind::Less, None)
                }
            }

            // Comments
            "/" => {
                if self.matches("/") {
                    // A line comment goes until the end of the line
                    while let Some(str) = self.peek() {
                        if str == "\n" || str == "\r\n" {
                            break;
                        }
                        self.advance();
                    }
                } else if self.matches("*") {
                    self.block_comment(reporter);
                } else {
                    self.add_token(TokenKind::Slash, None)
                }
            }

            // Ignore whitespace
            " " | "\r" | "\t" => {}

            // Newline
            "\n" | "\r\n" => {
                self.line += 1;
            }

            r#"""# => self.string(reporter),

            str => {
                if Scanner::is_digit(str) {
                    self.number()
                } else if Scanner::is_alpha(str) {
                    self.identifier()
                } else {
                    self.error(reporter, ScanErrorKind::UnexpectedCharacter)
                }
            }
        }
    }

    /// A block comment goes until a "*/" pair is found, and nests: every
    /// "/*" inside it opens another level that needs its own "*/".
    fn block_comment(&mut self, reporter: &mut dyn ErrorReporter) {
        let mut opened = 1u32;

        while opened > 0 && !self.is_at_end() {
            match (self.peek(), self.peek_next()) {
                (Some("*"), Some("/")) => {
                    self.advance();
                    self.advance();
                    opened -= 1;
                }
                (Some("/"), Some("*")) => {
                    self.advance();
                    self.advance();
                    opened += 1;
                }
                (Some("\n"), _) | (Some("\r\n"), _) => {
                    self.line += 1;
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }

        if opened > 0 {
            self.error(reporter, ScanErrorKind::UnterminatedComment);
        }
    }

    fn string(&mut self, reporter: &mut dyn ErrorReporter) {
        // A string may span lines; the token keeps the line it opened on.
        let opening_line = self.line;

        while let Some(str) = self.peek() {
            if str == r#"""# {
                break;
            }

            if str == "\n" || str == "\r\n" {
                self.line += 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            self.error(reporter, ScanErrorKind::UnterminatedString);
            return;
        }

        // Consume the closing "
        self.advance();

        // Trim surrounding quotes; the contents are taken verbatim
        let literal_length = (self.current - 1) - (self.start + 1);
        let string_literal = Literal::String(
            self.source
                .graphemes(true)
                .skip(self.start + 1)
                .take(literal_length)
                .collect(),
        );
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(
            TokenKind::String,
            lexeme,
            Some(string_literal),
            opening_line,
        ));
    }

    fn number(&mut self) {
        while let Some(str) = self.peek() {
            if !Scanner::is_digit(str) {
                break;
            }
            self.advance();
        }

        // Look for a fractional part: the dot is only consumed when a digit
        // follows it, so a trailing dot is left for the next lexeme
        if let Some(".") = self.peek() {
            if let Some(str) = self.peek_next() {
                if Scanner::is_digit(str) {
                    // Consume .
                    self.advance();

                    while let Some(str) = self.peek() {
                        if !Scanner::is_digit(str) {
                            break;
                        }
                        self.advance();
                    }
                }
            }
        }

        let number_literal = Literal::Number(self.lexeme().parse::<f64>().unwrap());
        self.add_token(TokenKind::Number, Some(number_literal))
    }

    fn identifier(&mut self) {
        while let Some(str) = self.peek() {
            if !Scanner::is_alphanumeric(str) {
                break;
            }
            self.advance();
        }

        let identifier = self.lexeme();
        let kind = TokenKind::keyword(&identifier).unwrap_or(TokenKind::Identifier);

        self.add_token(kind, None)
    }

    fn is_digit(str: &str) -> bool {
        str.bytes().all(|c| c.is_ascii_digit())
    }

    fn is_alpha(str: &str) -> bool {
        str.bytes().all(|c| c.is_ascii_alphabetic()) || str == "_"
    }

    fn is_alphanumeric(str: &str) -> bool {
        str.bytes().all(|c| c.is_ascii_alphanumeric()) || str == "_"
    }

    fn peek(&self) -> Option<&str> {
        self.source.graphemes(true).nth(self.current)
    }

    fn peek_next(&self) -> Option<&str> {
        self.source.graphemes(true).nth(self.current + 1)
    }

    fn matches(&mut self, expected: &str) -> bool {
        if self.is_at_end() {
            return false;
        }

        if let Some(str) = self.source.graphemes(true).nth(self.current) {
            if str != expected {
                return false;
            }
        }

        self.current += 1;

        true
    }

    fn advance(&mut self) -> &str {
        // SAFETY: By construction advance() is only called after checking if is_at_end()
        let grapheme = unsafe {
            self.source
                .graphemes(true)
                .nth(self.current)
                .unwrap_unchecked()
        };
        self.current += 1;
        grapheme
    }

    fn lexeme(&self) -> String {
        let lexeme_length = self.current - self.start;
        self.source
            .graphemes(true)
            .skip(self.start)
            .take(lexeme_length)
            .collect()
    }

    fn add_token(&mut self, kind: TokenKind, literal: Option<Literal>) {
        let lexeme = self.lexeme();
        self.tokens
            .push(Token::new(kind, lexeme, literal, self.line));
    }

    fn error(&self, reporter: &mut dyn ErrorReporter, kind: ScanErrorKind) {
        reporter.report(self.line, &kind.to_string());
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ScanErrorKind {
    UnexpectedCharacter,
    UnterminatedString,
    UnterminatedComment,
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            Self::UnexpectedCharacter => write!(f, "Unexpected character."),
            Self::UnterminatedString => write!(f, "Unterminated string."),
            Self::UnterminatedComment => write!(f, "Unterminated multiline comment."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind::*;

    #[derive(Default)]
    struct RecordingReporter {
        errors: Vec<(u32, std::string::String)>,
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&mut self, line: u32, message: &str) {
            self.errors.push((line, message.to_string()));
        }
    }

    fn scan(source: &str) -> (Vec<Token>, Vec<(u32, std::string::String)>) {
        let mut reporter = RecordingReporter::default();
        let mut scanner = Scanner::new(source.to_string());
        let tokens = scanner.scan_tokens(&mut reporter).to_vec();
        (tokens, reporter.errors)
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn single_character_tokens() {
        assert_eq!(
            kinds("(){},.-+;*"),
            vec![
                LeftParen, RightParen, LeftBrace, RightBrace, Comma, Dot, Minus, Plus, Semicolon,
                Star, Eof
            ]
        );
    }

    #[test]
    fn one_or_two_character_operators() {
        assert_eq!(
            kinds("! != = == < <= > >="),
            vec![
                Bang, BangEqual, Equal, EqualEqual, Less, LessEqual, Greater, GreaterEqual, Eof
            ]
        );
    }

    #[test]
    fn short_operator_at_end_of_input() {
        assert_eq!(kinds("!"), vec![Bang, Eof]);
    }

    #[test]
    fn slash_is_division() {
        assert_eq!(kinds("6 / 3"), vec![Number, Slash, Number, Eof]);
    }

    #[test]
    fn line_comment_consumes_rest_of_line() {
        let (tokens, errors) = scan("1 // the rest is ignored ***\n2");
        assert!(errors.is_empty());
        let token_kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(token_kinds, vec![Number, Number, Eof]);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn line_comment_at_end_of_input() {
        let (tokens, errors) = scan("// nothing here");
        assert!(errors.is_empty());
        assert_eq!(tokens.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![Eof]);
    }

    #[test]
    fn whitespace_and_comments_scan_to_eof_only() {
        let (tokens, errors) = scan(" \t\r\n// line\n/* block\nstill block */ ");
        assert!(errors.is_empty());
        assert_eq!(tokens.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![Eof]);
    }

    #[test]
    fn block_comments_nest() {
        let (tokens, errors) = scan("/* /* */ */");
        assert!(errors.is_empty());
        assert_eq!(tokens.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![Eof]);
    }

    #[test]
    fn unterminated_nested_block_comment_reports_once() {
        let (tokens, errors) = scan("/* /* */");
        assert_eq!(tokens.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![Eof]);
        assert_eq!(errors, vec![(1, "Unterminated multiline comment.".to_string())]);
    }

    #[test]
    fn newlines_inside_block_comment_count() {
        let (tokens, errors) = scan("/* one\ntwo */\nafter");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, Identifier);
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn number_literals_parse_as_doubles() {
        let (tokens, errors) = scan("123 45.67");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(45.67)));
    }

    #[test]
    fn second_dot_is_not_part_of_the_number() {
        let (tokens, errors) = scan("1.2.3");
        assert!(errors.is_empty());
        let token_kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(token_kinds, vec![Number, Dot, Number, Eof]);
        assert_eq!(tokens[0].literal, Some(Literal::Number(1.2)));
        assert_eq!(tokens[2].literal, Some(Literal::Number(3.0)));
    }

    #[test]
    fn trailing_dot_is_its_own_token() {
        assert_eq!(kinds("3."), vec![Number, Dot, Eof]);
    }

    #[test]
    fn string_literal_strips_quotes() {
        let (tokens, errors) = scan(r#""hello""#);
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, String);
        assert_eq!(tokens[0].lexeme, r#""hello""#);
        assert_eq!(tokens[0].literal, Some(Literal::String("hello".to_string())));
    }

    #[test]
    fn strings_span_lines() {
        let (tokens, errors) = scan("\"a\nb\" after");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, String);
        assert_eq!(tokens[0].literal, Some(Literal::String("a\nb".to_string())));
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].kind, Identifier);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_string_reports_and_emits_nothing() {
        let (tokens, errors) = scan(r#""abc"#);
        assert_eq!(tokens.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![Eof]);
        assert_eq!(errors, vec![(1, "Unterminated string.".to_string())]);
    }

    #[test]
    fn keywords_classify() {
        assert_eq!(
            kinds("and class else false fun for if nil or print return super true var while"),
            vec![
                And, Class, Else, False, Fun, For, If, Nil, Or, Print, Return, Super, True, Var,
                While, Eof
            ]
        );
    }

    #[test]
    fn keyword_prefix_is_still_one_identifier() {
        let (tokens, errors) = scan("classify");
        assert!(errors.is_empty());
        let token_kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(token_kinds, vec![Identifier, Eof]);
        assert_eq!(tokens[0].lexeme, "classify");
    }

    #[test]
    fn identifiers_take_letters_digits_underscores() {
        assert_eq!(
            kinds("_tmp x1 foo_bar"),
            vec![Identifier, Identifier, Identifier, Eof]
        );
    }

    #[test]
    fn unexpected_characters_are_reported_and_skipped() {
        let (tokens, errors) = scan("@+#");
        assert_eq!(tokens.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![Plus, Eof]);
        assert_eq!(
            errors,
            vec![
                (1, "Unexpected character.".to_string()),
                (1, "Unexpected character.".to_string())
            ]
        );
    }

    #[test]
    fn rescanning_printed_lexemes_keeps_the_kinds() {
        let (tokens, errors) = scan("var answer = (1.5 + 2) * 3;");
        assert!(errors.is_empty());

        let printed = tokens
            .iter()
            .map(|t| t.lexeme.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let rescanned = kinds(&printed);

        assert_eq!(
            rescanned,
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>()
        );
    }

    #[test]
    fn eof_carries_the_final_line() {
        let (tokens, errors) = scan("a\nb\n");
        assert!(errors.is_empty());
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, Eof);
        assert_eq!(eof.lexeme, "");
        assert_eq!(eof.line, 3);
    }

    #[test]
    fn token_lines_never_decrease() {
        let (tokens, _) = scan("a\n\"b\nc\"\nd /* e\nf */ g");
        let lines: Vec<_> = tokens.iter().map(|t| t.line).collect();
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        assert_eq!(lines, sorted);
    }
}
