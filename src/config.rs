//! Scanner for the simplistic `IDENT=VALUE` rc-file format.
//!
//! The files it parses take the following format:
//!
//! ```text
//! # Comment
//! SomeParam = "Some Value"
//! _Another-Param=Another Value
//! ```
//!
//! `IDENT` must begin with an alphabetic character or an underscore and may
//! otherwise consist of `[A-Za-z0-9_-]`. `VALUE` is everything up to the end
//! of the current line, or, if it begins with a `"`, everything up to the
//! next unescaped `"` (i.e. the next `"` which isn't preceded by a `\`).
//! Everything after a `#` is a comment and is ignored, unless it appears
//! between two `"` characters, in which case it's part of the value.
//!
//! Whitespace here means space and tab only, and a line ends at `\n` only.
//! Carriage returns are ordinary non-identifier characters; an unquoted `\r`
//! lands in the value (or trips a syntax error elsewhere). Escaped quotes are
//! kept literally: the value of `k="a\"b"` is `a\"b`, backslash included.
//!
//! The scanner performs no I/O and never prints. It walks the buffer once,
//! hands each `(identifier, value)` pair to [`Options::apply`], and stops at
//! the first error. Both tokens are borrowed slices into the source buffer,
//! so nothing is left allocated when a parse fails halfway through.

use crate::error::ConfigError;
use crate::options::Options;

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

/// Whitespace in this grammar is space and tab. `\n` is an end-of-line
/// marker, not whitespace.
fn is_ws(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Bounds-checked byte cursor with lookahead-by-one.
///
/// A NUL byte reads as end of input, matching the C-string termination of
/// the original format.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Cursor { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        match self.src.as_bytes().get(self.pos) {
            None | Some(0) => None,
            Some(&c) => Some(c),
        }
    }

    /// The current position decoded as a char, for diagnostics.
    fn peek_char(&self) -> Option<char> {
        self.peek()?;
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if self.pos < self.src.len() {
            // Stay on char boundaries so slices below are always valid.
            let mut next = self.pos + 1;
            while !self.src.is_char_boundary(next) {
                next += 1;
            }
            self.pos = next;
        }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn slice_from(&self, start: usize) -> &'a str {
        &self.src[start..self.pos]
    }

    /// Skips spaces, tabs and newlines. Used between lines, where blank
    /// lines and the previous line's EOL are both consumed.
    fn skip_blank(&mut self) {
        while matches!(self.peek(), Some(c) if is_ws(c) || c == b'\n') {
            self.bump();
        }
    }

    /// Skips spaces and tabs, stopping at EOL.
    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if is_ws(c)) {
            self.bump();
        }
    }

    /// Skips up to (not past) the next `\n`.
    fn skip_to_eol(&mut self) {
        while matches!(self.peek(), Some(c) if c != b'\n') {
            self.bump();
        }
    }
}

/// Parses a full rc-file buffer, applying each recognized setting to `opts`
/// in order of appearance (a repeated identifier keeps its last value).
///
/// The first syntax error or rejected pair aborts the parse; the remainder
/// of the buffer is not examined and `opts` keeps whatever assignments had
/// already been applied. Callers must not proceed with daemonization on an
/// `Err` return.
pub fn parse_config(source: &str, opts: &mut Options) -> Result<(), ConfigError> {
    let mut cur = Cursor::new(source);

    loop {
        cur.skip_blank();

        let c = match cur.peek() {
            None => return Ok(()),
            Some(c) => c,
        };

        if c == b'#' {
            // Comment-only line.
            cur.skip_to_eol();
            continue;
        }
        if !is_ident_start(c) {
            // peek_char is Some here: peek() just returned a byte.
            return Err(ConfigError::InvalidIdentifierStart(
                cur.peek_char().unwrap_or('\0'),
            ));
        }

        let ident_start = cur.pos();
        cur.bump();
        while matches!(cur.peek(), Some(c) if is_ident_continue(c)) {
            cur.bump();
        }
        let ident = cur.slice_from(ident_start);

        // The identifier run must end at whitespace or '='. Anything else,
        // including EOL and end of input, is malformed.
        match cur.peek() {
            Some(b'=') => cur.bump(),
            Some(c) if is_ws(c) => {
                cur.skip_ws();
                match cur.peek() {
                    Some(b'=') => cur.bump(),
                    _ => return Err(ConfigError::ExpectedEquals(ident.to_owned())),
                }
            }
            _ => return Err(ConfigError::MalformedIdentifier(cur.peek_char())),
        }

        cur.skip_ws();

        let value = match cur.peek() {
            None | Some(b'\n') => return Err(ConfigError::MissingValue(ident.to_owned())),
            Some(b'"') => scan_quoted(&mut cur)?,
            Some(_) => scan_unquoted(&mut cur),
        };

        opts.apply(ident, value)?;
        // The loop continues from just past the value; an unconsumed '#'
        // then reads as a comment and an unconsumed '\n' as a line break.
    }
}

/// Quoted mode: the value runs from just past the opening `"` to the next
/// `"` not immediately preceded by a `\`. Newlines are legal inside quotes.
/// Escape sequences are not rewritten.
fn scan_quoted<'a>(cur: &mut Cursor<'a>) -> Result<&'a str, ConfigError> {
    cur.bump(); // opening quote
    let start = cur.pos();
    let mut prev = b'"';
    loop {
        match cur.peek() {
            None => return Err(ConfigError::UnterminatedQuotedValue),
            Some(b'"') if prev != b'\\' => break,
            Some(c) => {
                prev = c;
                cur.bump();
            }
        }
    }
    let value = cur.slice_from(start);
    cur.bump(); // closing quote
    Ok(value)
}

/// Unquoted mode: the value runs to EOL or `#`, whichever comes first.
/// Trailing whitespace is kept.
fn scan_unquoted<'a>(cur: &mut Cursor<'a>) -> &'a str {
    let start = cur.pos();
    while matches!(cur.peek(), Some(c) if c != b'\n' && c != b'#') {
        cur.bump();
    }
    cur.slice_from(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Options, ConfigError> {
        let mut opts = Options::new("testd");
        parse_config(text, &mut opts)?;
        Ok(opts)
    }

    #[test]
    fn test_empty_file() {
        let opts = parse("").unwrap();
        assert!(!opts.daemonize);
        assert!(!opts.verbose);
        assert_eq!(opts.syslog_ident, "testd");
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let opts = parse("# a comment\n\n   \n\t# another\n").unwrap();
        assert!(!opts.daemonize);
        assert_eq!(opts.syslog_ident, "testd");
    }

    #[test]
    fn test_basic_assignments() {
        let text = "daemonize=yes\nverbose = true\nsyslog_ident=acmed\n";
        let opts = parse(text).unwrap();
        assert!(opts.daemonize);
        assert!(opts.verbose);
        assert_eq!(opts.syslog_ident, "acmed");
    }

    #[test]
    fn test_whitespace_tolerance() {
        let opts = parse("\t daemonize \t=\t y\n").unwrap();
        assert!(opts.daemonize);
    }

    #[test]
    fn test_missing_final_newline() {
        let opts = parse("verbose=1").unwrap();
        assert!(opts.verbose);
    }

    #[test]
    fn test_quoted_value_keeps_hash_and_spaces() {
        let opts = parse("syslog_ident=\"my #1 daemon\"\n").unwrap();
        assert_eq!(opts.syslog_ident, "my #1 daemon");
    }

    #[test]
    fn test_quoted_escape_preserved_literally() {
        // k="a\"b" stores a\"b, backslash included.
        let opts = parse("syslog_ident=\"a\\\"b\"\n").unwrap();
        assert_eq!(opts.syslog_ident, "a\\\"b");
    }

    #[test]
    fn test_quoted_empty_value() {
        let opts = parse("syslog_ident=\"\"\n").unwrap();
        assert_eq!(opts.syslog_ident, "");
    }

    #[test]
    fn test_quoted_value_spans_lines() {
        let opts = parse("syslog_ident=\"one\ntwo\"\n").unwrap();
        assert_eq!(opts.syslog_ident, "one\ntwo");
    }

    #[test]
    fn test_unquoted_value_stops_at_comment() {
        // Trailing whitespace before the '#' is not trimmed.
        let opts = parse("syslog_ident=v # trailing comment\n").unwrap();
        assert_eq!(opts.syslog_ident, "v ");
    }

    #[test]
    fn test_unquoted_value_empty_before_comment() {
        let opts = parse("syslog_ident=#comment\n").unwrap();
        assert_eq!(opts.syslog_ident, "");
    }

    #[test]
    fn test_assignment_after_quoted_value_same_line() {
        let opts = parse("syslog_ident=\"a\" verbose=yes\n").unwrap();
        assert_eq!(opts.syslog_ident, "a");
        assert!(opts.verbose);
    }

    #[test]
    fn test_last_occurrence_wins() {
        let opts = parse("verbose=no\nverbose=yes\n").unwrap();
        assert!(opts.verbose);
    }

    #[test]
    fn test_invalid_identifier_start() {
        assert_eq!(
            parse("1foo=bar\n").unwrap_err(),
            ConfigError::InvalidIdentifierStart('1')
        );
        assert_eq!(
            parse("=bar\n").unwrap_err(),
            ConfigError::InvalidIdentifierStart('=')
        );
    }

    #[test]
    fn test_malformed_identifier() {
        assert_eq!(
            parse("foo$=bar\n").unwrap_err(),
            ConfigError::MalformedIdentifier(Some('$'))
        );
        // EOL is not whitespace in this grammar.
        assert_eq!(
            parse("verbose\n").unwrap_err(),
            ConfigError::MalformedIdentifier(Some('\n'))
        );
        assert_eq!(
            parse("verbose").unwrap_err(),
            ConfigError::MalformedIdentifier(None)
        );
    }

    #[test]
    fn test_expected_equals() {
        assert_eq!(
            parse("verbose yes\n").unwrap_err(),
            ConfigError::ExpectedEquals("verbose".to_owned())
        );
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(
            parse("verbose=\n").unwrap_err(),
            ConfigError::MissingValue("verbose".to_owned())
        );
        assert_eq!(
            parse("verbose = \t ").unwrap_err(),
            ConfigError::MissingValue("verbose".to_owned())
        );
    }

    #[test]
    fn test_unterminated_quoted_value() {
        assert_eq!(
            parse("syslog_ident=\"abc").unwrap_err(),
            ConfigError::UnterminatedQuotedValue
        );
        // A backslash before the would-be closing quote keeps it open.
        assert_eq!(
            parse("syslog_ident=\"abc\\\"").unwrap_err(),
            ConfigError::UnterminatedQuotedValue
        );
    }

    #[test]
    fn test_unknown_identifier() {
        assert_eq!(
            parse("foo=bar\n").unwrap_err(),
            ConfigError::UnknownIdentifier("foo".to_owned())
        );
    }

    #[test]
    fn test_first_error_stops_the_scan() {
        let mut opts = Options::new("testd");
        let err = parse_config("foo=bar\nverbose=yes\n", &mut opts).unwrap_err();
        assert_eq!(err, ConfigError::UnknownIdentifier("foo".to_owned()));
        assert!(!opts.verbose);
    }

    #[test]
    fn test_carriage_return_is_not_whitespace() {
        // CRLF line endings leak the '\r' into an unquoted value.
        assert_eq!(
            parse("verbose=yes\r\n").unwrap_err(),
            ConfigError::InvalidBooleanLiteral("yes\r".to_owned())
        );
    }

    #[test]
    fn test_nul_byte_ends_the_input() {
        let opts = parse("verbose=yes\n\0daemonize=bogus\n").unwrap();
        assert!(opts.verbose);
        assert!(!opts.daemonize);
    }

    #[test]
    fn test_non_ascii_diagnostic_char() {
        assert_eq!(
            parse("é=1\n").unwrap_err(),
            ConfigError::InvalidIdentifierStart('é')
        );
    }
}
