// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Sub-token scanner for one line of assembly source.

/// One whitespace/comma-delimited unit of a source line, quote-aware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubToken {
    pub text: String,
    /// 1-based byte column of the token's first character.
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenMode {
    None,
    String,
    Char,
}

/// Restartable scanner splitting a line into sub-tokens.
///
/// Delimiters are space, tab and comma; `;` discards the rest of the
/// line. A `"` toggles string mode and a `'` toggles char mode; inside
/// either mode delimiters are ordinary characters and a quote preceded
/// by a backslash does not close the mode. Tokens are returned verbatim,
/// quotes, escapes and non-ASCII text included.
#[derive(Debug)]
pub struct Scanner<'a> {
    line: &'a str,
    /// Byte offset of the next unread character.
    cursor: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line, cursor: 0 }
    }

    /// Return the next sub-token, or `None` when the line is exhausted.
    pub fn next_token(&mut self) -> Option<SubToken> {
        self.skip_triggers();
        if self.cursor >= self.line.len() {
            return None;
        }

        let start = self.cursor;
        let mut text = String::new();
        let mut mode = TokenMode::None;

        while let Some(c) = self.peek() {
            match mode {
                TokenMode::None => match c {
                    ';' | ' ' | ',' | '\t' => break,
                    '"' => mode = TokenMode::String,
                    '\'' => mode = TokenMode::Char,
                    _ => {}
                },
                TokenMode::String => {
                    if c == '"' && !text.ends_with('\\') {
                        mode = TokenMode::None;
                    }
                }
                TokenMode::Char => {
                    if c == '\'' && !text.ends_with('\\') {
                        mode = TokenMode::None;
                    }
                }
            }
            text.push(c);
            self.cursor += c.len_utf8();
        }

        if text.is_empty() {
            None
        } else {
            Some(SubToken {
                text,
                column: start + 1,
            })
        }
    }

    /// Collect all remaining sub-tokens.
    pub fn tokens(line: &str) -> Vec<SubToken> {
        Scanner::new(line).collect()
    }

    fn peek(&self) -> Option<char> {
        self.line[self.cursor..].chars().next()
    }

    fn skip_triggers(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | ',' | '\t' => self.cursor += 1,
                ';' => {
                    // Comment; nothing left to scan on this line.
                    self.cursor = self.line.len();
                }
                _ => break,
            }
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = SubToken;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::Scanner;

    fn texts(line: &str) -> Vec<String> {
        Scanner::tokens(line).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn splits_on_spaces_and_commas_and_drops_comment() {
        assert_eq!(texts("mov r0, 5 ; comment"), vec!["mov", "r0", "5"]);
    }

    #[test]
    fn quoted_string_is_one_token_with_quotes_kept() {
        assert_eq!(texts("ldb r1, \"a,b;c\""), vec!["ldb", "r1", "\"a,b;c\""]);
    }

    #[test]
    fn escaped_quote_does_not_close_string_mode() {
        assert_eq!(texts("db \"he said \\\" hi\""), vec!["db", "\"he said \\\" hi\""]);
    }

    #[test]
    fn char_literal_keeps_delimiters_inside() {
        assert_eq!(texts("mov r0, ' '"), vec!["mov", "r0", "' '"]);
    }

    #[test]
    fn comment_only_line_yields_nothing() {
        assert!(texts("; nothing here").is_empty());
        assert!(texts("").is_empty());
        assert!(texts("  \t ,, ").is_empty());
    }

    #[test]
    fn columns_are_one_based_token_starts() {
        let tokens = Scanner::tokens("mov r0, 5");
        assert_eq!(tokens[0].column, 1);
        assert_eq!(tokens[1].column, 5);
        assert_eq!(tokens[2].column, 9);
    }

    #[test]
    fn non_ascii_quoted_text_is_preserved() {
        let tokens = Scanner::tokens("db \"héllo\", 'é'");
        assert_eq!(tokens[1].text, "\"héllo\"");
        assert_eq!(tokens[2].text, "'é'");
        assert_eq!(tokens[1].text.as_bytes(), "\"héllo\"".as_bytes());
    }

    #[test]
    fn long_tokens_are_not_truncated() {
        let long = "x".repeat(2048);
        let tokens = Scanner::tokens(&long);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text.len(), 2048);
    }
}
