//! Python syntax highlighting
//!
//! A line-at-a-time tokenizer in the spirit of a rule-based highlighter: it
//! does not parse Python, it only recognises enough shape (keywords, strings,
//! comments, numbers, definitions) to colour a MicroPython script. The only
//! state carried from one line to the next is whether a triple-quoted string
//! is still open.

use rustc_hash::FxHashSet;
use std::sync::OnceLock;

const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

const BUILTINS: &[&str] = &[
    "abs", "all", "any", "bin", "bool", "bytearray", "bytes", "callable", "chr", "dict", "dir",
    "divmod", "enumerate", "eval", "exec", "filter", "float", "getattr", "hasattr", "hash", "help",
    "hex", "id", "input", "int", "isinstance", "iter", "len", "list", "map", "max", "min", "next",
    "object", "oct", "open", "ord", "pow", "print", "range", "repr", "reversed", "round", "set",
    "setattr", "sorted", "str", "sum", "super", "tuple", "type", "zip",
];

/// Letters that may prefix a string literal (`r"..."`, `b'...'`, `f"..."`)
const STRING_PREFIXES: &[&str] = &["r", "b", "f", "u", "rb", "br", "fr", "rf"];

fn keywords() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| KEYWORDS.iter().copied().collect())
}

fn builtins() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| BUILTINS.iter().copied().collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plain,
    Keyword,
    /// `True`, `False`, `None`
    Constant,
    SelfRef,
    Builtin,
    /// Name following `def` or `class`
    Definition,
    /// Identifier directly followed by `(`
    Call,
    Number,
    Str,
    Comment,
    Decorator,
    Bracket,
    Operator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// Highlighter state at a line boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineState {
    #[default]
    Normal,
    /// Inside a triple-quoted string opened with this quote character
    InTriple(char),
}

struct Tokenizer<'a> {
    chars: &'a [char],
    tokens: Vec<Token>,
}

impl Tokenizer<'_> {
    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let text: String = self.chars[start..end].iter().collect();
        // Merge runs so a plain stretch of text stays one span
        if let Some(last) = self.tokens.last_mut() {
            if last.kind == kind && matches!(kind, TokenKind::Plain | TokenKind::Str) {
                last.text.push_str(&text);
                return;
            }
        }
        self.tokens.push(Token { kind, text });
    }

    fn is_triple(&self, i: usize, quote: char) -> bool {
        i + 2 < self.chars.len() && self.chars[i + 1] == quote && self.chars[i + 2] == quote
    }

    /// Index just past the closing triple quote at or after `from`
    fn find_triple_end(&self, from: usize, quote: char) -> Option<usize> {
        let mut i = from;
        while i < self.chars.len() {
            if self.chars[i] == '\\' {
                i += 2;
                continue;
            }
            if self.chars[i] == quote && self.is_triple(i, quote) {
                return Some(i + 3);
            }
            i += 1;
        }
        None
    }

    /// Index just past the closing quote of a single-line string
    fn find_quote_end(&self, from: usize, quote: char) -> usize {
        let mut i = from;
        while i < self.chars.len() {
            match self.chars[i] {
                '\\' => i += 2,
                c if c == quote => return i + 1,
                _ => i += 1,
            }
        }
        self.chars.len()
    }

    /// Consume a string starting at `start` whose quote is at `quote_at`.
    /// Returns the resume index and the state for the next line.
    fn string(&mut self, start: usize, quote_at: usize) -> (usize, LineState) {
        let quote = self.chars[quote_at];
        if self.is_triple(quote_at, quote) {
            match self.find_triple_end(quote_at + 3, quote) {
                Some(end) => {
                    self.push(TokenKind::Str, start, end);
                    (end, LineState::Normal)
                }
                None => {
                    self.push(TokenKind::Str, start, self.chars.len());
                    (self.chars.len(), LineState::InTriple(quote))
                }
            }
        } else {
            let end = self.find_quote_end(quote_at + 1, quote);
            self.push(TokenKind::Str, start, end);
            (end, LineState::Normal)
        }
    }

    fn next_non_space(&self, from: usize) -> Option<char> {
        self.chars[from..].iter().copied().find(|c| !c.is_whitespace())
    }
}

/// Split `line` into highlight tokens, starting in `state`.
///
/// Returns the tokens and the state the next line starts in.
pub fn tokenize_line(line: &str, state: LineState) -> (Vec<Token>, LineState) {
    let chars: Vec<char> = line.chars().collect();
    let mut tz = Tokenizer {
        chars: &chars,
        tokens: Vec::new(),
    };
    let mut i = 0;
    let mut state = state;
    let mut expect_name = false;

    if let LineState::InTriple(quote) = state {
        match tz.find_triple_end(0, quote) {
            Some(end) => {
                tz.push(TokenKind::Str, 0, end);
                i = end;
                state = LineState::Normal;
            }
            None => {
                tz.push(TokenKind::Str, 0, chars.len());
                return (tz.tokens, state);
            }
        }
    }

    while i < chars.len() {
        let c = chars[i];

        if c == '#' {
            tz.push(TokenKind::Comment, i, chars.len());
            break;
        }

        if c == '"' || c == '\'' {
            let (next, next_state) = tz.string(i, i);
            i = next;
            state = next_state;
            continue;
        }

        if c.is_whitespace() {
            let start = i;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            tz.push(TokenKind::Plain, start, i);
            continue;
        }

        if c == '@' && chars[..i].iter().all(|c| c.is_whitespace()) {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                i += 1;
            }
            tz.push(TokenKind::Decorator, start, i);
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                i += 1;
            }
            tz.push(TokenKind::Number, start, i);
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();

            if i < chars.len()
                && (chars[i] == '"' || chars[i] == '\'')
                && STRING_PREFIXES.contains(&word.to_ascii_lowercase().as_str())
            {
                let (next, next_state) = tz.string(start, i);
                i = next;
                state = next_state;
                continue;
            }

            let kind = if expect_name {
                expect_name = false;
                TokenKind::Definition
            } else if keywords().contains(word.as_str()) {
                expect_name = word == "def" || word == "class";
                TokenKind::Keyword
            } else if matches!(word.as_str(), "True" | "False" | "None") {
                TokenKind::Constant
            } else if word == "self" {
                TokenKind::SelfRef
            } else if tz.next_non_space(i) == Some('(') {
                if builtins().contains(word.as_str()) {
                    TokenKind::Builtin
                } else {
                    TokenKind::Call
                }
            } else {
                TokenKind::Plain
            };
            tz.push(kind, start, i);
            continue;
        }

        let kind = match c {
            '(' | ')' | '[' | ']' | '{' | '}' => TokenKind::Bracket,
            ',' | '.' | ';' => TokenKind::Plain,
            _ => TokenKind::Operator,
        };
        tz.push(kind, i, i + 1);
        i += 1;
    }

    (tz.tokens, state)
}

/// Highlighter state at the start of each line, filled in lazily from the
/// top of the file and kept between frames
#[derive(Debug, Clone, Default)]
pub struct StateCache {
    /// `starts[i]` is the state at the start of line `i`
    starts: Vec<LineState>,
}

impl StateCache {
    /// Drop the states of every line after `row`
    pub fn invalidate_from(&mut self, row: usize) {
        self.starts.truncate(row + 1);
    }

    /// Number of lines whose starting state is known
    pub fn known(&self) -> usize {
        self.starts.len()
    }

    /// State at the start of line `row`, scanning only the lines past the
    /// last known one
    pub fn state_at<'a>(&mut self, lines: impl Iterator<Item = &'a str>, row: usize) -> LineState {
        if self.starts.is_empty() {
            self.starts.push(LineState::Normal);
        }
        let known = self.starts.len() - 1;
        if row > known {
            let mut state = self.starts[known];
            for line in lines.skip(known).take(row - known) {
                state = tokenize_line(line, state).1;
                self.starts.push(state);
            }
        }
        self.starts
            .get(row)
            .or(self.starts.last())
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<(TokenKind, String)> {
        tokenize_line(line, LineState::Normal)
            .0
            .into_iter()
            .filter(|t| !t.text.trim().is_empty())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_def_line() {
        let tokens = kinds("def blink(pin):");
        assert_eq!(tokens[0], (TokenKind::Keyword, "def".to_string()));
        assert_eq!(tokens[1], (TokenKind::Definition, "blink".to_string()));
        assert_eq!(tokens[2], (TokenKind::Bracket, "(".to_string()));
        assert_eq!(tokens[3], (TokenKind::Plain, "pin".to_string()));
        assert_eq!(tokens[5], (TokenKind::Operator, ":".to_string()));
    }

    #[test]
    fn test_calls_builtins_and_numbers() {
        let tokens = kinds("time.sleep(0.5); print(x)");
        assert!(tokens.contains(&(TokenKind::Call, "sleep".to_string())));
        assert!(tokens.contains(&(TokenKind::Number, "0.5".to_string())));
        assert!(tokens.contains(&(TokenKind::Builtin, "print".to_string())));
    }

    #[test]
    fn test_comment_and_string() {
        let tokens = kinds("led = Pin('LED')  # onboard # led");
        assert!(tokens.contains(&(TokenKind::Str, "'LED'".to_string())));
        assert_eq!(
            tokens.last(),
            Some(&(TokenKind::Comment, "# onboard # led".to_string()))
        );
    }

    #[test]
    fn test_hash_inside_string_is_not_comment() {
        let tokens = kinds(r#"s = "a # b""#);
        assert_eq!(tokens.last(), Some(&(TokenKind::Str, "\"a # b\"".to_string())));
    }

    #[test]
    fn test_string_prefix() {
        let tokens = kinds(r#"p = rb"\x00""#);
        assert_eq!(tokens.last(), Some(&(TokenKind::Str, "rb\"\\x00\"".to_string())));
    }

    #[test]
    fn test_decorator_and_constants() {
        assert_eq!(kinds("@micropython.native")[0].0, TokenKind::Decorator);
        let tokens = kinds("done = True if self.x is None else False");
        assert!(tokens.contains(&(TokenKind::Constant, "True".to_string())));
        assert!(tokens.contains(&(TokenKind::Constant, "None".to_string())));
        assert!(tokens.contains(&(TokenKind::SelfRef, "self".to_string())));
    }

    #[test]
    fn test_triple_quote_spans_lines() {
        let lines = ["x = 1", "\"\"\"Blink the", "onboard LED", "\"\"\" + y", "z = 2"];

        let (_, s1) = tokenize_line(lines[1], LineState::Normal);
        assert_eq!(s1, LineState::InTriple('"'));

        let (tokens, s2) = tokenize_line(lines[2], s1);
        assert_eq!(tokens, vec![Token { kind: TokenKind::Str, text: "onboard LED".to_string() }]);
        assert_eq!(s2, LineState::InTriple('"'));

        let (tokens, s3) = tokenize_line(lines[3], s2);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text, "\"\"\"");
        assert_eq!(s3, LineState::Normal);

        let mut cache = StateCache::default();
        assert_eq!(cache.state_at(lines.iter().copied(), 2), LineState::InTriple('"'));
        assert_eq!(cache.state_at(lines.iter().copied(), 4), LineState::Normal);
    }

    #[test]
    fn test_state_cache_reuses_and_invalidates() {
        let mut lines = vec!["a = 1", "b = '''", "text", "'''", "c = 2"];
        let mut cache = StateCache::default();

        assert_eq!(cache.state_at(lines.iter().copied(), 3), LineState::InTriple('\''));
        assert_eq!(cache.known(), 4);
        // Earlier rows come from the cache
        assert_eq!(cache.state_at(lines.iter().copied(), 2), LineState::InTriple('\''));
        assert_eq!(cache.known(), 4);

        // Closing the string on line 1 changes every later state
        lines[1] = "b = ''''''";
        cache.invalidate_from(1);
        assert_eq!(cache.known(), 2);
        assert_eq!(cache.state_at(lines.iter().copied(), 3), LineState::Normal);
        assert_eq!(cache.state_at(lines.iter().copied(), 4), LineState::InTriple('\''));
    }

    #[test]
    fn test_tokens_cover_whole_line() {
        let line = "for i in range(10):  x[i] += 'a\\'b'  # done";
        let (tokens, _) = tokenize_line(line, LineState::Normal);
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, line);
    }
}
