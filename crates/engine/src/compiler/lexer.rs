//! Tokenizer for compilable units.

use super::error::{CompileError, CompileResult, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Module,
    Use,
    Fn,
    Let,
    If,
    Else,
    For,
    In,
    Return,
    True,
    False,
    Null,

    // Literals
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),

    // Symbols
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    Comma,      // ,
    Semi,       // ;
    Colon,      // :
    ColonColon, // ::
    Dot,        // .
    DotDot,     // ..
    Arrow,      // ->
    Assign,     // =
    EqEq,       // ==
    NotEq,      // !=
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Bang,       // !
    AndAnd,     // &&
    OrOr,       // ||

    Eof,
}

impl TokenKind {
    /// Human readable name for diagnostics
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Module => "'module'".into(),
            TokenKind::Use => "'use'".into(),
            TokenKind::Fn => "'fn'".into(),
            TokenKind::Let => "'let'".into(),
            TokenKind::If => "'if'".into(),
            TokenKind::Else => "'else'".into(),
            TokenKind::For => "'for'".into(),
            TokenKind::In => "'in'".into(),
            TokenKind::Return => "'return'".into(),
            TokenKind::True => "'true'".into(),
            TokenKind::False => "'false'".into(),
            TokenKind::Null => "'null'".into(),
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Int(v) => format!("integer {v}"),
            TokenKind::Float(v) => format!("number {v}"),
            TokenKind::Str(_) => "string literal".into(),
            TokenKind::LParen => "'('".into(),
            TokenKind::RParen => "')'".into(),
            TokenKind::LBrace => "'{'".into(),
            TokenKind::RBrace => "'}'".into(),
            TokenKind::Comma => "','".into(),
            TokenKind::Semi => "';'".into(),
            TokenKind::Colon => "':'".into(),
            TokenKind::ColonColon => "'::'".into(),
            TokenKind::Dot => "'.'".into(),
            TokenKind::DotDot => "'..'".into(),
            TokenKind::Arrow => "'->'".into(),
            TokenKind::Assign => "'='".into(),
            TokenKind::EqEq => "'=='".into(),
            TokenKind::NotEq => "'!='".into(),
            TokenKind::Lt => "'<'".into(),
            TokenKind::LtEq => "'<='".into(),
            TokenKind::Gt => "'>'".into(),
            TokenKind::GtEq => "'>='".into(),
            TokenKind::Plus => "'+'".into(),
            TokenKind::Minus => "'-'".into(),
            TokenKind::Star => "'*'".into(),
            TokenKind::Slash => "'/'".into(),
            TokenKind::Percent => "'%'".into(),
            TokenKind::Bang => "'!'".into(),
            TokenKind::AndAnd => "'&&'".into(),
            TokenKind::OrOr => "'||'".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let span = self.span();
            let Some(c) = self.peek() else {
                tokens.push(Token { kind: TokenKind::Eof, span });
                return Ok(tokens);
            };
            let kind = if c.is_ascii_digit() {
                self.number(span)?
            } else if c == '"' {
                self.string(span)?
            } else if c.is_alphabetic() || c == '_' {
                self.word()
            } else {
                self.symbol(c, span)?
            };
            tokens.push(Token { kind, span });
        }
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) -> CompileResult<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.span();
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(CompileError::new("unterminated block comment", start));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn number(&mut self, span: Span) -> CompileResult<TokenKind> {
        let mut text = String::new();
        let mut is_float = false;
        self.digits(&mut text);

        // `0..n` is a range, not a float
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push('.');
            self.bump();
            self.digits(&mut text);
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push('e');
                self.bump();
                if sign {
                    text.extend(self.bump());
                }
                self.digits(&mut text);
            }
        }

        if matches!(self.peek(), Some('f' | 'F')) {
            is_float = true;
            self.bump();
        }

        if self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return Err(CompileError::new(
                format!("invalid numeric literal '{text}{}'", self.peek().unwrap_or_default()),
                span,
            ));
        }

        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| CompileError::new(format!("invalid number '{text}'"), span))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| CompileError::new(format!("integer literal '{text}' is out of range"), span))
        }
    }

    fn digits(&mut self, out: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                out.push(c);
                self.bump();
            } else if c == '_' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn string(&mut self, span: Span) -> CompileResult<TokenKind> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(TokenKind::Str(value)),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(other) => {
                            return Err(CompileError::new(
                                format!("unknown escape sequence '\\{other}'"),
                                span,
                            ))
                        }
                        None => break,
                    };
                    value.push(escaped);
                }
                Some('\n') | None => break,
                Some(c) => value.push(c),
            }
        }
        Err(CompileError::new("unterminated string literal", span))
    }

    fn word(&mut self) -> TokenKind {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match word.as_str() {
            "module" => TokenKind::Module,
            "use" => TokenKind::Use,
            "fn" => TokenKind::Fn,
            "let" => TokenKind::Let,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident(word),
        }
    }

    fn symbol(&mut self, c: char, span: Span) -> CompileResult<TokenKind> {
        let next = self.peek_at(1);
        let (kind, len) = match (c, next) {
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            (',', _) => (TokenKind::Comma, 1),
            (';', _) => (TokenKind::Semi, 1),
            (':', Some(':')) => (TokenKind::ColonColon, 2),
            (':', _) => (TokenKind::Colon, 1),
            ('.', Some('.')) => (TokenKind::DotDot, 2),
            ('.', _) => (TokenKind::Dot, 1),
            ('-', Some('>')) => (TokenKind::Arrow, 2),
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('=', _) => (TokenKind::Assign, 1),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('!', _) => (TokenKind::Bang, 1),
            ('<', Some('=')) => (TokenKind::LtEq, 2),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', Some('=')) => (TokenKind::GtEq, 2),
            ('>', _) => (TokenKind::Gt, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            _ => return Err(CompileError::new(format!("unexpected character '{c}'"), span)),
        };
        for _ in 0..len {
            self.bump();
        }
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_range_is_not_float() {
        assert_eq!(
            kinds("0..10"),
            vec![TokenKind::Int(0), TokenKind::DotDot, TokenKind::Int(10), TokenKind::Eof]
        );
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(kinds("1.5")[0], TokenKind::Float(1.5));
        assert_eq!(kinds("2f")[0], TokenKind::Float(2.0));
        assert_eq!(kinds("0.25f")[0], TokenKind::Float(0.25));
        assert_eq!(kinds("1e3")[0], TokenKind::Float(1000.0));
    }

    #[test]
    fn test_static_path_tokens() {
        assert_eq!(
            kinds("graphics.Color::RED"),
            vec![
                TokenKind::Ident("graphics".into()),
                TokenKind::Dot,
                TokenKind::Ident("Color".into()),
                TokenKind::ColonColon,
                TokenKind::Ident("RED".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(kinds("// a\n/* b \n c */ x"), vec![TokenKind::Ident("x".into()), TokenKind::Eof]);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(kinds(r#""a\"b\n""#)[0], TokenKind::Str("a\"b\n".into()));
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!(tokens[1].span, Span::new(2, 3));
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new("\"open").tokenize().is_err());
        assert!(Lexer::new("/* open").tokenize().is_err());
        assert!(Lexer::new("a # b").tokenize().is_err());
        assert!(Lexer::new("99999999999999999999").tokenize().is_err());
        assert!(Lexer::new("12abc").tokenize().is_err());
    }
}
