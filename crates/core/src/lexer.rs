use crate::error::LexError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word that is neither a keyword nor a function name
    Ident(String),
    /// `{{Name}}` -- carries the trimmed name
    FieldRef(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    /// Integer literal, sign included
    Int(i64),
    /// TRUE / FALSE, any case
    Bool(bool),
    // Logical keywords, any case
    And,
    Or,
    Not,
    If,
    /// Word directly followed by `(`, upper-cased
    Function(String),
    // Operators
    Amp,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Plus,
    Minus,
    Star,
    Slash,
    // Punctuation
    LParen,
    RParen,
    Comma,
    // End of input
    Eof,
}

impl TokenKind {
    /// True for tokens after which a `+`/`-` is a binary operator rather
    /// than the sign of an integer literal.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident(_)
                | TokenKind::FieldRef(_)
                | TokenKind::Str(_)
                | TokenKind::Int(_)
                | TokenKind::Bool(_)
                | TokenKind::RParen
        )
    }

    /// Short human-readable description used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(w) => format!("identifier '{}'", w),
            TokenKind::FieldRef(n) => format!("field reference {{{{{}}}}}", n),
            TokenKind::Str(s) => format!("string {:?}", s),
            TokenKind::Int(n) => format!("integer {}", n),
            TokenKind::Bool(b) => format!("boolean {}", if *b { "TRUE" } else { "FALSE" }),
            TokenKind::And => "AND".to_owned(),
            TokenKind::Or => "OR".to_owned(),
            TokenKind::Not => "NOT".to_owned(),
            TokenKind::If => "IF".to_owned(),
            TokenKind::Function(name) => format!("function {}", name),
            TokenKind::Eof => "end of input".to_owned(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Amp => "&",
            TokenKind::Eq => "=",
            TokenKind::Neq => "<>",
            TokenKind::Lt => "<",
            TokenKind::Lte => "<=",
            TokenKind::Gt => ">",
            TokenKind::Gte => ">=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token as written
    pub text: String,
    /// Byte offset of the first character
    pub position: usize,
}

/// Split formula text into tokens. The returned list always ends with
/// [`TokenKind::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut pos = 0usize;

    let offset = |i: usize| chars.get(i).map(|(o, _)| *o).unwrap_or(src.len());
    let at = |i: usize| chars.get(i).map(|(_, c)| *c);

    // Spreadsheet-style leading '='
    while at(pos).is_some_and(char::is_whitespace) {
        pos += 1;
    }
    if at(pos) == Some('=') {
        pos += 1;
    }

    while let Some(c) = at(pos) {
        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let start_offset = offset(pos);

        // Field reference
        if c == '{' && at(pos + 1) == Some('{') {
            pos += 2;
            loop {
                match at(pos) {
                    None => {
                        return Err(LexError::UnterminatedFieldRef {
                            position: start_offset,
                        })
                    }
                    Some('}') if at(pos + 1) == Some('}') => break,
                    Some(_) => pos += 1,
                }
            }
            let name = src[offset(start + 2)..offset(pos)].trim().to_owned();
            pos += 2;
            if name.is_empty() {
                return Err(LexError::EmptyFieldRef {
                    position: start_offset,
                });
            }
            tokens.push(Token {
                kind: TokenKind::FieldRef(name),
                text: src[start_offset..offset(pos)].to_owned(),
                position: start_offset,
            });
            continue;
        }

        // String literal
        if c == '"' || c == '\'' {
            let quote = c;
            pos += 1;
            let mut s = String::new();
            loop {
                let Some(sc) = at(pos) else {
                    return Err(LexError::UnterminatedString {
                        position: start_offset,
                    });
                };
                if sc == quote {
                    pos += 1;
                    break;
                }
                if sc == '\\' {
                    match at(pos + 1) {
                        Some('\'') => s.push('\''),
                        Some('\\') => s.push('\\'),
                        Some(other) => {
                            s.push('\\');
                            s.push(other);
                        }
                        None => {
                            return Err(LexError::UnterminatedString {
                                position: start_offset,
                            })
                        }
                    }
                    pos += 2;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Str(s),
                text: src[start_offset..offset(pos)].to_owned(),
                position: start_offset,
            });
            continue;
        }

        // Integer literal, optionally signed when not following an operand
        let signed = (c == '-' || c == '+')
            && at(pos + 1).is_some_and(|d| d.is_ascii_digit())
            && !tokens.last().is_some_and(|t| t.kind.ends_operand());
        if c.is_ascii_digit() || signed {
            pos += 1;
            while at(pos).is_some_and(|d| d.is_ascii_digit()) {
                pos += 1;
            }
            let text = &src[start_offset..offset(pos)];
            let n: i64 = text.parse().map_err(|_| LexError::IntegerOutOfRange {
                position: start_offset,
            })?;
            tokens.push(Token {
                kind: TokenKind::Int(n),
                text: text.to_owned(),
                position: start_offset,
            });
            continue;
        }

        // Word: keyword, boolean, function name or identifier
        if c.is_alphabetic() || c == '_' {
            while at(pos).is_some_and(|w| w.is_alphanumeric() || w == '_') {
                pos += 1;
            }
            let word = &src[start_offset..offset(pos)];
            let upper = word.to_ascii_uppercase();
            let mut look = pos;
            while at(look).is_some_and(char::is_whitespace) {
                look += 1;
            }
            let called = at(look) == Some('(');
            let kind = match upper.as_str() {
                "AND" => TokenKind::And,
                "OR" => TokenKind::Or,
                "NOT" => TokenKind::Not,
                "IF" => TokenKind::If,
                "TRUE" => TokenKind::Bool(true),
                "FALSE" => TokenKind::Bool(false),
                _ if called => TokenKind::Function(upper),
                _ => TokenKind::Ident(word.to_owned()),
            };
            tokens.push(Token {
                kind,
                text: word.to_owned(),
                position: start_offset,
            });
            continue;
        }

        // Operators and punctuation
        let next = at(pos + 1);
        let (kind, width) = match (c, next) {
            ('<', Some('>')) => (TokenKind::Neq, 2),
            ('<', Some('=')) => (TokenKind::Lte, 2),
            ('>', Some('=')) => (TokenKind::Gte, 2),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('=', _) => (TokenKind::Eq, 1),
            ('&', _) => (TokenKind::Amp, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            (',', _) => (TokenKind::Comma, 1),
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    character: c,
                    position: start_offset,
                })
            }
        };
        pos += width;
        tokens.push(Token {
            kind,
            text: src[start_offset..offset(pos)].to_owned(),
            position: start_offset,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        position: src.len(),
    });
    Ok(tokens)
}
