//! Token kinds produced by the lexer.

use cairn_common::span::Span;

/// The kind of a lexed token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Literals and names
    Identifier,
    IntegerLiteral,
    FixedPointLiteral,
    StringLiteral,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    /// `?.`
    QuestionDot,
    Question,
    /// `??`
    DoubleQuestion,
    Exclamation,
    At,
    Hash,
    Ampersand,
    Slash,

    // Operators
    Plus,
    Minus,
    Star,
    Percent,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    EqualEqual,
    NotEqual,
    Equal,
    /// `&&`
    DoubleAmpersand,
    /// `||`
    DoubleVerticalBar,
    /// `<-`
    LeftArrow,
    /// `<->`
    Swap,

    // Keywords
    KwLet,
    KwVar,
    KwFun,
    KwInit,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwIn,
    KwReturn,
    KwBreak,
    KwContinue,
    KwDestroy,
    KwEmit,
    KwCreate,
    KwView,
    KwPub,
    KwPriv,
    KwAccess,
    KwContract,
    KwResource,
    KwStruct,
    KwEvent,
    KwAttachment,
    KwInterface,
    KwTransaction,
    KwImport,
    KwFrom,
    KwAs,
    KwAuth,
    KwNil,
    KwTrue,
    KwFalse,
    KwPrepare,
    KwExecute,

    Eof,
}

impl TokenKind {
    /// Keyword lookup for an identifier-shaped lexeme.
    #[must_use]
    pub fn keyword(text: &str) -> Option<TokenKind> {
        Some(match text {
            "let" => TokenKind::KwLet,
            "var" => TokenKind::KwVar,
            "fun" => TokenKind::KwFun,
            "init" => TokenKind::KwInit,
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "while" => TokenKind::KwWhile,
            "for" => TokenKind::KwFor,
            "in" => TokenKind::KwIn,
            "return" => TokenKind::KwReturn,
            "break" => TokenKind::KwBreak,
            "continue" => TokenKind::KwContinue,
            "destroy" => TokenKind::KwDestroy,
            "emit" => TokenKind::KwEmit,
            "create" => TokenKind::KwCreate,
            "view" => TokenKind::KwView,
            "pub" => TokenKind::KwPub,
            "priv" => TokenKind::KwPriv,
            "access" => TokenKind::KwAccess,
            "contract" => TokenKind::KwContract,
            "resource" => TokenKind::KwResource,
            "struct" => TokenKind::KwStruct,
            "event" => TokenKind::KwEvent,
            "attachment" => TokenKind::KwAttachment,
            "interface" => TokenKind::KwInterface,
            "transaction" => TokenKind::KwTransaction,
            "import" => TokenKind::KwImport,
            "from" => TokenKind::KwFrom,
            "as" => TokenKind::KwAs,
            "auth" => TokenKind::KwAuth,
            "nil" => TokenKind::KwNil,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            "prepare" => TokenKind::KwPrepare,
            "execute" => TokenKind::KwExecute,
            _ => return None,
        })
    }

    /// Whether this token can start a statement-terminating boundary; used
    /// by error messages only.
    #[must_use]
    pub const fn is_eof(self) -> bool {
        matches!(self, TokenKind::Eof)
    }
}

/// A lexed token: kind, source span, and the unescaped string value for
/// string literals.
#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Unescaped contents for `StringLiteral` tokens.
    pub string_value: Option<String>,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            string_value: None,
        }
    }
}
