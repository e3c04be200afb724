//! Raw token recognizer.

use logos::Logos;
use luma_ir::TokenKind;

/// The `logos`-derived state machine. One variant per [`TokenKind`]
/// (minus `Eof`, which the wrapper appends).
#[derive(Logos, Copy, Clone, Eq, PartialEq, Debug)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum RawToken {
    #[regex(r"[0-9]+\.[0-9]+")]
    Float,
    #[regex(r"[0-9]+")]
    Int,
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,
    #[regex(r"'([^'\\]|\\.)'")]
    Char,

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    #[token("const")]
    Const,
    #[token("let")]
    Let,
    #[token("var")]
    Var,
    #[token("pub")]
    Pub,
    #[token("priv")]
    Priv,
    #[token("fn")]
    Fn,
    #[token("struct")]
    Struct,
    #[token("enum")]
    Enum,
    #[token("impl")]
    Impl,
    #[token("as")]
    As,
    #[token("own")]
    Own,

    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("loop")]
    Loop,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("defer")]
    Defer,

    #[token("int")]
    TyInt,
    #[token("i32")]
    TyI32,
    #[token("i8")]
    TyI8,
    #[token("float")]
    TyFloat,
    #[token("double")]
    TyDouble,
    #[token("bool")]
    TyBool,
    #[token("char")]
    TyChar,
    #[token("str")]
    TyStr,
    #[token("void")]
    TyVoid,

    #[token("@module")]
    AtModule,
    #[token("@use")]
    AtUse,
    #[token("@cast")]
    AtCast,
    #[token("@sizeof")]
    AtSizeof,
    #[token("@alloc")]
    AtAlloc,
    #[token("@free")]
    AtFree,
    #[token("@input")]
    AtInput,
    #[token("@system")]
    AtSystem,
    #[token("@syscall")]
    AtSyscall,
    #[token("@print")]
    AtPrint,
    #[token("@println")]
    AtPrintln,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,
    #[token("..")]
    DotDot,
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("=")]
    Assign,
    #[token("++")]
    PlusPlus,
    #[token("+")]
    Plus,
    #[token("--")]
    MinusMinus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<<")]
    Shl,
    #[token("<=")]
    LtEq,
    #[token("<")]
    Lt,
    #[token(">>")]
    Shr,
    #[token(">=")]
    GtEq,
    #[token(">")]
    Gt,
    #[token("&&")]
    AndAnd,
    #[token("&")]
    Amp,
    #[token("||")]
    OrOr,
    #[token("|")]
    Pipe,
    #[token("!")]
    Bang,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
}

impl RawToken {
    /// Map to the shared [`TokenKind`].
    pub fn kind(self) -> TokenKind {
        match self {
            RawToken::Int => TokenKind::Int,
            RawToken::Float => TokenKind::Float,
            RawToken::Str => TokenKind::Str,
            RawToken::Char => TokenKind::Char,
            RawToken::True => TokenKind::True,
            RawToken::False => TokenKind::False,
            RawToken::Null => TokenKind::Null,
            RawToken::Ident => TokenKind::Ident,
            RawToken::Const => TokenKind::Const,
            RawToken::Let => TokenKind::Let,
            RawToken::Var => TokenKind::Var,
            RawToken::Pub => TokenKind::Pub,
            RawToken::Priv => TokenKind::Priv,
            RawToken::Fn => TokenKind::Fn,
            RawToken::Struct => TokenKind::Struct,
            RawToken::Enum => TokenKind::Enum,
            RawToken::Impl => TokenKind::Impl,
            RawToken::As => TokenKind::As,
            RawToken::Own => TokenKind::Own,
            RawToken::Return => TokenKind::Return,
            RawToken::If => TokenKind::If,
            RawToken::Elif => TokenKind::Elif,
            RawToken::Else => TokenKind::Else,
            RawToken::Loop => TokenKind::Loop,
            RawToken::Switch => TokenKind::Switch,
            RawToken::Case => TokenKind::Case,
            RawToken::Default => TokenKind::Default,
            RawToken::Break => TokenKind::Break,
            RawToken::Continue => TokenKind::Continue,
            RawToken::Defer => TokenKind::Defer,
            RawToken::TyInt => TokenKind::TyInt,
            RawToken::TyI32 => TokenKind::TyI32,
            RawToken::TyI8 => TokenKind::TyI8,
            RawToken::TyFloat => TokenKind::TyFloat,
            RawToken::TyDouble => TokenKind::TyDouble,
            RawToken::TyBool => TokenKind::TyBool,
            RawToken::TyChar => TokenKind::TyChar,
            RawToken::TyStr => TokenKind::TyStr,
            RawToken::TyVoid => TokenKind::TyVoid,
            RawToken::AtModule => TokenKind::AtModule,
            RawToken::AtUse => TokenKind::AtUse,
            RawToken::AtCast => TokenKind::AtCast,
            RawToken::AtSizeof => TokenKind::AtSizeof,
            RawToken::AtAlloc => TokenKind::AtAlloc,
            RawToken::AtFree => TokenKind::AtFree,
            RawToken::AtInput => TokenKind::AtInput,
            RawToken::AtSystem => TokenKind::AtSystem,
            RawToken::AtSyscall => TokenKind::AtSyscall,
            RawToken::AtPrint => TokenKind::AtPrint,
            RawToken::AtPrintln => TokenKind::AtPrintln,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Colon => TokenKind::Colon,
            RawToken::ColonColon => TokenKind::ColonColon,
            RawToken::Dot => TokenKind::Dot,
            RawToken::DotDot => TokenKind::DotDot,
            RawToken::Arrow => TokenKind::Arrow,
            RawToken::Assign => TokenKind::Assign,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::PlusPlus => TokenKind::PlusPlus,
            RawToken::MinusMinus => TokenKind::MinusMinus,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::Gt => TokenKind::Gt,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::AndAnd => TokenKind::AndAnd,
            RawToken::OrOr => TokenKind::OrOr,
            RawToken::Bang => TokenKind::Bang,
            RawToken::Amp => TokenKind::Amp,
            RawToken::Pipe => TokenKind::Pipe,
            RawToken::Caret => TokenKind::Caret,
            RawToken::Tilde => TokenKind::Tilde,
            RawToken::Shl => TokenKind::Shl,
            RawToken::Shr => TokenKind::Shr,
        }
    }
}
