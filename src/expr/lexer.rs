use std::ops::Range;

use logos::Logos;

use crate::error::ParseError;

/// A lexical token of the expression language.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    /// Numeric literal such as `4` or `3.14`.
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
    /// String literal in single or double quotes. No escapes.
    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r"'[^']*'", unquote)]
    Str(String),
    /// Variable, function or literal-alias name.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
    #[token("=>")]
    Arrow,
    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<>")]
    LtGt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("**")]
    StarStar,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

fn unquote(lex: &logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    slice[1..slice.len() - 1].to_string()
}

impl Token {
    /// Source-like rendering for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Number(n) => crate::core::variable::format_number(*n),
            Self::Str(s) => format!("{s:?}"),
            Self::Ident(name) => name.clone(),
            Self::Arrow => "=>".into(),
            Self::EqEq => "==".into(),
            Self::Eq => "=".into(),
            Self::NotEq => "!=".into(),
            Self::LtGt => "<>".into(),
            Self::Le => "<=".into(),
            Self::Ge => ">=".into(),
            Self::Lt => "<".into(),
            Self::Gt => ">".into(),
            Self::Plus => "+".into(),
            Self::Minus => "-".into(),
            Self::StarStar => "**".into(),
            Self::Star => "*".into(),
            Self::Slash => "/".into(),
            Self::Percent => "%".into(),
            Self::Caret => "^".into(),
            Self::Dot => ".".into(),
            Self::Comma => ",".into(),
            Self::LParen => "(".into(),
            Self::RParen => ")".into(),
            Self::LBracket => "[".into(),
            Self::RBracket => "]".into(),
        }
    }
}

/// A token together with its byte range in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Range<usize>,
}

/// Split an expression into tokens.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    Token::lexer(source)
        .spanned()
        .map(|(token, span)| match token {
            Ok(token) => Ok(SpannedToken { token, span }),
            Err(()) => Err(ParseError::invalid(
                source,
                format!("unexpected character `{}`", &source[span]),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_numbers_and_operators() {
        assert_eq!(
            kinds("1 + 2.5 ** 3"),
            vec![Token::Number(1.0), Token::Plus, Token::Number(2.5), Token::StarStar, Token::Number(3.0)]
        );
    }

    #[test]
    fn test_comparisons_prefer_longest_match() {
        assert_eq!(
            kinds("a <= b <> c == d = e => f"),
            vec![
                Token::Ident("a".into()),
                Token::Le,
                Token::Ident("b".into()),
                Token::LtGt,
                Token::Ident("c".into()),
                Token::EqEq,
                Token::Ident("d".into()),
                Token::Eq,
                Token::Ident("e".into()),
                Token::Arrow,
                Token::Ident("f".into()),
            ]
        );
    }

    #[test]
    fn test_strings_have_no_escapes() {
        assert_eq!(kinds(r#""it's" 'say "hi"'"#), vec![Token::Str("it's".into()), Token::Str("say \"hi\"".into())]);
    }

    #[test]
    fn test_spans_track_whitespace() {
        let tokens = tokenize("card . suit").unwrap();
        assert_eq!(tokens[0].span, 0..4);
        assert_eq!(tokens[1].span, 5..6);
        assert_eq!(tokens[2].span, 7..11);
    }

    #[test]
    fn test_unknown_character_is_rejected() {
        let err = tokenize("1 & 2").unwrap_err();
        assert!(err.to_string().contains("unexpected character `&`"));
    }
}
