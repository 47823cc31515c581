//! SPARQL tokens - the atomic units of SPARQL output.

/// SPARQL token - every element the query builder can emit.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Prefix,
    Select,
    Distinct,
    Where,
    Optional,
    Filter,
    OrderBy,
    Asc,
    Desc,
    Limit,
    Offset,
    As,
    /// `a`, shorthand for `rdf:type`
    A,

    // === Punctuation ===
    Dot,
    Semicolon,
    Comma,
    Star,
    LBrace,
    RBrace,
    LParen,
    RParen,

    // === Operators ===
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),

    // === Dynamic Content ===
    /// Variable, rendered with a leading `?`
    Var(String),
    /// Prefixed name: `prefix:local` (empty prefix renders `:local`)
    PrefixedName { prefix: String, local: String },
    /// Full IRI, rendered in angle brackets
    Iri(String),
    /// Integer literal
    LitInt(i64),
    /// Float literal
    LitFloat(f64),
    /// String literal
    LitString(String),

    // === Function Names ===
    FunctionName(String),
}

impl Token {
    /// Serialize this token to a string.
    pub fn serialize(&self) -> String {
        match self {
            // Keywords
            Token::Prefix => "PREFIX".into(),
            Token::Select => "SELECT".into(),
            Token::Distinct => "DISTINCT".into(),
            Token::Where => "WHERE".into(),
            Token::Optional => "OPTIONAL".into(),
            Token::Filter => "FILTER".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Asc => "ASC".into(),
            Token::Desc => "DESC".into(),
            Token::Limit => "LIMIT".into(),
            Token::Offset => "OFFSET".into(),
            Token::As => "AS".into(),
            Token::A => "a".into(),

            // Punctuation
            Token::Dot => ".".into(),
            Token::Semicolon => ";".into(),
            Token::Comma => ",".into(),
            Token::Star => "*".into(),
            Token::LBrace => "{".into(),
            Token::RBrace => "}".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            // Operators
            Token::And => "&&".into(),
            Token::Or => "||".into(),
            Token::Not => "!".into(),
            Token::Eq => "=".into(),
            Token::Ne => "!=".into(),
            Token::Lt => "<".into(),
            Token::Gt => ">".into(),
            Token::Lte => "<=".into(),
            Token::Gte => ">=".into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => "  ".repeat(*n),

            // Dynamic
            Token::Var(name) => format!("?{}", name),
            Token::PrefixedName { prefix, local } => format!("{}:{}", prefix, local),
            Token::Iri(iri) => format!("<{}>", iri),
            Token::LitInt(n) => n.to_string(),
            Token::LitFloat(f) => {
                if f.is_nan() {
                    panic!("Cannot serialize NaN to SPARQL")
                }
                if f.is_infinite() {
                    panic!("Cannot serialize Infinity to SPARQL")
                }
                let mut buffer = ryu::Buffer::new();
                buffer.format(*f).to_string()
            }
            Token::LitString(s) => quote_string(s),
            Token::FunctionName(name) => name.to_uppercase(),
        }
    }
}

/// Quote a string literal, escaping what SPARQL's `STRING_LITERAL2` forbids.
fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A stream of tokens that can be serialized to SPARQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Extend with multiple tokens.
    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialize all tokens to a SPARQL string.
    pub fn serialize(&self) -> String {
        self.tokens.iter().map(Token::serialize).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
    pub fn var(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(Token::Var(name.into()))
    }
}
