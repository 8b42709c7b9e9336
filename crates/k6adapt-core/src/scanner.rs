//! Statement-aware recognition of export clauses in bundler output.
//!
//! The bundler emits a single named-exports statement of the shape
//! `export { optionsFn as options, defaultFn as default }`. The scanner walks
//! the artifact byte-wise, skipping comments, string literals and template
//! literals, and only recognizes `export` where a statement can start, so the
//! pattern is never matched inside embedded text.

/// Byte-offset range of a recognized clause within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A recognized `export { A as options, B as default }` clause.
///
/// `span` covers the full clause from the `export` keyword to the closing
/// brace, excluding any trailing semicolon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportClause {
    pub options_binding: String,
    pub default_binding: String,
    pub span: Span,
}

/// Identifier alphabet: ASCII letters, digits, underscore, and `$` (bundlers
/// mangle local names with `$`). Digits are not valid in leading position.
pub(crate) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

pub(crate) fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Scan `source` for export clauses of the shape
/// `export { A as options, B as default }`, in document order.
pub fn find_export_clauses(source: &str) -> Vec<ExportClause> {
    let bytes = source.as_bytes();
    let mut clauses = Vec::new();
    // Last significant code byte seen; comments do not update it.
    let mut last_sig: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = skip_line_comment(bytes, i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
            }
            b'\'' | b'"' => {
                i = skip_string(bytes, i, b);
                last_sig = Some(b);
            }
            b'`' => {
                i = skip_template(bytes, i);
                last_sig = Some(b);
            }
            _ if b.is_ascii_whitespace() => {
                i += 1;
            }
            _ => {
                if b == b'e'
                    && can_start_statement(last_sig)
                    && (i == 0 || !is_ident_char(bytes[i - 1]))
                {
                    if let Some(clause) = match_clause(source, i) {
                        i = clause.span.end;
                        last_sig = Some(b'}');
                        clauses.push(clause);
                        continue;
                    }
                }
                last_sig = Some(b);
                i += 1;
            }
        }
    }

    clauses
}

/// `export` is a statement keyword; it can only follow the start of the
/// document, a statement terminator, or a brace.
fn can_start_statement(last_sig: Option<u8>) -> bool {
    matches!(last_sig, None | Some(b';') | Some(b'{') | Some(b'}'))
}

fn skip_line_comment(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

fn skip_block_comment(bytes: &[u8], mut i: usize) -> usize {
    i += 2;
    while i < bytes.len() {
        if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
            return i + 2;
        }
        i += 1;
    }
    i
}

fn skip_string(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    i += 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    i
}

/// Skips to the closing backtick. Interpolation bodies are treated as opaque
/// template text; generated artifacts do not nest backticks inside them.
fn skip_template(bytes: &[u8], mut i: usize) -> usize {
    i += 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return i + 1,
            _ => i += 1,
        }
    }
    i
}

/// Attempt to match one full clause starting at the `export` keyword.
fn match_clause(source: &str, start: usize) -> Option<ExportClause> {
    let mut cur = Cursor::new(source, start);
    if !cur.keyword("export") {
        return None;
    }
    cur.skip_ws();
    if !cur.eat("{") {
        return None;
    }
    cur.skip_ws();
    let options_binding = cur.ident()?.to_string();
    if !cur.keyword("as") {
        return None;
    }
    cur.skip_ws();
    if cur.ident()? != "options" {
        return None;
    }
    cur.skip_ws();
    if !cur.eat(",") {
        return None;
    }
    cur.skip_ws();
    let default_binding = cur.ident()?.to_string();
    if !cur.keyword("as") {
        return None;
    }
    cur.skip_ws();
    if cur.ident()? != "default" {
        return None;
    }
    cur.skip_ws();
    if !cur.eat("}") {
        return None;
    }

    Some(ExportClause {
        options_binding,
        default_binding,
        span: Span::new(start, cur.pos),
    })
}

/// Token-level cursor over the clause grammar. Only ever advances over ASCII,
/// so positions stay on char boundaries.
struct Cursor<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str, pos: usize) -> Self {
        Self { source, pos }
    }

    fn bytes(&self) -> &'a [u8] {
        self.source.as_bytes()
    }

    fn skip_ws(&mut self) {
        while self
            .bytes()
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.source[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    /// Consume `kw` as a whole word: it must not run into a longer identifier
    /// (`exports`, `astronaut`, ...).
    fn keyword(&mut self, kw: &str) -> bool {
        self.skip_ws();
        let start = self.pos;
        if !self.eat(kw) {
            return false;
        }
        if self.bytes().get(self.pos).copied().is_some_and(is_ident_char) {
            self.pos = start;
            return false;
        }
        true
    }

    /// Consume one identifier token.
    fn ident(&mut self) -> Option<&'a str> {
        let bytes = self.bytes();
        let start = self.pos;
        if !bytes.get(start).copied().is_some_and(is_ident_start) {
            return None;
        }
        let mut end = start + 1;
        while bytes.get(end).copied().is_some_and(is_ident_char) {
            end += 1;
        }
        self.pos = end;
        Some(&self.source[start..end])
    }
}
