//! SQL dialects: identifier quoting and placeholder style.

/// The SQL dialect statements are rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `"ident"`, numbered `$1, $2, ...` placeholders.
    #[default]
    Postgres,
    /// `` `ident` ``, positional `?` placeholders.
    MySql,
    /// `"ident"`, positional `?` placeholders.
    Sqlite,
}

impl Dialect {
    /// Dialect name as used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        }
    }

    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote_ident(self, ident: &str) -> String {
        let mut out = String::with_capacity(ident.len() + 2);
        self.write_ident(&mut out, ident);
        out
    }

    /// Append a quoted identifier to `buf`.
    pub fn write_ident(self, buf: &mut String, ident: &str) {
        let q = self.quote_char();
        buf.push(q);
        for ch in ident.chars() {
            if ch == q {
                buf.push(q);
            }
            buf.push(ch);
        }
        buf.push(q);
    }

    /// Append the placeholder for the `index`-th (1-based) parameter.
    pub fn write_placeholder(self, buf: &mut String, index: usize) {
        match self {
            Dialect::Postgres => {
                buf.push('$');
                buf.push_str(&index.to_string());
            }
            Dialect::MySql | Dialect::Sqlite => buf.push('?'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Dialect;

    #[test]
    fn quote_ident_wraps_and_escapes() {
        assert_eq!(Dialect::Postgres.quote_ident("users"), "\"users\"");
        assert_eq!(Dialect::Postgres.quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::MySql.quote_ident("a`b"), "`a``b`");
        assert_eq!(Dialect::Sqlite.quote_ident("id"), "\"id\"");
    }

    #[test]
    fn placeholders() {
        let mut pg = String::new();
        Dialect::Postgres.write_placeholder(&mut pg, 1);
        Dialect::Postgres.write_placeholder(&mut pg, 12);
        assert_eq!(pg, "$1$12");

        let mut my = String::new();
        Dialect::MySql.write_placeholder(&mut my, 3);
        assert_eq!(my, "?");
    }
}
