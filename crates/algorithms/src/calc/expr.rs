//! Abstract raster-algebra expressions and their backend dialects.
//!
//! A formula is built once as an [`Expr`] tree and rendered into each
//! calculator backend's textual dialect, so the logical formula lives in
//! one place and cannot drift between backends.

use bivargis_core::{Error, Result};

/// Named raster operand of a formula (first or second input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    A,
    B,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Comparison operators; results are coerced to 0/1 for
/// multiplication-based branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Le,
    Gt,
}

/// Textual dialect understood by a calculator backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Bare band letters: `(A<=3.5)*1 + ...`
    Plain,
    /// Quoted band@1 references: `("A@1"<=3.5)*1 + ...`
    LayerRef,
}

/// An algebraic expression over up to two raster operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Band(Operand),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn band(operand: Operand) -> Self {
        Expr::Band(operand)
    }

    pub fn constant(value: f64) -> Self {
        Expr::Const(value)
    }

    fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn compare(op: CmpOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn add(self, rhs: Expr) -> Self {
        Self::binary(BinOp::Add, self, rhs)
    }

    pub fn sub(self, rhs: Expr) -> Self {
        Self::binary(BinOp::Sub, self, rhs)
    }

    pub fn mul(self, rhs: Expr) -> Self {
        Self::binary(BinOp::Mul, self, rhs)
    }

    pub fn div(self, rhs: Expr) -> Self {
        Self::binary(BinOp::Div, self, rhs)
    }

    pub fn le(self, rhs: Expr) -> Self {
        Self::compare(CmpOp::Le, self, rhs)
    }

    pub fn gt(self, rhs: Expr) -> Self {
        Self::compare(CmpOp::Gt, self, rhs)
    }

    /// Whether the expression references the given operand anywhere.
    pub fn uses(&self, operand: Operand) -> bool {
        match self {
            Expr::Const(_) => false,
            Expr::Band(o) => *o == operand,
            Expr::Binary { lhs, rhs, .. } | Expr::Compare { lhs, rhs, .. } => {
                lhs.uses(operand) || rhs.uses(operand)
            }
        }
    }

    /// Evaluate at a single cell. `a` and `b` must already be valid
    /// (non-sentinel) values; masking happens in the engines.
    pub fn eval(&self, a: f64, b: f64) -> f64 {
        match self {
            Expr::Const(v) => *v,
            Expr::Band(Operand::A) => a,
            Expr::Band(Operand::B) => b,
            Expr::Binary { op, lhs, rhs } => {
                let l = lhs.eval(a, b);
                let r = rhs.eval(a, b);
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => {
                        if r.abs() < 1e-12 {
                            f64::NAN
                        } else {
                            l / r
                        }
                    }
                }
            }
            Expr::Compare { op, lhs, rhs } => {
                let l = lhs.eval(a, b);
                let r = rhs.eval(a, b);
                let hit = match op {
                    CmpOp::Le => l <= r,
                    CmpOp::Gt => l > r,
                };
                if hit {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Render the expression in a backend dialect.
    pub fn to_formula(&self, dialect: Dialect) -> String {
        match self {
            Expr::Const(v) => format!("{}", v),
            Expr::Band(o) => match (dialect, o) {
                (Dialect::Plain, Operand::A) => "A".to_string(),
                (Dialect::Plain, Operand::B) => "B".to_string(),
                (Dialect::LayerRef, Operand::A) => "\"A@1\"".to_string(),
                (Dialect::LayerRef, Operand::B) => "\"B@1\"".to_string(),
            },
            Expr::Binary { op, lhs, rhs } => {
                let (symbol, prec) = match op {
                    BinOp::Add => ("+", 1),
                    BinOp::Sub => ("-", 1),
                    BinOp::Mul => ("*", 2),
                    BinOp::Div => ("/", 2),
                };
                // Left association: the right child needs parens at equal
                // precedence for the non-commutative operators.
                let rhs_min = if matches!(op, BinOp::Sub | BinOp::Div) {
                    prec + 1
                } else {
                    prec
                };
                format!(
                    "{}{}{}",
                    Self::child_formula(lhs, dialect, prec),
                    symbol,
                    Self::child_formula(rhs, dialect, rhs_min)
                )
            }
            Expr::Compare { op, lhs, rhs } => {
                let symbol = match op {
                    CmpOp::Le => "<=",
                    CmpOp::Gt => ">",
                };
                format!(
                    "({}{}{})",
                    lhs.to_formula(dialect),
                    symbol,
                    rhs.to_formula(dialect)
                )
            }
        }
    }

    /// Render in the tiled backend's plain band dialect.
    pub fn to_tiled_formula(&self) -> String {
        self.to_formula(Dialect::Plain)
    }

    /// Render in the cellwise backend's quoted layer-reference dialect.
    pub fn to_cellwise_formula(&self) -> String {
        self.to_formula(Dialect::LayerRef)
    }

    fn child_formula(child: &Expr, dialect: Dialect, min_prec: u8) -> String {
        let prec = match child {
            Expr::Binary {
                op: BinOp::Add | BinOp::Sub,
                ..
            } => 1,
            Expr::Binary {
                op: BinOp::Mul | BinOp::Div,
                ..
            } => 2,
            // Atoms; comparisons render with their own parens.
            _ => 3,
        };
        if prec < min_prec {
            format!("({})", child.to_formula(dialect))
        } else {
            child.to_formula(dialect)
        }
    }
}

// ─── Canned pipeline formulas ───────────────────────────────────────────

/// Piecewise tercile classification of operand A:
/// `(A<=q1)*1 + ((A>q1)*(A<=q2))*2 + (A>q2)*3`.
///
/// Boundary inclusivity is deliberate and load-bearing: a value exactly
/// equal to q1 or q2 always falls in the lower band.
pub fn tercile_class_formula(q1: f64, q2: f64) -> Expr {
    let v = || Expr::band(Operand::A);
    let low = v().le(Expr::constant(q1)).mul(Expr::constant(1.0));
    let mid = v()
        .gt(Expr::constant(q1))
        .mul(v().le(Expr::constant(q2)))
        .mul(Expr::constant(2.0));
    let high = v().gt(Expr::constant(q2)).mul(Expr::constant(3.0));
    low.add(mid).add(high)
}

/// Unit scaling of operand A: `A / divisor`.
pub fn scale_formula(divisor: f64) -> Expr {
    Expr::band(Operand::A).div(Expr::constant(divisor))
}

/// Bivariate code combination: `A*10 + B`.
pub fn combine_formula() -> Expr {
    Expr::band(Operand::A)
        .mul(Expr::constant(10.0))
        .add(Expr::band(Operand::B))
}

// ─── Formula parsing ────────────────────────────────────────────────────

/// Parse a formula string in the given dialect back into an [`Expr`].
///
/// Grammar (lowest to highest precedence): comparison, additive,
/// multiplicative, unary minus, primary.
pub fn parse_formula(input: &str, dialect: Dialect) -> Result<Expr> {
    let tokens = tokenize(input, dialect)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.comparison()?;
    if parser.pos != parser.tokens.len() {
        return Err(Error::Other(format!(
            "formula parse error: unexpected trailing input in {:?}",
            input
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Band(Operand),
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Le,
    Gt,
}

fn tokenize(input: &str, dialect: Dialect) -> Result<Vec<Token>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    return Err(Error::Other("formula parse error: expected <=".into()));
                }
            }
            '>' => {
                tokens.push(Token::Gt);
                i += 1;
            }
            '"' if dialect == Dialect::LayerRef => {
                // "A@1" or "B@1"
                let rest = &input[i..];
                if rest.starts_with("\"A@1\"") {
                    tokens.push(Token::Band(Operand::A));
                    i += 5;
                } else if rest.starts_with("\"B@1\"") {
                    tokens.push(Token::Band(Operand::B));
                    i += 5;
                } else {
                    return Err(Error::Other(format!(
                        "formula parse error: bad layer reference near {:?}",
                        &rest[..rest.len().min(8)]
                    )));
                }
            }
            'A' if dialect == Dialect::Plain => {
                tokens.push(Token::Band(Operand::A));
                i += 1;
            }
            'B' if dialect == Dialect::Plain => {
                tokens.push(Token::Band(Operand::B));
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < bytes.len() {
                    let d = bytes[i] as char;
                    if d.is_ascii_digit() || d == '.' || d == 'e' || d == 'E' {
                        i += 1;
                    } else if (d == '+' || d == '-')
                        && matches!(bytes[i - 1] as char, 'e' | 'E')
                    {
                        // exponent sign
                        i += 1;
                    } else {
                        break;
                    }
                }
                let text = &input[start..i];
                let value = text.parse::<f64>().map_err(|_| {
                    Error::Other(format!("formula parse error: bad number {:?}", text))
                })?;
                tokens.push(Token::Number(value));
            }
            other => {
                return Err(Error::Other(format!(
                    "formula parse error: unexpected character {:?}",
                    other
                )))
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut lhs = self.additive()?;
        while let Some(op) = match self.peek() {
            Some(Token::Le) => Some(CmpOp::Le),
            Some(Token::Gt) => Some(CmpOp::Gt),
            _ => None,
        } {
            self.bump();
            let rhs = self.additive()?;
            lhs = Expr::compare(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.bump();
            let rhs = self.term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinOp::Mul),
            Some(Token::Slash) => Some(BinOp::Div),
            _ => None,
        } {
            self.bump();
            let rhs = self.unary()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::Minus) {
            self.bump();
            let inner = self.unary()?;
            return Ok(Expr::binary(BinOp::Sub, Expr::constant(0.0), inner));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.bump() {
            Some(Token::Number(v)) => Ok(Expr::constant(v)),
            Some(Token::Band(o)) => Ok(Expr::band(o)),
            Some(Token::LParen) => {
                let inner = self.comparison()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(Error::Other("formula parse error: missing )".into())),
                }
            }
            other => Err(Error::Other(format!(
                "formula parse error: unexpected token {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tercile_formula_renders_both_dialects() {
        let expr = tercile_class_formula(3.5, 6.5);

        assert_eq!(
            expr.to_tiled_formula(),
            "(A<=3.5)*1+(A>3.5)*(A<=6.5)*2+(A>6.5)*3"
        );
        assert_eq!(
            expr.to_cellwise_formula(),
            "(\"A@1\"<=3.5)*1+(\"A@1\">3.5)*(\"A@1\"<=6.5)*2+(\"A@1\">6.5)*3"
        );
    }

    #[test]
    fn combine_formula_renders() {
        assert_eq!(combine_formula().to_formula(Dialect::Plain), "A*10+B");
        assert_eq!(
            combine_formula().to_formula(Dialect::LayerRef),
            "\"A@1\"*10+\"B@1\""
        );
    }

    #[test]
    fn render_parse_roundtrip() {
        for expr in [
            tercile_class_formula(3.6667, 6.3333),
            scale_formula(30.0),
            combine_formula(),
        ] {
            for dialect in [Dialect::Plain, Dialect::LayerRef] {
                let rendered = expr.to_formula(dialect);
                let parsed = parse_formula(&rendered, dialect).unwrap();
                assert_eq!(parsed, expr, "roundtrip failed for {rendered}");
            }
        }
    }

    #[test]
    fn eval_tercile_classes() {
        let expr = tercile_class_formula(3.0, 6.0);
        assert_eq!(expr.eval(1.0, 0.0), 1.0);
        assert_eq!(expr.eval(3.0, 0.0), 1.0); // boundary goes to lower band
        assert_eq!(expr.eval(4.0, 0.0), 2.0);
        assert_eq!(expr.eval(6.0, 0.0), 2.0);
        assert_eq!(expr.eval(9.0, 0.0), 3.0);
    }

    #[test]
    fn eval_combination() {
        let expr = combine_formula();
        assert_eq!(expr.eval(2.0, 3.0), 23.0);
        assert_eq!(expr.eval(1.0, 1.0), 11.0);
    }

    #[test]
    fn eval_division_by_zero_is_nan() {
        let expr = Expr::band(Operand::A).div(Expr::constant(0.0));
        assert!(expr.eval(5.0, 0.0).is_nan());
    }

    #[test]
    fn parse_respects_precedence() {
        let expr = parse_formula("A+2*3", Dialect::Plain).unwrap();
        assert_eq!(expr.eval(1.0, 0.0), 7.0);

        let expr = parse_formula("(A+2)*3", Dialect::Plain).unwrap();
        assert_eq!(expr.eval(1.0, 0.0), 9.0);
    }

    #[test]
    fn parse_unary_minus() {
        let expr = parse_formula("(A<=-2.5)*1", Dialect::Plain).unwrap();
        assert_eq!(expr.eval(-3.0, 0.0), 1.0);
        assert_eq!(expr.eval(0.0, 0.0), 0.0);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_formula("A +", Dialect::Plain).is_err());
        assert!(parse_formula("A & B", Dialect::Plain).is_err());
        assert!(parse_formula("\"C@1\"", Dialect::LayerRef).is_err());
    }

    #[test]
    fn uses_reports_operands() {
        assert!(combine_formula().uses(Operand::B));
        assert!(!scale_formula(30.0).uses(Operand::B));
        assert!(scale_formula(30.0).uses(Operand::A));
    }
}
