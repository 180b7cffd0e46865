//! Abstract syntax tree for runtime formulas.

use std::fmt;

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String literal, already unescaped.
    String(String),
    /// Numeric decimal literal.
    Decimal(f64),
    /// Numeric integer literal.
    Integer(i64),
    /// Boolean literal.
    Boolean(bool),

    /// Function call, e.g. `concat('a', 'b')`. The name is stored as written.
    FunctionCall { name: String, args: Vec<Expr> },

    /// Binary operation, e.g. `left + right`.
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Bracketed group, e.g. `(1 + 2)`. Only affects precedence.
    Group(Box<Expr>),
}

/// Binary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Minus,
    Multiply,
    Divide,
    // Comparison
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    // Boolean
    And,
    Or,
}

impl BinaryOperator {
    pub const ALL: [BinaryOperator; 12] = [
        BinaryOperator::Add,
        BinaryOperator::Minus,
        BinaryOperator::Multiply,
        BinaryOperator::Divide,
        BinaryOperator::Equal,
        BinaryOperator::NotEqual,
        BinaryOperator::GreaterThan,
        BinaryOperator::LessThan,
        BinaryOperator::GreaterThanOrEqual,
        BinaryOperator::LessThanOrEqual,
        BinaryOperator::And,
        BinaryOperator::Or,
    ];

    /// The source symbol of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }

    /// Name of the registered function that implements this operator.
    pub fn function_name(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Minus => "minus",
            BinaryOperator::Multiply => "multiply",
            BinaryOperator::Divide => "divide",
            BinaryOperator::Equal => "equal",
            BinaryOperator::NotEqual => "not_equal",
            BinaryOperator::GreaterThan => "greater_than",
            BinaryOperator::LessThan => "less_than",
            BinaryOperator::GreaterThanOrEqual => "greater_than_or_equal",
            BinaryOperator::LessThanOrEqual => "less_than_or_equal",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }

    /// Looks an operator up by its source symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Equal | BinaryOperator::NotEqual => 3,
            BinaryOperator::GreaterThan
            | BinaryOperator::LessThan
            | BinaryOperator::GreaterThanOrEqual
            | BinaryOperator::LessThanOrEqual => 4,
            BinaryOperator::Add | BinaryOperator::Minus => 5,
            BinaryOperator::Multiply | BinaryOperator::Divide => 6,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Quotes `value` as a single-quoted formula string literal.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    out.push_str(&escape_string_content(value, '\''));
    out.push('\'');
    out
}

/// Escapes the body of a string literal delimited by `quote`.
pub fn escape_string_content(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str(r"\\"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::BinaryOp { op, .. } => op.precedence(),
            _ => u8::MAX,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, needs_group: bool) -> fmt::Result {
        if needs_group {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

/// Serialises the tree back to formula source text.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::String(value) => f.write_str(&quote_string(value)),
            // Plain notation with a fractional part so the literal reparses as a decimal
            Expr::Decimal(value) if value.fract() == 0.0 => write!(f, "{value}.0"),
            Expr::Decimal(value) => write!(f, "{value}"),
            Expr::Integer(value) => write!(f, "{value}"),
            Expr::Boolean(value) => write!(f, "{value}"),
            Expr::FunctionCall { name, args } => {
                write!(f, "{name}(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::BinaryOp { op, left, right } => {
                let precedence = op.precedence();
                left.fmt_operand(f, left.precedence() < precedence)?;
                write!(f, " {op} ")?;
                right.fmt_operand(f, right.precedence() <= precedence)
            }
            Expr::Group(inner) => write!(f, "({inner})"),
        }
    }
}
