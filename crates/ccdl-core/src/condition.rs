//! Package condition expressions.
//!
//! Manifests attach conditions such as
//! `[OSVersion] >= 10.0 && [installLanguage] == en_US` to packages. An
//! expression is a list of terms joined by `&&` or by `||`; the two
//! connectives are never mixed, and an expression that mixes them is
//! rejected instead of guessing a precedence.

use ccdl_schema::LanguageSet;
use ccdl_schema::locale;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a condition string cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionParseError {
    /// The expression or one of its terms is blank.
    #[error("empty condition term in '{0}'")]
    Empty(String),

    /// Both `&&` and `||` appear in the same expression.
    #[error("condition mixes '&&' and '||': '{0}'")]
    MixedOperators(String),

    /// The term does not start with a bracketed key.
    #[error("condition term has no [Key]: '{0}'")]
    MissingKey(String),

    /// The bracketed key is not one the evaluator knows.
    #[error("unknown condition key '{0}'")]
    UnknownKey(String),

    /// No comparison operator follows the key.
    #[error("condition term has no comparison operator: '{0}'")]
    MissingOperator(String),

    /// Nothing follows the operator.
    #[error("condition term has no value: '{0}'")]
    MissingValue(String),

    /// An OS version operand is not a dotted list of numbers.
    #[error("invalid OS version '{0}'")]
    InvalidVersion(String),
}

/// A dotted numeric version such as `10.0.19045`.
///
/// Components compare as integers, so `10.2 < 10.10`. Missing trailing
/// components count as zero (`10 == 10.0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsVersion(Vec<u64>);

impl OsVersion {
    /// Numeric components.
    pub fn components(&self) -> &[u64] {
        &self.0
    }

    fn component(&self, idx: usize) -> u64 {
        self.0.get(idx).copied().unwrap_or(0)
    }

    /// `major.minor.0`, the form installer filters expect.
    pub fn major_minor(&self) -> String {
        format!("{}.{}.0", self.component(0), self.component(1))
    }
}

impl Ord for OsVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|idx| self.component(idx).cmp(&other.component(idx)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for OsVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for OsVersion {
    type Err = ConditionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ConditionParseError::InvalidVersion(s.to_string()));
        }
        trimmed
            .split('.')
            .map(|part| part.trim().parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map(OsVersion)
            .map_err(|_| ConditionParseError::InvalidVersion(s.to_string()))
    }
}

impl fmt::Display for OsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Left-hand side of a condition term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKey {
    /// `[OSProcessorFamily]`, compared against `32-bit` / `64-bit`.
    OsProcessorFamily,
    /// `[OSVersion]`, compared numerically.
    OsVersion,
    /// `[installLanguage]`, tested for membership in the selection; `mul` matches any.
    InstallLanguage,
}

impl FromStr for ConditionKey {
    type Err = ConditionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        if key.eq_ignore_ascii_case("OSProcessorFamily") {
            Ok(Self::OsProcessorFamily)
        } else if key.eq_ignore_ascii_case("OSVersion") {
            Ok(Self::OsVersion)
        } else if key.eq_ignore_ascii_case("installLanguage") {
            Ok(Self::InstallLanguage)
        } else {
            Err(ConditionParseError::UnknownKey(key.to_string()))
        }
    }
}

/// Comparison operator of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `>`
    Gt,
}

impl Operator {
    /// Split a leading operator off `input`.
    fn split_prefix(input: &str) -> Option<(Self, &str)> {
        const TABLE: [(&str, Operator); 6] = [
            ("==", Operator::Eq),
            ("!=", Operator::Ne),
            ("<=", Operator::Le),
            (">=", Operator::Ge),
            ("<", Operator::Lt),
            (">", Operator::Gt),
        ];
        TABLE
            .iter()
            .find_map(|(token, op)| input.strip_prefix(token).map(|rest| (*op, rest)))
    }

    /// Whether `lhs <op> rhs` holds given `lhs.cmp(rhs)`.
    pub fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Le => ord != Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
            Self::Lt => ord == Ordering::Less,
            Self::Gt => ord == Ordering::Greater,
        }
    }

    /// Equality-only view: `!=` negates, everything else degrades to `==`.
    fn holds_equality(self, equal: bool) -> bool {
        match self {
            Self::Ne => !equal,
            _ => equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Text(String),
    Version(OsVersion),
}

/// A single `[Key] op value` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Compared quantity.
    pub key: ConditionKey,
    /// Comparison operator.
    pub op: Operator,
    operand: Operand,
}

impl Term {
    fn parse(raw: &str) -> Result<Self, ConditionParseError> {
        let term = raw.trim().trim_start_matches('(').trim_end_matches(')').trim();
        if term.is_empty() {
            return Err(ConditionParseError::Empty(raw.to_string()));
        }

        let inner = term
            .strip_prefix('[')
            .ok_or_else(|| ConditionParseError::MissingKey(term.to_string()))?;
        let (key, rest) = inner
            .split_once(']')
            .ok_or_else(|| ConditionParseError::MissingKey(term.to_string()))?;
        let key: ConditionKey = key.parse()?;

        let (op, value) = Operator::split_prefix(rest.trim_start())
            .ok_or_else(|| ConditionParseError::MissingOperator(term.to_string()))?;
        let value = value.trim().trim_matches('"').trim();
        if value.is_empty() {
            return Err(ConditionParseError::MissingValue(term.to_string()));
        }

        let operand = match key {
            ConditionKey::OsVersion => Operand::Version(value.parse()?),
            ConditionKey::OsProcessorFamily | ConditionKey::InstallLanguage => {
                Operand::Text(value.to_string())
            }
        };

        Ok(Self { key, op, operand })
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        match (&self.key, &self.operand) {
            (ConditionKey::OsVersion, Operand::Version(required)) => {
                self.op.holds(ctx.os_version.cmp(required))
            }
            (ConditionKey::OsProcessorFamily, Operand::Text(family)) => self
                .op
                .holds_equality(family.eq_ignore_ascii_case(ctx.processor_family)),
            (ConditionKey::InstallLanguage, Operand::Text(language)) => {
                if ctx.languages.is_all() {
                    return true;
                }
                // a `mul` operand stands for any selected language
                self.op.holds_equality(locale::matches(language, ctx.languages))
            }
            // parse() pairs every key with its operand kind
            _ => false,
        }
    }
}

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Every term must hold (`&&`, or a single term).
    All(Vec<Term>),
    /// At least one term must hold (`||`).
    Any(Vec<Term>),
}

impl Condition {
    /// Parse an expression.
    pub fn parse(expr: &str) -> Result<Self, ConditionParseError> {
        let has_and = expr.contains("&&");
        let has_or = expr.contains("||");

        match (has_and, has_or) {
            (true, true) => Err(ConditionParseError::MixedOperators(expr.to_string())),
            (false, true) => Ok(Self::Any(Self::terms(expr, "||")?)),
            _ => Ok(Self::All(Self::terms(expr, "&&")?)),
        }
    }

    fn terms(expr: &str, separator: &str) -> Result<Vec<Term>, ConditionParseError> {
        expr.split(separator).map(Term::parse).collect()
    }

    /// Evaluate against a context.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        match self {
            Self::All(terms) => terms.iter().all(|t| t.evaluate(ctx)),
            Self::Any(terms) => terms.iter().any(|t| t.evaluate(ctx)),
        }
    }
}

/// Facts a condition is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// `32-bit` or `64-bit`.
    pub processor_family: &'a str,
    /// Target OS version.
    pub os_version: &'a OsVersion,
    /// Selected install languages.
    pub languages: &'a LanguageSet,
}

/// Parse and evaluate `expr` in one step.
///
/// # Example
///
/// ```
/// use ccdl_core::condition::{evaluate, EvalContext, OsVersion};
/// use ccdl_schema::LanguageSet;
///
/// let os: OsVersion = "6.1".parse().unwrap();
/// let languages = LanguageSet::from_request("en_US");
/// let ctx = EvalContext { processor_family: "64-bit", os_version: &os, languages: &languages };
///
/// let expr = "[OSVersion] >= 10.0 && [installLanguage] == en_US";
/// assert_eq!(evaluate(expr, &ctx), Ok(false));
/// ```
pub fn evaluate(expr: &str, ctx: &EvalContext<'_>) -> Result<bool, ConditionParseError> {
    Ok(Condition::parse(expr)?.evaluate(ctx))
}
