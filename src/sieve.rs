//! Sieves: rule groups deciding whether a candidate file may be selected.
//!
//! Sieves combine with OR: a candidate is accepted as soon as one sieve
//! accepts it. Inside a sieve the present predicates combine with AND.
//! An empty sieve list accepts nothing, and so does a sieve that carries no
//! predicate at all.

use regex::Regex;
use std::fmt;

use crate::candidate::SourceCandidate;
use crate::errors::{KatalError, Result};

/// Comparison operator of a size predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
}

impl SizeOp {
    fn symbol(self) -> &'static str {
        match self {
            SizeOp::Gt => ">",
            SizeOp::Ge => ">=",
            SizeOp::Lt => "<",
            SizeOp::Le => "<=",
            SizeOp::Eq => "=",
        }
    }
}

/// `<op><threshold>` comparison against a candidate's size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePredicate {
    pub op: SizeOp,
    pub threshold: u64,
}

impl SizePredicate {
    /// Parse expressions such as `>1000`, `<= 4096` or `=0`.
    pub fn parse(expr: &str) -> std::result::Result<Self, String> {
        let s = expr.trim();
        // two-character operators first so ">=" is not read as ">" + "=..."
        let (op, rest) = if let Some(r) = s.strip_prefix(">=") {
            (SizeOp::Ge, r)
        } else if let Some(r) = s.strip_prefix("<=") {
            (SizeOp::Le, r)
        } else if let Some(r) = s.strip_prefix('>') {
            (SizeOp::Gt, r)
        } else if let Some(r) = s.strip_prefix('<') {
            (SizeOp::Lt, r)
        } else if let Some(r) = s.strip_prefix('=') {
            (SizeOp::Eq, r)
        } else {
            return Err("expected one of >, >=, <, <=, = followed by a byte count".into());
        };
        let threshold = rest
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("threshold is not a byte count: {e}"))?;
        Ok(Self { op, threshold })
    }

    pub fn matches(&self, size: u64) -> bool {
        match self.op {
            SizeOp::Gt => size > self.threshold,
            SizeOp::Ge => size >= self.threshold,
            SizeOp::Lt => size < self.threshold,
            SizeOp::Le => size <= self.threshold,
            SizeOp::Eq => size == self.threshold,
        }
    }
}

impl fmt::Display for SizePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.threshold)
    }
}

/// One rule group. `index` is the 1-based position in the configuration.
#[derive(Debug, Clone)]
pub struct Sieve {
    pub index: usize,
    name: Option<Regex>,
    name_source: Option<String>,
    size: Option<SizePredicate>,
}

impl Sieve {
    /// Compile a sieve from its raw configuration strings.
    pub fn compile(index: usize, name: Option<&str>, size: Option<&str>) -> Result<Self> {
        let name_re = name
            .map(|pattern| {
                // anchored at the start only: a prefix match is enough
                Regex::new(&format!("^(?:{pattern})")).map_err(|e| KatalError::InvalidSieve {
                    index,
                    field: "name",
                    value: pattern.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        let size_pred = size
            .map(|expr| {
                SizePredicate::parse(expr).map_err(|reason| KatalError::InvalidSieve {
                    index,
                    field: "size",
                    value: expr.to_string(),
                    reason,
                })
            })
            .transpose()?;
        Ok(Self {
            index,
            name: name_re,
            name_source: name.map(str::to_string),
            size: size_pred,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.size.is_none()
    }

    pub fn size_predicate(&self) -> Option<SizePredicate> {
        self.size
    }

    pub fn name_pattern(&self) -> Option<&str> {
        self.name_source.as_deref()
    }

    /// Does this sieve, on its own, accept a file with this name and size?
    pub fn accepts(&self, file_name: &str, size: u64) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(re) = &self.name
            && !re.is_match(file_name)
        {
            return false;
        }
        if let Some(pred) = &self.size
            && !pred.matches(size)
        {
            return false;
        }
        true
    }
}

impl fmt::Display for Sieve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sieve #{} :", self.index)?;
        if self.is_empty() {
            return f.write_str(" (empty, matches nothing)");
        }
        if let Some(n) = &self.name_source {
            write!(f, " name ~ \"{n}\"")?;
        }
        if let Some(s) = &self.size {
            write!(f, " size {s}")?;
        }
        Ok(())
    }
}

/// Accept the candidate if any sieve accepts it.
pub fn candidate_is_accepted(candidate: &SourceCandidate, sieves: &[Sieve]) -> bool {
    let name = candidate.file_name();
    sieves
        .iter()
        .any(|s| s.accepts(&name, candidate.size_bytes))
}
