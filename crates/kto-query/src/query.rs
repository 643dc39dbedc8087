//! Query parsing and evaluation.
//!
//! A query is a conjunction of terms. Each term is one of:
//!
//! | Form            | Meaning                                                   |
//! |-----------------|-----------------------------------------------------------|
//! | `word`          | substring of any default field (label, name, comment, ids, currencies) |
//! | `field:text`    | substring of `field`                                      |
//! | `field~regex`   | regex match on `field`                                    |
//! | `!term`         | negation of a filter term                                 |
//! | `date:P`        | value date within period `P` (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`) |
//! | `year:YYYY`     | value date within the year                                |
//! | `from:P`        | value date on or after the start of `P`                   |
//! | `until:P`       | value date on or before the end of `P`                    |
//! | `num:1,3,5-7`   | sequence number in the listed values or ranges            |
//! | `order:f,-g`    | sort by `f` ascending then `g` descending                 |
//! | `order:desc`    | reverse the default `(date, num)` order                   |
//! | `max:N`         | at most `N` rows per asset (or currency pair)             |
//! | `$name`         | expand a macro                                            |
//!
//! Matching ignores case. A filter term on a field the row has no value for
//! rejects the row, negated or not.

use std::collections::HashMap;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::QueryError;
use crate::lexer::tokenize;
use crate::macros::MacroTable;
use crate::row::{Field, Row, SortKey};

#[derive(Debug, Clone)]
enum Matcher {
    /// Lower-cased needle.
    Substring(String),
    Regex(Regex),
}

impl Matcher {
    fn is_match(&self, haystack: &str) -> bool {
        match self {
            Matcher::Substring(needle) => haystack.to_lowercase().contains(needle.as_str()),
            Matcher::Regex(re) => re.is_match(haystack),
        }
    }
}

#[derive(Debug, Clone)]
struct Term {
    /// `None` searches the default fields.
    field: Option<Field>,
    matcher: Matcher,
    negated: bool,
}

impl Term {
    fn matches(&self, row: &Row<'_>) -> bool {
        let values = match self.field {
            Some(f) => row.values(f),
            None => row.default_values(),
        };
        if values.is_empty() {
            return false;
        }
        let hit = values.iter().any(|v| self.matcher.is_match(v));
        hit != self.negated
    }
}

/// A parsed query.
#[derive(Debug, Clone, Default)]
pub struct Query {
    terms: Vec<Term>,
    from: Option<NaiveDate>,
    until: Option<NaiveDate>,
    nums: Option<Vec<(i64, i64)>>,
    order: Option<Vec<(SortKey, bool)>>,
    descending: bool,
    max: Option<usize>,
}

impl Query {
    /// Parse `input`, expanding `$name` tokens from `macros`.
    pub fn parse(input: &str, macros: &MacroTable) -> Result<Query, QueryError> {
        let mut q = Query::default();
        for token in expand(tokenize(input)?, macros)? {
            q.add_token(&token)?;
        }
        Ok(q)
    }

    fn add_token(&mut self, token: &str) -> Result<(), QueryError> {
        let (negated, body) = match token.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, token),
        };

        let split = body
            .find([':', '~'])
            .filter(|&i| i > 0 && body[..i].bytes().all(|b| b.is_ascii_alphabetic()));
        let Some(i) = split else {
            if body.is_empty() {
                return Err(QueryError::EmptyValue(token.to_string()));
            }
            self.terms.push(Term {
                field: None,
                matcher: Matcher::Substring(body.to_lowercase()),
                negated,
            });
            return Ok(());
        };

        let key = body[..i].to_ascii_lowercase();
        let is_regex = body.as_bytes()[i] == b'~';
        let value = &body[i + 1..];
        if value.is_empty() {
            return Err(QueryError::EmptyValue(token.to_string()));
        }

        if matches!(key.as_str(), "date" | "year" | "from" | "until" | "num" | "order" | "max") {
            if negated {
                return Err(QueryError::NegatedRange(key));
            }
            if is_regex {
                return Err(QueryError::InvalidRange(token.to_string()));
            }
            return self.add_control(&key, value);
        }

        let field = Field::parse(&key)?;
        let matcher = if is_regex {
            let re = Regex::new(&format!("(?i){value}")).map_err(|source| QueryError::InvalidRegex {
                pattern: value.to_string(),
                source,
            })?;
            Matcher::Regex(re)
        } else {
            Matcher::Substring(value.to_lowercase())
        };
        self.terms.push(Term {
            field: Some(field),
            matcher,
            negated,
        });
        Ok(())
    }

    fn add_control(&mut self, key: &str, value: &str) -> Result<(), QueryError> {
        match key {
            "date" => {
                let (start, end) = parse_period(value)?;
                self.set_from(start)?;
                self.set_until(end)?;
            }
            "year" => {
                if value.len() != 4 {
                    return Err(QueryError::InvalidDate(value.to_string()));
                }
                let (start, end) = parse_period(value)?;
                self.set_from(start)?;
                self.set_until(end)?;
            }
            "from" => self.set_from(parse_period(value)?.0)?,
            "until" => self.set_until(parse_period(value)?.1)?,
            "num" => {
                if self.nums.is_some() {
                    return Err(QueryError::Duplicate("num"));
                }
                self.nums = Some(parse_num_ranges(value)?);
            }
            "order" => {
                if self.order.is_some() {
                    return Err(QueryError::Duplicate("order"));
                }
                self.order = Some(Vec::new());
                match value.to_ascii_lowercase().as_str() {
                    "asc" => self.descending = false,
                    "desc" => self.descending = true,
                    _ => self.order = Some(parse_sort_keys(value)?),
                }
            }
            "max" => {
                if self.max.is_some() {
                    return Err(QueryError::Duplicate("max"));
                }
                let n: usize = value
                    .parse()
                    .map_err(|_| QueryError::InvalidNumber(value.to_string()))?;
                self.max = Some(n);
            }
            _ => return Err(QueryError::UnknownField(key.to_string())),
        }
        Ok(())
    }

    fn set_from(&mut self, d: NaiveDate) -> Result<(), QueryError> {
        if self.from.replace(d).is_some() {
            return Err(QueryError::Duplicate("lower date bound"));
        }
        Ok(())
    }

    fn set_until(&mut self, d: NaiveDate) -> Result<(), QueryError> {
        if self.until.replace(d).is_some() {
            return Err(QueryError::Duplicate("upper date bound"));
        }
        Ok(())
    }

    /// `true` if `row` passes every filter term and range.
    pub fn matches(&self, row: &Row<'_>) -> bool {
        let date = row.entry.date();
        if self.from.is_some_and(|f| date < f) || self.until.is_some_and(|u| date > u) {
            return false;
        }
        if let Some(nums) = &self.nums {
            let n = row.entry.sequence_num;
            if !nums.iter().any(|&(lo, hi)| lo <= n && n <= hi) {
                return false;
            }
        }
        self.terms.iter().all(|t| t.matches(row))
    }

    /// Filter, order and cap `rows`.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<Row<'a>>
    where
        I: IntoIterator<Item = Row<'a>>,
    {
        let mut out: Vec<Row<'a>> = rows.into_iter().filter(|r| self.matches(r)).collect();

        let keys = self.order.as_deref().unwrap_or(&[]);
        let descending = self.descending;
        out.sort_by(|a, b| {
            for &(key, desc) in keys {
                let ord = key.compare(a, b);
                if ord.is_ne() {
                    return if desc { ord.reverse() } else { ord };
                }
            }
            let ord = SortKey::Date
                .compare(a, b)
                .then_with(|| SortKey::Num.compare(a, b));
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });

        if let Some(max) = self.max {
            let mut seen: HashMap<String, usize> = HashMap::new();
            out.retain(|r| {
                let n = seen.entry(r.entry.group_key()).or_default();
                *n += 1;
                *n <= max
            });
        }
        out
    }
}

fn expand(tokens: Vec<String>, macros: &MacroTable) -> Result<Vec<String>, QueryError> {
    let mut out = Vec::with_capacity(tokens.len());
    for tok in tokens {
        let Some(name) = tok.strip_prefix('$') else {
            out.push(tok);
            continue;
        };
        let body = macros
            .get(name)
            .ok_or_else(|| QueryError::UnknownMacro(name.to_string()))?;
        let inner = tokenize(body)?;
        if inner.iter().any(|t| t.starts_with('$')) {
            return Err(QueryError::NestedMacro(name.to_string()));
        }
        out.extend(inner);
    }
    Ok(out)
}

/// First and last day of a `YYYY`, `YYYY-MM` or `YYYY-MM-DD` period.
fn parse_period(s: &str) -> Result<(NaiveDate, NaiveDate), QueryError> {
    let invalid = || QueryError::InvalidDate(s.to_string());
    let parts: Vec<&str> = s.split('-').collect();
    let num = |p: &str, len: usize| -> Result<u32, QueryError> {
        if p.len() != len || !p.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        p.parse().map_err(|_| invalid())
    };

    match parts.as_slice() {
        [y] => {
            let y = num(y, 4)? as i32;
            let start = NaiveDate::from_ymd_opt(y, 1, 1).ok_or_else(invalid)?;
            let end = NaiveDate::from_ymd_opt(y, 12, 31).ok_or_else(invalid)?;
            Ok((start, end))
        }
        [y, m] => {
            let (y, m) = (num(y, 4)? as i32, num(m, 2)?);
            let start = NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(invalid)?;
            let next = if m == 12 {
                NaiveDate::from_ymd_opt(y + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(y, m + 1, 1)
            };
            let end = next.and_then(|n| n.pred_opt()).ok_or_else(invalid)?;
            Ok((start, end))
        }
        [y, m, d] => {
            let date = NaiveDate::from_ymd_opt(num(y, 4)? as i32, num(m, 2)?, num(d, 2)?)
                .ok_or_else(invalid)?;
            Ok((date, date))
        }
        _ => Err(invalid()),
    }
}

fn parse_num_ranges(s: &str) -> Result<Vec<(i64, i64)>, QueryError> {
    s.split(',')
        .map(|part| {
            let number = |p: &str| {
                p.trim()
                    .parse::<i64>()
                    .map_err(|_| QueryError::InvalidNumber(s.to_string()))
            };
            match part.split_once('-') {
                Some((lo, hi)) => {
                    let (lo, hi) = (number(lo)?, number(hi)?);
                    if lo > hi {
                        return Err(QueryError::InvalidRange(part.to_string()));
                    }
                    Ok((lo, hi))
                }
                None => {
                    let n = number(part)?;
                    Ok((n, n))
                }
            }
        })
        .collect()
}

fn parse_sort_keys(s: &str) -> Result<Vec<(SortKey, bool)>, QueryError> {
    s.split(',')
        .map(|k| match k.strip_prefix('-') {
            Some(k) => Ok((SortKey::parse(k)?, true)),
            None => Ok((SortKey::parse(k.strip_prefix('+').unwrap_or(k))?, false)),
        })
        .collect()
}
