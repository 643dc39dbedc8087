use crate::error::QueryError;

/// Split a query into whitespace-separated tokens. Double quotes group
/// characters (including spaces) into the current token and are dropped.
pub(crate) fn tokenize(input: &str) -> Result<Vec<String>, QueryError> {
    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut cur));
                    in_token = false;
                }
            }
            c => {
                cur.push(c);
                in_token = true;
            }
        }
    }
    if in_quotes {
        return Err(QueryError::UnterminatedQuote);
    }
    if in_token {
        tokens.push(cur);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokenize("  a  b\tc ").unwrap(), vec!["a", "b", "c"]);
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn quotes_group() {
        assert_eq!(
            tokenize(r#"name:"Nestle SA" !"foo bar""#).unwrap(),
            vec!["name:Nestle SA", "!foo bar"]
        );
        assert_eq!(tokenize(r#"comment:"""#).unwrap(), vec!["comment:"]);
    }

    #[test]
    fn unterminated_quote() {
        assert!(matches!(tokenize(r#"name:"Nestle"#), Err(QueryError::UnterminatedQuote)));
    }
}
