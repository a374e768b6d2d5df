use std::collections::BTreeMap;

/// Replaces `$name$` tokens whose name is a key of `variables`.
///
/// Single left-to-right pass: substituted values are never rescanned and
/// tokens without a matching key (LaTeX math such as `$\bullet$`) are copied
/// through untouched.
pub fn substitute(text: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('$') {
            Some(end) => {
                if let Some(value) = variables.get(&after[..end]) {
                    out.push_str(value);
                    rest = &after[end + 1..];
                } else {
                    // the closing `$` may open the next token
                    out.push('$');
                    rest = after;
                }
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_replaces_known_tokens() {
        let variables = vars(&[("title", "Weekly"), ("date", "2024-03-01")]);
        assert_eq!(
            substitute(r"\lhead{$title$} \rhead{$date$}", &variables),
            r"\lhead{Weekly} \rhead{2024-03-01}"
        );
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let variables = vars(&[("x", "1")]);
        assert_eq!(substitute("$x$-$x$-$x$", &variables), "1-1-1");
    }

    #[test]
    fn test_leaves_unknown_tokens() {
        let variables = vars(&[("title", "T")]);
        let text = r"\setlist[itemize,1]{label=$\bullet$} $company$";
        assert_eq!(substitute(text, &variables), text);
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let variables = vars(&[("a", "$b$"), ("b", "never")]);
        assert_eq!(substitute("[$a$]", &variables), "[$b$]");
    }

    #[test]
    fn test_token_after_unmatched_dollar() {
        let variables = vars(&[("title", "T")]);
        assert_eq!(substitute("$x$title$", &variables), "$xT");
        assert_eq!(substitute("cost: 5$ for $title$", &variables), "cost: 5$ for T");
    }

    #[test]
    fn test_no_tokens() {
        let variables = vars(&[("title", "T")]);
        assert_eq!(substitute("plain text", &variables), "plain text");
        assert_eq!(substitute("trailing $", &variables), "trailing $");
        assert_eq!(substitute("", &variables), "");
    }
}
