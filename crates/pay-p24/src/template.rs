//! Description templates with `<name>` placeholders.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"<(\w+)>").expect("placeholder pattern is valid"))
}

/// Replace `<key>` with its value; unknown keys stay as written.
pub fn format_template(template: &str, replacements: &HashMap<&str, &str>) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures| match replacements.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_placeholders() {
        let replacements = HashMap::from([("id", "cart_01.abc"), ("email", "jan@example.pl")]);

        assert_eq!(
            format_template("Payment <id> for <email> <unknown>", &replacements),
            "Payment cart_01.abc for jan@example.pl <unknown>"
        );
    }

    #[test]
    fn test_no_placeholders() {
        assert_eq!(format_template("Zamówienie", &HashMap::new()), "Zamówienie");
    }
}
