use crate::classes::token::ClassToken;

/// Single-word utilities that still read as a class list on their own.
const STANDALONE_UTILITIES: &[&str] = &[
    "absolute", "block", "border", "capitalize", "container", "contents", "fixed", "flex",
    "grid", "grow", "hidden", "inline", "invisible", "isolate", "italic", "lowercase",
    "not-sr-only", "outline", "relative", "ring", "rounded", "shadow", "shrink", "sr-only",
    "static", "sticky", "table", "transition", "truncate", "underline", "uppercase", "visible",
];

/// Heuristic for "this string literal is a list of Tailwind classes": it has
/// both a space and a hyphen, or it is one well-known standalone utility.
pub fn is_tailwind_class_string(text: &str) -> bool {
    (text.contains(' ') && text.contains('-')) || STANDALONE_UTILITIES.contains(&text.trim())
}

/// Inserts `prefix` in front of the utility of every class, after any
/// variants: `hover:bg-primary` becomes `hover:tw-bg-primary`. Negative
/// utilities keep their dash in front (`-tw-mt-2`), and classes that already
/// carry the prefix are left alone.
pub fn apply_prefix(input: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return input.to_string();
    }

    input
        .split_whitespace()
        .map(|class| {
            let token = ClassToken::parse(class);
            match token.utility.as_deref() {
                Some(utility) if !utility.is_empty() => {
                    let (sign, bare) = match utility.strip_prefix('-') {
                        Some(bare) => ("-", bare),
                        None => ("", utility),
                    };
                    if bare.starts_with(prefix) {
                        class.to_string()
                    } else {
                        token
                            .with_utility(format!("{}{}{}", sign, prefix, bare))
                            .to_string()
                    }
                }
                _ => class.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
