use indexmap::IndexSet;

use crate::classes::token::ClassToken;

/// Marker class that asks for a horizontal flip in right-to-left layouts.
pub const RTL_FLIP_MARKER: &str = "cn-rtl-flip";

#[derive(Debug, Clone, Copy)]
enum Mapping {
    /// `from` is a prefix of the utility and is swapped for `to`.
    Prefix(&'static str, &'static str),
    /// The whole utility must equal `from`.
    Exact(&'static str, &'static str),
}

use Mapping::{Exact, Prefix};

/// Physical to logical utilities, checked in order; the first match wins.
/// Negative forms come before their positive counterparts so `-ml-2` is not
/// read as `ml-` with a stray dash.
const MAPPINGS: &[Mapping] = &[
    Prefix("-ml-", "-ms-"),
    Prefix("-mr-", "-me-"),
    Prefix("ml-", "ms-"),
    Prefix("mr-", "me-"),
    Prefix("pl-", "ps-"),
    Prefix("pr-", "pe-"),
    Prefix("scroll-ml-", "scroll-ms-"),
    Prefix("scroll-mr-", "scroll-me-"),
    Prefix("scroll-pl-", "scroll-ps-"),
    Prefix("scroll-pr-", "scroll-pe-"),
    Prefix("-left-", "-start-"),
    Prefix("-right-", "-end-"),
    Prefix("left-", "start-"),
    Prefix("right-", "end-"),
    Prefix("inset-l-", "inset-inline-start-"),
    Prefix("inset-r-", "inset-inline-end-"),
    Prefix("rounded-tl-", "rounded-ss-"),
    Prefix("rounded-tr-", "rounded-se-"),
    Prefix("rounded-bl-", "rounded-es-"),
    Prefix("rounded-br-", "rounded-ee-"),
    Prefix("rounded-l-", "rounded-s-"),
    Prefix("rounded-r-", "rounded-e-"),
    Exact("rounded-tl", "rounded-ss"),
    Exact("rounded-tr", "rounded-se"),
    Exact("rounded-bl", "rounded-es"),
    Exact("rounded-br", "rounded-ee"),
    Exact("rounded-l", "rounded-s"),
    Exact("rounded-r", "rounded-e"),
    Prefix("border-l-", "border-s-"),
    Prefix("border-r-", "border-e-"),
    Exact("border-l", "border-s"),
    Exact("border-r", "border-e"),
    Exact("text-left", "text-start"),
    Exact("text-right", "text-end"),
    Exact("float-left", "float-start"),
    Exact("float-right", "float-end"),
    Exact("clear-left", "clear-start"),
    Exact("clear-right", "clear-end"),
    Exact("origin-top-left", "origin-top-start"),
    Exact("origin-top-right", "origin-top-end"),
    Exact("origin-bottom-left", "origin-bottom-start"),
    Exact("origin-bottom-right", "origin-bottom-end"),
    Exact("origin-left", "origin-start"),
    Exact("origin-right", "origin-end"),
];

/// Positioning utilities that stay physical under a side variant such as
/// `data-[side=left]:`, where the side is already decided by the placement.
const POSITIONING_PREFIXES: [&str; 4] = ["-left-", "-right-", "left-", "right-"];

const SIDE_VARIANTS: [&str; 2] = ["data-[side=left]", "data-[side=right]"];

/// Utilities without a logical form; each gets an `rtl:` class holding the
/// mirrored value.
const SWAPS: [(&str, &str); 2] = [
    ("cursor-w-resize", "cursor-e-resize"),
    ("cursor-e-resize", "cursor-w-resize"),
];

/// Under a logical side variant the slide direction is logical too.
const LOGICAL_SIDE_SLIDES: [(&str, &str, &str); 4] = [
    ("data-[side=inline-start]", "slide-in-from-right", "slide-in-from-end"),
    ("data-[side=inline-start]", "slide-out-to-right", "slide-out-to-end"),
    ("data-[side=inline-end]", "slide-in-from-left", "slide-in-from-start"),
    ("data-[side=inline-end]", "slide-out-to-left", "slide-out-to-start"),
];

/// Whole-string needle -> helper class appended when the needle appears.
const REVERSE_HELPERS: [(&str, &str); 2] = [
    ("space-x-", "rtl:space-x-reverse"),
    ("divide-x-", "rtl:divide-x-reverse"),
];

/// Rewrites physical direction utilities into their logical equivalents and
/// appends the `rtl:` helpers the result needs. Output classes are unique
/// and keep their input order, helpers last.
pub fn apply_rtl_mapping(input: &str) -> String {
    let mut classes = IndexSet::new();
    let mut helpers = Vec::new();

    for class in input.split_whitespace() {
        if class == RTL_FLIP_MARKER {
            classes.insert("rtl:rotate-180".to_string());
            continue;
        }

        let token = ClassToken::parse(class);
        let Some(utility) = token.utility.as_deref() else {
            classes.insert(class.to_string());
            continue;
        };

        if let Some(helper) = translate_helper(&token, utility) {
            helpers.push(helper);
        }
        if let Some((_, swapped)) = SWAPS.iter().find(|(physical, _)| *physical == utility) {
            helpers.push(token.with_utility(*swapped).with_outer_variant("rtl").to_string());
        }

        match map_utility(utility, token.variant.as_deref()) {
            Some(mapped) => classes.insert(token.with_utility(mapped).to_string()),
            None => classes.insert(class.to_string()),
        };
    }

    for (needle, helper) in REVERSE_HELPERS {
        if input.contains(needle) {
            helpers.push(helper.to_string());
        }
    }

    classes.extend(helpers);
    classes.into_iter().collect::<Vec<_>>().join(" ")
}

fn map_utility(utility: &str, variant: Option<&str>) -> Option<String> {
    for (side, physical, logical) in LOGICAL_SIDE_SLIDES {
        if !variant.is_some_and(|variant| variant.contains(side)) {
            continue;
        }
        if let Some(rest) = utility.strip_prefix(physical) {
            return Some(format!("{}{}", logical, rest));
        }
    }

    let side_variant = variant.is_some_and(|variant| {
        SIDE_VARIANTS.iter().any(|side| variant.contains(*side))
    });

    for mapping in MAPPINGS {
        match *mapping {
            Prefix(from, to) => {
                if let Some(rest) = utility.strip_prefix(from) {
                    if side_variant && POSITIONING_PREFIXES.contains(&from) {
                        return None;
                    }
                    return Some(format!("{}{}", to, rest));
                }
            }
            Exact(from, to) => {
                if utility == from {
                    return Some(to.to_string());
                }
            }
        }
    }
    None
}

/// Horizontal translations flip sign in right-to-left layouts, so each one
/// gets an `rtl:` counterpart with the opposite sign.
fn translate_helper(token: &ClassToken, utility: &str) -> Option<String> {
    if token.variant.as_deref().is_some_and(|variant| variant.contains("rtl")) {
        return None;
    }
    let flipped = match utility.strip_prefix("-translate-x-") {
        Some(amount) => format!("translate-x-{}", amount),
        None => format!("-translate-x-{}", utility.strip_prefix("translate-x-")?),
    };
    Some(
        token
            .with_utility(flipped)
            .with_outer_variant("rtl")
            .to_string(),
    )
}
