use std::fmt;

/// One Tailwind class split into `variant:utility/opacity`.
///
/// `hover:bg-red-500/50` has variant `hover`, utility `bg-red-500` and
/// opacity `50`. Splitting is bracket-aware, so arbitrary variants such as
/// `[&_svg]:size-4` keep their inner colons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassToken {
    pub variant: Option<String>,
    pub utility: Option<String>,
    pub opacity: Option<String>,
}

impl ClassToken {
    pub fn parse(class: &str) -> Self {
        split_class(class)
    }

    /// Same variant and opacity around a different utility.
    pub fn with_utility(&self, utility: impl Into<String>) -> Self {
        ClassToken {
            variant: self.variant.clone(),
            utility: Some(utility.into()),
            opacity: self.opacity.clone(),
        }
    }

    /// Prepends `variant` to the existing variant chain.
    pub fn with_outer_variant(mut self, variant: &str) -> Self {
        self.variant = Some(match self.variant.take() {
            Some(existing) => format!("{}:{}", variant, existing),
            None => variant.to_string(),
        });
        self
    }
}

impl fmt::Display for ClassToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(variant) = &self.variant {
            write!(f, "{}:", variant)?;
        }
        if let Some(utility) = &self.utility {
            f.write_str(utility)?;
        }
        if let Some(opacity) = &self.opacity {
            write!(f, "/{}", opacity)?;
        }
        Ok(())
    }
}

/// Splits a class on its last top-level `/` (opacity) and then on the last
/// top-level `:` of what remains (variant chain).
pub fn split_class(class: &str) -> ClassToken {
    let (rest, opacity) = match last_top_level(class, '/') {
        Some(index) => (&class[..index], Some(class[index + 1..].to_string())),
        None => (class, None),
    };

    let (variant, utility) = match last_top_level(rest, ':') {
        Some(index) => (Some(rest[..index].to_string()), &rest[index + 1..]),
        None => (None, rest),
    };

    ClassToken {
        variant,
        utility: Some(utility.to_string()),
        opacity,
    }
}

fn last_top_level(class: &str, needle: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut found = None;
    for (index, ch) in class.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            _ if ch == needle && depth == 0 => found = Some(index),
            _ => {}
        }
    }
    found
}
