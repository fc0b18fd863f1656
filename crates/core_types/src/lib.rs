use std::fmt;

pub type RequestId = u64;
pub type TimerId = u64;

/// How server-returned markup is merged into a swap target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SwapMode {
    #[default]
    ReplaceInner,
    ReplaceOuter,
    Append,
    Prepend,
    /// Fire the request, drop the response body.
    None,
}

impl SwapMode {
    /// Parse a markup token. Unknown tokens fall back to `ReplaceInner`.
    pub fn from_token(token: &str) -> Self {
        let t = token.trim();
        if t.eq_ignore_ascii_case("outline") || t.eq_ignore_ascii_case("replace-outer") {
            SwapMode::ReplaceOuter
        } else if t.eq_ignore_ascii_case("append") {
            SwapMode::Append
        } else if t.eq_ignore_ascii_case("prepend") {
            SwapMode::Prepend
        } else if t.eq_ignore_ascii_case("none") {
            SwapMode::None
        } else {
            SwapMode::ReplaceInner
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            SwapMode::ReplaceInner => "inline",
            SwapMode::ReplaceOuter => "outline",
            SwapMode::Append => "append",
            SwapMode::Prepend => "prepend",
            SwapMode::None => "none",
        }
    }
}

impl fmt::Display for SwapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// What an explicit action sends as its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    /// Serialize the associated form.
    Form,
    /// Bodyless POST.
    Empty,
}

impl PayloadKind {
    pub fn from_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("form") {
            PayloadKind::Form
        } else {
            PayloadKind::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_tokens_cover_both_spellings() {
        assert_eq!(SwapMode::from_token("outline"), SwapMode::ReplaceOuter);
        assert_eq!(SwapMode::from_token("replace-outer"), SwapMode::ReplaceOuter);
        assert_eq!(SwapMode::from_token("inline"), SwapMode::ReplaceInner);
        assert_eq!(SwapMode::from_token("APPEND"), SwapMode::Append);
        assert_eq!(SwapMode::from_token(" prepend "), SwapMode::Prepend);
        assert_eq!(SwapMode::from_token("none"), SwapMode::None);
    }

    #[test]
    fn unknown_swap_token_defaults_to_replace_inner() {
        assert_eq!(SwapMode::from_token(""), SwapMode::ReplaceInner);
        assert_eq!(SwapMode::from_token("morph"), SwapMode::ReplaceInner);
    }

    #[test]
    fn payload_kind_tokens() {
        assert_eq!(PayloadKind::from_token("FORM"), PayloadKind::Form);
        assert_eq!(PayloadKind::from_token("POST"), PayloadKind::Empty);
    }
}
