//! Parsed utility class tokens.
//!
//! A raw candidate such as `md:hover:bg-red-500/50!` is split into its
//! variants (`md`, `hover`), the utility root (`bg`), value (`red-500`),
//! modifier (`50`) and flags. Parsing is pure: the same string always yields
//! the same structure, or `None`.

mod parse;
mod value;

pub use parse::{parse_candidate, parse_variant};
pub use value::{
    decode_arbitrary_value, has_math_function, infer_data_type, is_color, is_length, is_number, is_percentage,
    is_positive_integer, is_valid_opacity_value, is_valid_spacing_multiplier,
};

/// A `/modifier` on a utility or variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CandidateModifier {
    /// `bg-red-500/50`
    Named(String),
    /// `bg-red-500/[0.5]`
    Arbitrary(String),
}

impl CandidateModifier {
    pub fn value(&self) -> &str {
        match self {
            Self::Named(value) | Self::Arbitrary(value) => value,
        }
    }
}

/// The value part of a functional utility.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CandidateValue {
    /// A theme key or bare value: `red-500`, `4`.
    Named(String),
    /// `[...]` with an optional `type:` hint, already decoded.
    Arbitrary { value: String, data_type: Option<String> },
    /// Numeric fraction such as `1/2` in `w-1/2`.
    Fraction(String),
}

impl CandidateValue {
    pub fn value(&self) -> &str {
        match self {
            Self::Named(value) | Self::Fraction(value) => value,
            Self::Arbitrary { value, .. } => value,
        }
    }
}

/// The value part of a functional variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariantValue {
    Named(String),
    Arbitrary(String),
}

impl VariantValue {
    pub fn value(&self) -> &str {
        match self {
            Self::Named(value) | Self::Arbitrary(value) => value,
        }
    }
}

/// A parsed variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    /// `[&:hover]`, `[@media(print)]`
    Arbitrary { selector: String, relative: bool },
    /// `hover`
    Static { root: String },
    /// `aria-checked`, `data-[state=open]`, `min-[40rem]`
    Functional {
        root: String,
        value: Option<VariantValue>,
        modifier: Option<CandidateModifier>,
    },
    /// `group-hover/item` wraps another variant.
    Compound {
        root: String,
        modifier: Option<CandidateModifier>,
        variant: Box<Variant>,
    },
}

impl Variant {
    /// Registry name, `None` for arbitrary variants.
    pub fn root(&self) -> Option<&str> {
        match self {
            Self::Arbitrary { .. } => None,
            Self::Static { root } | Self::Functional { root, .. } | Self::Compound { root, .. } => Some(root),
        }
    }

    pub fn modifier(&self) -> Option<&CandidateModifier> {
        match self {
            Self::Functional { modifier, .. } | Self::Compound { modifier, .. } => modifier.as_ref(),
            Self::Arbitrary { .. } | Self::Static { .. } => None,
        }
    }
}

/// What kind of utility a candidate refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    /// `flex`
    Static { root: String },
    /// `bg-red-500`, `p-4`, `w-[12px]`
    Functional {
        root: String,
        value: Option<CandidateValue>,
        modifier: Option<CandidateModifier>,
    },
    /// `[mask-type:luminance]`
    Arbitrary {
        property: String,
        value: String,
        modifier: Option<CandidateModifier>,
    },
}

/// A parsed candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub kind: CandidateKind,
    /// Innermost first: `md:hover:flex` stores `[hover, md]`.
    pub variants: Vec<Variant>,
    pub negative: bool,
    pub important: bool,
    /// The original string, used for the generated class selector.
    pub raw: String,
}

impl Candidate {
    /// Utility root, `None` for arbitrary properties.
    pub fn root(&self) -> Option<&str> {
        match &self.kind {
            CandidateKind::Static { root } | CandidateKind::Functional { root, .. } => Some(root),
            CandidateKind::Arbitrary { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&CandidateValue> {
        match &self.kind {
            CandidateKind::Functional { value, .. } => value.as_ref(),
            _ => None,
        }
    }

    pub fn modifier(&self) -> Option<&CandidateModifier> {
        match &self.kind {
            CandidateKind::Functional { modifier, .. } | CandidateKind::Arbitrary { modifier, .. } => {
                modifier.as_ref()
            }
            CandidateKind::Static { .. } => None,
        }
    }
}
