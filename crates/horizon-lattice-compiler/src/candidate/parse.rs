use super::{
    Candidate, CandidateKind, CandidateModifier, CandidateValue, Variant, VariantValue, decode_arbitrary_value,
    is_number,
};
use crate::utilities::{Utilities, UtilityKind};
use crate::util::segment;
use crate::variants::{VariantKind, Variants};

/// Parse a raw class token.
///
/// A functional utility root is found by trying every `-` split from the
/// right, so one string may have several interpretations (`inset-x-4` could
/// be `inset-x` + `4` or `inset` + `x-4`). All of them are returned in that
/// order; an empty vector means the token is not a candidate.
pub fn parse_candidate(input: &str, utilities: &Utilities, variants: &Variants, prefix: Option<&str>) -> Vec<Candidate> {
    let mut raw_variants = segment(input, ':');

    if let Some(prefix) = prefix {
        if raw_variants.len() == 1 || raw_variants[0] != prefix {
            return Vec::new();
        }
        raw_variants.remove(0);
    }

    let Some(mut base) = raw_variants.pop() else {
        return Vec::new();
    };

    let mut parsed_variants = Vec::with_capacity(raw_variants.len());
    for raw in raw_variants.iter().rev() {
        match parse_variant(raw, variants) {
            Some(variant) => parsed_variants.push(variant),
            None => return Vec::new(),
        }
    }

    let mut important = false;
    if let Some(stripped) = base.strip_suffix('!') {
        important = true;
        base = stripped;
    } else if let Some(stripped) = base.strip_prefix('!') {
        important = true;
        base = stripped;
    }
    if base.is_empty() {
        return Vec::new();
    }

    let candidate = |kind: CandidateKind, negative: bool| Candidate {
        kind,
        variants: parsed_variants.clone(),
        negative,
        important,
        raw: input.to_string(),
    };

    if utilities.has(base, UtilityKind::Static) && !base.contains('[') {
        return vec![candidate(
            CandidateKind::Static {
                root: base.to_string(),
            },
            false,
        )];
    }

    let parts = segment(base, '/');
    let (without_modifier, modifier_segment) = match parts.as_slice() {
        [value] => (*value, None),
        [value, modifier] => (*value, Some(*modifier)),
        _ => return Vec::new(),
    };
    let modifier = match modifier_segment {
        Some(segment) => match parse_modifier(segment) {
            Some(modifier) => Some(modifier),
            None => return Vec::new(),
        },
        None => None,
    };

    // Arbitrary property: `[mask-type:luminance]`
    if let Some(inner) = without_modifier.strip_prefix('[') {
        let Some(inner) = inner.strip_suffix(']') else {
            return Vec::new();
        };
        if !inner.starts_with(|c: char| c.is_ascii_lowercase() || c == '-') {
            return Vec::new();
        }
        let Some(colon) = inner.find(':').filter(|&idx| idx > 0 && idx < inner.len() - 1) else {
            return Vec::new();
        };
        return vec![candidate(
            CandidateKind::Arbitrary {
                property: inner[..colon].to_string(),
                value: decode_arbitrary_value(&inner[colon + 1..]),
                modifier,
            },
            false,
        )];
    }

    let (negative, without_modifier) = match without_modifier.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, without_modifier),
    };

    let mut candidates = Vec::new();
    for (root, value) in find_roots(without_modifier, |root| utilities.has(root, UtilityKind::Functional)) {
        let (value, modifier) = match value {
            None => (None, modifier.clone()),
            Some(value) => match parse_value(value, modifier_segment, modifier.as_ref()) {
                ValueParse::Value(value, modifier) => (Some(value), modifier),
                ValueParse::Skip => continue,
                ValueParse::Invalid => return Vec::new(),
            },
        };
        candidates.push(candidate(
            CandidateKind::Functional {
                root: root.to_string(),
                value,
                modifier,
            },
            negative,
        ));
    }
    candidates
}

enum ValueParse {
    Value(CandidateValue, Option<CandidateModifier>),
    Skip,
    Invalid,
}

fn parse_value(value: &str, modifier_segment: Option<&str>, modifier: Option<&CandidateModifier>) -> ValueParse {
    if let Some(start) = value.find('[') {
        let Some(inner) = value[start + 1..].strip_suffix(']') else {
            return ValueParse::Invalid;
        };
        let mut decoded = decode_arbitrary_value(inner);

        // `[length:var(--x)]` carries an explicit data type.
        let mut data_type = None;
        if let Some(idx) = decoded.find(':')
            && idx > 0
            && decoded[..idx].chars().all(|c| c.is_ascii_lowercase() || c == '-')
        {
            data_type = Some(decoded[..idx].to_string());
            decoded = decoded[idx + 1..].to_string();
        }

        if decoded.trim().is_empty() {
            return ValueParse::Skip;
        }
        return ValueParse::Value(
            CandidateValue::Arbitrary {
                value: decoded,
                data_type,
            },
            modifier.cloned(),
        );
    }

    match (modifier_segment, modifier) {
        (Some(denominator), Some(CandidateModifier::Named(_))) if is_number(value) && is_number(denominator) => {
            ValueParse::Value(CandidateValue::Fraction(format!("{}/{}", value, denominator)), None)
        }
        _ => ValueParse::Value(CandidateValue::Named(value.to_string()), modifier.cloned()),
    }
}

fn parse_modifier(modifier: &str) -> Option<CandidateModifier> {
    if let Some(inner) = modifier.strip_prefix('[').and_then(|m| m.strip_suffix(']')) {
        let decoded = decode_arbitrary_value(inner);
        if decoded.trim().is_empty() {
            return None;
        }
        return Some(CandidateModifier::Arbitrary(decoded));
    }
    if modifier.is_empty() {
        return None;
    }
    Some(CandidateModifier::Named(modifier.to_string()))
}

/// Parse a single variant token such as `hover`, `md`, `group-hover/item`,
/// `aria-[sort=ascending]` or `[&>*]`.
pub fn parse_variant(input: &str, variants: &Variants) -> Option<Variant> {
    if let Some(inner) = input.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        if inner.starts_with('@') && inner.contains('&') {
            return None;
        }
        let selector = decode_arbitrary_value(inner);
        if selector.trim().is_empty() {
            return None;
        }
        let relative = selector.starts_with(['>', '+', '~']);
        let selector = if !relative && !selector.starts_with('@') && !selector.contains('&') {
            format!("&:is({})", selector)
        } else {
            selector
        };
        return Some(Variant::Arbitrary { selector, relative });
    }

    let parts = segment(input, '/');
    let (without_modifier, modifier) = match parts.as_slice() {
        [variant] => (*variant, None),
        [variant, modifier] => (*variant, Some(*modifier)),
        _ => return None,
    };

    for (root, value) in find_roots(without_modifier, |root| variants.has(root)) {
        match variants.kind(root)? {
            VariantKind::Static => {
                if value.is_some() || modifier.is_some() {
                    return None;
                }
                return Some(Variant::Static { root: root.to_string() });
            }
            VariantKind::Functional => {
                let modifier = match modifier {
                    Some(modifier) => Some(parse_modifier(modifier)?),
                    None => None,
                };
                let value = match value {
                    None => None,
                    Some(value) if value.ends_with(']') => {
                        let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) else {
                            continue;
                        };
                        let decoded = decode_arbitrary_value(inner);
                        if decoded.trim().is_empty() {
                            return None;
                        }
                        Some(VariantValue::Arbitrary(decoded))
                    }
                    Some(value) => Some(VariantValue::Named(value.to_string())),
                };
                return Some(Variant::Functional {
                    root: root.to_string(),
                    value,
                    modifier,
                });
            }
            VariantKind::Compound => {
                let inner = parse_variant(value?, variants)?;
                if !variants.compounds_with(root, &inner) {
                    return None;
                }
                let modifier = match modifier {
                    Some(modifier) => Some(parse_modifier(modifier)?),
                    None => None,
                };
                return Some(Variant::Compound {
                    root: root.to_string(),
                    modifier,
                    variant: Box::new(inner),
                });
            }
        }
    }
    None
}

/// Candidate `(root, value)` splits of `input`, longest root first.
fn find_roots<'a>(input: &'a str, exists: impl Fn(&str) -> bool) -> Vec<(&'a str, Option<&'a str>)> {
    let mut roots = Vec::new();
    if exists(input) {
        roots.push((input, None));
    }

    let mut end = input.len();
    while let Some(idx) = input[..end].rfind('-') {
        if idx == 0 {
            break;
        }
        let root = &input[..idx];
        if exists(root) {
            let value = &input[idx + 1..];
            if value.is_empty() {
                break;
            }
            roots.push((root, Some(value)));
        }
        end = idx;
    }
    roots
}
