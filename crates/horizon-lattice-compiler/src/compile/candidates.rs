//! Candidate resolution and deterministic ordering.

use super::property_order::property_index;
use crate::ast::{Node, WalkAction, walk};
use crate::candidate::{Candidate, CandidateKind, Variant};
use crate::design_system::DesignSystem;
use crate::utilities::{UtilityKind, as_color};
use crate::util::escape;
use crate::variants::apply_variant;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

/// A generated rule and the keys it sorts by.
struct Compiled {
    node: Node,
    /// Ranks of the candidate's variants, highest first.
    variants: Vec<usize>,
    /// Distinct property-order indices, ascending.
    properties: Vec<usize>,
    raw: String,
}

impl Compiled {
    fn compare(&self, other: &Self) -> Ordering {
        self.variants
            .cmp(&other.variants)
            .then_with(|| {
                let a = self.properties.first().copied().unwrap_or(usize::MAX);
                let z = other.properties.first().copied().unwrap_or(usize::MAX);
                a.cmp(&z)
            })
            .then_with(|| other.properties.len().cmp(&self.properties.len()))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

#[tracing::instrument(skip_all)]
pub(crate) fn compile_candidates<I, S>(
    design_system: &mut DesignSystem,
    candidates: I,
    mut on_invalid: impl FnMut(&str),
) -> Vec<Node>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut parsed: Vec<(String, Vec<Candidate>)> = Vec::new();

    for raw in candidates {
        let raw = raw.as_ref();
        if !seen.insert(raw.to_string()) {
            continue;
        }
        if design_system.is_invalid(raw) {
            on_invalid(raw);
            continue;
        }
        let candidates = design_system.parse_candidate(raw);
        if candidates.is_empty() {
            tracing::trace!(candidate = raw, "not a candidate");
            design_system.mark_invalid(raw);
            on_invalid(raw);
            continue;
        }
        parsed.push((raw.to_string(), candidates));
    }

    let ranks = variant_ranks(design_system, parsed.iter().flat_map(|(_, c)| c.iter()));

    let mut compiled = Vec::new();
    for (raw, candidates) in &parsed {
        let before = compiled.len();
        for candidate in candidates {
            let variants = candidate_rank(candidate, &ranks);
            for (node, properties) in compile_candidate(candidate, design_system) {
                compiled.push(Compiled {
                    node,
                    variants: variants.clone(),
                    properties,
                    raw: raw.clone(),
                });
            }
        }
        if compiled.len() == before {
            tracing::trace!(candidate = raw.as_str(), "candidate did not resolve");
            design_system.mark_invalid(raw);
            on_invalid(raw);
        }
    }

    compiled.sort_by(Compiled::compare);
    tracing::debug!(rules = compiled.len(), "compiled candidates");
    compiled.into_iter().map(|c| c.node).collect()
}

/// Resolve one parsed candidate into its rules, each paired with its
/// property sort key. Empty when the candidate does not compile.
pub(crate) fn compile_candidate(candidate: &Candidate, design_system: &DesignSystem) -> Vec<(Node, Vec<usize>)> {
    let mut rules = Vec::new();

    'definitions: for mut declarations in compile_base_utility(candidate, design_system) {
        if candidate.important || design_system.important() {
            mark_important(&mut declarations);
        }
        let properties = property_sort(&declarations);

        let mut node = Node::rule(format!(".{}", escape(&candidate.raw)), declarations);
        for variant in &candidate.variants {
            if apply_variant(&mut node, variant, design_system.variants(), design_system.theme(), 0).is_none() {
                continue 'definitions;
            }
        }
        rules.push((node, properties));
    }
    rules
}

fn compile_base_utility(candidate: &Candidate, design_system: &DesignSystem) -> Vec<Vec<Node>> {
    let theme = design_system.theme();
    let (root, kind) = match &candidate.kind {
        CandidateKind::Arbitrary {
            property,
            value,
            modifier,
        } => {
            let Some(value) = as_color(value, modifier.as_ref(), theme) else {
                return Vec::new();
            };
            return vec![vec![Node::decl(property.clone(), value)]];
        }
        CandidateKind::Static { root } => (root, UtilityKind::Static),
        CandidateKind::Functional { root, .. } => (root, UtilityKind::Functional),
    };

    design_system
        .utilities()
        .get(root)
        .iter()
        .filter(|utility| utility.kind == kind)
        .filter_map(|utility| (utility.compile_fn)(candidate, theme))
        .collect()
}

/// Mark every declaration important, leaving hoisted `AtRoot` content alone.
pub(crate) fn mark_important(nodes: &mut Vec<Node>) {
    walk(nodes, |node, _| match node {
        Node::AtRoot { .. } => WalkAction::Skip,
        Node::Declaration { important, .. } => {
            *important = true;
            WalkAction::Continue
        }
        _ => WalkAction::Continue,
    });
}

fn property_sort(nodes: &[Node]) -> Vec<usize> {
    let mut order = BTreeSet::new();
    let mut queue: Vec<&Node> = nodes.iter().collect();
    while let Some(node) = queue.pop() {
        match node {
            Node::Declaration {
                property,
                value: Some(_),
                ..
            } => {
                if let Some(idx) = property_index(property) {
                    order.insert(idx);
                }
            }
            Node::Rule { nodes, .. } | Node::AtRule { nodes, .. } => queue.extend(nodes.iter()),
            _ => {}
        }
    }
    order.into_iter().collect()
}

/// Rank every distinct variant by [`Variants::compare`](crate::variants::Variants::compare).
fn variant_ranks<'a>(
    design_system: &DesignSystem,
    candidates: impl Iterator<Item = &'a Candidate>,
) -> HashMap<Variant, usize> {
    let mut variants: Vec<&Variant> = candidates.flat_map(|c| c.variants.iter()).collect();
    let theme = design_system.theme();
    variants.sort_by(|a, z| design_system.variants().compare(a, z, theme).then_with(|| a.cmp(z)));
    variants.dedup();

    variants
        .into_iter()
        .enumerate()
        .map(|(rank, variant)| (variant.clone(), rank))
        .collect()
}

fn candidate_rank(candidate: &Candidate, ranks: &HashMap<Variant, usize>) -> Vec<usize> {
    let mut rank: Vec<usize> = candidate
        .variants
        .iter()
        .filter_map(|variant| ranks.get(variant).copied())
        .collect();
    rank.sort_unstable_by(|a, z| z.cmp(a));
    rank
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::to_css;
    use crate::theme::{Theme, ThemeOptions};

    fn design_system() -> DesignSystem {
        let mut theme = Theme::new();
        for (key, value) in [
            ("--spacing", "0.25rem"),
            ("--color-red-500", "#ef4444"),
            ("--breakpoint-sm", "40rem"),
            ("--breakpoint-md", "48rem"),
        ] {
            theme.add(key, value, ThemeOptions::empty()).unwrap();
        }
        DesignSystem::new(theme)
    }

    fn css(candidates: &[&str]) -> String {
        let mut ds = design_system();
        to_css(&ds.compile_candidates(candidates, |_| {}))
    }

    #[test]
    fn escapes_selector_and_applies_variants() {
        assert_eq!(
            css(&["md:hover:p-4"]),
            ".md\\:hover\\:p-4 {\n  @media (width >= 48rem) {\n    &:hover {\n      @media (hover: hover) {\n        padding: calc(var(--spacing) * 4);\n      }\n    }\n  }\n}\n"
        );
    }

    #[test]
    fn order_is_independent_of_input_order() {
        let forward = css(&["md:flex", "p-4", "hover:p-4", "sm:flex", "flex", "px-2"]);
        let backward = css(&["px-2", "flex", "sm:flex", "hover:p-4", "p-4", "md:flex"]);
        assert_eq!(forward, backward);

        let selectors: Vec<&str> = forward.lines().filter(|l| l.ends_with('{') && l.starts_with('.')).collect();
        assert_eq!(
            selectors,
            vec![".flex {", ".p-4 {", ".px-2 {", ".hover\\:p-4 {", ".sm\\:flex {", ".md\\:flex {"]
        );
    }

    #[test]
    fn important_marks_declarations() {
        assert_eq!(css(&["flex!"]), ".flex\\! {\n  display: flex !important;\n}\n");

        let mut ds = design_system();
        ds.set_important(true);
        assert_eq!(to_css(&ds.compile_candidates(["flex"], |_| {})), ".flex {\n  display: flex !important;\n}\n");
    }

    #[test]
    fn arbitrary_properties_accept_modifiers() {
        assert_eq!(
            css(&["[color:red]/50"]),
            ".\\[color\\:red\\]\\/50 {\n  color: color-mix(in oklab, red 50%, transparent);\n}\n"
        );
    }

    #[test]
    fn rejected_variant_drops_candidate() {
        let mut ds = design_system();
        let mut invalid = Vec::new();
        let nodes = ds.compile_candidates(["[>img]:flex"], |raw| invalid.push(raw.to_string()));
        assert!(nodes.is_empty());
        assert_eq!(invalid, vec!["[>img]:flex".to_string()]);
    }
}
