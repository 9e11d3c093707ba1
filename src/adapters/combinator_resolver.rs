use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    AllOf,
    AnyOf,
    OneOf,
    Not,
}

impl Combinator {
    const ALL: [Combinator; 4] = [
        Combinator::AllOf,
        Combinator::AnyOf,
        Combinator::OneOf,
        Combinator::Not,
    ];

    /// First composition keyword present on `fields`.
    pub fn find(fields: &Map<String, Value>) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|combinator| fields.contains_key(combinator.keyword()))
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Combinator::AllOf => "allOf",
            Combinator::AnyOf => "anyOf",
            Combinator::OneOf => "oneOf",
            Combinator::Not => "not",
        }
    }
}

pub struct CombinatorResolver;

impl CombinatorResolver {
    /// Pick the branches that take part in the synthesized node.
    ///
    /// `None` means the combinator yields no value: `not`, an `anyOf` whose coin
    /// flips excluded every branch, or a `oneOf` without branches.
    pub fn select<'v, R: Rng + ?Sized>(
        combinator: Combinator,
        branches: &'v [Value],
        rng: &mut R,
    ) -> Option<Vec<&'v Value>> {
        match combinator {
            Combinator::AllOf => Some(branches.iter().collect()),
            Combinator::AnyOf => {
                let included: Vec<&Value> = branches.iter().filter(|_| rng.gen_bool(0.5)).collect();
                if included.is_empty() {
                    None
                } else {
                    Some(included)
                }
            }
            Combinator::OneOf => branches.choose(rng).map(|branch| vec![branch]),
            Combinator::Not => {
                debug!("Negation is not supported, yielding no value");
                None
            }
        }
    }

    /// Merge `branches` in order, later ones winning, then lay `siblings` on top.
    pub fn synthesize(branches: Vec<Map<String, Value>>, siblings: Map<String, Value>) -> Map<String, Value> {
        let mut merged = Map::new();
        for branch in branches {
            merged.extend(branch);
        }
        merged.extend(siblings);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(fields) => fields,
            other => panic!("expected an object, got {}", other),
        }
    }

    #[test]
    fn test_find_keyword() {
        assert_eq!(
            Combinator::find(&object(json!({ "oneOf": [], "type": "string" }))),
            Some(Combinator::OneOf)
        );
        assert_eq!(Combinator::find(&object(json!({ "type": "string" }))), None);
    }

    #[test]
    fn test_all_of_keeps_every_branch() {
        let branches = vec![json!({ "a": 1 }), json!({ "b": 2 })];
        let mut rng = StdRng::seed_from_u64(3);
        let selected = CombinatorResolver::select(Combinator::AllOf, &branches, &mut rng).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_one_of_picks_exactly_one() {
        let branches = vec![json!({ "type": "string" }), json!({ "type": "integer" })];
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selected = CombinatorResolver::select(Combinator::OneOf, &branches, &mut rng).unwrap();
            assert_eq!(selected.len(), 1);
        }
    }

    #[test]
    fn test_any_of_includes_a_subset() {
        let branches = vec![json!({ "a": 1 }), json!({ "b": 2 }), json!({ "c": 3 })];
        let mut saw_empty = false;
        let mut saw_partial = false;
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            match CombinatorResolver::select(Combinator::AnyOf, &branches, &mut rng) {
                None => saw_empty = true,
                Some(selected) => {
                    assert!(!selected.is_empty() && selected.len() <= 3);
                    saw_partial |= selected.len() < 3;
                }
            }
        }
        assert!(saw_empty);
        assert!(saw_partial);
    }

    #[test]
    fn test_not_yields_nothing() {
        let branches = vec![json!({ "type": "string" })];
        let mut rng = StdRng::seed_from_u64(0);
        assert!(CombinatorResolver::select(Combinator::Not, &branches, &mut rng).is_none());
    }

    #[test]
    fn test_synthesize_later_branches_and_siblings_win() {
        let merged = CombinatorResolver::synthesize(
            vec![
                object(json!({ "type": "integer", "minimum": 1 })),
                object(json!({ "minimum": 5, "maximum": 9 })),
            ],
            object(json!({ "maximum": 7 })),
        );
        assert_eq!(
            Value::Object(merged),
            json!({ "type": "integer", "minimum": 5, "maximum": 7 })
        );
    }
}
