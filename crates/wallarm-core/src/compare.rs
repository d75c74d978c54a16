//! Order-insensitive comparison of condition lists.

use crate::condition::{Condition, PointElement};

/// Compare two points as multisets of elements.
///
/// Each element of `left` claims the first unclaimed equal element of
/// `right`; numbers compare in their float form.
pub fn points_equal(left: &[PointElement], right: &[PointElement]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut visited = vec![false; right.len()];
    for element in left {
        let found = right
            .iter()
            .enumerate()
            .find(|(i, candidate)| !visited[*i] && element_equal(element, candidate));
        match found {
            Some((i, _)) => visited[i] = true,
            None => return false,
        }
    }
    true
}

fn element_equal(left: &PointElement, right: &PointElement) -> bool {
    match (left, right) {
        (PointElement::Number(a), PointElement::Number(b)) => a == b,
        (PointElement::Text(a), PointElement::Text(b)) => a == b,
        _ => false,
    }
}

fn condition_equal(left: &Condition, right: &Condition) -> bool {
    left.match_type == right.match_type
        && left.value == right.value
        && points_equal(&left.point, &right.point)
}

/// Set equality of condition lists: same length and a one-to-one pairing of
/// equal conditions. Two empty lists are equal.
pub fn conditions_equal(left: &[Condition], right: &[Condition]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    if left.is_empty() {
        return true;
    }
    let mut visited = vec![false; right.len()];
    for condition in left {
        let found = right
            .iter()
            .enumerate()
            .find(|(i, candidate)| !visited[*i] && condition_equal(condition, candidate));
        match found {
            Some((i, _)) => visited[i] = true,
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Locator, MatchType};

    fn header(name: &str, value: &str) -> Condition {
        Condition::new(
            MatchType::Equal,
            Locator::Header(name.into()),
            Some(value.into()),
        )
    }

    #[test]
    fn permutations_are_equal() {
        let a = vec![
            header("HOST", "example.com"),
            Condition::new(MatchType::Equal, Locator::Path(0), Some("api".into())),
            Condition::new(MatchType::Iequal, Locator::Method, Some("post".into())),
        ];
        let mut b = a.clone();
        b.reverse();
        assert!(conditions_equal(&a, &b));
        assert!(conditions_equal(&b, &a));
    }

    #[test]
    fn different_lengths_are_unequal() {
        let a = vec![header("HOST", "example.com")];
        let b = vec![header("HOST", "example.com"), header("HOST", "example.com")];
        assert!(!conditions_equal(&a, &b));
        assert!(!conditions_equal(&a, &[]));
    }

    #[test]
    fn empty_lists_are_equal() {
        assert!(conditions_equal(&[], &[]));
    }

    #[test]
    fn duplicates_must_pair_one_to_one() {
        let a = vec![header("HOST", "a"), header("HOST", "a")];
        let b = vec![header("HOST", "a"), header("HOST", "b")];
        assert!(!conditions_equal(&a, &b));
        assert!(!conditions_equal(&b, &a));
    }

    #[test]
    fn absent_ignores_original_value() {
        let a = Condition::new(
            MatchType::Absent,
            Locator::Header("X-DEBUG".into()),
            Some("on".into()),
        );
        let b = Condition::new(MatchType::Absent, Locator::Header("x-debug".into()), None);
        assert!(conditions_equal(&[a.clone()], &[b]));

        let present = header("X-DEBUG", "on");
        assert!(!conditions_equal(&[a], &[present]));
    }

    #[test]
    fn point_numbers_compare_as_floats() {
        let sent = vec![PointElement::text("path"), PointElement::Number(2.0)];
        let echoed: Vec<PointElement> = serde_json::from_str(r#"["path", 2.0]"#).unwrap();
        assert!(points_equal(&sent, &echoed));

        let text: Vec<PointElement> = serde_json::from_str(r#"["path", "2"]"#).unwrap();
        assert!(!points_equal(&sent, &text));
    }

    #[test]
    fn point_order_is_ignored() {
        let a = vec![PointElement::text("header"), PointElement::text("HOST")];
        let b = vec![PointElement::text("HOST"), PointElement::text("header")];
        assert!(points_equal(&a, &b));
    }
}
