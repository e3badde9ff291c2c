use std::collections::BTreeMap;

use crate::models::domain::{Answer, Gift, RankedGift};

/// Totals answer values per gift key. Every gift in `gifts` gets an entry,
/// zero when no answer references it; answers for keys outside the list are
/// still totalled.
pub fn calculate_scores(answers: &[Answer], gifts: &[Gift]) -> BTreeMap<String, i32> {
    let mut scores: BTreeMap<String, i32> =
        gifts.iter().map(|gift| (gift.key.clone(), 0)).collect();

    for answer in answers {
        *scores.entry(answer.gift_key.clone()).or_insert(0) += answer.value;
    }

    scores
}

/// Gifts with their scores, highest first. Ties keep the order of `gifts`;
/// scored keys with no gift entry are left out.
pub fn rank_gifts(scores: &BTreeMap<String, i32>, gifts: &[Gift]) -> Vec<RankedGift> {
    let mut ranked: Vec<RankedGift> = gifts
        .iter()
        .map(|gift| RankedGift {
            key: gift.key.clone(),
            name: gift.name.clone(),
            score: scores.get(&gift.key).copied().unwrap_or(0),
        })
        .collect();

    // sort_by is stable, which keeps the gift list order for ties
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Names of the `count` highest-scoring gifts.
pub fn get_top_gifts(scores: &BTreeMap<String, i32>, gifts: &[Gift], count: usize) -> Vec<String> {
    rank_gifts(scores, gifts)
        .into_iter()
        .take(count)
        .map(|gift| gift.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{answers, gifts};

    #[test]
    fn every_gift_starts_at_zero() {
        let scores = calculate_scores(&[], &gifts());

        assert_eq!(scores.len(), gifts().len());
        assert!(scores.values().all(|score| *score == 0));
    }

    #[test]
    fn unreferenced_gifts_stay_zero() {
        let scores = calculate_scores(&answers(&[("A_PROPHECY", 4)]), &gifts());

        assert_eq!(scores["A_PROPHECY"], 4);
        assert_eq!(scores["B_SERVICE"], 0);
        assert_eq!(scores["G_MERCY"], 0);
    }

    #[test]
    fn answers_for_the_same_gift_are_summed() {
        let scores = calculate_scores(
            &answers(&[("A_PROPHECY", 3), ("B_SERVICE", 1), ("A_PROPHECY", 4)]),
            &gifts(),
        );

        assert_eq!(scores["A_PROPHECY"], 7);
        assert_eq!(scores["B_SERVICE"], 1);
    }

    #[test]
    fn unknown_gift_keys_are_totalled() {
        let scores = calculate_scores(&answers(&[("Z_UNLISTED", 2), ("Z_UNLISTED", 2)]), &gifts());
        assert_eq!(scores["Z_UNLISTED"], 4);
    }

    #[test]
    fn top_gifts_are_names_in_descending_order() {
        let scores = calculate_scores(
            &answers(&[
                ("A_PROPHECY", 2),
                ("B_SERVICE", 5),
                ("C_TEACHING", 4),
                ("G_MERCY", 3),
            ]),
            &gifts(),
        );

        assert_eq!(
            get_top_gifts(&scores, &gifts(), 3),
            vec!["Service", "Teaching", "Mercy"]
        );
    }

    #[test]
    fn top_gifts_truncate_to_count() {
        let scores = calculate_scores(&answers(&[("E_GIVING", 5)]), &gifts());

        assert_eq!(get_top_gifts(&scores, &gifts(), 1), vec!["Giving"]);
        assert!(get_top_gifts(&scores, &gifts(), 0).is_empty());
        assert_eq!(get_top_gifts(&scores, &gifts(), 100).len(), gifts().len());
    }

    #[test]
    fn ties_keep_gift_list_order() {
        let scores = calculate_scores(&answers(&[("D_EXHORTATION", 3), ("B_SERVICE", 3)]), &gifts());

        assert_eq!(
            get_top_gifts(&scores, &gifts(), 2),
            vec!["Service", "Exhortation"]
        );
    }

    #[test]
    fn ranking_skips_keys_without_a_gift() {
        let scores = calculate_scores(&answers(&[("Z_UNLISTED", 50)]), &gifts());
        let ranked = rank_gifts(&scores, &gifts());

        assert!(ranked.iter().all(|g| g.key != "Z_UNLISTED"));
        assert_eq!(ranked.len(), gifts().len());
    }
}
