use rand::seq::SliceRandom;
use rand::Rng;

use crate::db::Question;

/// `id` a quiz may be played with to draw from every category.
pub const ALL_CATEGORIES: i64 = 0;

/// Turns the category a quiz was started with into a store filter.
pub fn category_filter(category_id: i64) -> Option<i64> {
    (category_id != ALL_CATEGORIES).then_some(category_id)
}

/// Picks the next question uniformly among `candidates`.
/// `None` means the quiz is exhausted.
pub fn choose_next<R: Rng + ?Sized>(candidates: Vec<Question>, rng: &mut R) -> Option<Question> {
    candidates.choose(rng).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(id: i64) -> Question {
        Question {
            id,
            question: format!("question {id}"),
            answer: "answer".into(),
            category: 1,
            difficulty: 1,
        }
    }

    #[test]
    fn zero_means_every_category() {
        assert_eq!(category_filter(ALL_CATEGORIES), None);
        assert_eq!(category_filter(4), Some(4));
    }

    #[test]
    fn empty_pool_is_exhausted() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(choose_next(vec![], &mut rng), None);
    }

    #[test]
    fn single_candidate_is_always_chosen() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(choose_next(vec![question(5)], &mut rng), Some(question(5)));
        }
    }

    #[test]
    fn choice_stays_within_the_pool_and_covers_it() {
        let pool: Vec<Question> = (1..=4).map(question).collect();
        let mut seen = std::collections::HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = choose_next(pool.clone(), &mut rng).unwrap();
            assert!(pool.contains(&picked));
            seen.insert(picked.id);
        }
        assert_eq!(seen.len(), pool.len());
    }
}
