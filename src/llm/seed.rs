use rand::Rng;

pub const SEED_DIGITS: u32 = 9;

/// Random integer with `length` decimal digits and a non-zero leading digit.
///
/// Each digit is drawn independently, so the result is uniform over
/// `[10^(length-1), 10^length)`. `length` is clamped to `1..=9` to stay in `u32`.
pub fn random_seed_with<R: Rng + ?Sized>(rng: &mut R, length: u32) -> u32 {
    let length = length.clamp(1, SEED_DIGITS);
    let mut seed: u32 = rng.gen_range(1..=9);
    for _ in 1..length {
        seed = seed * 10 + rng.gen_range(0..=9);
    }
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn nine_digit_seeds_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let seed = random_seed_with(&mut rng, SEED_DIGITS);
            assert!((100_000_000..=999_999_999).contains(&seed), "{seed}");
            assert_ne!(seed.to_string().chars().next(), Some('0'));
        }
    }

    #[test]
    fn leading_digit_covers_one_to_nine() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [0usize; 10];
        for _ in 0..9_000 {
            let seed = random_seed_with(&mut rng, SEED_DIGITS);
            seen[(seed / 100_000_000) as usize] += 1;
        }
        assert_eq!(seen[0], 0);
        // roughly 1000 each
        for count in &seen[1..] {
            assert!((700..1300).contains(count), "{seen:?}");
        }
    }

    #[test]
    fn same_rng_seed_reproduces_sequence() {
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        for _ in 0..5 {
            assert_eq!(random_seed_with(&mut a, 9), random_seed_with(&mut b, 9));
        }
    }

    #[test]
    fn length_is_clamped() {
        let mut rng = StdRng::seed_from_u64(5);
        let one = random_seed_with(&mut rng, 0);
        assert!((1..=9).contains(&one));
        let capped = random_seed_with(&mut rng, 20);
        assert!((100_000_000..=999_999_999).contains(&capped));
    }
}
