use rand::Rng;

/// Uniform in-place Fisher-Yates shuffle.
///
/// Walks from the last index down to 1, swapping each position with a
/// uniformly chosen position in `0..=i`, so every ordering is equally likely.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
