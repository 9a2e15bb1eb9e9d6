//! Assertions shared by integration suites.

use airbox_transfer::Percent;

/// Panic unless `values` never decrease.
pub fn assert_monotonic(values: &[Percent]) {
    if let Some(pair) = values.windows(2).find(|pair| pair[1] < pair[0]) {
        panic!(
            "progress regressed from {} to {} in {values:?}",
            pair[0], pair[1]
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_decreasing_values() {
        assert_monotonic(&[Percent::new(0), Percent::new(50), Percent::new(50), Percent::COMPLETE]);
        assert_monotonic(&[]);
    }

    #[test]
    #[should_panic(expected = "progress regressed")]
    fn rejects_regressions() {
        assert_monotonic(&[Percent::new(60), Percent::new(40)]);
    }
}
