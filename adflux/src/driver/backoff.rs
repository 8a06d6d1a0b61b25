use rand::Rng;

/// `base_ms` plus up to `jitter_percent` percent of random extra delay.
pub fn jitter_wait(base_ms: u64, jitter_percent: u8) -> u64 {
    let jitter_range = if jitter_percent == 0 {
        1
    } else {
        std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100)
    };
    let mut rng = rand::rng();
    base_ms.saturating_add(rng.random_range(0..jitter_range))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_jitter_keeps_base() {
        for _ in 0..32 {
            assert_eq!(jitter_wait(250, 0), 250);
        }
    }

    #[test]
    fn jitter_stays_within_percent() {
        for _ in 0..256 {
            let w = jitter_wait(1_000, 20);
            assert!((1_000..1_200).contains(&w), "{w}");
        }
    }
}
