use anyhow::{Context, Result};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a comma-separated seed list.
pub fn parse_seeds(s: &str) -> Result<Vec<u64>> {
    split_csv(s)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed {token:?}"))
        })
        .collect()
}

/// Fixed-width bar for a 0..=100 stat.
pub fn stat_bar(value: u8) -> String {
    let filled = usize::from(value.min(100)) / 10;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn seeds_parse_or_name_the_bad_token() {
        assert_eq!(parse_seeds("1337, 42").unwrap(), vec![1337, 42]);
        let err = parse_seeds("1,x2").unwrap_err();
        assert!(format!("{err:#}").contains("x2"));
    }

    #[test]
    fn stat_bar_rounds_down_to_tenths() {
        assert_eq!(stat_bar(100), "██████████");
        assert_eq!(stat_bar(0), "░░░░░░░░░░");
        assert_eq!(stat_bar(59).chars().filter(|c| *c == '█').count(), 5);
    }
}
