//! Edit-distance suggestions and identifier style checks.

/// Closest candidate by case-insensitive Levenshtein distance, if it is
/// within half the length of the longer of the two strings.
pub(crate) fn fuzzy_match<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let needle = input.to_lowercase();
    let (best, distance) = candidates
        .iter()
        .map(|&candidate| (candidate, levenshtein(&needle, &candidate.to_lowercase())))
        .min_by_key(|(_, distance)| *distance)?;

    let longest = input.chars().count().max(best.chars().count());
    (distance <= longest / 2).then_some(best)
}

/// Levenshtein edit distance over chars, two rows at a time.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `^[a-z0-9]+(-[a-z0-9]+)*$`
pub(crate) fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOURCE_TYPES: &[&str] = &[
        "aws.ec2.instance",
        "aws.ec2.security_group",
        "aws.ec2.vpc",
        "aws.s3.bucket",
        "aws.iam.user",
    ];

    #[test]
    fn levenshtein_basic() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "vpc"), 3);
        assert_eq!(levenshtein("vpc", "vpc"), 0);
    }

    #[test]
    fn fuzzy_match_finds_close() {
        assert_eq!(fuzzy_match("aws.ec2.instnace", RESOURCE_TYPES), Some("aws.ec2.instance"));
        assert_eq!(fuzzy_match("AWS.S3.Buckets", RESOURCE_TYPES), Some("aws.s3.bucket"));
    }

    #[test]
    fn fuzzy_match_rejects_distant() {
        assert_eq!(fuzzy_match("gcp.compute.disk", RESOURCE_TYPES), None);
        assert_eq!(fuzzy_match("anything", &[]), None);
    }

    #[test]
    fn kebab_case() {
        assert!(is_kebab_case("no-open-ssh"));
        assert!(is_kebab_case("cis-4-1"));
        assert!(!is_kebab_case("No-Open-SSH"));
        assert!(!is_kebab_case("no--open"));
        assert!(!is_kebab_case("-ssh"));
        assert!(!is_kebab_case("ssh-"));
        assert!(!is_kebab_case(""));
    }
}
