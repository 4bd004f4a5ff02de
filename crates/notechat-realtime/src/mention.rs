/// Mention detection.
///
/// A message mentions a user iff its body contains `@` immediately followed
/// by the user's display name, exactly as typed. No tokenization, no case
/// folding: `@Ana` inside `@Anabela` counts, `@ana` does not match `Ana`.
/// Existing content relies on this literal behavior.
pub fn is_mentioned(body: &str, user_name: &str) -> bool {
    let mut needle = String::with_capacity(user_name.len() + 1);
    needle.push('@');
    needle.push_str(user_name);
    body.contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_mention() {
        assert!(is_mentioned("hey @Ana, look", "Ana"));
        assert!(is_mentioned("@Ana", "Ana"));
    }

    #[test]
    fn case_mismatch_is_not_a_mention() {
        assert!(!is_mentioned("hey @ana", "Ana"));
        assert!(!is_mentioned("hey @ANA", "Ana"));
    }

    #[test]
    fn partial_name_is_not_a_mention() {
        assert!(!is_mentioned("hey @An", "Ana"));
        assert!(!is_mentioned("hey Ana", "Ana"));
    }

    #[test]
    fn prefix_of_longer_name_still_matches() {
        // Literal substring policy: "@Ana" occurs inside "@Anabela".
        assert!(is_mentioned("hi @Anabela", "Ana"));
    }

    #[test]
    fn names_with_spaces() {
        assert!(is_mentioned("cc @Ana Souza please", "Ana Souza"));
        assert!(!is_mentioned("cc @Ana please", "Ana Souza"));
    }
}
