use rand::{distributions::Alphanumeric, Rng};

/// Random URL-safe token drawn from the thread-local CSPRNG.
pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_and_alphabet() {
        let token = random_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_do_not_repeat() {
        let a = random_token(32);
        let b = random_token(32);
        assert_ne!(a, b);
    }
}
