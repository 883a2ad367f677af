use rand::Rng;

const CHARACTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Random lowercase ASCII string of exactly `size` bytes
pub fn random_payload(size: usize) -> String {
    if size == 0 {
        return String::new();
    }

    let mut rng = rand::rng();
    (0..size)
        .map(|_| CHARACTERS[rng.random_range(0..CHARACTERS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_length_and_alphabet() {
        let payload = random_payload(256);
        assert_eq!(payload.len(), 256);
        assert!(payload.bytes().all(|b| b.is_ascii_lowercase()));
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(random_payload(0), "");
    }
}
