//! String helpers shared by record construction.

/// URL-friendly protocol identifier: lowercase, whitespace to `-`, apostrophes dropped.
pub fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| *c != '\'')
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Aave V3"), "aave-v3");
        assert_eq!(slug("Lido's Vault"), "lidos-vault");
        assert_eq!(slug(""), "");
    }
}
