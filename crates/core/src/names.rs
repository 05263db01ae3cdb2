//! 임의 이름 생성

/// 길이 `len`의 임의 영숫자 문자열을 생성합니다.
///
/// UUID v4의 16진 표현을 이어 붙여 만듭니다.
pub fn random_alphanumeric(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        out.push_str(&uuid::Uuid::new_v4().simple().to_string());
    }
    out.truncate(len);
    out
}

/// `prefix-xxxxxxxx` 형식의 이름을 생성합니다.
pub fn random_name(prefix: &str) -> String {
    format!("{prefix}-{}", random_alphanumeric(8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_alphanumeric_has_requested_length() {
        for len in [0, 1, 8, 32, 33, 100] {
            let s = random_alphanumeric(len);
            assert_eq!(s.len(), len);
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn random_names_differ() {
        assert_ne!(random_name("kp"), random_name("kp"));
        assert!(random_name("kp").starts_with("kp-"));
    }
}
