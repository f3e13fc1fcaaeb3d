use chrono::Utc;
use rand::Rng;

/// Upper-case alphabet without the look-alikes `0/O` and `1/I`.
const FRIENDLY_ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const FRIENDLY_ID_LEN: usize = 6;

pub fn now_naive() -> chrono::NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn generate_friendly_id() -> String {
    let mut rng = rand::thread_rng();
    (0..FRIENDLY_ID_LEN)
        .map(|_| FRIENDLY_ID_ALPHABET[rng.gen_range(0..FRIENDLY_ID_ALPHABET.len())] as char)
        .collect()
}

pub fn looks_like_friendly_id(raw: &str) -> bool {
    raw.len() == FRIENDLY_ID_LEN
        && raw
            .bytes()
            .all(|b| FRIENDLY_ID_ALPHABET.contains(&b.to_ascii_uppercase()))
}

/// Keeps the first three and last three digits of a CPF.
pub fn mask_cpf(cpf: &str) -> String {
    let chars: Vec<char> = cpf.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[8..].iter().collect();
    format!("{head}*****{tail}")
}

pub fn join_numbers(numbers: &[i32]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
