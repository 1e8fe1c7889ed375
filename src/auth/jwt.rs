use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Access tokens are minted by the identity service; this side only verifies.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
pub fn generate_access_token(
    user_id: u64,
    username: &str,
    role: u8,
    employee_code: Option<&str>,
    secret: &str,
) -> String {
    use crate::models::TokenType;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        user_id,
        sub: username.to_string(),
        role,
        exp: now + 900,
        jti: uuid::Uuid::new_v4().to_string(),
        token_type: TokenType::Access,
        employee_code: employee_code.map(str::to_string),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
