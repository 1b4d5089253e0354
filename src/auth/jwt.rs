use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub exp: i64,
}

impl UserClaims {
    pub fn new(user_id: uuid::Uuid, ttl: chrono::Duration) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: (chrono::Utc::now() + ttl).timestamp(),
        }
    }

    pub fn user_id(&self) -> Option<uuid::Uuid> {
        self.sub.parse().ok()
    }
}

pub fn generate_token<K: AsRef<[u8]>>(
    claims: UserClaims,
    key: K,
) -> jsonwebtoken::errors::Result<String> {
    let header = Header::default();
    let key = EncodingKey::from_secret(key.as_ref());

    let token = jsonwebtoken::encode(&header, &claims, &key)?;
    Ok(token)
}

pub fn process_token<K: AsRef<[u8]>>(
    token: &str,
    key: K,
) -> jsonwebtoken::errors::Result<TokenData<UserClaims>> {
    let validation = Validation::default();
    let key = DecodingKey::from_secret(key.as_ref());

    let claims = jsonwebtoken::decode::<UserClaims>(token, &key, &validation)?;
    Ok(claims)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip_claims() {
        let id = uuid::Uuid::new_v4();
        let token = generate_token(UserClaims::new(id, chrono::Duration::minutes(5)), "key").unwrap();
        let data = process_token(&token, "key").unwrap();
        assert_eq!(data.claims.user_id(), Some(id));
    }

    #[test]
    fn wrong_key_rejected() {
        let id = uuid::Uuid::new_v4();
        let token = generate_token(UserClaims::new(id, chrono::Duration::minutes(5)), "key").unwrap();
        assert!(process_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let claims = UserClaims {
            sub: uuid::Uuid::new_v4().to_string(),
            exp: (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp(),
        };
        let token = generate_token(claims, "key").unwrap();
        let err = process_token(&token, "key").unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }
}
