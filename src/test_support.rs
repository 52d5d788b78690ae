// src/test_support.rs
//
// Utilitários compartilhados pelos testes: identidades, tokens e um estado em memória.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use crate::{
    config::AppState,
    db::memory::MemoryStore,
    models::auth::{Claims, IdentityClaim, Role},
    services::auth::TokenVerifier,
};

pub const TEST_SECRET: &str = "segredo-de-teste";

pub fn claim(email: &str, role: Role) -> IdentityClaim {
    IdentityClaim {
        subject_id: Uuid::new_v4(),
        email: email.to_string(),
        role,
        business_id: None,
    }
}

pub fn issue_token(subject: Uuid, email: &str, role: Role, business_id: Option<i64>) -> String {
    let exp = (Utc::now() + Duration::days(7)).timestamp() as usize;
    issue_token_with_exp(subject, email, role, business_id, exp)
}

pub fn issue_token_with_exp(subject: Uuid, email: &str, role: Role, business_id: Option<i64>, exp: usize) -> String {
    let claims = Claims {
        sub: subject,
        email: email.to_string(),
        role,
        business_id,
        exp,
        iat: Utc::now().timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes())).unwrap()
}

pub fn token_for(claim: &IdentityClaim) -> String {
    issue_token(claim.subject_id, &claim.email, claim.role, claim.business_id)
}

pub fn memory_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::from_repos(
        TokenVerifier::new(TEST_SECRET),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    (state, store)
}
