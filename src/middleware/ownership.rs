// src/middleware/ownership.rs
//
// Guarda de propriedade: uma única política de autorização usada por todos os
// serviços antes de qualquer leitura escopada ou mutação.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        addresses::Address,
        auth::{IdentityClaim, Role},
        orders::Order,
    },
};

/// Uma chave que identifica o dono de um recurso.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKey<'a> {
    Email(&'a str),
    Subject(Uuid),
    // Só casa com um `duenio` daquele negócio.
    Business(i64),
}

impl OwnerKey<'_> {
    fn matches(&self, claim: &IdentityClaim) -> bool {
        match *self {
            OwnerKey::Email(email) => claim.email == email,
            OwnerKey::Subject(id) => claim.subject_id == id,
            OwnerKey::Business(business_id) => {
                claim.role == Role::Duenio && claim.business_id == Some(business_id)
            }
        }
    }
}

/// Recursos com dono declarado. Cada tipo diz quais chaves o identificam.
pub trait Owned {
    fn owner_keys(&self) -> Vec<OwnerKey<'_>>;
}

/// Carrinho: o dono é o e-mail.
pub struct CartOwner<'a>(pub &'a str);

impl Owned for CartOwner<'_> {
    fn owner_keys(&self) -> Vec<OwnerKey<'_>> {
        vec![OwnerKey::Email(self.0)]
    }
}

/// Dono de endereços, antes de o endereço existir (criação e listagem).
pub struct AddressOwner(pub Uuid);

impl Owned for AddressOwner {
    fn owner_keys(&self) -> Vec<OwnerKey<'_>> {
        vec![OwnerKey::Subject(self.0)]
    }
}

impl Owned for Address {
    fn owner_keys(&self) -> Vec<OwnerKey<'_>> {
        vec![OwnerKey::Subject(self.owner_id)]
    }
}

// O pedido pertence ao cliente e também é visível ao dono do negócio.
impl Owned for Order {
    fn owner_keys(&self) -> Vec<OwnerKey<'_>> {
        vec![OwnerKey::Email(&self.owner_email), OwnerKey::Business(self.business_id)]
    }
}

/// Permite se o chamador for admin ou se alguma chave do recurso casar com a identidade.
pub fn authorize<R: Owned + ?Sized>(claim: &IdentityClaim, resource: &R) -> Result<(), AppError> {
    if claim.is_admin() || resource.owner_keys().iter().any(|key| key.matches(claim)) {
        return Ok(());
    }

    tracing::warn!(
        subject_id = %claim.subject_id,
        role = ?claim.role,
        "acesso negado pela guarda de propriedade"
    );
    Err(AppError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::claim;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn order(owner: &str, business_id: i64) -> Order {
        Order {
            id: Uuid::new_v4(),
            owner_email: owner.into(),
            business_id,
            delivery_address: None,
            total: Decimal::ZERO,
            notes: None,
            status: crate::models::orders::OrderStatus::Pendiente,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_email_is_allowed_and_others_denied() {
        let me = claim("a@x.com", Role::Cliente);
        assert!(authorize(&me, &CartOwner("a@x.com")).is_ok());
        assert!(matches!(authorize(&me, &CartOwner("b@x.com")), Err(AppError::Forbidden)));
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = claim("root@x.com", Role::Admin);
        assert!(authorize(&admin, &CartOwner("b@x.com")).is_ok());
        assert!(authorize(&admin, &AddressOwner(Uuid::new_v4())).is_ok());
    }

    #[test]
    fn address_ownership_uses_subject_id() {
        let me = claim("a@x.com", Role::Cliente);
        assert!(authorize(&me, &AddressOwner(me.subject_id)).is_ok());
        assert!(authorize(&me, &AddressOwner(Uuid::new_v4())).is_err());
    }

    #[test]
    fn business_owner_sees_orders_of_their_business_only() {
        let mut dono = claim("dono@x.com", Role::Duenio);
        dono.business_id = Some(3);
        assert!(authorize(&dono, &order("a@x.com", 3)).is_ok());
        assert!(authorize(&dono, &order("a@x.com", 4)).is_err());

        // Um cliente com business_id forjado não ganha acesso.
        let mut cliente = claim("c@x.com", Role::Cliente);
        cliente.business_id = Some(3);
        assert!(authorize(&cliente, &order("a@x.com", 3)).is_err());
    }
}
