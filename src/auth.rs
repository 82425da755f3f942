use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Partner,
    Admin,
}

/// The authenticated caller of a dispatch action. The upstream gateway has
/// already verified the session; dispatch only checks the role fits the
/// operation.
#[derive(Debug, Clone, Copy)]
pub struct ActingIdentity {
    pub id: Uuid,
    pub role: Role,
}

impl ActingIdentity {
    pub fn can_act_as_partner(&self) -> bool {
        matches!(self.role, Role::Partner | Role::Admin)
    }

    pub fn can_view_order(&self, customer_id: Uuid) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Customer => self.id == customer_id,
            Role::Partner => false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ActingIdentity
where
    S: Send + Sync,
{
    type Rejection = DispatchError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_value(parts, "x-actor-id")?
            .parse::<Uuid>()
            .map_err(|_| DispatchError::BadRequest("x-actor-id must be a uuid".to_string()))?;

        let role = match header_value(parts, "x-actor-role")? {
            "customer" => Role::Customer,
            "deliveryBoy" => Role::Partner,
            "admin" => Role::Admin,
            other => {
                return Err(DispatchError::BadRequest(format!(
                    "unknown role: {other}"
                )))
            }
        };

        Ok(ActingIdentity { id, role })
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, DispatchError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| DispatchError::BadRequest(format!("missing {name} header")))
}
