use crate::config::Config;
use crate::models::{Claims, TokenType};
use crate::{auth::jwt::verify_token, model::role::Role};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_code: Option<String>,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Result<Self, &'static str> {
        if claims.token_type != TokenType::Access {
            return Err("Access token required");
        }

        let role = Role::from_id(claims.role).ok_or("Invalid role")?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_code: claims.employee_code,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already verified by the middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(AuthUser::from_claims(claims).map_err(ErrorUnauthorized))
    }
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Hr) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("HR/Admin only"))
        }
    }

    /// The caller's own employee code; attendance can only be marked for self.
    pub fn employee_code(&self) -> actix_web::Result<&str> {
        self.employee_code
            .as_deref()
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))
    }

    /// Resolves whose records the caller may read: their own by default, any
    /// employee's for HR/Admin.
    pub fn viewable_code(&self, requested: Option<&str>) -> actix_web::Result<String> {
        match requested {
            Some(code) if self.employee_code.as_deref() == Some(code) => Ok(code.to_string()),
            Some(code) => {
                self.require_hr_or_admin()?;
                Ok(code.to_string())
            }
            None => self.employee_code().map(str::to_string),
        }
    }
}
