use actix_web::{dev::Payload, web, Error as ActixWebError};
use actix_web::{error::ErrorUnauthorized, http, FromRequest, HttpRequest};
use core::fmt;
use jsonwebtoken::{decode, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::core::config::JwtAuthConfig;
use crate::core::AppError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(&self).unwrap())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String, // user ID
    pub role: String,
    pub exp: usize, // expiration time
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<i32, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }
}

impl FromRequest for JwtClaims {
    type Error = ActixWebError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|value| value.to_string());

        let token = match token {
            Some(token) => token,
            None => {
                let error = ErrorResponse {
                    message: "No authentication token found".to_string(),
                    success: false,
                };
                return ready(Err(ErrorUnauthorized(error)));
            }
        };

        let jwt_config = match req.app_data::<web::Data<JwtAuthConfig>>() {
            Some(config) => config,
            None => {
                let error = ErrorResponse {
                    message: "Authentication is not configured".to_string(),
                    success: false,
                };
                return ready(Err(ErrorUnauthorized(error)));
            }
        };

        let claims = match decode::<JwtClaims>(
            &token,
            &DecodingKey::from_secret(jwt_config.secret.expose_secret().as_ref()),
            &Validation::default(),
        ) {
            Ok(c) => c.claims,
            Err(_) => {
                let error = ErrorResponse {
                    message: "Invalid token".to_string(),
                    success: false,
                };
                return ready(Err(ErrorUnauthorized(error)));
            }
        };

        ready(Ok(claims))
    }
}
