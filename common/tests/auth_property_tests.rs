// Property-based tests for authentication

use common::auth::{JwtService, verify_password};
use common::errors::AuthError;
use proptest::prelude::*;
use uuid::Uuid;

fn create_test_jwt_service() -> JwtService {
    JwtService::new("test-secret-key-for-property-tests", 24)
}

// Any issued token decodes back to the same user and email, and expires
// after it was issued.
#[test]
fn property_token_round_trip_preserves_identity() {
    proptest!(|(
        local in "[a-z][a-z0-9.]{2,20}",
        domain in "[a-z]{3,10}\\.(com|id|co\\.id)"
    )| {
        let jwt_service = create_test_jwt_service();
        let user_id = Uuid::new_v4();
        let email = format!("{}@{}", local, domain);

        let token = jwt_service
            .encode_token(&user_id.to_string(), &email)
            .expect("Failed to encode token");
        let claims = jwt_service
            .decode_token(&token)
            .expect("Failed to decode token");

        prop_assert_eq!(claims.user_id(), Some(user_id));
        prop_assert_eq!(&claims.email, &email);
        prop_assert!(claims.exp > claims.iat, "Expiration should be after issued time");
    });
}

// Garbage never decodes into claims.
#[test]
fn property_invalid_token_rejection() {
    proptest!(|(invalid_token in "[a-zA-Z0-9._-]{10,100}")| {
        let jwt_service = create_test_jwt_service();

        let result = jwt_service.decode_token(&invalid_token);
        prop_assert!(
            matches!(result, Err(AuthError::InvalidToken(_))),
            "Invalid token should be rejected"
        );
    });
}

// A token signed with one secret is rejected by a service holding another.
#[test]
fn property_foreign_secret_rejected() {
    proptest!(|(
        secret_a in "[A-Za-z0-9]{16,40}",
        secret_b in "[A-Za-z0-9]{16,40}"
    )| {
        prop_assume!(secret_a != secret_b);

        let issuer = JwtService::new(&secret_a, 1);
        let verifier = JwtService::new(&secret_b, 1);
        let token = issuer
            .encode_token(&Uuid::new_v4().to_string(), "budi@example.com")
            .expect("Failed to encode token");

        prop_assert!(verifier.decode_token(&token).is_err());
    });
}

// Tampering with the payload segment invalidates the signature.
#[test]
fn property_tampered_payload_rejected() {
    proptest!(|(replacement in "[A-Za-z0-9_-]{20,60}")| {
        let jwt_service = create_test_jwt_service();
        let token = jwt_service
            .encode_token(&Uuid::new_v4().to_string(), "budi@example.com")
            .expect("Failed to encode token");

        let parts: Vec<&str> = token.split('.').collect();
        prop_assume!(parts[1] != replacement);
        let tampered = format!("{}.{}.{}", parts[0], replacement, parts[2]);

        prop_assert!(jwt_service.decode_token(&tampered).is_err());
    });
}

// bcrypt accepts the original password and nothing else. Hashing at the
// production cost is slow, so these cases use the minimum cost.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn property_password_hash_verification(
        password in "[A-Za-z0-9!@#$%]{6,30}",
        other in "[A-Za-z0-9!@#$%]{6,30}"
    ) {
        let hash = bcrypt::hash(&password, 4).expect("Failed to hash password");

        prop_assert!(!hash.contains(&password));
        prop_assert!(verify_password(&password, &hash).unwrap());
        if other != password {
            prop_assert!(!verify_password(&other, &hash).unwrap());
        }
    }
}
