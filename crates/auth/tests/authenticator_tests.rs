use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use huddle_auth::{AuthError, Authenticator};
use huddle_config::AuthConfig;
use huddle_database::{test_support::TestDatabase, UserId};

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

struct TestContext {
    database: TestDatabase,
    authenticator: Authenticator,
}

impl TestContext {
    async fn new(session_ttl_seconds: u64) -> TestResult<Self> {
        let database = TestDatabase::with_users(&["user_1", "user_2"]).await?;
        let authenticator = Authenticator::new(
            database.pool.clone(),
            AuthConfig {
                session_ttl_seconds,
            },
        );

        Ok(Self {
            database,
            authenticator,
        })
    }
}

#[tokio::test]
async fn issued_token_authenticates_as_its_user() -> TestResult {
    let ctx = TestContext::new(3_600).await?;
    let user = UserId::from("user_1");

    let session = ctx.authenticator.issue_session(&user).await?;
    let decoded = URL_SAFE_NO_PAD.decode(&session.token)?;
    assert_eq!(decoded.len(), 32);
    assert!(session.expires_at > Utc::now() + Duration::minutes(59));

    let resolved = ctx.authenticator.authenticate_token(&session.token).await?;
    assert_eq!(resolved.user_id, user);
    assert_eq!(resolved.token, session.token);
    Ok(())
}

#[tokio::test]
async fn tokens_are_unique_per_session() -> TestResult {
    let ctx = TestContext::new(3_600).await?;
    let user = UserId::from("user_2");

    let first = ctx.authenticator.issue_session(&user).await?;
    let second = ctx.authenticator.issue_session(&user).await?;
    assert_ne!(first.token, second.token);
    Ok(())
}

#[tokio::test]
async fn issuing_for_unknown_user_fails() -> TestResult {
    let ctx = TestContext::new(3_600).await?;

    let result = ctx.authenticator.issue_session(&UserId::from("ghost")).await;
    assert!(matches!(result, Err(AuthError::UnknownUser(id)) if id == "ghost"));
    Ok(())
}

#[tokio::test]
async fn unknown_and_blank_tokens_are_rejected() -> TestResult {
    let ctx = TestContext::new(3_600).await?;

    assert!(matches!(
        ctx.authenticator.authenticate_token("not-a-token").await,
        Err(AuthError::SessionNotFound)
    ));
    assert!(matches!(
        ctx.authenticator.authenticate_token("   ").await,
        Err(AuthError::InvalidSession)
    ));
    Ok(())
}

#[tokio::test]
async fn expired_sessions_are_rejected_and_removed() -> TestResult {
    let ctx = TestContext::new(0).await?;

    let session = ctx.authenticator.issue_session(&UserId::from("user_1")).await?;
    let result = ctx.authenticator.authenticate_token(&session.token).await;
    assert!(matches!(result, Err(AuthError::SessionExpired)));

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&ctx.database.pool)
        .await?;
    assert_eq!(remaining, 0);
    Ok(())
}

#[tokio::test]
async fn revoked_tokens_stop_working() -> TestResult {
    let ctx = TestContext::new(3_600).await?;

    let session = ctx.authenticator.issue_session(&UserId::from("user_1")).await?;
    assert!(ctx.authenticator.revoke(&session.token).await?);
    assert!(!ctx.authenticator.revoke(&session.token).await?);

    let result = ctx.authenticator.authenticate_token(&session.token).await;
    assert!(matches!(result, Err(AuthError::SessionNotFound)));
    Ok(())
}
