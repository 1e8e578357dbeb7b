#[cfg(test)]
mod integration_tests {
    use crate::auth::{self, Role};
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{
        setup_test_app, ADMIN_EMAIL, ADMIN_PASSWORD, TEST_JWT_SECRET,
    };
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
    }

    async fn login_admin(server: &TestServer) -> String {
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        body.data["token"].as_str().unwrap().to_string()
    }

    async fn create_agent(
        server: &TestServer,
        admin_token: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> Value {
        let (name, value) = bearer(admin_token);
        let response = server
            .post("/api/v1/agents")
            .add_header(name, value)
            .json(&json!({ "username": username, "email": email, "password": password }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data
    }

    async fn login_agent(server: &TestServer, username: &str, password: &str) -> String {
        let response = server
            .post("/api/v1/auth/agent-login")
            .json(&json!({ "username": username, "password": password }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        body.data["token"].as_str().unwrap().to_string()
    }

    async fn signup_user(server: &TestServer, email: &str, full_name: &str) -> (String, i64) {
        let response = server
            .post("/api/v1/auth/signup")
            .json(&json!({ "email": email, "password": "user-secret", "fullName": full_name }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        let token = body.data["token"].as_str().unwrap().to_string();
        let id = body.data["user"]["id"].as_i64().unwrap();
        (token, id)
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);

        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_admin_login_succeeds() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert!(body.success);
        assert!(!body.data["token"].as_str().unwrap().is_empty());
        assert_eq!(body.data["user"]["email"], ADMIN_EMAIL);
        assert_eq!(body.data["user"]["role"], "admin");
        // No password material in the session payload
        assert!(body.data["user"].get("password").is_none());
        assert!(body.data["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_login_failures_share_one_shape() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // Unknown email
        let unknown = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "nobody@flexypay.test", "password": "whatever" }))
            .await;
        unknown.assert_status(StatusCode::UNAUTHORIZED);
        let unknown_body: Value = unknown.json();

        // Known email, wrong password
        let wrong = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": ADMIN_EMAIL, "password": "not-the-password" }))
            .await;
        wrong.assert_status(StatusCode::UNAUTHORIZED);
        let wrong_body: Value = wrong.json();

        // Indistinguishable responses: no user-enumeration leak.
        assert_eq!(unknown_body, wrong_body);
        assert_eq!(unknown_body["error"], "Invalid credentials");
        assert_eq!(unknown_body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_signup_creates_user_account() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (token, _id) = signup_user(&server, "jane@example.com", "Jane Doe").await;

        let claims = auth::decode_token(TEST_JWT_SECRET, &token).unwrap();
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_conflict() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        signup_user(&server, "jane@example.com", "Jane Doe").await;

        let response = server
            .post("/api/v1/auth/signup")
            .json(&json!({
                "email": "jane@example.com",
                "password": "another-secret",
                "fullName": "Jane Again"
            }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["code"], "USER_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_agent_login_is_case_insensitive() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "Ali", "ali@example.com", "secret1").await;

        // Login with different casing than the stored username
        let token = login_agent(&server, "ALI", "secret1").await;
        assert!(!token.is_empty());

        let response = server
            .post("/api/v1/auth/agent-login")
            .json(&json!({ "username": "ali", "password": "wrong" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_agent_token_carries_agent_role() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        let agent = create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;

        let response = server
            .post("/api/v1/auth/agent-login")
            .json(&json!({ "username": "ali", "password": "secret1" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["user"]["role"], "agent");
        assert_eq!(body.data["user"]["username"], "ali");

        let claims =
            auth::decode_token(TEST_JWT_SECRET, body.data["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.role, Role::Agent);
        assert_eq!(claims.id, agent["id"].as_i64().unwrap() as i32);
    }

    // ------------------------------------------------------------------
    // Authorization gates
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_missing_bearer_token_unauthorized() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/agents").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_malformed_authorization_header_unauthorized() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .get("/api/v1/agents")
            .add_header(
                HeaderName::from_static("authorization"),
                HeaderValue::from_static("Basic dXNlcjpwYXNz"),
            )
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_invalid_token_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (name, value) = bearer("not.a.token");
        let response = server.get("/api/v1/agents").add_header(name, value).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_non_admin_forbidden_on_admin_routes() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;
        let agent_token = login_agent(&server, "ali", "secret1").await;
        let (user_token, _) = signup_user(&server, "jane@example.com", "Jane Doe").await;

        for token in [&agent_token, &user_token] {
            let (name, value) = bearer(token);
            let response = server.get("/api/v1/users").add_header(name, value).await;
            response.assert_status(StatusCode::FORBIDDEN);
            let body: Value = response.json();
            assert_eq!(body["code"], "FORBIDDEN");
        }
    }

    // ------------------------------------------------------------------
    // Agents directory
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_agent_returns_no_password() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        let agent = create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;

        assert_eq!(agent["username"], "ali");
        assert_eq!(agent["email"], "ali@example.com");
        assert!(agent["id"].as_i64().unwrap() > 0);
        // Neither the plaintext nor the hash is ever echoed back
        assert!(agent.get("password").is_none());
        assert!(agent.get("passwordHash").is_none());

        let (name, value) = bearer(&admin_token);
        let response = server.get("/api/v1/agents").add_header(name, value).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert!(body.data[0].get("password").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_agent_username_conflict() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;

        // Same username with different casing still collides
        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/agents")
            .add_header(name, value)
            .json(&json!({ "username": "ALI", "email": "other@example.com", "password": "secret2" }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["code"], "USERNAME_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_duplicate_agent_email_conflict() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/agents")
            .add_header(name, value)
            .json(&json!({ "username": "omar", "email": "ALI@example.com", "password": "secret2" }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["code"], "EMAIL_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_delete_agent() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        let agent = create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;
        let agent_id = agent["id"].as_i64().unwrap();

        let (name, value) = bearer(&admin_token);
        let response = server
            .delete(&format!("/api/v1/agents/{}", agent_id))
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::OK);

        // Deleting again reports not-found, never a silent success
        let (name, value) = bearer(&admin_token);
        let response = server
            .delete(&format!("/api/v1/agents/{}", agent_id))
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    // ------------------------------------------------------------------
    // Users directory
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_users_lists_without_password_hash() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        signup_user(&server, "jane@example.com", "Jane Doe").await;

        let (name, value) = bearer(&admin_token);
        let response = server.get("/api/v1/users").add_header(name, value).await;
        response.assert_status(StatusCode::OK);

        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 2);
        let jane = body
            .data
            .iter()
            .find(|u| u["email"] == "jane@example.com")
            .unwrap();
        assert_eq!(jane["role"], "user");
        assert_eq!(jane["fullName"], "Jane Doe");
        assert!(jane.get("passwordHash").is_none());
        assert!(jane.get("password").is_none());
    }

    // ------------------------------------------------------------------
    // Installments
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_admin_assigns_installment_to_agent() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        let agent = create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/installments")
            .add_header(name, value)
            .json(&json!({
                "title": "Jan",
                "amount": 1000,
                "date": "2024-01-05",
                "agentName": "ALI"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["title"], "Jan");
        assert_eq!(body.data["status"], "pending");
        // Assignment resolved case-insensitively to the stored agent
        assert_eq!(body.data["agentId"], agent["id"]);
        assert_eq!(body.data["agentName"], "ali");
        assert_eq!(body.data["date"], "2024-01-05");
        assert!(body.data["userId"].is_null());
    }

    #[tokio::test]
    async fn test_installment_with_unknown_agent_not_persisted() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/installments")
            .add_header(name, value)
            .json(&json!({
                "title": "Jan",
                "amount": 1000,
                "date": "2024-01-05",
                "agentName": "ali"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Agent not found");
        assert_eq!(body["code"], "AGENT_NOT_FOUND");

        // Nothing was written
        let (name, value) = bearer(&admin_token);
        let response = server
            .get("/api/v1/installments")
            .add_header(name, value)
            .await;
        let list: ApiResponse<Vec<Value>> = response.json();
        assert!(list.data.is_empty());
    }

    #[tokio::test]
    async fn test_user_creates_self_owned_installment() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (user_token, user_id) = signup_user(&server, "jane@example.com", "Jane Doe").await;

        let (name, value) = bearer(&user_token);
        let response = server
            .post("/api/v1/installments")
            .add_header(name, value)
            .json(&json!({
                "title": "Fridge",
                "amount": 450.5,
                "date": "2024-02-01",
                "status": "approved"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["userId"].as_i64().unwrap(), user_id);
        assert!(body.data["agentId"].is_null());
        // Non-admin callers cannot pick the initial status
        assert_eq!(body.data["status"], "pending");
    }

    #[tokio::test]
    async fn test_installment_listing_is_role_scoped() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;
        create_agent(&server, &admin_token, "omar", "omar@example.com", "secret2").await;
        let ali_token = login_agent(&server, "ali", "secret1").await;
        let (user_token, _) = signup_user(&server, "jane@example.com", "Jane Doe").await;

        // One installment per owner
        for (title, agent_name) in [("Jan", "ali"), ("Feb", "omar")] {
            let (name, value) = bearer(&admin_token);
            let response = server
                .post("/api/v1/installments")
                .add_header(name, value)
                .json(&json!({
                    "title": title,
                    "amount": 100,
                    "date": "2024-01-05",
                    "agentName": agent_name
                }))
                .await;
            response.assert_status(StatusCode::CREATED);
        }
        let (name, value) = bearer(&user_token);
        server
            .post("/api/v1/installments")
            .add_header(name, value)
            .json(&json!({ "title": "Fridge", "amount": 450, "date": "2024-02-01" }))
            .await
            .assert_status(StatusCode::CREATED);

        // Admin sees the full set
        let (name, value) = bearer(&admin_token);
        let response = server
            .get("/api/v1/installments")
            .add_header(name, value)
            .await;
        let all: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(all.data.len(), 3);

        // Agent ali sees only their own assignment
        let (name, value) = bearer(&ali_token);
        let response = server
            .get("/api/v1/installments")
            .add_header(name, value)
            .await;
        let mine: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(mine.data.len(), 1);
        assert_eq!(mine.data[0]["agentName"], "ali");

        // User sees only their self-owned record
        let (name, value) = bearer(&user_token);
        let response = server
            .get("/api/v1/installments")
            .add_header(name, value)
            .await;
        let own: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(own.data.len(), 1);
        assert_eq!(own.data[0]["title"], "Fridge");
    }

    #[tokio::test]
    async fn test_installment_get_by_id_owner_or_admin() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;
        create_agent(&server, &admin_token, "omar", "omar@example.com", "secret2").await;
        let ali_token = login_agent(&server, "ali", "secret1").await;
        let omar_token = login_agent(&server, "omar", "secret2").await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/installments")
            .add_header(name, value)
            .json(&json!({ "title": "Jan", "amount": 100, "date": "2024-01-05", "agentName": "ali" }))
            .await;
        let created: ApiResponse<Value> = response.json();
        let id = created.data["id"].as_i64().unwrap();

        // Owner reads it
        let (name, value) = bearer(&ali_token);
        server
            .get(&format!("/api/v1/installments/{}", id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::OK);

        // Another agent is rejected
        let (name, value) = bearer(&omar_token);
        server
            .get(&format!("/api/v1/installments/{}", id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // Admin reads anything
        let (name, value) = bearer(&admin_token);
        server
            .get(&format!("/api/v1/installments/{}", id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::OK);

        // Unknown id is a 404, not a 403
        let (name, value) = bearer(&admin_token);
        server
            .get("/api/v1/installments/99999")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_approves_installment() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/installments")
            .add_header(name, value)
            .json(&json!({ "title": "Jan", "amount": 100, "date": "2024-01-05", "agentName": "ali" }))
            .await;
        let created: ApiResponse<Value> = response.json();
        let id = created.data["id"].as_i64().unwrap();
        assert!(created.data["updatedAt"].is_null());

        let (name, value) = bearer(&admin_token);
        let response = server
            .put(&format!("/api/v1/installments/{}", id))
            .add_header(name, value)
            .json(&json!({ "status": "approved" }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["status"], "approved");
        assert!(!body.data["updatedAt"].is_null());
    }

    #[tokio::test]
    async fn test_approved_installment_cannot_return_to_pending() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/installments")
            .add_header(name, value)
            .json(&json!({
                "title": "Jan",
                "amount": 100,
                "date": "2024-01-05",
                "agentName": "ali",
                "status": "approved"
            }))
            .await;
        let created: ApiResponse<Value> = response.json();
        assert_eq!(created.data["status"], "approved");
        let id = created.data["id"].as_i64().unwrap();

        let (name, value) = bearer(&admin_token);
        let response = server
            .put(&format!("/api/v1/installments/{}", id))
            .add_header(name, value)
            .json(&json!({ "status": "pending" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_STATUS_TRANSITION");
    }

    #[tokio::test]
    async fn test_installment_update_with_unknown_agent_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/installments")
            .add_header(name, value)
            .json(&json!({ "title": "Jan", "amount": 100, "date": "2024-01-05", "agentName": "ali" }))
            .await;
        let created: ApiResponse<Value> = response.json();
        let id = created.data["id"].as_i64().unwrap();

        let (name, value) = bearer(&admin_token);
        let response = server
            .put(&format!("/api/v1/installments/{}", id))
            .add_header(name, value)
            .json(&json!({ "agentName": "ghost" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "AGENT_NOT_FOUND");

        // Ownership is unchanged
        let (name, value) = bearer(&admin_token);
        let response = server
            .get(&format!("/api/v1/installments/{}", id))
            .add_header(name, value)
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["agentName"], "ali");
    }

    #[tokio::test]
    async fn test_installment_delete_unknown_id_not_found() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .delete("/api/v1/installments/424242")
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_agent_cannot_update_or_delete_installments() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;
        let ali_token = login_agent(&server, "ali", "secret1").await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/installments")
            .add_header(name, value)
            .json(&json!({ "title": "Jan", "amount": 100, "date": "2024-01-05", "agentName": "ali" }))
            .await;
        let created: ApiResponse<Value> = response.json();
        let id = created.data["id"].as_i64().unwrap();

        // Even the owner cannot transition or delete
        let (name, value) = bearer(&ali_token);
        server
            .put(&format!("/api/v1/installments/{}", id))
            .add_header(name, value)
            .json(&json!({ "status": "approved" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let (name, value) = bearer(&ali_token);
        server
            .delete(&format!("/api/v1/installments/{}", id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    // ------------------------------------------------------------------
    // Admin amounts
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_admin_amount_bakaya_derived_exactly() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        // Float-noisy inputs still derive an exact two-decimal balance
        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/admin-amounts")
            .add_header(name, value)
            .json(&json!({
                "username": "customer-one",
                "amount": 100.1,
                "wasoolAmount": 33.33,
                "date": "2024-01-01"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["bakayaAmount"], "66.77");
        assert_eq!(body.data["createdBy"], "Admin");
    }

    #[tokio::test]
    async fn test_admin_amount_wasool_exceeding_total_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/admin-amounts")
            .add_header(name, value)
            .json(&json!({
                "username": "customer-one",
                "amount": 100,
                "wasoolAmount": 100.01,
                "date": "2024-01-01"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_AMOUNT");
        assert_eq!(body["error"], "Wasool amount cannot exceed total amount");

        // No record was created
        let (name, value) = bearer(&admin_token);
        let response = server
            .get("/api/v1/admin-amounts")
            .add_header(name, value)
            .await;
        let list: ApiResponse<Vec<Value>> = response.json();
        assert!(list.data.is_empty());
    }

    #[tokio::test]
    async fn test_admin_amount_negative_inputs_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        for payload in [
            json!({ "username": "c", "amount": -1, "wasoolAmount": 0, "date": "2024-01-01" }),
            json!({ "username": "c", "amount": 10, "wasoolAmount": -2, "date": "2024-01-01" }),
        ] {
            let (name, value) = bearer(&admin_token);
            let response = server
                .post("/api/v1/admin-amounts")
                .add_header(name, value)
                .json(&payload)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert_eq!(body["code"], "INVALID_AMOUNT");
        }
    }

    #[tokio::test]
    async fn test_admin_amount_missing_field_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/admin-amounts")
            .add_header(name, value)
            .json(&json!({ "username": "customer-one", "amount": 100, "date": "2024-01-01" }))
            .await;
        assert!(response.status_code().is_client_error());

        let (name, value) = bearer(&admin_token);
        let response = server
            .get("/api/v1/admin-amounts")
            .add_header(name, value)
            .await;
        let list: ApiResponse<Vec<Value>> = response.json();
        assert!(list.data.is_empty());
    }

    #[tokio::test]
    async fn test_admin_amount_round_trip() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/admin-amounts")
            .add_header(name, value)
            .json(&json!({
                "username": "customer-one",
                "amount": 250.5,
                "wasoolAmount": 100.25,
                "date": "2024-03-15"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ApiResponse<Value> = response.json();
        let id = created.data["id"].as_i64().unwrap();

        let (name, value) = bearer(&admin_token);
        let response = server
            .get("/api/v1/admin-amounts")
            .add_header(name, value)
            .await;
        let list: ApiResponse<Vec<Value>> = response.json();
        let fetched = list.data.iter().find(|e| e["id"].as_i64() == Some(id)).unwrap();

        assert_eq!(fetched["amount"], created.data["amount"]);
        assert_eq!(fetched["wasoolAmount"], created.data["wasoolAmount"]);
        assert_eq!(fetched["bakayaAmount"], created.data["bakayaAmount"]);
        assert_eq!(fetched["bakayaAmount"], "150.25");
        assert_eq!(fetched["date"], "2024-03-15");
    }

    #[tokio::test]
    async fn test_admin_amount_update_recomputes_bakaya() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/admin-amounts")
            .add_header(name, value)
            .json(&json!({
                "username": "customer-one",
                "amount": 500,
                "wasoolAmount": 200,
                "date": "2024-01-01"
            }))
            .await;
        let created: ApiResponse<Value> = response.json();
        let id = created.data["id"].as_i64().unwrap();
        assert!(created.data["updatedAt"].is_null());

        let (name, value) = bearer(&admin_token);
        let response = server
            .put(&format!("/api/v1/admin-amounts/{}", id))
            .add_header(name, value)
            .json(&json!({ "amount": 500, "wasoolAmount": 450.5, "date": "2024-01-02" }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["bakayaAmount"], "49.5");
        assert_eq!(body.data["date"], "2024-01-02");
        assert!(!body.data["updatedAt"].is_null());
    }

    #[tokio::test]
    async fn test_admin_amount_update_invalid_leaves_row_unchanged() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/admin-amounts")
            .add_header(name, value)
            .json(&json!({
                "username": "customer-one",
                "amount": 500,
                "wasoolAmount": 200,
                "date": "2024-01-01"
            }))
            .await;
        let created: ApiResponse<Value> = response.json();
        let id = created.data["id"].as_i64().unwrap();

        let (name, value) = bearer(&admin_token);
        let response = server
            .put(&format!("/api/v1/admin-amounts/{}", id))
            .add_header(name, value)
            .json(&json!({ "amount": 100, "wasoolAmount": 150, "date": "2024-01-02" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let (name, value) = bearer(&admin_token);
        let response = server
            .get("/api/v1/admin-amounts")
            .add_header(name, value)
            .await;
        let list: ApiResponse<Vec<Value>> = response.json();
        let row = list.data.iter().find(|e| e["id"].as_i64() == Some(id)).unwrap();
        assert_eq!(row["amount"], "500");
        assert_eq!(row["wasoolAmount"], "200");
        assert_eq!(row["bakayaAmount"], "300");
        assert_eq!(row["date"], "2024-01-01");
    }

    #[tokio::test]
    async fn test_admin_amount_delete_unknown_id_not_found() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .delete("/api/v1/admin-amounts/424242")
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_amounts_require_admin_role() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;
        let ali_token = login_agent(&server, "ali", "secret1").await;

        let (name, value) = bearer(&ali_token);
        server
            .get("/api/v1/admin-amounts")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let (name, value) = bearer(&ali_token);
        server
            .post("/api/v1/admin-amounts")
            .add_header(name, value)
            .json(&json!({
                "username": "c",
                "amount": 10,
                "wasoolAmount": 5,
                "date": "2024-01-01"
            }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    // ------------------------------------------------------------------
    // Agent amounts
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_agent_ledger_end_to_end() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // Admin creates the agent...
        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "a@x.com", "secret1").await;

        // ...the agent logs in and receives an agent-role token...
        let ali_token = login_agent(&server, "ali", "secret1").await;
        let claims = auth::decode_token(TEST_JWT_SECRET, &ali_token).unwrap();
        assert_eq!(claims.role, Role::Agent);

        // ...and records a collection entry for themselves.
        let (name, value) = bearer(&ali_token);
        let response = server
            .post("/api/v1/agent-amounts")
            .add_header(name, value)
            .json(&json!({
                "amount": 500,
                "wasoolAmount": 200,
                "date": "2024-01-01"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["bakayaAmount"], "300");
        // Provenance comes from the token, not the request body
        assert_eq!(body.data["createdBy"], "ali");
        assert_eq!(body.data["username"], "ali");
        assert_eq!(body.data["date"], "2024-01-01");
    }

    #[tokio::test]
    async fn test_my_amounts_is_self_scoped() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;
        create_agent(&server, &admin_token, "omar", "omar@example.com", "secret2").await;
        let ali_token = login_agent(&server, "ali", "secret1").await;
        let omar_token = login_agent(&server, "omar", "secret2").await;

        for (token, amount) in [(&ali_token, 100), (&omar_token, 200)] {
            let (name, value) = bearer(token);
            server
                .post("/api/v1/agent-amounts")
                .add_header(name, value)
                .json(&json!({
                    "amount": amount,
                    "wasoolAmount": 0,
                    "date": "2024-01-01"
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        // Each agent only sees their own entries
        let (name, value) = bearer(&ali_token);
        let response = server
            .get("/api/v1/agent-amounts/my-amounts")
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::OK);
        let mine: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(mine.data.len(), 1);
        assert_eq!(mine.data[0]["createdBy"], "ali");
        assert_eq!(mine.data[0]["amount"], "100");

        // Admin overview returns the full set
        let (name, value) = bearer(&admin_token);
        let response = server
            .get("/api/v1/agent-amounts")
            .add_header(name, value)
            .await;
        let all: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(all.data.len(), 2);
    }

    #[tokio::test]
    async fn test_admin_cannot_create_agent_amounts() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;

        let (name, value) = bearer(&admin_token);
        let response = server
            .post("/api/v1/agent-amounts")
            .add_header(name, value)
            .json(&json!({
                "amount": 10,
                "wasoolAmount": 5,
                "date": "2024-01-01"
            }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["error"], "Only agents can create agent amounts");
    }

    #[tokio::test]
    async fn test_agent_cannot_read_other_ledgers() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;
        let ali_token = login_agent(&server, "ali", "secret1").await;

        // The admin-only overview of all agent amounts is off limits
        let (name, value) = bearer(&ali_token);
        server
            .get("/api/v1/agent-amounts")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // And the user-facing my-amounts is off limits to non-agents
        let (name, value) = bearer(&admin_token);
        let response = server
            .get("/api/v1/agent-amounts/my-amounts")
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["error"], "Only agents can access their own amounts");
    }

    #[tokio::test]
    async fn test_agent_amount_update_and_delete_are_admin_only() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = login_admin(&server).await;
        create_agent(&server, &admin_token, "ali", "ali@example.com", "secret1").await;
        let ali_token = login_agent(&server, "ali", "secret1").await;

        let (name, value) = bearer(&ali_token);
        let response = server
            .post("/api/v1/agent-amounts")
            .add_header(name, value)
            .json(&json!({
                "amount": 500,
                "wasoolAmount": 200,
                "date": "2024-01-01"
            }))
            .await;
        let created: ApiResponse<Value> = response.json();
        let id = created.data["id"].as_i64().unwrap();

        // The creating agent cannot edit or delete their entry
        let (name, value) = bearer(&ali_token);
        server
            .put(&format!("/api/v1/agent-amounts/{}", id))
            .add_header(name, value)
            .json(&json!({ "amount": 500, "wasoolAmount": 500, "date": "2024-01-01" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // The admin can, and the balance is recomputed
        let (name, value) = bearer(&admin_token);
        let response = server
            .put(&format!("/api/v1/agent-amounts/{}", id))
            .add_header(name, value)
            .json(&json!({ "amount": 500, "wasoolAmount": 500, "date": "2024-01-01" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["bakayaAmount"], "0");

        let (name, value) = bearer(&admin_token);
        server
            .delete(&format!("/api/v1/agent-amounts/{}", id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::OK);

        let (name, value) = bearer(&admin_token);
        server
            .delete(&format!("/api/v1/agent-amounts/{}", id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
