//! Loan lifecycle tests against a live database
//!
//! These cover the repayment ledger invariants end to end: creation with a
//! fixed repayable total, single assignment, overpayment rejection under
//! concurrency, and the status transition table.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use peerlend_server::alerts::AlertService;
use peerlend_server::auth::AuthService;
use peerlend_server::loans::{CreateLoanRequest, LoanApplication, LoanError, LoanService};
use peerlend_server::models::{InterestType, LoanStatus, RegisterRequest, UserRole};

/// Helper to create a test database pool
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://localhost/peerlend_test".to_string());

    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database")
}

fn services(pool: &PgPool) -> (AuthService, LoanService, AlertService) {
    let alerts = AlertService::new(pool.clone());
    (
        AuthService::new(pool.clone(), "test-secret".to_string(), 30),
        LoanService::new(pool.clone(), alerts.clone()),
        alerts,
    )
}

/// Register a throwaway user with a unique email
async fn register_user(auth: &AuthService, role: UserRole) -> Uuid {
    let tokens = auth
        .register(RegisterRequest {
            name: format!("Test {}", role.as_str()),
            email: Some(format!("{}-{}@example.com", role.as_str(), Uuid::new_v4())),
            phone: None,
            password: "password123".to_string(),
            role: role.as_str().to_string(),
        })
        .await
        .expect("registration should succeed");
    tokens.user.id
}

fn one_year_loan(principal: f64, rate: f64) -> CreateLoanRequest {
    CreateLoanRequest {
        principal_amount: principal,
        interest_rate: rate,
        interest_type: InterestType::Simple,
        due_date: Utc::now() + Duration::days(365),
    }
}

fn application(loan_id: Uuid) -> LoanApplication {
    LoanApplication {
        loan_id,
        aadhar_number: "123456789012".to_string(),
        pan_card_number: "ABCDE1234F".to_string(),
        document_image: None,
    }
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_create_apply_repay_scenario() {
    let pool = setup_test_db().await;
    let (auth, loans, alerts) = services(&pool);

    let lender = register_user(&auth, UserRole::Lender).await;
    let borrower = register_user(&auth, UserRole::Borrower).await;

    // 100000 at 12% simple over a year -> ~112000 repayable
    let loan = loans
        .create_loan(lender, one_year_loan(100_000.0, 12.0), Utc::now())
        .await
        .expect("loan creation should succeed");
    assert_eq!(loan.status, LoanStatus::Pending);
    assert!(loan.borrower_id.is_none());
    assert!((loan.total_repayable_amount - 112_000.0).abs() < 1.0);

    // Borrower applies; both parties get an alert
    let loan = loans
        .apply_for_loan(borrower, application(loan.id))
        .await
        .expect("application should succeed");
    assert_eq!(loan.borrower_id, Some(borrower));
    assert_eq!(loan.pan_card_number.as_deref(), Some("ABCDE1234F"));
    assert_eq!(loan.status, LoanStatus::Pending);

    let lender_alerts = alerts.list_for(lender).await.unwrap();
    assert!(!lender_alerts.is_empty());
    let borrower_alerts = alerts.list_for(borrower).await.unwrap();
    assert!(!borrower_alerts.is_empty());

    // First payment is applied
    let loan = loans
        .record_payment(loan.id, 50_000.0)
        .await
        .expect("payment within the total should succeed");
    assert!((loan.amount_repaid - 50_000.0).abs() < f64::EPSILON);

    // Second payment would exceed the repayable total
    let err = loans.record_payment(loan.id, 70_000.0).await.unwrap_err();
    assert!(matches!(err, LoanError::Overpayment { .. }));

    let unchanged = loans.get_loan(loan.id).await.unwrap();
    assert!((unchanged.loan.amount_repaid - 50_000.0).abs() < f64::EPSILON);
    assert_eq!(unchanged.payments.len(), 1);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_apply_to_assigned_loan_fails() {
    let pool = setup_test_db().await;
    let (auth, loans, _) = services(&pool);

    let lender = register_user(&auth, UserRole::Lender).await;
    let first = register_user(&auth, UserRole::Borrower).await;
    let second = register_user(&auth, UserRole::Borrower).await;

    let loan = loans
        .create_loan(lender, one_year_loan(10_000.0, 10.0), Utc::now())
        .await
        .unwrap();

    loans.apply_for_loan(first, application(loan.id)).await.unwrap();

    let err = loans
        .apply_for_loan(second, application(loan.id))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::AlreadyAssigned));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_invalid_payment_amounts_never_mutate() {
    let pool = setup_test_db().await;
    let (auth, loans, _) = services(&pool);

    let lender = register_user(&auth, UserRole::Lender).await;
    let loan = loans
        .create_loan(lender, one_year_loan(10_000.0, 10.0), Utc::now())
        .await
        .unwrap();

    for amount in [0.0, -50.0, f64::NAN, f64::INFINITY] {
        let err = loans.record_payment(loan.id, amount).await.unwrap_err();
        assert!(matches!(err, LoanError::InvalidAmount));
    }

    let unchanged = loans.get_loan(loan.id).await.unwrap();
    assert_eq!(unchanged.loan.amount_repaid, 0.0);
    assert!(unchanged.payments.is_empty());
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_full_repayment_completes_loan() {
    let pool = setup_test_db().await;
    let (auth, loans, _) = services(&pool);

    let lender = register_user(&auth, UserRole::Lender).await;
    let borrower = register_user(&auth, UserRole::Borrower).await;

    let loan = loans
        .create_loan(lender, one_year_loan(10_000.0, 0.0), Utc::now())
        .await
        .unwrap();
    let loan = loans.apply_for_loan(borrower, application(loan.id)).await.unwrap();
    let loan = loans.set_status(loan.id, LoanStatus::Active).await.unwrap();

    let loan = loans.record_payment(loan.id, 10_000.0).await.unwrap();
    assert_eq!(loan.status, LoanStatus::Completed);
    assert!((loan.amount_repaid - loan.total_repayable_amount).abs() < f64::EPSILON);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_concurrent_payments_cannot_overshoot() {
    let pool = setup_test_db().await;
    let (auth, loans, _) = services(&pool);

    let lender = register_user(&auth, UserRole::Lender).await;
    // Zero interest keeps the repayable total at exactly 100000
    let loan = loans
        .create_loan(lender, one_year_loan(100_000.0, 0.0), Utc::now())
        .await
        .unwrap();

    let a = {
        let loans = loans.clone();
        let id = loan.id;
        tokio::spawn(async move { loans.record_payment(id, 60_000.0).await })
    };
    let b = {
        let loans = loans.clone();
        let id = loan.id;
        tokio::spawn(async move { loans.record_payment(id, 60_000.0).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert!(successes <= 1, "at most one 60000 payment may land");

    let after = loans.get_loan(loan.id).await.unwrap();
    assert!(after.loan.amount_repaid <= after.loan.total_repayable_amount);
    assert_eq!(after.loan.amount_repaid, 60_000.0 * successes as f64);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_status_transition_table_enforced() {
    let pool = setup_test_db().await;
    let (auth, loans, _) = services(&pool);

    let lender = register_user(&auth, UserRole::Lender).await;
    let loan = loans
        .create_loan(lender, one_year_loan(5_000.0, 8.0), Utc::now())
        .await
        .unwrap();

    // pending -> completed is not allowed
    let err = loans
        .set_status(loan.id, LoanStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::IllegalTransition { .. }));

    // pending -> active -> defaulted is
    let loan = loans.set_status(loan.id, LoanStatus::Active).await.unwrap();
    let loan = loans
        .set_status(loan.id, LoanStatus::Defaulted)
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::Defaulted);

    // Terminal states stay terminal
    let err = loans
        .set_status(loan.id, LoanStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::IllegalTransition { .. }));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_delete_rules() {
    let pool = setup_test_db().await;
    let (auth, loans, _) = services(&pool);

    let lender = register_user(&auth, UserRole::Lender).await;
    let stranger = register_user(&auth, UserRole::Lender).await;
    let borrower = register_user(&auth, UserRole::Borrower).await;

    let loan = loans
        .create_loan(lender, one_year_loan(5_000.0, 8.0), Utc::now())
        .await
        .unwrap();

    // Only the owning lender may delete
    let err = loans.delete_loan(loan.id, stranger).await.unwrap_err();
    assert!(matches!(err, LoanError::NotLender));

    // An assigned loan is no longer deletable
    loans.apply_for_loan(borrower, application(loan.id)).await.unwrap();
    let err = loans.delete_loan(loan.id, lender).await.unwrap_err();
    assert!(matches!(err, LoanError::AssignedBorrower));

    // A fresh unassigned loan deletes cleanly
    let other = loans
        .create_loan(lender, one_year_loan(5_000.0, 8.0), Utc::now())
        .await
        .unwrap();
    loans.delete_loan(other.id, lender).await.unwrap();
    let err = loans.get_loan(other.id).await.unwrap_err();
    assert!(matches!(err, LoanError::NotFound));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_overdue_sweep_defaults_active_loans() {
    let pool = setup_test_db().await;
    let (auth, loans, _) = services(&pool);

    let lender = register_user(&auth, UserRole::Lender).await;
    let loan = loans
        .create_loan(lender, one_year_loan(5_000.0, 8.0), Utc::now())
        .await
        .unwrap();
    loans.set_status(loan.id, LoanStatus::Active).await.unwrap();

    // A sweep dated after the due date flips the loan
    let far_future = Utc::now() + Duration::days(366);
    let defaulted = loans.sweep_overdue(far_future).await.unwrap();
    assert!(defaulted.iter().any(|l| l.id == loan.id));

    let after = loans.get_loan(loan.id).await.unwrap();
    assert_eq!(after.loan.status, LoanStatus::Defaulted);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_alert_mark_read_is_idempotent() {
    let pool = setup_test_db().await;
    let (auth, loans, alerts) = services(&pool);

    let lender = register_user(&auth, UserRole::Lender).await;
    loans
        .create_loan(lender, one_year_loan(5_000.0, 8.0), Utc::now())
        .await
        .unwrap();

    let listed = alerts.list_for(lender).await.unwrap();
    let first = listed.first().expect("loan creation emits an alert");
    assert!(!first.read);

    let marked = alerts.mark_read(first.id).await.unwrap();
    assert!(marked.read);

    // Second flip is a no-op, not an error
    let marked_again = alerts.mark_read(first.id).await.unwrap();
    assert!(marked_again.read);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_duplicate_registration_rejected() {
    let pool = setup_test_db().await;
    let (auth, _, _) = services(&pool);

    let email = format!("dup-{}@example.com", Uuid::new_v4());
    let request = || RegisterRequest {
        name: "Dup".to_string(),
        email: Some(email.clone()),
        phone: None,
        password: "password123".to_string(),
        role: "lender".to_string(),
    };

    auth.register(request()).await.unwrap();
    let err = auth.register(request()).await.unwrap_err();
    assert!(matches!(
        err,
        peerlend_server::auth::AuthError::DuplicateIdentity(_)
    ));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_login_does_not_reveal_which_part_failed() {
    let pool = setup_test_db().await;
    let (auth, _, _) = services(&pool);

    let email = format!("login-{}@example.com", Uuid::new_v4());
    auth.register(RegisterRequest {
        name: "Login".to_string(),
        email: Some(email.clone()),
        phone: None,
        password: "password123".to_string(),
        role: "borrower".to_string(),
    })
    .await
    .unwrap();

    let wrong_password = auth
        .login(peerlend_server::models::LoginRequest {
            email: Some(email),
            phone: None,
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    let unknown_user = auth
        .login(peerlend_server::models::LoginRequest {
            email: Some("nobody@example.com".to_string()),
            phone: None,
            password: "password123".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}
