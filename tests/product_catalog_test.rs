/// Integration tests for product listings and the investor catalog
///
/// Listings move draft -> pending -> approved/rejected, and only approved
/// listings ever reach the catalog.
mod common;
use serial_test::serial;

use common::*;
use matchdeck::orm::products::ProductStatus;
use matchdeck::products::{self, ProductError, ProductInput};

fn input(name: &str) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        category: "Fintech".to_string(),
        summary: format!("{} in a sentence", name),
        description: format!("{} solves a real problem for real customers.", name),
        business_model: Some("Subscription".to_string()),
        pricing: Some("$49/mo".to_string()),
        tags: Some("payments, b2b".to_string()),
        benefits: None,
    }
}

#[actix_rt::test]
#[serial]
async fn test_catalog_contains_only_approved_listings() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let founder = create_verified_founder(&db, "catalog_founder")
        .await
        .expect("Failed to create founder");

    create_test_product(&db, founder.id, "Draft One", ProductStatus::Draft)
        .await
        .expect("Failed to create product");
    create_test_product(&db, founder.id, "Pending One", ProductStatus::Pending)
        .await
        .expect("Failed to create product");
    create_test_product(&db, founder.id, "Rejected One", ProductStatus::Rejected)
        .await
        .expect("Failed to create product");
    create_test_product(&db, founder.id, "Live One", ProductStatus::Approved)
        .await
        .expect("Failed to create product");

    let catalog = products::load_catalog()
        .await
        .expect("Failed to load catalog");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].name, "Live One");
    // Stored comma-separated tags come out as a list
    assert_eq!(catalog[0].tags, vec!["b2b", "analytics"]);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_draft_submit_approve_flow() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let founder = create_verified_founder(&db, "flow_founder")
        .await
        .expect("Failed to create founder");
    let admin = create_test_admin(&db, "catalog_admin")
        .await
        .expect("Failed to create admin");

    let product = products::create_product(founder.id, input("Ledgerly"))
        .await
        .expect("Failed to create product");
    assert_eq!(product.status, ProductStatus::Draft);

    // Drafts are invisible to both the catalog and the review queue
    assert!(products::load_catalog().await.expect("catalog").is_empty());
    assert!(products::admin_pending_products()
        .await
        .expect("queue")
        .is_empty());

    products::submit_product(founder.id, product.id)
        .await
        .expect("Failed to submit product");
    let row = reload_product(&db, product.id).await.expect("reload");
    assert_eq!(row.status, ProductStatus::Pending);

    let queue = products::admin_pending_products().await.expect("queue");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].founder_name, "flow_founder");

    products::approve_product(admin.id, product.id)
        .await
        .expect("Failed to approve product");
    let row = reload_product(&db, product.id).await.expect("reload");
    assert_eq!(row.status, ProductStatus::Approved);

    let catalog = products::load_catalog().await.expect("catalog");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].name, "Ledgerly");

    // Founder was told the listing went live
    let unread = matchdeck::notifications::count_unread_notifications(founder.id)
        .await
        .expect("Failed to count notifications");
    assert_eq!(unread, 1);

    // A second approval conflicts
    let again = products::approve_product(admin.id, product.id).await;
    assert!(matches!(again, Err(ProductError::Conflict)));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_rejection_feedback_and_resubmission() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let founder = create_verified_founder(&db, "retry_founder")
        .await
        .expect("Failed to create founder");
    let admin = create_test_admin(&db, "catalog_admin2")
        .await
        .expect("Failed to create admin");

    let product = products::create_product(founder.id, input("Vaporware"))
        .await
        .expect("Failed to create product");
    products::submit_product(founder.id, product.id)
        .await
        .expect("Failed to submit product");

    // A reason is mandatory
    let result = products::reject_product(admin.id, product.id, "   ").await;
    assert!(matches!(result, Err(ProductError::Validation(_))));

    products::reject_product(admin.id, product.id, "Description is too vague.")
        .await
        .expect("Failed to reject product");

    let mine = products::founder_products(founder.id)
        .await
        .expect("Failed to load founder products");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status, "rejected");
    assert_eq!(
        mine[0].rejection_reason.as_deref(),
        Some("Description is too vague.")
    );

    // Rejected listings stay editable and resubmittable
    products::update_product(founder.id, product.id, input("Vaporware 2.0"))
        .await
        .expect("Failed to update product");
    products::submit_product(founder.id, product.id)
        .await
        .expect("Failed to resubmit product");

    let row = reload_product(&db, product.id).await.expect("reload");
    assert_eq!(row.status, ProductStatus::Pending);
    assert_eq!(row.name, "Vaporware 2.0");
    // Old feedback does not linger on a fresh submission
    assert!(row.rejection_reason.is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_listing_edit_rules() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let founder = create_verified_founder(&db, "rules_founder")
        .await
        .expect("Failed to create founder");
    let other = create_verified_founder(&db, "rules_other")
        .await
        .expect("Failed to create founder");

    let product = products::create_product(founder.id, input("Guarded"))
        .await
        .expect("Failed to create product");

    // Only the owner may edit or submit
    let result = products::update_product(other.id, product.id, input("Hijacked")).await;
    assert!(matches!(result, Err(ProductError::Forbidden)));
    let result = products::submit_product(other.id, product.id).await;
    assert!(matches!(result, Err(ProductError::Forbidden)));

    // Validation applies to creates and updates alike
    let mut bad = input("");
    bad.name = "   ".to_string();
    let result = products::create_product(founder.id, bad).await;
    assert!(matches!(result, Err(ProductError::Validation(_))));

    // While under review the listing is frozen
    products::submit_product(founder.id, product.id)
        .await
        .expect("Failed to submit product");
    let result = products::update_product(founder.id, product.id, input("Too late")).await;
    assert!(matches!(result, Err(ProductError::Conflict)));
    let result = products::submit_product(founder.id, product.id).await;
    assert!(matches!(result, Err(ProductError::Conflict)));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
