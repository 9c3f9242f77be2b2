//! End-to-end scenarios over the wired services:
//! enquiry aggregation -> estimate -> quotation lifecycle -> queries.

use chrono::{Duration, Utc};

use quotelink_app::AppServices;
use quotelink_catalog::{CatalogItem, ProductId};
use quotelink_core::{AggregateId, BuyerId, DomainError, SellerId};
use quotelink_enquiry::Selection;
use quotelink_infra::command_dispatcher::DispatchError;
use quotelink_quotation::{ContactSnapshot, ExpiryPolicy, QuotationStatus};

fn wait_for_projection() {
    std::thread::sleep(std::time::Duration::from_millis(50));
}

fn contact() -> ContactSnapshot {
    ContactSnapshot {
        name: "Asha Verma".to_string(),
        email: "asha@example.com".to_string(),
        phone: "+91-98000-00000".to_string(),
        address: "12 Market Road, Pune".to_string(),
    }
}

fn item(name: &str, unit_price: Option<f64>, list_price: Option<f64>) -> CatalogItem {
    CatalogItem {
        id: ProductId::new(AggregateId::new()),
        name: name.to_string(),
        unit_price,
        list_price,
        discount_percent: None,
        available_quantity: 50,
    }
}

/// Two entries: item A (100 selling / 150 MRP, qty 2) and item B (50, no
/// MRP, qty 1). Returns (services, buyer, a_id, b_id).
fn setup_two_item_enquiry() -> (AppServices, BuyerId, ProductId, ProductId) {
    let services = AppServices::build_with_policy(ExpiryPolicy::new(Duration::days(30)));
    let buyer_id = BuyerId::new();

    let a = item("Item A", Some(100.0), Some(150.0));
    let b = item("Item B", Some(50.0), None);
    let a_id = a.id;
    let b_id = b.id;
    services.catalog().upsert(a);
    services.catalog().upsert(b);

    let enquiries = services.enquiries();
    enquiries.add_item(buyer_id, a_id, 2, Utc::now()).unwrap();
    enquiries.add_item(buyer_id, b_id, 1, Utc::now()).unwrap();

    (services, buyer_id, a_id, b_id)
}

#[test]
fn full_flow_from_enquiry_to_seller_response() {
    let (services, buyer_id, _a, _b) = setup_two_item_enquiry();
    let seller_id = SellerId::new();
    let quotations = services.quotations();
    let queries = services.queries();

    // Indicative estimate before anything is persisted.
    let preview = quotations
        .preview_estimate(buyer_id, &Selection::All)
        .unwrap();
    assert_eq!(preview.subtotal, 250.0);
    assert_eq!(preview.tax, 45.0);
    assert_eq!(preview.total, 295.0);
    assert_eq!(preview.savings, 100.0);
    assert_eq!(preview.missing_prices, 0);

    let quotation_id = quotations
        .create_quotation(buyer_id, &Selection::All, contact(), None, Utc::now())
        .unwrap();
    wait_for_projection();

    let view = queries.get_by_id(&quotation_id).unwrap();
    assert_eq!(view.status, QuotationStatus::Pending);
    assert_eq!(view.estimated_total, 295.0);
    assert_eq!(view.items.len(), 2);

    quotations
        .respond(
            buyer_id,
            quotation_id,
            seller_id,
            280.0,
            Some("Delivery within 3 days".to_string()),
            None,
            Utc::now(),
        )
        .unwrap();
    wait_for_projection();

    // Both figures are readable simultaneously and never merged.
    let view = queries.get_by_id(&quotation_id).unwrap();
    assert_eq!(view.status, QuotationStatus::Responded);
    assert_eq!(view.estimated_total, 295.0);
    assert_eq!(view.seller_response.as_ref().unwrap().quoted_total, 280.0);
    assert_eq!(view.seller_id, Some(seller_id));
    assert!(view.responded_at.is_some());
}

#[test]
fn estimated_total_is_immutable_after_catalog_price_change() {
    let (services, buyer_id, a_id, _b) = setup_two_item_enquiry();
    let quotations = services.quotations();
    let queries = services.queries();

    let quotation_id = quotations
        .create_quotation(buyer_id, &Selection::All, contact(), None, Utc::now())
        .unwrap();

    // Catalog price changes after submission.
    let mut repriced = item("Item A", Some(999.0), Some(1200.0));
    repriced.id = a_id;
    services.catalog().upsert(repriced);

    wait_for_projection();
    let view = queries.get_by_id(&quotation_id).unwrap();
    assert_eq!(view.estimated_total, 295.0);

    // A fresh preview sees the new price; the stored snapshot does not.
    let preview = quotations
        .preview_estimate(buyer_id, &Selection::All)
        .unwrap();
    assert_eq!(preview.subtotal, 999.0 * 2.0 + 50.0);
}

#[test]
fn subset_selection_quotes_only_selected_items() {
    let (services, buyer_id, a_id, _b) = setup_two_item_enquiry();
    let quotations = services.quotations();
    let queries = services.queries();

    let selection = Selection::only(vec![a_id]);
    let preview = quotations.preview_estimate(buyer_id, &selection).unwrap();
    assert_eq!(preview.subtotal, 200.0);
    assert_eq!(preview.total, 236.0);

    let quotation_id = quotations
        .create_quotation(buyer_id, &selection, contact(), None, Utc::now())
        .unwrap();
    wait_for_projection();

    let view = queries.get_by_id(&quotation_id).unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].product_id, a_id);
    assert_eq!(view.estimated_total, 236.0);
}

#[test]
fn empty_selection_is_rejected() {
    let (services, buyer_id, _a, _b) = setup_two_item_enquiry();
    let quotations = services.quotations();

    let err = quotations
        .create_quotation(
            buyer_id,
            &Selection::only(vec![]),
            contact(),
            None,
            Utc::now(),
        )
        .unwrap_err();
    match err {
        DispatchError::Validation(msg) => assert!(msg.contains("empty selection")),
        e => panic!("Expected Validation error, got: {:?}", e),
    }
}

#[test]
fn dangling_product_references_are_filtered_not_errors() {
    let (services, buyer_id, _a, b_id) = setup_two_item_enquiry();
    let enquiries = services.enquiries();
    let quotations = services.quotations();
    let queries = services.queries();

    // The catalog drifts: item B disappears after the entry was added.
    services.catalog().remove(b_id);

    let listing = enquiries.list(buyer_id).unwrap();
    assert_eq!(listing.lines.len(), 1);
    assert_eq!(listing.filtered_count, 1);

    // Creation quotes only what still resolves.
    let quotation_id = quotations
        .create_quotation(buyer_id, &Selection::All, contact(), None, Utc::now())
        .unwrap();
    wait_for_projection();
    let view = queries.get_by_id(&quotation_id).unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.estimated_total, 236.0);
}

#[test]
fn missing_price_quotes_the_line_at_zero() {
    let services = AppServices::build();
    let buyer_id = BuyerId::new();

    let priced = item("Priced", Some(100.0), None);
    let unpriced = item("Unpriced", None, None);
    let priced_id = priced.id;
    let unpriced_id = unpriced.id;
    services.catalog().upsert(priced);
    services.catalog().upsert(unpriced);

    let enquiries = services.enquiries();
    enquiries.add_item(buyer_id, priced_id, 1, Utc::now()).unwrap();
    enquiries
        .add_item(buyer_id, unpriced_id, 3, Utc::now())
        .unwrap();

    let quotations = services.quotations();
    let preview = quotations
        .preview_estimate(buyer_id, &Selection::All)
        .unwrap();
    assert_eq!(preview.subtotal, 100.0);
    assert_eq!(preview.missing_prices, 1);

    let quotation_id = quotations
        .create_quotation(buyer_id, &Selection::All, contact(), None, Utc::now())
        .unwrap();
    wait_for_projection();

    let view = services.queries().get_by_id(&quotation_id).unwrap();
    assert_eq!(view.items.len(), 2);
    assert_eq!(view.estimated_total, 118.0);
}

#[test]
fn duplicate_add_conflicts_and_set_quantity_updates() {
    let (services, buyer_id, a_id, _b) = setup_two_item_enquiry();
    let enquiries = services.enquiries();

    let err = enquiries
        .add_item(buyer_id, a_id, 5, Utc::now())
        .unwrap_err();
    // A deterministic duplicate is a Conflict, not a retryable lost race.
    match err {
        DispatchError::Conflict(_) => {}
        e => panic!("Expected Conflict error for duplicate add, got: {:?}", e),
    }

    enquiries
        .set_quantity(buyer_id, a_id, 5, Utc::now())
        .unwrap();
    let listing = enquiries.list(buyer_id).unwrap();
    assert_eq!(listing.lines[0].entry.quantity, 5);
}

#[test]
fn cancel_and_respond_are_mutually_exclusive() {
    let (services, buyer_id, _a, _b) = setup_two_item_enquiry();
    let quotations = services.quotations();
    let queries = services.queries();

    let quotation_id = quotations
        .create_quotation(buyer_id, &Selection::All, contact(), None, Utc::now())
        .unwrap();

    quotations.cancel(buyer_id, quotation_id, Utc::now()).unwrap();

    let err = quotations
        .respond(
            buyer_id,
            quotation_id,
            SellerId::new(),
            280.0,
            None,
            None,
            Utc::now(),
        )
        .unwrap_err();
    match err {
        DispatchError::InvalidTransition(_) => {}
        e => panic!("Expected InvalidTransition, got: {:?}", e),
    }

    wait_for_projection();
    let view = queries.get_by_id(&quotation_id).unwrap();
    assert_eq!(view.status, QuotationStatus::Cancelled);
}

#[test]
fn expiry_sweep_honors_the_policy_threshold() {
    let policy = ExpiryPolicy::new(Duration::days(30));
    let services = AppServices::build_with_policy(policy);
    let buyer_id = BuyerId::new();

    let a = item("Item A", Some(100.0), None);
    let a_id = a.id;
    services.catalog().upsert(a);
    services
        .enquiries()
        .add_item(buyer_id, a_id, 1, Utc::now())
        .unwrap();

    let quotations = services.quotations();
    let queries = services.queries();
    let created_at = Utc::now();
    let quotation_id = quotations
        .create_quotation(buyer_id, &Selection::All, contact(), None, created_at)
        .unwrap();

    // Too young: the sweep refuses to expire it.
    let err = quotations
        .expire(buyer_id, quotation_id, created_at + Duration::days(3))
        .unwrap_err();
    match err {
        DispatchError::Validation(_) => {}
        e => panic!("Expected Validation error for premature expiry, got: {:?}", e),
    }

    // Advisory expiry on the view, without mutating anything.
    wait_for_projection();
    let view = queries.get_by_id(&quotation_id).unwrap();
    assert!(!queries.advisory_expired(&view, created_at + Duration::days(3)));
    assert!(queries.advisory_expired(&view, created_at + Duration::days(31)));
    assert_eq!(view.status, QuotationStatus::Pending);

    // Past the threshold the transition commits.
    quotations
        .expire(buyer_id, quotation_id, created_at + Duration::days(31))
        .unwrap();
    wait_for_projection();
    let view = queries.get_by_id(&quotation_id).unwrap();
    assert_eq!(view.status, QuotationStatus::Expired);

    // Expiry is terminal: a late seller response is rejected.
    let err = quotations
        .respond(
            buyer_id,
            quotation_id,
            SellerId::new(),
            100.0,
            None,
            None,
            Utc::now(),
        )
        .unwrap_err();
    match err {
        DispatchError::InvalidTransition(_) => {}
        e => panic!("Expected InvalidTransition, got: {:?}", e),
    }
}

#[test]
fn seller_listing_covers_pending_and_own_responses() {
    let (services, buyer_id, a_id, _b) = setup_two_item_enquiry();
    let quotations = services.quotations();
    let queries = services.queries();
    let seller_x = SellerId::new();
    let seller_y = SellerId::new();

    let first = quotations
        .create_quotation(
            buyer_id,
            &Selection::only(vec![a_id]),
            contact(),
            None,
            Utc::now(),
        )
        .unwrap();
    let second = quotations
        .create_quotation(buyer_id, &Selection::All, contact(), None, Utc::now())
        .unwrap();
    wait_for_projection();

    // Both pending: visible to any seller.
    assert_eq!(queries.list_for_seller(seller_x).len(), 2);
    assert_eq!(queries.list_for_seller(seller_y).len(), 2);

    quotations
        .respond(buyer_id, first, seller_x, 200.0, None, None, Utc::now())
        .unwrap();
    wait_for_projection();

    // The answered one stays visible to its seller only.
    let for_x = queries.list_for_seller(seller_x);
    assert_eq!(for_x.len(), 2);
    let for_y = queries.list_for_seller(seller_y);
    assert_eq!(for_y.len(), 1);
    assert_eq!(for_y[0].quotation_id, second);
}

#[test]
fn buyers_see_only_their_own_quotations() {
    let (services, buyer_one, a_id, _b) = setup_two_item_enquiry();
    let buyer_two = BuyerId::new();
    let enquiries = services.enquiries();
    enquiries.add_item(buyer_two, a_id, 4, Utc::now()).unwrap();

    let quotations = services.quotations();
    let q1 = quotations
        .create_quotation(buyer_one, &Selection::All, contact(), None, Utc::now())
        .unwrap();
    let q2 = quotations
        .create_quotation(buyer_two, &Selection::All, contact(), None, Utc::now())
        .unwrap();
    wait_for_projection();

    let queries = services.queries();
    let for_one = queries.list_for_buyer(buyer_one);
    assert_eq!(for_one.len(), 1);
    assert_eq!(for_one[0].quotation_id, q1);

    let for_two = queries.list_for_buyer(buyer_two);
    assert_eq!(for_two.len(), 1);
    assert_eq!(for_two[0].quotation_id, q2);
}

#[test]
fn get_by_id_is_a_hard_not_found_for_unknown_quotations() {
    let services = AppServices::build();
    let queries = services.queries();

    let unknown = quotelink_quotation::QuotationId::new(AggregateId::new());
    let err = queries.get_by_id(&unknown).unwrap_err();
    assert_eq!(err, DomainError::NotFound);
}
