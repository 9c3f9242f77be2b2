//! End-to-end walkthrough: enquiry -> estimate -> quotation -> seller response.
//!
//! Run with `RUST_LOG=info cargo run --bin quotelink-demo`.

use chrono::Utc;

use quotelink_app::AppServices;
use quotelink_catalog::{ProductId, RawCatalogRecord, RawPricing};
use quotelink_core::{AggregateId, BuyerId, SellerId};
use quotelink_enquiry::Selection;
use quotelink_pricing::display_amount;
use quotelink_quotation::ContactSnapshot;

fn main() {
    quotelink_observability::init();

    let services = AppServices::build();
    let buyer_id = BuyerId::new();
    let seller_id = SellerId::new();

    // Seed the catalog with one structured and one legacy record.
    let wire = RawCatalogRecord {
        id: ProductId::new(AggregateId::new()),
        name: "Copper Wire 2.5mm".to_string(),
        pricing: Some(RawPricing {
            selling_price: Some(100.0),
            mrp: Some(150.0),
            discount_percent: Some(33.0),
        }),
        price: None,
        original_price: None,
        available_quantity: 40,
    }
    .normalize();
    let conduit = RawCatalogRecord {
        id: ProductId::new(AggregateId::new()),
        name: "PVC Conduit 20mm".to_string(),
        pricing: None,
        price: Some(50.0),
        original_price: None,
        available_quantity: 120,
    }
    .normalize();
    let wire_id = wire.id;
    let conduit_id = conduit.id;
    services.catalog().upsert(wire);
    services.catalog().upsert(conduit);

    let enquiries = services.enquiries();
    let quotations = services.quotations();
    let queries = services.queries();

    enquiries
        .add_item(buyer_id, wire_id, 2, Utc::now())
        .expect("add wire");
    enquiries
        .add_item(buyer_id, conduit_id, 1, Utc::now())
        .expect("add conduit");

    let preview = quotations
        .preview_estimate(buyer_id, &Selection::All)
        .expect("preview estimate");
    tracing::info!(
        subtotal = %display_amount(preview.subtotal),
        tax = %display_amount(preview.tax),
        total = %display_amount(preview.total),
        savings = %display_amount(preview.savings),
        "indicative estimate"
    );

    let contact = ContactSnapshot {
        name: "Asha Verma".to_string(),
        email: "asha@example.com".to_string(),
        phone: "+91-98000-00000".to_string(),
        address: "12 Market Road, Pune".to_string(),
    };
    let quotation_id = quotations
        .create_quotation(buyer_id, &Selection::All, contact, None, Utc::now())
        .expect("create quotation");

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
        .expect("seller response");

    // Give the projection subscriber a moment to catch up.
    std::thread::sleep(std::time::Duration::from_millis(100));

    let view = queries.get_by_id(&quotation_id).expect("quotation view");
    let quoted = view
        .seller_response
        .as_ref()
        .map(|r| display_amount(r.quoted_total))
        .unwrap_or_default();
    tracing::info!(
        quotation_id = %view.quotation_id,
        status = ?view.status,
        estimated_total = %display_amount(view.estimated_total),
        quoted_total = %quoted,
        "quotation after seller response"
    );
}
