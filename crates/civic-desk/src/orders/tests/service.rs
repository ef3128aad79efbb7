use super::common::*;

use crate::catalog::AnswerError;
use crate::orders::domain::{CustomerId, NewOrderRequest, OrderId, OrderStatus};
use crate::orders::memory::InMemoryCustomerDirectory;
use crate::orders::query::{OrderFilter, PageRequest};
use crate::orders::repository::{OrderRepository, RepositoryError};
use crate::orders::OrderServiceError;
use crate::pricing::{DeliveryType, PricingError, EXPENSES_ID};

#[test]
fn creates_an_order_with_snapshots_and_documents() {
    let (service, orders, _) = build_service();
    let customer = registered(&service);

    let order = service
        .create_at(passport_request(&customer.id), at(1, 9))
        .expect("order created");

    assert_eq!(order.id, OrderId("ORD-000001".to_string()));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.service.name, "جواز سفر");
    assert_eq!(order.variant.price_cents, 51_000);
    assert_eq!(order.pricing.total_cents, 51_000);
    assert_eq!(
        order.required_documents,
        vec![
            "صورة البطاقة".to_string(),
            "شهادة الموقف من التجنيد".to_string()
        ]
    );
    assert_eq!(orders.len(), 1);
}

#[test]
fn walk_in_customers_are_registered_with_the_order() {
    let (service, _, customers) = build_service();
    let request = NewOrderRequest {
        customer_id: None,
        walk_in: Some(walk_in()),
        ..passport_request(&CustomerId(String::new()))
    };

    let order = service.create_at(request, at(1, 9)).expect("order created");
    assert_eq!(order.customer_name, "Karim Mostafa");

    let found = crate::orders::CustomerDirectory::search(customers.as_ref(), "Karim", 5)
        .expect("search works");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, order.customer_id);
}

#[test]
fn dependent_orders_use_the_dependents_profile() {
    let (service, _, _) = build_service();
    let customer = registered(&service);

    let mut request = NewOrderRequest {
        customer_id: Some(customer.id.clone()),
        dependent_id: Some("child-1".to_string()),
        service_slug: "national-id".to_string(),
        variant_id: "standard".to_string(),
        quantity: 1,
        ..NewOrderRequest::default()
    };
    request
        .answers
        .insert("question_1".to_string(), "student".to_string());
    request
        .answers
        .insert("question_2".to_string(), "none".to_string());
    request
        .answers
        .insert("spouseName".to_string(), "stale".to_string());

    let order = service.create_at(request, at(1, 9)).expect("order created");

    assert_eq!(order.beneficiary_name(), "Laila Karim");
    assert!(order
        .required_documents
        .contains(&"موافقة ولي الأمر".to_string()));
    assert!(!order
        .required_documents
        .contains(&"شهادة الموقف من التجنيد".to_string()));
    assert!(!order.answers.contains_key("spouseName"), "hidden answer dropped");
}

#[test]
fn invalid_answers_persist_nothing() {
    let (service, orders, customers) = build_service();
    let request = NewOrderRequest {
        customer_id: None,
        walk_in: Some(walk_in()),
        answers: Default::default(),
        ..passport_request(&CustomerId(String::new()))
    };

    let err = service
        .create_at(request, at(1, 9))
        .expect_err("answers are missing");
    match err {
        OrderServiceError::InvalidAnswers(problems) => {
            assert_eq!(problems.len(), 3);
            assert!(matches!(problems[0], AnswerError::Missing { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(orders.is_empty());
    assert!(
        crate::orders::CustomerDirectory::search(customers.as_ref(), "Karim", 5)
            .expect("search works")
            .is_empty()
    );
}

#[test]
fn address_delivery_needs_an_address_and_adds_the_fee() {
    let (service, _, _) = build_service();
    let customer = registered(&service);

    let mut request = passport_request(&customer.id);
    request.delivery_type = DeliveryType::Address;
    request.delivery_address = Some("   ".to_string());
    assert!(matches!(
        service.create_at(request.clone(), at(1, 9)),
        Err(OrderServiceError::MissingDeliveryAddress)
    ));

    request.delivery_address = Some("5 Abbas El Akkad, Nasr City".to_string());
    let order = service.create_at(request, at(1, 9)).expect("order created");
    assert_eq!(order.pricing.delivery_fee_cents, 5_000);
    assert_eq!(order.pricing.total_cents, 56_000);
}

#[test]
fn fines_pull_in_the_expenses_line() {
    let (service, _, _) = build_service();
    let customer = registered(&service);

    let mut request = passport_request(&customer.id);
    request.selected_fines = vec!["fine_001".to_string()];
    let breakdown = service.quote(&request).expect("quote");

    let ids: Vec<&str> = breakdown
        .fine_lines
        .iter()
        .map(|line| line.id.as_str())
        .collect();
    assert_eq!(ids, vec!["fine_001", EXPENSES_ID]);
    assert_eq!(breakdown.total_cents, 51_000 + 10_000 + 2_500);

    request.selected_fines = vec!["fine_404".to_string()];
    assert!(matches!(
        service.quote(&request),
        Err(OrderServiceError::Pricing(PricingError::UnknownFine(_)))
    ));
}

#[test]
fn unknown_variants_and_customers_are_rejected() {
    let (service, _, _) = build_service();
    let customer = registered(&service);

    let mut request = passport_request(&customer.id);
    request.variant_id = "vip".to_string();
    assert!(matches!(
        service.create_at(request, at(1, 9)),
        Err(OrderServiceError::UnknownVariant { .. })
    ));

    let stranger = passport_request(&CustomerId("CUS-999999".to_string()));
    assert!(matches!(
        service.create_at(stranger, at(1, 9)),
        Err(OrderServiceError::UnknownCustomer(_))
    ));

    let anonymous = NewOrderRequest {
        customer_id: None,
        ..passport_request(&customer.id)
    };
    assert!(matches!(
        service.create_at(anonymous, at(1, 9)),
        Err(OrderServiceError::MissingCustomer)
    ));
}

#[test]
fn list_filters_sorts_and_paginates() {
    let (service, _, _) = build_service();
    let customer = registered(&service);

    service
        .create_at(passport_request(&customer.id), at(1, 9))
        .expect("created");
    service
        .create_at(birth_request(&customer.id, "2015-06-01"), at(2, 9))
        .expect("created");
    service
        .create_at(passport_request(&customer.id), at(3, 9))
        .expect("created");

    let everything = service
        .list(&OrderFilter::default(), PageRequest::new(1, 2))
        .expect("list");
    assert_eq!(everything.total, 3);
    assert_eq!(everything.total_pages, 2);
    let ids: Vec<&str> = everything.items.iter().map(|o| o.id.0.as_str()).collect();
    assert_eq!(ids, vec!["ORD-000003", "ORD-000002"]);

    let registry = OrderFilter {
        category: Some("civil-registry".to_string()),
        ..OrderFilter::default()
    };
    let page = service
        .list(&registry, PageRequest::default())
        .expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].beneficiary_name(), "Laila Karim");

    let window = OrderFilter {
        created_from: chrono::NaiveDate::from_ymd_opt(2025, 10, 2),
        created_to: chrono::NaiveDate::from_ymd_opt(2025, 10, 2),
        ..OrderFilter::default()
    };
    assert_eq!(service.filtered(&window).expect("filtered").len(), 1);

    let search = OrderFilter {
        search: Some("laila".to_string()),
        ..OrderFilter::default()
    };
    assert_eq!(service.filtered(&search).expect("filtered").len(), 1);
}

#[test]
fn bulk_status_update_reports_skips() {
    let (service, _, _) = build_service();
    let customer = registered(&service);
    let first = service
        .create_at(passport_request(&customer.id), at(1, 9))
        .expect("created");
    let second = service
        .create_at(passport_request(&customer.id), at(1, 10))
        .expect("created");
    service.cancel(&second.id, at(1, 11)).expect("cancelled");

    let missing = OrderId("ORD-999999".to_string());
    let outcome = service
        .update_status(
            &[first.id.clone(), second.id.clone(), missing.clone()],
            OrderStatus::Ready,
            at(2, 9),
        )
        .expect("bulk update");

    assert_eq!(outcome.updated, vec![first.id.clone()]);
    let skipped: Vec<&OrderId> = outcome.skipped.iter().map(|skip| &skip.id).collect();
    assert_eq!(skipped, vec![&second.id, &missing]);

    let reloaded = service.get(&first.id).expect("present");
    assert_eq!(reloaded.status, OrderStatus::Ready);
    assert_eq!(reloaded.updated_at, at(2, 9));

    let delivered = service
        .update_status(&[first.id.clone()], OrderStatus::Delivered, at(2, 10))
        .expect("bulk update");
    assert!(delivered.updated.is_empty(), "office pickups are never delivered");

    assert!(matches!(
        service.update_status(&[], OrderStatus::Ready, at(2, 9)),
        Err(OrderServiceError::NoOrders)
    ));
}

#[test]
fn print_selection_keeps_order_and_requires_ids() {
    let (service, _, _) = build_service();
    let customer = registered(&service);
    let first = service
        .create_at(passport_request(&customer.id), at(1, 9))
        .expect("created");
    let second = service
        .create_at(birth_request(&customer.id, "2015-06-01"), at(1, 10))
        .expect("created");

    let selected = service
        .orders_for_print(&[second.id.clone(), first.id.clone()])
        .expect("both exist");
    assert_eq!(selected[0].id, second.id);
    assert_eq!(selected[1].id, first.id);

    assert!(matches!(
        service.orders_for_print(&[]),
        Err(OrderServiceError::NoOrders)
    ));
}

#[test]
fn customer_search_ignores_short_terms() {
    let (service, _, _) = build_service();
    registered(&service);

    assert!(service.search_customers("K", 10).expect("search").is_empty());
    assert_eq!(service.search_customers("kar", 10).expect("search").len(), 1);
    assert_eq!(
        service
            .search_customers("2900315", 10)
            .expect("search by national id")
            .len(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn counter_search_uses_the_configured_debounce() {
    let (service, _, _) = build_service();
    registered(&service);

    let search = service.customer_search();
    assert_eq!(search.debounce(), pricing_config().search_debounce());

    let started = tokio::time::Instant::now();
    let found = search
        .search("karim")
        .await
        .expect("no storage error")
        .expect("not superseded");
    assert_eq!(found.len(), 1);
    assert!(started.elapsed() >= std::time::Duration::from_millis(300));
}

#[test]
fn duplicate_national_ids_conflict() {
    let (service, _, _) = build_service();
    registered(&service);
    assert!(matches!(
        service.register_customer(walk_in()),
        Err(OrderServiceError::Repository(RepositoryError::Conflict))
    ));
}

#[test]
fn repository_failures_propagate() {
    let service = service_with(UnavailableRepository, InMemoryCustomerDirectory::default());
    let customer = service.register_customer(walk_in()).expect("directory works");

    assert!(matches!(
        service.create_at(passport_request(&customer.id), at(1, 9)),
        Err(OrderServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
    assert!(UnavailableRepository.all().is_err());
}
