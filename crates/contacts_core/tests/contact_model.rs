use contacts_core::{
    clamp_page_number, filter_contacts, is_valid_email, is_valid_mobile, total_pages, Contact,
    ContactPage, ContactValidationError,
};
use serde_json::json;

#[test]
fn contact_serializes_with_explicit_nulls() {
    let contact = Contact::with_id(7, "Alice", Some("alice@example.com"), None::<String>);
    let value = serde_json::to_value(&contact).unwrap();

    assert_eq!(
        value,
        json!({
            "id": 7,
            "name": "Alice",
            "email": "alice@example.com",
            "mobile": null
        })
    );

    let decoded: Contact = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, contact);
}

#[test]
fn page_serializes_items_and_total() {
    let page = ContactPage {
        items: vec![Contact::with_id(1, "Bob", None::<String>, Some("5550000"))],
        total: 12,
    };
    let value = serde_json::to_value(&page).unwrap();
    assert_eq!(value["total"], 12);
    assert_eq!(value["items"][0]["mobile"], "5550000");
}

#[test]
fn new_contacts_are_unsaved_and_validate_names() {
    let contact = Contact::new("Carol", Some(" "), None::<String>);
    assert!(!contact.is_saved());
    assert_eq!(contact.email, None);
    assert!(contact.validate().is_ok());

    let blank = Contact::new("\t", None::<String>, None::<String>);
    assert_eq!(blank.validate(), Err(ContactValidationError::BlankName));
}

#[test]
fn form_helpers_cover_validation_paging_and_local_filtering() {
    assert!(is_valid_email("dana@example.com"));
    assert!(!is_valid_email("dana@"));
    assert!(is_valid_mobile("5551234"));
    assert!(!is_valid_mobile("555-1234"));

    assert_eq!(total_pages(21, 10), 3);
    assert_eq!(clamp_page_number(7, 21, 10), 3);

    let items = vec![
        Contact::with_id(1, "Alice Wonderland", Some("alice@example.com"), None::<String>),
        Contact::with_id(2, "Bob Builder", Some("bob@builder.com"), None::<String>),
    ];
    let hits = filter_contacts(&items, "alice");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 1);
}
