//! Deep-link formatting.

use atelier_service::models::BusinessSettings;
use atelier_service::services::links::{normalize_phone, upi_link, whatsapp_link};

fn settings() -> BusinessSettings {
    BusinessSettings {
        business_name: "Asha Boutique".to_string(),
        upi_id: "asha@upi".to_string(),
        country_code: "91".to_string(),
        ..BusinessSettings::default()
    }
}

#[test]
fn phones_normalize_to_digits_with_country_code() {
    assert_eq!(normalize_phone("98765 43210", "91"), "919876543210");
    assert_eq!(normalize_phone("(98765) 43210", "91"), "919876543210");
    assert_eq!(normalize_phone("+91-98765-43210", "91"), "919876543210");
}

#[test]
fn whatsapp_links_point_at_wa_me() {
    let url = whatsapp_link("9876543210", "Bill096 is ready for pickup", &settings());
    assert!(url.starts_with("https://wa.me/919876543210?text="));
    assert!(url.contains("Bill096%20is%20ready"));
}

#[test]
fn upi_links_format_amount_to_two_decimals() {
    let url = upi_link(999.9, "Bill096", None, &settings());
    assert!(url.starts_with("upi://pay?pa=asha@upi&pn=Asha%20Boutique&am=999.90&cu=INR"));
    assert!(!url.contains("&tr="));

    let with_ref = upi_link(100.0, "Bill097", Some("Bill097"), &settings());
    assert!(with_ref.ends_with("&tr=Bill097"));
}
