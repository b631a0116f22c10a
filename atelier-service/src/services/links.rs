//! Messaging and payment deep links.

use crate::models::BusinessSettings;

/// Normalize a phone number for deep links: keep digits only, drop a
/// leading trunk zero, and prefix the country code when the number looks
/// local (ten digits or fewer).
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = digits.trim_start_matches('0').to_string();
    let cc: String = country_code.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() <= 10 {
        format!("{cc}{digits}")
    } else {
        digits
    }
}

/// WhatsApp deep link: `https://wa.me/<countrycode+number>?text=<message>`.
pub fn whatsapp_link(phone: &str, message: &str, settings: &BusinessSettings) -> String {
    let number = normalize_phone(phone, &settings.country_code);
    format!(
        "https://wa.me/{}?text={}",
        number,
        urlencoding::encode(message)
    )
}

/// UPI intent link for mobile payment apps:
/// `upi://pay?pa=...&pn=...&am=...&cu=INR&tn=...`, with `tr` carrying the
/// bill reference when present.
pub fn upi_link(
    amount: f64,
    note: &str,
    reference: Option<&str>,
    settings: &BusinessSettings,
) -> String {
    let mut link = format!(
        "upi://pay?pa={}&pn={}&am={:.2}&cu=INR&tn={}",
        settings.upi_id,
        urlencoding::encode(&settings.business_name),
        amount,
        urlencoding::encode(note)
    );
    if let Some(reference) = reference {
        link.push_str(&format!("&tr={}", reference));
    }
    link
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BusinessSettings {
        BusinessSettings {
            business_name: "Meera Couture".to_string(),
            upi_id: "meera@okbank".to_string(),
            country_code: "91".to_string(),
            ..BusinessSettings::default()
        }
    }

    #[test]
    fn local_numbers_get_the_country_code() {
        assert_eq!(normalize_phone("98765 43210", "91"), "919876543210");
        assert_eq!(normalize_phone("098765-43210", "91"), "919876543210");
        // Already international: left alone.
        assert_eq!(normalize_phone("+91 98765 43210", "91"), "919876543210");
    }

    #[test]
    fn whatsapp_link_url_encodes_the_message() {
        let link = whatsapp_link("9876543210", "Your order is ready!", &settings());
        assert_eq!(
            link,
            "https://wa.me/919876543210?text=Your%20order%20is%20ready%21"
        );
    }

    #[test]
    fn upi_link_carries_amount_and_reference() {
        let link = upi_link(1250.5, "Bill096", Some("Bill096"), &settings());
        assert_eq!(
            link,
            "upi://pay?pa=meera@okbank&pn=Meera%20Couture&am=1250.50&cu=INR&tn=Bill096&tr=Bill096"
        );
    }
}
