//! Outbound WhatsApp notification templating
//!
//! Pure formatting of the customer-facing acceptance and completion
//! messages, and the `wa.me` deep link that carries them. Delivery happens
//! outside this crate (a browser or the operator's phone opens the link);
//! the orchestrator only guarantees the link is built after all persistence
//! steps succeed.

use crate::models::Order;

const STUDIO_NAME: &str = "Jovan Album";
const TRACK_URL_BASE: &str = "https://jovanalbumsystem.web.app/track";

/// Convert a local Indonesian number (leading `0`) to international form and
/// strip separators, as `wa.me` requires: `0812-345 678` -> `62812345678`.
pub fn to_international(phone: &str) -> String {
    let trimmed = phone.trim();
    let replaced = match trimmed.strip_prefix('0') {
        Some(rest) => format!("62{}", rest),
        None => trimmed.to_string(),
    };
    replaced
        .chars()
        .filter(|c| !matches!(c, '-' | '+' | ' '))
        .collect()
}

fn folder_details(order: &Order) -> String {
    order
        .folders
        .iter()
        .enumerate()
        .map(|(index, folder)| {
            let mut lines = vec![format!("Folder {}:", index + 1)];
            if !folder.tipe.is_empty() {
                lines.push(format!("tipe: {}", folder.tipe));
            }
            if let Some(kode) = folder.kode_order.as_deref() {
                if !kode.is_empty() {
                    lines.push(format!("kode order: {}", kode));
                }
            }
            lines.push(format!("ukuran: {}", folder.ukuran));
            lines.push(format!("deskripsi: {} ||", folder.description));
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Message sent when an order is accepted; includes the tracking id and the
/// customer tracking link.
pub fn acceptance_message(order: &Order, tracking_id: &str) -> String {
    format!(
        "*PESANANMU* *SUDAH* *KAMI* *TERIMA!*\n\
         .......\n\
         Terima kasih! pesananmu atas nama: {name} telah kami terima dan akan segera di proses!\n\
         \n\
         __________________________\n\
         rincian pesanan:\n\
         \n\
         {folders}\n\
         __________________________\n\
         \n\
         nomor order: *{tracking}*\n\
         Track Pesanan mu disini: {track_base}/{tracking}\n\
         .......\n\
         * {studio} *",
        name = order.sender.name,
        folders = folder_details(order),
        tracking = tracking_id,
        track_base = TRACK_URL_BASE,
        studio = STUDIO_NAME,
    )
}

/// Message sent when an order is completed and ready for pickup. No tracking
/// line; the record is about to be archived.
pub fn completion_message(order: &Order) -> String {
    format!(
        "*PESANANMU* *SUDAH* *SELESAI* *!*\n\
         .......\n\
         Terima kasih! pesananmu atas nama: {name} sudah selesai dan dapat langsung diambil di {studio}!\n\
         \n\
         __________________________\n\
         rincian pesanan:\n\
         \n\
         {folders}\n\
         __________________________\n\
         \n\
         .......\n\
         * {studio} *",
        name = order.sender.name,
        folders = folder_details(order),
        studio = STUDIO_NAME,
    )
}

/// WhatsApp deep link carrying `message` to `phone`.
pub fn wa_link(phone: &str, message: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        to_international(phone),
        urlencoding::encode(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Folder, OrderStatus, Sender};
    use chrono::Utc;

    fn sample_order() -> Order {
        Order {
            id: "o1".to_string(),
            tracking_id: Some("TRK-77".to_string()),
            sender: Sender {
                name: "Budi".to_string(),
                whatsapp: "0812-345 678".to_string(),
            },
            folders: vec![Folder {
                id: "f1".to_string(),
                tipe: "Kolase".to_string(),
                ukuran: "20x30".to_string(),
                description: "wedding album".to_string(),
                drive_link: None,
                current_status: None,
                assignee: None,
                assignee_name: None,
                kode_order: Some("K-3".to_string()),
                working_description: None,
                checklist: vec![],
            }],
            main_folder_id: None,
            upload_date: Utc::now(),
            status: OrderStatus::OnProcess,
            estimated_finish: None,
            working_notes: None,
        }
    }

    #[test]
    fn local_phone_becomes_international() {
        assert_eq!(to_international("0812-345 678"), "62812345678");
        assert_eq!(to_international("+62 812 345 678"), "62812345678");
    }

    #[test]
    fn acceptance_message_carries_tracking_and_details() {
        let message = acceptance_message(&sample_order(), "TRK-77");
        assert!(message.contains("nomor order: *TRK-77*"));
        assert!(message.contains("tipe: Kolase"));
        assert!(message.contains("kode order: K-3"));
        assert!(message.contains("Budi"));
        assert!(message.contains("/track/TRK-77"));
    }

    #[test]
    fn completion_message_has_no_tracking_line() {
        let message = completion_message(&sample_order());
        assert!(!message.contains("nomor order"));
        assert!(message.contains("sudah selesai"));
    }

    #[test]
    fn wa_link_is_percent_encoded() {
        let link = wa_link("0812", "halo dunia!");
        assert!(link.starts_with("https://wa.me/62812?text="));
        assert!(link.contains("halo%20dunia%21"));
        assert!(!link.contains(' '));
    }
}
