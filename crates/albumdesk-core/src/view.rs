//! Filter/sort engine
//!
//! Pure view derivation over order lists: referentially transparent given
//! (orders, criterion, value), so a consumer can reapply its active filter
//! to every fresh snapshot the poller publishes without losing state.
//! Every function returns a new list; nothing is patched in place.

use std::str::FromStr;

use crate::error::AppError;
use crate::models::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Name,
    TrackingId,
    Phone,
    Description,
}

impl FromStr for FilterField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(FilterField::Name),
            "trackingId" | "tracking-id" | "tracking" => Ok(FilterField::TrackingId),
            "phone" => Ok(FilterField::Phone),
            "description" => Ok(FilterField::Description),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid filter field: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Newest uploads first.
    UploadDateDesc,
    /// Soonest estimated finish first; orders without one sink to the end,
    /// newest upload first within the tail.
    EstimatedFinishAsc,
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" | "upload-date" => Ok(SortKey::UploadDateDesc),
            "estimate" | "estimated-finish" => Ok(SortKey::EstimatedFinishAsc),
            _ => Err(AppError::InvalidInput(format!("Invalid sort key: {}", s))),
        }
    }
}

fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Strip whitespace, `+`, and `-` and lowercase, so local and international
/// spellings of the same number compare equal as substrings.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '+' && *c != '-')
        .collect::<String>()
        .to_lowercase()
}

/// Filter orders by one criterion. Text fields match case-insensitively
/// after trimming; orders without a tracking id match the literal text
/// "pending"; the description criterion reads the first folder only, as the
/// production dashboard does.
pub fn filter_by(orders: &[Order], field: FilterField, value: &str) -> Vec<Order> {
    let needle = normalize_text(value);
    if needle.is_empty() {
        return orders.to_vec();
    }

    orders
        .iter()
        .filter(|order| match field {
            FilterField::Name => normalize_text(&order.sender.name).contains(&needle),
            FilterField::TrackingId => {
                let tracking = order
                    .tracking_id
                    .as_deref()
                    .map(normalize_text)
                    .unwrap_or_else(|| "pending".to_string());
                tracking.contains(&needle)
            }
            FilterField::Phone => {
                normalize_phone(&order.sender.whatsapp).contains(&normalize_phone(value))
            }
            FilterField::Description => order
                .folders
                .first()
                .map(|folder| normalize_text(&folder.description).contains(&needle))
                .unwrap_or(false),
        })
        .cloned()
        .collect()
}

/// Stable sort into a fresh list.
pub fn sort_by(orders: &[Order], key: SortKey) -> Vec<Order> {
    let mut sorted = orders.to_vec();
    match key {
        SortKey::UploadDateDesc => {
            sorted.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        }
        SortKey::EstimatedFinishAsc => {
            sorted.sort_by(|a, b| match (a.estimated_finish, b.estimated_finish) {
                (Some(x), Some(y)) => x.cmp(&y).then(b.upload_date.cmp(&a.upload_date)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => b.upload_date.cmp(&a.upload_date),
            });
        }
    }
    sorted
}

/// Orders the staff dashboard works on.
pub fn active_orders(orders: &[Order]) -> Vec<Order> {
    orders
        .iter()
        .filter(|o| o.status != OrderStatus::History)
        .cloned()
        .collect()
}

/// Archived orders for the history view.
pub fn history_orders(orders: &[Order]) -> Vec<Order> {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::History)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Folder, Sender};
    use chrono::{TimeZone, Utc};

    fn order(id: &str, name: &str, phone: &str) -> Order {
        Order {
            id: id.to_string(),
            tracking_id: None,
            sender: Sender {
                name: name.to_string(),
                whatsapp: phone.to_string(),
            },
            folders: vec![],
            main_folder_id: None,
            upload_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            status: OrderStatus::New,
            estimated_finish: None,
            working_notes: None,
        }
    }

    fn folder_with_description(description: &str) -> Folder {
        Folder {
            id: "f".to_string(),
            tipe: String::new(),
            ukuran: String::new(),
            description: description.to_string(),
            drive_link: None,
            current_status: None,
            assignee: None,
            assignee_name: None,
            kode_order: None,
            working_description: None,
            checklist: vec![],
        }
    }

    #[test]
    fn name_filter_is_case_insensitive_and_trimmed() {
        let orders = vec![order("o1", "Budi Santoso", "0812"), order("o2", "Sari", "0813")];
        let filtered = filter_by(&orders, FilterField::Name, "  bUdI ");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "o1");
    }

    #[test]
    fn filter_is_idempotent() {
        let orders = vec![order("o1", "Budi", "0812"), order("o2", "Sari", "0813")];
        let once = filter_by(&orders, FilterField::Name, "budi");
        let twice = filter_by(&once, FilterField::Name, "budi");
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_tracking_id_matches_pending() {
        let mut tracked = order("o1", "Budi", "0812");
        tracked.tracking_id = Some("TRK-9".to_string());
        let untracked = order("o2", "Sari", "0813");
        let orders = vec![tracked, untracked];

        let filtered = filter_by(&orders, FilterField::TrackingId, "pend");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "o2");

        let filtered = filter_by(&orders, FilterField::TrackingId, "trk");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "o1");
    }

    #[test]
    fn phone_normalization_makes_spellings_equal() {
        assert_eq!(normalize_phone("0812-345 678"), normalize_phone("0812345678"));
        assert_eq!(normalize_phone("+62 812"), "62812");
    }

    #[test]
    fn phone_filter_matches_across_formats() {
        let orders = vec![order("o1", "Budi", "0812-345 678")];
        let filtered = filter_by(&orders, FilterField::Phone, "12345");
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn description_filter_reads_first_folder_only() {
        let mut o = order("o1", "Budi", "0812");
        o.folders = vec![
            folder_with_description("graduation album"),
            folder_with_description("wedding frames"),
        ];
        let orders = vec![o];

        assert_eq!(filter_by(&orders, FilterField::Description, "graduation").len(), 1);
        // second folder's text is invisible to the filter
        assert_eq!(filter_by(&orders, FilterField::Description, "wedding").len(), 0);
    }

    #[test]
    fn empty_filter_returns_everything() {
        let orders = vec![order("o1", "Budi", "0812"), order("o2", "Sari", "0813")];
        assert_eq!(filter_by(&orders, FilterField::Name, "   ").len(), 2);
    }

    #[test]
    fn estimated_finish_sorts_nulls_last() {
        let mut a = order("A", "a", "1");
        a.upload_date = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let mut b = order("B", "b", "2");
        b.estimated_finish = Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap());
        let mut c = order("C", "c", "3");
        c.estimated_finish = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let sorted = sort_by(&[a, b, c], SortKey::EstimatedFinishAsc);
        let ids: Vec<&str> = sorted.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "B", "A"]);
    }

    #[test]
    fn undated_tail_is_newest_upload_first() {
        let mut a = order("A", "a", "1");
        a.upload_date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut b = order("B", "b", "2");
        b.upload_date = Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap();

        let sorted = sort_by(&[a, b], SortKey::EstimatedFinishAsc);
        let ids: Vec<&str> = sorted.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn upload_date_sort_is_newest_first() {
        let mut a = order("A", "a", "1");
        a.upload_date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut b = order("B", "b", "2");
        b.upload_date = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let sorted = sort_by(&[a, b], SortKey::UploadDateDesc);
        assert_eq!(sorted[0].id, "B");
    }

    #[test]
    fn projections_split_on_history() {
        let mut archived = order("o1", "Budi", "0812");
        archived.status = OrderStatus::History;
        let active = order("o2", "Sari", "0813");
        let orders = vec![archived, active];

        assert_eq!(active_orders(&orders).len(), 1);
        assert_eq!(history_orders(&orders).len(), 1);
        assert_eq!(history_orders(&orders)[0].id, "o1");
    }
}
