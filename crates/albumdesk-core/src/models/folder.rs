use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::checklist::{self, ChecklistStep};

/// Work-type tag selecting a folder's process checklist template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkType {
    CetakFoto,
    Kolase,
    Magazine,
    SemiMagazine,
    Bingkai,
    FlashDisk,
    Other,
}

impl WorkType {
    /// Parse a folder's `tipe` tag. Unknown or empty tags fall back to
    /// `Other`. Accepts the alias spellings present in production data.
    pub fn from_tipe(tipe: &str) -> Self {
        match tipe.trim() {
            "Cetak Foto" => WorkType::CetakFoto,
            "Kolase" => WorkType::Kolase,
            "Magazine" => WorkType::Magazine,
            "Semi Magazine" | "Semi Magazine/Kolase" => WorkType::SemiMagazine,
            "Bingkai" | "Cetak+Bingkai" => WorkType::Bingkai,
            "Flash Disk" => WorkType::FlashDisk,
            _ => WorkType::Other,
        }
    }
}

impl Display for WorkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            WorkType::CetakFoto => write!(f, "Cetak Foto"),
            WorkType::Kolase => write!(f, "Kolase"),
            WorkType::Magazine => write!(f, "Magazine"),
            WorkType::SemiMagazine => write!(f, "Semi Magazine"),
            WorkType::Bingkai => write!(f, "Bingkai"),
            WorkType::FlashDisk => write!(f, "Flash Disk"),
            WorkType::Other => write!(f, "Other"),
        }
    }
}

/// Folder as the backend serializes it. `stepChecklist` entries carry the
/// `" (done)"` marker inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub tipe: String,
    #[serde(default)]
    pub ukuran: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "driveLink", default, skip_serializing_if = "Option::is_none")]
    pub drive_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(
        rename = "assigneeName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee_name: Option<String>,
    #[serde(rename = "kodeOrder", default, skip_serializing_if = "Option::is_none")]
    pub kode_order: Option<String>,
    #[serde(
        rename = "workingDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub working_description: Option<String>,
    #[serde(rename = "stepChecklist", default)]
    pub step_checklist: Vec<String>,
}

/// One unit of printing work within an order.
///
/// The checklist is populated once, at acceptance time, from the process-type
/// table; once non-empty its length and step order never change, only the
/// done flags do.
#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub id: String,
    /// Raw work-type tag as entered by the customer; resolve with
    /// [`Folder::work_type`].
    pub tipe: String,
    pub ukuran: String,
    pub description: String,
    pub drive_link: Option<String>,
    /// Derived current-step string last recorded on the backend.
    pub current_status: Option<String>,
    pub assignee: Option<String>,
    pub assignee_name: Option<String>,
    pub kode_order: Option<String>,
    pub working_description: Option<String>,
    pub checklist: Vec<ChecklistStep>,
}

impl Folder {
    /// Resolved work type; queried fresh so the template table stays the
    /// single source of truth.
    pub fn work_type(&self) -> WorkType {
        WorkType::from_tipe(&self.tipe)
    }

    pub fn has_checklist(&self) -> bool {
        !self.checklist.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        checklist::is_fully_complete(&self.checklist)
    }

    pub fn current_step(&self) -> Option<&str> {
        checklist::current_step(&self.checklist)
    }
}

impl From<FolderRecord> for Folder {
    fn from(record: FolderRecord) -> Self {
        Folder {
            id: record.id,
            tipe: record.tipe,
            ukuran: record.ukuran,
            description: record.description,
            drive_link: record.drive_link,
            current_status: record.status,
            assignee: record.assignee,
            assignee_name: record.assignee_name,
            kode_order: record.kode_order,
            working_description: record.working_description,
            checklist: checklist::decode_checklist(&record.step_checklist),
        }
    }
}
