//! Process-type checklist table
//!
//! Static mapping from a folder's work type to its ordered list of process
//! steps. The table is the template, not the instance: it is consulted fresh
//! every time a checklist is assigned, and again when deriving display
//! labels, so a template change never has to migrate stored folders.

use crate::checklist::ChecklistStep;
use crate::models::WorkType;

const CETAK_FOTO: &[&str] = &[
    "Admin - Terima",
    "Bojes - Cetak",
    "Bojes - Laminating",
    "Bojes - selesai",
];

const KOLASE: &[&str] = &[
    "Admin - Terima",
    "Bojes - Cetak",
    "Bojes - Laminating",
    "Bojes - di Urut",
    "Bojes - Naik ke atas",
    "Bojes - Selesai",
];

const MAGAZINE: &[&str] = &[
    "Admin - Terima",
    "Bojes - Kirim ke Azis",
    "Azis - Atur Warna & Potong2x",
    "Azis - Proses Cetak",
    "Azis - di Urut",
    "Azis - Naik ke atas",
    "Azis - Selesai",
];

const SEMI_MAGAZINE: &[&str] = &[
    "Admin - Terima",
    "Admin - Edit",
    "Admin - Set warna",
    "Admin - Cetak",
    "Admin - Urut",
    "Admin - Kasih Putra",
    "Admin - Selesai",
];

const BINGKAI: &[&str] = &[
    "Admin - Terima",
    "Bojes - Cetak",
    "Bojes - Laminating",
    "Admin - Kode Bingkai",
    "Admin - Naik ke atas",
    "Admin - Selesai",
];

const FLASH_DISK: &[&str] = &["Admin - Terima", "Bojes - Grafir", "Bojes - Selesai"];

const OTHER: &[&str] = &[
    "Admin - Terima",
    "Bojes - Cetak",
    "Bojes - di Finishing",
    "Bojes - Selesai",
];

/// Ordered step template for a work type.
pub fn steps_for(work_type: WorkType) -> &'static [&'static str] {
    match work_type {
        WorkType::CetakFoto => CETAK_FOTO,
        WorkType::Kolase => KOLASE,
        WorkType::Magazine => MAGAZINE,
        WorkType::SemiMagazine => SEMI_MAGAZINE,
        WorkType::Bingkai => BINGKAI,
        WorkType::FlashDisk => FLASH_DISK,
        WorkType::Other => OTHER,
    }
}

/// Template steps for a raw `tipe` tag, falling back to `Other`.
pub fn steps_for_tipe(tipe: &str) -> &'static [&'static str] {
    steps_for(WorkType::from_tipe(tipe))
}

/// Fresh, all-pending checklist instance for a work type.
pub fn template_checklist(work_type: WorkType) -> Vec<ChecklistStep> {
    steps_for(work_type)
        .iter()
        .map(|name| ChecklistStep::pending(*name))
        .collect()
}
