use serde::Deserialize;

/// Column names of the beneficiary dataset, in file order.
pub const COLUMNS: [&str; 14] = [
    "beneficiary_id",
    "registration_date",
    "region",
    "district",
    "displacement_status",
    "solutions_pathway",
    "pathway_stage",
    "household_size",
    "gender_hoh",
    "shelter_status",
    "livelihood_support",
    "documentation_status",
    "latitude",
    "longitude",
];

/// One CSV row exactly as read, before any validation.
/// Every cell is kept as text so that a bad value is reported against its
/// column instead of failing the whole record at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    pub beneficiary_id: String,
    pub registration_date: String,
    pub region: String,
    pub district: String,
    pub displacement_status: String,
    pub solutions_pathway: String,
    pub pathway_stage: String,
    pub household_size: String,
    pub gender_hoh: String,
    pub shelter_status: String,
    pub livelihood_support: String,
    pub documentation_status: String,
    pub latitude: String,
    pub longitude: String,
}
