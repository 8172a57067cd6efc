// src/domain/record.rs

use crate::store::raw::RawRow;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Lowercase a label and strip spaces, underscores and dashes so that
/// "Host Community", "HostCommunity" and "host_community" compare equal.
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Generates the closed category enums used on every record.
/// Each gets a display label (the CSV spelling), a snake_case key for KPI names,
/// an `ALL` list in declaration order, and a lenient `parse`.
macro_rules! category {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => ($label:expr, $key:expr)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn key(&self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                let wanted = normalize_label(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize_label(v.label()) == wanted || v.key().replace('_', "") == wanted)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }
    };
}

category!(
    DisplacementStatus {
        Idp => ("IDP", "idp"),
        Returnee => ("Returnee", "returnee"),
        HostCommunity => ("Host Community", "host_community"),
    }
);

category!(
    /// Durable solutions pathway. A record without one is "not yet determined".
    SolutionsPathway {
        Return => ("Return", "return"),
        LocalIntegration => ("Local Integration", "local_integration"),
        Relocation => ("Relocation", "relocation"),
    }
);

category!(
    /// Progress within a pathway. Declaration order is the progress order.
    PathwayStage {
        Assessment => ("Assessment", "assessment"),
        Planning => ("Planning", "planning"),
        Implementation => ("Implementation", "implementation"),
        Achieved => ("Achieved", "achieved"),
    }
);

category!(
    GenderHoh {
        Male => ("Male", "male"),
        Female => ("Female", "female"),
        Other => ("Other/Unknown", "other"),
    }
);

category!(
    ShelterStatus {
        Emergency => ("Emergency", "emergency"),
        Transitional => ("Transitional", "transitional"),
        Permanent => ("Permanent", "permanent"),
    }
);

category!(
    /// Ordered: `Absent` < `Partial` < `Complete`. `Absent` is written "None" in the data.
    DocumentationStatus {
        Absent => ("None", "none"),
        Partial => ("Partial", "partial"),
        Complete => ("Complete", "complete"),
    }
);

/// Spellings that mean "no pathway chosen yet" in the pathway column,
/// and "no stage" in the stage column.
const UNSET_MARKERS: &[&str] = &["", "n/a", "na", "none", "notyetdetermined"];

fn is_unset(s: &str) -> bool {
    let s = normalize_label(s);
    UNSET_MARKERS.iter().any(|m| normalize_label(m) == s)
}

/// A chosen pathway together with how far along it the household is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pathway {
    pub kind: SolutionsPathway,
    pub stage: PathwayStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One validated row of the beneficiary dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeneficiaryRecord {
    pub id: String,
    pub registration_date: NaiveDate,
    pub region: String,
    pub district: String,
    pub displacement_status: DisplacementStatus,
    pub pathway: Option<Pathway>,
    pub household_size: u32,
    pub gender_hoh: GenderHoh,
    pub shelter_status: ShelterStatus,
    pub livelihood_support: bool,
    pub documentation_status: DocumentationStatus,
    pub location: Option<GeoPoint>,
}

/// How a cell failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// The cell holds no usable value of the column's type: blank, malformed, unknown label.
    Parse,
    /// The value parsed but breaks a rule: future date, zero household, coordinate out of range.
    Constraint,
}

/// Why a single row could not become a `BeneficiaryRecord`.
/// `row` is the 1-based data row (the header is not counted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("row {row}: column '{column}': {reason}")]
pub struct RowValidationError {
    pub row: usize,
    pub column: &'static str,
    pub kind: RejectionKind,
    pub reason: String,
}

impl RowValidationError {
    pub fn parse(row: usize, column: &'static str, reason: impl Into<String>) -> Self {
        Self {
            row,
            column,
            kind: RejectionKind::Parse,
            reason: reason.into(),
        }
    }

    pub fn constraint(row: usize, column: &'static str, reason: impl Into<String>) -> Self {
        Self {
            row,
            column,
            kind: RejectionKind::Constraint,
            reason: reason.into(),
        }
    }
}

/// A cell-level failure before the row number is attached.
type CellError = (&'static str, RejectionKind, String);

impl BeneficiaryRecord {
    /// Validates a raw CSV row. `as_of` is the load date; registrations after it are rejected.
    pub fn from_raw(raw: &RawRow, row: usize, as_of: NaiveDate) -> Result<Self, RowValidationError> {
        let parse_err = |column: &'static str, reason: String| RowValidationError::parse(row, column, reason);
        let rule_err =
            |column: &'static str, reason: String| RowValidationError::constraint(row, column, reason);

        let id = raw.beneficiary_id.trim();
        if id.is_empty() {
            return Err(parse_err("beneficiary_id", "missing id".into()));
        }

        let date_str = raw.registration_date.trim();
        let registration_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|_| parse_err("registration_date", format!("'{date_str}' is not a YYYY-MM-DD date")))?;
        if registration_date > as_of {
            return Err(rule_err(
                "registration_date",
                format!("{registration_date} is after the load date {as_of}"),
            ));
        }

        let region = non_empty(&raw.region).ok_or_else(|| parse_err("region", "missing region".into()))?;
        let district =
            non_empty(&raw.district).ok_or_else(|| parse_err("district", "missing district".into()))?;

        let displacement_status = DisplacementStatus::parse(&raw.displacement_status).ok_or_else(
            || parse_err("displacement_status", unknown_value(&raw.displacement_status)),
        )?;

        let pathway = parse_pathway(&raw.solutions_pathway, &raw.pathway_stage)
            .map_err(|(column, kind, reason)| RowValidationError { row, column, kind, reason })?;

        let hh = raw.household_size.trim();
        let household_size = match hh.parse::<u32>() {
            Ok(0) => return Err(rule_err("household_size", "household size must be at least 1".into())),
            Ok(n) => n,
            Err(_) => return Err(parse_err("household_size", format!("'{hh}' is not a whole number"))),
        };

        let gender_hoh = match raw.gender_hoh.trim() {
            "" => GenderHoh::Other,
            s if normalize_label(s) == "unknown" => GenderHoh::Other,
            s => GenderHoh::parse(s).ok_or_else(|| parse_err("gender_hoh", unknown_value(s)))?,
        };

        let shelter_status = ShelterStatus::parse(&raw.shelter_status)
            .ok_or_else(|| parse_err("shelter_status", unknown_value(&raw.shelter_status)))?;

        let livelihood_support = parse_yes_no(&raw.livelihood_support).ok_or_else(|| {
            parse_err(
                "livelihood_support",
                format!("expected Yes/No, got '{}'", raw.livelihood_support.trim()),
            )
        })?;

        let documentation_status = match raw.documentation_status.trim() {
            "" => DocumentationStatus::Absent,
            s => DocumentationStatus::parse(s)
                .ok_or_else(|| parse_err("documentation_status", unknown_value(s)))?,
        };

        let location = parse_location(&raw.latitude, &raw.longitude)
            .map_err(|(column, kind, reason)| RowValidationError { row, column, kind, reason })?;

        Ok(BeneficiaryRecord {
            id: id.to_string(),
            registration_date,
            region,
            district,
            displacement_status,
            pathway,
            household_size,
            gender_hoh,
            shelter_status,
            livelihood_support,
            documentation_status,
            location,
        })
    }

    pub fn solutions_pathway(&self) -> Option<SolutionsPathway> {
        self.pathway.map(|p| p.kind)
    }

    pub fn pathway_stage(&self) -> Option<PathwayStage> {
        self.pathway.map(|p| p.stage)
    }

    pub fn is_achieved(&self) -> bool {
        self.pathway_stage() == Some(PathwayStage::Achieved)
    }

    pub fn is_female_hoh(&self) -> bool {
        self.gender_hoh == GenderHoh::Female
    }

    pub fn has_complete_documentation(&self) -> bool {
        self.documentation_status == DocumentationStatus::Complete
    }

    /// Registration month as `(year, month)`.
    pub fn registration_month(&self) -> (i32, u32) {
        (self.registration_date.year(), self.registration_date.month())
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn unknown_value(s: &str) -> String {
    format!("unknown value '{}'", s.trim())
}

pub(crate) fn parse_yes_no(s: &str) -> Option<bool> {
    match normalize_label(s).as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

fn parse_pathway(pathway: &str, stage: &str) -> Result<Option<Pathway>, CellError> {
    if is_unset(pathway) {
        if !is_unset(stage) {
            return Err((
                "pathway_stage",
                RejectionKind::Constraint,
                format!("stage '{}' given without a solutions pathway", stage.trim()),
            ));
        }
        return Ok(None);
    }

    let kind = SolutionsPathway::parse(pathway)
        .ok_or_else(|| ("solutions_pathway", RejectionKind::Parse, unknown_value(pathway)))?;
    if is_unset(stage) {
        return Err((
            "pathway_stage",
            RejectionKind::Constraint,
            format!("pathway '{kind}' has no stage"),
        ));
    }
    let stage = PathwayStage::parse(stage)
        .ok_or_else(|| ("pathway_stage", RejectionKind::Parse, unknown_value(stage)))?;

    Ok(Some(Pathway { kind, stage }))
}

fn parse_location(lat: &str, lon: &str) -> Result<Option<GeoPoint>, CellError> {
    let (lat, lon) = (lat.trim(), lon.trim());
    match (lat.is_empty(), lon.is_empty()) {
        (true, true) => return Ok(None),
        (false, true) => {
            return Err((
                "longitude",
                RejectionKind::Constraint,
                "latitude given without longitude".into(),
            ))
        }
        (true, false) => {
            return Err((
                "latitude",
                RejectionKind::Constraint,
                "longitude given without latitude".into(),
            ))
        }
        (false, false) => {}
    }

    let latitude = parse_coord("latitude", lat, 90.0)?;
    let longitude = parse_coord("longitude", lon, 180.0)?;

    Ok(Some(GeoPoint {
        latitude,
        longitude,
    }))
}

fn parse_coord(column: &'static str, s: &str, limit: f64) -> Result<f64, CellError> {
    let v = s
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| (column, RejectionKind::Parse, format!("'{s}' is not a number")))?;
    if v.abs() > limit {
        return Err((
            column,
            RejectionKind::Constraint,
            format!("{v} is not in [-{limit}, {limit}]"),
        ));
    }
    Ok(v)
}
