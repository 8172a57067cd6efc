use crate::aggregate::KpiValue;
use crate::domain::record::PathwayStage;
use crate::domain::RenderSnapshot;
use crate::errors::ServerError;
use crate::filters::FilteredView;
use crate::store::raw::COLUMNS;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

fn xlsx_err(what: &str) -> impl Fn(XlsxError) -> ServerError + '_ {
    move |e| ServerError::XlsxError(format!("Failed to write {what}: {e}"))
}

fn new_sheet<'a>(workbook: &'a mut Workbook, name: &str) -> Result<&'a mut Worksheet, ServerError> {
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(name).map_err(xlsx_err("sheet name"))?;
    Ok(worksheet)
}

fn write_headers(worksheet: &mut Worksheet, headers: &[&str]) -> Result<(), ServerError> {
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| {
                ServerError::XlsxError(format!("Failed to write header '{}': {}", header, e))
            })?;
    }
    Ok(())
}

fn write_kpi(worksheet: &mut Worksheet, r: u32, col: u16, value: KpiValue) -> Result<(), ServerError> {
    match value.as_f64() {
        Some(v) => worksheet.write_number(r, col, v).map(|_| ()),
        None => worksheet.write_string(r, col, KpiValue::NA).map(|_| ()),
    }
    .map_err(xlsx_err("indicator value"))
}

/// Builds the export workbook for one render: the filtered records plus
/// the summary tables, all from the same snapshot.
pub fn dashboard_workbook(
    view: &FilteredView<'_>,
    snapshot: &RenderSnapshot,
) -> Result<Workbook, ServerError> {
    let mut workbook = Workbook::new();

    write_raw_data(&mut workbook, view)?;
    write_regional_summary(&mut workbook, snapshot)?;
    write_pathway_progress(&mut workbook, snapshot)?;
    write_region_stage_progress(&mut workbook, snapshot)?;
    write_monthly_trends(&mut workbook, snapshot)?;
    write_kpis(&mut workbook, snapshot)?;

    Ok(workbook)
}

fn write_raw_data(workbook: &mut Workbook, view: &FilteredView<'_>) -> Result<(), ServerError> {
    let worksheet = new_sheet(workbook, "Raw Data")?;
    write_headers(worksheet, &COLUMNS)?;

    for (i, rec) in view.iter().enumerate() {
        let r = (i + 1) as u32;
        let date = rec.registration_date.format("%Y-%m-%d").to_string();
        let pathway = rec.solutions_pathway().map_or("", |p| p.label());
        let stage = rec.pathway_stage().map_or("N/A", |s| s.label());

        let text_cells: [(u16, &str); 11] = [
            (0, rec.id.as_str()),
            (1, date.as_str()),
            (2, rec.region.as_str()),
            (3, rec.district.as_str()),
            (4, rec.displacement_status.label()),
            (5, pathway),
            (6, stage),
            (8, rec.gender_hoh.label()),
            (9, rec.shelter_status.label()),
            (10, if rec.livelihood_support { "Yes" } else { "No" }),
            (11, rec.documentation_status.label()),
        ];
        for (col, value) in text_cells {
            worksheet
                .write_string(r, col, value)
                .map_err(xlsx_err(COLUMNS[col as usize]))?;
        }

        worksheet
            .write_number(r, 7, f64::from(rec.household_size))
            .map_err(xlsx_err("household_size"))?;

        if let Some(point) = rec.location {
            worksheet
                .write_number(r, 12, point.latitude)
                .map_err(xlsx_err("latitude"))?;
            worksheet
                .write_number(r, 13, point.longitude)
                .map_err(xlsx_err("longitude"))?;
        }
    }
    Ok(())
}

fn write_regional_summary(workbook: &mut Workbook, snapshot: &RenderSnapshot) -> Result<(), ServerError> {
    let worksheet = new_sheet(workbook, "Regional Summary")?;
    write_headers(
        worksheet,
        &[
            "Region",
            "Beneficiaries",
            "Individuals",
            "Female HoH",
            "Achieved",
            "Livelihood Support",
            "Achievement Rate (%)",
            "Female HoH Rate (%)",
        ],
    )?;

    for (i, row) in snapshot.regional_summary.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet
            .write_string(r, 0, &row.region)
            .map_err(xlsx_err("region"))?;
        let numbers = [
            row.beneficiaries as f64,
            row.individuals as f64,
            row.female_hoh as f64,
            row.achieved as f64,
            row.livelihood_support as f64,
            row.achievement_rate,
            row.female_hoh_rate,
        ];
        for (offset, value) in numbers.into_iter().enumerate() {
            worksheet
                .write_number(r, 1 + offset as u16, value)
                .map_err(xlsx_err("regional figure"))?;
        }
    }
    Ok(())
}

fn write_pathway_progress(workbook: &mut Workbook, snapshot: &RenderSnapshot) -> Result<(), ServerError> {
    let worksheet = new_sheet(workbook, "Pathway Progress")?;
    let mut headers = vec!["Pathway"];
    headers.extend(PathwayStage::ALL.iter().map(|s| s.label()));
    headers.extend(["Total", "Achievement Rate (%)"]);
    write_headers(worksheet, &headers)?;

    for (i, row) in snapshot.pathway_progress.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet
            .write_string(r, 0, row.pathway.label())
            .map_err(xlsx_err("pathway"))?;

        let mut col = 1u16;
        for stage in PathwayStage::ALL {
            let n = row.by_stage.get(stage).copied().unwrap_or(0);
            worksheet
                .write_number(r, col, n as f64)
                .map_err(xlsx_err("stage count"))?;
            col += 1;
        }
        worksheet
            .write_number(r, col, row.total as f64)
            .map_err(xlsx_err("pathway total"))?;
        write_kpi(worksheet, r, col + 1, row.achievement_rate)?;
    }
    Ok(())
}

fn write_region_stage_progress(
    workbook: &mut Workbook,
    snapshot: &RenderSnapshot,
) -> Result<(), ServerError> {
    let worksheet = new_sheet(workbook, "Progress by Region")?;
    let mut headers = vec!["Region"];
    headers.extend(PathwayStage::ALL.iter().map(|s| s.label()));
    headers.push("Total");
    write_headers(worksheet, &headers)?;

    for (i, row) in snapshot.region_stage_progress.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet
            .write_string(r, 0, &row.region)
            .map_err(xlsx_err("region"))?;

        let counts = PathwayStage::ALL
            .iter()
            .map(|stage| row.by_stage.get(stage).copied().unwrap_or(0))
            .chain([row.total]);
        for (offset, n) in counts.enumerate() {
            worksheet
                .write_number(r, 1 + offset as u16, n as f64)
                .map_err(xlsx_err("region stage count"))?;
        }
    }
    Ok(())
}

fn write_monthly_trends(workbook: &mut Workbook, snapshot: &RenderSnapshot) -> Result<(), ServerError> {
    let worksheet = new_sheet(workbook, "Monthly Trends")?;
    write_headers(worksheet, &["Month", "Registrations", "Cumulative"])?;

    for (i, point) in snapshot.monthly_trends.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet
            .write_string(r, 0, &point.month)
            .map_err(xlsx_err("month"))?;
        worksheet
            .write_number(r, 1, point.registrations as f64)
            .map_err(xlsx_err("registrations"))?;
        worksheet
            .write_number(r, 2, point.cumulative as f64)
            .map_err(xlsx_err("cumulative"))?;
    }
    Ok(())
}

fn write_kpis(workbook: &mut Workbook, snapshot: &RenderSnapshot) -> Result<(), ServerError> {
    let worksheet = new_sheet(workbook, "KPIs")?;
    write_headers(worksheet, &["Indicator", "Value"])?;

    let mut r = 1u32;
    for (name, value) in snapshot.kpis.iter() {
        worksheet
            .write_string(r, 0, name)
            .map_err(xlsx_err("indicator name"))?;
        write_kpi(worksheet, r, 1, value)?;
        r += 1;
    }
    worksheet
        .write_string(r, 0, "excluded_from_map")
        .map_err(xlsx_err("indicator name"))?;
    worksheet
        .write_number(r, 1, snapshot.excluded_from_map as f64)
        .map_err(xlsx_err("indicator value"))?;
    Ok(())
}
