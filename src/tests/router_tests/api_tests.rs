use crate::assembler::RenderSettings;
use crate::errors::ServerError;
use crate::responses::error_to_response;
use crate::router::handle;
use crate::state::AppState;
use crate::store::Strictness;
use crate::tests::utils::{body_json, csv_of, request, store_from_rows, test_state};
use http::Method;

#[test]
fn snapshot_without_params_covers_the_whole_dataset() {
    let (state, _file) = test_state();

    let resp = handle(request(Method::GET, "/api/snapshot"), &state).expect("Handler failed");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["Content-Type"], "application/json");

    let json = body_json(resp);
    assert_eq!(json["matched"], 48);
    assert_eq!(json["kpis"]["total_beneficiaries"], 48);
    assert_eq!(json["excluded_from_map"], 5);
    assert!(json["flow_edges"].as_array().is_some_and(|e| !e.is_empty()));
}

#[test]
fn snapshot_applies_repeated_and_comma_separated_params() {
    let (state, _file) = test_state();
    let store = state.store();
    let expected = store
        .all_records()
        .iter()
        .filter(|r| (r.region == "Bay" || r.region == "Gedo") && r.solutions_pathway().is_some())
        .count();

    let req = request(
        Method::GET,
        "/api/snapshot?region=Bay&region=Gedo&pathway=Return,Local%20Integration,relocation",
    );
    let json = body_json(handle(req, &state).expect("Handler failed"));

    assert_eq!(json["matched"], expected);
    assert_eq!(json["selection"]["regions"], serde_json::json!(["Bay", "Gedo"]));
}

#[test]
fn empty_selection_reports_na_rather_than_failing() {
    let (state, _file) = test_state();

    let req = request(Method::GET, "/api/snapshot?region=Nowhere");
    let json = body_json(handle(req, &state).expect("Handler failed"));

    assert_eq!(json["matched"], 0);
    assert_eq!(json["kpis"]["pct_achieved"], "N/A");
    assert_eq!(json["clusters"], serde_json::json!([]));
}

#[test]
fn unknown_filter_value_is_a_bad_request() {
    let (state, _file) = test_state();

    for uri in [
        "/api/snapshot?pathway=Teleport",
        "/api/snapshot?from=2024-13-01",
        "/api/snapshot?hh_min=three",
        "/api/snapshot?quick=everything",
        "/api/snapshot?livelihood=maybe",
    ] {
        let err = handle(request(Method::GET, uri), &state).err().expect("expected an error");
        assert!(matches!(err, ServerError::BadRequest(_)), "{uri} gave {err:?}");

        let resp = error_to_response(err);
        assert_eq!(resp.status(), 400);
        assert_eq!(body_json(resp)["status"], 400);
    }
}

#[test]
fn unknown_route_is_not_found() {
    let (state, _file) = test_state();

    let err = handle(request(Method::GET, "/nope"), &state).err().expect("expected an error");
    assert!(matches!(err, ServerError::NotFound));
    assert_eq!(error_to_response(err).status(), 404);

    // Reload only answers POST.
    let err = handle(request(Method::GET, "/api/reload"), &state).err().expect("expected an error");
    assert!(matches!(err, ServerError::NotFound));
}

#[test]
fn options_list_regions_and_bounds() {
    let (state, _file) = test_state();

    let json = body_json(handle(request(Method::GET, "/api/options"), &state).unwrap());

    assert_eq!(json["total_records"], 48);
    assert_eq!(json["regions"][0], "Banadir");
    assert!(json["districts_by_region"]["Bay"]
        .as_array()
        .is_some_and(|d| d.iter().any(|v| v == "Baidoa")));
    assert_eq!(json["pathways"], serde_json::json!(["Return", "Local Integration", "Relocation"]));
}

#[test]
fn dataset_summary_lists_rejected_rows() {
    let (state, _file) = test_state();

    let json = body_json(handle(request(Method::GET, "/api/dataset"), &state).unwrap());

    assert_eq!(json["records"], 48);
    assert_eq!(json["rejected"], 2);
    assert_eq!(json["rejections"][0]["row"], 49);
    assert_eq!(json["rejections"][0]["column"], "registration_date");
    assert_eq!(json["schema"][0], "beneficiary_id");
}

#[test]
fn compare_reports_both_windows() {
    let (state, _file) = test_state();

    let req = request(
        Method::GET,
        "/api/compare?from=2024-01-01&to=2024-12-31&prev_from=2023-01-01&prev_to=2023-12-31",
    );
    let json = body_json(handle(req, &state).expect("Handler failed"));

    let current = json["current"]["beneficiaries"].as_i64().unwrap();
    let previous = json["previous"]["beneficiaries"].as_i64().unwrap();
    assert_eq!(current + previous, 48);
    assert_eq!(json["beneficiary_change"].as_i64().unwrap(), current - previous);
}

#[test]
fn reload_swaps_in_the_rewritten_file() {
    let (state, file) = test_state();
    let before = state.store();

    std::fs::write(
        file.path(),
        csv_of(&[
            "N1,2024-05-01,Bay,Baidoa,IDP,Return,Planning,3,Female,Emergency,Yes,Partial,3.11,43.65",
            "N2,2024-05-02,Bay,Baidoa,Returnee,,,2,Male,Permanent,No,Complete,,",
        ]),
    )
    .unwrap();

    let json = body_json(handle(request(Method::POST, "/api/reload"), &state).unwrap());
    assert_eq!(json["records"], 2);
    assert_eq!(json["rejected"], 0);
    assert_eq!(state.store().len(), 2);

    // A render that already held the old dataset keeps it.
    assert_eq!(before.len(), 48);
}

#[test]
fn failed_reload_keeps_the_old_dataset() {
    let (state, file) = test_state();

    std::fs::write(file.path(), "id,date\n1,2024-01-01\n").unwrap();

    let err = handle(request(Method::POST, "/api/reload"), &state).err().expect("expected an error");
    assert!(matches!(err, ServerError::Load(_)));
    assert_eq!(error_to_response(err).status(), 500);
    assert_eq!(state.store().len(), 48);
}

#[test]
fn region_names_with_commas_are_matched_whole() {
    let store = store_from_rows(&[
        "C1,2024-01-10,\"Banadir, North\",Karaan,IDP,Return,Planning,5,Female,Emergency,Yes,Partial,2.07,45.36",
        "C2,2024-01-11,Banadir,Hodan,IDP,Return,Achieved,4,Male,Permanent,No,Complete,2.03,45.30",
        "C3,2024-01-12,North,Hodan,Returnee,,,2,Male,Permanent,No,Complete,,",
    ]);
    let state = AppState::new(store, "unused.csv", Strictness::Lenient, RenderSettings::default());

    let req = request(Method::GET, "/api/snapshot?region=Banadir%2C%20North");
    let json = body_json(handle(req, &state).expect("Handler failed"));

    assert_eq!(json["matched"], 1);
    assert_eq!(json["selection"]["regions"], serde_json::json!(["Banadir, North"]));
}

#[test]
fn reload_accepts_a_file_whose_only_rows_break_rules() {
    let (state, file) = test_state();

    std::fs::write(
        file.path(),
        csv_of(&["F1,2999-06-01,Bay,Baidoa,IDP,Return,Planning,3,Female,Emergency,Yes,Partial,3.11,43.65"]),
    )
    .unwrap();

    let json = body_json(handle(request(Method::POST, "/api/reload"), &state).expect("Handler failed"));
    assert_eq!(json["records"], 0);
    assert_eq!(json["rejected"], 1);
    assert_eq!(json["rejections"][0]["kind"], "constraint");
    assert!(state.store().is_empty());
}

#[test]
fn snapshot_carries_heat_points_and_region_stage_table() {
    let (state, _file) = test_state();

    let json = body_json(handle(request(Method::GET, "/api/snapshot"), &state).unwrap());

    let heat = json["heat_points"].as_array().unwrap();
    assert_eq!(heat.len(), 48 - 5);
    assert!(heat.iter().all(|p| p["weight"].as_u64().is_some_and(|w| w >= 1)));
    let rows = json["region_stage_progress"].as_array().unwrap();
    assert!(rows.iter().all(|r| r["by_stage"]["Achieved"].is_u64()));
    assert!(json["kpis"]["documentation_complete"].is_u64());
}
