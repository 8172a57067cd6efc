use crate::router::handle;
use crate::tests::utils::{request, test_state};
use http::Method;
use std::io::Read;

#[test]
fn export_returns_an_xlsx_attachment() {
    let (state, _file) = test_state();

    let resp = handle(request(Method::GET, "/export.xlsx?region=Bay"), &state)
        .expect("Handler failed");

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["Content-Type"],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = resp.headers()["Content-Disposition"].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"solutions_dashboard_"));
    assert!(disposition.ends_with(".xlsx\""));

    let mut bytes = Vec::new();
    resp.into_body().reader().read_to_end(&mut bytes).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn export_rejects_bad_params_like_the_snapshot() {
    let (state, _file) = test_state();

    assert!(handle(request(Method::GET, "/export.xlsx?stage=Done"), &state).is_err());
}
