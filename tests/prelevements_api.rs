mod common;

use actix_web::{App, http::StatusCode, test, web};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

use common::{TestContext, client_without_bic, complete_client};
use debitdesk::adapters::http::{
  PrelevementRouteDependencies, TemplateEngine, configure_prelevement_routes,
};
use debitdesk::application::direct_debit::{
  ChangeDebitStatusUseCase, GenerateSepaFileUseCase, GetCreditorProfileUseCase,
  ListDirectDebitsUseCase,
};
use debitdesk::domain::direct_debit::DebitStatus;

fn route_deps(ctx: &TestContext) -> PrelevementRouteDependencies {
  PrelevementRouteDependencies {
    list_use_case: Arc::new(ListDirectDebitsUseCase::new(ctx.service.clone())),
    generate_use_case: Arc::new(GenerateSepaFileUseCase::new(ctx.service.clone())),
    change_status_use_case: Arc::new(ChangeDebitStatusUseCase::new(ctx.service.clone())),
    creditor_use_case: Arc::new(GetCreditorProfileUseCase::new(ctx.service.clone())),
  }
}

macro_rules! app {
  ($ctx:expr) => {{
    let deps = route_deps(&$ctx);
    let templates = TemplateEngine::new().unwrap();
    test::init_service(App::new().service(
      web::scope("/prelevements")
        .configure(move |cfg| configure_prelevement_routes(cfg, deps, templates)),
    ))
    .await
  }};
}

#[actix_web::test]
async fn test_list_returns_rows_and_totals() {
  let ctx = TestContext::new();
  let good = ctx.add_client(complete_client("Boulangerie")).await;
  let bad = ctx.add_client(client_without_bic("Garage")).await;
  ctx.add_invoice(good, "F-1", dec!(120.00)).await;
  ctx.add_invoice(bad, "F-2", dec!(80.00)).await;
  let app = app!(ctx);

  let req = test::TestRequest::get().uri("/prelevements").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;

  assert_eq!(body["status"], "pending");
  assert_eq!(body["total"], 2);
  assert_eq!(body["totalAmount"], 200.0);
  assert_eq!(body["selectableCount"], 1);
  assert_eq!(body["selectableAmount"], 120.0);
  assert_eq!(body["earliestCollectionDate"], "2024-06-12");

  let rows = body["invoices"].as_array().unwrap();
  assert_eq!(rows[0]["invoiceNumber"], "F-1");
  assert_eq!(rows[0]["hasValidSepaInfo"], true);
  assert_eq!(rows[0]["sequenceType"], "FRST");
  assert_eq!(rows[1]["hasValidSepaInfo"], false);
  assert_eq!(rows[1]["missingSepaFields"], json!(["bic"]));
}

#[actix_web::test]
async fn test_list_rejects_unknown_status() {
  let ctx = TestContext::new();
  let app = app!(ctx);

  let req = test::TestRequest::get()
    .uri("/prelevements?status=cancelled")
    .to_request();
  let resp = test::call_service(&app, req).await;

  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "validation_error");
}

#[actix_web::test]
async fn test_pain008_download() {
  let ctx = TestContext::new();
  let client = ctx.add_client(complete_client("Boulangerie")).await;
  let a = ctx.add_invoice(client, "F-1", dec!(120.00)).await;
  let app = app!(ctx);

  let req = test::TestRequest::post()
    .uri("/prelevements/pain008")
    .set_json(json!({ "invoiceIds": [a], "requestedCollectionDate": "2024-06-14" }))
    .to_request();
  let resp = test::call_service(&app, req).await;

  assert_eq!(resp.status(), StatusCode::OK);
  let headers = resp.headers();
  assert_eq!(headers.get("content-type").unwrap(), "application/xml");
  assert!(
    headers
      .get("content-disposition")
      .unwrap()
      .to_str()
      .unwrap()
      .contains("SEPA_DD_20240614.xml")
  );
  assert_eq!(headers.get("x-sepa-transactions").unwrap(), "1");
  assert_eq!(headers.get("x-sepa-control-sum").unwrap(), "120.00");
  assert!(headers.get("x-sepa-message-id").is_some());

  let body = test::read_body(resp).await;
  let xml = String::from_utf8(body.to_vec()).unwrap();
  assert!(xml.starts_with("<?xml"));
  assert!(xml.contains("<ReqdColltnDt>2024-06-14</ReqdColltnDt>"));

  assert_eq!(ctx.invoices.get(a).await.unwrap().status, DebitStatus::Pending);
}

#[actix_web::test]
async fn test_pain008_rejection_lists_invoices() {
  let ctx = TestContext::new();
  let good = ctx.add_client(complete_client("Boulangerie")).await;
  let bad = ctx.add_client(client_without_bic("Garage")).await;
  let a = ctx.add_invoice(good, "F-1", dec!(120.00)).await;
  let b = ctx.add_invoice(bad, "F-2", dec!(80.00)).await;
  let app = app!(ctx);

  let req = test::TestRequest::post()
    .uri("/prelevements/pain008")
    .set_json(json!({ "invoiceIds": [a, b] }))
    .to_request();
  let resp = test::call_service(&app, req).await;

  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "batch_rejected");
  assert!(body["message"].as_str().unwrap().contains("F-2"));

  let rejections = body["details"]["rejections"].as_array().unwrap();
  assert_eq!(rejections.len(), 1);
  assert_eq!(rejections[0]["invoiceId"], b.to_string());
  assert_eq!(rejections[0]["reason"]["kind"], "missing_sepa_fields");
  assert_eq!(rejections[0]["reason"]["fields"], json!(["bic"]));
}

#[actix_web::test]
async fn test_pain008_input_errors() {
  let ctx = TestContext::new();
  let client = ctx.add_client(complete_client("Boulangerie")).await;
  let a = ctx.add_invoice(client, "F-1", dec!(10)).await;
  let app = app!(ctx);

  let cases = [
    json!({ "invoiceIds": [] }),
    json!({ "invoiceIds": [Uuid::new_v4()] }),
    json!({ "invoiceIds": [a], "requestedCollectionDate": "2024-06-11" }),
    json!({ "invoiceIds": "nope" }),
  ];

  for payload in cases {
    let req = test::TestRequest::post()
      .uri("/prelevements/pain008")
      .set_json(&payload)
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
  }
}

#[actix_web::test]
async fn test_status_action() {
  let ctx = TestContext::new();
  let client = ctx.add_client(complete_client("Boulangerie")).await;
  let a = ctx.add_invoice(client, "F-1", dec!(10)).await;
  let b = ctx.add_invoice(client, "F-2", dec!(20)).await;
  let app = app!(ctx);

  let req = test::TestRequest::post()
    .uri("/prelevements")
    .set_json(json!({ "invoiceIds": [a], "action": "mark_exported" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["action"], "mark_exported");
  assert_eq!(body["updated"], json!([a]));

  let req = test::TestRequest::post()
    .uri("/prelevements")
    .set_json(json!({ "invoiceIds": [a, b], "action": "mark_paid" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["updated"], json!([a]));
  assert_eq!(body["skipped"], json!([{ "id": b, "status": "pending" }]));

  let req = test::TestRequest::post()
    .uri("/prelevements")
    .set_json(json!({ "invoiceIds": [a], "action": "cancel" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::get()
    .uri("/prelevements?status=paid")
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["total"], 1);
}

#[actix_web::test]
async fn test_creditor_iban_is_masked() {
  let ctx = TestContext::new();
  let app = app!(ctx);

  let req = test::TestRequest::get()
    .uri("/prelevements/creditor")
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;

  assert_eq!(body["creditorIdentifier"], "FR72ZZZ123456");
  assert_eq!(body["bic"], "AGRIFRPP");
  assert_eq!(body["leadDays"], 2);
  let iban = body["iban"].as_str().unwrap();
  assert!(iban.starts_with("FR**"));
  assert!(iban.ends_with("189"));
  assert!(!iban.contains("30006"));
}

#[actix_web::test]
async fn test_board_page_and_export() {
  let ctx = TestContext::new();
  let good = ctx.add_client(complete_client("Garage Müller & Fils")).await;
  let bad = ctx.add_client(client_without_bic("Café du Port")).await;
  let a = ctx.add_invoice(good, "F-1", dec!(120.00)).await;
  let b = ctx.add_invoice(bad, "F-2", dec!(80.00)).await;
  let app = app!(ctx);

  let req = test::TestRequest::get()
    .uri("/prelevements/board")
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
  assert!(html.contains("F-1"));
  assert!(html.contains("Müller &amp; Fils"));
  assert!(html.contains(&a.to_string()));

  // The incomplete invoice cannot be selected
  let req = test::TestRequest::post()
    .uri("/prelevements/board/export")
    .insert_header(("content-type", "application/x-www-form-urlencoded"))
    .set_payload(format!("status=pending&invoice_id={}&invoice_id={}", a, b))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
  assert!(html.contains(&b.to_string()));

  let req = test::TestRequest::post()
    .uri("/prelevements/board/export")
    .insert_header(("content-type", "application/x-www-form-urlencoded"))
    .set_payload(format!(
      "status=pending&invoice_id={}&collection_date=2024-06-14",
      a
    ))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers().get("x-sepa-transactions").unwrap(), "1");
}

#[actix_web::test]
async fn test_board_status_actions() {
  let ctx = TestContext::new();
  let client = ctx.add_client(complete_client("Boulangerie")).await;
  let a = ctx.add_invoice(client, "F-1", dec!(120.00)).await;
  let b = ctx.add_invoice(client, "F-2", dec!(80.00)).await;
  let app = app!(ctx);

  let req = test::TestRequest::get()
    .uri("/prelevements/board")
    .to_request();
  let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
  assert!(html.contains("value=\"mark_exported\""));
  assert!(!html.contains("value=\"mark_paid\""));

  // Confirm the download of F-1
  let req = test::TestRequest::post()
    .uri("/prelevements/board/status")
    .insert_header(("content-type", "application/x-www-form-urlencoded"))
    .set_payload(format!("status=pending&invoice_id={}&action=mark_exported", a))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
  assert!(html.contains("1 facture(s) mise(s) à jour"));
  assert_eq!(ctx.invoices.get(a).await.unwrap().status, DebitStatus::Exported);
  assert_eq!(ctx.invoices.get(b).await.unwrap().status, DebitStatus::Pending);

  let req = test::TestRequest::get()
    .uri("/prelevements/board?status=exported")
    .to_request();
  let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
  assert!(html.contains("F-1"));
  assert!(html.contains("value=\"mark_paid\""));
  assert!(html.contains("value=\"mark_executed\""));

  let req = test::TestRequest::post()
    .uri("/prelevements/board/status")
    .insert_header(("content-type", "application/x-www-form-urlencoded"))
    .set_payload(format!("status=exported&invoice_id={}&action=mark_paid", a))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(ctx.invoices.get(a).await.unwrap().status, DebitStatus::Paid);

  // Nothing checked, or an unknown action, re-renders with an error
  for payload in [
    "status=pending&action=mark_exported".to_string(),
    format!("status=pending&invoice_id={}&action=cancel", b),
  ] {
    let req = test::TestRequest::post()
      .uri("/prelevements/board/status")
      .insert_header(("content-type", "application/x-www-form-urlencoded"))
      .set_payload(payload)
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Opération refusée"));
  }
  assert_eq!(ctx.invoices.get(b).await.unwrap().status, DebitStatus::Pending);
}
