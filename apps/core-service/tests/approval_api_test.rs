//! 内部 API のルーティングテスト
//!
//! モックで組み立てたルーターに `oneshot` でリクエストを送り、
//! ステータス・レスポンス形状・ヘッダーを確認する。

use axum::{
    Router,
    body::{Body, to_bytes},
};
use http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use signflow_core_service::test_utils::ApprovalTestBuilder;
use tower::ServiceExt;

fn builder() -> ApprovalTestBuilder {
    ApprovalTestBuilder::new()
        .with_member("dana", "Dana")
        .with_member("alice", "Alice")
        .with_member("mallory", "Mallory")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// dana が Alice 宛てに提出し、文書番号を返す
async fn submit(app: &Router, form_no: &str, attachments: Value) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/internal/approvals/submit",
            json!({
                "actor_id": "dana",
                "form_no": form_no,
                "title": "備品購入の件",
                "body": "<p>モニター 2 台</p>",
                "signers": ["Alice"],
                "attachments": attachments,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["approval_no"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_submit_draft_提出した文書を取得できる() {
    // Arrange
    let builder = builder();
    let form = builder.add_form("購買申請", &[]);
    let app = builder.build_app();

    // Act
    let approval_no = submit(&app, &form.form_no().to_string(), json!([])).await;
    let (status, body) = send(
        &app,
        get(&format!("/internal/approvals/{approval_no}?actor_id=alice")),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["approval_no"], approval_no);
    assert_eq!(data["status"], "in_progress");
    assert_eq!(data["title"], "備品購入の件");
    assert_eq!(data["form_title"], "購買申請");
    assert_eq!(data["next_signer"], "Alice");
    assert_eq!(data["drafter"]["name"], "Dana");
    assert_eq!(data["signers"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_approve_現在の決裁者以外は403() {
    // Arrange
    let builder = builder();
    let form = builder.add_form("購買申請", &[]);
    let app = builder.build_app();
    let approval_no = submit(&app, &form.form_no().to_string(), json!([])).await;

    // Act
    let (status, body) = send(
        &app,
        post_json(
            &format!("/internal/approvals/{approval_no}/approve"),
            json!({ "actor_id": "mallory" }),
        ),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["type"],
        "https://signflow.example.com/errors/not-current-signer"
    );
}

#[tokio::test]
async fn test_approve_決裁すると完了状態を返す() {
    let builder = builder();
    let form = builder.add_form("購買申請", &[]);
    let app = builder.build_app();
    let approval_no = submit(&app, &form.form_no().to_string(), json!([])).await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/internal/approvals/{approval_no}/approve"),
            json!({ "actor_id": "alice" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["status_label"], "完了");
}

#[tokio::test]
async fn test_download_attachment_元のファイル名で返す() {
    // Arrange
    let builder = builder();
    let form = builder.add_form("購買申請", &[]);
    let app = builder.build_app();
    let approval_no = submit(
        &app,
        &form.form_no().to_string(),
        json!([{ "file_name": "見積書.pdf", "content_base64": "cXVvdGU=" }]),
    )
    .await;

    // Act
    let response = app
        .clone()
        .oneshot(get(&format!(
            "/internal/approvals/{approval_no}/attachments/drafter1?actor_id=alice"
        )))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename*=UTF-8''%E8%A6%8B%E7%A9%8D%E6%9B%B8.pdf"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), b"quote");
}

#[tokio::test]
async fn test_download_attachment_不明なスロットは404() {
    let builder = builder();
    let form = builder.add_form("購買申請", &[]);
    let app = builder.build_app();
    let approval_no = submit(&app, &form.form_no().to_string(), json!([])).await;

    let (status, body) = send(
        &app,
        get(&format!(
            "/internal/approvals/{approval_no}/attachments/drafter9?actor_id=dana"
        )),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["type"],
        "https://signflow.example.com/errors/invalid-attachment-slot"
    );
}

#[tokio::test]
async fn test_list_approvals_ページ情報付きで返す() {
    // Arrange
    let builder = builder();
    let form = builder.add_form("購買申請", &[]);
    let app = builder.build_app();
    submit(&app, &form.form_no().to_string(), json!([])).await;

    // Act
    let (status, body) = send(
        &app,
        get("/internal/approvals?actor_id=dana&view=in-progress&keyword=%E5%82%99%E5%93%81"),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], 0);
    assert_eq!(body["size"], 15);
    assert_eq!(body["data"][0]["title"], "備品購入の件");
    assert_eq!(body["data"][0]["current_signer"], "Alice");
}

#[tokio::test]
async fn test_list_approvals_不明なビューは400() {
    let app = builder().build_app();

    let (status, _) = send(&app, get("/internal/approvals?actor_id=dana&view=archived")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_form_作成した様式が一覧に出る() {
    // Arrange
    let app = builder().build_app();

    // Act
    let (status, created) = send(
        &app,
        post_json(
            "/internal/forms",
            json!({
                "actor_id": "admin",
                "form_type": "経費",
                "title": "経費精算",
                "signers": ["Alice"],
            }),
        ),
    )
    .await;
    let (_, list) = send(&app, get("/internal/forms")).await;
    let form_no = created["data"]["form_no"].as_str().unwrap();
    let (_, detail) = send(&app, get(&format!("/internal/forms/{form_no}"))).await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(list["data"][0]["title"], "経費精算");
    assert_eq!(detail["data"]["signers"][0]["slot"], 1);
    assert_eq!(detail["data"]["signers"][0]["member_id"], "alice");
    assert_eq!(detail["data"]["signers"][0]["department"], "総務部");
}

#[tokio::test]
async fn test_dashboard_counts_起案文書の件数を返す() {
    let builder = builder();
    let form = builder.add_form("購買申請", &[]);
    let app = builder.build_app();
    submit(&app, &form.form_no().to_string(), json!([])).await;

    let (status, body) = send(&app, get("/internal/dashboard/counts?actor_id=dana")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({ "total": 1, "in_progress": 1, "completed": 0 })
    );
}

#[tokio::test]
async fn test_health_check_x_request_idを付けて返す() {
    let app = builder().build_app();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
