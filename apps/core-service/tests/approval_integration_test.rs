//! 決裁フローの統合テスト
//!
//! ApprovalTestBuilder で組み立てたユースケースを、起案から完了・却下・取り消しまで通しで操作する。

use bytes::Bytes;
use pretty_assertions::assert_eq;
use signflow_core_service::{
    error::CoreError,
    test_utils::{ApprovalTestBuilder, ApprovalTestSetup},
    usecase::{CommentInput, DraftInput, UploadedFile},
};
use signflow_domain::{
    approval::{ApprovalError, ApprovalNo, ApprovalStatus, AttachmentSlot, SignerNames},
    member::MemberId,
    value_objects::{MemberName, ReferenceNames},
};

fn id(raw: &str) -> MemberId {
    MemberId::new(raw).unwrap()
}

fn builder() -> ApprovalTestBuilder {
    ApprovalTestBuilder::new()
        .with_member("dana", "Dana")
        .with_member("alice", "Alice")
        .with_member("bob", "Bob")
        .with_member("carol", "Carol")
        .with_member("erin", "Erin")
        .with_member("mallory", "Mallory")
}

fn file(name: &str) -> UploadedFile {
    UploadedFile {
        file_name: name.to_string(),
        content:   Bytes::from(name.to_string()),
    }
}

/// dana が `signers` の決裁ラインと参照者 Erin で提出する
async fn submit(builder: &ApprovalTestBuilder, setup: &ApprovalTestSetup, signers: &[&str]) -> ApprovalNo {
    let form = builder.add_form("稟議書", &[]);
    let mut names = SignerNames::default();
    for (slot, name) in names.iter_mut().zip(signers) {
        *slot = Some(MemberName::new(*name).unwrap());
    }
    setup
        .approval
        .submit_draft(DraftInput {
            actor_id:    id("dana"),
            approval_no: None,
            form_no:     form.form_no().clone(),
            title:       "新規取引先との契約".to_string(),
            body:        "<p>契約書を添付します</p>".to_string(),
            signers:     names,
            references:  ReferenceNames::parse("Erin").unwrap(),
            attachments: Vec::new(),
        })
        .await
        .unwrap()
}

fn comment(actor: &str, approval_no: &ApprovalNo, text: &str, attachment: Option<&str>) -> CommentInput {
    CommentInput {
        actor_id:    id(actor),
        approval_no: approval_no.clone(),
        text:        text.to_string(),
        attachment:  attachment.map(file),
    }
}

fn approval_error(result: Result<impl std::fmt::Debug, CoreError>) -> ApprovalError {
    match result {
        Err(CoreError::Approval(e)) => e,
        other => panic!("Approval エラーを期待したが {:?} を受信", other),
    }
}

#[tokio::test]
async fn test_approve_全員が決裁すると完了する() {
    // Arrange
    let builder = builder();
    let setup = builder.build();
    let approval_no = submit(&builder, &setup, &["Alice", "Bob"]).await;

    // Act
    let after_alice = setup
        .approval
        .approve(&id("alice"), &approval_no)
        .await
        .unwrap();
    let after_bob = setup
        .approval
        .approve(&id("bob"), &approval_no)
        .await
        .unwrap();

    // Assert
    let slots = after_alice.signers().slots();
    assert_eq!(slots[0].acted_at(), Some(builder.now()));
    assert_eq!(after_alice.next_signer().map(MemberName::as_str), Some("Bob"));
    assert_eq!(after_alice.status(), ApprovalStatus::InProgress);

    assert_eq!(after_bob.signers().slots()[1].acted_at(), Some(builder.now()));
    assert_eq!(after_bob.next_signer(), None);
    assert_eq!(after_bob.status(), ApprovalStatus::Completed);
    assert_eq!(after_bob.ended_at(), Some(builder.now()));
}

#[tokio::test]
async fn test_reject_却下後は後続の決裁者が決裁できない() {
    // Arrange
    let builder = builder();
    let setup = builder.build();
    let approval_no = submit(&builder, &setup, &["Alice", "Bob", "Carol"]).await;
    setup
        .approval
        .approve(&id("alice"), &approval_no)
        .await
        .unwrap();

    // Act
    let rejected = setup
        .approval
        .reject(&id("bob"), &approval_no)
        .await
        .unwrap();
    let carol = setup.approval.approve(&id("carol"), &approval_no).await;

    // Assert
    assert_eq!(rejected.status(), ApprovalStatus::Rejected);
    let slots = rejected.signers().slots();
    assert!(slots[1].has_acted());
    assert!(!slots[2].has_acted());
    assert_eq!(rejected.next_signer(), None);
    assert_eq!(rejected.current_signer().map(MemberName::as_str), Some("Bob"));
    assert_eq!(approval_error(carol), ApprovalError::NotCurrentSigner);
}

#[tokio::test]
async fn test_cancel_最初の決裁前なら下書きに戻せる() {
    // Arrange
    let builder = builder();
    let setup = builder.build();
    let approval_no = submit(&builder, &setup, &["Alice", "Bob"]).await;

    // Act
    let cancelled = setup
        .approval
        .cancel(&id("dana"), &approval_no)
        .await
        .unwrap();

    // Assert
    assert_eq!(cancelled.status(), ApprovalStatus::Draft);
    assert_eq!(cancelled.next_signer(), None);
    assert_eq!(cancelled.started_at(), None);
    assert_eq!(cancelled.ended_at(), None);
}

#[tokio::test]
async fn test_cancel_最初の決裁後はalready_progressed() {
    // Arrange
    let builder = builder();
    let setup = builder.build();
    let approval_no = submit(&builder, &setup, &["Alice", "Bob"]).await;
    setup
        .approval
        .approve(&id("alice"), &approval_no)
        .await
        .unwrap();

    // Act
    let result = setup.approval.cancel(&id("dana"), &approval_no).await;

    // Assert
    assert_eq!(approval_error(result), ApprovalError::AlreadyProgressed);
    assert_eq!(
        setup.documents.get(&approval_no).unwrap().status(),
        ApprovalStatus::InProgress
    );
}

#[tokio::test]
async fn test_add_comment_役割ごとの欄に書き込まれる() {
    // Arrange
    let builder = builder();
    let setup = builder.build();
    let approval_no = submit(&builder, &setup, &["Alice", "Bob"]).await;

    // Act
    for (actor, text) in [("dana", "起案者より"), ("alice", "決裁者より"), ("erin", "参照者より")] {
        setup
            .approval
            .add_comment(comment(actor, &approval_no, text, None))
            .await
            .unwrap();
    }
    let mallory = setup
        .approval
        .add_comment(comment("mallory", &approval_no, "部外者より", None))
        .await;

    // Assert
    let view = setup
        .approval
        .get_approval(&id("dana"), &approval_no)
        .await
        .unwrap();
    assert_eq!(view.detail.drafter_remark(), Some("起案者より"));
    assert_eq!(view.detail.reference_remark(), Some("参照者より"));
    let slots = view.document.signers().slots();
    assert_eq!(slots[0].remark(), Some("決裁者より"));
    assert_eq!(slots[1].remark(), None);
    assert_eq!(approval_error(mallory), ApprovalError::NoCommentPermission);
}

#[tokio::test]
async fn test_add_comment_起案者の添付は5件まで() {
    // Arrange
    let builder = builder();
    let setup = builder.build();
    let approval_no = submit(&builder, &setup, &["Alice"]).await;

    // Act
    for n in 1..=5 {
        setup
            .approval
            .add_comment(comment(
                "dana",
                &approval_no,
                "資料を追加します",
                Some(&format!("資料{n}.pdf")),
            ))
            .await
            .unwrap();
    }
    let sixth = setup
        .approval
        .add_comment(comment("dana", &approval_no, "もう1件", Some("資料6.pdf")))
        .await;

    // Assert
    assert_eq!(approval_error(sixth), ApprovalError::AttachmentSlotsFull);
    let detail = setup.details.get(&approval_no).unwrap();
    for index in 0..5 {
        assert!(detail.attachment(AttachmentSlot::Drafter(index)).is_some());
    }
    assert_eq!(setup.storage.paths().len(), 5);
}

#[tokio::test]
async fn test_add_comment_決裁者の添付は文書ごとに1件() {
    // Arrange
    let builder = builder();
    let setup = builder.build();
    let approval_no = submit(&builder, &setup, &["Alice", "Bob"]).await;
    setup
        .approval
        .add_comment(comment("alice", &approval_no, "見積を添付", Some("見積.xlsx")))
        .await
        .unwrap();
    setup
        .approval
        .approve(&id("alice"), &approval_no)
        .await
        .unwrap();

    // Act
    let bob = setup
        .approval
        .add_comment(comment("bob", &approval_no, "追加資料", Some("追加.xlsx")))
        .await;

    // Assert
    assert_eq!(approval_error(bob), ApprovalError::SignerAttachmentExists);
    let file = setup
        .approval
        .download_attachment(&id("bob"), &approval_no, AttachmentSlot::Signer)
        .await
        .unwrap();
    assert_eq!(file.file_name, "見積.xlsx");
    assert_eq!(setup.storage.paths().len(), 1);
}

#[tokio::test]
async fn test_my_pending_決裁が進むと次の決裁者に移る() {
    // Arrange
    let builder = builder();
    let setup = builder.build();
    let approval_no = submit(&builder, &setup, &["Alice", "Bob"]).await;

    // Act
    let alice_before = setup.dashboard.my_pending(&id("alice")).await.unwrap();
    setup
        .approval
        .approve(&id("alice"), &approval_no)
        .await
        .unwrap();
    let alice_after = setup.dashboard.my_pending(&id("alice")).await.unwrap();
    let bob_after = setup.dashboard.my_pending(&id("bob")).await.unwrap();

    // Assert
    assert_eq!(alice_before.len(), 1);
    assert!(alice_after.is_empty());
    assert_eq!(bob_after.len(), 1);
    assert_eq!(bob_after[0].approval_no, approval_no);
}
