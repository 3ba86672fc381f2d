//! # Vault Tier Tests (T0-T3)
//!
//! ## Tiers
//! - T0: Upload and initial version
//! - T1: One-shot risk assessment attach
//! - T2: Change-driven versioning
//! - T3: Retrieval, deletion and persistence

use riskvault_core::{
    AttachOutcome, CategoryScore, CollectionName, DeleteOutcome, DocumentStore, FileName, Filter,
    GetOutcome, RiskAssessment, SaveOutcome, UploadOutcome, Vault, VaultError, VersionName,
};

fn ns() -> CollectionName {
    CollectionName::new("ns")
}

fn f1() -> FileName {
    FileName::new("f1")
}

fn all_zero() -> RiskAssessment {
    RiskAssessment::default()
}

fn score_five() -> RiskAssessment {
    RiskAssessment {
        score: 5,
        financial: CategoryScore::new(5, 4, 3, 2),
        ..RiskAssessment::default()
    }
}

// =============================================================================
// TIER T0: UPLOAD
// =============================================================================

mod t0_upload {
    use super::*;

    /// T0.1: First upload creates version 0 without a risk assessment.
    #[test]
    fn first_upload_creates_version_zero() {
        let vault = Vault::in_memory();
        assert_eq!(
            vault.upload(&f1(), "text1", &ns()).expect("upload"),
            UploadOutcome::Created
        );

        let doc = vault
            .get_document(&f1(), &ns(), Some(VersionName::INITIAL))
            .expect("get")
            .into_document()
            .expect("found");
        assert_eq!(doc.content, "text1");
        assert!(doc.risk_assessment.is_none());
    }

    /// T0.2: A second upload never replaces content.
    #[test]
    fn second_upload_keeps_original_content() {
        let vault = Vault::in_memory();
        vault.upload(&f1(), "text1", &ns()).expect("upload");
        assert_eq!(
            vault.upload(&f1(), "changed", &ns()).expect("upload"),
            UploadOutcome::AlreadyExists
        );

        let doc = vault
            .get_document(&f1(), &ns(), None)
            .expect("get")
            .into_document()
            .expect("found");
        assert_eq!(doc.content, "text1");
    }

    /// T0.3: Upload is blocked once later versions exist, even if version 0 is gone.
    #[test]
    fn upload_blocked_by_any_version() {
        let vault = Vault::in_memory();
        vault.upload(&f1(), "text1", &ns()).expect("upload");
        vault
            .attach_risk_assessment(&f1(), &ns(), all_zero())
            .expect("attach");
        vault
            .save_version(&f1(), &ns(), "text2", score_five())
            .expect("save");
        vault
            .delete_version(&f1(), &ns(), VersionName::INITIAL)
            .expect("delete");

        assert_eq!(
            vault.upload(&f1(), "again", &ns()).expect("upload"),
            UploadOutcome::AlreadyExists
        );
    }

    /// T0.4: Empty content is accepted.
    #[test]
    fn empty_content_is_stored() {
        let vault = Vault::in_memory();
        assert_eq!(
            vault.upload(&f1(), "", &ns()).expect("upload"),
            UploadOutcome::Created
        );
    }
}

// =============================================================================
// TIER T1: ATTACH
// =============================================================================

mod t1_attach {
    use super::*;

    /// T1.1: Attach succeeds exactly once.
    #[test]
    fn attach_succeeds_once() {
        let vault = Vault::in_memory();
        vault.upload(&f1(), "text1", &ns()).expect("upload");

        assert_eq!(
            vault
                .attach_risk_assessment(&f1(), &ns(), all_zero())
                .expect("attach"),
            AttachOutcome::Attached
        );
        assert_eq!(
            vault
                .attach_risk_assessment(&f1(), &ns(), score_five())
                .expect("attach"),
            AttachOutcome::Rejected
        );

        let doc = vault
            .get_document(&f1(), &ns(), Some(VersionName::INITIAL))
            .expect("get")
            .into_document()
            .expect("found");
        assert_eq!(doc.risk_assessment, Some(all_zero()));
    }

    /// T1.2: Attach to an unknown file is rejected and writes nothing.
    #[test]
    fn attach_unknown_file_rejected() {
        let vault = Vault::in_memory();
        assert_eq!(
            vault
                .attach_risk_assessment(&f1(), &ns(), all_zero())
                .expect("attach"),
            AttachOutcome::Rejected
        );
        assert_eq!(
            vault.get_document(&f1(), &ns(), None).expect("get"),
            GetOutcome::NotFound
        );
    }
}

// =============================================================================
// TIER T2: VERSIONING
// =============================================================================

mod t2_versioning {
    use super::*;

    /// T2.1: The end-to-end lifecycle of one file.
    #[test]
    fn end_to_end_lifecycle() {
        let vault = Vault::in_memory();

        assert_eq!(
            vault.upload(&f1(), "text1", &ns()).expect("upload"),
            UploadOutcome::Created
        );
        assert_eq!(
            vault
                .attach_risk_assessment(&f1(), &ns(), all_zero())
                .expect("attach"),
            AttachOutcome::Attached
        );
        assert_eq!(
            vault
                .save_version(&f1(), &ns(), "text2", score_five())
                .expect("save"),
            SaveOutcome::Saved(VersionName(1))
        );
        assert_eq!(
            vault
                .save_version(&f1(), &ns(), "text3", score_five())
                .expect("save"),
            SaveOutcome::Unchanged
        );

        let doc = vault
            .get_document(&f1(), &ns(), Some(VersionName(1)))
            .expect("get")
            .into_document()
            .expect("found");
        assert_eq!(doc.content, "text2");
        assert_eq!(doc.risk_assessment.map(|r| r.score), Some(5));
    }

    /// T2.2: Saving an identical assessment to version 0 writes nothing.
    #[test]
    fn identical_to_version_zero_is_unchanged() {
        let vault = Vault::in_memory();
        vault.upload(&f1(), "text1", &ns()).expect("upload");
        vault
            .attach_risk_assessment(&f1(), &ns(), all_zero())
            .expect("attach");

        assert_eq!(
            vault
                .save_version(&f1(), &ns(), "text2", all_zero())
                .expect("save"),
            SaveOutcome::Unchanged
        );
        assert_eq!(vault.list_versions(&f1(), &ns()).expect("history").len(), 1);
    }

    /// T2.3: Comparison is against the latest version only.
    #[test]
    fn reverting_to_older_assessment_creates_version() {
        let vault = Vault::in_memory();
        vault.upload(&f1(), "text1", &ns()).expect("upload");
        vault
            .attach_risk_assessment(&f1(), &ns(), all_zero())
            .expect("attach");
        vault
            .save_version(&f1(), &ns(), "text2", score_five())
            .expect("save");

        assert_eq!(
            vault
                .save_version(&f1(), &ns(), "text3", all_zero())
                .expect("save"),
            SaveOutcome::Saved(VersionName(2))
        );
    }

    /// T2.4: Saving before any upload reports no history.
    #[test]
    fn save_without_history() {
        let vault = Vault::in_memory();
        assert_eq!(
            vault
                .save_version(&f1(), &ns(), "text", score_five())
                .expect("save"),
            SaveOutcome::NoHistory
        );
    }

    /// T2.5: Saving while version 0 is unscored fails without mutation.
    #[test]
    fn save_before_attach_fails() {
        let vault = Vault::in_memory();
        vault.upload(&f1(), "text1", &ns()).expect("upload");

        let result = vault.save_version(&f1(), &ns(), "text2", score_five());
        assert!(matches!(
            result,
            Err(VaultError::MissingRiskAssessment { version_name, .. }) if version_name == VersionName::INITIAL
        ));
        assert_eq!(vault.list_versions(&f1(), &ns()).expect("history").len(), 1);
    }

    /// T2.6: Versions stay contiguous and unique under sequential saves.
    #[test]
    fn sequential_saves_are_contiguous() {
        let vault = Vault::in_memory();
        vault.upload(&f1(), "text1", &ns()).expect("upload");
        vault
            .attach_risk_assessment(&f1(), &ns(), all_zero())
            .expect("attach");

        for score in 1..=10 {
            let risk = RiskAssessment {
                score,
                ..RiskAssessment::default()
            };
            vault
                .save_version(&f1(), &ns(), &format!("text{score}"), risk)
                .expect("save");
        }

        let versions: Vec<u32> = vault
            .list_versions(&f1(), &ns())
            .expect("history")
            .iter()
            .map(|s| s.version_name.value())
            .collect();
        assert_eq!(versions, (0..=10).collect::<Vec<u32>>());
    }

    /// T2.7: Exclusive save refuses a number already taken.
    #[test]
    fn exclusive_insert_detects_taken_slot() {
        let vault = Vault::in_memory();
        vault.upload(&f1(), "text1", &ns()).expect("upload");
        vault
            .attach_risk_assessment(&f1(), &ns(), all_zero())
            .expect("attach");

        // Simulate a writer that resolved the same next number first
        let rival = riskvault_core::Document::versioned(f1(), "rival", VersionName(1), score_five());
        vault.store().insert_unique(&ns(), rival.clone()).expect("rival");

        let result = vault.store().insert_unique(&ns(), rival);
        assert!(matches!(result, Err(VaultError::VersionConflict { .. })));
    }
}

// =============================================================================
// TIER T3: RETRIEVAL, DELETION, PERSISTENCE
// =============================================================================

mod t3_lifecycle {
    use super::*;
    use tempfile::tempdir;

    /// T3.1: Unknown version and unknown file are both not found.
    #[test]
    fn missing_documents_not_found() {
        let vault = Vault::in_memory();
        vault.upload(&f1(), "text1", &ns()).expect("upload");

        assert_eq!(
            vault
                .get_document(&f1(), &ns(), Some(VersionName(7)))
                .expect("get"),
            GetOutcome::NotFound
        );
        assert_eq!(
            vault
                .get_document(&FileName::new("nope"), &ns(), None)
                .expect("get"),
            GetOutcome::NotFound
        );
        assert_eq!(
            vault.get_latest(&FileName::new("nope"), &ns()).expect("latest"),
            GetOutcome::NotFound
        );
    }

    /// T3.2: Deleting the latest version frees its number.
    #[test]
    fn deleted_latest_number_is_reused() {
        let vault = Vault::in_memory();
        vault.upload(&f1(), "text1", &ns()).expect("upload");
        vault
            .attach_risk_assessment(&f1(), &ns(), all_zero())
            .expect("attach");
        vault
            .save_version(&f1(), &ns(), "text2", score_five())
            .expect("save");

        assert_eq!(
            vault
                .delete_version(&f1(), &ns(), VersionName(1))
                .expect("delete"),
            DeleteOutcome::Deleted(1)
        );
        assert_eq!(
            vault
                .save_version(&f1(), &ns(), "text3", score_five())
                .expect("save"),
            SaveOutcome::Saved(VersionName(1))
        );
    }

    /// T3.3: Deleting a document removes every version and nothing else.
    #[test]
    fn delete_document_is_scoped_to_file() {
        let vault = Vault::in_memory();
        let f2 = FileName::new("f2");
        vault.upload(&f1(), "a", &ns()).expect("upload");
        vault.upload(&f2, "b", &ns()).expect("upload");

        assert_eq!(
            vault.delete_document(&f1(), &ns()).expect("delete"),
            DeleteOutcome::Deleted(1)
        );
        assert_eq!(
            vault.delete_document(&f1(), &ns()).expect("delete"),
            DeleteOutcome::NotFound
        );
        assert_eq!(
            vault.store().count(&ns(), &Filter::all()).expect("count"),
            1
        );
    }

    /// T3.4: The redb backend keeps versions across reopen.
    #[test]
    fn redb_vault_survives_reopen() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("vault.redb");

        {
            let vault = Vault::with_redb(&path).expect("open");
            vault.upload(&f1(), "text1", &ns()).expect("upload");
            vault
                .attach_risk_assessment(&f1(), &ns(), all_zero())
                .expect("attach");
            vault
                .save_version(&f1(), &ns(), "text2", score_five())
                .expect("save");
        }

        let vault = Vault::with_redb(&path).expect("reopen");
        assert!(vault.store().is_persistent());

        let latest = vault
            .get_latest(&f1(), &ns())
            .expect("latest")
            .into_document()
            .expect("found");
        assert_eq!(latest.version_name, VersionName(1));
        assert_eq!(latest.risk_assessment, Some(score_five()));

        assert_eq!(
            vault
                .save_version(&f1(), &ns(), "text3", score_five())
                .expect("save"),
            SaveOutcome::Unchanged
        );
        assert_eq!(
            vault
                .attach_risk_assessment(&f1(), &ns(), score_five())
                .expect("attach"),
            AttachOutcome::Rejected
        );
    }
}
