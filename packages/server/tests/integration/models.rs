use server::config::CatalogConfig;

use crate::common::{TestApp, VALID_FIELDS, model_form, routes, with_attachment};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_registers_model_and_lists_it_first() {
        let app = TestApp::spawn().await;
        app.upload_model("older.xml", "M9").await;

        let res = app.upload(model_form("model1.xml", b"<sbml/>", VALID_FIELDS)).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file_name"], "model1.xml");
        assert_eq!(res.body["file_link"], "model1.xml");
        assert_eq!(res.body["growth_media"], "LB");
        assert_eq!(res.body["growth_yes_or_no"], "Yes");
        assert!(res.id() > 0);

        let models = app.list_models().await;
        assert_eq!(models.len(), 2);
        assert_eq!(models[0]["file_name"], "model1.xml");
        assert_eq!(models[0]["id"], res.body["id"]);
        assert!(models[0].get("biomass_file_5mM").is_some());
        assert_eq!(
            std::fs::read(app.upload_root.join("model1.xml")).unwrap(),
            b"<sbml/>"
        );
    }

    #[tokio::test]
    async fn repeated_upload_conflicts_and_keeps_original() {
        let app = TestApp::spawn().await;
        let first = app.upload_model("model1.xml", "LB").await;
        assert_eq!(first.status, 201);

        let res = app
            .upload(model_form("model1.xml", b"<replacement/>", VALID_FIELDS))
            .await;

        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(res.body["code"], "CONFLICT");
        assert!(res.body["error"].as_str().unwrap().contains("already exists"));
        assert_eq!(app.list_models().await.len(), 1);
        assert_eq!(
            std::fs::read(app.upload_root.join("model1.xml")).unwrap(),
            b"<sbml/>"
        );
    }

    #[tokio::test]
    async fn invalid_growth_flag_is_rejected_without_leftovers() {
        let app = TestApp::spawn().await;
        let fields = [
            ("growth_media", "LB"),
            ("gapfill_algorithm", "gapseq"),
            ("annotation_tool", "prokka"),
            ("growth_yes_or_no", "Maybe"),
        ];
        let form = with_attachment(
            model_form("model1.xml", b"<sbml/>", &fields),
            "growth_file_upload",
            "growth.tsv",
            b"a\tb\n",
        );

        let res = app.upload(form).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.stored_files().is_empty(), "{:?}", app.stored_files());
        assert!(app.list_models().await.is_empty());
    }

    #[tokio::test]
    async fn missing_required_fields_are_named() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(model_form("model1.xml", b"<sbml/>", &[("growth_media", "LB")]))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["error"],
            "Missing required form fields: gapfill_algorithm, annotation_tool, growth_yes_or_no"
        );
        assert!(app.stored_files().is_empty());
    }

    #[tokio::test]
    async fn missing_growth_media_is_reported_by_the_store() {
        let app = TestApp::spawn_with(CatalogConfig {
            required_fields: Vec::new(),
            ..CatalogConfig::default()
        })
        .await;

        let res = app
            .upload(model_form("model1.xml", b"<sbml/>", &[("gapfill_algorithm", "gapseq")]))
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["error"], "'growth_media' cannot be empty.");
        assert!(app.stored_files().is_empty());
    }

    #[tokio::test]
    async fn missing_primary_part_is_rejected() {
        let app = TestApp::spawn().await;
        let form = VALID_FIELDS
            .iter()
            .fold(reqwest::multipart::Form::new(), |f, (k, v)| {
                f.text(k.to_string(), v.to_string())
            });

        let res = app.upload(form).await;

        assert_eq!(res.status, 400);
        assert!(res.body["error"].as_str().unwrap().contains("modelUpload"));
    }

    #[tokio::test]
    async fn disallowed_extension_is_rejected() {
        let app = TestApp::spawn_with(CatalogConfig {
            allowed_extensions: vec![".xml".into()],
            ..CatalogConfig::default()
        })
        .await;

        let res = app.upload(model_form("model1.tsv", b"x", VALID_FIELDS)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["error"], "Invalid file type '.tsv'. Only .xml allowed.");
        assert!(app.stored_files().is_empty());
    }

    #[tokio::test]
    async fn legacy_part_name_is_accepted() {
        let app = TestApp::spawn().await;
        let part = reqwest::multipart::Part::bytes(b"<sbml/>".to_vec()).file_name("legacy.xml");
        let form = VALID_FIELDS.iter().fold(
            reqwest::multipart::Form::new().part("xmlUpload", part),
            |f, (k, v)| f.text(k.to_string(), v.to_string()),
        );

        let res = app.upload(form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file_name"], "legacy.xml");
    }

    #[tokio::test]
    async fn filename_with_directories_never_escapes_the_root() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(model_form("../../evil.xml", b"<sbml/>", VALID_FIELDS))
            .await;

        assert_eq!(res.status, 400);
        assert!(app.stored_files().is_empty());
        assert!(!app.upload_root.parent().unwrap().join("evil.xml").exists());
    }

    #[tokio::test]
    async fn spaces_in_filename_are_sanitized() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(model_form("my model (v2).xml", b"<sbml/>", VALID_FIELDS))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file_name"], "my_model_v2.xml");
        assert_eq!(app.stored_files(), ["my_model_v2.xml"]);
    }

    #[tokio::test]
    async fn unreachable_store_returns_503_without_leftovers() {
        let app = TestApp::spawn_unreachable().await;
        let form = with_attachment(
            model_form("model1.xml", b"<sbml/>", VALID_FIELDS),
            "growth_file_upload",
            "growth.tsv",
            b"a\tb\n",
        );

        let res = app.upload(form).await;

        assert_eq!(res.status, 503, "{}", res.text);
        assert_eq!(res.body["code"], "STORE_UNAVAILABLE");
        assert!(app.stored_files().is_empty(), "{:?}", app.stored_files());
    }
}

mod attachments {
    use super::*;

    #[tokio::test]
    async fn attachments_are_stored_in_slot_directories() {
        let app = TestApp::spawn().await;
        let form = model_form("model1.xml", b"<sbml/>", VALID_FIELDS);
        let form = with_attachment(form, "growth_file_upload", "growth.tsv", b"g");
        let form = with_attachment(form, "biomass_5mM_upload", "bio5.tsv", b"5");
        let form = with_attachment(form, "biomass_20mM_upload", "bio20.csv", b"20");

        let res = app.upload(form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["growth_file"], "growth_file/growth.tsv");
        assert_eq!(res.body["biomass_file_5mM"], "5mM/bio5.tsv");
        assert!(res.body["biomass_file_20mM"].is_null());
        assert_eq!(
            app.stored_files(),
            ["5mM/bio5.tsv", "growth_file/growth.tsv", "model1.xml"]
        );
    }

    #[tokio::test]
    async fn existing_attachment_is_reused_across_models() {
        let app = TestApp::spawn().await;
        let first = with_attachment(
            model_form("model1.xml", b"<sbml/>", VALID_FIELDS),
            "growth_file_upload",
            "shared.tsv",
            b"first",
        );
        assert_eq!(app.upload(first).await.status, 201);

        let second = with_attachment(
            model_form("model2.xml", b"<sbml/>", VALID_FIELDS),
            "growth_file_upload",
            "shared.tsv",
            b"second",
        );
        let res = app.upload(second).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["growth_file"], "growth_file/shared.tsv");
        assert_eq!(
            std::fs::read(app.upload_root.join("growth_file/shared.tsv")).unwrap(),
            b"first"
        );

        let models = app.list_models().await;
        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|m| m["growth_file"] == "growth_file/shared.tsv"));
    }

    #[tokio::test]
    async fn attachments_are_ignored_when_disabled() {
        let app = TestApp::spawn_with(CatalogConfig {
            optional_attachments: false,
            ..CatalogConfig::default()
        })
        .await;
        let form = with_attachment(
            model_form("model1.xml", b"<sbml/>", VALID_FIELDS),
            "growth_file_upload",
            "growth.tsv",
            b"g",
        );

        let res = app.upload(form).await;

        assert_eq!(res.status, 201);
        assert!(res.body["growth_file"].is_null());
        assert_eq!(app.stored_files(), ["model1.xml"]);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn empty_catalog_lists_nothing() {
        let app = TestApp::spawn().await;
        assert!(app.list_models().await.is_empty());
    }

    #[tokio::test]
    async fn api_listing_is_newest_first_and_unlimited() {
        let app = TestApp::spawn().await;
        for i in 0..7 {
            let res = app.upload_model(&format!("m{i}.xml"), "LB").await;
            assert_eq!(res.status, 201);
        }

        let models = app.list_models().await;
        assert_eq!(models.len(), 7);
        assert!(models.iter().all(|m| m["created_at"].is_string()));
        let ids: Vec<i64> = models.iter().map(|m| m["id"].as_i64().unwrap()).collect();
        let mut sorted = ids.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn unreachable_store_lists_as_503() {
        let app = TestApp::spawn_unreachable().await;
        let res = app.get(routes::MODELS).await;

        assert_eq!(res.status, 503, "{}", res.text);
        assert_eq!(res.body["code"], "STORE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn openapi_document_describes_models_routes() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::OPENAPI).await;

        assert_eq!(res.status, 200);
        assert!(res.body["paths"]["/api/models"]["get"].is_object());
        assert!(res.body["paths"]["/api/models"]["post"].is_object());
    }
}
