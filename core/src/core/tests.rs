use super::*;
use crate::core::observer::ObserverError;
use crate::types::{FieldDef, FieldValue};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

mod common {
    use super::*;

    pub(super) fn create_test_core() -> (FolioCore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            base_path: temp_dir.path().to_path_buf(),
        };
        let core = FolioCore::open(config).unwrap();
        (core, temp_dir)
    }

    pub(super) fn doctype(s: &str) -> DocType {
        DocType::try_from(s).unwrap()
    }

    pub(super) fn name(s: &str) -> DocName {
        DocName::try_from(s).unwrap()
    }

    /// Event with an Event Role child table, named from the `EV` series.
    pub(super) fn define_event(core: &mut FolioCore) {
        core.define_doctype(
            DocTypeDef::child(doctype("Event Role"))
                .field(FieldDef::new("role", "Role", FieldType::Link).required()),
        )
        .unwrap();

        core.define_doctype(
            DocTypeDef::new(doctype("Event"))
                .naming(Naming::Series {
                    prefix: "EV".to_string(),
                })
                .field(FieldDef::new("subject", "Subject", FieldType::SmallText).required())
                .field(
                    FieldDef::new("event_type", "Event Type", FieldType::Select)
                        .with_default("Private"),
                )
                .field(FieldDef::new("repeat_on", "Repeat On", FieldType::Select))
                .field(FieldDef::new("starts_on", "Starts On", FieldType::Datetime))
                .field(FieldDef::table("roles", "Roles", &doctype("Event Role"))),
        )
        .unwrap();
    }

    pub(super) fn new_event(subject: &str) -> NewDocument {
        NewDocument::new(doctype("Event")).with("subject", subject)
    }

    #[derive(Debug, Clone, PartialEq)]
    pub(super) enum Event {
        Save(String),
        Delete(String),
        MetaChange(String),
    }

    #[derive(Default)]
    pub(super) struct RecordingObserver {
        pub(super) events: Mutex<Vec<Event>>,
        pub(super) fail_on_save: bool,
    }

    impl RecordingObserver {
        pub(super) fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl DocumentObserver for RecordingObserver {
        fn on_save(
            &self,
            _txn: &redb::WriteTransaction,
            document: &Document,
            metas: &dyn MetaSource,
        ) -> Result<(), ObserverError> {
            if self.fail_on_save {
                return Err("observer refused".into());
            }
            // Metas must be readable while the write is in flight.
            metas.meta(&document.doctype)?;
            self.events
                .lock()
                .unwrap()
                .push(Event::Save(document.name.to_string()));
            Ok(())
        }

        fn on_delete(
            &self,
            _txn: &redb::WriteTransaction,
            document: &DocRef,
        ) -> Result<(), ObserverError> {
            self.events
                .lock()
                .unwrap()
                .push(Event::Delete(document.name.to_string()));
            Ok(())
        }

        fn on_meta_change(&self, doctype: &DocType) {
            self.events
                .lock()
                .unwrap()
                .push(Event::MetaChange(doctype.to_string()));
        }
    }
}

mod define_doctype {
    use super::common::{create_test_core, define_event, doctype};
    use super::*;

    #[test]
    fn test_define_and_list() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);

        assert_eq!(
            core.doctypes().unwrap(),
            vec![doctype("Event"), doctype("Event Role")]
        );
        assert!(core.meta(&doctype("Event Role")).unwrap().is_child());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let (mut core, _temp) = create_test_core();
        let result = core.define_doctype(
            DocTypeDef::new(doctype("Note"))
                .field(FieldDef::new("title", "Title", FieldType::Data))
                .field(FieldDef::new("title", "Title", FieldType::Text)),
        );

        assert!(matches!(
            result,
            Err(FolioError::Validation(ValidationError::DuplicateField { .. }))
        ));
    }

    #[test]
    fn test_table_must_reference_child_doctype() {
        let (mut core, _temp) = create_test_core();
        core.define_doctype(DocTypeDef::new(doctype("Note"))).unwrap();

        let missing = core.define_doctype(
            DocTypeDef::new(doctype("Event"))
                .field(FieldDef::table("roles", "Roles", &doctype("Event Role"))),
        );
        assert!(matches!(
            missing,
            Err(FolioError::Validation(ValidationError::InvalidTableOptions { .. }))
        ));

        let not_child = core.define_doctype(
            DocTypeDef::new(doctype("Event"))
                .field(FieldDef::table("notes", "Notes", &doctype("Note"))),
        );
        assert!(matches!(
            not_child,
            Err(FolioError::Validation(ValidationError::InvalidTableOptions { .. }))
        ));
    }

    #[test]
    fn test_unsupported_searchable_field_rejected() {
        let (mut core, _temp) = create_test_core();
        let result = core.define_doctype(
            DocTypeDef::new(doctype("Note"))
                .field(FieldDef::new("done", "Done", FieldType::Check).searchable()),
        );

        assert!(matches!(
            result,
            Err(FolioError::Validation(ValidationError::NotSearchable { .. }))
        ));
    }
}

mod property_setters {
    use super::common::{create_test_core, define_event, doctype};
    use super::*;

    #[test]
    fn test_make_property_setter_changes_meta() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);

        core.make_property_setter(&doctype("Event"), "subject", Property::InGlobalSearch(true))
            .unwrap();
        core.make_property_setter(
            &doctype("Event"),
            "repeat_on",
            Property::Label("Repeats".to_string()),
        )
        .unwrap();

        let meta = core.meta(&doctype("Event")).unwrap();
        assert!(meta.field("subject").unwrap().in_global_search);
        assert_eq!(meta.field("repeat_on").unwrap().label, "Repeats");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);

        let result =
            core.make_property_setter(&doctype("Event"), "colour", Property::InGlobalSearch(true));
        assert!(matches!(
            result,
            Err(FolioError::Validation(ValidationError::UnknownField { .. }))
        ));
    }

    #[test]
    fn test_unsupported_field_type_rejected() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);

        let result = core.make_property_setter(
            &doctype("Event"),
            "starts_on",
            Property::InGlobalSearch(true),
        );
        assert!(matches!(
            result,
            Err(FolioError::Validation(ValidationError::NotSearchable { .. }))
        ));

        // Turning the flag off is always allowed.
        core.make_property_setter(
            &doctype("Event"),
            "starts_on",
            Property::InGlobalSearch(false),
        )
        .unwrap();
    }

    #[test]
    fn test_unknown_doctype_rejected() {
        let (mut core, _temp) = create_test_core();
        let result =
            core.make_property_setter(&doctype("Event"), "subject", Property::Reqd(true));
        assert!(matches!(
            result,
            Err(FolioError::Database(DatabaseError::UnknownDocType(_)))
        ));
    }

    #[test]
    fn test_clear_property_setters() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        core.make_property_setter(&doctype("Event"), "subject", Property::InGlobalSearch(true))
            .unwrap();

        assert_eq!(core.clear_property_setters(&doctype("Event")).unwrap(), 1);
        assert_eq!(core.clear_property_setters(&doctype("Event")).unwrap(), 0);

        let meta = core.meta(&doctype("Event")).unwrap();
        assert!(!meta.field("subject").unwrap().in_global_search);
    }
}

mod insert {
    use super::common::{create_test_core, define_event, doctype, name, new_event};
    use super::*;

    #[test]
    fn test_insert_assigns_series_names() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        let now = SystemTime::now();

        let first = core.insert(new_event("first"), now).unwrap();
        let second = core.insert(new_event("second"), now).unwrap();

        assert_eq!(first.name, name("EV00001"));
        assert_eq!(second.name, name("EV00002"));
        assert_eq!(
            core.names(&doctype("Event")).unwrap(),
            vec![name("EV00001"), name("EV00002")]
        );
    }

    #[test]
    fn test_insert_applies_defaults_and_timestamps() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        let now = SystemTime::now();

        let document = core.insert(new_event("Standup"), now).unwrap();

        assert_eq!(document.get("event_type"), Some(&FieldValue::from("Private")));
        assert_eq!(document.metadata.created_at, now);
        assert_eq!(document.metadata.modified_at, now);
        assert_eq!(
            core.get(&doctype("Event"), &document.name).unwrap(),
            Some(document)
        );
    }

    #[test]
    fn test_insert_numbers_child_rows() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);

        let document = core
            .insert(
                new_event("Standup")
                    .append("roles", ChildRow::new().with("role", "Administrator"))
                    .append("roles", ChildRow::new().with("role", "Guest")),
                SystemTime::now(),
            )
            .unwrap();

        let rows = document.rows("roles");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].idx, 1);
        assert_eq!(rows[1].idx, 2);
        assert_eq!(rows[1].get("role"), Some(&FieldValue::from("Guest")));
    }

    #[test]
    fn test_insert_with_explicit_name_conflict() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        let now = SystemTime::now();

        core.insert(new_event("a").named(name("custom")), now).unwrap();
        let result = core.insert(new_event("b").named(name("custom")), now);

        assert!(matches!(
            result,
            Err(FolioError::Database(DatabaseError::AlreadyExists))
        ));
    }

    #[test]
    fn test_insert_validation_errors() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        let now = SystemTime::now();

        let missing = core.insert(NewDocument::new(doctype("Event")), now);
        assert!(matches!(
            missing,
            Err(FolioError::Validation(ValidationError::MissingMandatory { .. }))
        ));

        let unknown = core.insert(new_event("x").with("colour", "red"), now);
        assert!(matches!(
            unknown,
            Err(FolioError::Validation(ValidationError::UnknownField { .. }))
        ));

        let bad_table = core.insert(
            new_event("x").append("subject", ChildRow::new().with("role", "Guest")),
            now,
        );
        assert!(matches!(
            bad_table,
            Err(FolioError::Validation(ValidationError::NotATable { .. }))
        ));

        let bad_row = core.insert(new_event("x").append("roles", ChildRow::new()), now);
        assert!(matches!(
            bad_row,
            Err(FolioError::Validation(ValidationError::MissingMandatory { .. }))
        ));

        assert!(core.names(&doctype("Event")).unwrap().is_empty());
    }

    #[test]
    fn test_insert_child_doctype_rejected() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);

        let result = core.insert(
            NewDocument::new(doctype("Event Role"))
                .named(name("r1"))
                .with("role", "Guest"),
            SystemTime::now(),
        );
        assert!(matches!(
            result,
            Err(FolioError::Validation(ValidationError::ChildDocType(_)))
        ));
    }

    #[test]
    fn test_insert_prompt_naming_requires_name() {
        let (mut core, _temp) = create_test_core();
        core.define_doctype(
            DocTypeDef::new(doctype("Note")).field(FieldDef::new("title", "Title", FieldType::Data)),
        )
        .unwrap();

        let result = core.insert(
            NewDocument::new(doctype("Note")).with("title", "x"),
            SystemTime::now(),
        );
        assert!(matches!(
            result,
            Err(FolioError::Validation(ValidationError::NameRequired(_)))
        ));
    }
}

mod save {
    use super::common::{create_test_core, define_event, doctype, new_event};
    use super::*;

    #[test]
    fn test_save_updates_fields_and_keeps_created_at() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        let created = SystemTime::now();
        let later = created + Duration::from_secs(60);

        let mut document = core.insert(new_event("Standup"), created).unwrap();
        document.set("subject", "Retro");
        document.metadata.created_at = later;

        let saved = core.save(&document, later).unwrap();

        assert_eq!(saved.metadata.created_at, created);
        assert_eq!(saved.metadata.modified_at, later);
        let loaded = core.get(&doctype("Event"), &document.name).unwrap().unwrap();
        assert_eq!(loaded.get("subject"), Some(&FieldValue::from("Retro")));
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_save_unknown_document_fails() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        let now = SystemTime::now();

        let mut document = core.insert(new_event("Standup"), now).unwrap();
        core.delete(&doctype("Event"), &document.name).unwrap();
        document.set("subject", "Retro");

        assert!(matches!(
            core.save(&document, now),
            Err(FolioError::Database(DatabaseError::NotFound))
        ));
    }

    #[test]
    fn test_save_revalidates() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        let now = SystemTime::now();

        let mut document = core.insert(new_event("Standup"), now).unwrap();
        document.unset("subject");

        assert!(matches!(
            core.save(&document, now),
            Err(FolioError::Validation(ValidationError::MissingMandatory { .. }))
        ));
    }
}

mod delete {
    use super::common::{create_test_core, define_event, doctype, name, new_event};
    use super::*;

    #[test]
    fn test_delete_removes_document() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);

        let document = core.insert(new_event("Standup"), SystemTime::now()).unwrap();
        let removed = core.delete(&doctype("Event"), &document.name).unwrap();

        assert_eq!(removed, document);
        assert!(core.get(&doctype("Event"), &document.name).unwrap().is_none());
    }

    #[test]
    fn test_delete_nonexistent_fails() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);

        assert!(matches!(
            core.delete(&doctype("Event"), &name("EV00009")),
            Err(FolioError::Database(DatabaseError::NotFound))
        ));
    }

    #[test]
    fn test_delete_all() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        let now = SystemTime::now();

        for subject in ["a", "b", "c"] {
            core.insert(new_event(subject), now).unwrap();
        }

        assert_eq!(core.delete_all(&doctype("Event")).unwrap(), 3);
        assert!(core.names(&doctype("Event")).unwrap().is_empty());
        assert_eq!(core.delete_all(&doctype("Event")).unwrap(), 0);
    }
}

mod observers {
    use super::common::{
        Event, RecordingObserver, create_test_core, define_event, doctype, new_event,
    };
    use super::*;

    #[test]
    fn test_observer_receives_lifecycle_events() {
        let (mut core, _temp) = create_test_core();
        let observer = Arc::new(RecordingObserver::default());
        core.subscribe(observer.clone());
        define_event(&mut core);
        let now = SystemTime::now();

        let mut document = core.insert(new_event("Standup"), now).unwrap();
        document.set("subject", "Retro");
        core.save(&document, now).unwrap();
        core.make_property_setter(&doctype("Event"), "subject", Property::InGlobalSearch(true))
            .unwrap();
        core.delete(&doctype("Event"), &document.name).unwrap();

        assert_eq!(
            observer.events(),
            vec![
                Event::MetaChange("Event Role".to_string()),
                Event::MetaChange("Event".to_string()),
                Event::Save("EV00001".to_string()),
                Event::Save("EV00001".to_string()),
                Event::MetaChange("Event".to_string()),
                Event::Delete("EV00001".to_string()),
            ]
        );
    }

    #[test]
    fn test_delete_all_notifies_each_document() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        let now = SystemTime::now();
        core.insert(new_event("a"), now).unwrap();
        core.insert(new_event("b"), now).unwrap();

        let observer = Arc::new(RecordingObserver::default());
        core.subscribe(observer.clone());
        core.delete_all(&doctype("Event")).unwrap();

        assert_eq!(
            observer.events(),
            vec![
                Event::Delete("EV00001".to_string()),
                Event::Delete("EV00002".to_string()),
            ]
        );
    }

    #[test]
    fn test_failing_observer_aborts_write() {
        let (mut core, _temp) = create_test_core();
        define_event(&mut core);
        core.subscribe(Arc::new(RecordingObserver {
            fail_on_save: true,
            ..Default::default()
        }));

        let result = core.insert(new_event("Standup"), SystemTime::now());

        assert!(matches!(result, Err(FolioError::Observer(_))));
        assert!(core.names(&doctype("Event")).unwrap().is_empty());
    }
}

mod tables {
    use super::common::create_test_core;

    #[test]
    fn test_tables_lists_store_tables() {
        let (core, _temp) = create_test_core();
        let tables = core.tables().unwrap();
        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"doctypes".to_string()));
    }
}

mod app_config {
    use super::common::create_test_core;
    use crate::types::{CaseMatching, MatchKind};

    #[test]
    fn test_missing_file_uses_defaults() {
        let (core, _temp) = create_test_core();
        let config = core.load_app_config().unwrap();
        assert_eq!(config.search.result_limit, 20);
        assert_eq!(config.search.case_matching, CaseMatching::Smart);
    }

    #[test]
    fn test_loads_from_data_dir() {
        let (core, _temp) = create_test_core();
        std::fs::write(
            core.data_dir().join("config.toml"),
            "[search]\ncase_matching = \"sensitive\"\nmatch_kind = \"fuzzy\"\nresult_limit = 0\n",
        )
        .unwrap();

        let config = core.load_app_config().unwrap();
        assert_eq!(config.search.case_matching, CaseMatching::Sensitive);
        assert_eq!(config.search.match_kind, MatchKind::Fuzzy);
        assert_eq!(config.search.result_limit, 20);
    }

    #[test]
    fn test_malformed_file_fails() {
        let (core, _temp) = create_test_core();
        std::fs::write(core.data_dir().join("config.toml"), "[search\n").unwrap();

        assert!(matches!(
            core.load_app_config(),
            Err(crate::FolioError::Config(_))
        ));
    }
}
